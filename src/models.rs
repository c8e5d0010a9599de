// Core data structures for tourwatch

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked tour
///
/// The JSON form accepts both snake_case keys and the capitalized keys used by
/// older tour export files (`Name`, `URL`, `ProductID`, `ApiUrl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    /// Product identifier used by the availability API
    #[serde(default, alias = "ProductID", alias = "uuid")]
    pub id: Uuid,
    #[serde(alias = "Name")]
    pub name: String,
    /// Public web page of the tour
    #[serde(default, alias = "URL")]
    pub url: String,
    /// Description API endpoint, if known
    #[serde(default, alias = "ApiUrl", skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Tour {
    pub fn new(id: Uuid, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }
}

impl std::fmt::Display for Tour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Shift a civil date by a calendar offset.
///
/// Out-of-range components are normalized the way wall calendars roll over:
/// Jan 31 + 1 month is Mar 3 (or Mar 2 in a leap year), never clamped to the end
/// of February. Returns `None` only when the result leaves chrono's date range.
pub fn shift_date(date: NaiveDate, years: i32, months: i32, days: i32) -> Option<NaiveDate> {
    let total_months =
        i64::from(date.year() + years) * 12 + i64::from(date.month0()) + i64::from(months);
    let year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let month = u32::try_from(total_months.rem_euclid(12)).ok()? + 1;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = i64::from(date.day0()) + i64::from(days);
    first.checked_add_signed(Duration::days(offset))
}

/// Inclusive range of civil dates used to query availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Default lookahead: `[today, today + 1 year]`
    pub fn year_from(today: NaiveDate) -> Self {
        let end = shift_date(today, 1, 0, 0).unwrap_or(NaiveDate::MAX);
        Self { start: today, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Shift both bounds by the same calendar offset
    pub fn add(&self, years: i32, months: i32, days: i32) -> Option<Self> {
        let start = shift_date(self.start, years, months, days)?;
        let end = shift_date(self.end, years, months, days)?;
        Self::new(start, end)
    }

    /// Window start as midnight UTC; the instant the "nothing found" sentinel carries
    pub fn start_instant(&self) -> DateTime<FixedOffset> {
        Utc.from_utc_datetime(&self.start.and_time(NaiveTime::MIN))
            .fixed_offset()
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Price of a single unit type (adult, child, ...) in minor currency units
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitPricing {
    pub unit_type: String,
    pub original: i64,
    pub retail: i64,
    pub currency: String,
    pub currency_precision: u32,
}

/// One bookable occurrence as returned by the availability API
///
/// Only the fields the engine reads are decoded; the full object is kept in
/// `raw` so it can be persisted for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "localDateTimeStart")]
    pub starts_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vacancies: Option<u32>,
    #[serde(default)]
    pub unit_pricing: Vec<UnitPricing>,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl Slot {
    /// Decode a slot from its JSON object, keeping the object as `raw`
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut slot: Slot = serde_json::from_value(value.clone())?;
        slot.raw = value;
        Ok(slot)
    }

    /// Retail price for one adult, formatted as dollars (`$0.00` when missing)
    pub fn adult_price(&self) -> String {
        let retail = self
            .unit_pricing
            .iter()
            .find(|p| p.unit_type == "ADULT")
            .map(|p| p.retail)
            .unwrap_or(0);

        format!("${:.2}", retail as f64 / 100.0)
    }
}

/// The latest-dated available slot observed for a tour in one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct BestSlotRecord {
    pub tour_id: Uuid,
    pub starts_at: DateTime<FixedOffset>,
    /// `None` when nothing was available (the window-start sentinel)
    pub slot: Option<Slot>,
    pub recorded_at: DateTime<Utc>,
}

impl BestSlotRecord {
    /// Record meaning "nothing later than the window start was found"
    pub fn sentinel(tour_id: Uuid, window: &DateWindow, recorded_at: DateTime<Utc>) -> Self {
        Self {
            tour_id,
            starts_at: window.start_instant(),
            slot: None,
            recorded_at,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.slot.is_none()
    }

    /// Civil date of the slot in its own offset
    pub fn date(&self) -> NaiveDate {
        self.starts_at.date_naive()
    }

    /// Persisted form, carrying the raw slot payload
    pub fn to_stored(&self) -> Result<StoredAvailability, serde_json::Error> {
        let raw = match &self.slot {
            Some(slot) => serde_json::to_string(&slot.raw)?,
            None => "null".to_string(),
        };

        Ok(StoredAvailability {
            tour_id: self.tour_id,
            availability_date: self.starts_at,
            recorded_at: self.recorded_at,
            raw_data: Some(raw),
        })
    }
}

/// Persisted best slot for one tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAvailability {
    pub tour_id: Uuid,
    pub availability_date: DateTime<FixedOffset>,
    pub recorded_at: DateTime<Utc>,
    pub raw_data: Option<String>,
}

impl StoredAvailability {
    /// True when `candidate` is strictly later than what is stored
    pub fn is_superseded_by(&self, candidate: &BestSlotRecord) -> bool {
        candidate.starts_at > self.availability_date
    }
}
