//! Plain-text summary tables rendered with Handlebars
//!
//! Two tables are produced: the latest known availability per tour, and the
//! slot list for a single tour.

use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;

use crate::models::{Slot, StoredAvailability, Tour};
use crate::storage::{LatestAvailabilityStore, StorageResult};

const LATEST_TEMPLATE: &str = include_str!("../templates/latest.hbs");
const SLOTS_TEMPLATE: &str = include_str!("../templates/slots.hbs");

/// Width of the tour name column
const NAME_WIDTH: usize = 59;

/// Errors raised while rendering summaries
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("Failed to register template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Pad to `max` characters, or cut and end with `...` when longer
fn truncate_name(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        format!("{s}{}", " ".repeat(max - len))
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

handlebars_helper!(truncate: |s: str, max: u64| truncate_name(s, usize::try_from(max).unwrap_or(usize::MAX)));

#[derive(Debug, Serialize)]
struct LatestRow {
    tour_name: String,
    available_date: String,
    opened_at: String,
}

#[derive(Debug, Serialize)]
struct SlotRow {
    starts_at: String,
    price: String,
    vacancies: u32,
}

/// Renders the summary tables
pub struct SummaryRenderer {
    handlebars: Handlebars<'static>,
}

impl SummaryRenderer {
    pub fn new() -> Result<Self, SummaryError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("truncate", Box::new(truncate));
        handlebars
            .register_template_string("latest", LATEST_TEMPLATE)
            .map_err(Box::new)?;
        handlebars
            .register_template_string("slots", SLOTS_TEMPLATE)
            .map_err(Box::new)?;

        Ok(Self { handlebars })
    }

    /// Table of the stored best slot per tour; tours without a record show `-`
    pub fn render_latest(
        &self,
        entries: &[(Tour, Option<StoredAvailability>)],
    ) -> Result<String, SummaryError> {
        let rows: Vec<LatestRow> = entries
            .iter()
            .map(|(tour, latest)| LatestRow {
                tour_name: tour.name.clone(),
                available_date: format!(
                    "{:<14}",
                    latest
                        .as_ref()
                        .map(|l| l.availability_date.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".to_string())
                ),
                opened_at: latest
                    .as_ref()
                    .map(|l| l.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        Ok(self.handlebars.render("latest", &rows)?)
    }

    /// Table of slots with their adult price and vacancies
    pub fn render_slots(&self, slots: &[Slot]) -> Result<String, SummaryError> {
        let rows: Vec<SlotRow> = slots
            .iter()
            .map(|slot| SlotRow {
                starts_at: slot.starts_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                price: slot.adult_price(),
                vacancies: slot.vacancies.unwrap_or(0),
            })
            .collect();

        Ok(self.handlebars.render("slots", &rows)?)
    }
}

/// Pair each tour with its stored record
pub async fn collect_latest(
    tours: Vec<Tour>,
    store: &dyn LatestAvailabilityStore,
) -> StorageResult<Vec<(Tour, Option<StoredAvailability>)>> {
    let mut entries = Vec::with_capacity(tours.len());
    for tour in tours {
        let latest = store.get_latest(tour.id).await?;
        entries.push((tour, latest));
    }
    Ok(entries)
}
