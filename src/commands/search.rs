use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use uuid::Uuid;

use tourwatch::availability::AvailabilitySource;
use tourwatch::models::{DateWindow, Tour};
use tourwatch::storage::TourRepository;
use tourwatch::summary::SummaryRenderer;

use super::Runtime;

/// Print every slot of one tour between `start` and `end`.
///
/// `start` defaults to today and `end` to one year after `start`. The tour
/// does not need to be tracked.
pub async fn search(
    rt: &Runtime,
    tour_id: Uuid,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let start = start.unwrap_or_else(|| Local::now().date_naive());
    let window = match end {
        Some(end) => DateWindow::new(start, end)
            .with_context(|| format!("End date {end} is before start date {start}"))?,
        None => DateWindow::year_from(start),
    };

    let tour = rt
        .store
        .get_tour(tour_id)
        .await
        .context("Failed to load tour")?
        .unwrap_or_else(|| Tour::new(tour_id, "", ""));

    tracing::info!(tour_id = %tour_id, window = %window, "Searching availability");

    let client = rt.client()?;
    let slots = client
        .fetch(&tour, &window)
        .await
        .with_context(|| format!("Error getting availability for {tour_id}"))?;

    if slots.is_empty() {
        println!("No slots found between {} and {}", window.start(), window.end());
        return Ok(());
    }

    let renderer = SummaryRenderer::new().context("Failed to load summary templates")?;
    print!("{}", renderer.render_slots(&slots)?);

    Ok(())
}
