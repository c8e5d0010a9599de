use std::path::Path;

use anyhow::{Context, Result};
use uuid::Uuid;

use tourwatch::models::Tour;
use tourwatch::storage::TourRepository;

use super::Runtime;

/// Upsert every tour listed in a JSON file
pub async fn load(rt: &Runtime, data: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(data)
        .await
        .with_context(|| format!("Failed to read {}", data.display()))?;
    let tours = parse_tours(&content)
        .with_context(|| format!("Failed to parse tours from {}", data.display()))?;

    for tour in &tours {
        rt.store
            .upsert_tour(tour)
            .await
            .with_context(|| format!("Failed to save tour {}", tour.name))?;
        tracing::debug!(tour_id = %tour.id, tour = %tour.name, "Tour loaded");
    }

    println!("Loaded {} tours from {}", tours.len(), data.display());
    Ok(())
}

/// Parse a JSON array of tours; entries without an id get a fresh one
fn parse_tours(content: &str) -> serde_json::Result<Vec<Tour>> {
    let mut tours: Vec<Tour> = serde_json::from_str(content)?;
    for tour in tours.iter_mut().filter(|t| t.id.is_nil()) {
        tour.id = Uuid::new_v4();
    }
    Ok(tours)
}
