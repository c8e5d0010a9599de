use anyhow::{Context, Result};

use tourwatch::availability::FetchError;
use tourwatch::storage::TourRepository;

use super::Runtime;

/// Print the description document of every tracked tour that has an `api_url`
pub async fn details(rt: &Runtime) -> Result<()> {
    let client = rt.client()?;
    let tours = rt.store.list_tours().await.context("Failed to list tours")?;

    if tours.is_empty() {
        println!("No tours tracked. Add some with 'tourwatch load --data <file>'.");
        return Ok(());
    }

    for tour in &tours {
        let body = match client.describe(tour).await {
            Ok(body) => body,
            Err(FetchError::MissingEndpoint(_)) => {
                tracing::warn!(tour_id = %tour.id, tour = %tour.name, "No details endpoint, skipping");
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Error getting details for {}", tour.name))
            }
        };

        let pretty = serde_json::from_str::<serde_json::Value>(&body)
            .and_then(|value| serde_json::to_string_pretty(&value))
            .unwrap_or(body);

        println!("{}", tour.name);
        println!("{}", "=".repeat(tour.name.chars().count()));
        println!("{pretty}\n");
    }

    Ok(())
}
