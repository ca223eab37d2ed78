//! `closest` and `stats` command handlers.

use std::path::Path;

use clap::Args;
use serde::Serialize;
use snaploc_engine::{DatasetStats, GeoPoint, RetailerMatch, StoreEngine};

/// Where to search from: an explicit coordinate pair or a zip code.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = true)]
pub struct Origin {
    /// Latitude in decimal degrees (requires --lon)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Zip code; the search starts at the centroid of its retailers
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub zip: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClosestOutput<'a> {
    origin: Option<GeoPoint>,
    matches: Vec<RetailerMatch<'a>>,
}

fn load(dataset: &Path) -> anyhow::Result<StoreEngine> {
    let engine = StoreEngine::new(dataset);
    engine.load()?;
    Ok(engine)
}

/// Loads `dataset` and renders the `k` nearest retailers as pretty JSON.
///
/// # Errors
///
/// Returns an error if the dataset fails to load or no origin was given.
pub fn run_closest(dataset: &Path, origin: &Origin, k: usize) -> anyhow::Result<String> {
    let engine = load(dataset)?;
    let loaded = engine.dataset()?;

    let output = match (origin.lat, origin.lon, origin.zip.as_deref()) {
        (Some(lat), Some(lon), _) => ClosestOutput {
            origin: Some(GeoPoint::new(lat, lon)),
            matches: engine.closest_by_coords(lat, lon, k)?,
        },
        (_, _, Some(zip)) => {
            let centroid = loaded.zip_centroid(zip);
            if centroid.is_none() {
                tracing::warn!(zip, "no retailers with a usable location in zip code");
            }
            ClosestOutput {
                origin: centroid,
                matches: engine.closest_by_zip(zip, k)?,
            }
        }
        _ => anyhow::bail!("provide either --lat and --lon, or --zip"),
    };

    Ok(serde_json::to_string_pretty(&output)?)
}

/// Loads `dataset` and renders its row counts as pretty JSON.
///
/// # Errors
///
/// Returns an error if the dataset fails to load.
pub fn run_stats(dataset: &Path) -> anyhow::Result<String> {
    let engine = load(dataset)?;
    let stats: DatasetStats = engine.dataset()?.stats();
    Ok(serde_json::to_string_pretty(&stats)?)
}
