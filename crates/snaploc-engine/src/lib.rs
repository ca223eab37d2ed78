//! In-memory nearest-retailer engine over the historical SNAP retailer dataset.
//!
//! [`Dataset`] is the loaded, validated population. [`StoreEngine`] owns the
//! dataset for a process and answers top-K proximity queries once it is ready.

pub mod dataset;
pub mod distance;
pub mod engine;
pub mod error;
pub mod retailer;

pub use dataset::{Dataset, DatasetStats, REQUIRED_COLUMNS};
pub use distance::{haversine_miles, GeoPoint, EARTH_RADIUS_MILES};
pub use engine::{EngineStatus, StoreEngine};
pub use error::{EngineError, LoadError};
pub use retailer::{Retailer, RetailerMatch};
