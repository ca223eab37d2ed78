//! Retailer records as read from the CSV and as returned by queries.

use serde::{Deserialize, Serialize};

use crate::distance::GeoPoint;

/// Cell values the export uses for "no value". Treated like an empty cell.
const MISSING_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NULL", "null", "NaN", "nan", "None", "#N/A", "<NA>",
];

/// A retailer with a usable location.
///
/// Text fields are never absent: missing cells are stored as `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retailer {
    pub record_id: String,
    pub store_name: String,
    pub store_type: String,
    pub street_number: String,
    pub street_name: String,
    pub additional_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub zip4: String,
    pub county: String,
    pub latitude: f64,
    pub longitude: f64,
    pub authorization_date: String,
    pub end_date: String,
}

impl Retailer {
    #[must_use]
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A query hit: the retailer and its distance from the reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetailerMatch<'a> {
    #[serde(flatten)]
    pub retailer: &'a Retailer,
    pub distance_miles: f64,
}

/// One CSV row before validation.
///
/// Every cell goes through `csv::invalid_option`, so a value that fails to
/// decode becomes `None` instead of aborting the load. Coordinates stay text
/// here and are parsed after trimming.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RetailerRow {
    #[serde(rename = "Record ID", default, deserialize_with = "csv::invalid_option")]
    pub record_id: Option<String>,
    #[serde(rename = "Store Name", default, deserialize_with = "csv::invalid_option")]
    pub store_name: Option<String>,
    #[serde(rename = "Store Type", default, deserialize_with = "csv::invalid_option")]
    pub store_type: Option<String>,
    #[serde(rename = "Street Number", default, deserialize_with = "csv::invalid_option")]
    pub street_number: Option<String>,
    #[serde(rename = "Street Name", default, deserialize_with = "csv::invalid_option")]
    pub street_name: Option<String>,
    #[serde(
        rename = "Additional Address",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub additional_address: Option<String>,
    #[serde(rename = "City", default, deserialize_with = "csv::invalid_option")]
    pub city: Option<String>,
    #[serde(rename = "State", default, deserialize_with = "csv::invalid_option")]
    pub state: Option<String>,
    #[serde(rename = "Zip Code", default, deserialize_with = "csv::invalid_option")]
    pub zip_code: Option<String>,
    #[serde(rename = "Zip4", default, deserialize_with = "csv::invalid_option")]
    pub zip4: Option<String>,
    #[serde(rename = "County", default, deserialize_with = "csv::invalid_option")]
    pub county: Option<String>,
    #[serde(rename = "Latitude", default, deserialize_with = "csv::invalid_option")]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude", default, deserialize_with = "csv::invalid_option")]
    pub longitude: Option<String>,
    #[serde(
        rename = "Authorization Date",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub authorization_date: Option<String>,
    #[serde(rename = "End Date", default, deserialize_with = "csv::invalid_option")]
    pub end_date: Option<String>,
}

impl RetailerRow {
    /// Converts the row into a [`Retailer`], or `None` when it has no usable
    /// location: a missing coordinate, or the `(0, 0)` "not geocoded" sentinel.
    #[allow(clippy::float_cmp)]
    pub(crate) fn into_retailer(self) -> Option<Retailer> {
        let latitude = coordinate(self.latitude.as_deref())?;
        let longitude = coordinate(self.longitude.as_deref())?;
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }

        Some(Retailer {
            record_id: text(self.record_id),
            store_name: text(self.store_name),
            store_type: text(self.store_type),
            street_number: text(self.street_number),
            street_name: text(self.street_name),
            additional_address: text(self.additional_address),
            city: text(self.city),
            state: text(self.state),
            zip_code: normalize_zip(self.zip_code.as_deref().unwrap_or_default()),
            zip4: text(self.zip4),
            county: text(self.county),
            latitude,
            longitude,
            authorization_date: text(self.authorization_date),
            end_date: text(self.end_date),
        })
    }
}

/// Canonical zip form used for both indexing and lookup.
///
/// Kept as text so leading zeros survive.
#[must_use]
pub fn normalize_zip(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Parses a coordinate cell. Blank, unparseable and NaN cells are missing.
fn coordinate(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn text(value: Option<String>) -> String {
    match value {
        Some(v) if !is_missing(&v) => v,
        _ => String::new(),
    }
}

fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed)
}
