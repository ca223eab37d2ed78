//! Loading the retailer CSV and answering top-K proximity queries over it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;

use crate::distance::{haversine_miles, GeoPoint};
use crate::error::LoadError;
use crate::retailer::{normalize_zip, Retailer, RetailerMatch, RetailerRow};

/// Header names every dataset file must carry. Order in the file is free.
pub const REQUIRED_COLUMNS: [&str; 15] = [
    "Record ID",
    "Store Name",
    "Store Type",
    "Street Number",
    "Street Name",
    "Additional Address",
    "City",
    "State",
    "Zip Code",
    "Zip4",
    "County",
    "Latitude",
    "Longitude",
    "Authorization Date",
    "End Date",
];

/// Counts gathered while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetStats {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub excluded_rows: usize,
    pub zip_codes: usize,
}

/// The validated retailer population. Immutable once built.
#[derive(Debug, Default)]
pub struct Dataset {
    retailers: Vec<Retailer>,
    /// Normalized zip code -> positions in `retailers`, in dataset order.
    zip_index: HashMap<String, Vec<usize>>,
    stats: DatasetStats,
}

impl Dataset {
    /// Reads and validates the CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] when the file cannot be opened, and the
    /// errors of [`Dataset::from_reader`] for malformed content.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads and validates CSV content from any reader.
    ///
    /// A completely empty input yields an empty dataset. Rows without a usable
    /// location are counted and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingColumns`] when the header lacks a required
    /// column, and [`LoadError::Csv`] for unreadable input or rows whose field
    /// count differs from the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Ok(Self::default());
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        // Rows are decoded from raw bytes so a cell that is not valid UTF-8
        // only blanks that cell.
        let byte_headers = rdr.byte_headers()?.clone();
        let mut record = csv::ByteRecord::new();
        let mut total_rows = 0;
        let mut retailers = Vec::new();
        while rdr.read_byte_record(&mut record)? {
            total_rows += 1;
            let row: RetailerRow = record.deserialize(Some(&byte_headers))?;
            if let Some(retailer) = row.into_retailer() {
                retailers.push(retailer);
            }
        }

        Ok(Self::from_retailers(retailers, total_rows))
    }

    fn from_retailers(retailers: Vec<Retailer>, total_rows: usize) -> Self {
        let mut zip_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, retailer) in retailers.iter().enumerate() {
            if !retailer.zip_code.is_empty() {
                zip_index
                    .entry(retailer.zip_code.clone())
                    .or_default()
                    .push(idx);
            }
        }

        let stats = DatasetStats {
            total_rows,
            valid_rows: retailers.len(),
            excluded_rows: total_rows - retailers.len(),
            zip_codes: zip_index.len(),
        };

        Self {
            retailers,
            zip_index,
            stats,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.retailers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retailers.is_empty()
    }

    /// Valid retailers in dataset order.
    #[must_use]
    pub fn retailers(&self) -> &[Retailer] {
        &self.retailers
    }

    #[must_use]
    pub fn stats(&self) -> DatasetStats {
        self.stats
    }

    /// Mean latitude and mean longitude of the retailers in `zip_code`.
    ///
    /// The input is normalized the same way as the dataset's zip column.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn zip_centroid(&self, zip_code: &str) -> Option<GeoPoint> {
        let key = normalize_zip(zip_code);
        let members = self.zip_index.get(&key)?;
        if members.is_empty() {
            return None;
        }

        let (lat_sum, lon_sum) = members.iter().fold((0.0, 0.0), |(lat, lon), &idx| {
            let r = &self.retailers[idx];
            (lat + r.latitude, lon + r.longitude)
        });
        let count = members.len() as f64;
        Some(GeoPoint::new(lat_sum / count, lon_sum / count))
    }

    /// The `k` retailers nearest to `origin`, nearest first.
    ///
    /// Equal distances keep dataset order. `k == 0` returns nothing.
    #[must_use]
    pub fn closest_to(&self, origin: GeoPoint, k: usize) -> Vec<RetailerMatch<'_>> {
        if k == 0 || self.retailers.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(usize, f64)> = self
            .retailers
            .iter()
            .enumerate()
            .map(|(idx, r)| (idx, haversine_miles(r.position(), origin)))
            .collect();

        let by_distance = |a: &(usize, f64), b: &(usize, f64)| {
            a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
        };

        if k < ranked.len() {
            ranked.select_nth_unstable_by(k - 1, by_distance);
            ranked.truncate(k);
        }
        ranked.sort_unstable_by(by_distance);

        ranked
            .into_iter()
            .map(|(idx, distance_miles)| RetailerMatch {
                retailer: &self.retailers[idx],
                distance_miles,
            })
            .collect()
    }

    #[must_use]
    pub fn closest_by_coords(&self, lat: f64, lon: f64, k: usize) -> Vec<RetailerMatch<'_>> {
        self.closest_to(GeoPoint::new(lat, lon), k)
    }

    /// Nearest retailers to the centroid of `zip_code`; empty when no valid
    /// retailer has that zip.
    #[must_use]
    pub fn closest_by_zip(&self, zip_code: &str, k: usize) -> Vec<RetailerMatch<'_>> {
        match self.zip_centroid(zip_code) {
            Some(centroid) => self.closest_to(centroid, k),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Record ID,Store Name,Store Type,Street Number,Street Name,Additional Address,City,State,Zip Code,Zip4,County,Latitude,Longitude,Authorization Date,End Date\n";

    fn dataset(rows: &[&str]) -> Dataset {
        let mut csv = HEADER.to_string();
        for row in rows {
            csv.push_str(row);
            csv.push('\n');
        }
        Dataset::from_reader(csv.as_bytes()).expect("fixture should load")
    }

    fn three_stores() -> Dataset {
        dataset(&[
            "1,Alpha Market,Grocery,10,Main St,,Philadelphia,PA,10001,,PHILA,40.0,-75.0,01/01/2010,",
            "2,Bravo Foods,Convenience,20,Oak Ave,Suite 2,Philadelphia,PA,10001,1234,PHILA,40.1,-75.1,01/01/2011,",
            "3,Charlie Stop,Convenience,30,Elm St,,Reading,PA,19601,,BERKS,41.0,-76.0,01/01/2012,12/31/2020",
        ])
    }

    #[test]
    fn empty_input_is_an_empty_dataset() {
        let ds = Dataset::from_reader("".as_bytes()).expect("empty file loads");
        assert!(ds.is_empty());
        assert_eq!(ds.stats(), DatasetStats::default());
    }

    #[test]
    fn header_only_is_an_empty_dataset() {
        let ds = dataset(&[]);
        assert!(ds.is_empty());
        assert_eq!(ds.stats().total_rows, 0);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = Dataset::from_reader("Record ID,Store Name,Latitude\n1,A,40.0\n".as_bytes())
            .expect_err("header is incomplete");
        match err {
            LoadError::MissingColumns(cols) => {
                assert!(cols.contains(&"Longitude".to_string()));
                assert!(cols.contains(&"Zip Code".to_string()));
                assert!(!cols.contains(&"Latitude".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn ragged_row_fails_the_load() {
        let mut csv = HEADER.to_string();
        csv.push_str("1,Too Short,Grocery\n");
        let err = Dataset::from_reader(csv.as_bytes()).expect_err("row is ragged");
        assert!(matches!(err, LoadError::Csv(_)), "got {err:?}");
    }

    #[test]
    fn columns_may_appear_in_any_order_with_extras() {
        let csv = "Longitude,Latitude,Zip Code,Record ID,Store Name,Store Type,Street Number,Street Name,Additional Address,City,State,Zip4,County,Authorization Date,End Date,Extra\n\
                   -75.0,40.0,10001,7,Shop,Grocery,,,,,,,,,,ignored\n";
        let ds = Dataset::from_reader(csv.as_bytes()).expect("loads");
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.retailers()[0].record_id, "7");
        assert_eq!(ds.retailers()[0].latitude, 40.0);
    }

    #[test]
    fn invalid_locations_are_excluded_and_counted() {
        let ds = dataset(&[
            "1,Alpha,Grocery,,,,,,10001,,,40.0,-75.0,,",
            "2,Nowhere,Grocery,,,,,,10001,,,0,0,,",
            "3,Blank,Grocery,,,,,,10001,,,,-75.0,,",
            "4,Garbled,Grocery,,,,,,10001,,,north,-75.0,,",
            "5,Equator,Grocery,,,,,,10001,,,0,-75.0,,",
        ]);
        assert_eq!(
            ds.stats(),
            DatasetStats {
                total_rows: 5,
                valid_rows: 2,
                excluded_rows: 3,
                zip_codes: 1,
            }
        );
        let ids: Vec<&str> = ds.retailers().iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, ["1", "5"]);
    }

    #[test]
    fn zip_codes_are_trimmed_text() {
        let ds = dataset(&["1,Alpha,Grocery,,,,,,\" 00501 \",,,40.8,-73.0,,"]);
        assert_eq!(ds.retailers()[0].zip_code, "00501");
        assert!(ds.zip_centroid("00501").is_some());
        assert!(ds.zip_centroid(" 00501").is_some());
        assert!(ds.zip_centroid("501").is_none());
    }

    #[test]
    fn undecodable_text_cell_becomes_empty() {
        let mut csv = HEADER.as_bytes().to_vec();
        csv.extend_from_slice(b"1,Alpha,Grocery,,,,,,10001,,,40.0,-75.0,,\n");
        csv.extend_from_slice(b"2,Caf\xe9 Market,Grocery,,,,,,10001,,,40.1,-75.1,,\n");
        let ds = Dataset::from_reader(csv.as_slice()).expect("bad byte does not abort the load");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.retailers()[1].record_id, "2");
        assert_eq!(ds.retailers()[1].store_name, "");
        assert_eq!(ds.retailers()[1].store_type, "Grocery");
    }

    #[test]
    fn padded_coordinate_cells_are_valid() {
        let ds = dataset(&["1,Alpha,Grocery,,,,,,10001,,,40.0 , -75.0,,"]);
        assert_eq!(
            ds.stats(),
            DatasetStats {
                total_rows: 1,
                valid_rows: 1,
                excluded_rows: 0,
                zip_codes: 1,
            }
        );
        assert_eq!(ds.retailers()[0].position(), GeoPoint::new(40.0, -75.0));
    }

    #[test]
    fn coordinate_query_orders_by_distance() {
        let ds = three_stores();
        let hits = ds.closest_by_coords(40.0, -75.0, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].retailer.record_id, "1");
        assert_eq!(hits[0].distance_miles, 0.0);
        assert_eq!(hits[1].retailer.record_id, "2");
        assert!((8.6..8.8).contains(&hits[1].distance_miles));
    }

    #[test]
    fn k_larger_than_population_returns_everything_sorted() {
        let ds = three_stores();
        let hits = ds.closest_by_coords(40.0, -75.0, 100);
        assert_eq!(hits.len(), 3);
        assert!(hits
            .windows(2)
            .all(|w| w[0].distance_miles <= w[1].distance_miles));
    }

    #[test]
    fn zero_k_returns_nothing() {
        assert!(three_stores().closest_by_coords(40.0, -75.0, 0).is_empty());
    }

    #[test]
    fn equal_distances_keep_dataset_order() {
        let ds = dataset(&[
            "a,North,Grocery,,,,,,,,,41.0,-75.0,,",
            "b,East,Grocery,,,,,,,,,40.0,-74.0,,",
            "c,North Twin,Grocery,,,,,,,,,41.0,-75.0,,",
            "d,Here,Grocery,,,,,,,,,40.0,-75.0,,",
        ]);
        let ids: Vec<&str> = ds
            .closest_by_coords(40.0, -75.0, 3)
            .iter()
            .map(|m| m.retailer.record_id.as_str())
            .collect();
        assert_eq!(ids, ["d", "b", "a"]);

        let ids: Vec<&str> = ds
            .closest_by_coords(41.0, -75.0, 2)
            .iter()
            .map(|m| m.retailer.record_id.as_str())
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn zip_centroid_is_mean_of_members() {
        let centroid = three_stores().zip_centroid("10001").expect("zip exists");
        assert!((centroid.lat - 40.05).abs() < 1e-9);
        assert!((centroid.lon - -75.05).abs() < 1e-9);
    }

    #[test]
    fn zip_query_searches_from_centroid() {
        let ds = three_stores();
        let hits = ds.closest_by_zip("10001", 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].retailer.zip_code, "10001");
        assert!(hits[0].distance_miles > 0.0);
        assert!(hits[0].distance_miles < 5.0);
    }

    #[test]
    fn single_member_zip_returns_that_retailer_at_zero() {
        let stores = three_stores();
        let hits = stores.closest_by_zip("19601", 3);
        assert_eq!(hits[0].retailer.record_id, "3");
        assert_eq!(hits[0].distance_miles, 0.0);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn unknown_zip_is_empty() {
        assert!(three_stores().closest_by_zip("99999", 5).is_empty());
        assert!(three_stores().closest_by_zip("", 5).is_empty());
    }

    #[test]
    fn repeated_queries_are_identical() {
        let ds = three_stores();
        let first = ds.closest_by_coords(40.5, -75.5, 3);
        let second = ds.closest_by_coords(40.5, -75.5, 3);
        assert_eq!(first, second);
    }
}
