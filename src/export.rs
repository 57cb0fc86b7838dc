use serde::Serialize;
use std::path::{Path, PathBuf};

pub const COLUMNS: [&str; 12] = [
    "room_id",
    "listing_url",
    "listing_title",
    "license_code",
    "host_id",
    "host_name",
    "host_profile_url",
    "host_rating",
    "host_reviews_count",
    "host_joined_year",
    "host_years_active",
    "host_total_listings_in_dubai",
];

/// One output row. Field order matches [`COLUMNS`]; string fields stay empty
/// when the upstream had no data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListingRecord {
    pub room_id: String,
    pub listing_url: String,
    pub listing_title: String,
    pub license_code: String,
    pub host_id: String,
    pub host_name: String,
    pub host_profile_url: String,
    pub host_rating: String,
    pub host_reviews_count: String,
    pub host_joined_year: String,
    pub host_years_active: String,
    pub host_total_listings_in_dubai: u32,
}

/// Writes the full export in one shot, header included, replacing whatever
/// was there. The pipeline writes an empty table up front so the artifact
/// exists even when a run aborts early.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, records: &[ListingRecord]) -> Result<(), csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        writer.write_record(COLUMNS)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
