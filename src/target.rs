//! The closed set of artifacts the converter looks for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One of the four graph artifacts produced by the indexing job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionTarget {
    Entities,
    Relationships,
    Communities,
    CommunityReports,
}

impl ConversionTarget {
    /// Every target, in processing order.
    pub const ALL: [ConversionTarget; 4] = [
        ConversionTarget::Entities,
        ConversionTarget::Relationships,
        ConversionTarget::Communities,
        ConversionTarget::CommunityReports,
    ];

    /// File name without extension, shared by input and output.
    #[must_use]
    pub fn base_name(self) -> &'static str {
        match self {
            ConversionTarget::Entities => "entities",
            ConversionTarget::Relationships => "relationships",
            ConversionTarget::Communities => "communities",
            ConversionTarget::CommunityReports => "community_reports",
        }
    }

    #[must_use]
    pub fn parquet_file_name(self) -> String {
        format!("{}.parquet", self.base_name())
    }

    #[must_use]
    pub fn json_file_name(self) -> String {
        format!("{}.json", self.base_name())
    }

    /// Where the input is expected inside `dir`.
    #[must_use]
    pub fn input_path(self, dir: &Path) -> PathBuf {
        dir.join(self.parquet_file_name())
    }

    /// Where the JSON output is written inside `dir`.
    #[must_use]
    pub fn output_path(self, dir: &Path) -> PathBuf {
        dir.join(self.json_file_name())
    }
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}
