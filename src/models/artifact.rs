use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::artifacts::{BUSINESS_KEY_SUFFIX, RUN_STAMP_FORMAT};

/// Wall-clock time captured once when the process starts. Every artifact of
/// a run shares it, so a run's JSON and CSV files sort together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp(NaiveDateTime);

impl RunStamp {
    #[must_use]
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    #[must_use]
    pub const fn from_naive(at: NaiveDateTime) -> Self {
        Self(at)
    }
}

impl fmt::Display for RunStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(RUN_STAMP_FORMAT))
    }
}

/// Identifies the artifact pair written for one fetch:
/// `response_<key>_limit<limit>_<stamp>.{json,csv}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub key_name: String,
    pub limit: u32,
    pub stamp: RunStamp,
}

impl ArtifactName {
    pub fn new(key_name: impl Into<String>, limit: u32, stamp: RunStamp) -> Self {
        Self {
            key_name: key_name.into(),
            limit,
            stamp,
        }
    }

    /// Artifact name for a business-discovery fetch of `username`.
    #[must_use]
    pub fn business(username: &str, limit: u32, stamp: RunStamp) -> Self {
        Self::new(format!("{username}{BUSINESS_KEY_SUFFIX}"), limit, stamp)
    }

    #[must_use]
    pub fn stem(&self) -> String {
        format!("response_{}_limit{}_{}", self.key_name, self.limit, self.stamp)
    }

    #[must_use]
    pub fn json_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.stem()))
    }

    #[must_use]
    pub fn csv_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.csv", self.stem()))
    }
}
