//! Construction parameters for a schedule and the locations of its tables.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{LoadError, Result};
use crate::time::{Time, TimeWindow};

/// The service date and time window a schedule is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub date: NaiveDate,
    pub window: TimeWindow,
}

impl ScheduleConfig {
    /// Create a configuration for `date` and the half-open window
    /// `[start, end)`.
    pub fn new(date: NaiveDate, start: Time, end: Time) -> Result<Self> {
        let window = TimeWindow::new(start, end).ok_or(LoadError::InvalidWindow { start, end })?;
        Ok(Self { date, window })
    }

    /// Like [`ScheduleConfig::new`], validating the calendar date first.
    pub fn from_ymd(year: i32, month: u32, day: u32, start: Time, end: Time) -> Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(LoadError::InvalidDate { year, month, day })?;
        Self::new(date, start, end)
    }
}

/// Paths of the six tables of a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPaths {
    pub lines: PathBuf,
    pub stations: PathBuf,
    pub services: PathBuf,
    pub trips: PathBuf,
    pub stop_times: PathBuf,
    pub transfers: PathBuf,
}

impl FeedPaths {
    /// The standard GTFS file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            lines: dir.join("routes.txt"),
            stations: dir.join("stops.txt"),
            services: dir.join("calendar_dates.txt"),
            trips: dir.join("trips.txt"),
            stop_times: dir.join("stop_times.txt"),
            transfers: dir.join("transfers.txt"),
        }
    }

    pub fn with_transfers(mut self, path: impl Into<PathBuf>) -> Self {
        self.transfers = path.into();
        self
    }
}
