//! In-memory transit schedule for one service date and one time window,
//! built from a GTFS feed.
//!
//! ```no_run
//! use transit_schedule::{FeedPaths, ScheduleBuilder, ScheduleConfig};
//!
//! # fn main() -> transit_schedule::Result<()> {
//! let config = ScheduleConfig::from_ymd(
//!     2024, 3, 1,
//!     "08:00:00".parse().unwrap(),
//!     "09:00:00".parse().unwrap(),
//! )?;
//! let mut builder = ScheduleBuilder::new(config);
//! builder.load_feed(&FeedPaths::in_dir("feeds/rtc"))?;
//! let schedule = builder.finish()?;
//!
//! for trip in schedule.trips().values() {
//!     println!("{trip}: {} stops", trip.stop_events().len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod data;
pub mod error;
pub mod gtfs;
pub mod reader;
pub mod report;
pub mod time;
pub mod timetable;

#[cfg(test)]
mod builder_tests;

pub use builder::{ScheduleBuilder, Stage};
pub use config::{FeedPaths, ScheduleConfig};
pub use error::{LoadError, Result};
pub use time::{Time, TimeWindow};
pub use timetable::Schedule;
