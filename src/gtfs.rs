use chrono::NaiveDate;
use serde::Deserialize;

use crate::time::{deserialize_service_date, Time};

/// Table name and the columns a loader reads from it, resolved against the
/// header row once per load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// A raw row of one feed table, decoded by column name.
pub trait Record: serde::de::DeserializeOwned {
    const SCHEMA: Schema;
}

#[derive(Deserialize, Debug)]
pub struct Route {
    pub route_id: u32,
    pub route_short_name: String,
    pub route_desc: String,
    pub route_color: String,
}

impl Record for Route {
    const SCHEMA: Schema = Schema {
        table: "routes",
        columns: &["route_id", "route_short_name", "route_desc", "route_color"],
    };
}

#[derive(Deserialize, Debug)]
pub struct Stop {
    pub stop_id: u32,
    pub stop_name: String,
    pub stop_desc: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
}

impl Record for Stop {
    const SCHEMA: Schema = Schema {
        table: "stops",
        columns: &["stop_id", "stop_name", "stop_desc", "stop_lat", "stop_lon"],
    };
}

/// `exception_type` value for a service added on `date`.
pub const SERVICE_ADDED: u8 = 1;

#[derive(Deserialize, Debug)]
pub struct CalendarDate {
    pub service_id: String,
    /// `None` for eight digits that name no calendar day.
    #[serde(deserialize_with = "deserialize_service_date")]
    pub date: Option<NaiveDate>,
    pub exception_type: u8,
}

impl Record for CalendarDate {
    const SCHEMA: Schema = Schema {
        table: "calendar_dates",
        columns: &["service_id", "date", "exception_type"],
    };
}

#[derive(Deserialize, Debug)]
pub struct Trip {
    pub route_id: u32,
    pub service_id: String,
    pub trip_id: String,
    pub trip_headsign: String,
}

impl Record for Trip {
    const SCHEMA: Schema = Schema {
        table: "trips",
        columns: &["route_id", "service_id", "trip_id", "trip_headsign"],
    };
}

#[derive(Deserialize, Debug)]
pub struct StopTime {
    pub trip_id: String,
    pub arrival_time: Time,
    pub departure_time: Time,
    pub stop_id: u32,
    pub stop_sequence: u32,
}

impl Record for StopTime {
    const SCHEMA: Schema = Schema {
        table: "stop_times",
        columns: &[
            "trip_id",
            "arrival_time",
            "departure_time",
            "stop_id",
            "stop_sequence",
        ],
    };
}

#[derive(Deserialize, Debug)]
pub struct Transfer {
    pub from_stop_id: u32,
    pub to_stop_id: u32,
    pub min_transfer_time: u32,
}

impl Record for Transfer {
    const SCHEMA: Schema = Schema {
        table: "transfers",
        columns: &["from_stop_id", "to_stop_id", "min_transfer_time"],
    };
}
