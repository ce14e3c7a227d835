//! Ordered ingestion of a feed into a [`Schedule`].
//!
//! Each table is loaded by its own stage, and each stage reads what the
//! previous ones kept: services gate trips, trips gate stop times, and the
//! stations left after stop times gate transfers. [`Stage`] records how far
//! ingestion got so a stage called too early fails instead of silently
//! filtering against empty registries.
//!
//! A stage decodes and filters its whole table before touching the
//! schedule, so a malformed row leaves the schedule as the previous stage
//! left it.

use std::{collections::HashMap, fmt, path::Path, sync::Arc};

use itertools::Itertools;
use tracing::{debug, info};

use crate::config::{FeedPaths, ScheduleConfig};
use crate::data::*;
use crate::error::{LoadError, Result};
use crate::gtfs::{self, Record};
use crate::reader::TableReader;
use crate::timetable::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Empty,
    LinesStationsLoaded,
    ServicesLoaded,
    TripsLoaded,
    StopTimesLoaded,
    TransfersLoaded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::LinesStationsLoaded => "lines and stations loaded",
            Self::ServicesLoaded => "services loaded",
            Self::TripsLoaded => "trips loaded",
            Self::StopTimesLoaded => "stop times loaded",
            Self::TransfersLoaded => "transfers loaded",
        })
    }
}

/// Rows of a table, or nothing when the file cannot be opened.
fn rows<T: Record>(path: &Path) -> Result<impl Iterator<Item = Result<T>>> {
    Ok(TableReader::<T, _>::open(path)?.into_iter().flatten())
}

#[derive(Debug)]
pub struct ScheduleBuilder {
    schedule: Schedule,
    stage: Stage,
    lines_loaded: bool,
    stations_loaded: bool,
}

impl ScheduleBuilder {
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            schedule: Schedule::empty(config),
            stage: Stage::Empty,
            lines_loaded: false,
            stations_loaded: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The schedule as loaded so far.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Run every stage in order against the tables of `paths`.
    pub fn load_feed(&mut self, paths: &FeedPaths) -> Result<()> {
        self.load_lines(&paths.lines)?;
        self.load_stations(&paths.stations)?;
        self.load_services(&paths.services)?;
        self.load_trips(&paths.trips)?;
        self.load_stop_times(&paths.stop_times)?;
        self.load_transfers(&paths.transfers)
    }

    /// Hand out the schedule once stop times are loaded. Transfers are
    /// optional.
    pub fn finish(self) -> Result<Schedule> {
        if self.stage < Stage::StopTimesLoaded {
            return Err(LoadError::OutOfOrder {
                step: "finish",
                required: Stage::StopTimesLoaded,
                current: self.stage,
            });
        }
        Ok(self.schedule)
    }

    fn expect_stage(&self, step: &'static str, required: Stage) -> Result<()> {
        if self.stage == required {
            Ok(())
        } else {
            Err(LoadError::OutOfOrder {
                step,
                required,
                current: self.stage,
            })
        }
    }

    /// Lines and stations have no dependencies and load in either order,
    /// as long as services have not been loaded yet.
    fn expect_leaf_stage(&self, step: &'static str) -> Result<()> {
        if self.stage <= Stage::LinesStationsLoaded {
            Ok(())
        } else {
            Err(LoadError::OutOfOrder {
                step,
                required: Stage::Empty,
                current: self.stage,
            })
        }
    }

    fn leaf_loaded(&mut self) {
        if self.lines_loaded && self.stations_loaded {
            self.stage = Stage::LinesStationsLoaded;
        }
    }

    /// Load `routes.txt`. A line loaded twice keeps its last row in both the
    /// by-id and the by-number view.
    pub fn load_lines(&mut self, path: &Path) -> Result<()> {
        self.expect_leaf_stage("lines")?;

        let lines: Vec<Line> = rows::<gtfs::Route>(path)?
            .map_ok(|route| Line {
                id: route.route_id,
                category: Category::from_color(&route.route_color),
                number: route.route_short_name,
                description: route.route_desc,
            })
            .collect::<Result<_>>()?;

        for line in lines {
            let line = Arc::new(line);
            if let Some(previous) = self.schedule.lines.insert(line.id, Arc::clone(&line)) {
                let stale = self
                    .schedule
                    .lines_by_number
                    .get(&previous.number)
                    .is_some_and(|listed| listed.id == previous.id);
                if stale {
                    self.schedule.lines_by_number.remove(&previous.number);
                }
            }
            self.schedule
                .lines_by_number
                .insert(line.number.clone(), line);
        }

        info!(lines = self.schedule.line_count(), "Loaded lines");
        self.lines_loaded = true;
        self.leaf_loaded();
        Ok(())
    }

    /// Load `stops.txt`.
    pub fn load_stations(&mut self, path: &Path) -> Result<()> {
        self.expect_leaf_stage("stations")?;

        let stations: Vec<Station> = rows::<gtfs::Stop>(path)?
            .map_ok(|stop| {
                Station::new(
                    stop.stop_id,
                    stop.stop_name,
                    stop.stop_desc,
                    Coordinates {
                        latitude: stop.stop_lat,
                        longitude: stop.stop_lon,
                    },
                )
            })
            .collect::<Result<_>>()?;

        self.schedule
            .stations
            .extend(stations.into_iter().map(|station| (station.id, station)));

        info!(stations = self.schedule.station_count(), "Loaded stations");
        self.stations_loaded = true;
        self.leaf_loaded();
        Ok(())
    }

    /// Load `calendar_dates.txt`, keeping the services added on the
    /// schedule's date.
    pub fn load_services(&mut self, path: &Path) -> Result<()> {
        self.expect_stage("services", Stage::LinesStationsLoaded)?;

        let date = self.schedule.date();
        let mut dropped = 0usize;
        let mut services = Vec::new();
        for row in rows::<gtfs::CalendarDate>(path)? {
            let row = row?;
            if row.exception_type == gtfs::SERVICE_ADDED && row.date == Some(date) {
                services.push(row.service_id);
            } else {
                dropped += 1;
            }
        }

        self.schedule.services.extend(services);
        info!(
            services = self.schedule.service_count(),
            dropped,
            %date,
            "Loaded services"
        );
        self.stage = Stage::ServicesLoaded;
        Ok(())
    }

    /// Load `trips.txt`, keeping trips of active services.
    pub fn load_trips(&mut self, path: &Path) -> Result<()> {
        self.expect_stage("trips", Stage::ServicesLoaded)?;

        let mut dropped = 0usize;
        let mut trips = Vec::new();
        for row in rows::<gtfs::Trip>(path)? {
            let row = row?;
            if self.schedule.is_service_active(&row.service_id) {
                trips.push(Trip::new(
                    row.trip_id,
                    row.route_id,
                    row.service_id,
                    row.trip_headsign,
                ));
            } else {
                dropped += 1;
            }
        }

        self.schedule
            .trips
            .extend(trips.into_iter().map(|trip| (trip.id.clone(), trip)));
        info!(trips = self.schedule.trip_count(), dropped, "Loaded trips");
        self.stage = Stage::TripsLoaded;
        Ok(())
    }

    /// Load `stop_times.txt`.
    ///
    /// Rows of kept trips whose stay overlaps the schedule's window become
    /// stop events. Once the table is consumed, trips without stop events
    /// are dropped, every remaining stop event is linked into its station,
    /// and stations without stop events are dropped.
    pub fn load_stop_times(&mut self, path: &Path) -> Result<()> {
        self.expect_stage("stop_times", Stage::TripsLoaded)?;

        let window = self.schedule.window();
        let mut unknown_trip = 0usize;
        let mut outside_window = 0usize;
        let mut unknown_station = 0usize;
        let mut admitted = Vec::new();
        for row in rows::<gtfs::StopTime>(path)? {
            let row = row?;
            if !self.schedule.trips.contains_key(&row.trip_id) {
                unknown_trip += 1;
                continue;
            }
            if !window.admits(row.arrival_time, row.departure_time) {
                outside_window += 1;
                continue;
            }
            if !self.schedule.stations.contains_key(&row.stop_id) {
                unknown_station += 1;
                continue;
            }
            admitted.push((
                row.trip_id.clone(),
                StopEvent {
                    station_id: row.stop_id,
                    arrival: row.arrival_time,
                    departure: row.departure_time,
                    sequence: row.stop_sequence,
                    trip_id: row.trip_id,
                },
            ));
        }
        debug!(
            unknown_trip,
            outside_window, unknown_station, "Skipped stop time rows"
        );

        let mut by_trip: HashMap<TripId, Vec<StopEvent>> = admitted.into_iter().into_group_map();
        let trips_before = self.schedule.trip_count();
        let stations_before = self.schedule.station_count();

        let Schedule {
            trips,
            stations,
            stop_events,
            ..
        } = &mut self.schedule;

        trips.retain(|id, _| by_trip.contains_key(id));

        for (id, trip) in trips.iter_mut() {
            let Some(mut events) = by_trip.remove(id) else {
                continue;
            };
            events.sort_by_key(|event| event.sequence);
            for event in events {
                let station_id = event.station_id;
                let arrival = event.arrival;
                let event_id = stop_events.push(event);
                trip.attach(event_id);
                if let Some(station) = stations.get_mut(&station_id) {
                    station.link(arrival, event_id);
                }
            }
        }

        stations.retain(|_, station| station.has_stop_events());

        info!(
            stop_events = self.schedule.stop_event_count(),
            trips = self.schedule.trip_count(),
            trips_dropped = trips_before - self.schedule.trip_count(),
            stations = self.schedule.station_count(),
            stations_dropped = stations_before - self.schedule.station_count(),
            "Loaded stop times"
        );
        self.stage = Stage::StopTimesLoaded;
        Ok(())
    }

    /// Load `transfers.txt`, keeping transfers between two distinct
    /// stations still in the schedule. A minimum transfer time of zero is
    /// stored as one second.
    pub fn load_transfers(&mut self, path: &Path) -> Result<()> {
        self.expect_stage("transfers", Stage::StopTimesLoaded)?;

        let mut dropped = 0usize;
        let mut transfers = Vec::new();
        for row in rows::<gtfs::Transfer>(path)? {
            let row = row?;
            let kept = row.from_stop_id != row.to_stop_id
                && self.schedule.stations.contains_key(&row.from_stop_id)
                && self.schedule.stations.contains_key(&row.to_stop_id);
            if kept {
                transfers.push(Transfer {
                    from: row.from_stop_id,
                    to: row.to_stop_id,
                    min_seconds: row.min_transfer_time.max(1),
                });
            } else {
                dropped += 1;
            }
        }

        self.schedule.transfers.extend(transfers);
        info!(
            transfers = self.schedule.transfer_count(),
            dropped, "Loaded transfers"
        );
        self.stage = Stage::TransfersLoaded;
        Ok(())
    }
}
