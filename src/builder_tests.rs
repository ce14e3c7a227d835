//! Pipeline scenarios over on-disk feeds.

use std::collections::HashMap;
use std::fs;

use tempfile::TempDir;

use crate::builder::{ScheduleBuilder, Stage};
use crate::config::{FeedPaths, ScheduleConfig};
use crate::data::{Category, StopEventId};
use crate::error::LoadError;
use crate::time::Time;
use crate::timetable::Schedule;

pub(crate) struct Feed {
    dir: TempDir,
}

impl Feed {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub(crate) fn with(self, file: &str, contents: &str) -> Self {
        fs::write(self.dir.path().join(file), contents).unwrap();
        self
    }

    pub(crate) fn paths(&self) -> FeedPaths {
        FeedPaths::in_dir(self.dir.path())
    }
}

const ROUTES: &str = "\
route_id,route_short_name,route_desc,route_color
1,800,Pointe-de-Sainte-Foy,97BF0D
2,11,Cap-Rouge,FFFFFF
3,EXP,Express,ABCDEF
";

const STOPS: &str = "\
stop_id,stop_name,stop_desc,stop_lat,stop_lon
10,Gare du Palais,,46.817,-71.214
20,Place D'Youville,,46.812,-71.212
30,Université Laval,,46.780,-71.275
40,Cap-Rouge,,46.750,-71.340
";

const CALENDAR_DATES: &str = "\
service_id,date,exception_type
WEEK,20240301,1
WEEK,20240302,1
SAT,20240302,1
HOLIDAY,20240301,2
";

const TRIPS: &str = "\
route_id,service_id,trip_id,trip_headsign
1,WEEK,T1,Sainte-Foy
1,WEEK,T2,Sainte-Foy
2,WEEK,T3,Cap-Rouge
2,SAT,T4,Cap-Rouge
3,HOLIDAY,T5,Express
";

const STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
T1,08:10:00,08:10:00,10,1
T1,08:20:00,08:21:00,20,2
T1,08:40:00,08:40:00,30,3
T2,08:59:30,08:59:30,10,1
T2,09:10:00,09:10:00,20,2
T3,07:30:00,07:30:00,30,1
T3,07:50:00,07:50:00,40,2
T4,08:15:00,08:15:00,40,1
T5,08:15:00,08:15:00,40,1
";

const TRANSFERS: &str = "\
from_stop_id,to_stop_id,min_transfer_time
10,20,0
20,10,120
10,10,60
30,40,90
20,30,180
";

pub(crate) fn sample_feed() -> Feed {
    Feed::new()
        .with("routes.txt", ROUTES)
        .with("stops.txt", STOPS)
        .with("calendar_dates.txt", CALENDAR_DATES)
        .with("trips.txt", TRIPS)
        .with("stop_times.txt", STOP_TIMES)
        .with("transfers.txt", TRANSFERS)
}

fn t(s: &str) -> Time {
    s.parse().unwrap()
}

pub(crate) fn sample_config() -> ScheduleConfig {
    ScheduleConfig::from_ymd(2024, 3, 1, t("08:00:00"), t("09:00:00")).unwrap()
}

fn build(feed: &Feed, config: ScheduleConfig) -> Schedule {
    let mut builder = ScheduleBuilder::new(config);
    builder.load_feed(&feed.paths()).unwrap();
    assert_eq!(builder.stage(), Stage::TransfersLoaded);
    builder.finish().unwrap()
}

/// Every stop event is reachable from exactly one trip and exactly one
/// station, and no trip or station is empty.
fn assert_cross_linked(schedule: &Schedule) {
    let mut from_trips: HashMap<StopEventId, usize> = HashMap::new();
    for (id, trip) in schedule.trips() {
        assert!(!trip.stop_events().is_empty(), "trip {id} has no stop events");
        for &event_id in trip.stop_events() {
            assert_eq!(&schedule.stop_events()[event_id].trip_id, id);
            *from_trips.entry(event_id).or_default() += 1;
        }
    }

    let mut from_stations: HashMap<StopEventId, usize> = HashMap::new();
    for (id, station) in schedule.stations() {
        assert!(station.has_stop_events(), "station {id} has no stop events");
        for (arrival, event_id) in station.stop_events() {
            let event = &schedule.stop_events()[event_id];
            assert_eq!(event.station_id, *id);
            assert_eq!(event.arrival, arrival);
            *from_stations.entry(event_id).or_default() += 1;
        }
    }

    assert_eq!(from_trips.len(), schedule.stop_event_count());
    assert_eq!(from_trips, from_stations);
    assert!(from_trips.values().all(|&count| count == 1));
}

#[test]
fn sample_feed_scenario() {
    let feed = sample_feed();
    let schedule = build(&feed, sample_config());

    assert_eq!(schedule.line_count(), 3);
    assert_eq!(schedule.service_count(), 1);
    assert!(schedule.is_service_active("WEEK"));
    assert!(!schedule.is_service_active("HOLIDAY"));

    // T2 only has its 08:59:30 stop in the window; T3 runs entirely before it.
    assert_eq!(
        schedule.trips().keys().collect::<Vec<_>>(),
        vec!["T1", "T2"]
    );
    assert_eq!(schedule.trip("T2").unwrap().stop_events().len(), 1);
    assert!(schedule.trip("T3").is_none());

    // Station 40 was only served by T3.
    assert_eq!(
        schedule.stations().keys().copied().collect::<Vec<_>>(),
        vec![10, 20, 30]
    );
    assert!(schedule.station(40).is_none());
    assert_eq!(schedule.stop_event_count(), 4);

    assert_cross_linked(&schedule);
}

#[test]
fn trip_stop_events_follow_stop_sequence() {
    let feed = sample_feed();
    let schedule = build(&feed, sample_config());

    let t1 = schedule.trip("T1").unwrap();
    let stops: Vec<_> = schedule
        .trip_stop_events(t1)
        .map(|event| (event.sequence, event.station_id))
        .collect();
    assert_eq!(stops, vec![(1, 10), (2, 20), (3, 30)]);

    let palais = schedule.station(10).unwrap();
    let arrivals: Vec<_> = schedule
        .station_stop_events(palais)
        .map(|event| (event.arrival, event.trip_id.as_str()))
        .collect();
    assert_eq!(arrivals, vec![(t("08:10:00"), "T1"), (t("08:59:30"), "T2")]);
}

#[test]
fn unordered_stop_times_are_sorted_by_sequence() {
    let feed = sample_feed().with(
        "stop_times.txt",
        "trip_id,stop_sequence,stop_id,departure_time,arrival_time\n\
         T1,3,30,08:40:00,08:40:00\n\
         T1,1,10,08:10:00,08:10:00\n\
         T1,2,20,08:21:00,08:20:00\n",
    );
    let schedule = build(&feed, sample_config());

    let t1 = schedule.trip("T1").unwrap();
    let sequences: Vec<_> = schedule.trip_stop_events(t1).map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_cross_linked(&schedule);
}

#[test]
fn window_boundaries_are_half_open() {
    let feed = sample_feed().with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,07:55:00,08:00:00,10,1\n\
         T2,09:00:00,09:00:00,20,1\n\
         T3,07:59:00,07:59:59,30,1\n",
    );
    let schedule = build(&feed, sample_config());

    // Departure exactly at start is kept, arrival exactly at end is not.
    assert_eq!(schedule.trips().keys().collect::<Vec<_>>(), vec!["T1"]);
    assert_eq!(
        schedule.stations().keys().copied().collect::<Vec<_>>(),
        vec![10]
    );
    assert_cross_linked(&schedule);
}

#[test]
fn times_past_midnight_compare_unwrapped() {
    let feed = sample_feed().with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,24:10:00,24:10:00,10,1\n\
         T2,00:10:00,00:10:00,20,1\n",
    );
    let config = ScheduleConfig::from_ymd(2024, 3, 1, t("24:00:00"), t("25:00:00")).unwrap();
    let schedule = build(&feed, config);

    assert_eq!(schedule.trips().keys().collect::<Vec<_>>(), vec!["T1"]);
}

#[test]
fn zero_transfer_time_becomes_one_second() {
    let feed = sample_feed();
    let schedule = build(&feed, sample_config());

    let transfers: Vec<_> = schedule
        .transfers()
        .iter()
        .map(|transfer| (transfer.from, transfer.to, transfer.min_seconds))
        .collect();
    // 10 -> 10 is a self transfer and station 40 was pruned.
    assert_eq!(transfers, vec![(10, 20, 1), (20, 10, 120), (20, 30, 180)]);
    assert_eq!(schedule.transfers_from(20).count(), 2);
}

#[test]
fn duplicate_transfers_are_kept() {
    let feed = sample_feed().with(
        "transfers.txt",
        "from_stop_id,to_stop_id,min_transfer_time\n10,20,60\n10,20,60\n",
    );
    let schedule = build(&feed, sample_config());
    assert_eq!(schedule.transfer_count(), 2);
}

#[test]
fn transfers_before_stop_times_are_rejected() {
    let feed = sample_feed();
    let paths = feed.paths();
    let mut builder = ScheduleBuilder::new(sample_config());
    builder.load_lines(&paths.lines).unwrap();
    builder.load_stations(&paths.stations).unwrap();
    builder.load_services(&paths.services).unwrap();
    builder.load_trips(&paths.trips).unwrap();

    let err = builder.load_transfers(&paths.transfers).unwrap_err();
    assert!(matches!(
        err,
        LoadError::OutOfOrder {
            step: "transfers",
            required: Stage::StopTimesLoaded,
            current: Stage::TripsLoaded,
        }
    ));
    assert_eq!(builder.schedule().transfer_count(), 0);
    assert_eq!(builder.stage(), Stage::TripsLoaded);

    // The pipeline carries on once stop times are in.
    builder.load_stop_times(&paths.stop_times).unwrap();
    builder.load_transfers(&paths.transfers).unwrap();
    assert_eq!(builder.schedule().transfer_count(), 3);
}

#[test]
fn stages_enforce_their_order() {
    let feed = sample_feed();
    let paths = feed.paths();
    let mut builder = ScheduleBuilder::new(sample_config());

    assert!(matches!(
        builder.load_services(&paths.services),
        Err(LoadError::OutOfOrder {
            current: Stage::Empty,
            ..
        })
    ));

    // Leaves load in either order.
    builder.load_stations(&paths.stations).unwrap();
    assert_eq!(builder.stage(), Stage::Empty);
    builder.load_lines(&paths.lines).unwrap();
    assert_eq!(builder.stage(), Stage::LinesStationsLoaded);

    assert!(matches!(
        builder.load_trips(&paths.trips),
        Err(LoadError::OutOfOrder { step: "trips", .. })
    ));
    builder.load_services(&paths.services).unwrap();
    assert!(matches!(
        builder.load_stop_times(&paths.stop_times),
        Err(LoadError::OutOfOrder { .. })
    ));
    builder.load_trips(&paths.trips).unwrap();

    // Nothing can be reloaded behind the stages that depend on it.
    assert!(matches!(
        builder.load_lines(&paths.lines),
        Err(LoadError::OutOfOrder { step: "lines", .. })
    ));
    assert!(matches!(
        builder.load_services(&paths.services),
        Err(LoadError::OutOfOrder { .. })
    ));
}

#[test]
fn finish_needs_stop_times() {
    let feed = sample_feed();
    let paths = feed.paths();
    let mut builder = ScheduleBuilder::new(sample_config());
    builder.load_lines(&paths.lines).unwrap();
    builder.load_stations(&paths.stations).unwrap();

    assert!(matches!(
        builder.finish(),
        Err(LoadError::OutOfOrder { step: "finish", .. })
    ));
}

#[test]
fn missing_tables_load_nothing() {
    let feed = Feed::new()
        .with("routes.txt", ROUTES)
        .with("stops.txt", STOPS)
        .with("calendar_dates.txt", CALENDAR_DATES)
        .with("trips.txt", TRIPS);
    let schedule = build(&feed, sample_config());

    // No stop times: every trip and station is pruned, and no transfers.
    assert_eq!(schedule.line_count(), 3);
    assert_eq!(schedule.trip_count(), 0);
    assert_eq!(schedule.station_count(), 0);
    assert_eq!(schedule.transfer_count(), 0);
}

#[test]
fn missing_transfers_table_is_not_an_error() {
    let feed = Feed::new()
        .with("routes.txt", ROUTES)
        .with("stops.txt", STOPS)
        .with("calendar_dates.txt", CALENDAR_DATES)
        .with("trips.txt", TRIPS)
        .with("stop_times.txt", STOP_TIMES);
    let schedule = build(&feed, sample_config());

    assert_eq!(schedule.trip_count(), 2);
    assert_eq!(schedule.transfer_count(), 0);
}

#[test]
fn malformed_stop_time_leaves_schedule_untouched() {
    let feed = sample_feed().with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,08:10:00,08:10:00,10,1\n\
         T1,08:20:00,08:21:00,twenty,2\n",
    );
    let paths = feed.paths();
    let mut builder = ScheduleBuilder::new(sample_config());
    builder.load_lines(&paths.lines).unwrap();
    builder.load_stations(&paths.stations).unwrap();
    builder.load_services(&paths.services).unwrap();
    builder.load_trips(&paths.trips).unwrap();

    let err = builder.load_stop_times(&paths.stop_times).unwrap_err();
    assert!(matches!(
        err,
        LoadError::MalformedRow {
            table: "stop_times",
            line: 3,
            ..
        }
    ));

    assert_eq!(builder.stage(), Stage::TripsLoaded);
    assert_eq!(builder.schedule().trip_count(), 3);
    assert_eq!(builder.schedule().station_count(), 4);
    assert_eq!(builder.schedule().stop_event_count(), 0);
}

#[test]
fn malformed_service_date_is_fatal() {
    let feed = sample_feed().with(
        "calendar_dates.txt",
        "service_id,date,exception_type\nWEEK,2024-03-01,1\n",
    );
    let mut builder = ScheduleBuilder::new(sample_config());
    let err = builder.load_feed(&feed.paths()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::MalformedRow {
            table: "calendar_dates",
            ..
        }
    ));
    assert_eq!(builder.schedule().service_count(), 0);
}

#[test]
fn impossible_service_dates_are_dropped() {
    let feed = sample_feed().with(
        "calendar_dates.txt",
        "service_id,date,exception_type\n\
         WEEK,20240301,1\n\
         OLD,20240230,1\n",
    );
    let schedule = build(&feed, sample_config());

    assert_eq!(schedule.service_count(), 1);
    assert!(schedule.is_service_active("WEEK"));
    assert!(!schedule.is_service_active("OLD"));
    assert_eq!(schedule.trip_count(), 2);
}

#[test]
fn padded_numeric_fields_load() {
    let feed = sample_feed().with(
        "stops.txt",
        "stop_id,stop_name,stop_desc,stop_lat,stop_lon\n\
         10 ,Gare du Palais,,46.817 ,-71.214\n\
         20,Place D'Youville,, 46.812, -71.212\n\
         30,Université Laval,,46.780,-71.275\n",
    );
    let schedule = build(&feed, sample_config());

    let palais = schedule.station(10).unwrap();
    assert_eq!(palais.coordinates.latitude, 46.817);
    assert_eq!(schedule.station(20).unwrap().coordinates.longitude, -71.212);
    assert_eq!(schedule.stop_event_count(), 4);
}

#[test]
fn stop_times_with_sixty_minutes_compare_raw() {
    let feed = sample_feed().with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,07:60:00,07:60:00,10,1\n\
         T1,08:60:00,08:60:00,20,2\n",
    );
    let schedule = build(&feed, sample_config());

    // 07:60:00 sorts before 08:00:00 and 08:60:00 before 09:00:00, so the
    // first is outside the window and the second inside it.
    let trip = schedule.trip("T1").unwrap();
    let stops: Vec<_> = schedule
        .trip_stop_events(trip)
        .map(|event| (event.station_id, event.arrival.to_string()))
        .collect();
    assert_eq!(stops, vec![(20, "08:60:00".to_owned())]);
    assert_cross_linked(&schedule);
}

#[test]
fn stop_times_at_unknown_stations_are_skipped() {
    let feed = sample_feed().with(
        "stop_times.txt",
        "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
         T1,08:10:00,08:10:00,10,1\n\
         T1,08:20:00,08:20:00,99,2\n\
         T2,08:30:00,08:30:00,99,1\n",
    );
    let schedule = build(&feed, sample_config());

    assert_eq!(schedule.trips().keys().collect::<Vec<_>>(), vec!["T1"]);
    assert_eq!(schedule.trip("T1").unwrap().stop_events().len(), 1);
    assert_cross_linked(&schedule);
}

#[test]
fn duplicate_ids_keep_the_last_row() {
    let feed = sample_feed()
        .with(
            "routes.txt",
            "route_id,route_short_name,route_desc,route_color\n\
             1,800,Old,97BF0D\n\
             1,801,New,013888\n",
        )
        .with(
            "trips.txt",
            "route_id,service_id,trip_id,trip_headsign\n\
             1,WEEK,T1,First\n\
             1,WEEK,T1,Second\n",
        );
    let schedule = build(&feed, sample_config());

    assert_eq!(schedule.line_count(), 1);
    assert_eq!(schedule.line(1).unwrap().description, "New");
    assert!(schedule.line_by_number("800").is_none());
    assert_eq!(schedule.line_by_number("801").unwrap().category, Category::Metro);
    assert_eq!(schedule.lines_by_number().len(), 1);

    assert_eq!(schedule.trip("T1").unwrap().headsign, "Second");
}

#[test]
fn rebuilding_is_idempotent() {
    let feed = sample_feed();
    let first = build(&feed, sample_config());
    let second = build(&feed, sample_config());

    assert_eq!(first.trips(), second.trips());
    assert_eq!(first.stations(), second.stations());
    assert_eq!(first.transfers(), second.transfers());
    assert_eq!(first.lines_by_number(), second.lines_by_number());
    assert_eq!(first.stop_event_count(), second.stop_event_count());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// A stop time row: trip index, station index, arrival minute of the
    /// day, dwell minutes, stop sequence.
    fn stop_time_row() -> impl Strategy<Value = (usize, usize, u32, u32, u32)> {
        (0usize..6, 0usize..5, 360u32..720, 0u32..6, 1u32..20)
    }

    fn hms(minutes: u32) -> String {
        format!("{:02}:{:02}:00", minutes / 60, minutes % 60)
    }

    fn feed_with(rows: &[(usize, usize, u32, u32, u32)]) -> Feed {
        let mut stop_times = String::from("trip_id,arrival_time,departure_time,stop_id,stop_sequence\n");
        for &(trip, station, arrival, dwell, sequence) in rows {
            stop_times.push_str(&format!(
                "T{},{},{},{},{}\n",
                trip + 1,
                hms(arrival),
                hms(arrival + dwell),
                (station + 1) * 10,
                sequence
            ));
        }
        sample_feed().with("stop_times.txt", &stop_times)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Any stop time table yields a cross-linked schedule with only
        /// admitted stop events of known trips
        #[test]
        fn pruned_schedule_is_cross_linked(rows in prop::collection::vec(stop_time_row(), 0..40)) {
            let feed = feed_with(&rows);
            let schedule = build(&feed, sample_config());

            assert_cross_linked(&schedule);
            for (_, event) in schedule.stop_events().iter() {
                prop_assert!(schedule.window().admits(event.arrival, event.departure));
                prop_assert!(schedule.trip(&event.trip_id).is_some());
                prop_assert!(schedule.is_service_active(&schedule.trip(&event.trip_id).unwrap().service_id));
            }
        }

        /// Building twice from the same files gives the same schedule
        #[test]
        fn rebuild_is_idempotent(rows in prop::collection::vec(stop_time_row(), 0..40)) {
            let feed = feed_with(&rows);
            let first = build(&feed, sample_config());
            let second = build(&feed, sample_config());

            prop_assert_eq!(first.trips(), second.trips());
            prop_assert_eq!(first.stations(), second.stations());
            prop_assert_eq!(first.transfers(), second.transfers());
            prop_assert_eq!(first.stop_event_count(), second.stop_event_count());
        }
    }
}
