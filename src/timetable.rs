use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use chrono::NaiveDate;

use crate::config::ScheduleConfig;
use crate::data::*;
use crate::time::{Time, TimeWindow};

/// A schedule restricted to one service date and one time window.
///
/// Built by [`ScheduleBuilder`](crate::ScheduleBuilder); read-only once
/// handed out.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub(crate) config: ScheduleConfig,
    pub(crate) lines: HashMap<LineId, Arc<Line>>,
    pub(crate) lines_by_number: BTreeMap<String, Arc<Line>>,
    pub(crate) stations: BTreeMap<StationId, Station>,
    pub(crate) services: BTreeSet<ServiceId>,
    pub(crate) trips: BTreeMap<TripId, Trip>,
    pub(crate) stop_events: StopEvents,
    pub(crate) transfers: Vec<Transfer>,
}

impl Schedule {
    pub(crate) fn empty(config: ScheduleConfig) -> Self {
        Self {
            config,
            lines: HashMap::new(),
            lines_by_number: BTreeMap::new(),
            stations: BTreeMap::new(),
            services: BTreeSet::new(),
            trips: BTreeMap::new(),
            stop_events: StopEvents::default(),
            transfers: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.config.date
    }

    pub fn window(&self) -> TimeWindow {
        self.config.window
    }

    pub fn start(&self) -> Time {
        self.config.window.start()
    }

    pub fn end(&self) -> Time {
        self.config.window.end()
    }

    pub fn lines(&self) -> &HashMap<LineId, Arc<Line>> {
        &self.lines
    }

    /// Lines keyed by their display number, in display order.
    pub fn lines_by_number(&self) -> &BTreeMap<String, Arc<Line>> {
        &self.lines_by_number
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id).map(Arc::as_ref)
    }

    pub fn line_by_number(&self, number: &str) -> Option<&Line> {
        self.lines_by_number.get(number).map(Arc::as_ref)
    }

    pub fn stations(&self) -> &BTreeMap<StationId, Station> {
        &self.stations
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn services(&self) -> &BTreeSet<ServiceId> {
        &self.services
    }

    pub fn is_service_active(&self, service_id: &str) -> bool {
        self.services.contains(service_id)
    }

    pub fn trips(&self) -> &BTreeMap<TripId, Trip> {
        &self.trips
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    pub fn stop_events(&self) -> &StopEvents {
        &self.stop_events
    }

    pub fn stop_event(&self, id: StopEventId) -> Option<&StopEvent> {
        self.stop_events.get(id)
    }

    /// A trip's stop events in stop sequence order.
    pub fn trip_stop_events<'a>(&'a self, trip: &'a Trip) -> impl Iterator<Item = &'a StopEvent> + 'a {
        trip.stop_events().iter().map(move |&id| &self.stop_events[id])
    }

    /// A station's stop events in arrival order.
    pub fn station_stop_events<'a>(
        &'a self,
        station: &'a Station,
    ) -> impl Iterator<Item = &'a StopEvent> + 'a {
        station.stop_events().map(move |(_, id)| &self.stop_events[id])
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Transfers leaving `station`, in load order.
    pub fn transfers_from(&self, station: StationId) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter().filter(move |transfer| transfer.from == station)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn stop_event_count(&self) -> usize {
        self.stop_events.len()
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.len()
    }
}
