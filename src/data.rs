use std::{collections::BTreeMap, fmt, ops::Index};

use crate::time::Time;

pub type LineId = u32;
pub type StationId = u32;
pub type TripId = String;
pub type ServiceId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Bus,
    Metro,
    Train,
    Other,
}

impl Category {
    /// Map a `route_color` code to a category. Case and a leading `#` are
    /// ignored; unknown colors are [`Category::Other`].
    pub fn from_color(color: &str) -> Self {
        let color = color.trim().trim_start_matches('#').to_ascii_uppercase();
        match color.as_str() {
            "97BF0D" | "013888" | "E04503" => Self::Metro,
            "1A171B" | "003399" => Self::Train,
            "" | "FFFFFF" | "000000" => Self::Bus,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bus => "bus",
            Self::Metro => "metro",
            Self::Train => "train",
            Self::Other => "other",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub id: LineId,
    pub number: String,
    pub description: String,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub description: String,
    pub coordinates: Coordinates,
    stop_events: BTreeMap<Time, Vec<StopEventId>>,
}

impl Station {
    pub fn new(id: StationId, name: String, description: String, coordinates: Coordinates) -> Self {
        Self {
            id,
            name,
            description,
            coordinates,
            stop_events: BTreeMap::new(),
        }
    }

    /// Stop events at this station by arrival time. Events arriving at the
    /// same time keep the order they were linked in.
    pub fn stop_events(&self) -> impl Iterator<Item = (Time, StopEventId)> + '_ {
        self.stop_events
            .iter()
            .flat_map(|(&arrival, ids)| ids.iter().map(move |&id| (arrival, id)))
    }

    pub fn stop_event_count(&self) -> usize {
        self.stop_events.values().map(Vec::len).sum()
    }

    pub fn has_stop_events(&self) -> bool {
        !self.stop_events.is_empty()
    }

    pub(crate) fn link(&mut self, arrival: Time, id: StopEventId) {
        self.stop_events.entry(arrival).or_default().push(id);
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub line_id: LineId,
    pub service_id: ServiceId,
    pub headsign: String,
    stop_events: Vec<StopEventId>,
}

impl Trip {
    pub fn new(id: TripId, line_id: LineId, service_id: ServiceId, headsign: String) -> Self {
        Self {
            id,
            line_id,
            service_id,
            headsign,
            stop_events: Vec::new(),
        }
    }

    /// Stop events in stop sequence order.
    pub fn stop_events(&self) -> &[StopEventId] {
        &self.stop_events
    }

    pub(crate) fn attach(&mut self, id: StopEventId) {
        self.stop_events.push(id);
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.headsign)
    }
}

/// Handle of a [`StopEvent`] in a schedule's [`StopEvents`] arena. Trips and
/// stations both refer to the same event through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StopEventId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEvent {
    pub station_id: StationId,
    pub arrival: Time,
    pub departure: Time,
    pub sequence: u32,
    pub trip_id: TripId,
}

/// Append-only storage for every stop event of a schedule.
#[derive(Debug, Clone, Default)]
pub struct StopEvents(Vec<StopEvent>);

impl StopEvents {
    pub(crate) fn push(&mut self, event: StopEvent) -> StopEventId {
        self.0.push(event);
        StopEventId(self.0.len() - 1)
    }

    pub fn get(&self, id: StopEventId) -> Option<&StopEvent> {
        self.0.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StopEventId, &StopEvent)> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, event)| (StopEventId(index), event))
    }
}

impl Index<StopEventId> for StopEvents {
    type Output = StopEvent;

    fn index(&self, id: StopEventId) -> &StopEvent {
        &self.0[id.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from: StationId,
    pub to: StationId,
    pub min_seconds: u32,
}
