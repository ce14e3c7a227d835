//! Plain-text listings of a finished [`Schedule`].

use std::io::{self, Write};

use itertools::Itertools;

use crate::data::{LineId, StationId};
use crate::timetable::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Section {
    Lines,
    Stations,
    Transfers,
    Trips,
    StationStops,
}

pub fn write_section<W: Write>(out: &mut W, schedule: &Schedule, section: Section) -> io::Result<()> {
    match section {
        Section::Lines => write_lines(out, schedule),
        Section::Stations => write_stations(out, schedule),
        Section::Transfers => write_transfers(out, schedule),
        Section::Trips => write_trips(out, schedule),
        Section::StationStops => write_station_stops(out, schedule),
    }
}

fn banner<W: Write>(out: &mut W, title: &str, count: usize) -> io::Result<()> {
    writeln!(out, "========================")?;
    writeln!(out, "   {title}")?;
    writeln!(out, "   COUNT = {count}")?;
    writeln!(out, "========================")
}

fn line_number(schedule: &Schedule, id: LineId) -> &str {
    schedule.line(id).map_or("?", |line| line.number.as_str())
}

fn station_name(schedule: &Schedule, id: StationId) -> String {
    schedule
        .station(id)
        .map_or_else(|| id.to_string(), |station| station.to_string())
}

pub fn write_summary<W: Write>(out: &mut W, schedule: &Schedule) -> io::Result<()> {
    writeln!(out, "Schedule of {} {}", schedule.date(), schedule.window())?;
    writeln!(out, "  lines:       {}", schedule.line_count())?;
    writeln!(out, "  stations:    {}", schedule.station_count())?;
    writeln!(out, "  services:    {}", schedule.service_count())?;
    writeln!(out, "  trips:       {}", schedule.trip_count())?;
    writeln!(out, "  stop events: {}", schedule.stop_event_count())?;
    writeln!(out, "  transfers:   {}", schedule.transfer_count())
}

pub fn write_lines<W: Write>(out: &mut W, schedule: &Schedule) -> io::Result<()> {
    banner(out, "LINES", schedule.line_count())?;
    for line in schedule.lines_by_number().values() {
        writeln!(out, "{} - {} ({})", line.number, line.description, line.category)?;
    }
    writeln!(out)
}

pub fn write_stations<W: Write>(out: &mut W, schedule: &Schedule) -> io::Result<()> {
    banner(out, "STATIONS", schedule.station_count())?;
    for station in schedule.stations().values() {
        writeln!(
            out,
            "{station} ({:.6}, {:.6})",
            station.coordinates.latitude, station.coordinates.longitude
        )?;
    }
    writeln!(out)
}

pub fn write_transfers<W: Write>(out: &mut W, schedule: &Schedule) -> io::Result<()> {
    banner(out, "TRANSFERS", schedule.transfer_count())?;
    for transfer in schedule.transfers() {
        writeln!(
            out,
            "From station {} to station {} in {} seconds",
            transfer.from, transfer.to, transfer.min_seconds
        )?;
    }
    writeln!(out)
}

pub fn write_trips<W: Write>(out: &mut W, schedule: &Schedule) -> io::Result<()> {
    banner(
        out,
        &format!("TRIPS OF {} {}", schedule.date(), schedule.window()),
        schedule.trip_count(),
    )?;
    for trip in schedule.trips().values() {
        writeln!(out, "{} {trip}", line_number(schedule, trip.line_id))?;
        for event in schedule.trip_stop_events(trip) {
            writeln!(
                out,
                "{} station {}",
                event.arrival,
                station_name(schedule, event.station_id)
            )?;
        }
    }
    writeln!(out)
}

pub fn write_station_stops<W: Write>(out: &mut W, schedule: &Schedule) -> io::Result<()> {
    banner(out, "STOPS BY STATION", schedule.stop_event_count())?;
    for station in schedule.stations().values() {
        writeln!(out, "Station {station}")?;
        for event in schedule.station_stop_events(station) {
            let Some(trip) = schedule.trip(&event.trip_id) else {
                continue;
            };
            writeln!(
                out,
                "{} - {} {trip}",
                event.arrival,
                line_number(schedule, trip.line_id)
            )?;
        }
        let lines = schedule
            .station_stop_events(station)
            .filter_map(|event| schedule.trip(&event.trip_id))
            .map(|trip| line_number(schedule, trip.line_id))
            .unique()
            .join(", ");
        writeln!(out, "Lines: {lines}")?;
    }
    writeln!(out)
}
