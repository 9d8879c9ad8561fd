//! Console reports emitted by the control core and their text rendering.

use core::fmt::{self, Write};

use crate::state::{DominantColour, GpsFix, Mode, SensorSnapshot};
use crate::stats::{MetricStats, StatsAccumulator};

const RULE: &str = "--------------------------------\r\n";

/// Display validity of the climate readings for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Validity {
    pub temperature: bool,
    pub humidity: bool,
}

impl Validity {
    pub fn of(snapshot: &SensorSnapshot) -> Self {
        Self {
            temperature: snapshot.temperature_valid(),
            humidity: snapshot.humidity_valid(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadingsReport {
    pub mode: Mode,
    pub snapshot: SensorSnapshot,
    pub fix: GpsFix,
    pub validity: Validity,
    pub dominant: Option<DominantColour>,
    pub taps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    Readings(ReadingsReport),
    Stats(StatsAccumulator),
    AdvancedEntered,
    Shutdown,
}

/// Receives every report the control core produces.
pub trait ReportSink {
    fn emit(&mut self, report: &Report);
}

/// Render `report` as console text.
pub fn render<W: Write>(report: &Report, out: &mut W) -> fmt::Result {
    match report {
        Report::Readings(r) => render_readings(r, out),
        Report::Stats(s) => render_stats(s, out),
        Report::AdvancedEntered => {
            out.write_str(RULE)?;
            out.write_str("ADVANCED MODE (FREEFALL DETECTION)\r\n")?;
            out.write_str(RULE)
        }
        Report::Shutdown => {
            out.write_str("Freefall detected on Z-axis. SYSTEM SHUT DOWN!\r\n")?;
            out.write_str("================================\r\n")
        }
    }
}

fn render_readings<W: Write>(r: &ReadingsReport, out: &mut W) -> fmt::Result {
    let s = &r.snapshot;
    out.write_str(RULE)?;
    match r.mode {
        Mode::Test => out.write_str("TEST MODE (Period: 2s)\r\n")?,
        Mode::Normal => out.write_str("NORMAL MODE (Period: 30s)\r\n")?,
        Mode::Advanced => out.write_str("ADVANCED MODE\r\n")?,
    }
    out.write_str(RULE)?;

    write!(
        out,
        "C = {}, R = {}, G = {}, B = {}\r\n",
        s.colour.clear, s.colour.red, s.colour.green, s.colour.blue
    )?;
    write!(out, "ax = {:.2} G, ay = {:.2} G, az = {:.2} G\r\n", s.ax, s.ay, s.az)?;

    if r.validity.temperature {
        write!(out, "T = {:.1} celsius, ", s.temperature_c)?;
    } else {
        out.write_str("Temperature out of valid range! ")?;
    }
    if r.validity.humidity {
        write!(out, "RH = {:.1} %\r\n", s.humidity_pct)?;
    } else {
        out.write_str("Relative humidity out of valid range!\r\n")?;
    }

    write!(out, "Soil moisture = {:.1} %\r\n", s.soil_moisture_pct)?;
    write!(out, "Ambient light = {:.1} %\r\n", s.light_pct)?;

    let fix = &r.fix;
    if fix.has_fix() {
        write!(
            out,
            "Fix Status = {}, Time: {:02}:{:02}:{:.1}, Alt = {:.2} m, Lat = {:.6} deg, Lon = {:.6} deg\r\n",
            fix.fix_status as u8, fix.hour, fix.minute, fix.seconds, fix.altitude, fix.latitude, fix.longitude
        )?;
    } else {
        out.write_str("No GPS fix yet, please wait for signal...\r\n")?;
    }

    render_dominant(r.dominant, out)?;
    write!(out, "Total Taps: {}\r\n", r.taps)
}

fn render_stats<W: Write>(s: &StatsAccumulator, out: &mut W) -> fmt::Result {
    out.write_str(RULE)?;
    out.write_str("ONE HOUR STATS:\r\n")?;
    out.write_str(RULE)?;

    render_metric(out, "RH", "relative humidity", "%", &s.humidity)?;
    render_metric(out, "T", "temperature", "celsius", &s.temperature)?;
    render_metric(out, "SM", "soil moisture", "%", &s.soil_moisture)?;
    render_metric(out, "AL", "ambient light", "%", &s.light)?;

    for (axis, m) in [("ax", &s.ax), ("ay", &s.ay), ("az", &s.az)] {
        if m.is_empty() {
            write!(out, "No valid data for {}\r\n", axis)?;
        } else {
            write!(out, "{}min = {:.2} G, {}max = {:.2} G\r\n", axis, m.min, axis, m.max)?;
        }
    }

    write!(out, "Samples: {}, Taps: {}\r\n", s.sample_count, s.tap_count)?;
    render_dominant(s.colours.dominant(), out)
}

fn render_metric<W: Write>(
    out: &mut W,
    tag: &str,
    label: &str,
    unit: &str,
    m: &MetricStats,
) -> fmt::Result {
    match m.average() {
        Some(avg) => write!(
            out,
            "{tag}min = {:.1} {unit}, {tag}max = {:.1} {unit}, {tag}avg = {:.1} {unit}\r\n",
            m.min, m.max, avg
        ),
        None => write!(out, "No valid data for {}\r\n", label),
    }
}

fn render_dominant<W: Write>(dominant: Option<DominantColour>, out: &mut W) -> fmt::Result {
    match dominant {
        Some(c) => write!(out, "Dominant Color: {}\r\n", c.name()),
        None => out.write_str("Dominant Color: No clear dominant color\r\n"),
    }
}
