//! Compile-time configuration for the station.

use core::ops::RangeInclusive;

use embassy_time::Duration;

// ── Control core ──────────────────────────────────────────────────────────────

/// Control-core polling period. Bounds how long an interrupt flag can sit unseen.
pub const CONTROL_PERIOD: Duration = Duration::from_millis(100);
/// Half-period of the shutdown indicator blink.
pub const SHUTDOWN_BLINK: Duration = Duration::from_millis(500);

// ── Tick periods ──────────────────────────────────────────────────────────────

pub const TEST_TICK_PERIOD: Duration = Duration::from_millis(2_000);
pub const NORMAL_TICK_PERIOD: Duration = Duration::from_millis(30_000);
pub const STATS_TICK_PERIOD: Duration = Duration::from_millis(3_600_000);

// ── Producers ─────────────────────────────────────────────────────────────────

pub const TEST_SAMPLE_PERIOD: Duration = Duration::from_millis(2_000);
pub const NORMAL_SAMPLE_PERIOD: Duration = Duration::from_millis(30_000);
/// Illumination window around the colour read (24 ms integration + margin).
pub const COLOUR_INTEGRATION: Duration = Duration::from_millis(30);
pub const GPS_POLL_PERIOD: Duration = Duration::from_millis(200);
/// Quiet time after a button edge before the next edge counts.
pub const BUTTON_DEBOUNCE: Duration = Duration::from_millis(50);
/// Longest NMEA line kept before the accumulator restarts.
pub const GPS_LINE_CAPACITY: usize = 128;
/// Fixed local-time offset applied to GPS UTC hours.
pub const UTC_OFFSET_HOURS: u8 = 1;

// ── Reading validity ──────────────────────────────────────────────────────────
//
// Display validity uses the open interval, statistics accept the closed one.
// Both are kept as-is: a reading sitting exactly on a bound is flagged on the
// display yet still enters the statistics.

pub const TEMPERATURE_DISPLAY_LIMITS: (f32, f32) = (-10.0, 50.0);
pub const HUMIDITY_DISPLAY_LIMITS: (f32, f32) = (25.0, 75.0);
pub const TEMPERATURE_STATS_RANGE: RangeInclusive<f32> = -10.0..=50.0;
pub const HUMIDITY_STATS_RANGE: RangeInclusive<f32> = 25.0..=75.0;

/// Sensor-loop sampling cadence selected by the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cadence {
    Test,
    Normal,
}

impl Cadence {
    pub const fn period(self) -> Duration {
        match self {
            Cadence::Test => TEST_SAMPLE_PERIOD,
            Cadence::Normal => NORMAL_SAMPLE_PERIOD,
        }
    }
}

/// Periodic timer sources that raise a tick flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickKind {
    Test,
    Normal,
    Stats,
}

impl TickKind {
    pub const ALL: [TickKind; 3] = [TickKind::Test, TickKind::Normal, TickKind::Stats];

    pub const fn period(self) -> Duration {
        match self {
            TickKind::Test => TEST_TICK_PERIOD,
            TickKind::Normal => NORMAL_TICK_PERIOD,
            TickKind::Stats => STATS_TICK_PERIOD,
        }
    }
}
