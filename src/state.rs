//! Shared data types exchanged between the producer tasks and the control core.
//!
//! All types are `Copy` so they move through the mailboxes by value.

use crate::config::{HUMIDITY_DISPLAY_LIMITS, TEMPERATURE_DISPLAY_LIMITS};

// ── Sensor data ───────────────────────────────────────────────────────────────

/// Raw TCS34725 channel counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColourReading {
    pub clear: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl ColourReading {
    pub fn dominant(&self) -> Option<DominantColour> {
        DominantColour::of(self.red, self.green, self.blue)
    }
}

/// One acquisition cycle worth of readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    /// Accelerations in g.
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
    pub soil_moisture_pct: f32,
    pub light_pct: f32,
    pub colour: ColourReading,
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl SensorSnapshot {
    /// Display validity of the temperature (open interval).
    pub fn temperature_valid(&self) -> bool {
        let (lo, hi) = TEMPERATURE_DISPLAY_LIMITS;
        self.temperature_c > lo && self.temperature_c < hi
    }

    /// Display validity of the relative humidity (open interval).
    pub fn humidity_valid(&self) -> bool {
        let (lo, hi) = HUMIDITY_DISPLAY_LIMITS;
        self.humidity_pct > lo && self.humidity_pct < hi
    }
}

// ── Colour dominance ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DominantColour {
    Red,
    Green,
    Blue,
}

impl DominantColour {
    /// A channel dominates only when it is strictly greater than both others;
    /// any tie at the top yields `None`.
    pub fn of<T: PartialOrd>(red: T, green: T, blue: T) -> Option<Self> {
        if red > green && red > blue {
            Some(DominantColour::Red)
        } else if green > red && green > blue {
            Some(DominantColour::Green)
        } else if blue > red && blue > green {
            Some(DominantColour::Blue)
        } else {
            None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DominantColour::Red => "Red",
            DominantColour::Green => "Green",
            DominantColour::Blue => "Blue",
        }
    }
}

// ── GPS ───────────────────────────────────────────────────────────────────────

/// GGA fix quality indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixStatus {
    #[default]
    NoFix = 0,
    GpsFix = 1,
    DgpsFix = 2,
}

impl FixStatus {
    /// Anything outside 0..=2 is treated as no fix.
    pub fn from_quality(quality: u8) -> Self {
        match quality {
            1 => FixStatus::GpsFix,
            2 => FixStatus::DgpsFix,
            _ => FixStatus::NoFix,
        }
    }
}

/// Position and local time decoded from one GGA sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsFix {
    pub fix_status: FixStatus,
    /// Local hour (UTC + fixed offset), 0..=23.
    pub hour: u8,
    pub minute: u8,
    pub seconds: f32,
    /// Signed decimal degrees, south/west negative.
    pub latitude: f32,
    pub longitude: f32,
    /// Metres above mean sea level.
    pub altitude: f32,
}

impl GpsFix {
    pub fn has_fix(&self) -> bool {
        self.fix_status != FixStatus::NoFix
    }
}

// ── Operating mode ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Test,
    Normal,
    Advanced,
}

impl Mode {
    /// Button-press successor: Test → Normal → Advanced → Test.
    pub fn next(self) -> Self {
        match self {
            Mode::Test => Mode::Normal,
            Mode::Normal => Mode::Advanced,
            Mode::Advanced => Mode::Test,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Test => "TEST",
            Mode::Normal => "NORMAL",
            Mode::Advanced => "ADVANCED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominance_requires_strict_maximum() {
        assert_eq!(DominantColour::of(10u16, 10, 5), None);
        assert_eq!(DominantColour::of(10u16, 9, 5), Some(DominantColour::Red));
        assert_eq!(DominantColour::of(5u16, 10, 10), None);
        assert_eq!(DominantColour::of(1u16, 2, 3), Some(DominantColour::Blue));
        assert_eq!(DominantColour::of(0u16, 0, 0), None);
    }

    #[test]
    fn mode_cycle_closes_after_three_presses() {
        let mode = Mode::Test.next().next().next();
        assert_eq!(mode, Mode::Test);
        assert_eq!(Mode::Normal.next(), Mode::Advanced);
    }

    #[test]
    fn display_validity_excludes_bounds() {
        let mut s = SensorSnapshot { temperature_c: 20.0, humidity_pct: 25.0, ..Default::default() };
        assert!(s.temperature_valid());
        assert!(!s.humidity_valid());
        s.humidity_pct = 25.1;
        s.temperature_c = 50.0;
        assert!(s.humidity_valid());
        assert!(!s.temperature_valid());
    }

    #[test]
    fn unknown_fix_quality_is_no_fix() {
        assert_eq!(FixStatus::from_quality(6), FixStatus::NoFix);
        assert_eq!(FixStatus::from_quality(2), FixStatus::DgpsFix);
    }
}
