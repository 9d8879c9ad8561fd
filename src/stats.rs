//! Running statistics gathered during NORMAL mode.

use crate::config::{HUMIDITY_STATS_RANGE, TEMPERATURE_STATS_RANGE};
use crate::state::{DominantColour, SensorSnapshot};

/// min / max / sum / count of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MetricStats {
    pub min: f32,
    pub max: f32,
    pub sum: f32,
    pub count: u32,
}

impl MetricStats {
    pub const EMPTY: Self = Self {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
        sum: 0.0,
        count: 0,
    };

    pub fn update(&mut self, x: f32) {
        self.min = self.min.min(x);
        self.max = self.max.max(x);
        self.sum += x;
        self.count += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `None` when no sample was accepted; never divides by zero.
    pub fn average(&self) -> Option<f32> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f32)
        }
    }
}

impl Default for MetricStats {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Per-sample dominant-colour tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColourTally {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ColourTally {
    pub fn record(&mut self, colour: Option<DominantColour>) {
        match colour {
            Some(DominantColour::Red) => self.red += 1,
            Some(DominantColour::Green) => self.green += 1,
            Some(DominantColour::Blue) => self.blue += 1,
            None => {}
        }
    }

    /// Same strict rule as a single sample, applied to the tallies.
    pub fn dominant(&self) -> Option<DominantColour> {
        DominantColour::of(self.red, self.green, self.blue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsAccumulator {
    pub humidity: MetricStats,
    pub temperature: MetricStats,
    pub soil_moisture: MetricStats,
    pub light: MetricStats,
    pub ax: MetricStats,
    pub ay: MetricStats,
    pub az: MetricStats,
    pub colours: ColourTally,
    pub sample_count: u32,
    pub tap_count: u32,
}

impl StatsAccumulator {
    pub const fn new() -> Self {
        Self {
            humidity: MetricStats::EMPTY,
            temperature: MetricStats::EMPTY,
            soil_moisture: MetricStats::EMPTY,
            light: MetricStats::EMPTY,
            ax: MetricStats::EMPTY,
            ay: MetricStats::EMPTY,
            az: MetricStats::EMPTY,
            colours: ColourTally { red: 0, green: 0, blue: 0 },
            sample_count: 0,
            tap_count: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Fold one NORMAL-tick sample in.
    ///
    /// Humidity and temperature only count inside their closed stats windows;
    /// soil moisture, light and the three axes are always taken.
    pub fn record(&mut self, snapshot: &SensorSnapshot, taps: u32) {
        if HUMIDITY_STATS_RANGE.contains(&snapshot.humidity_pct) {
            self.humidity.update(snapshot.humidity_pct);
        }
        if TEMPERATURE_STATS_RANGE.contains(&snapshot.temperature_c) {
            self.temperature.update(snapshot.temperature_c);
        }

        self.soil_moisture.update(snapshot.soil_moisture_pct);
        self.light.update(snapshot.light_pct);

        self.ax.update(snapshot.ax);
        self.ay.update(snapshot.ay);
        self.az.update(snapshot.az);

        self.colours.record(snapshot.colour.dominant());
        self.sample_count += 1;
        self.tap_count += taps;
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ColourReading;

    fn sample(humidity: f32, temperature: f32) -> SensorSnapshot {
        SensorSnapshot {
            ax: 0.1,
            ay: -0.2,
            az: 1.0,
            soil_moisture_pct: 40.0,
            light_pct: 60.0,
            colour: ColourReading { clear: 100, red: 30, green: 20, blue: 10 },
            temperature_c: temperature,
            humidity_pct: humidity,
        }
    }

    #[test]
    fn reset_restores_sentinels() {
        let mut acc = StatsAccumulator::new();
        acc.record(&sample(50.0, 20.0), 2);
        acc.reset();
        for metric in [acc.humidity, acc.temperature, acc.soil_moisture, acc.light, acc.ax, acc.ay, acc.az] {
            assert_eq!(metric.count, 0);
            assert_eq!(metric.average(), None);
            assert_eq!(metric.min, f32::INFINITY);
            assert_eq!(metric.max, f32::NEG_INFINITY);
        }
        assert_eq!(acc.sample_count, 0);
        assert_eq!(acc.tap_count, 0);
        assert_eq!(acc.colours, ColourTally::default());
    }

    #[test]
    fn humidity_bound_is_accepted_into_stats() {
        let mut acc = StatsAccumulator::new();
        acc.record(&sample(25.0, -10.0), 0);
        assert_eq!(acc.humidity.count, 1);
        assert_eq!(acc.humidity.min, 25.0);
        assert_eq!(acc.temperature.count, 1);
    }

    #[test]
    fn out_of_window_climate_readings_are_skipped() {
        let mut acc = StatsAccumulator::new();
        acc.record(&sample(80.0, 55.0), 0);
        assert!(acc.humidity.is_empty());
        assert!(acc.temperature.is_empty());
        assert_eq!(acc.soil_moisture.count, 1);
        assert_eq!(acc.light.count, 1);
        assert_eq!(acc.sample_count, 1);
    }

    #[test]
    fn min_max_and_average_track_samples() {
        let mut acc = StatsAccumulator::new();
        acc.record(&sample(30.0, 10.0), 1);
        acc.record(&sample(50.0, 30.0), 0);
        assert_eq!(acc.humidity.min, 30.0);
        assert_eq!(acc.humidity.max, 50.0);
        assert_eq!(acc.humidity.average(), Some(40.0));
        assert_eq!(acc.temperature.average(), Some(20.0));
        assert!(acc.az.min <= acc.az.max);
        assert_eq!(acc.tap_count, 1);
        assert_eq!(acc.colours.red, 2);
        assert_eq!(acc.colours.dominant(), Some(DominantColour::Red));
    }

    #[test]
    fn tied_tallies_have_no_dominant_colour() {
        let mut tally = ColourTally::default();
        tally.record(Some(DominantColour::Green));
        tally.record(Some(DominantColour::Blue));
        tally.record(None);
        assert_eq!(tally.dominant(), None);
    }
}
