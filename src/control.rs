//! Control core: mode state machine, tick handling and the terminal shutdown.
//!
//! The core owns all mutable station state in [`ControlState`] and is driven
//! one iteration at a time by [`ControlState::step`]. Interrupt sources only
//! raise [`EventFlag`](crate::flags::EventFlag)s; producers only fill mailboxes.
//! Everything the core does to the outside world goes through [`ControlIo`].
//!
//! The loop polls on a fixed period rather than waking on events, so interrupt
//! latency is bounded by [`CONTROL_PERIOD`]. Every state change happens inside
//! a single `step`.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use crate::config::{Cadence, TickKind, CONTROL_PERIOD, SHUTDOWN_BLINK};
use crate::flags::{CadenceSelector, InterruptFlags};
use crate::mailbox::MailboxReceiver;
use crate::report::{ReadingsReport, Report, ReportSink, Validity};
use crate::state::{DominantColour, GpsFix, Mode, SensorSnapshot};
use crate::stats::StatsAccumulator;

// ── Output capabilities ───────────────────────────────────────────────────────

/// Tri-colour indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rgb {
    Off,
    Red,
    Green,
    Blue,
}

impl From<Option<DominantColour>> for Rgb {
    fn from(colour: Option<DominantColour>) -> Self {
        match colour {
            Some(DominantColour::Red) => Rgb::Red,
            Some(DominantColour::Green) => Rgb::Green,
            Some(DominantColour::Blue) => Rgb::Blue,
            None => Rgb::Off,
        }
    }
}

/// Status LEDs and the tri-colour indicator.
pub trait Indicators {
    /// Light the status LED belonging to `mode` and turn the others off.
    fn show_mode(&mut self, mode: Mode);
    fn set_rgb(&mut self, rgb: Rgb);
    /// Shutdown blink LED; leaves the other status LEDs untouched.
    fn set_alarm(&mut self, on: bool);
}

/// Periodic tick sources. Arming restarts the period from zero.
pub trait TickControl {
    fn arm(&mut self, tick: TickKind);
    fn disarm(&mut self, tick: TickKind);
}

/// Task supervisor hooks used by the freefall shutdown.
pub trait Supervisor {
    /// Stop reacting to the mode button.
    fn detach_mode_button(&mut self);
    /// Cancel both producer tasks without waiting for them.
    fn abandon_producers(&mut self);
}

pub trait ControlIo: Indicators + TickControl + Supervisor + ReportSink {}

impl<T: Indicators + TickControl + Supervisor + ReportSink> ControlIo for T {}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoreState {
    Running(Mode),
    /// Freefall shutdown. Only a power cycle leaves it.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Continue,
    Halted,
}

pub struct ControlState<'a, M: RawMutex> {
    flags: &'a InterruptFlags,
    cadence: &'a CadenceSelector,
    sensors: MailboxReceiver<'a, M, SensorSnapshot>,
    gps: MailboxReceiver<'a, M, GpsFix>,
    state: CoreState,
    /// Last-known readings; kept when a mailbox is empty.
    snapshot: SensorSnapshot,
    fix: GpsFix,
    pending_taps: u32,
    stats: StatsAccumulator,
}

impl<'a, M: RawMutex> ControlState<'a, M> {
    pub fn new(
        flags: &'a InterruptFlags,
        cadence: &'a CadenceSelector,
        sensors: MailboxReceiver<'a, M, SensorSnapshot>,
        gps: MailboxReceiver<'a, M, GpsFix>,
    ) -> Self {
        Self {
            flags,
            cadence,
            sensors,
            gps,
            state: CoreState::Running(Mode::Test),
            snapshot: SensorSnapshot::default(),
            fix: GpsFix::default(),
            pending_taps: 0,
            stats: StatsAccumulator::new(),
        }
    }

    /// Initial TEST mode outputs: 2 s tick armed, mode LED on, RGB off.
    pub fn start<IO: ControlIo>(&mut self, io: &mut IO) {
        self.cadence.set(Cadence::Test);
        io.arm(TickKind::Test);
        io.show_mode(Mode::Test);
        io.set_rgb(Rgb::Off);
        info!("control core started in TEST mode");
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn mode(&self) -> Option<Mode> {
        match self.state {
            CoreState::Running(mode) => Some(mode),
            CoreState::Halted => None,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.state == CoreState::Halted
    }

    pub fn stats(&self) -> &StatsAccumulator {
        &self.stats
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn fix(&self) -> &GpsFix {
        &self.fix
    }

    pub fn pending_taps(&self) -> u32 {
        self.pending_taps
    }

    /// One control-core iteration.
    pub fn step<IO: ControlIo>(&mut self, io: &mut IO) -> Step {
        let CoreState::Running(_) = self.state else {
            return Step::Halted;
        };

        if self.flags.mode_change.take() {
            self.advance_mode(io);
        }

        if let Some(snapshot) = self.sensors.try_receive() {
            self.snapshot = snapshot;
        }
        if let Some(fix) = self.gps.try_receive() {
            self.fix = fix;
        }

        if self.flags.tap.take() {
            self.pending_taps += 1;
        }

        match self.state {
            CoreState::Running(Mode::Test) => {
                self.drop_stale(TickKind::Normal);
                self.drop_stale(TickKind::Stats);
                self.discard_freefall();
                if self.flags.test_tick.take() {
                    self.on_test_tick(io);
                }
            }
            CoreState::Running(Mode::Normal) => {
                self.drop_stale(TickKind::Test);
                self.discard_freefall();
                if self.flags.normal_tick.take() {
                    self.on_normal_tick(io);
                }
                if self.flags.stats_tick.take() {
                    self.on_stats_tick(io);
                }
            }
            CoreState::Running(Mode::Advanced) => {
                for tick in TickKind::ALL {
                    self.drop_stale(tick);
                }
                if self.flags.freefall.take() {
                    self.shut_down(io);
                    return Step::Halted;
                }
            }
            CoreState::Halted => return Step::Halted,
        }

        Step::Continue
    }

    fn advance_mode<IO: ControlIo>(&mut self, io: &mut IO) {
        let CoreState::Running(current) = self.state else {
            return;
        };

        // Every transition restarts timing from scratch.
        for tick in TickKind::ALL {
            io.disarm(tick);
            self.flags.tick(tick).clear();
        }
        io.set_rgb(Rgb::Off);

        let next = current.next();
        match next {
            Mode::Normal => {
                self.cadence.set(Cadence::Normal);
                self.stats.reset();
                io.arm(TickKind::Normal);
                io.arm(TickKind::Stats);
            }
            Mode::Advanced => {
                self.stats.reset();
                io.emit(&Report::AdvancedEntered);
            }
            Mode::Test => {
                // Taps counted in ADVANCED are never displayed.
                self.pending_taps = 0;
                self.cadence.set(Cadence::Test);
                io.arm(TickKind::Test);
            }
        }

        io.show_mode(next);
        self.state = CoreState::Running(next);
        info!("mode {} -> {}", current.name(), next.name());
    }

    fn on_test_tick<IO: ControlIo>(&mut self, io: &mut IO) {
        let taps = core::mem::take(&mut self.pending_taps);
        let dominant = self.snapshot.colour.dominant();
        io.emit(&self.readings_report(Mode::Test, dominant, taps));
        io.set_rgb(dominant.into());
    }

    fn on_normal_tick<IO: ControlIo>(&mut self, io: &mut IO) {
        let taps = core::mem::take(&mut self.pending_taps);
        let dominant = self.snapshot.colour.dominant();
        let report = self.readings_report(Mode::Normal, dominant, taps);
        io.emit(&report);

        let validity = Validity::of(&self.snapshot);
        let warning = if !validity.temperature {
            Rgb::Red
        } else if !validity.humidity {
            Rgb::Blue
        } else {
            Rgb::Off
        };
        io.set_rgb(warning);

        self.stats.record(&self.snapshot, taps);
    }

    fn on_stats_tick<IO: ControlIo>(&mut self, io: &mut IO) {
        io.emit(&Report::Stats(self.stats));
        self.stats.reset();
    }

    fn shut_down<IO: ControlIo>(&mut self, io: &mut IO) {
        error!("freefall detected, shutting down");
        io.emit(&Report::Shutdown);
        io.detach_mode_button();
        io.abandon_producers();
        for tick in TickKind::ALL {
            io.disarm(tick);
        }
        self.flags.mode_change.clear();
        self.state = CoreState::Halted;
    }

    fn readings_report(
        &self,
        mode: Mode,
        dominant: Option<DominantColour>,
        taps: u32,
    ) -> Report {
        Report::Readings(ReadingsReport {
            mode,
            snapshot: self.snapshot,
            fix: self.fix,
            validity: Validity::of(&self.snapshot),
            dominant,
            taps,
        })
    }

    /// Ticks from a source the current mode does not own are cleared unseen.
    fn drop_stale(&self, tick: TickKind) {
        if self.flags.tick(tick).take() {
            trace!("dropped stale {} tick", tick);
        }
    }

    /// Freefall only matters in ADVANCED; elsewhere it is consumed and ignored.
    fn discard_freefall(&self) {
        if self.flags.freefall.take() {
            debug!("freefall ignored outside ADVANCED mode");
        }
    }
}

/// Run the control core forever: poll every [`CONTROL_PERIOD`] until the
/// freefall shutdown, then blink the alarm LED until power is removed.
pub async fn run<M, IO, D>(core: &mut ControlState<'_, M>, io: &mut IO, delay: &mut D) -> !
where
    M: RawMutex,
    IO: ControlIo,
    D: DelayNs,
{
    core.start(io);

    while core.step(io) == Step::Continue {
        delay.delay_ms(CONTROL_PERIOD.as_millis() as u32).await;
    }

    loop {
        io.set_alarm(true);
        delay.delay_ms(SHUTDOWN_BLINK.as_millis() as u32).await;
        io.set_alarm(false);
        delay.delay_ms(SHUTDOWN_BLINK.as_millis() as u32).await;
    }
}
