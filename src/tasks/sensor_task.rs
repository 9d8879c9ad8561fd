use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

use crate::config::COLOUR_INTEGRATION;
use crate::drivers::SensorSuite;
use crate::flags::CadenceSelector;
use crate::mailbox::MailboxSender;
use crate::shutdown::ShutdownLatch;
use crate::state::SensorSnapshot;

/// One acquisition cycle over the sensor suite.
///
/// A failed read keeps the previous value for that quantity, so a flaky bus
/// degrades to stale data instead of zeros.
#[derive(Default)]
pub struct SensorSampler {
    last: SensorSnapshot,
}

impl SensorSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> &SensorSnapshot {
        &self.last
    }

    pub async fn sample<S, L, D>(&mut self, suite: &mut S, lamp: &mut L, delay: &mut D) -> SensorSnapshot
    where
        S: SensorSuite,
        L: OutputPin,
        D: DelayNs,
    {
        let s = &mut self.last;

        match suite.read_accelerations().await {
            Ok([ax, ay, az]) => {
                s.ax = ax;
                s.ay = ay;
                s.az = az;
            }
            Err(e) => warn!("accelerometer read failed: {}", e),
        }
        match suite.read_humidity().await {
            Ok(rh) => s.humidity_pct = rh,
            Err(e) => warn!("humidity read failed: {}", e),
        }
        match suite.read_temperature().await {
            Ok(t) => s.temperature_c = t,
            Err(e) => warn!("temperature read failed: {}", e),
        }
        s.soil_moisture_pct = suite.read_soil_moisture().await;
        s.light_pct = suite.read_light().await;

        // White LED lights the target for the whole integration window.
        let _ = lamp.set_high();
        delay.delay_ms(COLOUR_INTEGRATION.as_millis() as u32).await;
        let colour = suite.read_colour().await;
        let _ = lamp.set_low();
        match colour {
            Ok(c) => s.colour = c,
            Err(e) => warn!("colour read failed: {}", e),
        }

        *s
    }
}

/// Sensor producer: sample, publish, sleep for the current cadence, until the
/// latch trips. The lamp is forced off once the loop is abandoned.
pub async fn run<S, L, D, M, LM, const N: usize>(
    suite: &mut S,
    lamp: &mut L,
    delay: &mut D,
    cadence: &CadenceSelector,
    tx: MailboxSender<'_, M, SensorSnapshot>,
    latch: &ShutdownLatch<LM, N>,
) where
    S: SensorSuite,
    L: OutputPin,
    D: DelayNs,
    M: RawMutex,
    LM: RawMutex,
{
    let mut sampler = SensorSampler::new();

    latch
        .guard(async {
            loop {
                let snapshot = sampler.sample(&mut *suite, &mut *lamp, &mut *delay).await;
                if !tx.try_send(snapshot) {
                    debug!("unread sensor snapshot replaced");
                }
                delay.delay_ms(cadence.get().period().as_millis() as u32).await;
            }
        })
        .await;

    let _ = lamp.set_low();
    info!("sensor task stopped");
}
