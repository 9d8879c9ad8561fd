//! Producer loops and interrupt-side helpers, independent of the concrete HAL.
//!
//! The firmware wraps each of these in an `#[embassy_executor::task]`.

pub mod gps_task;
pub mod sensor_task;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;

use crate::config::TickKind;
use crate::flags::EventFlag;

/// Raise `flag` on every falling edge of `pin`.
///
/// With a non-zero `settle`, edges arriving within that window after one that
/// was accepted are ignored.
pub async fn forward_edges<P, D>(pin: &mut P, flag: &EventFlag, settle: Duration, delay: &mut D) -> !
where
    P: Wait,
    D: DelayNs,
{
    loop {
        if pin.wait_for_falling_edge().await.is_err() {
            warn!("edge wait failed");
            continue;
        }
        flag.signal();
        if settle.as_ticks() > 0 {
            delay.delay_ms(settle.as_millis() as u32).await;
        }
    }
}

/// Periodic tick source controlled by an arming signal.
///
/// `true` (re)arms and restarts the period from zero, `false` disarms. While
/// armed, the flag for `kind` is raised once per period.
pub async fn tick_source<M, D>(kind: TickKind, arming: &Signal<M, bool>, flag: &EventFlag, delay: &mut D) -> !
where
    M: RawMutex,
    D: DelayNs,
{
    let period_ms = kind.period().as_millis() as u32;
    let mut armed = false;

    loop {
        if !armed {
            armed = arming.wait().await;
            continue;
        }
        match select(delay.delay_ms(period_ms), arming.wait()).await {
            Either::First(()) => flag.signal(),
            Either::Second(rearm) => {
                armed = rearm;
                trace!("{} tick armed: {}", kind, rearm);
            }
        }
    }
}
