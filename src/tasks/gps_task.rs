use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::Read;

use crate::config::GPS_POLL_PERIOD;
use crate::drivers::gps::{parse_sentence, GpsError, LineBuffer};
use crate::mailbox::MailboxSender;
use crate::shutdown::ShutdownLatch;
use crate::state::GpsFix;

const CHUNK: usize = 64;

/// NMEA byte stream to GGA fixes.
///
/// At most one fix is produced per poll; bytes following it stay in the
/// carried chunk and are consumed first on the next poll.
pub struct GpsReceiver {
    lines: LineBuffer,
    chunk: [u8; CHUNK],
    pos: usize,
    len: usize,
}

impl GpsReceiver {
    pub const fn new() -> Self {
        Self {
            lines: LineBuffer::new(),
            chunk: [0; CHUNK],
            pos: 0,
            len: 0,
        }
    }

    /// Lines dropped for outgrowing the accumulator.
    pub fn overflows(&self) -> u16 {
        self.lines.overflows
    }

    /// Drain carried bytes, then keep reading from `serial` until a fix turns
    /// up or the read yields nothing.
    pub async fn poll<R: Read>(&mut self, serial: &mut R) -> Option<GpsFix> {
        loop {
            if let Some(fix) = self.drain() {
                return Some(fix);
            }
            match serial.read(&mut self.chunk).await {
                Ok(0) => return None,
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                }
                Err(_) => {
                    warn!("gps uart read failed");
                    return None;
                }
            }
        }
    }

    fn drain(&mut self) -> Option<GpsFix> {
        while self.pos < self.len {
            let byte = self.chunk[self.pos];
            self.pos += 1;
            match self.lines.push(byte) {
                Ok(Some(line)) => {
                    let Ok(text) = core::str::from_utf8(&line) else {
                        continue;
                    };
                    match parse_sentence(text) {
                        Ok(fix) => return Some(fix),
                        Err(GpsError::UnknownSentence) => {}
                        Err(e) => debug!("gga rejected: {}", e),
                    }
                }
                Ok(None) => {}
                Err(e) => debug!("nmea line dropped: {}", e),
            }
        }
        None
    }
}

impl Default for GpsReceiver {
    fn default() -> Self {
        Self::new()
    }
}

/// GPS producer: poll the UART, publish each fix, until the latch trips.
pub async fn run<R, D, M, LM, const N: usize>(
    serial: &mut R,
    delay: &mut D,
    tx: MailboxSender<'_, M, GpsFix>,
    latch: &ShutdownLatch<LM, N>,
) where
    R: Read,
    D: DelayNs,
    M: RawMutex,
    LM: RawMutex,
{
    let mut receiver = GpsReceiver::new();

    latch
        .guard(async {
            loop {
                if let Some(fix) = receiver.poll(&mut *serial).await {
                    let _ = tx.try_send(fix);
                }
                delay.delay_ms(GPS_POLL_PERIOD.as_millis() as u32).await;
            }
        })
        .await;

    info!("gps task stopped");
}
