use core::str::FromStr;

use crate::config::{GPS_LINE_CAPACITY, UTC_OFFSET_HOURS};
use crate::state::{FixStatus, GpsFix};

/// Only GGA sentences from the GPS talker carry a fix we use.
pub const GGA_PREFIX: &str = "$GPGGA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpsError {
    /// Not a `$GPGGA` sentence.
    UnknownSentence,
    /// `*hh` present but does not match the payload.
    Checksum,
    /// Line grew past the buffer before a terminator.
    Overflow,
}

// ─── Line accumulator ───

/// Fixed-capacity NMEA line accumulator.
///
/// A line that outgrows the buffer before its `\n` is dropped and
/// accumulation restarts; a `$` always starts a fresh sentence so the next
/// well-formed line is recovered even after garbage.
pub struct LineBuffer<const N: usize = GPS_LINE_CAPACITY> {
    buf: heapless::Vec<u8, N>,
    discarding: bool,
    pub overflows: u16,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            discarding: false,
            overflows: 0,
        }
    }

    /// Feed one byte. Yields the finished line (without `\n`) on the terminator,
    /// or [`GpsError::Overflow`] on the byte that did not fit.
    pub fn push(&mut self, byte: u8) -> Result<Option<heapless::Vec<u8, N>>, GpsError> {
        match byte {
            b'\n' => {
                let line = core::mem::take(&mut self.buf);
                if core::mem::replace(&mut self.discarding, false) {
                    Ok(None)
                } else {
                    Ok(Some(line))
                }
            }
            b'$' => {
                self.buf.clear();
                self.discarding = false;
                // Fits in a freshly cleared buffer unless N == 0.
                let _ = self.buf.push(byte);
                Ok(None)
            }
            _ if self.discarding => Ok(None),
            _ => match self.buf.push(byte) {
                Ok(()) => Ok(None),
                Err(_) => {
                    self.overflows = self.overflows.wrapping_add(1);
                    self.buf.clear();
                    self.discarding = true;
                    Err(GpsError::Overflow)
                }
            },
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── GGA parser ───

/// Decode a `$GPGGA` line. Any other sentence is rejected.
///
/// Malformed numeric fields fall back to zero instead of failing the whole
/// sentence. When a `*hh` checksum is present it must match.
pub fn parse_sentence(line: &str) -> Result<GpsFix, GpsError> {
    let line = line.trim();
    if !line.starts_with(GGA_PREFIX) {
        return Err(GpsError::UnknownSentence);
    }

    let body = match line.split_once('*') {
        Some((body, checksum)) => {
            if !verify_checksum(body, checksum) {
                return Err(GpsError::Checksum);
            }
            body
        }
        None => line,
    };

    // $GPGGA,time,lat,NS,lon,EW,qual,sats,hdop,alt,M,geoid,M,age,station
    let mut parts = body.split(',');
    parts.next(); // ID

    let time_str = parts.next().unwrap_or("");
    let lat_raw = parts.next().unwrap_or("");
    let ns = parts.next().unwrap_or("");
    let lon_raw = parts.next().unwrap_or("");
    let ew = parts.next().unwrap_or("");
    let qual_str = parts.next().unwrap_or("");
    let _sats = parts.next();
    let _hdop = parts.next();
    let alt_str = parts.next().unwrap_or("");

    let mut fix = GpsFix {
        fix_status: FixStatus::from_quality(u8::from_str(qual_str).unwrap_or(0)),
        altitude: f32::from_str(alt_str).unwrap_or(0.0),
        ..GpsFix::default()
    };

    if let Some((hour, minute, seconds)) = parse_time(time_str) {
        fix.hour = (hour + UTC_OFFSET_HOURS) % 24;
        fix.minute = minute;
        fix.seconds = seconds;
    }

    fix.latitude = parse_coordinate(lat_raw);
    if ns == "S" {
        fix.latitude = -fix.latitude;
    }
    fix.longitude = parse_coordinate(lon_raw);
    if ew == "W" {
        fix.longitude = -fix.longitude;
    }

    Ok(fix)
}

/// `hhmmss[.sss]`; hour is kept in UTC here.
fn parse_time(s: &str) -> Option<(u8, u8, f32)> {
    if s.len() < 6 {
        return None;
    }
    let hour = s.get(0..2).and_then(|h| u8::from_str(h).ok()).unwrap_or(0);
    let minute = s.get(2..4).and_then(|m| u8::from_str(m).ok()).unwrap_or(0);
    let seconds = s.get(4..).and_then(|sec| f32::from_str(sec).ok()).unwrap_or(0.0);
    Some((hour % 24, minute % 60, seconds))
}

/// `(d)ddmm.mmmm` to unsigned decimal degrees.
fn parse_coordinate(s: &str) -> f32 {
    let Ok(raw) = f32::from_str(s) else {
        return 0.0;
    };
    let degrees = (raw / 100.0) as u32 as f32;
    let minutes = raw - degrees * 100.0;
    degrees + minutes / 60.0
}

fn verify_checksum(body: &str, check_str: &str) -> bool {
    let content = body.strip_prefix('$').unwrap_or(body);
    let calc = content.bytes().fold(0u8, |acc, b| acc ^ b);
    // Only the first 2 hex chars count
    let hex = check_str.get(..2).unwrap_or(check_str);
    match u8::from_str_radix(hex.trim(), 16) {
        Ok(val) => calc == val,
        Err(_) => false,
    }
}
