use embedded_hal_async::i2c::I2c;

use super::SensorError;

pub const ADDR: u8 = 0x40;

const CMD_MEASURE_RH_HOLD: u8 = 0xE5;
const CMD_MEASURE_TEMP_HOLD: u8 = 0xE3;

/// Si7021 humidity / temperature sensor, hold-master measurements.
pub struct Si7021 {
    address: u8,
}

impl Si7021 {
    pub fn new() -> Self {
        Self { address: ADDR }
    }

    /// Relative humidity in percent, clamped to 0..=100.
    pub async fn read_humidity<I: I2c>(&mut self, i2c: &mut I) -> Result<f32, SensorError> {
        let raw = self.measure(i2c, CMD_MEASURE_RH_HOLD).await?;
        Ok(humidity_from_raw(raw))
    }

    /// Temperature in degrees Celsius.
    pub async fn read_temperature<I: I2c>(&mut self, i2c: &mut I) -> Result<f32, SensorError> {
        let raw = self.measure(i2c, CMD_MEASURE_TEMP_HOLD).await?;
        Ok(temperature_from_raw(raw))
    }

    async fn measure<I: I2c>(&mut self, i2c: &mut I, command: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        i2c.write_read(self.address, &[command], &mut buf)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl Default for Si7021 {
    fn default() -> Self {
        Self::new()
    }
}

fn humidity_from_raw(raw: u16) -> f32 {
    let rh = 125.0 * raw as f32 / 65536.0 - 6.0;
    rh.clamp(0.0, 100.0)
}

fn temperature_from_raw(raw: u16) -> f32 {
    175.72 * raw as f32 / 65536.0 - 46.85
}
