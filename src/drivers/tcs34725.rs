use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use super::SensorError;
use crate::state::ColourReading;

pub const ADDR: u8 = 0x29;

const COMMAND_BIT: u8 = 0x80;
/// Command TYPE=01: register address advances on each byte read.
const AUTO_INCREMENT: u8 = 0x20;
const REG_ENABLE: u8 = 0x00;
const REG_ATIME: u8 = 0x01;
const REG_CONTROL: u8 = 0x0F;
const REG_ID: u8 = 0x12;
const REG_CDATAL: u8 = 0x14;

const ENABLE_PON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;
/// 24 ms integration.
const ATIME_24MS: u8 = 0xF6;
const GAIN_4X: u8 = 0x01;

const ID_TCS34725: u8 = 0x44;
const ID_TCS34727: u8 = 0x4D;

/// TCS34725 RGBC colour sensor.
pub struct Tcs34725 {
    address: u8,
}

impl Tcs34725 {
    pub fn new() -> Self {
        Self { address: ADDR }
    }

    pub async fn init<I: I2c, D: DelayNs>(&mut self, i2c: &mut I, delay: &mut D) -> Result<(), SensorError> {
        let id = self.read_reg(i2c, REG_ID).await?;
        if id != ID_TCS34725 && id != ID_TCS34727 {
            return Err(SensorError::NotReady);
        }
        self.write_reg(i2c, REG_ATIME, ATIME_24MS).await?;
        self.write_reg(i2c, REG_CONTROL, GAIN_4X).await?;
        self.write_reg(i2c, REG_ENABLE, ENABLE_PON).await?;
        // Oscillator warm-up before enabling the ADC.
        delay.delay_ms(3).await;
        self.write_reg(i2c, REG_ENABLE, ENABLE_PON | ENABLE_AEN).await
    }

    /// Clear, red, green and blue counts in one burst read.
    pub async fn read_colour<I: I2c>(&mut self, i2c: &mut I) -> Result<ColourReading, SensorError> {
        let mut buf = [0u8; 8];
        i2c.write_read(self.address, &[COMMAND_BIT | AUTO_INCREMENT | REG_CDATAL], &mut buf)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok(decode_channels(&buf))
    }

    async fn write_reg<I: I2c>(&mut self, i2c: &mut I, reg: u8, value: u8) -> Result<(), SensorError> {
        i2c.write(self.address, &[COMMAND_BIT | reg, value])
            .await
            .map_err(|_| SensorError::Bus)
    }

    async fn read_reg<I: I2c>(&mut self, i2c: &mut I, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        i2c.write_read(self.address, &[COMMAND_BIT | reg], &mut buf)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }
}

impl Default for Tcs34725 {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_channels(buf: &[u8; 8]) -> ColourReading {
    ColourReading {
        clear: u16::from_le_bytes([buf[0], buf[1]]),
        red: u16::from_le_bytes([buf[2], buf[3]]),
        green: u16::from_le_bytes([buf[4], buf[5]]),
        blue: u16::from_le_bytes([buf[6], buf[7]]),
    }
}
