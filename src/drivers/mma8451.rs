use embedded_hal_async::i2c::I2c;

use super::SensorError;

pub const ADDR: u8 = 0x1D;

const REG_OUT_X_MSB: u8 = 0x01;
const REG_FF_MT_CFG: u8 = 0x15;
const REG_FF_MT_THS: u8 = 0x17;
const REG_FF_MT_COUNT: u8 = 0x18;
const REG_PULSE_CFG: u8 = 0x21;
const REG_PULSE_THSX: u8 = 0x23;
const REG_PULSE_THSY: u8 = 0x24;
const REG_PULSE_THSZ: u8 = 0x25;
const REG_PULSE_TMLT: u8 = 0x26;
const REG_PULSE_LTCY: u8 = 0x27;
const REG_CTRL_REG1: u8 = 0x2A;
const REG_CTRL_REG4: u8 = 0x2C;
const REG_CTRL_REG5: u8 = 0x2D;

const CTRL1_ACTIVE: u8 = 0x01;
/// Counts per g in the ±2 g range.
const COUNTS_PER_G: f32 = 4096.0;

/// Register writes applied in standby, in order.
const INIT_SEQUENCE: [(u8, u8); 12] = [
    (REG_CTRL_REG1, 0x08),   // standby, ODR 400 Hz
    (REG_FF_MT_CFG, 0xB8),   // latched freefall, X/Y/Z all below threshold
    (REG_FF_MT_THS, 0x03),   // ~0.19 g
    (REG_FF_MT_COUNT, 0x06), // 15 ms debounce @ 400 Hz
    (REG_PULSE_CFG, 0x15),   // single tap X/Y/Z, ELE clear
    (REG_PULSE_THSX, 0x19),  // 1.575 g
    (REG_PULSE_THSY, 0x19),
    (REG_PULSE_THSZ, 0x2A),  // 2.65 g
    (REG_PULSE_TMLT, 0x50),
    (REG_PULSE_LTCY, 0xF0),
    (REG_CTRL_REG4, 0x0C),   // pulse + freefall interrupts
    (REG_CTRL_REG5, 0x08),   // pulse -> INT1, freefall -> INT2
];

/// MMA8451Q accelerometer with tap (INT1) and freefall (INT2) detection.
pub struct Mma8451 {
    address: u8,
}

impl Mma8451 {
    pub fn new() -> Self {
        Self { address: ADDR }
    }

    pub async fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        for (reg, value) in INIT_SEQUENCE {
            self.write_reg(i2c, reg, value).await?;
        }
        let ctrl1 = self.read_reg(i2c, REG_CTRL_REG1).await?;
        self.write_reg(i2c, REG_CTRL_REG1, ctrl1 | CTRL1_ACTIVE).await
    }

    /// Accelerations in g for X, Y, Z.
    pub async fn read_accelerations<I: I2c>(&mut self, i2c: &mut I) -> Result<[f32; 3], SensorError> {
        let mut buf = [0u8; 6];
        i2c.write_read(self.address, &[REG_OUT_X_MSB], &mut buf)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok([
            decode_axis(buf[0], buf[1]),
            decode_axis(buf[2], buf[3]),
            decode_axis(buf[4], buf[5]),
        ])
    }

    async fn write_reg<I: I2c>(&mut self, i2c: &mut I, reg: u8, value: u8) -> Result<(), SensorError> {
        i2c.write(self.address, &[reg, value]).await.map_err(|_| SensorError::Bus)
    }

    async fn read_reg<I: I2c>(&mut self, i2c: &mut I, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        i2c.write_read(self.address, &[reg], &mut buf)
            .await
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }
}

impl Default for Mma8451 {
    fn default() -> Self {
        Self::new()
    }
}

/// 14-bit left-justified two's complement sample to g.
fn decode_axis(msb: u8, lsb: u8) -> f32 {
    let raw = i16::from_be_bytes([msb, lsb]) >> 2;
    raw as f32 / COUNTS_PER_G
}
