pub mod gps;
pub mod mma8451;
pub mod si7021;
pub mod tcs34725;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::state::ColourReading;
use mma8451::Mma8451;
use si7021::Si7021;
use tcs34725::Tcs34725;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// I2C transaction failed (NACK, arbitration, timeout).
    Bus,
    /// Device answered with an unexpected identity.
    NotReady,
}

/// Everything the sensor task reads in one acquisition cycle.
#[allow(async_fn_in_trait)]
pub trait SensorSuite {
    async fn read_accelerations(&mut self) -> Result<[f32; 3], SensorError>;
    async fn read_humidity(&mut self) -> Result<f32, SensorError>;
    async fn read_temperature(&mut self) -> Result<f32, SensorError>;
    async fn read_colour(&mut self) -> Result<ColourReading, SensorError>;
    /// Soil moisture in percent, 0..=100.
    async fn read_soil_moisture(&mut self) -> f32;
    /// Ambient light in percent, 0..=100.
    async fn read_light(&mut self) -> f32;
}

/// Analog front end. Both channels return the ADC reading as a fraction of full scale.
#[allow(async_fn_in_trait)]
pub trait AnalogInputs {
    async fn soil_moisture(&mut self) -> f32;
    async fn light(&mut self) -> f32;
}

/// Fraction of full scale to percent, clamped. NaN reads as 0.
pub fn percent(fraction: f32) -> f32 {
    let pct = fraction * 100.0;
    if pct.is_nan() {
        0.0
    } else {
        pct.clamp(0.0, 100.0)
    }
}

/// The three I2C sensors sharing one bus plus the analog inputs.
pub struct I2cSensorSuite<I, A> {
    i2c: I,
    accel: Mma8451,
    climate: Si7021,
    colour: Tcs34725,
    analog: A,
}

impl<I: I2c, A: AnalogInputs> I2cSensorSuite<I, A> {
    pub fn new(i2c: I, analog: A) -> Self {
        Self {
            i2c,
            accel: Mma8451::new(),
            climate: Si7021::new(),
            colour: Tcs34725::new(),
            analog,
        }
    }

    /// Configure the accelerometer interrupts and power up the colour sensor.
    pub async fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), SensorError> {
        self.accel.init(&mut self.i2c).await?;
        self.colour.init(&mut self.i2c, delay).await?;
        info!("sensors initialised");
        Ok(())
    }
}

impl<I: I2c, A: AnalogInputs> SensorSuite for I2cSensorSuite<I, A> {
    async fn read_accelerations(&mut self) -> Result<[f32; 3], SensorError> {
        self.accel.read_accelerations(&mut self.i2c).await
    }

    async fn read_humidity(&mut self) -> Result<f32, SensorError> {
        self.climate.read_humidity(&mut self.i2c).await
    }

    async fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.climate.read_temperature(&mut self.i2c).await
    }

    async fn read_colour(&mut self) -> Result<ColourReading, SensorError> {
        self.colour.read_colour(&mut self.i2c).await
    }

    async fn read_soil_moisture(&mut self) -> f32 {
        percent(self.analog.soil_moisture().await)
    }

    async fn read_light(&mut self) -> f32 {
        percent(self.analog.light().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation, SevenBitAddress};

    // ----------------------------------------------------------------------------
    // Fake bus: answers reads by (address, register)
    // ----------------------------------------------------------------------------

    #[derive(Default)]
    struct FakeBus {
        writes: Vec<(u8, Vec<u8>)>,
        fail: bool,
    }

    impl FakeBus {
        fn answer(address: u8, reg: u8, out: &mut [u8]) {
            let data: &[u8] = match (address, reg) {
                (mma8451::ADDR, 0x2A) => &[0x08],
                (mma8451::ADDR, 0x01) => &[0x40, 0x00, 0x00, 0x00, 0xC0, 0x00],
                (si7021::ADDR, 0xE5) => &[0x7C, 0x80],
                (si7021::ADDR, 0xE3) => &[0x66, 0x14],
                (tcs34725::ADDR, 0x92) => &[0x44],
                (tcs34725::ADDR, 0xB4) => &[0, 0, 30, 0, 20, 0, 10, 0],
                _ => &[],
            };
            for (dst, src) in out.iter_mut().zip(data) {
                *dst = *src;
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c<SevenBitAddress> for FakeBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            let mut reg = 0;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        reg = bytes.first().copied().unwrap_or(0);
                        self.writes.push((address, bytes.to_vec()));
                    }
                    Operation::Read(buf) => Self::answer(address, reg, buf),
                }
            }
            Ok(())
        }
    }

    struct FixedAnalog(f32, f32);

    impl AnalogInputs for FixedAnalog {
        async fn soil_moisture(&mut self) -> f32 {
            self.0
        }
        async fn light(&mut self) -> f32 {
            self.1
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    // ----------------------------------------------------------------------------
    // Tests
    // ----------------------------------------------------------------------------

    #[test]
    fn percent_clamps_and_rejects_nan() {
        assert_eq!(percent(0.5), 50.0);
        assert_eq!(percent(1.2), 100.0);
        assert_eq!(percent(-0.1), 0.0);
        assert_eq!(percent(f32::NAN), 0.0);
    }

    #[test]
    fn init_activates_accelerometer_last() {
        let mut suite = I2cSensorSuite::new(FakeBus::default(), FixedAnalog(0.0, 0.0));
        block_on(suite.init(&mut NoDelay)).unwrap();

        let accel_writes: Vec<_> = suite
            .i2c
            .writes
            .iter()
            .filter(|(addr, bytes)| *addr == mma8451::ADDR && bytes.len() == 2)
            .collect();
        assert_eq!(accel_writes.first().unwrap().1, vec![0x2A, 0x08]);
        assert_eq!(accel_writes.last().unwrap().1, vec![0x2A, 0x09]);

        let colour_enable = suite
            .i2c
            .writes
            .iter()
            .rev()
            .find(|(addr, _)| *addr == tcs34725::ADDR)
            .unwrap();
        assert_eq!(colour_enable.1, vec![0x80, 0x03]);
    }

    #[test]
    fn reads_every_sensor() {
        let mut suite = I2cSensorSuite::new(FakeBus::default(), FixedAnalog(0.25, 0.75));
        let accel = block_on(suite.read_accelerations()).unwrap();
        assert_eq!(accel, [1.0, 0.0, -1.0]);

        let rh = block_on(suite.read_humidity()).unwrap();
        assert!((rh - 54.8).abs() < 0.1);
        let t = block_on(suite.read_temperature()).unwrap();
        assert!((t - 23.2).abs() < 0.1);

        let colour = block_on(suite.read_colour()).unwrap();
        assert_eq!((colour.red, colour.green, colour.blue), (30, 20, 10));

        assert_eq!(block_on(suite.read_soil_moisture()), 25.0);
        assert_eq!(block_on(suite.read_light()), 75.0);
    }

    #[test]
    fn colour_burst_read_uses_auto_increment() {
        let mut suite = I2cSensorSuite::new(FakeBus::default(), FixedAnalog(0.0, 0.0));
        block_on(suite.read_colour()).unwrap();
        assert_eq!(suite.i2c.writes, vec![(tcs34725::ADDR, vec![0xB4])]);
    }

    #[test]
    fn bus_failure_maps_to_sensor_error() {
        let bus = FakeBus { fail: true, ..Default::default() };
        let mut suite = I2cSensorSuite::new(bus, FixedAnalog(0.0, 0.0));
        assert_eq!(block_on(suite.read_humidity()), Err(SensorError::Bus));
        assert_eq!(block_on(suite.init(&mut NoDelay)), Err(SensorError::Bus));
    }

    #[test]
    fn wrong_colour_sensor_id_is_not_ready() {
        struct WrongId;
        impl ErrorType for WrongId {
            type Error = ErrorKind;
        }
        impl I2c<SevenBitAddress> for WrongId {
            async fn transaction(
                &mut self,
                _address: u8,
                operations: &mut [Operation<'_>],
            ) -> Result<(), Self::Error> {
                for op in operations {
                    if let Operation::Read(buf) = op {
                        buf.fill(0x11);
                    }
                }
                Ok(())
            }
        }
        let mut suite = I2cSensorSuite::new(WrongId, FixedAnalog(0.0, 0.0));
        assert_eq!(block_on(suite.init(&mut NoDelay)), Err(SensorError::NotReady));
    }
}
