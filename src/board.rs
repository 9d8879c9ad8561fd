use embassy_stm32::rcc::*;
use embassy_stm32::Config;

/// B-L072Z-LRWAN1 (STM32L072CZ) bring-up.
pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();
        // HSI16 straight to SYSCLK; the sensors and a 9600 baud GPS need nothing faster.
        config.rcc.hsi = true;
        config.rcc.sys = Sysclk::HSI;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV1;
        config.rcc.apb2_pre = APBPrescaler::DIV1;

        let p = embassy_stm32::init(config);

        Self { p }
    }
}
