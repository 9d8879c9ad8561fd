#![no_std]
#![no_main]

mod board;

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_stm32::adc::{self, Adc};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{AnyPin, Input, Level, Output, Pin, Pull, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::peripherals::{self, ADC, DMA1_CH2, DMA1_CH3, I2C1, PA0, PA4, USART2};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, BufferedUart, Config as UsartConfig, UartTx};
use embassy_stm32::bind_interrupts;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Delay, Duration};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use plant_monitor::config::{TickKind, BUTTON_DEBOUNCE};
use plant_monitor::control::{self, ControlState, Indicators, Rgb, Supervisor, TickControl};
use plant_monitor::drivers::{AnalogInputs, I2cSensorSuite};
use plant_monitor::flags::{CadenceSelector, EventFlag, InterruptFlags};
use plant_monitor::mailbox::Mailbox;
use plant_monitor::report::{self, Report, ReportSink};
use plant_monitor::shutdown::ShutdownLatch;
use plant_monitor::state::{GpsFix, Mode, SensorSnapshot};
use plant_monitor::tasks;

use crate::board::Board;

// ── Shared state ──────────────────────────────────────────────────────────────
static FLAGS: InterruptFlags = InterruptFlags::new();
static CADENCE: CadenceSelector = CadenceSelector::new();

//  Single slot, newest value wins; the control core drains both every 100 ms.
static SENSOR_MAILBOX: Mailbox<CriticalSectionRawMutex, SensorSnapshot> = Mailbox::new();
static GPS_MAILBOX: Mailbox<CriticalSectionRawMutex, GpsFix> = Mailbox::new();

static PRODUCERS: ShutdownLatch<CriticalSectionRawMutex, 2> = ShutdownLatch::new();
static BUTTON: ShutdownLatch<CriticalSectionRawMutex, 1> = ShutdownLatch::new();

// Indexed like `TickKind::ALL`.
static TICK_ARMING: [Signal<CriticalSectionRawMutex, bool>; 3] = [Signal::new(), Signal::new(), Signal::new()];

static GPS_TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static GPS_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// ── Interrupt bindings ────────────────────────────────────────────────────────
bind_interrupts!(struct Irqs {
    I2C1 => i2c::EventInterruptHandler<peripherals::I2C1>, i2c::ErrorInterruptHandler<peripherals::I2C1>;
    USART1 => usart::BufferedInterruptHandler<peripherals::USART1>;
    ADC1_COMP => adc::InterruptHandler<peripherals::ADC>;
});

fn arming(kind: TickKind) -> &'static Signal<CriticalSectionRawMutex, bool> {
    match kind {
        TickKind::Test => &TICK_ARMING[0],
        TickKind::Normal => &TICK_ARMING[1],
        TickKind::Stats => &TICK_ARMING[2],
    }
}

// ── Board outputs ─────────────────────────────────────────────────────────────

/// Board side of the control core's output capabilities.
struct Station {
    /// LED1/LED3/LED4, one per mode.
    mode_leds: [Output<'static, AnyPin>; 3],
    /// Common-anode RGB: a low pin lights the channel.
    rgb: [Output<'static, AnyPin>; 3],
    alarm: Output<'static, AnyPin>,
    console: UartTx<'static, USART2>,
}

impl Indicators for Station {
    fn show_mode(&mut self, mode: Mode) {
        let lit = match mode {
            Mode::Test => 0,
            Mode::Normal => 1,
            Mode::Advanced => 2,
        };
        for (i, led) in self.mode_leds.iter_mut().enumerate() {
            led.set_level(if i == lit { Level::High } else { Level::Low });
        }
    }

    fn set_rgb(&mut self, rgb: Rgb) {
        let lit = match rgb {
            Rgb::Off => None,
            Rgb::Red => Some(0),
            Rgb::Green => Some(1),
            Rgb::Blue => Some(2),
        };
        for (i, channel) in self.rgb.iter_mut().enumerate() {
            channel.set_level(if lit == Some(i) { Level::Low } else { Level::High });
        }
    }

    fn set_alarm(&mut self, on: bool) {
        self.alarm.set_level(if on { Level::High } else { Level::Low });
    }
}

impl TickControl for Station {
    fn arm(&mut self, tick: TickKind) {
        arming(tick).signal(true);
    }

    fn disarm(&mut self, tick: TickKind) {
        arming(tick).signal(false);
    }
}

impl Supervisor for Station {
    fn detach_mode_button(&mut self) {
        BUTTON.trip();
    }

    fn abandon_producers(&mut self) {
        PRODUCERS.trip();
    }
}

impl ReportSink for Station {
    fn emit(&mut self, report: &Report) {
        let mut text = heapless::String::<768>::new();
        if report::render(report, &mut text).is_err() {
            error!("report truncated");
        }
        let _ = self.console.blocking_write(text.as_bytes());
    }
}

// ── Analog front end ──────────────────────────────────────────────────────────

struct AnalogFrontEnd {
    adc: Adc<'static, ADC>,
    soil: PA0,
    light: PA4,
}

const ADC_FULL_SCALE: f32 = 4095.0;

impl AnalogInputs for AnalogFrontEnd {
    async fn soil_moisture(&mut self) -> f32 {
        self.adc.read(&mut self.soil).await as f32 / ADC_FULL_SCALE
    }

    async fn light(&mut self) -> f32 {
        self.adc.read(&mut self.light).await as f32 / ADC_FULL_SCALE
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

#[embassy_executor::task]
async fn sensor_task(
    i2c: I2c<'static, I2C1, DMA1_CH2, DMA1_CH3>,
    analog: AnalogFrontEnd,
    mut lamp: Output<'static, AnyPin>,
) {
    let mut delay = Delay;
    let mut suite = I2cSensorSuite::new(i2c, analog);
    if let Err(e) = suite.init(&mut delay).await {
        error!("sensor init failed: {}", e);
    }
    tasks::sensor_task::run(
        &mut suite,
        &mut lamp,
        &mut delay,
        &CADENCE,
        SENSOR_MAILBOX.sender(),
        &PRODUCERS,
    )
    .await;
}

#[embassy_executor::task]
async fn gps_task(mut uart: BufferedUart<'static, peripherals::USART1>) {
    tasks::gps_task::run(&mut uart, &mut Delay, GPS_MAILBOX.sender(), &PRODUCERS).await;
}

#[embassy_executor::task(pool_size = 3)]
async fn tick_task(kind: TickKind, flag: &'static EventFlag) -> ! {
    tasks::tick_source(kind, arming(kind), flag, &mut Delay).await
}

#[embassy_executor::task]
async fn tap_task(mut int1: ExtiInput<'static, peripherals::PA8>) -> ! {
    tasks::forward_edges(&mut int1, &FLAGS.tap, Duration::from_ticks(0), &mut Delay).await
}

#[embassy_executor::task]
async fn freefall_task(mut int2: ExtiInput<'static, peripherals::PB12>) -> ! {
    tasks::forward_edges(&mut int2, &FLAGS.freefall, Duration::from_ticks(0), &mut Delay).await
}

#[embassy_executor::task]
async fn button_task(mut button: ExtiInput<'static, peripherals::PB2>) {
    BUTTON
        .guard(tasks::forward_edges(&mut button, &FLAGS.mode_change, BUTTON_DEBOUNCE, &mut Delay))
        .await;
    info!("mode button detached");
}

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (HSI16)
    let board = Board::init();
    let p = board.p;

    // 2. Console USART2 @ 115200, TX only (PA2)
    let mut console_config = UsartConfig::default();
    console_config.baudrate = 115_200;
    let mut console = UartTx::new(p.USART2, p.PA2, embassy_stm32::dma::NoDma, console_config).unwrap();
    let _ = console.blocking_write(b"\r\nPlant monitor starting\r\n");

    // 3. I2C1 @ 400 kHz: MMA8451, Si7021, TCS34725 (SCL=PB8, SDA=PB9)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8, p.PB9,
        Irqs,
        p.DMA1_CH2,
        p.DMA1_CH3,
        Hertz(400_000),
        Default::default(),
    );

    // 4. ADC: soil moisture (PA0), ambient light (PA4)
    let analog = AnalogFrontEnd {
        adc: Adc::new(p.ADC, Irqs, &mut Delay),
        soil: p.PA0,
        light: p.PA4,
    };

    // 5. GPS USART1 @ 9600 (TX=PA9, RX=PA10)
    let mut gps_config = UsartConfig::default();
    gps_config.baudrate = 9_600;
    let gps_uart = BufferedUart::new(
        p.USART1,
        Irqs,
        p.PA10, p.PA9,
        GPS_TX_BUF.init([0; 16]),
        GPS_RX_BUF.init([0; 256]),
        gps_config,
    )
    .unwrap();

    // 6. Outputs
    let mut station = Station {
        mode_leds: [
            Output::new(p.PB5.degrade(), Level::Low, Speed::Low),
            Output::new(p.PB6.degrade(), Level::Low, Speed::Low),
            Output::new(p.PB7.degrade(), Level::Low, Speed::Low),
        ],
        rgb: [
            Output::new(p.PB14.degrade(), Level::High, Speed::Low),
            Output::new(p.PB15.degrade(), Level::High, Speed::Low),
            Output::new(p.PA12.degrade(), Level::High, Speed::Low),
        ],
        alarm: Output::new(p.PA5.degrade(), Level::Low, Speed::Low),
        console,
    };
    let lamp = Output::new(p.PB13.degrade(), Level::Low, Speed::Low);

    // 7. Interrupt inputs: MMA8451 INT1 tap (PA8), INT2 freefall (PB12), user button (PB2)
    let int1 = ExtiInput::new(Input::new(p.PA8, Pull::Up), p.EXTI8);
    let int2 = ExtiInput::new(Input::new(p.PB12, Pull::Up), p.EXTI12);
    let button = ExtiInput::new(Input::new(p.PB2, Pull::Up), p.EXTI2);

    // 8. Spawn
    for kind in TickKind::ALL {
        spawner.spawn(tick_task(kind, FLAGS.tick(kind))).unwrap();
    }
    spawner.spawn(tap_task(int1)).unwrap();
    spawner.spawn(freefall_task(int2)).unwrap();
    spawner.spawn(button_task(button)).unwrap();
    spawner.spawn(sensor_task(i2c, analog, lamp)).unwrap();
    spawner.spawn(gps_task(gps_uart)).unwrap();

    // 9. Control core runs in the main task until power is removed.
    let mut core = ControlState::new(&FLAGS, &CADENCE, SENSOR_MAILBOX.receiver(), GPS_MAILBOX.receiver());
    info!("control core starting");
    control::run(&mut core, &mut station, &mut Delay).await
}
