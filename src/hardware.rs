// hardware.rs
use defmt::{info, warn};
use embassy_stm32::adc::{Adc, SampleTime};
use embassy_stm32::flash::{Blocking, Flash};
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::peripherals::{self, ADC1, IWDG, PA0};
use embassy_stm32::rcc::{
    AHBPrescaler, APBPrescaler, Pll, PllMul, PllPDiv, PllPreDiv, PllQDiv, PllSource, Sysclk,
};
use embassy_stm32::usart::{Config as UartConfig, RingBufferedUartRx, Uart, UartTx};
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_stm32::{bind_interrupts, usart, Config, Peri};
use embassy_time::{Delay, Instant};
use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorKind, ErrorType, Write};

use alarm800l::constants::WATCHDOG_TIMEOUT_MS;
use alarm800l::ntc::NtcSampler;
use alarm800l::traits::{Clock, Reading, SystemReset, TemperatureSensor, ThresholdStore, Watchdog};

bind_interrupts!(pub struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
    USART2 => usart::InterruptHandler<peripherals::USART2>;
});

/// Flash sector 5 of the STM32F401RE keeps the alarm threshold.
const THRESHOLD_SECTOR_OFFSET: u32 = 0x2_0000;
const THRESHOLD_SECTOR_SIZE: u32 = 0x2_0000;

/// Blocking transmit side of a UART, the engine writes whole commands.
pub struct SerialTx(UartTx<'static, Async>);

impl ErrorType for SerialTx {
    type Error = ErrorKind;
}

impl Write for SerialTx {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.blocking_write(buf).map_err(|_| ErrorKind::Other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.blocking_flush().map_err(|_| ErrorKind::Other)
    }
}

/// Watchdog, tick, delay and reset of the MCU.
pub struct Mcu {
    watchdog: IndependentWatchdog<'static, IWDG>,
    delay: Delay,
}

impl Clock for Mcu {
    fn now_ms(&self) -> u32 {
        // Wraps like the 32 bit HAL tick.
        Instant::now().as_millis() as u32
    }
}

impl Watchdog for Mcu {
    fn refresh(&mut self) {
        self.watchdog.pet();
    }
}

impl SystemReset for Mcu {
    fn system_reset(&mut self) {
        cortex_m::peripheral::SCB::sys_reset();
    }
}

impl DelayNs for Mcu {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

/// NTC divider on PA0.
pub struct NtcSensor {
    adc: Adc<'static, ADC1>,
    pin: Peri<'static, PA0>,
    sampler: NtcSampler,
}

impl TemperatureSensor for NtcSensor {
    fn sample(&mut self) -> Reading {
        let raw = self.adc.blocking_read(&mut self.pin);
        self.sampler.push(raw)
    }
}

pub struct FlashThresholdStore {
    flash: Flash<'static, Blocking>,
}

impl ThresholdStore for FlashThresholdStore {
    fn load(&mut self) -> Option<f32> {
        let mut bytes = [0u8; 4];
        match self.flash.blocking_read(THRESHOLD_SECTOR_OFFSET, &mut bytes) {
            Ok(()) => Some(f32::from_le_bytes(bytes)),
            Err(err) => {
                warn!("threshold read failed: {:?}", err);
                None
            }
        }
    }

    fn store(&mut self, celsius: f32) {
        let result = self
            .flash
            .blocking_erase(
                THRESHOLD_SECTOR_OFFSET,
                THRESHOLD_SECTOR_OFFSET + THRESHOLD_SECTOR_SIZE,
            )
            .and_then(|()| {
                self.flash
                    .blocking_write(THRESHOLD_SECTOR_OFFSET, &celsius.to_le_bytes())
            });
        if let Err(err) = result {
            warn!("threshold write failed: {:?}", err);
        }
    }
}

pub struct Board {
    pub sim800_tx: SerialTx,
    pub sim800_rx: RingBufferedUartRx<'static>,
    pub debug_tx: SerialTx,
    pub debug_rx: RingBufferedUartRx<'static>,
    pub sim800_power: Output<'static>,
    pub ntc: NtcSensor,
    pub threshold_store: FlashThresholdStore,
    pub mcu: Mcu,
}

pub fn init() -> Board {
    // 1. Clock Configuration, 84 MHz from the internal oscillator
    let mut config = Config::default();
    config.rcc.hsi = true;
    config.rcc.pll_src = PllSource::HSI;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV16,
        mul: PllMul::MUL336,
        divp: Some(PllPDiv::DIV4),
        divq: Some(PllQDiv::DIV7),
        divr: None,
    });
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV1;
    config.rcc.sys = Sysclk::PLL1_P;

    let p = embassy_stm32::init(config);
    info!("Hardware initialized! Clocked at 84MHz");

    // 2. SIM800L power, held off until the supply settles
    let sim800_power = Output::new(p.PB5, Level::Low, Speed::Low);

    // 3. USART1, SIM800L
    let mut config_u1 = UartConfig::default();
    config_u1.baudrate = 9600;
    let uart1 = Uart::new(
        p.USART1,
        p.PA10, p.PA9,
        Irqs,
        p.DMA2_CH7, p.DMA2_CH2,
        config_u1,
    ).unwrap();
    let (tx1, rx1) = uart1.split();
    let rx1_buf = cortex_m::singleton!(: [u8; 1024] = [0; 1024]).unwrap();

    // 4. USART2, service console
    let mut config_u2 = UartConfig::default();
    config_u2.baudrate = 115200;
    let uart2 = Uart::new(
        p.USART2,
        p.PA3, p.PA2,
        Irqs,
        p.DMA1_CH6, p.DMA1_CH5,
        config_u2,
    ).unwrap();
    let (tx2, rx2) = uart2.split();
    let rx2_buf = cortex_m::singleton!(: [u8; 256] = [0; 256]).unwrap();

    // 5. ADC
    let mut adc = Adc::new(p.ADC1);
    adc.set_sample_time(SampleTime::CYCLES480);

    // 6. Watchdog, starts counting right away
    let mut watchdog = IndependentWatchdog::new(p.IWDG, WATCHDOG_TIMEOUT_MS * 1_000);
    watchdog.unleash();

    Board {
        sim800_tx: SerialTx(tx1),
        sim800_rx: rx1.into_ring_buffered(rx1_buf),
        debug_tx: SerialTx(tx2),
        debug_rx: rx2.into_ring_buffered(rx2_buf),
        sim800_power,
        ntc: NtcSensor {
            adc,
            pin: p.PA0,
            sampler: NtcSampler::new(),
        },
        threshold_store: FlashThresholdStore {
            flash: Flash::new_blocking(p.FLASH),
        },
        mcu: Mcu {
            watchdog,
            delay: Delay,
        },
    }
}
