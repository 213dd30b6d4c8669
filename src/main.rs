// /src/main.rs
#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use panic_probe as _;

use embassy_executor::Spawner;
use embassy_stm32::usart::RingBufferedUartRx;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embassy_time::{Duration, Timer};

use alarm800l::alarms::{AlarmMonitor, AlarmSettings};
use alarm800l::console::Console;
use alarm800l::constants::{DEBUG_RX_BUFFER_SIZE, SIM800_RX_BUFFER_SIZE};
use alarm800l::traits::{AlarmControl, ByteSource};
use alarm800l::{Config, Sim800};

mod hardware;

/// Power supply settle time before the module is switched on.
const POWER_ON_DELAY: Duration = Duration::from_secs(5);

// --- Global Channels ---
static SIM800_RX: Channel<CriticalSectionRawMutex, u8, SIM800_RX_BUFFER_SIZE> = Channel::new();
static DEBUG_RX: Channel<CriticalSectionRawMutex, u8, DEBUG_RX_BUFFER_SIZE> = Channel::new();

/// Consumer side of a receive channel.
struct ChannelRx<const N: usize>(Receiver<'static, CriticalSectionRawMutex, u8, N>);

impl<const N: usize> ByteSource for ChannelRx<N> {
    fn pop(&mut self) -> Option<u8> {
        self.0.try_receive().ok()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut board = hardware::init();
    info!("Starting Alarm800L...");

    // Spawn Tasks
    spawner.spawn(sim800_rx_task(board.sim800_rx)).unwrap();
    spawner.spawn(debug_rx_task(board.debug_rx)).unwrap();

    Timer::after(POWER_ON_DELAY).await;
    board.sim800_power.set_high();

    let mut mcu = board.mcu;
    let mut sensor = board.ntc;
    let mut settings = AlarmSettings::new(board.threshold_store);
    let mut monitor = AlarmMonitor::new();
    let mut console = Console::new(board.debug_tx);
    let mut engine = Sim800::new(board.sim800_tx, Config::default());
    if let Err(err) = engine.init() {
        error!("SIM800L init failed: {}", err);
    }
    info!("Threshold: {} C", settings.threshold());

    let mut sim800_rx = ChannelRx(SIM800_RX.receiver());
    let mut debug_rx = ChannelRx(DEBUG_RX.receiver());

    loop {
        engine.poll(&mut sim800_rx, &mut mcu, &mut settings);
        monitor.poll(&mut engine, &mut sensor, &mut settings, &mut mcu);
        console.poll(&mut debug_rx, &mut engine, &mut settings);
        // Lets the receive tasks drain the DMA rings.
        Timer::after(Duration::from_millis(1)).await;
    }
}

#[embassy_executor::task]
async fn sim800_rx_task(mut rx: RingBufferedUartRx<'static>) {
    let mut buf = [0u8; 32];
    loop {
        match rx.read(&mut buf).await {
            Ok(len) => {
                for &byte in &buf[..len] {
                    if SIM800_RX.try_send(byte).is_err() {
                        warn!("SIM800 RX queue full, byte dropped");
                    }
                }
            }
            Err(err) => warn!("SIM800 RX error: {:?}", err),
        }
    }
}

#[embassy_executor::task]
async fn debug_rx_task(mut rx: RingBufferedUartRx<'static>) {
    let mut buf = [0u8; 16];
    loop {
        match rx.read(&mut buf).await {
            Ok(len) => {
                for &byte in &buf[..len] {
                    // Console input is best effort.
                    let _ = DEBUG_RX.try_send(byte);
                }
            }
            Err(err) => warn!("console RX error: {:?}", err),
        }
    }
}
