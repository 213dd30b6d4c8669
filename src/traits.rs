use embedded_hal::delay::DelayNs;
use heapless::spsc::Consumer;

/// Receive side of a serial channel.
pub trait ByteSource {
    /// Pops the oldest received byte, `None` when nothing is pending.
    fn pop(&mut self) -> Option<u8>;
}

impl ByteSource for Consumer<'_, u8> {
    fn pop(&mut self) -> Option<u8> {
        self.dequeue()
    }
}

/// Monotonic millisecond tick. Wraps around at `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Hardware liveness watchdog.
pub trait Watchdog {
    fn refresh(&mut self);
}

pub trait SystemReset {
    /// Restarts the controller. On hardware this never returns.
    fn system_reset(&mut self);
}

/// Everything the cooperative engines need from the board.
pub trait Platform: Clock + Watchdog + SystemReset + DelayNs {}

impl<T: Clock + Watchdog + SystemReset + DelayNs> Platform for T {}

/// Alarm settings shared between the remote commands and the temperature
/// alarm.
pub trait AlarmControl {
    /// Last stabilized reading in Celsius, `None` while not yet sampled.
    fn temperature(&self) -> Option<f32>;
    fn threshold(&self) -> f32;
    /// Sets and persists the alarm threshold.
    fn set_threshold(&mut self, celsius: f32);
    fn alarm_enabled(&self) -> bool;
    fn set_alarm_enabled(&mut self, enabled: bool);
    fn auto_rearm(&self) -> bool;
    fn set_auto_rearm(&mut self, enabled: bool);
}

/// Outcome of one sampling step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// Still averaging.
    Pending,
    Celsius(f32),
    /// Open or shorted sensor.
    Fault,
}

pub trait TemperatureSensor {
    /// Advances the sampling; yields a reading once one is stable.
    fn sample(&mut self) -> Reading;
}

/// Non-volatile storage for the alarm threshold.
pub trait ThresholdStore {
    fn load(&mut self) -> Option<f32>;
    fn store(&mut self, celsius: f32);
}
