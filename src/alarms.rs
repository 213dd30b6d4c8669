use embedded_io::Write;

use crate::constants::{
    DEFAULT_TEMPERATURE_THRESHOLD, MAX_STORED_THRESHOLD, MIN_STORED_THRESHOLD, PANIC_TIMEOUT_MS,
    TEMPERATURE_DELTA_THRESHOLD, TEMPERATURE_SAMPLING_TIME_MS,
};
use crate::phone_book::Slot;
use crate::session::GsmStatus;
use crate::sim800::Sim800;
use crate::tick::TickTimer;
use crate::traits::{AlarmControl, Platform, Reading, TemperatureSensor, ThresholdStore};

/// Alarm switches and threshold, with the threshold backed by `store`.
pub struct AlarmSettings<S: ThresholdStore> {
    store: S,
    threshold: f32,
    enabled: bool,
    auto_rearm: bool,
    temperature: Option<f32>,
}

impl<S: ThresholdStore> AlarmSettings<S> {
    /// Loads the threshold; a missing or out of range value falls back to the
    /// default.
    pub fn new(mut store: S) -> Self {
        let threshold = match store.load() {
            Some(celsius) if celsius > MIN_STORED_THRESHOLD && celsius <= MAX_STORED_THRESHOLD => {
                celsius
            }
            _ => {
                warn!("stored threshold invalid, using default");
                DEFAULT_TEMPERATURE_THRESHOLD
            }
        };
        Self {
            store,
            threshold,
            enabled: true,
            auto_rearm: true,
            temperature: None,
        }
    }

    pub fn record_temperature(&mut self, celsius: f32) {
        self.temperature = Some(celsius);
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ThresholdStore> AlarmControl for AlarmSettings<S> {
    fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn set_threshold(&mut self, celsius: f32) {
        info!("alarm threshold {}", celsius);
        self.threshold = celsius;
        self.store.store(celsius);
    }

    fn alarm_enabled(&self) -> bool {
        self.enabled
    }

    fn set_alarm_enabled(&mut self, enabled: bool) {
        info!("alarm enabled: {}", enabled);
        self.enabled = enabled;
    }

    fn auto_rearm(&self) -> bool {
        self.auto_rearm
    }

    fn set_auto_rearm(&mut self, enabled: bool) {
        self.auto_rearm = enabled;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorState {
    Idle,
    Check,
    /// Calling the phonebook numbers one after the other.
    Calling,
}

/// Low temperature alarm.
///
/// Samples once a minute while the modem is idle. Below the threshold it calls
/// every phonebook number, again at every sample until the alarm is disabled
/// remotely. With auto re-arm on, a disabled alarm is enabled again once the
/// temperature is back above the threshold plus a small margin.
pub struct AlarmMonitor {
    state: MonitorState,
    sampling: TickTimer,
    panic: TickTimer,
    first_check: bool,
}

impl AlarmMonitor {
    pub const fn new() -> Self {
        Self {
            state: MonitorState::Idle,
            sampling: TickTimer::new(0),
            panic: TickTimer::new(0),
            first_check: true,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn poll<T: Write, S: ThresholdStore>(
        &mut self,
        engine: &mut Sim800<T>,
        sensor: &mut impl TemperatureSensor,
        settings: &mut AlarmSettings<S>,
        platform: &mut impl Platform,
    ) {
        let now = platform.now_ms();
        match self.state {
            MonitorState::Idle => {
                if self.first_check || self.sampling.expired(now, TEMPERATURE_SAMPLING_TIME_MS) {
                    self.first_check = false;
                    self.sampling.restart(now);
                    // Skipped while a call or command is in flight.
                    if engine.status() == GsmStatus::Idle {
                        self.state = MonitorState::Check;
                    }
                }
            }
            MonitorState::Check => {
                let celsius = match sensor.sample() {
                    Reading::Pending => return,
                    Reading::Celsius(celsius) => celsius,
                    Reading::Fault => {
                        // Retried after the next sampling period.
                        warn!("temperature sensor fault");
                        self.state = MonitorState::Idle;
                        return;
                    }
                };
                settings.record_temperature(celsius);
                debug!("temperature {}", celsius);
                self.state = MonitorState::Idle;

                if settings.alarm_enabled() && celsius < settings.threshold() {
                    warn!("temperature {} below threshold, calling", celsius);
                    match engine.schedule_call_phonebook_entries() {
                        Ok(()) => {
                            self.panic.restart(now);
                            self.state = MonitorState::Calling;
                        }
                        Err(err) => error!("alarm calls not queued: {}", err),
                    }
                } else if !settings.alarm_enabled()
                    && settings.auto_rearm()
                    && celsius > settings.threshold() + TEMPERATURE_DELTA_THRESHOLD
                {
                    info!("temperature back to normal, alarm re-armed");
                    settings.set_alarm_enabled(true);
                }
            }
            MonitorState::Calling => {
                if self.panic.expired(now, PANIC_TIMEOUT_MS) {
                    error!("alarm calls never completed, resetting");
                    platform.system_reset();
                    return;
                }
                let done = engine.calling().is_some_and(|slot| slot >= Slot::LAST);
                if done && engine.status() == GsmStatus::Idle {
                    info!("alarm calls completed");
                    self.sampling.restart(now);
                    self.state = MonitorState::Idle;
                }
            }
        }
    }
}

impl Default for AlarmMonitor {
    fn default() -> Self {
        Self::new()
    }
}
