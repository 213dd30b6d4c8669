use crate::constants::*;

/// Runtime timings and identity of the alarm unit.
///
/// `Default` gives the values the SIM800L module was tuned with; tests shrink
/// them to keep the simulated clock short.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Name printed in the header of every status and help SMS.
    pub device_name: &'static str,
    pub firmware_version: &'static str,
    /// Length of one call inactivity window, also used as the idle liveness
    /// probe interval.
    pub call_inactivity_timeout_ms: u32,
    /// Settle time after a hang-up before the engine accepts new work.
    pub hangup_timeout_ms: u32,
    /// Pause after every completed command.
    pub at_delay_ms: u32,
    pub starting_delay_ms: u32,
    pub ready_probe_interval_ms: u32,
    pub reset_delay_ms: u32,
    pub cops_retry_delay_ms: u32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            device_name: DEVICE_NAME,
            firmware_version: FIRMWARE_VERSION,
            call_inactivity_timeout_ms: CALL_INACTIVITY_TIMEOUT_MS,
            hangup_timeout_ms: HANGUP_TIMEOUT_MS,
            at_delay_ms: AT_DELAY_MS,
            starting_delay_ms: GSM_STARTING_DELAY_MS,
            ready_probe_interval_ms: READY_PROBE_INTERVAL_MS,
            reset_delay_ms: RESET_DELAY_MS,
            cops_retry_delay_ms: COPS_RETRY_DELAY_MS,
        }
    }

    pub fn device_name(mut self, name: &'static str) -> Self {
        self.device_name = name;
        self
    }

    pub fn call_inactivity_timeout_ms(mut self, ms: u32) -> Self {
        self.call_inactivity_timeout_ms = ms;
        self
    }

    pub fn hangup_timeout_ms(mut self, ms: u32) -> Self {
        self.hangup_timeout_ms = ms;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
