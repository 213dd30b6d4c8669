// /src/constants.rs
/// Commands that can wait in the scheduler at the same time.
pub const MAX_SCHEDULER: usize = 32;
/// The module phonebook is read with `AT+CPBR=1,3`, keep both in sync.
pub const MAX_PHONEBOOK_ENTRY: usize = 3;

pub const MAX_NUM_LENGTH: usize = 32;
/// SMS recipients and caller ids must be strictly shorter than this.
pub const MAX_RECIPIENT_LENGTH: usize = 16;
pub const MAX_SMS_LENGTH: usize = 512;
pub const MAX_AT_LENGTH: usize = 64;
pub const MAX_IMEI_LENGTH: usize = 16;
pub const MAX_OPERATOR_LENGTH: usize = 64;

pub const PARSER_BUFFER_SIZE: usize = 128;
pub const CONSOLE_BUFFER_SIZE: usize = 64;
pub const CONSOLE_PREFIX: &str = "#";

/// Longest remote command is `*N*<number>**`.
pub const MAX_DTMF_LENGTH: usize = 3 + MAX_NUM_LENGTH + 2;

pub const CTRL_Z: u8 = 0x1A;

/// Hardware watchdog window; a stuck reply wait ends in a reset.
pub const WATCHDOG_TIMEOUT_MS: u32 = 30_000;
pub const CALL_INACTIVITY_TIMEOUT_MS: u32 = 25_000;
pub const CALL_INACTIVITY_LIMIT: u8 = 3;
pub const HANGUP_TIMEOUT_MS: u32 = 5_000;
pub const AT_DELAY_MS: u32 = 200;
pub const GSM_STARTING_DELAY_MS: u32 = 1_000;
pub const READY_PROBE_INTERVAL_MS: u32 = 1_000;
pub const READY_OK_COUNT: u8 = 2;
pub const RESET_DELAY_MS: u32 = 2_000;
pub const COPS_RETRY_DELAY_MS: u32 = 1_000;

pub const TEMPERATURE_SAMPLING_TIME_MS: u32 = 60_000;
pub const TEMPERATURE_DELTA_THRESHOLD: f32 = 1.0;
pub const PANIC_TIMEOUT_MS: u32 = 300_000;
pub const DEFAULT_TEMPERATURE_THRESHOLD: f32 = 100.0;
pub const MIN_STORED_THRESHOLD: f32 = -50.0;
pub const MAX_STORED_THRESHOLD: f32 = 100.0;

pub const DEVICE_NAME: &str = "ALARM800L";
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SIM800_RX_BUFFER_SIZE: usize = 256;
pub const DEBUG_RX_BUFFER_SIZE: usize = 64;
