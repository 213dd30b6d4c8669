// /src/session.rs
use heapless::String;

use crate::command::CommandKind;
use crate::constants::{MAX_IMEI_LENGTH, MAX_OPERATOR_LENGTH, MAX_RECIPIENT_LENGTH};
use crate::phone_book::{PhoneBook, Slot};

/// State of the modem engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GsmStatus {
    WaitingForReady,
    /// Settling after a hang-up.
    WaitingForIdle,
    Idle,
    SendCommand,
    WaitingForReply,
    /// Outgoing call placed.
    CallInProgress,
    /// Incoming call answered.
    CallAnswered,
    Error,
}

impl GsmStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            GsmStatus::WaitingForReady => "WAITING FOR READY",
            GsmStatus::WaitingForIdle => "WAITING FOR IDLE",
            GsmStatus::Idle => "IDLE",
            GsmStatus::SendCommand => "SEND AT COMMAND",
            GsmStatus::WaitingForReply => "WAITING FOR AT REPLY",
            GsmStatus::CallInProgress => "CALL IN PROGRESS",
            GsmStatus::CallAnswered => "CALL ANSWERED",
            GsmStatus::Error => "ERROR",
        }
    }

    pub const fn in_call(self) -> bool {
        matches!(self, GsmStatus::CallInProgress | GsmStatus::CallAnswered)
    }
}

/// Everything the engine knows about the module and the current call.
///
/// Signal, battery, operator, caller id and phonebook are written only by the
/// reply classifier; the rest only by the state machine.
pub struct Session {
    pub imei: String<MAX_IMEI_LENGTH>,
    pub operator: String<MAX_OPERATOR_LENGTH>,
    pub caller_id: String<MAX_RECIPIENT_LENGTH>,
    pub signal_pct: u8,
    pub ring_counter: u8,
    /// Phonebook slot of the outgoing call, `None` before the first one.
    pub call_entry: Option<Slot>,
    pub battery_pct: u8,
    pub battery_volts: f32,
    /// The single command in flight.
    pub current_command: CommandKind,
    pub status: GsmStatus,
    pub phonebook: PhoneBook,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            imei: String::new(),
            operator: String::new(),
            caller_id: String::new(),
            signal_pct: 0,
            ring_counter: 0,
            call_entry: None,
            battery_pct: 0,
            battery_volts: 0.0,
            current_command: CommandKind::At,
            status: GsmStatus::WaitingForReady,
            phonebook: PhoneBook::new(),
        }
    }

    /// Number of the other party of the current call: the caller when the call
    /// was answered, the dialed phonebook entry otherwise.
    pub fn call_peer(&self) -> Option<&str> {
        if self.status == GsmStatus::CallAnswered {
            return (!self.caller_id.is_empty()).then_some(self.caller_id.as_str());
        }
        self.call_entry.and_then(|slot| self.phonebook.get(slot))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
