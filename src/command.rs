use crate::phone_book::{PhoneNumber, PhonebookEntry, Slot};
use crate::sms::SmsRecord;

/// Every AT command the engine knows how to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    WritePhonebookEntry,
    DelPhonebookEntry,
    ReadPhonebook,
    CallPhonebookEntry,
    CallPhoneNumber,
    Sms,
    SmsGetParams,
    HangUp,
    Answer,
    DtmfEnable,
    SmsTextMode,
    /// Confirmation tone.
    DtmfSharp,
    /// Error tone.
    DtmfStar,
    DtmfDuration,
    Clip,
    Cbc,
    NoEcho,
    Cgatt,
    MoRing,
    Calm,
    Mute,
    Crsl,
    Lvl,
    Cmic0,
    Cmic1,
    Cmic2,
    Cmic3,
    At,
    WelcomeSms,
    Imei,
    Cops,
    Csq,
    SmsDeleteAll,
}

impl CommandKind {
    /// Fixed wire text, `None` for commands whose text is built from a payload.
    pub const fn literal(self) -> Option<&'static str> {
        match self {
            CommandKind::ReadPhonebook => Some("AT+CPBR=1,3\n"),
            CommandKind::HangUp => Some("ATH\n"),
            CommandKind::Answer => Some("ATA\n"),
            CommandKind::DtmfEnable => Some("AT+DDET=1\n"),
            CommandKind::SmsTextMode => Some("AT+CMGF=1\n"),
            CommandKind::DtmfSharp => Some("AT+VTS=\"#\"\n"),
            CommandKind::DtmfStar => Some("AT+VTS=\"*,*,*\"\n"),
            CommandKind::DtmfDuration => Some("AT+VTD=10\n"),
            CommandKind::Clip => Some("AT+CLIP=1\n"),
            CommandKind::Cbc => Some("AT+CBC\n"),
            CommandKind::NoEcho => Some("ATE0\n"),
            CommandKind::Cgatt => Some("AT+CGATT=0\n"),
            // Outgoing call progress reports
            CommandKind::MoRing => Some("AT+MORING=0\n"),
            // Alarm sound off
            CommandKind::Calm => Some("AT+CALM=1\n"),
            CommandKind::Mute => Some("AT+CMUT=1\n"),
            // Ringer and speaker levels to 0
            CommandKind::Crsl => Some("AT+CRSL=0\n"),
            CommandKind::Lvl => Some("AT+CLVL=0\n"),
            CommandKind::Cmic0 => Some("AT+CMIC=0,0\n"),
            CommandKind::Cmic1 => Some("AT+CMIC=1,0\n"),
            CommandKind::Cmic2 => Some("AT+CMIC=2,0\n"),
            CommandKind::Cmic3 => Some("AT+CMIC=3,0\n"),
            CommandKind::At => Some("AT\n"),
            CommandKind::Imei => Some("AT+CGSN\n"),
            CommandKind::Cops => Some("AT+COPS?\n"),
            CommandKind::Csq => Some("AT+CSQ\n"),
            CommandKind::SmsDeleteAll => Some("AT+CMGD=1,4\n"),
            CommandKind::WritePhonebookEntry
            | CommandKind::DelPhonebookEntry
            | CommandKind::CallPhonebookEntry
            | CommandKind::CallPhoneNumber
            | CommandKind::Sms
            | CommandKind::SmsGetParams
            | CommandKind::WelcomeSms => None,
        }
    }

    /// Commands sent once the module reports ready, in order.
    pub const BOOT_SEQUENCE: [CommandKind; 20] = [
        CommandKind::Clip,
        CommandKind::SmsTextMode,
        CommandKind::DtmfEnable,
        CommandKind::DtmfDuration,
        CommandKind::MoRing,
        CommandKind::Calm,
        CommandKind::Crsl,
        CommandKind::Lvl,
        CommandKind::Cmic0,
        CommandKind::Cmic1,
        CommandKind::Cmic2,
        CommandKind::Cmic3,
        CommandKind::Cbc,
        CommandKind::ReadPhonebook,
        CommandKind::Imei,
        CommandKind::Cops,
        CommandKind::Cgatt,
        CommandKind::Csq,
        CommandKind::SmsDeleteAll,
        CommandKind::WelcomeSms,
    ];
}

/// Data carried by the scheduled commands that need more than their kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandPayload {
    Phonebook(PhonebookEntry),
    Sms(SmsRecord),
    Slot(Slot),
    Number(PhoneNumber),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub payload: Option<CommandPayload>,
}

impl PendingCommand {
    /// A command sent as its bare AT text.
    pub const fn simple(kind: CommandKind) -> Self {
        Self { kind, payload: None }
    }

    pub fn write_entry(entry: PhonebookEntry) -> Self {
        Self {
            kind: CommandKind::WritePhonebookEntry,
            payload: Some(CommandPayload::Phonebook(entry)),
        }
    }

    pub fn delete_entry(slot: Slot) -> Self {
        Self {
            kind: CommandKind::DelPhonebookEntry,
            payload: Some(CommandPayload::Slot(slot)),
        }
    }

    pub fn call_entry(slot: Slot) -> Self {
        Self {
            kind: CommandKind::CallPhonebookEntry,
            payload: Some(CommandPayload::Slot(slot)),
        }
    }

    pub fn call_number(number: PhoneNumber) -> Self {
        Self {
            kind: CommandKind::CallPhoneNumber,
            payload: Some(CommandPayload::Number(number)),
        }
    }

    pub fn sms(sms: SmsRecord) -> Self {
        Self {
            kind: CommandKind::Sms,
            payload: Some(CommandPayload::Sms(sms)),
        }
    }

    /// Status SMS; the body is composed when the command is dispatched.
    pub fn params_sms(sms: SmsRecord) -> Self {
        Self {
            kind: CommandKind::SmsGetParams,
            payload: Some(CommandPayload::Sms(sms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_commands_have_no_literal() {
        assert_eq!(CommandKind::Sms.literal(), None);
        assert_eq!(CommandKind::WritePhonebookEntry.literal(), None);
        assert_eq!(CommandKind::HangUp.literal(), Some("ATH\n"));
        assert_eq!(CommandKind::ReadPhonebook.literal(), Some("AT+CPBR=1,3\n"));
    }

    #[test]
    fn boot_sequence_ends_with_welcome_sms() {
        assert_eq!(CommandKind::BOOT_SEQUENCE[0], CommandKind::Clip);
        assert_eq!(CommandKind::BOOT_SEQUENCE.last(), Some(&CommandKind::WelcomeSms));
        assert!(
            CommandKind::BOOT_SEQUENCE
                .iter()
                .all(|kind| kind.literal().is_some() || *kind == CommandKind::WelcomeSms)
        );
    }
}
