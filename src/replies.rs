use heapless::String;

use crate::constants::{MAX_RECIPIENT_LENGTH, PARSER_BUFFER_SIZE};
use crate::custom_strings::{Quoted, extract_after_delimiter, find_quoted, parse_leading_u32};
use crate::dtmf::{Decoded, RemoteCommand, RemoteCommandBuffer};
use crate::parser::Descriptor;
use crate::phone_book::Slot;
use crate::scheduler::Scheduler;
use crate::session::Session;
use crate::traits::AlarmControl;

/// Reply shapes the modem sends, in recognition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageId {
    Ok,
    Busy,
    NoCarrier,
    NoDialtone,
    NoAnswer,
    CmeError,
    Error,
    Ring,
    Dtmf,
    Clip,
    Cpbr,
    Prompt,
    Cbc,
    Ready,
    MoRing,
    MoConnected,
    /// Any `\r\n...\r\n\r\n` block not matched above.
    Line,
    Cops,
    Csq,
}

/// Order matters: `ERROR\r\n` must come after `+CME ERROR:` and the generic
/// line after everything that can be framed by CRLF.
pub const GSM_REPLIES: [Descriptor<MessageId>; 19] = [
    Descriptor::new("OK\r\n", MessageId::Ok),
    Descriptor::new("BUSY\r\n", MessageId::Busy),
    Descriptor::new("NO CARRIER\r\n", MessageId::NoCarrier),
    Descriptor::new("NO DIALTONE\r\n", MessageId::NoDialtone),
    Descriptor::new("NO ANSWER\r\n", MessageId::NoAnswer),
    Descriptor::new("+CME ERROR:", MessageId::CmeError),
    Descriptor::new("ERROR\r\n", MessageId::Error),
    Descriptor::new("\r\nRING\r\n", MessageId::Ring),
    Descriptor::framed("+DTMF: ", "\r\n", MessageId::Dtmf),
    Descriptor::framed("+CLIP: ", "\r\n", MessageId::Clip),
    Descriptor::framed("+CPBR: ", "\r\n", MessageId::Cpbr),
    Descriptor::new(">", MessageId::Prompt),
    Descriptor::framed("+CBC: ", "\r\n", MessageId::Cbc),
    Descriptor::framed("SMS READY", "\r\n", MessageId::Ready),
    Descriptor::framed("\r\nMO RING", "\r\n", MessageId::MoRing),
    Descriptor::framed("MO CONNECTED", "\r\n", MessageId::MoConnected),
    Descriptor::framed("\r\n", "\r\n\r\n", MessageId::Line),
    Descriptor::framed("+COPS: ", "\r\n", MessageId::Cops),
    Descriptor::framed("+CSQ: ", "\r\n", MessageId::Csq),
];

/// Classified reply or event, consumed by the engine state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyCode {
    Ok,
    Error,
    NoCarrier,
    NoDialtone,
    NoAnswer,
    Busy,
    /// Local request to close the current call.
    Hangup,
    CmeError,
    Ring,
    Clip,
    Cpbr,
    SmsPrompt,
    /// Remote command accepted, play the confirmation tone.
    DtmfSharp,
    /// Remote command rejected, play the error tone.
    DtmfStar,
    /// Remote command asks for a status refresh.
    GetParams,
    Help,
    Reset,
    Cbc,
    Ready,
    MoConnected,
    MoRing,
    Line,
    Cops,
    Csq,
}

/// Index of the tone character in `+DTMF: X`.
const DTMF_TONE_INDEX: usize = 7;

/// Turns matched modem messages into reply codes, updating the session as a
/// side effect.
pub struct ReplyClassifier {
    line: String<PARSER_BUFFER_SIZE>,
    remote: RemoteCommandBuffer,
}

impl ReplyClassifier {
    pub const fn new() -> Self {
        Self {
            line: String::new(),
            remote: RemoteCommandBuffer::new(),
        }
    }

    /// Payload of the last generic line, or the last operator name.
    pub fn line(&self) -> &str {
        self.line.as_str()
    }

    pub fn remote_buffer(&self) -> &str {
        self.remote.as_str()
    }

    pub fn clear_remote(&mut self) {
        self.remote.clear();
    }

    /// Classifies `message` (the text from the matched prefix on). `None`
    /// means the message carried no usable event.
    pub fn classify(
        &mut self,
        id: MessageId,
        message: &str,
        session: &mut Session,
        scheduler: &mut Scheduler,
        alarm: &mut impl AlarmControl,
    ) -> Option<ReplyCode> {
        let code = match id {
            MessageId::Ok => ReplyCode::Ok,
            MessageId::Busy => ReplyCode::Busy,
            MessageId::NoAnswer => ReplyCode::NoAnswer,
            MessageId::NoDialtone => ReplyCode::NoDialtone,
            MessageId::CmeError => ReplyCode::CmeError,
            MessageId::NoCarrier => {
                self.remote.clear();
                ReplyCode::NoCarrier
            }
            MessageId::Error => {
                self.remote.clear();
                ReplyCode::Error
            }
            MessageId::Ring => {
                self.remote.clear();
                ReplyCode::Ring
            }
            MessageId::Prompt => ReplyCode::SmsPrompt,
            MessageId::Ready => ReplyCode::Ready,
            MessageId::MoRing => ReplyCode::MoRing,
            MessageId::MoConnected => ReplyCode::MoConnected,
            MessageId::Line => {
                self.store_line(message);
                ReplyCode::Line
            }
            MessageId::Cops => self.operator(message, session)?,
            MessageId::Csq => {
                session.signal_pct = signal_percent(csq_value(message));
                ReplyCode::Csq
            }
            MessageId::Cbc => {
                let (charge, volts) = battery(message);
                session.battery_pct = charge;
                session.battery_volts = volts;
                ReplyCode::Cbc
            }
            MessageId::Clip => caller_id(message, session)?,
            MessageId::Cpbr => {
                phonebook_entry(message, session);
                ReplyCode::Cpbr
            }
            MessageId::Dtmf => {
                let tone = message.get(DTMF_TONE_INDEX..)?.chars().next()?;
                self.remote_command(tone, session, scheduler, alarm)?
            }
        };
        Some(code)
    }

    fn store_line(&mut self, message: &str) {
        self.line.clear();
        // Same capacity as the parser buffer.
        let _ = self.line.push_str(message);
    }

    fn operator(&mut self, message: &str, session: &mut Session) -> Option<ReplyCode> {
        match find_quoted(message) {
            Quoted::Found(name) => {
                self.store_line(name);
                session.operator.clear();
                if session.operator.push_str(name).is_err() {
                    warn!("operator name too long");
                }
            }
            Quoted::Missing => self.line.clear(),
            Quoted::Unterminated => return None,
        }
        Some(ReplyCode::Cops)
    }

    fn remote_command(
        &mut self,
        tone: char,
        session: &mut Session,
        scheduler: &mut Scheduler,
        alarm: &mut impl AlarmControl,
    ) -> Option<ReplyCode> {
        let command = match self.remote.push(tone) {
            Decoded::Pending => return None,
            Decoded::Rejected => {
                info!("remote command rejected");
                return Some(ReplyCode::DtmfStar);
            }
            Decoded::Accepted(command) => command,
        };
        info!("remote command {:?}", command);

        let code = match command {
            RemoteCommand::Help => ReplyCode::Help,
            RemoteCommand::Status => ReplyCode::GetParams,
            RemoteCommand::Reset => ReplyCode::Reset,
            RemoteCommand::AlarmOff => {
                alarm.set_alarm_enabled(false);
                ReplyCode::GetParams
            }
            RemoteCommand::AlarmOn => {
                alarm.set_alarm_enabled(true);
                ReplyCode::GetParams
            }
            RemoteCommand::AutoRearm(enabled) => {
                alarm.set_auto_rearm(enabled);
                ReplyCode::GetParams
            }
            RemoteCommand::SetThreshold(celsius) => {
                alarm.set_threshold(celsius);
                ReplyCode::GetParams
            }
            RemoteCommand::DeleteSlot(slot) => {
                tone_for(scheduler.del_phonebook_entry(&session.phonebook, slot).is_ok())
            }
            RemoteCommand::SetSlot(slot, number) => tone_for(
                scheduler
                    .add_phonebook_entry(&mut session.phonebook, slot, &number)
                    .is_ok(),
            ),
        };
        Some(code)
    }
}

impl Default for ReplyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn tone_for(accepted: bool) -> ReplyCode {
    if accepted {
        ReplyCode::DtmfSharp
    } else {
        ReplyCode::DtmfStar
    }
}

/// Raw `+CSQ: <rssi>,<ber>` value.
fn csq_value(message: &str) -> u32 {
    let args = message.strip_prefix("+CSQ: ").unwrap_or(message);
    parse_leading_u32(args.split(',').next().unwrap_or(args))
}

/// Coarse signal strength: 0 and 1 are the weakest levels, 31 the strongest
/// and 99 means no signal.
pub fn signal_percent(rssi: u32) -> u8 {
    match rssi {
        0 => 25,
        1 => 50,
        31 => 100,
        99 => 0,
        _ => 75,
    }
}

/// `+CBC: <state>,<charge>,<millivolts>` as charge percent and volts.
fn battery(message: &str) -> (u8, f32) {
    let fields = extract_after_delimiter(message, ",").unwrap_or("");
    let charge = parse_leading_u32(fields).min(u32::from(u8::MAX)) as u8;
    let millivolts = extract_after_delimiter(fields, ",").map_or(0, parse_leading_u32);
    (charge, millivolts as f32 / 1000.0)
}

fn caller_id(message: &str, session: &mut Session) -> Option<ReplyCode> {
    let Quoted::Found(number) = find_quoted(message) else {
        return None;
    };
    if number.len() < MAX_RECIPIENT_LENGTH {
        session.caller_id.clear();
        let _ = session.caller_id.push_str(number);
    }
    Some(ReplyCode::Clip)
}

/// `+CPBR: <index>,"<number>",<type>,"<text>"`
fn phonebook_entry(message: &str, session: &mut Session) {
    let Some(entry) = extract_after_delimiter(message, " ") else {
        return;
    };
    let slot = entry
        .chars()
        .next()
        .and_then(|ch| ch.to_digit(10))
        .and_then(|digit| Slot::new(digit as u8));
    let (Some(slot), Quoted::Found(number)) = (slot, find_quoted(entry)) else {
        warn!("malformed phonebook entry");
        return;
    };
    if session.phonebook.set(slot, number).is_err() {
        warn!("phonebook number too long");
    }
}
