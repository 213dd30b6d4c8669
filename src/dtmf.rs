use heapless::String;

use crate::constants::{MAX_DTMF_LENGTH, MAX_NUM_LENGTH};
use crate::phone_book::{PhoneNumber, Slot, phone_number};

/// An administrative action requested by tones during a call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteCommand {
    /// `#*`
    Help,
    /// `###`
    AlarmOff,
    /// `##*`
    AlarmOn,
    /// `##0` / `##1`
    AutoRearm(bool),
    /// `#0#`
    Reset,
    /// `#N##`
    DeleteSlot(Slot),
    /// `***`
    Status,
    /// `**GGD**`, tenths of a degree in the last digit.
    SetThreshold(f32),
    /// `*N*<number>**`
    SetSlot(Slot, PhoneNumber),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decoded {
    /// The digits so far are the start of a valid command.
    Pending,
    Accepted(RemoteCommand),
    Rejected,
}

/// Tone digits collected during one call.
pub struct RemoteCommandBuffer {
    digits: String<MAX_DTMF_LENGTH>,
}

impl RemoteCommandBuffer {
    pub const fn new() -> Self {
        Self {
            digits: String::new(),
        }
    }

    /// Appends one tone and decodes the buffer. Any final result clears it.
    pub fn push(&mut self, tone: char) -> Decoded {
        let decoded = match self.digits.push(tone) {
            Ok(()) => match decode(&self.digits) {
                Decoded::Pending if self.digits.len() >= MAX_DTMF_LENGTH => Decoded::Rejected,
                decoded => decoded,
            },
            Err(_) => Decoded::Rejected,
        };
        if decoded != Decoded::Pending {
            self.digits.clear();
        }
        decoded
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn as_str(&self) -> &str {
        self.digits.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }
}

impl Default for RemoteCommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes a whole tone sequence. A sequence that can no longer grow into a
/// valid command is rejected at the first offending tone.
pub fn decode(tones: &str) -> Decoded {
    match tones.as_bytes() {
        [] | [b'#'] | [b'*'] => Decoded::Pending,
        [b'#', rest @ ..] => decode_sharp(rest),
        [b'*', rest @ ..] => decode_star(rest),
        _ => Decoded::Rejected,
    }
}

fn accept(command: RemoteCommand) -> Decoded {
    Decoded::Accepted(command)
}

fn decode_sharp(rest: &[u8]) -> Decoded {
    match rest {
        [b'*'] => accept(RemoteCommand::Help),
        [b'#'] | [b'0'] => Decoded::Pending,
        [b'#', b'#'] => accept(RemoteCommand::AlarmOff),
        [b'#', b'*'] => accept(RemoteCommand::AlarmOn),
        [b'#', b'0'] => accept(RemoteCommand::AutoRearm(false)),
        [b'#', b'1'] => accept(RemoteCommand::AutoRearm(true)),
        [b'0', b'#'] => accept(RemoteCommand::Reset),
        [b'1'..=b'9'] | [b'1'..=b'9', b'#'] => Decoded::Pending,
        [n @ b'1'..=b'9', b'#', b'#'] => Slot::new(n - b'0')
            .map_or(Decoded::Rejected, |slot| accept(RemoteCommand::DeleteSlot(slot))),
        _ => Decoded::Rejected,
    }
}

fn decode_star(rest: &[u8]) -> Decoded {
    match rest {
        [b'*'] => Decoded::Pending,
        [b'*', b'*'] => accept(RemoteCommand::Status),
        [b'*', threshold @ ..] => decode_threshold(threshold),
        [b'1'..=b'3'] => Decoded::Pending,
        [n @ b'1'..=b'3', b'*', number @ ..] => match Slot::new(n - b'0') {
            Some(slot) => decode_set_slot(slot, number),
            None => Decoded::Rejected,
        },
        _ => Decoded::Rejected,
    }
}

/// `GGD**` after the leading `**`.
fn decode_threshold(tones: &[u8]) -> Decoded {
    let (digits, tail) = tones.split_at(tones.len().min(3));
    if !digits.iter().all(u8::is_ascii_digit) {
        return Decoded::Rejected;
    }
    match tail {
        [] | [b'*'] => Decoded::Pending,
        [b'*', b'*'] => {
            let value = |idx: usize| f32::from(digits[idx] - b'0');
            accept(RemoteCommand::SetThreshold(
                value(0) * 10.0 + value(1) + value(2) / 10.0,
            ))
        }
        _ => Decoded::Rejected,
    }
}

/// `<number>**` after `*N*`.
fn decode_set_slot(slot: Slot, tones: &[u8]) -> Decoded {
    let digits = tones.iter().take_while(|tone| tone.is_ascii_digit()).count();
    if digits > MAX_NUM_LENGTH {
        return Decoded::Rejected;
    }
    match &tones[digits..] {
        [] => Decoded::Pending,
        [b'*'] | [b'*', b'*'] if digits == 0 => Decoded::Rejected,
        [b'*'] => Decoded::Pending,
        [b'*', b'*'] => {
            let number = core::str::from_utf8(&tones[..digits])
                .ok()
                .and_then(|number| phone_number(number).ok());
            number.map_or(Decoded::Rejected, |number| {
                accept(RemoteCommand::SetSlot(slot, number))
            })
        }
        _ => Decoded::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(buffer: &mut RemoteCommandBuffer, tones: &str) -> Decoded {
        let mut last = Decoded::Pending;
        for (idx, tone) in tones.chars().enumerate() {
            last = buffer.push(tone);
            if idx + 1 < tones.len() {
                assert_eq!(last, Decoded::Pending, "{tones} settled early at {idx}");
            }
        }
        last
    }

    fn slot(n: u8) -> Slot {
        Slot::new(n).unwrap()
    }

    #[test]
    fn alarm_switches() {
        let mut buffer = RemoteCommandBuffer::new();
        assert_eq!(feed(&mut buffer, "###"), Decoded::Accepted(RemoteCommand::AlarmOff));
        assert!(buffer.is_empty());
        assert_eq!(feed(&mut buffer, "##*"), Decoded::Accepted(RemoteCommand::AlarmOn));
        assert_eq!(
            feed(&mut buffer, "##0"),
            Decoded::Accepted(RemoteCommand::AutoRearm(false))
        );
        assert_eq!(
            feed(&mut buffer, "##1"),
            Decoded::Accepted(RemoteCommand::AutoRearm(true))
        );
        assert_eq!(feed(&mut buffer, "##5"), Decoded::Rejected);
        assert!(buffer.is_empty());
    }

    #[test]
    fn help_reset_and_status() {
        let mut buffer = RemoteCommandBuffer::new();
        assert_eq!(feed(&mut buffer, "#*"), Decoded::Accepted(RemoteCommand::Help));
        assert_eq!(feed(&mut buffer, "#0#"), Decoded::Accepted(RemoteCommand::Reset));
        assert_eq!(feed(&mut buffer, "#05"), Decoded::Rejected);
        assert_eq!(feed(&mut buffer, "***"), Decoded::Accepted(RemoteCommand::Status));
    }

    #[test]
    fn threshold_takes_tenths() {
        let mut buffer = RemoteCommandBuffer::new();
        assert_eq!(
            feed(&mut buffer, "**250**"),
            Decoded::Accepted(RemoteCommand::SetThreshold(25.0))
        );
        assert_eq!(
            feed(&mut buffer, "**125**"),
            Decoded::Accepted(RemoteCommand::SetThreshold(12.5))
        );
        assert_eq!(feed(&mut buffer, "**2#"), Decoded::Rejected);
        assert_eq!(feed(&mut buffer, "**250*1"), Decoded::Rejected);
    }

    #[test]
    fn phonebook_edits() {
        let mut buffer = RemoteCommandBuffer::new();
        assert_eq!(
            feed(&mut buffer, "*2*5551234567**"),
            Decoded::Accepted(RemoteCommand::SetSlot(
                slot(2),
                phone_number("5551234567").unwrap()
            ))
        );
        assert_eq!(
            feed(&mut buffer, "#2##"),
            Decoded::Accepted(RemoteCommand::DeleteSlot(slot(2)))
        );
        assert_eq!(feed(&mut buffer, "#7##"), Decoded::Rejected);
        assert_eq!(feed(&mut buffer, "#2#5"), Decoded::Rejected);
        assert_eq!(feed(&mut buffer, "*4"), Decoded::Rejected);
        assert_eq!(feed(&mut buffer, "*1**"), Decoded::Rejected);
        assert_eq!(feed(&mut buffer, "*1#"), Decoded::Rejected);
    }

    #[test]
    fn unknown_lead_tone_is_rejected() {
        let mut buffer = RemoteCommandBuffer::new();
        assert_eq!(feed(&mut buffer, "5"), Decoded::Rejected);
        assert!(buffer.is_empty());
    }

    #[test]
    fn overlong_sequence_never_hangs() {
        let mut buffer = RemoteCommandBuffer::new();
        let mut outcome = Decoded::Pending;
        let mut pushed = 0;
        for tone in "*1*".chars().chain(core::iter::repeat('9')) {
            outcome = buffer.push(tone);
            pushed += 1;
            if outcome != Decoded::Pending {
                break;
            }
            assert!(pushed <= MAX_DTMF_LENGTH);
        }
        assert_eq!(outcome, Decoded::Rejected);
        assert!(buffer.is_empty());

        let longest: heapless::String<MAX_DTMF_LENGTH> = "*3*"
            .chars()
            .chain(core::iter::repeat_n('1', MAX_NUM_LENGTH))
            .chain("**".chars())
            .collect();
        assert!(matches!(
            feed(&mut buffer, &longest),
            Decoded::Accepted(RemoteCommand::SetSlot(_, _))
        ));
    }
}
