use heapless::String;

/// One entry of a recognition table: a literal prefix, an optional suffix
/// that must follow it, and the identity handed to the handler.
///
/// Tables are scanned in order and the first match wins, so overlapping
/// prefixes must be listed most specific first.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor<Id> {
    pub prefix: &'static str,
    pub suffix: Option<&'static str>,
    pub id: Id,
}

impl<Id> Descriptor<Id> {
    pub const fn new(prefix: &'static str, id: Id) -> Self {
        Self {
            prefix,
            suffix: None,
            id,
        }
    }

    pub const fn framed(prefix: &'static str, suffix: &'static str, id: Id) -> Self {
        Self {
            prefix,
            suffix: Some(suffix),
            id,
        }
    }
}

/// Result of feeding one byte in command mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandOutcome<R> {
    /// CR on an empty line.
    Prompt,
    /// Byte accepted into the command, echo it.
    Echo,
    Ignored,
    Backspace,
    Overflow,
    /// Unknown command or a CR before the prefix was complete.
    Error,
    Done(R),
}

/// Result of feeding one byte in message mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageOutcome<R> {
    Pending,
    Overflow,
    Matched(R),
}

const BACKSPACE: char = '\x08';
const TAB: char = '\t';
const DEL: char = '\x7f';

/// Byte-at-a-time scanner for one serial channel.
pub struct LineParser<const N: usize> {
    prefix: &'static str,
    buf: String<N>,
}

impl<const N: usize> LineParser<N> {
    /// `prefix` is only used in command mode.
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            buf: String::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn buffered(&self) -> &str {
        self.buf.as_str()
    }

    /// Command mode: input must start with the parser prefix and ends at CR or
    /// LF, then the remainder is looked up in `table` case-insensitively.
    /// A descriptor only fires when arguments follow its prefix.
    pub fn feed_command<Id: Copy, R>(
        &mut self,
        byte: u8,
        table: &[Descriptor<Id>],
        mut handler: impl FnMut(Id, &str) -> R,
    ) -> CommandOutcome<R> {
        let ch = to_upper_char(byte);
        let prefix_len = self.prefix.len();

        if self.buf.len() < prefix_len {
            if ch == '\r' {
                if self.buf.is_empty() {
                    return CommandOutcome::Prompt;
                }
                self.buf.clear();
                return CommandOutcome::Error;
            }
            if self.prefix[self.buf.len()..].starts_with(ch) && self.buf.push(ch).is_ok() {
                return CommandOutcome::Echo;
            }
            return CommandOutcome::Ignored;
        }

        match ch {
            // Only command text can be erased, never the prefix.
            BACKSPACE if self.buf.len() > prefix_len => {
                self.buf.pop();
                return CommandOutcome::Backspace;
            }
            BACKSPACE => return CommandOutcome::Ignored,
            TAB | DEL => return CommandOutcome::Ignored,
            '\r' | '\n' => {
                let outcome = dispatch_command(&self.buf[prefix_len..], table, &mut handler);
                self.buf.clear();
                return outcome.map_or(CommandOutcome::Error, CommandOutcome::Done);
            }
            _ => {}
        }

        if self.buf.len() >= N - 1 {
            self.buf.clear();
            return CommandOutcome::Overflow;
        }
        match self.buf.push(ch) {
            Ok(()) => CommandOutcome::Echo,
            Err(_) => {
                self.buf.clear();
                CommandOutcome::Overflow
            }
        }
    }

    /// Message mode: every byte is appended and the whole buffer is checked
    /// against `table`. The handler receives the text starting at the matched
    /// prefix; the buffer is cleared after every match.
    pub fn feed_message<Id: Copy, R>(
        &mut self,
        byte: u8,
        table: &[Descriptor<Id>],
        handler: impl FnOnce(Id, &str) -> R,
    ) -> MessageOutcome<R> {
        if self.buf.push(to_upper_char(byte)).is_err() {
            self.buf.clear();
            return MessageOutcome::Overflow;
        }

        if let Some((id, start)) = match_message(&self.buf, table) {
            let result = handler(id, &self.buf[start..]);
            self.buf.clear();
            return MessageOutcome::Matched(result);
        }

        if self.buf.len() >= N - 2 {
            self.buf.clear();
            return MessageOutcome::Overflow;
        }
        MessageOutcome::Pending
    }
}

fn to_upper_char(byte: u8) -> char {
    if byte.is_ascii() {
        char::from(byte.to_ascii_uppercase())
    } else {
        '?'
    }
}

fn dispatch_command<Id: Copy, R>(
    command: &str,
    table: &[Descriptor<Id>],
    handler: &mut impl FnMut(Id, &str) -> R,
) -> Option<R> {
    for descriptor in table {
        let Some(head) = command.get(..descriptor.prefix.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(descriptor.prefix) {
            continue;
        }
        let args = &command[descriptor.prefix.len()..];
        if !args.is_empty() {
            return Some(handler(descriptor.id, args));
        }
    }
    None
}

/// First descriptor whose prefix occurs in `buf` with its suffix after it.
/// Returns the descriptor id and the offset of the prefix.
fn match_message<Id: Copy>(buf: &str, table: &[Descriptor<Id>]) -> Option<(Id, usize)> {
    table.iter().find_map(|descriptor| {
        let start = buf.find(descriptor.prefix)?;
        let message = &buf[start..];
        let suffix = descriptor.suffix.unwrap_or("");
        if message.len() < descriptor.prefix.len() + suffix.len() {
            return None;
        }
        if !suffix.is_empty() && !message[descriptor.prefix.len()..].contains(suffix) {
            return None;
        }
        Some((descriptor.id, start))
    })
}
