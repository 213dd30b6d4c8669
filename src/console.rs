// /src/console.rs
use embedded_io::Write;

use crate::constants::{CONSOLE_BUFFER_SIZE, CONSOLE_PREFIX, MAX_STORED_THRESHOLD, MIN_STORED_THRESHOLD};
use crate::error::{Error, Result};
use crate::parser::{CommandOutcome, Descriptor, LineParser};
use crate::phone_book::Slot;
use crate::sim800::Sim800;
use crate::traits::{AlarmControl, ByteSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleCommand {
    /// `#TEMP=<celsius>`
    Threshold,
    /// `#ALARM=<0|1>`
    Alarm,
    /// `#AUTO=<0|1>`
    AutoRearm,
    /// `#PB<n>=<number>`
    Phonebook,
    /// `#DEL=<n>`
    Delete,
    /// `#CALL=<number>`
    Call,
    /// `#SMS=<number>`, sends the status report.
    Sms,
}

pub const CONSOLE_COMMANDS: [Descriptor<ConsoleCommand>; 7] = [
    Descriptor::new("TEMP=", ConsoleCommand::Threshold),
    Descriptor::new("ALARM=", ConsoleCommand::Alarm),
    Descriptor::new("AUTO=", ConsoleCommand::AutoRearm),
    Descriptor::new("PB", ConsoleCommand::Phonebook),
    Descriptor::new("DEL=", ConsoleCommand::Delete),
    Descriptor::new("CALL=", ConsoleCommand::Call),
    Descriptor::new("SMS=", ConsoleCommand::Sms),
];

const PROMPT: &[u8] = b"\r\n> ";
const ERASE: &[u8] = b"\x08 \x08";

/// Service console on the debug serial port.
pub struct Console<W: Write> {
    out: W,
    parser: LineParser<CONSOLE_BUFFER_SIZE>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            parser: LineParser::new(CONSOLE_PREFIX),
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Handles every pending input byte.
    pub fn poll<T: Write>(
        &mut self,
        rx: &mut impl ByteSource,
        engine: &mut Sim800<T>,
        alarm: &mut impl AlarmControl,
    ) {
        while let Some(byte) = rx.pop() {
            let echo = [byte];
            let outcome = self.parser.feed_command(byte, &CONSOLE_COMMANDS, |command, args| {
                execute(command, args, &mut *engine, &mut *alarm)
            });
            let reply: &[u8] = match outcome {
                CommandOutcome::Echo => &echo,
                CommandOutcome::Ignored => continue,
                CommandOutcome::Prompt => PROMPT,
                CommandOutcome::Backspace => ERASE,
                CommandOutcome::Overflow => b"\r\nOVERFLOW\r\n> ",
                CommandOutcome::Error => b"\r\nERROR\r\n> ",
                CommandOutcome::Done(Ok(())) => b"\r\nOK\r\n> ",
                CommandOutcome::Done(Err(err)) => {
                    warn!("console command failed: {}", err);
                    b"\r\nERROR\r\n> "
                }
            };
            if self.out.write_all(reply).is_err() {
                warn!("console write failed");
            }
        }
    }
}

fn execute<T: Write>(
    command: ConsoleCommand,
    args: &str,
    engine: &mut Sim800<T>,
    alarm: &mut impl AlarmControl,
) -> Result<()> {
    debug!("console {:?} {}", command, args);
    match command {
        ConsoleCommand::Threshold => {
            let celsius: f32 = args.trim().parse().map_err(|_| Error::InvalidArgument)?;
            if celsius <= MIN_STORED_THRESHOLD || celsius > MAX_STORED_THRESHOLD {
                return Err(Error::InvalidArgument);
            }
            alarm.set_threshold(celsius);
        }
        ConsoleCommand::Alarm => alarm.set_alarm_enabled(flag(args)?),
        ConsoleCommand::AutoRearm => alarm.set_auto_rearm(flag(args)?),
        ConsoleCommand::Phonebook => {
            let (slot, number) = args.split_once('=').ok_or(Error::InvalidArgument)?;
            engine.schedule_add_phonebook_entry(slot_arg(slot)?, number.trim())?;
        }
        ConsoleCommand::Delete => engine.schedule_del_phonebook_entry(slot_arg(args)?)?,
        ConsoleCommand::Call => engine.schedule_call_number(args.trim())?,
        ConsoleCommand::Sms => engine.schedule_params_sms(args.trim())?,
    }
    Ok(())
}

fn flag(args: &str) -> Result<bool> {
    match args.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(Error::InvalidArgument),
    }
}

fn slot_arg(args: &str) -> Result<Slot> {
    let slot: u8 = args.trim().parse().map_err(|_| Error::InvalidSlot)?;
    Slot::try_from(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[derive(Default)]
    struct Recorder(Vec<u8>);

    impl embedded_io::ErrorType for Recorder {
        type Error = core::convert::Infallible;
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> core::result::Result<(), Self::Error> {
            Ok(())
        }
    }

    struct Queue<'a>(&'a [u8]);

    impl ByteSource for Queue<'_> {
        fn pop(&mut self) -> Option<u8> {
            let (first, rest) = self.0.split_first()?;
            self.0 = rest;
            Some(*first)
        }
    }

    #[derive(Default)]
    struct Settings {
        threshold: f32,
        enabled: bool,
        auto_rearm: bool,
    }

    impl AlarmControl for Settings {
        fn temperature(&self) -> Option<f32> {
            None
        }
        fn threshold(&self) -> f32 {
            self.threshold
        }
        fn set_threshold(&mut self, celsius: f32) {
            self.threshold = celsius;
        }
        fn alarm_enabled(&self) -> bool {
            self.enabled
        }
        fn set_alarm_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn auto_rearm(&self) -> bool {
            self.auto_rearm
        }
        fn set_auto_rearm(&mut self, enabled: bool) {
            self.auto_rearm = enabled;
        }
    }

    fn run(input: &str, engine: &mut Sim800<Recorder>, settings: &mut Settings) -> String {
        let mut console = Console::new(Recorder::default());
        console.poll(&mut Queue(input.as_bytes()), engine, settings);
        String::from_utf8(console.output().0.clone()).unwrap()
    }

    #[test]
    fn settings_commands() {
        let mut engine = Sim800::new(Recorder::default(), Config::new());
        let mut settings = Settings::default();

        let out = run("#temp=4.5\r", &mut engine, &mut settings);
        assert_eq!(out, "#temp=4.5\r\nOK\r\n> ");
        assert_eq!(settings.threshold, 4.5);

        assert!(run("#ALARM=1\r", &mut engine, &mut settings).ends_with("OK\r\n> "));
        assert!(settings.enabled);
        assert!(run("#AUTO=1\r", &mut engine, &mut settings).ends_with("OK\r\n> "));
        assert!(settings.auto_rearm);

        assert!(run("#TEMP=120\r", &mut engine, &mut settings).ends_with("ERROR\r\n> "));
        assert!(run("#ALARM=2\r", &mut engine, &mut settings).ends_with("ERROR\r\n> "));
        assert_eq!(settings.threshold, 4.5);
    }

    #[test]
    fn phonebook_commands_are_scheduled() {
        let mut engine = Sim800::new(Recorder::default(), Config::new());
        let mut settings = Settings::default();

        assert!(run("#PB2=5551234\r", &mut engine, &mut settings).ends_with("OK\r\n> "));
        assert_eq!(engine.phonebook().number(Slot::new(2).unwrap()), "5551234");
        assert!(run("#DEL=2\r", &mut engine, &mut settings).ends_with("OK\r\n> "));
        assert!(run("#DEL=3\r", &mut engine, &mut settings).ends_with("ERROR\r\n> "));
        assert!(run("#PB4=1\r", &mut engine, &mut settings).ends_with("ERROR\r\n> "));
        assert_eq!(engine.pending_commands(), 2);
    }

    #[test]
    fn line_editing() {
        let mut engine = Sim800::new(Recorder::default(), Config::new());
        let mut settings = Settings::default();
        assert_eq!(run("\r", &mut engine, &mut settings), "\r\n> ");
        assert!(run("#AUTO=1\r", &mut engine, &mut settings).ends_with("OK\r\n> "));
        assert_eq!(
            run("#AUTO=1\x080\r", &mut engine, &mut settings),
            "#AUTO=1\x08 \x080\r\nOK\r\n> "
        );
        assert!(!settings.auto_rearm);
        // Nothing to erase, nothing sent back.
        assert_eq!(
            run("\x08#\x08AUTO=1\r", &mut engine, &mut settings),
            "#AUTO=1\r\nOK\r\n> "
        );
        assert!(settings.auto_rearm);
        assert!(run("#FOO=1\r", &mut engine, &mut settings).ends_with("ERROR\r\n> "));
    }
}
