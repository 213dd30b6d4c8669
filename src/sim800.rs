// /src/sim800.rs
use core::fmt::{self, Write as _};

use embedded_io::Write;
use heapless::String;

use crate::command::{CommandKind, CommandPayload, PendingCommand};
use crate::config::Config;
use crate::constants::{CALL_INACTIVITY_LIMIT, CTRL_Z, MAX_AT_LENGTH, PARSER_BUFFER_SIZE, READY_OK_COUNT};
use crate::error::{Error, Result};
use crate::parser::{LineParser, MessageOutcome};
use crate::phone_book::{PhoneBook, PhonebookEntry, Slot, phone_number};
use crate::replies::{GSM_REPLIES, ReplyClassifier, ReplyCode};
use crate::scheduler::Scheduler;
use crate::session::{GsmStatus, Session};
use crate::sms::{SmsBody, SmsRecord, StatusReport, compose_help};
use crate::tick::TickTimer;
use crate::traits::{AlarmControl, ByteSource, Platform};

/// Readiness probing while the module boots.
#[derive(Debug, Clone, Copy, Default)]
struct ReadyProbe {
    awaiting: bool,
    ok_count: u8,
    sent: TickTimer,
}

/// SIM800L modem engine.
///
/// Sends one AT command at a time over `tx`, classifies every reply and
/// reacts to unsolicited events. Driven by [`Sim800::poll`] from a
/// cooperative loop.
pub struct Sim800<T: Write> {
    tx: T,
    config: Config,
    parser: LineParser<PARSER_BUFFER_SIZE>,
    classifier: ReplyClassifier,
    scheduler: Scheduler,
    session: Session,
    /// Text of the in-flight command when it is built from a payload.
    at_cmd: String<MAX_AT_LENGTH>,
    /// Body of the SMS being sent and the offset of its next line.
    sms: SmsBody,
    sms_cursor: Option<usize>,
    timer: TickTimer,
    inactivity: u8,
    ready: ReadyProbe,
    hangup_requested: bool,
}

impl<T: Write> Sim800<T> {
    pub fn new(tx: T, config: Config) -> Self {
        Self {
            tx,
            config,
            parser: LineParser::new(""),
            classifier: ReplyClassifier::new(),
            scheduler: Scheduler::new(),
            session: Session::new(),
            at_cmd: String::new(),
            sms: SmsBody::new(),
            sms_cursor: None,
            timer: TickTimer::default(),
            inactivity: 0,
            ready: ReadyProbe::default(),
            hangup_requested: false,
        }
    }

    /// Clears the phonebook and queues the module configuration, which runs
    /// once the module reports ready.
    pub fn init(&mut self) -> Result<()> {
        info!("Initializing SIM800L...");
        self.session.phonebook.clear_all();
        self.session.status = GsmStatus::WaitingForReady;
        self.ready = ReadyProbe::default();
        for kind in CommandKind::BOOT_SEQUENCE {
            self.scheduler.push(PendingCommand::simple(kind))?;
        }
        Ok(())
    }

    pub fn status(&self) -> GsmStatus {
        self.session.status
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phonebook(&self) -> &PhoneBook {
        &self.session.phonebook
    }

    /// Phonebook slot of the current or last alarm call.
    pub fn calling(&self) -> Option<Slot> {
        self.session.call_entry
    }

    pub fn pending_commands(&self) -> usize {
        self.scheduler.len()
    }

    pub fn transport(&self) -> &T {
        &self.tx
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.tx
    }

    /// Queues one call per phonebook slot, in slot order.
    pub fn schedule_call_phonebook_entries(&mut self) -> Result<()> {
        self.session.call_entry = None;
        for slot in Slot::all() {
            self.scheduler.push(PendingCommand::call_entry(slot))?;
        }
        Ok(())
    }

    pub fn schedule_add_phonebook_entry(&mut self, slot: Slot, number: &str) -> Result<()> {
        self.scheduler
            .add_phonebook_entry(&mut self.session.phonebook, slot, number)
    }

    pub fn schedule_del_phonebook_entry(&mut self, slot: Slot) -> Result<()> {
        self.scheduler
            .del_phonebook_entry(&self.session.phonebook, slot)
    }

    pub fn schedule_sms(&mut self, recipient: &str, body: &str) -> Result<()> {
        self.scheduler
            .push(PendingCommand::sms(SmsRecord::new(recipient, body)?))
    }

    /// Queues a status SMS; its text is composed when it is sent.
    pub fn schedule_params_sms(&mut self, recipient: &str) -> Result<()> {
        self.scheduler
            .push(PendingCommand::params_sms(SmsRecord::to(recipient)?))
    }

    pub fn schedule_call_number(&mut self, number: &str) -> Result<()> {
        self.scheduler
            .push(PendingCommand::call_number(phone_number(number)?))
    }

    /// Closes the current call on the next poll. Ignored outside a call.
    pub fn request_hangup(&mut self) {
        self.hangup_requested = self.session.status.in_call();
    }

    /// Runs one step: reads at most one reply from `rx` and advances the state
    /// machine. Returns the classified reply, if any.
    pub fn poll(
        &mut self,
        rx: &mut impl ByteSource,
        platform: &mut impl Platform,
        alarm: &mut impl AlarmControl,
    ) -> Option<ReplyCode> {
        let reply = self.analyze(rx, alarm);
        if let Some(code) = reply {
            debug!("reply {:?} in {}", code, self.session.status.as_str());
        }
        let now = platform.now_ms();

        match self.session.status {
            GsmStatus::SendCommand => self.send_command(now, platform),
            GsmStatus::WaitingForReply => self.on_waiting_for_reply(reply, now, platform),
            GsmStatus::CallInProgress | GsmStatus::CallAnswered => {
                self.on_call(reply, now, platform)
            }
            GsmStatus::Idle => self.on_idle(reply, now, platform, &*alarm),
            GsmStatus::WaitingForIdle => {
                if self.timer.expired(now, self.config.hangup_timeout_ms) {
                    self.set_status(GsmStatus::Idle);
                }
            }
            GsmStatus::WaitingForReady => self.on_waiting_for_ready(reply, now, platform),
            GsmStatus::Error => {}
        }
        reply
    }

    fn analyze(&mut self, rx: &mut impl ByteSource, alarm: &mut impl AlarmControl) -> Option<ReplyCode> {
        let Self {
            parser,
            classifier,
            scheduler,
            session,
            ..
        } = self;
        while let Some(byte) = rx.pop() {
            let outcome = parser.feed_message(byte, &GSM_REPLIES, |id, message| {
                classifier.classify(id, message, &mut *session, &mut *scheduler, &mut *alarm)
            });
            match outcome {
                MessageOutcome::Matched(code) => return code,
                MessageOutcome::Overflow => warn!("GSM reply buffer overflow"),
                MessageOutcome::Pending => {}
            }
        }
        None
    }

    fn set_status(&mut self, status: GsmStatus) {
        if self.session.status != status {
            info!(
                "GSM {} -> {}",
                self.session.status.as_str(),
                status.as_str()
            );
            self.session.status = status;
        }
    }

    /// Makes `kind` the in-flight command; it is transmitted on the next poll.
    fn send(&mut self, kind: CommandKind) {
        self.session.current_command = kind;
        self.set_status(GsmStatus::SendCommand);
    }

    /// Transmits a fixed command right away without leaving the current
    /// state, which then waits for its OK.
    fn send_now(&mut self, kind: CommandKind) {
        self.session.current_command = kind;
        if let Some(text) = kind.literal() {
            debug!("AT >> {}", text);
            write_bytes(&mut self.tx, text.as_bytes());
        }
    }

    fn send_command(&mut self, now: u32, platform: &mut impl Platform) {
        let text = match self.session.current_command.literal() {
            Some(text) => text,
            None => self.at_cmd.as_str(),
        };
        debug!("AT >> {}", text);
        write_bytes(&mut self.tx, text.as_bytes());
        self.set_status(GsmStatus::WaitingForReply);
        self.timer.restart(now);
        platform.refresh();
    }

    /// Post-reply pause, then the reply counts as liveness.
    fn settle(&self, platform: &mut impl Platform) {
        platform.delay_ms(self.config.at_delay_ms);
        platform.refresh();
    }

    fn on_waiting_for_reply(&mut self, reply: Option<ReplyCode>, now: u32, platform: &mut impl Platform) {
        let Some(reply) = reply else {
            // The hardware watchdog bounds the wait.
            return;
        };
        let command = self.session.current_command;
        match reply {
            ReplyCode::Line => {
                if command == CommandKind::Imei {
                    self.store_imei();
                }
            }
            ReplyCode::Cops => {
                if self.classifier.line().is_empty() {
                    platform.delay_ms(self.config.cops_retry_delay_ms);
                    self.send(CommandKind::Cops);
                }
            }
            ReplyCode::SmsPrompt => {
                if command == CommandKind::Sms {
                    self.stream_sms_line();
                }
                platform.refresh();
            }
            ReplyCode::Ok => {
                match command {
                    CommandKind::Answer => {
                        self.set_status(GsmStatus::CallAnswered);
                        self.timer.restart(now);
                    }
                    CommandKind::CallPhonebookEntry | CommandKind::CallPhoneNumber => {
                        self.set_status(GsmStatus::CallInProgress);
                        self.timer.restart(now);
                    }
                    CommandKind::HangUp => {
                        self.end_call();
                        self.timer.restart(now);
                        self.set_status(GsmStatus::WaitingForIdle);
                    }
                    CommandKind::WritePhonebookEntry | CommandKind::DelPhonebookEntry => {
                        self.schedule_caller_params_sms();
                        self.sms_cursor = None;
                        self.set_status(GsmStatus::Idle);
                    }
                    CommandKind::Sms => {
                        self.sms_cursor = None;
                        self.set_status(GsmStatus::Idle);
                    }
                    _ => self.set_status(GsmStatus::Idle),
                }
                self.settle(platform);
            }
            ReplyCode::Error
            | ReplyCode::NoCarrier
            | ReplyCode::NoDialtone
            | ReplyCode::NoAnswer
            | ReplyCode::Busy
            | ReplyCode::CmeError => {
                warn!("{:?} failed with {:?}", command, reply);
                self.end_call();
                self.sms_cursor = None;
                self.set_status(GsmStatus::Idle);
                self.settle(platform);
            }
            _ => {}
        }
    }

    /// Drops what a call leaves behind: pending tones, a pending hang-up
    /// request and the inactivity count.
    fn end_call(&mut self) {
        self.inactivity = 0;
        self.hangup_requested = false;
        self.classifier.clear_remote();
    }

    /// IMEI is the generic line without its leading CRLF and trailing double
    /// CRLF.
    fn store_imei(&mut self) {
        let line = self.classifier.line();
        let Some(imei) = line.get(2..line.len().saturating_sub(4)) else {
            return;
        };
        self.session.imei.clear();
        if self.session.imei.push_str(imei).is_err() {
            warn!("IMEI too long");
        }
    }

    /// Sends the next CRLF-terminated line of the SMS body; the last chunk is
    /// closed with Ctrl-Z.
    fn stream_sms_line(&mut self) {
        let Some(offset) = self.sms_cursor else {
            return;
        };
        let rest = self.sms.get(offset..).unwrap_or("");
        match rest.find("\r\n") {
            Some(end) => {
                write_bytes(&mut self.tx, rest[..end + 2].as_bytes());
                self.sms_cursor = Some(offset + end + 2);
            }
            None => {
                write_bytes(&mut self.tx, rest.as_bytes());
                write_bytes(&mut self.tx, &[CTRL_Z]);
                self.sms_cursor = None;
            }
        }
    }

    fn on_call(&mut self, reply: Option<ReplyCode>, now: u32, platform: &mut impl Platform) {
        if self.timer.expired(now, self.config.call_inactivity_timeout_ms) {
            self.inactivity += 1;
            if self.inactivity >= CALL_INACTIVITY_LIMIT {
                info!("call inactive, hanging up");
                self.inactivity = 0;
                self.send(CommandKind::HangUp);
                return;
            }
            platform.refresh();
        }

        let reply = reply.or_else(|| {
            core::mem::take(&mut self.hangup_requested).then_some(ReplyCode::Hangup)
        });
        let Some(reply) = reply else {
            return;
        };

        match reply {
            ReplyCode::Reset => {
                error!("remote reset requested");
                self.end_call();
                self.send_now(CommandKind::HangUp);
                platform.delay_ms(self.config.reset_delay_ms);
                platform.system_reset();
                self.set_status(GsmStatus::Error);
            }
            ReplyCode::MoRing | ReplyCode::MoConnected => {
                self.timer.restart(now);
                self.inactivity = 0;
                platform.refresh();
            }
            ReplyCode::NoCarrier => {
                self.end_call();
                self.set_status(GsmStatus::Idle);
                self.settle(platform);
            }
            ReplyCode::Hangup => {
                self.inactivity = 0;
                self.settle(platform);
                self.send_now(CommandKind::HangUp);
            }
            ReplyCode::Ok => {
                self.settle(platform);
                self.timer.restart(now);
                self.inactivity = CALL_INACTIVITY_LIMIT;
                match self.session.current_command {
                    CommandKind::HangUp => {
                        self.end_call();
                        self.set_status(GsmStatus::WaitingForIdle);
                    }
                    // Tone played, the caller may enter the next command.
                    CommandKind::DtmfSharp | CommandKind::DtmfStar => self.inactivity = 0,
                    CommandKind::ReadPhonebook => {
                        self.schedule_peer_params_sms();
                        self.send_now(CommandKind::DtmfSharp);
                    }
                    _ => {}
                }
            }
            ReplyCode::GetParams => {
                self.settle(platform);
                if let Err(err) = self.scheduler.push(PendingCommand::simple(CommandKind::Cbc)) {
                    warn!("battery refresh not queued: {}", err);
                }
                self.send_now(CommandKind::ReadPhonebook);
                self.timer.restart(now);
                self.inactivity = CALL_INACTIVITY_LIMIT;
            }
            ReplyCode::DtmfSharp | ReplyCode::DtmfStar => {
                self.settle(platform);
                let tone = if reply == ReplyCode::DtmfSharp {
                    CommandKind::DtmfSharp
                } else {
                    CommandKind::DtmfStar
                };
                self.send_now(tone);
                self.timer.restart(now);
                self.inactivity = CALL_INACTIVITY_LIMIT;
            }
            ReplyCode::Help => {
                self.settle(platform);
                self.schedule_help_sms();
                self.send_now(CommandKind::DtmfSharp);
                self.timer.restart(now);
                self.inactivity = CALL_INACTIVITY_LIMIT;
            }
            _ => {}
        }
    }

    fn on_idle(
        &mut self,
        reply: Option<ReplyCode>,
        now: u32,
        platform: &mut impl Platform,
        alarm: &impl AlarmControl,
    ) {
        if let Some(command) = self.scheduler.pop() {
            self.dispatch(command, alarm);
            return;
        }

        if reply == Some(ReplyCode::Ring) {
            if self.session.ring_counter == 0 {
                self.session.caller_id.clear();
            }
            self.session.ring_counter += 1;
            if self.session.ring_counter > 1 {
                self.session.ring_counter = 0;
                info!("answering call");
                self.send(CommandKind::Answer);
                self.timer.restart(now);
            }
        } else if self.timer.expired(now, self.config.call_inactivity_timeout_ms) {
            self.send(CommandKind::At);
        } else {
            platform.refresh();
        }
    }

    fn on_waiting_for_ready(&mut self, reply: Option<ReplyCode>, now: u32, platform: &mut impl Platform) {
        match reply {
            Some(ReplyCode::Ready) => self.become_ready(platform),
            Some(ReplyCode::Ok) => {
                self.ready.awaiting = false;
                self.ready.ok_count += 1;
                if self.ready.ok_count >= READY_OK_COUNT {
                    self.become_ready(platform);
                }
            }
            _ => {
                if !self.ready.awaiting {
                    write_bytes(&mut self.tx, CommandKind::At.literal().unwrap_or("AT\n").as_bytes());
                    self.ready.awaiting = true;
                    self.ready.sent.restart(now);
                } else if self.ready.sent.elapsed(now) > self.config.ready_probe_interval_ms {
                    self.ready.awaiting = false;
                    self.ready.ok_count = 0;
                }
            }
        }
    }

    fn become_ready(&mut self, platform: &mut impl Platform) {
        info!("SIM800L ready");
        self.ready = ReadyProbe::default();
        self.set_status(GsmStatus::Idle);
        platform.refresh();
        platform.delay_ms(self.config.starting_delay_ms);
    }

    fn dispatch(&mut self, command: PendingCommand, alarm: &impl AlarmControl) {
        debug!("dispatch {:?}", command.kind);
        let result = match (command.kind, command.payload) {
            (CommandKind::WritePhonebookEntry, Some(CommandPayload::Phonebook(entry))) => {
                self.write_phonebook_entry(&entry)
            }
            (CommandKind::DelPhonebookEntry, Some(CommandPayload::Slot(slot))) => {
                self.del_phonebook_entry(slot)
            }
            (CommandKind::Sms, Some(CommandPayload::Sms(sms))) => self.send_sms(&sms),
            (CommandKind::SmsGetParams, Some(CommandPayload::Sms(mut sms))) => {
                StatusReport::new(&self.config, &self.session, alarm)
                    .compose(&mut sms.body)
                    .and_then(|()| self.send_sms(&sms))
            }
            (CommandKind::CallPhonebookEntry, Some(CommandPayload::Slot(slot))) => {
                self.call_phonebook_entry(slot)
            }
            (CommandKind::CallPhoneNumber, Some(CommandPayload::Number(number))) => {
                self.dial(CommandKind::CallPhoneNumber, &number)
            }
            (CommandKind::WelcomeSms, None) => self.schedule_welcome_sms(),
            (kind, None) if kind.literal().is_some() => {
                self.send(kind);
                Ok(())
            }
            (kind, _) => {
                warn!("malformed scheduled command {:?}", kind);
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!("scheduled {:?} dropped: {}", command.kind, err);
        }
    }

    fn set_at_cmd(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.at_cmd.clear();
        self.at_cmd.write_fmt(args).map_err(|_| Error::NumberTooLong)
    }

    fn write_phonebook_entry(&mut self, entry: &PhonebookEntry) -> Result<()> {
        self.set_at_cmd(format_args!(
            "AT+CPBW={},\"{}\"\n",
            entry.slot.get(),
            entry.number.as_str()
        ))?;
        self.send(CommandKind::WritePhonebookEntry);
        Ok(())
    }

    fn del_phonebook_entry(&mut self, slot: Slot) -> Result<()> {
        self.session.phonebook.clear(slot);
        self.set_at_cmd(format_args!("AT+CPBW={}\n", slot.get()))?;
        self.send(CommandKind::DelPhonebookEntry);
        Ok(())
    }

    /// Records the slot as the current alarm call; an empty slot is skipped
    /// without dialing.
    fn call_phonebook_entry(&mut self, slot: Slot) -> Result<()> {
        if self.session.status != GsmStatus::Idle {
            return Err(Error::Busy);
        }
        self.session.call_entry = Some(slot);
        let Some(number) = self.session.phonebook.get(slot) else {
            debug!("slot {} empty, not calling", slot.get());
            return Ok(());
        };
        let number = phone_number(number)?;
        info!("calling slot {}", slot.get());
        self.dial(CommandKind::CallPhonebookEntry, &number)
    }

    fn dial(&mut self, kind: CommandKind, number: &str) -> Result<()> {
        self.set_at_cmd(format_args!("atd{};\n", number))?;
        self.send(kind);
        Ok(())
    }

    /// Starts an SMS: `AT+CMGS` now, the body line by line at each prompt.
    fn send_sms(&mut self, sms: &SmsRecord) -> Result<()> {
        if self.session.status != GsmStatus::Idle {
            return Err(Error::Busy);
        }
        self.set_at_cmd(format_args!("AT+CMGS=\"{}\"\r\n", sms.recipient.as_str()))?;
        self.sms.clear();
        self.sms
            .push_str(&sms.body)
            .map_err(|_| Error::MessageTooLong)?;
        self.sms_cursor = Some(0);
        info!("sending SMS to {}", sms.recipient.as_str());
        self.send(CommandKind::Sms);
        Ok(())
    }

    fn schedule_welcome_sms(&mut self) -> Result<()> {
        let Some(number) = self.session.phonebook.get(Slot::FIRST) else {
            warn!("no number in slot 1, welcome SMS skipped");
            return Ok(());
        };
        let sms = SmsRecord::to(number)?;
        self.scheduler.push(PendingCommand::params_sms(sms))
    }

    /// Confirms a phonebook change to the caller who requested it.
    fn schedule_caller_params_sms(&mut self) {
        if self.session.caller_id.is_empty() {
            debug!("no caller id, phonebook change not confirmed");
            return;
        }
        let caller = self.session.caller_id.clone();
        if let Err(err) = self.schedule_params_sms(&caller) {
            warn!("confirmation SMS not queued: {}", err);
        }
    }

    fn schedule_peer_params_sms(&mut self) {
        let result = match self.session.call_peer() {
            Some(peer) => SmsRecord::to(peer),
            None => return,
        };
        if let Err(err) = result.and_then(|sms| self.scheduler.push(PendingCommand::params_sms(sms))) {
            warn!("status SMS not queued: {}", err);
        }
    }

    fn schedule_help_sms(&mut self) {
        let result = match self.session.call_peer() {
            Some(peer) => SmsRecord::to(peer),
            None => return,
        };
        let result = result.and_then(|mut sms| {
            compose_help(&self.config, &mut sms.body)?;
            self.scheduler.push(PendingCommand::sms(sms))
        });
        if let Err(err) = result {
            warn!("help SMS not queued: {}", err);
        }
    }
}

fn write_bytes<T: Write>(tx: &mut T, bytes: &[u8]) {
    if tx.write_all(bytes).is_err() {
        warn!("GSM transport write failed");
    }
}
