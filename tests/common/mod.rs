#![allow(dead_code)]

use alarm800l::Config;
use alarm800l::Sim800;
use alarm800l::replies::ReplyCode;
use alarm800l::session::GsmStatus;
use alarm800l::traits::{AlarmControl, Clock, SystemReset, Watchdog};
use embedded_hal::delay::DelayNs;
use heapless::spsc::Queue;

pub const CALL_WINDOW_MS: u32 = 1_000;
pub const HANGUP_SETTLE_MS: u32 = 500;
pub const CALLER: &str = "+393331234567";

/// Transport that keeps everything the engine writes.
#[derive(Default)]
pub struct Recorder(pub Vec<u8>);

impl embedded_io::ErrorType for Recorder {
    type Error = core::convert::Infallible;
}

impl embedded_io::Write for Recorder {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Manual clock, counters instead of a watchdog and a reset line, and a delay
/// that only records.
#[derive(Default)]
pub struct MockPlatform {
    pub now: u32,
    pub refreshes: u32,
    pub resets: u32,
    pub delays_ms: Vec<u32>,
}

impl Clock for MockPlatform {
    fn now_ms(&self) -> u32 {
        self.now
    }
}

impl Watchdog for MockPlatform {
    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

impl SystemReset for MockPlatform {
    fn system_reset(&mut self) {
        self.resets += 1;
    }
}

impl DelayNs for MockPlatform {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

pub struct MockAlarm {
    pub temperature: Option<f32>,
    pub threshold: f32,
    pub enabled: bool,
    pub auto_rearm: bool,
}

impl Default for MockAlarm {
    fn default() -> Self {
        Self {
            temperature: Some(21.5),
            threshold: 5.0,
            enabled: true,
            auto_rearm: true,
        }
    }
}

impl AlarmControl for MockAlarm {
    fn temperature(&self) -> Option<f32> {
        self.temperature
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

/// An engine wired to a simulated modem.
pub struct Rig {
    pub rx: Queue<u8, 1024>,
    pub engine: Sim800<Recorder>,
    pub platform: MockPlatform,
    pub alarm: MockAlarm,
}

impl Rig {
    pub fn new() -> Self {
        let config = Config::new()
            .device_name("TEST")
            .call_inactivity_timeout_ms(CALL_WINDOW_MS)
            .hangup_timeout_ms(HANGUP_SETTLE_MS);
        Self {
            rx: Queue::new(),
            engine: Sim800::new(Recorder::default(), config),
            platform: MockPlatform::default(),
            alarm: MockAlarm::default(),
        }
    }

    /// Engine that has seen the module report ready, nothing queued.
    pub fn ready() -> Self {
        let mut rig = Self::new();
        assert_eq!(rig.reply("\r\nSMS Ready\r\n"), Some(ReplyCode::Ready));
        assert_eq!(rig.engine.status(), GsmStatus::Idle);
        rig.sent();
        rig
    }

    /// Queues bytes as if the modem sent them.
    pub fn receive(&mut self, text: &str) {
        let (mut producer, _) = self.rx.split();
        for byte in text.bytes() {
            producer.enqueue(byte).unwrap();
        }
    }

    pub fn poll(&mut self) -> Option<ReplyCode> {
        let (_, mut consumer) = self.rx.split();
        self.engine
            .poll(&mut consumer, &mut self.platform, &mut self.alarm)
    }

    /// Delivers one modem message and runs one step on it.
    pub fn reply(&mut self, text: &str) -> Option<ReplyCode> {
        self.receive(text);
        self.poll()
    }

    pub fn ok(&mut self) -> Option<ReplyCode> {
        self.reply("\r\nOK\r\n")
    }

    /// Delivers DTMF tones one by one, returns the reply to the last one.
    pub fn tones(&mut self, tones: &str) -> Option<ReplyCode> {
        let mut last = None;
        for tone in tones.chars() {
            last = self.reply(&format!("\r\n+DTMF: {tone}\r\n"));
        }
        last
    }

    pub fn advance(&mut self, ms: u32) {
        self.platform.now = self.platform.now.wrapping_add(ms);
    }

    /// Everything written to the modem since the last call.
    pub fn sent(&mut self) -> String {
        let bytes = core::mem::take(&mut self.engine.transport_mut().0);
        String::from_utf8(bytes).unwrap()
    }

    /// Rings twice with caller id and answers.
    pub fn answer_call(&mut self, caller: &str) {
        assert_eq!(self.reply("\r\nRING\r\n"), Some(ReplyCode::Ring));
        let clip = format!("\r\n+CLIP: \"{caller}\",145,\"\",0,\"\",0\r\n");
        assert_eq!(self.reply(&clip), Some(ReplyCode::Clip));
        assert_eq!(self.reply("\r\nRING\r\n"), Some(ReplyCode::Ring));
        assert_eq!(self.engine.status(), GsmStatus::SendCommand);
        self.poll();
        assert_eq!(self.sent(), "ATA\n");
        self.ok();
        assert_eq!(self.engine.status(), GsmStatus::CallAnswered);
    }

    /// Polls until a command is on the wire, at most `steps` times.
    pub fn run_until_waiting(&mut self, steps: usize) {
        for _ in 0..steps {
            if self.engine.status() == GsmStatus::WaitingForReply {
                return;
            }
            self.poll();
        }
    }
}
