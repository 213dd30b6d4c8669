use core::fmt::Write;

use heapless::String;

use crate::config::Config;
use crate::constants::{MAX_RECIPIENT_LENGTH, MAX_SMS_LENGTH};
use crate::error::{Error, Result};
use crate::phone_book::Slot;
use crate::session::Session;
use crate::traits::AlarmControl;

pub type Recipient = String<MAX_RECIPIENT_LENGTH>;
pub type SmsBody = String<MAX_SMS_LENGTH>;

/// An outgoing text message. The Ctrl-Z terminator is added on the wire only.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SmsRecord {
    pub recipient: Recipient,
    pub body: SmsBody,
}

impl SmsRecord {
    pub fn new(recipient: &str, body: &str) -> Result<Self> {
        let mut sms = Self::to(recipient)?;
        if body.len() >= MAX_SMS_LENGTH {
            return Err(Error::MessageTooLong);
        }
        sms.body.push_str(body).map_err(|_| Error::MessageTooLong)?;
        Ok(sms)
    }

    /// Record with an empty body, filled in later.
    pub fn to(recipient: &str) -> Result<Self> {
        if recipient.len() >= MAX_RECIPIENT_LENGTH {
            return Err(Error::RecipientTooLong);
        }
        let mut to = Recipient::new();
        to.push_str(recipient).map_err(|_| Error::RecipientTooLong)?;
        Ok(Self {
            recipient: to,
            body: SmsBody::new(),
        })
    }
}

/// Values printed in the status SMS.
pub struct StatusReport<'a> {
    pub config: &'a Config,
    pub session: &'a Session,
    pub temperature: Option<f32>,
    pub threshold: f32,
    pub alarm_enabled: bool,
    pub auto_rearm: bool,
}

impl<'a> StatusReport<'a> {
    pub fn new(config: &'a Config, session: &'a Session, alarm: &impl AlarmControl) -> Self {
        Self {
            config,
            session,
            temperature: alarm.temperature(),
            threshold: alarm.threshold(),
            alarm_enabled: alarm.alarm_enabled(),
            auto_rearm: alarm.auto_rearm(),
        }
    }

    pub fn compose(&self, body: &mut SmsBody) -> Result<()> {
        body.clear();
        self.write(body).map_err(|_| Error::MessageTooLong)?;
        // The body must leave room for nothing but the terminator.
        if body.len() >= MAX_SMS_LENGTH {
            return Err(Error::MessageTooLong);
        }
        Ok(())
    }

    fn write(&self, out: &mut SmsBody) -> core::fmt::Result {
        let session = self.session;
        write!(
            out,
            "{} {}\r\n\r\n",
            self.config.device_name, self.config.firmware_version
        )?;
        write!(out, "Terminal: {}\r\n", session.imei.as_str())?;
        write!(out, "Operator: {}\r\n", session.operator.as_str())?;
        write!(out, "Signal: {}%\r\n", session.signal_pct)?;
        write!(
            out,
            "Battery: {}%, {:.1}V\r\n",
            session.battery_pct, session.battery_volts
        )?;
        match self.temperature {
            Some(celsius) => write!(out, "Temperature: {:.1} C\r\n", celsius)?,
            None => out.write_str("Temperature: n/a\r\n")?,
        }
        write!(out, "Threshold: {:.1} C\r\n", self.threshold)?;
        write!(
            out,
            "Alarm: {}\r\n",
            if self.alarm_enabled { "Enabled" } else { "Disabled" }
        )?;
        write!(
            out,
            "Auto re-arm: {}\r\n",
            if self.auto_rearm { "Yes" } else { "No" }
        )?;
        for slot in Slot::all() {
            write!(
                out,
                "Num {}: {}\r\n",
                slot.get(),
                session.phonebook.number(slot)
            )?;
        }
        out.write_str("\r\nDial #* for the command menu.\r\n")
    }
}

/// The remote command menu sent on `#*`.
pub fn compose_help(config: &Config, body: &mut SmsBody) -> Result<()> {
    body.clear();
    write!(
        body,
        "\r\n{} {}\r\n\r\n\
         #*  Help\r\n\
         ### Alarm OFF\r\n\
         ##* Alarm ON\r\n\
         ##0 Auto re-arm OFF\r\n\
         ##1 Auto re-arm ON\r\n\
         *** Status\r\n\
         **GGD** Set threshold GG:[00-99] D:[0-9]\r\n\
         #X## Delete number X:[1-3]\r\n\
         *X*Num** Set number X:[1-3]\r\n",
        config.device_name, config.firmware_version
    )
    .map_err(|_| Error::MessageTooLong)
}
