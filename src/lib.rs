//! SIM800L remote temperature alarm.
//!
//! A cooperative AT command engine for the SIM800L GSM module: replies are
//! scanned byte by byte, classified, and drive a single state machine that
//! owns the session, the command queue and the phonebook mirror. Callers can
//! reconfigure the unit during a call with DTMF tones.
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod alarms;
pub mod command;
pub mod config;
pub mod console;
pub mod constants;
pub mod custom_strings;
pub mod dtmf;
pub mod error;
pub mod ntc;
pub mod parser;
pub mod phone_book;
pub mod replies;
pub mod scheduler;
pub mod session;
pub mod sim800;
pub mod sms;
pub mod tick;
pub mod traits;

pub use config::Config;
pub use error::{Error, Result};
pub use sim800::Sim800;
