use thiserror::Error;

/// Errors returned by the scheduling and phonebook operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("command scheduler is full")]
    SchedulerFull,
    #[error("phonebook slot must be 1..=3")]
    InvalidSlot,
    #[error("phonebook slot is empty")]
    EmptySlot,
    #[error("phone number too long")]
    NumberTooLong,
    #[error("SMS recipient too long")]
    RecipientTooLong,
    #[error("SMS body too long")]
    MessageTooLong,
    #[error("engine is busy")]
    Busy,
    #[error("invalid argument")]
    InvalidArgument,
}

pub type Result<T> = core::result::Result<T, Error>;
