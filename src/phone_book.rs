// /src/phone_book.rs
use heapless::String;

use crate::constants::{MAX_NUM_LENGTH, MAX_PHONEBOOK_ENTRY};
use crate::error::{Error, Result};

/// One of the three phonebook positions, always in `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot(u8);

impl Slot {
    pub const FIRST: Slot = Slot(1);
    pub const LAST: Slot = Slot(MAX_PHONEBOOK_ENTRY as u8);

    pub const fn new(slot: u8) -> Option<Self> {
        if slot >= 1 && slot <= MAX_PHONEBOOK_ENTRY as u8 {
            Some(Self(slot))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (1..=MAX_PHONEBOOK_ENTRY as u8).map(Slot)
    }
}

impl TryFrom<u8> for Slot {
    type Error = Error;

    fn try_from(slot: u8) -> Result<Self> {
        Slot::new(slot).ok_or(Error::InvalidSlot)
    }
}

pub type PhoneNumber = String<MAX_NUM_LENGTH>;

pub fn phone_number(number: &str) -> Result<PhoneNumber> {
    let mut s = PhoneNumber::new();
    s.push_str(number).map_err(|_| Error::NumberTooLong)?;
    Ok(s)
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhonebookEntry {
    pub slot: Slot,
    pub number: PhoneNumber,
}

/// In-memory mirror of the modem phonebook, re-read from the SIM at boot.
pub struct PhoneBook {
    phones: [PhoneNumber; MAX_PHONEBOOK_ENTRY],
}

impl PhoneBook {
    pub const fn new() -> Self {
        Self {
            phones: [String::new(), String::new(), String::new()],
        }
    }

    pub fn set(&mut self, slot: Slot, number: &str) -> Result<()> {
        self.phones[slot.index()] = phone_number(number)?;
        Ok(())
    }

    pub fn clear(&mut self, slot: Slot) {
        self.phones[slot.index()].clear();
    }

    pub fn clear_all(&mut self) {
        self.phones.iter_mut().for_each(|number| number.clear());
    }

    /// Number stored in `slot`, `None` when the slot is empty.
    pub fn get(&self, slot: Slot) -> Option<&str> {
        let number = self.phones[slot.index()].as_str();
        (!number.is_empty()).then_some(number)
    }

    /// Number stored in `slot`, empty string when unset.
    pub fn number(&self, slot: Slot) -> &str {
        self.phones[slot.index()].as_str()
    }
}

impl Default for PhoneBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_one_based() {
        assert_eq!(Slot::new(0), None);
        assert_eq!(Slot::new(1).map(Slot::get), Some(1));
        assert_eq!(Slot::new(3).map(Slot::get), Some(3));
        assert_eq!(Slot::new(4), None);
        assert_eq!(Slot::try_from(9), Err(Error::InvalidSlot));
        assert_eq!(Slot::all().count(), 3);
    }

    #[test]
    fn set_get_clear() {
        let mut book = PhoneBook::new();
        let slot = Slot::new(2).unwrap();
        assert_eq!(book.get(slot), None);
        book.set(slot, "5551234567").unwrap();
        assert_eq!(book.get(slot), Some("5551234567"));
        book.clear(slot);
        assert_eq!(book.get(slot), None);
        assert_eq!(book.number(slot), "");
    }

    #[test]
    fn rejects_overlong_number() {
        let mut book = PhoneBook::new();
        let long = "123456789012345678901234567890123";
        assert_eq!(book.set(Slot::FIRST, long), Err(Error::NumberTooLong));
        assert_eq!(book.get(Slot::FIRST), None);
    }
}
