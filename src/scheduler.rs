use heapless::Vec;

use crate::command::PendingCommand;
use crate::constants::MAX_SCHEDULER;
use crate::error::{Error, Result};
use crate::phone_book::{PhoneBook, PhonebookEntry, Slot, phone_number};

/// Bounded FIFO of commands waiting for the engine to become idle.
///
/// Pushes append at the tail and pops advance the head; once the head reaches
/// the tail both are reset, so the storage never wraps.
pub struct Scheduler {
    items: Vec<PendingCommand, MAX_SCHEDULER>,
    head: usize,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            head: 0,
        }
    }

    pub fn push(&mut self, command: PendingCommand) -> Result<()> {
        self.items.push(command).map_err(|command| {
            warn!("scheduler full, dropping {:?}", command.kind);
            Error::SchedulerFull
        })
    }

    pub fn pop(&mut self) -> Option<PendingCommand> {
        let command = self.items.get(self.head)?.clone();
        self.head += 1;
        if self.head == self.items.len() {
            self.clear();
        }
        Some(command)
    }

    pub fn len(&self) -> usize {
        self.items.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.head = 0;
    }

    /// Stores `number` in the local phonebook right away and queues the write
    /// to the SIM.
    pub fn add_phonebook_entry(
        &mut self,
        phonebook: &mut PhoneBook,
        slot: Slot,
        number: &str,
    ) -> Result<()> {
        let number = phone_number(number)?;
        self.push(PendingCommand::write_entry(PhonebookEntry {
            slot,
            number: number.clone(),
        }))?;
        phonebook.set(slot, &number)
    }

    /// Queues the removal of an occupied slot; the local copy is cleared when
    /// the command is sent.
    pub fn del_phonebook_entry(&mut self, phonebook: &PhoneBook, slot: Slot) -> Result<()> {
        if phonebook.get(slot).is_none() {
            return Err(Error::EmptySlot);
        }
        self.push(PendingCommand::delete_entry(slot))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
