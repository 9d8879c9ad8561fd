//! Single-slot, last-value-wins channel between a producer task and the control core.
//!
//! Unlike a `Channel` with capacity 1, a full slot never rejects a send: the
//! newest value replaces the undrained one, so producers never block or lose
//! the latest sample.
//!
//! `embassy_sync::signal::Signal` has the same overwrite semantics, but its
//! `signal` does not report whether an unread value was replaced, which
//! `try_send` does.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

pub struct Mailbox<M: RawMutex, T> {
    slot: Mutex<M, Cell<Option<T>>>,
}

impl<M: RawMutex, T> Mailbox<M, T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Store `value`, replacing any undrained one.
    ///
    /// Returns `true` if the slot was empty, `false` if an unread value was overwritten.
    pub fn try_send(&self, value: T) -> bool {
        self.slot.lock(|slot| slot.replace(Some(value))).is_none()
    }

    /// Take the pending value, if any. An empty slot just means "nothing new".
    pub fn try_receive(&self) -> Option<T> {
        self.slot.lock(|slot| slot.take())
    }

    pub fn sender(&self) -> MailboxSender<'_, M, T> {
        MailboxSender { mailbox: self }
    }

    pub fn receiver(&self) -> MailboxReceiver<'_, M, T> {
        MailboxReceiver { mailbox: self }
    }
}

impl<M: RawMutex, T> Default for Mailbox<M, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half handed to an acquisition task.
pub struct MailboxSender<'a, M: RawMutex, T> {
    mailbox: &'a Mailbox<M, T>,
}

impl<'a, M: RawMutex, T> MailboxSender<'a, M, T> {
    pub fn try_send(&self, value: T) -> bool {
        self.mailbox.try_send(value)
    }
}

impl<'a, M: RawMutex, T> Clone for MailboxSender<'a, M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, M: RawMutex, T> Copy for MailboxSender<'a, M, T> {}

/// Consumer half owned by the control core.
pub struct MailboxReceiver<'a, M: RawMutex, T> {
    mailbox: &'a Mailbox<M, T>,
}

impl<'a, M: RawMutex, T> MailboxReceiver<'a, M, T> {
    pub fn try_receive(&self) -> Option<T> {
        self.mailbox.try_receive()
    }
}

impl<'a, M: RawMutex, T> Clone for MailboxReceiver<'a, M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, M: RawMutex, T> Copy for MailboxReceiver<'a, M, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};

    #[test]
    fn empty_receive_is_none() {
        let mb: Mailbox<NoopRawMutex, u32> = Mailbox::new();
        assert_eq!(mb.try_receive(), None);
    }

    #[test]
    fn last_value_wins() {
        let mb: Mailbox<NoopRawMutex, u32> = Mailbox::new();
        assert!(mb.try_send(1));
        assert!(!mb.try_send(2));
        assert_eq!(mb.try_receive(), Some(2));
        assert_eq!(mb.try_receive(), None);
    }

    #[test]
    fn halves_share_one_slot() {
        static MB: Mailbox<CriticalSectionRawMutex, u8> = Mailbox::new();
        let tx = MB.sender();
        let rx = MB.receiver();
        assert!(tx.try_send(7));
        assert_eq!(rx.try_receive(), Some(7));
        assert!(tx.try_send(8));
    }

    #[test]
    fn producer_thread_never_blocks() {
        static MB: Mailbox<CriticalSectionRawMutex, u32> = Mailbox::new();
        let producer = std::thread::spawn(|| {
            for i in 0..1_000 {
                MB.try_send(i);
            }
        });
        producer.join().unwrap();
        assert_eq!(MB.try_receive(), Some(999));
    }
}
