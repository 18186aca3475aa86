//! Single-slot mailbox between the frame producer and the pipeline.
//!
//! The producer never blocks: posting into a full slot evicts the stale
//! item so the consumer always sees the newest sample.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Producer half.
#[derive(Debug, Clone)]
pub struct MailboxSender<T> {
    tx: Sender<T>,
    // used only to evict the stale item when the slot is full
    evict: Receiver<T>,
    closed: Arc<AtomicBool>,
}

/// Consumer half.
#[derive(Debug)]
pub struct MailboxReceiver<T> {
    rx: Receiver<T>,
    closed: Arc<AtomicBool>,
}

/// The receiver side has been dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("mailbox closed")]
pub struct MailboxClosed;

/// Create a connected sender/receiver pair.
#[must_use]
pub fn mailbox<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let (tx, rx) = bounded(1);
    let closed = Arc::new(AtomicBool::new(false));
    (
        MailboxSender {
            tx,
            evict: rx.clone(),
            closed: Arc::clone(&closed),
        },
        MailboxReceiver { rx, closed },
    )
}

impl<T> MailboxSender<T> {
    /// Put `item` in the slot, replacing anything not yet consumed.
    /// Returns `true` if an older item was evicted.
    ///
    /// # Errors
    ///
    /// [`MailboxClosed`] once the receiver is gone.
    pub fn post(&self, mut item: T) -> Result<bool, MailboxClosed> {
        if self.closed.load(Ordering::Acquire) {
            return Err(MailboxClosed);
        }
        let mut evicted = false;
        loop {
            match self.tx.try_send(item) {
                Ok(()) => return Ok(evicted),
                Err(TrySendError::Full(returned)) => {
                    item = returned;
                    evicted |= self.evict.try_recv().is_ok();
                }
                Err(TrySendError::Disconnected(_)) => return Err(MailboxClosed),
            }
        }
    }
}

impl<T> MailboxReceiver<T> {
    /// Wait up to `timeout` for the next item. `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// [`MailboxClosed`] once every sender is gone and the slot is empty.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, MailboxClosed> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Ok(Some(item)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(MailboxClosed),
        }
    }

    #[must_use]
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for MailboxReceiver<T> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_item_wins() {
        let (tx, rx) = mailbox();
        assert_eq!(tx.post(1), Ok(false));
        assert_eq!(tx.post(2), Ok(true));
        assert_eq!(tx.post(3), Ok(true));
        assert_eq!(rx.try_recv(), Some(3));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_recv_timeout_on_empty_slot() {
        let (_tx, rx) = mailbox::<u8>();
        assert_eq!(rx.recv_timeout(Duration::from_millis(5)), Ok(None));
    }

    #[test]
    fn test_closed_when_receiver_dropped() {
        let (tx, rx) = mailbox();
        drop(rx);
        assert_eq!(tx.post(1), Err(MailboxClosed));
    }

    #[test]
    fn test_closed_when_senders_dropped() {
        let (tx, rx) = mailbox();
        tx.post(7).unwrap();
        drop(tx);
        assert_eq!(rx.recv_timeout(Duration::from_millis(5)), Ok(Some(7)));
        assert_eq!(rx.recv_timeout(Duration::from_millis(5)), Err(MailboxClosed));
    }

    #[test]
    fn test_producer_thread_never_blocks() {
        let (tx, rx) = mailbox();
        let producer = std::thread::spawn(move || {
            for i in 0..1000 {
                tx.post(i).unwrap();
            }
        });
        producer.join().unwrap();
        assert_eq!(rx.try_recv(), Some(999));
    }
}
