//! Unbounded FIFO message channel between the analysis engine and the dispatcher
//!
//! Built on `crossbeam::channel::unbounded`. Enqueueing never blocks and never
//! fails; dequeueing waits at most for the given timeout so the dispatcher can
//! stay responsive while the producer is idle.
//!
//! ```text
//! ┌──────────────────┐  enqueue  ┌───────────┐  dequeue(timeout)  ┌────────────┐
//! │ Analysis engine  │──────────▶│  channel  │───────────────────▶│ Dispatcher │
//! │ (MessageSender)  │           │ unbounded │                    │ (Receiver) │
//! └──────────────────┘           └───────────┘                    └────────────┘
//! ```
//!
//! There is no capacity bound: a producer that outpaces the dispatcher grows
//! memory instead of being backpressured.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::message::{Finding, Message};

/// Creates a connected sender/receiver pair.
pub fn unbounded() -> (MessageSender, MessageReceiver) {
    let (tx, rx) = channel::unbounded();
    (MessageSender { tx }, MessageReceiver { rx })
}

/// Result of a bounded wait on the channel.
#[derive(Debug)]
pub enum Dequeue {
    /// The next message in FIFO order.
    Message(Message),
    /// Nothing arrived within the timeout.
    Empty,
    /// Every sender is gone and the queue is drained.
    Closed,
}

/// Producer half. Cheap to clone; every clone feeds the same queue.
#[derive(Debug, Clone)]
pub struct MessageSender {
    tx: Sender<Message>,
}

impl MessageSender {
    /// Hands `message` over to the channel.
    ///
    /// The only failure crossbeam reports for an unbounded channel is a dropped
    /// receiver, in which case nobody is left to read the message.
    pub fn enqueue(&self, message: Message) {
        if let Err(err) = self.tx.send(message) {
            tracing::trace!(kind = %err.0.kind(), "receiver dropped, discarding message");
        }
    }

    pub fn trace(&self, text: impl Into<String>) {
        self.enqueue(Message::trace(text));
    }

    pub fn debug(&self, text: impl Into<String>) {
        self.enqueue(Message::debug(text));
    }

    pub fn info(&self, text: impl Into<String>) {
        self.enqueue(Message::info(text));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.enqueue(Message::error(text));
    }

    pub fn fatal(&self, text: impl Into<String>) {
        self.enqueue(Message::fatal(text));
    }

    pub fn finish(&self, text: impl Into<String>) {
        self.enqueue(Message::finish(text));
    }

    pub fn file_result(&self, text: impl Into<String>, finding: Finding) {
        self.enqueue(Message::file_result(text, finding));
    }

    pub fn gpo_result(&self, text: impl Into<String>, finding: Finding) {
        self.enqueue(Message::gpo_result(text, finding));
    }
}

/// Consumer half, owned by the dispatcher.
#[derive(Debug)]
pub struct MessageReceiver {
    rx: Receiver<Message>,
}

impl MessageReceiver {
    /// Waits up to `timeout` for the next message.
    pub fn dequeue(&self, timeout: Duration) -> Dequeue {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => Dequeue::Message(message),
            Err(RecvTimeoutError::Timeout) => Dequeue::Empty,
            Err(RecvTimeoutError::Disconnected) => Dequeue::Closed,
        }
    }

    /// Takes every message currently queued without waiting.
    pub fn drain(&self) -> impl Iterator<Item = Message> + '_ {
        self.rx.try_iter()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn texts(receiver: &MessageReceiver) -> Vec<String> {
        receiver.drain().map(|m| m.text().to_string()).collect()
    }

    #[test]
    fn test_fifo_order_single_producer() {
        let (tx, rx) = unbounded();
        for i in 0..100 {
            tx.info(format!("message {}", i));
        }
        let expected: Vec<String> = (0..100).map(|i| format!("message {}", i)).collect();
        assert_eq!(texts(&rx), expected);
    }

    #[test]
    fn test_dequeue_empty_returns_after_timeout() {
        let (_tx, rx) = unbounded();
        let timeout = Duration::from_millis(150);
        let start = Instant::now();

        assert!(matches!(rx.dequeue(timeout), Dequeue::Empty));
        assert!(start.elapsed() >= timeout);
    }

    #[test]
    fn test_dequeue_default_poll_interval_on_idle_channel() {
        let (tx, rx) = unbounded();
        let timeout = Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS);
        assert!(matches!(rx.dequeue(timeout), Dequeue::Empty));
        // still usable after an empty poll
        tx.info("later");
        assert!(matches!(rx.dequeue(timeout), Dequeue::Message(_)));
    }

    #[test]
    fn test_dequeue_returns_message() {
        let (tx, rx) = unbounded();
        tx.error("oops");
        match rx.dequeue(Duration::from_secs(5)) {
            Dequeue::Message(m) => assert_eq!(m.text(), "oops"),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn test_closed_only_after_queue_drained() {
        let (tx, rx) = unbounded();
        tx.info("last words");
        drop(tx);

        assert!(matches!(rx.dequeue(Duration::from_millis(10)), Dequeue::Message(_)));
        assert!(matches!(rx.dequeue(Duration::from_millis(10)), Dequeue::Closed));
    }

    #[test]
    fn test_enqueue_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = unbounded();
        drop(rx);
        tx.fatal("nobody listening");
    }

    #[test]
    fn test_cloned_senders_share_queue() {
        let (tx, rx) = unbounded();
        let other = tx.clone();
        tx.info("a");
        other.info("b");
        assert_eq!(rx.len(), 2);
        assert_eq!(texts(&rx), vec!["a", "b"]);
        assert!(rx.is_empty());
    }
}
