//! Fixed-latency delivery queue used to simulate network delay.
//!
//! Each item is stamped with `now + delay` when it is sent and handed out by
//! the receiver no earlier than that instant. Sending never blocks; the
//! receiving side decides at delivery time whether the destination is still
//! alive. Dropping the receiver discards everything still in flight.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

pub fn delay_line<T>(delay: Duration) -> (DelayedSender<T>, DelayedReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DelayedSender { tx, delay },
        DelayedReceiver { rx, pending: None },
    )
}

#[derive(Debug)]
pub struct DelayedSender<T> {
    tx: mpsc::UnboundedSender<(Instant, T)>,
    delay: Duration,
}

impl<T> Clone for DelayedSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            delay: self.delay,
        }
    }
}

impl<T> DelayedSender<T> {
    /// Schedules `item` for delivery after the configured delay. Returns
    /// false if the receiving side is gone.
    pub fn send(&self, item: T) -> bool {
        self.tx.send((Instant::now() + self.delay, item)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[derive(Debug)]
pub struct DelayedReceiver<T> {
    rx: mpsc::UnboundedReceiver<(Instant, T)>,
    pending: Option<(Instant, T)>,
}

impl<T> DelayedReceiver<T> {
    /// Waits for the next item to come due. Returns `None` once every sender
    /// is dropped and nothing is left in flight.
    ///
    /// Cancel safe: an item already pulled off the channel is kept until the
    /// next call, so this can sit in a `tokio::select!` next to other branches.
    pub async fn recv(&mut self) -> Option<T> {
        if self.pending.is_none() {
            self.pending = Some(self.rx.recv().await?);
        }

        if let Some((due, _)) = &self.pending {
            sleep_until(*due).await;
        }

        self.pending.take().map(|(_, item)| item)
    }

    pub fn close(&mut self) {
        self.rx.close();
    }
}
