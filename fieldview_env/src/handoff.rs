//! Last-value-wins snapshot hand-off between execution contexts.
//!
//! When ticks run in a worker context, the only thing allowed to cross the
//! boundary is a whole, immutable, `Arc`-shared value. Readers always see the
//! last complete publication; intermediate publications they missed are simply
//! skipped.

use crate::error::EnvError;
use std::sync::Arc;
use tokio::sync::watch;

/// Creates a hand-off seeded with an initial value.
pub fn channel<T>(initial: Arc<T>) -> (Publisher<T>, Subscriber<T>) {
    let (tx, rx) = watch::channel(initial);
    (Publisher { tx }, Subscriber { rx })
}

/// Writing side of a hand-off.
#[derive(Debug)]
pub struct Publisher<T> {
    tx: watch::Sender<Arc<T>>,
}

impl<T> Publisher<T> {
    /// Replaces the published value. Never blocks, never fails.
    pub fn publish(&self, value: Arc<T>) {
        self.tx.send_replace(value);
    }

    /// Returns the currently published value.
    pub fn latest(&self) -> Arc<T> {
        Arc::clone(&self.tx.borrow())
    }

    /// Opens another reader.
    pub fn subscribe(&self) -> Subscriber<T> {
        Subscriber {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reading side of a hand-off.
#[derive(Debug)]
pub struct Subscriber<T> {
    rx: watch::Receiver<Arc<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> Subscriber<T> {
    /// Returns the last complete publication.
    pub fn latest(&self) -> Arc<T> {
        Arc::clone(&self.rx.borrow())
    }

    /// Returns true if something was published since the last `changed`.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for the next publication and returns it.
    pub async fn changed(&mut self) -> Result<Arc<T>, EnvError> {
        self.rx.changed().await.map_err(|_| EnvError::HandoffClosed)?;
        Ok(Arc::clone(&self.rx.borrow_and_update()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_value_wins() {
        let (publisher, subscriber) = channel(Arc::new(0u32));
        publisher.publish(Arc::new(1));
        publisher.publish(Arc::new(2));

        assert_eq!(*subscriber.latest(), 2);
        assert!(subscriber.has_changed());
    }

    #[tokio::test]
    async fn test_changed_wakes_reader() {
        let (publisher, mut subscriber) = channel(Arc::new(String::from("a")));
        let reader = tokio::spawn(async move { subscriber.changed().await });

        publisher.publish(Arc::new(String::from("b")));
        let value = reader.await.unwrap().unwrap();
        assert_eq!(value.as_str(), "b");
    }

    #[tokio::test]
    async fn test_closed_when_publisher_dropped() {
        let (publisher, mut subscriber) = channel(Arc::new(5u8));
        drop(publisher);
        assert!(matches!(
            subscriber.changed().await,
            Err(EnvError::HandoffClosed)
        ));
    }
}
