//! Trailing-edge debouncing.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::trace;

/// Forwards only the last item of every burst, once `window` has passed
/// without a new one.
///
/// All pushes share one timer: a burst mixing several pointer-motion types
/// still yields a single item. Dropping the debouncer flushes the pending
/// item.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debouncing task on the current tokio runtime.
    pub fn spawn(window: Duration, output: mpsc::UnboundedSender<T>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let deadline = time::sleep(window);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    item = rx.recv() => match item {
                        Some(item) => {
                            pending = Some(item);
                            deadline.as_mut().reset(Instant::now() + window);
                        }
                        None => {
                            if let Some(item) = pending.take() {
                                let _ = output.send(item);
                            }
                            break;
                        }
                    },
                    () = &mut deadline, if pending.is_some() => {
                        if let Some(item) = pending.take() {
                            trace!("Debounce window elapsed, forwarding");
                            if output.send(item).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { tx }
    }

    /// Queue `item`, replacing any item still waiting in the window.
    /// Returns `false` once the task has stopped.
    pub fn push(&self, item: T) -> bool {
        self.tx.send(item).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn test_burst_forwards_last_item() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(WINDOW, tx);

        let start = Instant::now();
        for i in 0..5 {
            assert!(debouncer.push(i));
            time::sleep(Duration::from_millis(40)).await;
        }

        assert_eq!(rx.recv().await, Some(4));
        assert!(start.elapsed() >= Duration::from_millis(160) + WINDOW);

        time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_forward_each() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(WINDOW, tx);

        debouncer.push("first");
        time::sleep(WINDOW * 2).await;
        debouncer.push("second");

        assert_eq!(rx.recv().await, Some("first"));
        assert_eq!(rx.recv().await, Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_forwarded_before_window() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(WINDOW, tx);

        debouncer.push(1);
        time::sleep(WINDOW / 2).await;
        assert!(rx.try_recv().is_err());

        time::sleep(WINDOW).await;
        assert_eq!(rx.try_recv().ok(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_flushes_pending() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::spawn(WINDOW, tx);

        debouncer.push(7);
        drop(debouncer);
        assert_eq!(rx.recv().await, Some(7));
        assert_eq!(rx.recv().await, None);
    }
}
