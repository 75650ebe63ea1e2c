//! Cooperative shutdown signal.

use tokio::sync::watch;

/// Shutdown broadcast; `true` means stop.
pub type ShutdownTx = watch::Sender<bool>;
pub type ShutdownRx = watch::Receiver<bool>;

#[must_use]
pub fn channel() -> (ShutdownTx, ShutdownRx) {
    watch::channel(false)
}

/// Resolve once shutdown is requested or the sender is gone.
pub async fn signalled(rx: &mut ShutdownRx) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_resolves_on_signal() {
        let (tx, mut rx) = channel();
        let waiter = tokio::spawn(async move { signalled(&mut rx).await });
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_resolves_when_sender_dropped() {
        let (tx, mut rx) = channel();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), signalled(&mut rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pending_while_running() {
        let (_tx, mut rx) = channel();
        let result = tokio::time::timeout(Duration::from_millis(20), signalled(&mut rx)).await;
        assert!(result.is_err());
    }
}
