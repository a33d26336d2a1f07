use std::sync::Arc;
use tokio::sync::watch;

/// Одноразовая защёлка слота: ровно один переход "не готов" -> "готов".
/// Повторный `signal` ничего не делает.
#[derive(Debug, Clone)]
pub struct WaitToken {
    tx: Arc<watch::Sender<bool>>,
}

impl WaitToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Возвращает `true`, только если именно этот вызов перевёл токен
    pub fn signal(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    pub fn is_signaled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Ждём перехода; если он уже был, возвращаемся сразу
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // sender живёт в self, так что ошибка закрытия здесь невозможна
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for WaitToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn second_signal_is_inert() {
        let token = WaitToken::new();
        assert!(!token.is_signaled());
        assert!(token.signal());
        assert!(!token.signal());
        assert!(token.is_signaled());
    }

    #[tokio::test]
    async fn every_waiter_sees_the_transition() {
        let token = WaitToken::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let token = token.clone();
                tokio::spawn(async move { token.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        token.signal();
        token.signal();

        for w in waiters {
            timeout(Duration::from_secs(1), w)
                .await
                .expect("waiter released")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn wait_after_signal_returns_immediately() {
        let token = WaitToken::new();
        token.signal();
        timeout(Duration::from_millis(100), token.wait())
            .await
            .expect("already signaled");
    }

    #[tokio::test]
    async fn unsignaled_token_keeps_blocking() {
        let token = WaitToken::new();
        assert!(timeout(Duration::from_millis(200), token.wait()).await.is_err());
    }
}
