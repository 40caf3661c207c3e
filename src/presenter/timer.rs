//! Auto-dismiss timers
//!
//! Each visible notification owns one scheduled hide, cancelled through its
//! own [`CancellationToken`]. Arming a category cancels whatever was armed
//! before, and the hide itself is epoch-guarded, so a timer that loses the
//! race still cannot clear a newer notification.

use std::collections::HashMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::NotificationStore;
use crate::types::Category;

pub struct DismissTimers {
    store: NotificationStore,
    timeout: Duration,
    tokens: HashMap<Category, CancellationToken>,
}

impl DismissTimers {
    pub fn new(store: NotificationStore, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            tokens: HashMap::new(),
        }
    }

    /// Schedule a hide of `category` at `epoch`, replacing any pending one
    pub fn arm(&mut self, category: Category, epoch: u64) {
        self.cancel(category);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(category = %category, "No runtime, auto-dismiss disabled");
                return;
            }
        };

        let token = CancellationToken::new();
        let task_token = token.clone();
        let store = self.store.clone();
        let timeout = self.timeout;

        runtime.spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    if store.hide_if_current(category, epoch) {
                        debug!(category = %category, epoch, "Auto-dismissed notification");
                    }
                    // Marks the timer as spent for is_armed()
                    task_token.cancel();
                }
            }
        });

        self.tokens.insert(category, token);
    }

    /// Cancel a pending hide; true if one was still waiting
    pub fn cancel(&mut self, category: Category) -> bool {
        match self.tokens.remove(&category) {
            Some(token) => {
                let was_armed = !token.is_cancelled();
                token.cancel();
                was_armed
            }
            None => false,
        }
    }

    pub fn is_armed(&self, category: Category) -> bool {
        self.tokens
            .get(&category)
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    pub fn cancel_all(&mut self) {
        for (_, token) in self.tokens.drain() {
            token.cancel();
        }
    }
}

impl Drop for DismissTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actor, ChatAssignedData, Notification};
    use chrono::Utc;

    fn chat(id: &str) -> Notification {
        Notification::ChatAssigned(ChatAssignedData {
            customer_id: id.to_string(),
            customer_name: "Acme".to_string(),
            assigned_by: Actor::new("u2", "Jane"),
            assigned_to: None,
            timestamp: Utc::now(),
        })
    }

    /// Let spawned timer tasks observe the advanced clock
    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hides_after_timeout_not_before() {
        let store = NotificationStore::new();
        let mut timers = DismissTimers::new(store.clone(), Duration::from_secs(30));

        let epoch = store.show(chat("c1"));
        timers.arm(Category::ChatAssigned, epoch);
        settle().await;

        tokio::time::advance(Duration::from_secs(29)).await;
        settle().await;
        assert!(store.is_visible(Category::ChatAssigned));
        assert!(timers.is_armed(Category::ChatAssigned));

        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(!store.is_visible(Category::ChatAssigned));
        assert!(!timers.is_armed(Category::ChatAssigned));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_does_not_fire() {
        let store = NotificationStore::new();
        let mut timers = DismissTimers::new(store.clone(), Duration::from_secs(30));

        let epoch = store.show(chat("c1"));
        timers.arm(Category::ChatAssigned, epoch);
        assert!(timers.cancel(Category::ChatAssigned));
        assert!(!timers.cancel(Category::ChatAssigned));

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert!(store.is_visible(Category::ChatAssigned));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_window() {
        let store = NotificationStore::new();
        let mut timers = DismissTimers::new(store.clone(), Duration::from_secs(30));

        let first = store.show(chat("c1"));
        timers.arm(Category::ChatAssigned, first);
        settle().await;
        tokio::time::advance(Duration::from_secs(20)).await;
        settle().await;

        let second = store.show(chat("c2"));
        timers.arm(Category::ChatAssigned, second);
        settle().await;
        tokio::time::advance(Duration::from_secs(20)).await;
        settle().await;
        // 40s since the first show, 20s since the second
        assert!(store.is_visible(Category::ChatAssigned));

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert!(!store.is_visible(Category::ChatAssigned));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_epoch_never_hides_newer() {
        let store = NotificationStore::new();
        let mut timers = DismissTimers::new(store.clone(), Duration::from_secs(30));

        let first = store.show(chat("c1"));
        timers.arm(Category::ChatAssigned, first);
        settle().await;

        // Superseded without re-arming: the old timer still fires but is ignored
        store.show(chat("c2"));
        tokio::time::advance(Duration::from_secs(31)).await;
        settle().await;
        assert!(store.is_visible(Category::ChatAssigned));
    }
}
