use std::sync::Arc;

use tokio::sync::RwLock;

/// Holder for the current authenticated client.
///
/// Readers take a cheap `Arc` clone and use it for one refresh; the scheduler
/// is the only writer. A swap replaces the whole `Arc`, so a reader sees
/// either the old client or the new one.
#[derive(Debug)]
pub struct ClientSlot<C> {
    current: RwLock<Arc<C>>,
}

impl<C> ClientSlot<C> {
    pub fn new(client: C) -> Self {
        Self { current: RwLock::new(Arc::new(client)) }
    }

    pub async fn current(&self) -> Arc<C> {
        Arc::clone(&*self.current.read().await)
    }

    /// Install `client`, returning the one it replaced.
    pub async fn swap(&self, client: Arc<C>) -> Arc<C> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, client)
    }
}
