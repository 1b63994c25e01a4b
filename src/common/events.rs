use crate::cache::QueryKey;

/// Cache change notifications broadcast to subscribed views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Fetching(QueryKey),
    Updated(QueryKey),
    Failed(QueryKey),
    Invalidated(QueryKey),
    /// Entry dropped, either explicitly or after its retention window.
    Removed(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            CacheEvent::Fetching(key)
            | CacheEvent::Updated(key)
            | CacheEvent::Failed(key)
            | CacheEvent::Invalidated(key)
            | CacheEvent::Removed(key) => key,
        }
    }
}
