use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::common::{ApiError, Result};

use super::key::QueryKey;
use super::policy::CachePolicy;
use super::store::QueryClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Disabled: the query is missing the parameter it needs.
    Idle,
    /// No data yet.
    Pending,
    Success,
    Error,
}

/// What a view renders for one query.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub error: Option<ApiError>,
    pub is_fetching: bool,
    pub is_stale: bool,
    /// `data` belongs to the previous parameters while the current ones load.
    pub is_placeholder: bool,
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            status: self.status,
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            is_placeholder: self.is_placeholder,
        }
    }
}

impl<T> QueryState<T> {
    pub fn idle() -> Self {
        Self::with_status(QueryStatus::Idle)
    }

    pub fn pending() -> Self {
        Self::with_status(QueryStatus::Pending)
    }

    fn with_status(status: QueryStatus) -> Self {
        Self {
            data: None,
            status,
            error: None,
            is_fetching: false,
            is_stale: true,
            is_placeholder: false,
        }
    }

    /// First load in progress with nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.is_fetching && self.data.is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_enabled(&self) -> bool {
        self.status != QueryStatus::Idle
    }

    /// The data, or the error that prevented it.
    pub fn into_result(self) -> Result<Arc<T>> {
        if self.status == QueryStatus::Error {
            return Err(self
                .error
                .unwrap_or_else(|| ApiError::backend(None, "query failed")));
        }
        self.data
            .ok_or_else(|| ApiError::precondition("query has no parameters to load"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `None` uses the client's policy for the family of the bound key.
    pub policy: Option<CachePolicy>,
    /// Keep showing the last parameters' data until the new ones resolve.
    pub keep_previous_data: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn keep_previous_data(mut self) -> Self {
        self.keep_previous_data = true;
        self
    }
}

type Fetch<P, T> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<T>> + Send + Sync>;

struct Binding<P> {
    params: P,
    key: Option<QueryKey>,
    previous: Option<QueryKey>,
}

/// A read bound to parameters. The key is derived from the parameters; when
/// no key can be derived (id `0`, no date) the query stays idle and never
/// reaches the network. Changing the parameters moves the query to the new
/// key and loads it.
pub struct Query<P, T> {
    client: QueryClient,
    options: QueryOptions,
    key_of: fn(&P) -> Option<QueryKey>,
    fetch: Fetch<P, T>,
    binding: Mutex<Binding<P>>,
}

impl<P, T> Query<P, T>
where
    P: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub fn new<F>(
        client: QueryClient,
        options: QueryOptions,
        params: P,
        key_of: fn(&P) -> Option<QueryKey>,
        fetch: F,
    ) -> Self
    where
        F: Fn(P) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        let key = key_of(&params);
        if let Some(key) = &key {
            client.observe(key);
        }
        Self {
            client,
            options,
            key_of,
            fetch: Arc::new(fetch),
            binding: Mutex::new(Binding {
                params,
                key,
                previous: None,
            }),
        }
    }

    /// Overrides the family policy for this query only.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.options.policy = Some(policy);
        self
    }

    pub fn key(&self) -> Option<QueryKey> {
        self.binding.lock().key.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.binding.lock().key.is_some()
    }

    /// Rebinds the query and, when that moved it to another key, starts
    /// loading the new key in the background so `state()` catches up without
    /// an explicit fetch. Returns whether the cache key changed.
    pub fn set_params(&self, params: P) -> bool {
        let next = (self.key_of)(&params);
        let mut binding = self.binding.lock();
        binding.params = params;
        if binding.key == next {
            return false;
        }

        let old = std::mem::replace(&mut binding.key, next.clone());
        if let Some(old) = &old {
            self.client.unobserve(old);
        }
        if let Some(next) = &next {
            self.client.observe(next);
        }

        binding.previous = if self.options.keep_previous_data {
            match old {
                Some(old) if self.client.get_query_data::<T>(&old).is_some() => Some(old),
                // Still loading the first parameters: keep their predecessor.
                _ => binding.previous.take(),
            }
        } else {
            None
        };

        if let Some(next) = next {
            let policy = self.policy_for(&next);
            let fetch = self.fetch.clone();
            let params = binding.params.clone();
            self.client.prefetch_query(next, policy, move || fetch(params.clone()));
        }
        true
    }

    fn policy_for(&self, key: &QueryKey) -> CachePolicy {
        self.options
            .policy
            .unwrap_or_else(|| self.client.policy_for(key.family()))
    }

    /// Rebinds and waits for the new key to load.
    pub async fn rebind(&self, params: P) -> QueryState<T> {
        if self.set_params(params) {
            self.fetch().await
        } else {
            self.state()
        }
    }

    /// Serves fresh cached data or fetches; errors end up in the state.
    pub async fn fetch(&self) -> QueryState<T> {
        self.load(false).await
    }

    /// Fetches even if the cached data is still fresh.
    pub async fn refetch(&self) -> QueryState<T> {
        self.load(true).await
    }

    async fn load(&self, force: bool) -> QueryState<T> {
        let (params, key) = {
            let binding = self.binding.lock();
            (binding.params.clone(), binding.key.clone())
        };
        let Some(key) = key else {
            return QueryState::idle();
        };

        let policy = self.policy_for(&key);
        let fetch = self.fetch.clone();
        let fetcher = move || fetch(params.clone());
        let result = if force {
            self.client
                .refetch_query(key.clone(), policy, fetcher)
                .await
        } else {
            self.client.fetch_query(key.clone(), policy, fetcher).await
        };
        if let Err(err) = &result {
            log::debug!("query {key} failed: {err}");
        }

        {
            let mut binding = self.binding.lock();
            if binding.key.as_ref() == Some(&key) {
                binding.previous = None;
            }
        }
        self.state()
    }

    pub fn state(&self) -> QueryState<T> {
        let binding = self.binding.lock();
        let Some(key) = &binding.key else {
            return QueryState::idle();
        };

        let mut state = self.client.state::<T>(key);
        if state.data.is_none() {
            if let Some(previous) = &binding.previous {
                if let Some(data) = self.client.get_query_data::<T>(previous) {
                    state.data = Some(data);
                    state.is_placeholder = true;
                }
            }
        }
        state
    }
}

impl<P, T> Drop for Query<P, T> {
    fn drop(&mut self) {
        if let Some(key) = &self.binding.get_mut().key {
            self.client.unobserve(key);
        }
    }
}
