use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::common::{ApiError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct MutationState<O> {
    pub status: MutationStatus,
    pub data: Option<O>,
    pub error: Option<ApiError>,
}

impl<O> Default for MutationState<O> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            data: None,
            error: None,
        }
    }
}

impl<O> MutationState<O> {
    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

type Run<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O>> + Send + Sync>;

/// A write operation plus the state a view shows for it. Cache effects live
/// inside `run` after the request succeeded, so a failed mutation leaves the
/// cache untouched and only reports the error.
pub struct Mutation<I, O> {
    name: &'static str,
    run: Run<I, O>,
    state: Mutex<MutationState<O>>,
}

impl<I, O> Mutation<I, O>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
{
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: Fn(I) -> BoxFuture<'static, Result<O>> + Send + Sync + 'static,
    {
        Self {
            name,
            run: Arc::new(run),
            state: Mutex::new(MutationState::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn mutate(&self, input: I) -> Result<O> {
        {
            let mut state = self.state.lock();
            state.status = MutationStatus::Pending;
            state.error = None;
        }

        let result = (self.run)(input).await;

        let mut state = self.state.lock();
        match &result {
            Ok(output) => {
                log::info!("{} succeeded", self.name);
                state.status = MutationStatus::Success;
                state.data = Some(output.clone());
                state.error = None;
            }
            Err(err) => {
                log::warn!("{} failed: {err}", self.name);
                state.status = MutationStatus::Error;
                state.error = Some(err.clone());
            }
        }
        result
    }

    pub fn state(&self) -> MutationState<O> {
        self.state.lock().clone()
    }

    pub fn reset(&self) {
        *self.state.lock() = MutationState::default();
    }
}
