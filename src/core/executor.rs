//! # Request Executor
//!
//! Wraps one asynchronous API function and exposes its progress as a
//! [`RequestState`] that callers can read or subscribe to.
//!
//! ```text
//! execute(args) ──► Started ──► call(args).await ──► Succeeded / Failed
//! reset()       ──► Reset
//! ```
//!
//! Calls are not coordinated. Two overlapping `execute` calls both write
//! their outcome and the last one to finish wins. `reset()` does not cancel
//! an in-flight call, so a late response still lands after it.
//!
//! Dropping an `execute` future before its call finishes (a timeout, a
//! losing `select!` branch) dispatches `Cancelled`, which clears `loading`
//! and leaves `data` and `error` as they were.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, warn};
use tokio::sync::watch;

use crate::api::types::ApiResponse;
use crate::core::action::{RequestAction, update};
use crate::core::state::{RequestError, RequestState};

type CallFn<A, T, E> = dyn Fn(A) -> BoxFuture<'static, Result<ApiResponse<T>, E>> + Send + Sync;

pub struct RequestExecutor<A, T, E> {
    call: Arc<CallFn<A, T, E>>,
    state: watch::Sender<RequestState<T, E>>,
}

impl<A, T, E> RequestExecutor<A, T, E>
where
    A: 'static,
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Wraps `call`. State starts idle.
    pub fn new<F, Fut>(call: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse<T>, E>> + Send + 'static,
    {
        let call: Arc<CallFn<A, T, E>> = Arc::new(move |args: A| {
            Box::pin(call(args)) as BoxFuture<'static, Result<ApiResponse<T>, E>>
        });
        let (state, _) = watch::channel(RequestState::idle());
        Self { call, state }
    }

    /// Runs the call and records its outcome.
    ///
    /// Returns the data on a 2xx response, `None` otherwise. Failures are
    /// only reported through [`error`](Self::error).
    pub async fn execute(&self, args: A) -> Option<T> {
        self.dispatch(RequestAction::Started);
        let mut guard = SettleOnDrop {
            state: &self.state,
            armed: true,
        };

        let action = RequestAction::from_outcome((self.call)(args).await);
        guard.armed = false;
        let data = match &action {
            RequestAction::Succeeded(data) => Some(data.clone()),
            RequestAction::Failed(RequestError::Status(info)) => {
                warn!("Request failed: {}", info);
                None
            }
            RequestAction::Failed(RequestError::Thrown(_)) => {
                warn!("Request raised an error before producing a response");
                None
            }
            RequestAction::Started | RequestAction::Cancelled | RequestAction::Reset => None,
        };

        self.dispatch(action);
        data
    }

    /// Back to `{data: None, loading: false, error: None}`.
    pub fn reset(&self) {
        self.dispatch(RequestAction::Reset);
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<T, E> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn error(&self) -> Option<RequestError<E>> {
        self.state.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Receiver that is notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T, E>> {
        self.state.subscribe()
    }

    fn dispatch(&self, action: RequestAction<T, E>) {
        debug!("Request action: {}", action_name(&action));
        self.state.send_modify(|state| update(state, action));
    }
}

fn action_name<T, E>(action: &RequestAction<T, E>) -> &'static str {
    match action {
        RequestAction::Started => "started",
        RequestAction::Succeeded(_) => "succeeded",
        RequestAction::Failed(_) => "failed",
        RequestAction::Cancelled => "cancelled",
        RequestAction::Reset => "reset",
    }
}

/// Settles `loading` when an `execute` future is dropped mid-call.
struct SettleOnDrop<'a, T, E> {
    state: &'a watch::Sender<RequestState<T, E>>,
    armed: bool,
}

impl<T, E> Drop for SettleOnDrop<'_, T, E> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Request action: cancelled");
            self.state
                .send_modify(|state| update(state, RequestAction::Cancelled));
        }
    }
}
