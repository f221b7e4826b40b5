//! # Request State
//!
//! The observable state of one API call.
//!
//! ```text
//! RequestState<T, E>
//! ├── data: Option<T>                  // last successful payload
//! ├── loading: bool                    // a call is in flight
//! └── error: Option<RequestError<E>>   // last failure
//! ```
//!
//! Once a call settles exactly one of `data` / `error` is `Some`. Before the
//! first call, and after `reset()`, both are `None`. While a call is in
//! flight the previous `data` stays visible; only `error` is cleared.
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::fmt;
use std::sync::Arc;

use crate::api::types::ErrorInfo;

/// Why the last call failed.
#[derive(Debug)]
pub enum RequestError<E> {
    /// The call resolved with a status outside `[200, 300)`.
    Status(ErrorInfo),
    /// The call itself returned `Err`. Passed through as-is.
    Thrown(Arc<E>),
}

impl<E> RequestError<E> {
    pub fn thrown(error: E) -> Self {
        RequestError::Thrown(Arc::new(error))
    }

    /// The HTTP status, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status(info) => Some(info.status),
            RequestError::Thrown(_) => None,
        }
    }

    pub fn info(&self) -> Option<&ErrorInfo> {
        match self {
            RequestError::Status(info) => Some(info),
            RequestError::Thrown(_) => None,
        }
    }

    pub fn as_thrown(&self) -> Option<&E> {
        match self {
            RequestError::Thrown(e) => Some(e.as_ref()),
            RequestError::Status(_) => None,
        }
    }
}

impl<E> Clone for RequestError<E> {
    fn clone(&self) -> Self {
        match self {
            RequestError::Status(info) => RequestError::Status(info.clone()),
            RequestError::Thrown(e) => RequestError::Thrown(Arc::clone(e)),
        }
    }
}

impl<E: PartialEq> PartialEq for RequestError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RequestError::Status(a), RequestError::Status(b)) => a == b,
            (RequestError::Thrown(a), RequestError::Thrown(b)) => a == b,
            _ => false,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RequestError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Status(info) => write!(f, "{info}"),
            RequestError::Thrown(e) => write!(f, "{e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RequestError<E> {}

#[derive(Debug)]
pub struct RequestState<T, E> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<RequestError<E>>,
}

impl<T, E> RequestState<T, E> {
    /// `{data: None, loading: false, error: None}`
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.data.is_none() && !self.loading && self.error.is_none()
    }
}

impl<T, E> Default for RequestState<T, E> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T: Clone, E> Clone for RequestState<T, E> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T: PartialEq, E: PartialEq> PartialEq for RequestState<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.loading == other.loading && self.error == other.error
    }
}
