//! # Actions
//!
//! Everything that can happen to a request becomes a `RequestAction`.
//! Call starts? That's `RequestAction::Started`.
//! Backend answers 404? That's `RequestAction::Failed(RequestError::Status(..))`.
//!
//! The `update()` function applies an action to the state. No side effects
//! here. I/O happens in the executor.
//!
//! ```text
//! State + Action  →  update()  →  New State
//! ```

use crate::api::types::{ApiResponse, ErrorInfo};
use crate::core::state::{RequestError, RequestState};

/// Message used when a failed response carries none of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// Message used when a 2xx response carries no payload.
pub const MISSING_DATA_MESSAGE: &str = "Response contained no data";

#[derive(Debug)]
pub enum RequestAction<T, E> {
    Started,
    Succeeded(T),
    Failed(RequestError<E>),
    /// The call was dropped before it settled. Nothing else changes.
    Cancelled,
    Reset,
}

impl<T, E> RequestAction<T, E> {
    /// Classifies what the API function returned.
    ///
    /// - `Ok` with a 2xx status and data → `Succeeded`
    /// - `Ok` with any other status → `Failed(Status)` with the response's
    ///   message, or [`DEFAULT_FAILURE_MESSAGE`]
    /// - `Err(e)` → `Failed(Thrown(e))`, untouched
    pub fn from_outcome(outcome: Result<ApiResponse<T>, E>) -> Self {
        let response = match outcome {
            Ok(response) => response,
            Err(e) => return RequestAction::Failed(RequestError::thrown(e)),
        };

        if response.is_success() {
            return match response.data {
                Some(data) => RequestAction::Succeeded(data),
                None => RequestAction::Failed(RequestError::Status(ErrorInfo {
                    message: response
                        .message
                        .unwrap_or_else(|| MISSING_DATA_MESSAGE.to_string()),
                    status: response.status,
                    errors: response.errors,
                    code: response.code,
                })),
            };
        }

        RequestAction::Failed(RequestError::Status(ErrorInfo {
            message: response
                .message
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            status: response.status,
            errors: response.errors,
            code: response.code,
        }))
    }
}

/// Applies `action` to `state`.
pub fn update<T, E>(state: &mut RequestState<T, E>, action: RequestAction<T, E>) {
    match action {
        // Previous data stays visible while the next call is in flight.
        RequestAction::Started => {
            state.loading = true;
            state.error = None;
        }
        RequestAction::Succeeded(data) => {
            state.data = Some(data);
            state.error = None;
            state.loading = false;
        }
        RequestAction::Failed(error) => {
            state.data = None;
            state.error = Some(error);
            state.loading = false;
        }
        RequestAction::Cancelled => {
            state.loading = false;
        }
        RequestAction::Reset => {
            *state = RequestState::idle();
        }
    }
}
