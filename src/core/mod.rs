//! # Core Application Logic
//!
//! Request state and session handling for the Trailguide client.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • RequestState         │
//!                    │  • RequestAction        │
//!                    │  • update() (reducer)   │
//!                    │  • SessionStore         │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    CLI     │      │   Mobile   │      │    API     │
//!     │  (clap)    │      │  (future)  │      │ (reqwest)  │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `RequestState`, the `{data, loading, error}` of one call
//! - [`action`]: `RequestAction` and the `update()` reducer
//! - [`executor`]: `RequestExecutor`, which runs a call and drives the reducer
//! - [`session`]: named accessors for the stored session
//! - [`auth`]: login / refresh / logout flows
//! - [`config`]: layered configuration

pub mod action;
pub mod auth;
pub mod config;
pub mod executor;
pub mod session;
pub mod state;

pub use executor::RequestExecutor;
pub use state::{RequestError, RequestState};
