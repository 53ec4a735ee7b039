//! hallbook - API client for the hall booking administration backend
//!
//! [`ApiService`] is the single entry point: it attaches the session's bearer
//! token, serves repeated reads from an in-memory cache, retries transient
//! failures with exponential backoff, and evicts cached list views whenever a
//! write succeeds.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use api::{ApiService, ApprovalFilter, RequestOptions, Resource};
pub use cache::{InvalidationOutcome, InvalidationRules, RequestKey, ResponseCache};
pub use client::{HttpTransport, RetryPolicy, RetryingClient, Transport};
pub use config::Config;
pub use error::{ApiError, Error, Result};
pub use session::{AuthProvider, Session, SessionStore};
