//! SNOO API integration.
//!
//! Provides:
//! - An authenticated client that logs in, tracks token expiry and decodes
//!   JSON responses
//! - Day-by-day fetching of aggregated sleep data over a date range

mod client;
mod error;
pub mod fetch;
mod token;

pub use client::{
    AGGREGATED_PATH, Client, ClientOptions, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, LOGIN_PATH,
    STATUS_PATH,
};
pub use error::ApiError;
pub use fetch::{DayFetchError, FetchPolicy, FetchReport, fetch_days};
pub use token::{Credentials, TokenCache, TokenSession};
