//! Implements a client for the blacktri.com A/B testing API
//!
//! Accounts, projects, decision groups, decisions, goals, personalization
//! rules, their conditions and trend statistics are exposed as plain
//! async methods on [`Client`]. List methods accept an optional filter of
//! `&` separated `key=value` pairs, see [`Filter`].
//!
//! To change the default request timeout set the BLACKTRI_TIMEOUT_MS
//! environment variable to the desired timeout value.
//!
//! Reference: https://www.blacktri.com/api/v1/
mod client;
mod filter;
mod http;
mod path;

pub mod models;
pub use crate::client::Client;
pub use crate::filter::Filter;
pub use crate::path::encode_filter;
