//! Watches social search results for a transit line and texts subscribers
//! when a large share of recent posts talk about delays.

pub mod change;
pub mod config;
pub mod decision;
pub mod delay_log;
pub mod error;
pub mod feeds;
pub mod filters;
pub mod notify;
pub mod poller;
pub mod post;

pub use error::{DelayError, Result};
