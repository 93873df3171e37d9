//! oiwatch - polling and view-state core for an option-chain dashboard
//!
//! Several independent analytics endpoints (option chain, spot price,
//! previous-day OHLC, stochastic RSI, support/resistance levels) are each
//! polled on their own cadence. Every result lands in a per-source state,
//! the states are merged into one immutable [`orchestrator::Snapshot`], and
//! the [`store::Store`] pushes each new snapshot to its subscribers.
//!
//! - [`transport`] - one HTTP GET with timeout and error classification
//! - [`source`] - endpoint definitions and payload schemas
//! - [`poller`] - per-source fetch loop and state
//! - [`orchestrator`] - poller lifecycle and snapshot aggregation
//! - [`store`] - latest snapshot and subscriptions
//! - [`api`], [`cli`] - read API and command-line front ends

pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod poller;
pub mod source;
pub mod store;
pub mod transport;
