//! hookledger: outbound webhook dispatcher
//!
//! A library for delivering JSON payloads to webhook endpoints with
//! exponential backoff and jitter, keeping an auditable history of every
//! dispatch.

pub mod config;
pub mod history;
pub mod time;
pub mod trigger;
pub mod webhook;
