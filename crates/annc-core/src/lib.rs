//! Core domain + application logic for the announcement bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the document
//! store live behind ports (traits) implemented in adapter crates or in
//! `store`.

pub mod announcement;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod menu;
pub mod messaging;
pub mod notify;
pub mod security;
pub mod store;
pub mod webapp;

pub use errors::{Error, Result};
