//! Core types and trait definitions for the pulse ranking engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::EngagementStore`]; the HTTP layer drives
//! everything through [`engine::Engine`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cursor;
pub mod engine;
pub mod error;
pub mod feed;
pub mod item;
pub mod like;
pub mod notify;
pub mod score;
pub mod store;
pub mod thread;

pub use error::{Error, Result};
