//! Core types, trait definitions and services for InternHub.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage, identity, object storage and mail are reached through traits;
//! the other crates implement or consume them.

// We intentionally use `impl Future` return types in traits (stabilised in
// Rust 1.75). Suppress the advisory lint about `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod application;
pub mod error;
pub mod guard;
pub mod identity;
pub mod mail;
pub mod objects;
pub mod password;
pub mod patch;
pub mod project;
pub mod resume;
pub mod service;
pub mod store;

pub use error::{Error, FieldError, Result};
