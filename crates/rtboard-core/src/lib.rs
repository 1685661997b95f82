//! Core types and trait definitions for rtboard.
//!
//! This crate is deliberately free of HTTP, filesystem and database
//! dependencies. It owns the submission model, the thread/reply graph and its
//! backlink rules, identifier derivation, the object-store abstraction and the
//! construction of outbound events. Every other crate depends on it.

pub mod error;
pub mod event;
pub mod id;
pub mod post;
pub mod store;
pub mod submission;
pub mod tagging;

pub use error::{Error, Result};
