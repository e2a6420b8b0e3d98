//! Core data types for the Lodestar resolution engine.
//!
//! This crate defines the fundamental types the engine operates on: source
//! and revision identifiers, timeline-ordered revisions and their declared
//! dependencies, version labels and constraints, immutable configuration
//! snapshots, engine budgets and tuning knobs, and the lock-style snapshot
//! handed to persistence.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod configuration;
pub mod constraint;
pub mod errors;
pub mod lock;
pub mod revision;
pub mod root;
pub mod source;
pub mod version;
