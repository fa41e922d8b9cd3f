//! gaugepair - a strict, deterministic companion-pair engine for paired
//! inspection gauges
//!
//! A GO gauge and its NO GO twin travel, check out, and retire together.
//! This crate keeps that relationship honest: it maintains the
//! bidirectional companion reference between two independently stored
//! records under concurrent mutation, enforces the pairing invariants
//! before any write, cascades status and location changes atomically
//! across both members, derives pair-level status on demand without ever
//! persisting it, and appends every relationship change to an immutable
//! history log.

pub mod config;
pub mod gauge;
pub mod history;
pub mod idents;
pub mod observability;
pub mod pair;
pub mod service;
pub mod store;
