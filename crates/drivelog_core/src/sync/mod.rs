//! Journal sync to external devices.
//!
//! # Responsibility
//! - Define the sync target seam and its error envelope.
//! - Keep a registry of targets with one active selection.
//! - Orchestrate sync runs that stamp `synced_at`.
//!
//! # Invariants
//! - `synced_at` is only written after a target accepted the entry.

pub mod registry;
pub mod service;
pub mod target;
