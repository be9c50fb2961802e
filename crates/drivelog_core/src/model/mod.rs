//! Journal and persona domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own the validation schemas every boundary input passes through.
//!
//! # Invariants
//! - Projections are derived from one canonical schema, never maintained
//!   by hand.
//! - Validation is pure and never logs.

pub mod journal;
pub mod persona;
pub mod place;
pub mod schema;
pub mod validation;
