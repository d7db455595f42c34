//! Live client-side mirror of the dependency engine.
//!
//! [`FormRegistry`] holds the forms currently open in an interactive
//! session and re-applies dependencies as field values change, without a
//! round trip to the server. The mirror deliberately diverges from the
//! server engine in two ways:
//!
//! - a write to a target field does NOT re-trigger dependencies sourced
//!   from that field (single-hop propagation; the authoritative multi-hop
//!   result comes from the server on save), and
//! - a failed or unresolved lookup leaves the target untouched instead of
//!   passing the source value through, because a half-resolved value in a
//!   visible input is worse than a stale one.

pub mod registry;

pub use registry::{FormRegistry, LiveError, LiveField, LiveForm};
