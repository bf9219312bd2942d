//! # API Route Modules
//!
//! Each module owns one slice of the surface and exposes a `router()`:
//!
//! - [`vibes`] — public mint lifecycle and vibe pages
//! - [`claims`] — session-guarded claim lifecycle

pub mod claims;
pub mod vibes;
