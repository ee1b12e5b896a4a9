//! Provider-specific adapter implementations.

pub mod google;
pub mod zalo;
