//! Third-party identity federation over OAuth 2.0 dialects.

mod provider;
mod registry;
mod token;
mod user_data;

pub mod providers;

pub use provider::{Provider, ProviderKind};
pub use registry::Registry;
pub use token::{Token, EXPIRY_SAFETY_MARGIN_SECS};
pub use user_data::{Claims, Email, UserData};
