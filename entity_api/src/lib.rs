pub use entity::oauth_states;

pub mod error;
pub mod oauth_state;
