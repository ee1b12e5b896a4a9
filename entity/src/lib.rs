pub mod prelude;

pub mod oauth_states;
