pub use super::oauth_states::Entity as OauthStates;
