pub use super::auth_tokens::Entity as AuthTokens;
pub use super::user_data::Entity as UserData;
pub use super::users::Entity as Users;
