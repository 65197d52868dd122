pub mod prelude;

pub mod auth_tokens;
pub mod user_data;
pub mod users;
