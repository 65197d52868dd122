pub mod data;
pub mod token;
pub mod user;
