pub mod pam;

pub use pam::{ClientError, PamClient};
