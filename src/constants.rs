pub mod auth {

    /// Message returned for every gate rejection.
    pub const UNAUTHENTICATED: &str = "unauthenticated";

    pub const WRONG_CREDENTIALS: &str = "wrong username or password";

    pub const USERNAME_TAKEN: &str = "user already exists";
}

pub mod vault {

    pub const DATA_NOT_FOUND: &str = "this data does not exist";
}

pub mod limits {

    pub const MAX_USERNAME_LEN: usize = 128;

    pub const MAX_DATA_NAME_LEN: usize = 255;

    /// Upper bound for a stored blob, before base64 encoding.
    pub const MAX_DATA_BYTES: usize = 1024 * 1024;

    /// Ten years. Expiry timestamps must stay within four-digit years so
    /// SQLite's text comparison orders them correctly.
    pub const MAX_TOKEN_EXPIRY_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;
}

pub mod intervals {
    use std::time::Duration;

    /// How long startup waits for the database to become reachable.
    pub const DATABASE_WAIT: Duration = Duration::from_secs(10);
}
