//! Constants for the veriframe-login crate.

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Storage key for the serialized user profile.
pub const USER_DATA_KEY: &str = "user_data";
