//! Cache key builders.
//!
//! The Redis provider adds its configured prefix on top of these.

/// Cache key for the validation entry of a raw access token.
pub fn access_token(raw: &str) -> String {
    format!("token:{raw}")
}

/// Cache keys for a set of raw access tokens.
pub fn access_tokens<'a>(raws: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raws.into_iter().map(access_token).collect()
}
