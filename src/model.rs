use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric Twitter id, kept in the decimal string form the API returns it in
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    // Optional so a post without text surfaces as `FetchError::MissingField`
    // during extraction rather than failing the whole page
    #[serde(default)]
    pub text: Option<String>,
}

/// One page of a user's timeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub posts: Vec<Post>,
    pub next_token: Option<String>,
}
