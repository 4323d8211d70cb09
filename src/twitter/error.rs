use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Username must not be empty")]
    InvalidUsername,
    #[error("Unable to resolve user {username} ({status}):\n{body}")]
    Resolution {
        username: String,
        status: u16,
        body: String,
    },
    #[error("Response was not successful: {status}\n{body}")]
    BadResponse { status: u16, body: String },
    #[error("Error performing HTTP request: {0}")]
    Request(
        #[source]
        #[from]
        reqwest::Error,
    ),
    #[error("Unable to deserialize due to: {reason}\nContents:\n{contents}")]
    Deserialize { reason: String, contents: String },
    #[error("Post {id} has no text")]
    MissingField { id: String },
}
