use crate::model::{Page, Post, UserId};
use crate::twitter::error::FetchError;
use crate::twitter::{Authentication, TimelineQuery, TwitterClient};
use anyhow::ensure;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const TIMEOUT_SEC: u64 = 10;

pub const DEFAULT_API_URL: &str = "https://api.twitter.com/2/";

#[derive(Clone)]
pub struct TwitterClientV2 {
    client: Client,
    api: Url,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TwitterResponse<T> {
    Ok(T),
    // Detect the case where the API returns 200, but contains errors
    #[allow(unused)]
    Error { errors: serde_json::Value },
}

#[derive(Deserialize)]
struct ByUsernameResponse {
    data: ByUsernameData,
}

#[derive(Deserialize)]
struct ByUsernameData {
    id: UserId,
}

#[derive(Deserialize)]
struct GetPostsResponse {
    // Absent when the user has no posts in range
    #[serde(default)]
    data: Vec<Post>,
    meta: GetPostsMeta,
}

#[derive(Deserialize)]
struct GetPostsMeta {
    next_token: Option<String>,
}

async fn deserialize_response<T: DeserializeOwned>(
    response: Response,
) -> Result<(StatusCode, T), FetchError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(FetchError::BadResponse {
            status: status.as_u16(),
            body: text,
        });
    }
    let twitter = match serde_json::from_str::<TwitterResponse<T>>(&text) {
        Ok(ok) => ok,
        Err(e) => {
            let contents = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|pretty| serde_json::to_string_pretty(&pretty).ok())
                .unwrap_or(text);
            return Err(FetchError::Deserialize {
                reason: e.to_string(),
                contents,
            });
        }
    };
    match twitter {
        TwitterResponse::Ok(ok) => Ok((status, ok)),
        TwitterResponse::Error { .. } => Err(FetchError::BadResponse {
            status: status.as_u16(),
            body: text,
        }),
    }
}

impl TwitterClientV2 {
    pub fn with_api_url(auth: &Authentication, api: Url) -> anyhow::Result<Self> {
        ensure!(!api.cannot_be_a_base(), "Not a usable API url: {api}");
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {}", auth.bearer_token);
        let mut value = HeaderValue::from_str(&value)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(Self {
            client: Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(TIMEOUT_SEC))
                .build()?,
            api,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api.clone();
        // Checked in `with_api_url`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl TwitterClient for TwitterClientV2 {
    async fn get_id_for_username(&self, username: &str) -> Result<UserId, FetchError> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Err(FetchError::InvalidUsername);
        }
        let url = self.endpoint(&["users", "by", "username", username]);
        let response = self.client.get(url).send().await?;
        match deserialize_response::<ByUsernameResponse>(response).await {
            Ok((_, response)) => Ok(response.data.id),
            Err(FetchError::BadResponse { status, body }) => Err(FetchError::Resolution {
                username: username.to_string(),
                status,
                body,
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_posts_page(
        &self,
        user_id: &UserId,
        query: &TimelineQuery<'_>,
    ) -> Result<Page, FetchError> {
        let url = self.endpoint(&["users", user_id.0.as_str(), "tweets"]);
        let response = self.client.get(url).query(query).send().await?;
        let (status, response) = deserialize_response::<GetPostsResponse>(response).await?;
        log::debug!(
            "{} returned {} posts (next: {:?})",
            status,
            response.data.len(),
            response.meta.next_token
        );
        Ok(Page {
            posts: response.data,
            next_token: response.meta.next_token,
        })
    }
}
