pub mod error;
pub mod v2;

use crate::model::{Page, Post, UserId};
use async_trait::async_trait;
use error::FetchError;
use serde::{Deserialize, Serialize};

/// Largest page the user timeline endpoint will return
pub const PAGE_SIZE: u32 = 100;

#[derive(Deserialize)]
pub struct Authentication {
    pub bearer_token: String,
}

#[async_trait]
pub trait TwitterClient {
    async fn get_id_for_username(&self, username: &str) -> Result<UserId, FetchError>;

    async fn get_posts_page(
        &self,
        user_id: &UserId,
        query: &TimelineQuery<'_>,
    ) -> Result<Page, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineOptions {
    pub exclude_retweets: bool,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            exclude_retweets: true,
        }
    }
}

/// Query parameters for a single timeline request, built fresh for every page
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TimelineQuery<'a> {
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_token: Option<&'a str>,
}

impl<'a> TimelineQuery<'a> {
    pub fn new(options: &TimelineOptions, pagination_token: Option<&'a str>) -> Self {
        Self {
            max_results: PAGE_SIZE,
            exclude: options.exclude_retweets.then(|| "retweets"),
            pagination_token,
        }
    }
}

/// Result of walking a timeline until it runs out or a request fails
#[derive(Debug)]
pub enum FetchOutcome {
    Complete {
        posts: Vec<Post>,
    },
    /// `pages` successful pages were fetched before `error`
    Interrupted {
        posts: Vec<Post>,
        pages: usize,
        error: FetchError,
    },
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, FetchOutcome::Complete { .. })
    }

    /// A failure on the first page is fatal, later failures keep what was already fetched
    pub fn into_posts(self) -> Result<Vec<Post>, FetchError> {
        match self {
            FetchOutcome::Complete { posts } => Ok(posts),
            FetchOutcome::Interrupted { pages: 0, error, .. } => Err(error),
            FetchOutcome::Interrupted {
                posts,
                pages,
                error,
            } => {
                log::warn!(
                    "Stopped after {} page(s), keeping {} posts:\n{}",
                    pages,
                    posts.len(),
                    error
                );
                Ok(posts)
            }
        }
    }
}

// https://developer.twitter.com/en/docs/twitter-api/tweets/timelines/api-reference/get-users-id-tweets
pub async fn fetch_all_posts(
    twitter: &(dyn TwitterClient + '_),
    user_id: &UserId,
    options: &TimelineOptions,
) -> FetchOutcome {
    let mut posts = Vec::new();
    let mut pages = 0;
    let mut next_token: Option<String> = None;
    loop {
        if let Some(token) = &next_token {
            log::info!("Fetching more posts {} ({})...", pages, token);
        }
        let query = TimelineQuery::new(options, next_token.as_deref());
        let mut page = match twitter.get_posts_page(user_id, &query).await {
            Ok(page) => page,
            Err(error) => {
                return FetchOutcome::Interrupted {
                    posts,
                    pages,
                    error,
                }
            }
        };
        if pages == 0 {
            log::info!("Fetched {} posts", page.posts.len());
        } else {
            log::info!("fetched {} more!", page.posts.len());
        }
        pages += 1;
        posts.append(&mut page.posts);
        // An empty token ends the timeline just like a missing one
        match page.next_token.filter(|token| !token.is_empty()) {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }
    FetchOutcome::Complete { posts }
}
