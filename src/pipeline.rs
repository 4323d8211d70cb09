use crate::clean::{clean_posts, CleanOptions};
use crate::model::{Post, UserId};
use crate::persist::write_lines;
use crate::twitter::error::FetchError;
use crate::twitter::{fetch_all_posts, TimelineOptions, TwitterClient};
use anyhow::Context;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub username: String,
    pub filepath: PathBuf,
    /// Clean-up to apply before writing, `None` writes the posts as returned
    pub clean: Option<CleanOptions>,
    pub timeline: TimelineOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSummary {
    pub user_id: UserId,
    /// Posts returned by the API
    pub fetched: usize,
    /// Lines written to the output file
    pub written: usize,
    /// False when pagination stopped early on a failed request
    pub complete: bool,
}

/// Look up a user, fetch their posts and write the text to `options.filepath`, one per line
pub async fn save_posts(
    twitter: &(dyn TwitterClient + '_),
    options: &SaveOptions,
) -> anyhow::Result<SaveSummary> {
    let username = &options.username;
    log::info!("Looking up id for {}...", username);
    let user_id = twitter
        .get_id_for_username(username)
        .await
        .context("Unable to find user")?;
    log::info!("{}'s id is {}", username, user_id);

    log::info!("Fetching posts...");
    let outcome = fetch_all_posts(twitter, &user_id, &options.timeline).await;
    let complete = outcome.is_complete();
    let posts = outcome.into_posts().context("Unable to fetch posts")?;
    log::info!(
        "Found {} total for {} ({})!",
        posts.len(),
        username,
        user_id
    );
    let fetched = posts.len();

    let mut texts = post_texts(posts)?;
    if let Some(clean) = &options.clean {
        log::info!("Cleaning {} posts with {:?}", texts.len(), clean);
        texts = clean_posts(texts, clean);
    }

    write_lines(&options.filepath, &texts)
        .await
        .context("Unable to save posts")?;
    log::info!(
        "Saved {} lines to {}",
        texts.len(),
        options.filepath.display()
    );

    Ok(SaveSummary {
        user_id,
        fetched,
        written: texts.len(),
        complete,
    })
}

fn post_texts(posts: Vec<Post>) -> Result<Vec<String>, FetchError> {
    posts
        .into_iter()
        .map(|post| post.text.ok_or(FetchError::MissingField { id: post.id }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::v2::TwitterClientV2;
    use crate::twitter::Authentication;
    use reqwest::Url;
    use serde_json::json;
    use wiremock::matchers::{path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with_user() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(path("/2/users/by/username/jack"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "12" } })))
            .mount(&server)
            .await;
        server
    }

    fn client(server: &MockServer) -> TwitterClientV2 {
        let auth = Authentication {
            bearer_token: "secret".to_string(),
        };
        let api = Url::parse(&format!("{}/2", server.uri())).unwrap();
        TwitterClientV2::with_api_url(&auth, api).unwrap()
    }

    fn options(filepath: PathBuf, clean: Option<CleanOptions>) -> SaveOptions {
        SaveOptions {
            username: "jack".to_string(),
            filepath,
            clean,
            timeline: TimelineOptions::default(),
        }
    }

    #[tokio::test]
    async fn saves_cleaned_posts_across_pages() {
        let server = server_with_user().await;
        Mock::given(path("/2/users/12/tweets"))
            .and(query_param_is_missing("pagination_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "id": "1", "text": "Hello world.\n" },
                    { "id": "2", "text": "https://example.com" }
                ],
                "meta": { "next_token": "next" }
            })))
            .mount(&server)
            .await;
        Mock::given(path("/2/users/12/tweets"))
            .and(query_param("pagination_token", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "3", "text": "Great day! Nice weather." }],
                "meta": {}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("jack.txt");
        let clean = CleanOptions {
            split_sentences: true,
            remove_urls: true,
        };
        let summary = save_posts(&client(&server), &options(filepath.clone(), Some(clean)))
            .await
            .unwrap();

        assert_eq!(
            summary,
            SaveSummary {
                user_id: UserId("12".to_string()),
                fetched: 3,
                written: 3,
                complete: true,
            }
        );
        assert_eq!(
            std::fs::read_to_string(&filepath).unwrap(),
            "Hello world.\nGreat day!\nNice weather."
        );
    }

    #[tokio::test]
    async fn writes_raw_text_without_cleaning() {
        let server = server_with_user().await;
        Mock::given(path("/2/users/12/tweets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "1", "text": "one" }, { "id": "2", "text": "https://t.co/x" }],
                "meta": {}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("jack.txt");
        save_posts(&client(&server), &options(filepath.clone(), None))
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&filepath).unwrap(),
            "one\nhttps://t.co/x"
        );
    }

    #[tokio::test]
    async fn partial_timeline_is_still_written() {
        let server = server_with_user().await;
        Mock::given(path("/2/users/12/tweets"))
            .and(query_param_is_missing("pagination_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "1", "text": "kept" }],
                "meta": { "next_token": "next" }
            })))
            .mount(&server)
            .await;
        Mock::given(path("/2/users/12/tweets"))
            .and(query_param("pagination_token", "next"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("jack.txt");
        let summary = save_posts(&client(&server), &options(filepath.clone(), None))
            .await
            .unwrap();
        assert!(!summary.complete);
        assert_eq!(summary.written, 1);
        assert_eq!(std::fs::read_to_string(&filepath).unwrap(), "kept");
    }

    #[tokio::test]
    async fn failed_first_page_aborts_without_writing() {
        let server = server_with_user().await;
        Mock::given(path("/2/users/12/tweets"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("jack.txt");
        let err = save_posts(&client(&server), &options(filepath.clone(), None))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::BadResponse { status: 401, .. })
        ));
        assert!(!filepath.exists());
    }

    #[tokio::test]
    async fn unknown_user_aborts() {
        let server = MockServer::start().await;
        Mock::given(path("/2/users/by/username/jack"))
            .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = save_posts(&client(&server), &options(dir.path().join("x.txt"), None))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::Resolution { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn post_without_text_aborts() {
        let server = server_with_user().await;
        Mock::given(path("/2/users/12/tweets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "1", "text": "fine" }, { "id": "2" }],
                "meta": {}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("jack.txt");
        let err = save_posts(&client(&server), &options(filepath.clone(), None))
            .await
            .unwrap_err();
        match err.downcast_ref::<FetchError>() {
            Some(FetchError::MissingField { id }) => assert_eq!(id, "2"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!filepath.exists());
    }
}
