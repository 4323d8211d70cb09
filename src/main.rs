mod clean;
mod model;
mod persist;
mod pipeline;
mod train;
mod twitter;

use crate::clean::CleanOptions;
use crate::pipeline::{save_posts, SaveOptions};
use crate::train::{TrainJob, DEFAULT_TRAIN_COMMAND};
use crate::twitter::v2::{TwitterClientV2, DEFAULT_API_URL};
use crate::twitter::{Authentication, TimelineOptions};
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use tokio::fs;
use url::Url;

#[derive(Parser, Debug)]
#[clap(version, about = "Save a Twitter user's posts to a text file")]
struct Args {
    /// Path to the authentication details file
    #[clap(short, long, default_value = "./auth.json")]
    auth: PathBuf,
    /// Bearer token to use instead of the authentication file
    #[clap(short, long, env = "TWITTER_BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,
    /// Username to get posts for
    #[clap(short, long)]
    user: String,
    /// File to save posts to (one per line, overwritten)
    #[clap(short, long)]
    filepath: PathBuf,
    /// Clean up posts before saving
    #[clap(short, long)]
    clean: bool,
    /// When cleaning, save each sentence on its own line
    #[clap(short, long)]
    split_sentences: bool,
    /// When cleaning, keep posts that are only a link
    #[clap(long)]
    keep_urls: bool,
    /// Include retweets
    #[clap(long)]
    include_retweets: bool,
    /// Train a model on the saved posts, storing all artifacts in this directory
    #[clap(short, long)]
    dataset_dir: Option<PathBuf>,
    /// Program to run for training
    #[clap(long, default_value = DEFAULT_TRAIN_COMMAND)]
    train_command: String,
    /// Base url of the Twitter API v2
    #[clap(long, default_value = DEFAULT_API_URL)]
    api_url: Url,
}

impl Args {
    fn clean_options(&self) -> Option<CleanOptions> {
        self.clean.then(|| CleanOptions {
            split_sentences: self.split_sentences,
            remove_urls: !self.keep_urls,
        })
    }

    async fn authentication(&self) -> anyhow::Result<Authentication> {
        if let Some(bearer_token) = &self.bearer_token {
            return Ok(Authentication {
                bearer_token: bearer_token.clone(),
            });
        }
        let auth = fs::read_to_string(&self.auth)
            .await
            .context("Unable to read auth file")?;
        serde_json::from_str::<Authentication>(&auth).context("Unable to deserialize auth file")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = main2().await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn main2() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    if !args.clean && (args.split_sentences || args.keep_urls) {
        log::warn!("--split-sentences and --keep-urls only apply with --clean");
    }
    let auth = args.authentication().await?;
    let client = TwitterClientV2::with_api_url(&auth, args.api_url.clone())?;

    let options = SaveOptions {
        username: args.user.clone(),
        filepath: args.filepath.clone(),
        clean: args.clean_options(),
        timeline: TimelineOptions {
            exclude_retweets: !args.include_retweets,
        },
    };
    let summary = save_posts(&client, &options).await?;
    if !summary.complete {
        log::warn!(
            "Saved a partial timeline for {} ({}, {} posts)",
            args.user,
            summary.user_id,
            summary.fetched
        );
    }

    if let Some(dataset_dir) = args.dataset_dir {
        let job = TrainJob {
            command: args.train_command,
            dataset_fp: args.filepath,
            dataset_dir,
        };
        job.run().await.context("Training failed")?;
    }
    Ok(())
}
