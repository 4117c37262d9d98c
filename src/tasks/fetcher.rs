use crate::error::FetchError;
use crate::events::{ConfigUpdate, FetchOutcome, Post};
use crate::listing::{listing_url, posts_from_body};
use anyhow::Result;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client for listing requests. No timeout unless one is configured.
pub fn build_client(request_timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// One listing request reshaped into posts.
#[instrument(skip(client, update), fields(category = %update.category, count = update.fetch_count))]
pub async fn fetch_posts(
    client: &reqwest::Client,
    base_url: &str,
    update: &ConfigUpdate,
) -> Result<Vec<Post>, FetchError> {
    let url = listing_url(base_url, &update.source, &update.category, update.fetch_count)?;
    debug!(%url, "requesting listing");

    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    let body = response.bytes().await?;
    posts_from_body(&body, update)
}

/// Answers every `ConfigUpdate` with exactly one `FetchOutcome`.
///
/// Requests are served one at a time in arrival order.
pub async fn run(
    client: reqwest::Client,
    base_url: String,
    mut config_rx: Receiver<ConfigUpdate>,
    to_presenter: Sender<FetchOutcome>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        let update = select! {
            _ = cancel.cancelled() => break,
            maybe = config_rx.recv() => match maybe {
                Some(update) => update,
                None => {
                    debug!("config channel closed; exiting fetcher");
                    break;
                }
            },
        };

        let outcome = select! {
            _ = cancel.cancelled() => break,
            res = fetch_posts(&client, &base_url, &update) => match res {
                Ok(posts) => {
                    info!(posts = posts.len(), "fetched posts");
                    FetchOutcome::PostsReady { posts }
                }
                Err(err) => {
                    warn!(error = %err, "fetch failed");
                    FetchOutcome::PostsError { message: err.to_string() }
                }
            },
        };

        if to_presenter.send(outcome).await.is_err() {
            warn!("presenter channel closed");
            break;
        }
    }
    Ok(())
}
