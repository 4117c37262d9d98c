//! Listing request URLs and the JSON shape returned by the content API.

use serde::Deserialize;
use url::Url;

use crate::config::{DisplayType, SourceSelection};
use crate::error::FetchError;
use crate::events::{ConfigUpdate, Post};
use crate::resolution::{Preview, select_image_url};
use crate::title::TitleFormatter;

#[derive(Debug, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub data: Option<ListingData>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Option<Vec<ListingChild>>,
}

#[derive(Debug, Deserialize)]
pub struct ListingChild {
    pub data: PostData,
}

/// The subset of item fields the widget uses.
#[derive(Debug, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub preview: Option<Preview>,
    #[serde(default)]
    pub gilded: u32,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub author: String,
}

/// `<base>/[r/<source>/]<category>/.json?raw_json=1&limit=<count>`
pub fn listing_url(
    base: &str,
    source: &SourceSelection,
    category: &str,
    fetch_count: usize,
) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut path = String::new();
    if let Some(segment) = source.url_segment() {
        path.push_str("r/");
        path.push_str(&segment);
        path.push('/');
    }
    path.push_str(category);
    path.push_str("/.json");

    let mut url = base.join(&path)?;
    url.query_pairs_mut()
        .append_pair("raw_json", "1")
        .append_pair("limit", &fetch_count.to_string());
    Ok(url)
}

/// Decodes a listing body and reshapes it into posts for `update`.
pub fn posts_from_body(body: &[u8], update: &ConfigUpdate) -> Result<Vec<Post>, FetchError> {
    let listing: Listing =
        serde_json::from_slice(body).map_err(|err| FetchError::Malformed(err.to_string()))?;
    let data = listing
        .data
        .ok_or_else(|| FetchError::Malformed("missing `data` object".to_string()))?;
    let children = match data.children {
        Some(children) if !children.is_empty() => children,
        _ => return Err(FetchError::EmptySource),
    };

    let titles = TitleFormatter::new(&update.title_replacements, update.character_limit)?;
    let posts = children
        .into_iter()
        .map(|child| to_post(child.data, &titles, update))
        .filter(|post| update.display_type != DisplayType::Image || post.image_url.is_some())
        .collect();
    Ok(posts)
}

fn to_post(data: PostData, titles: &TitleFormatter, update: &ConfigUpdate) -> Post {
    let image_url = select_image_url(data.preview.as_ref(), &data.thumbnail, update.image_quality);
    Post {
        title: titles.format(&data.title),
        score: data.score,
        thumbnail: data.thumbnail,
        image_url,
        gilded: data.gilded,
        num_comments: data.num_comments,
        subreddit: data.subreddit,
        author: data.author,
    }
}
