use crate::config::{DisplayType, SourceSelection};
use crate::resolution::ImageQuality;
use crate::title::TitleRule;

/// A normalized listing item as produced by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub score: i64,
    /// Thumbnail URL, or a keyword such as `self` or `default`.
    pub thumbnail: String,
    /// Selected preview image; `None` when the item has no usable image.
    pub image_url: Option<String>,
    pub gilded: u32,
    pub num_comments: u64,
    pub subreddit: String,
    pub author: String,
}

/// Presenter -> Fetcher: everything needed to issue one listing request.
#[derive(Debug, Clone)]
pub struct ConfigUpdate {
    pub source: SourceSelection,
    pub category: String,
    pub display_type: DisplayType,
    pub fetch_count: usize,
    pub image_quality: ImageQuality,
    pub character_limit: Option<usize>,
    pub title_replacements: Vec<TitleRule>,
}

/// Fetcher -> Presenter.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    PostsReady { posts: Vec<Post> },
    PostsError { message: String },
}
