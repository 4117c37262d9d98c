use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::events::ConfigUpdate;
use crate::resolution::ImageQuality;
use crate::title::{TitleFormatter, TitleRule};

/// Name of the pseudo-source that maps to the site-wide listing.
pub const FRONTPAGE: &str = "frontpage";

/// One source name or several combined into a multi-source listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SourceSelection {
    One(String),
    Many(Vec<String>),
}

impl SourceSelection {
    pub fn is_frontpage(&self) -> bool {
        match self {
            Self::One(name) => name.is_empty() || name == FRONTPAGE,
            Self::Many(names) => names.is_empty(),
        }
    }

    /// Path segment for the request URL (`a+b+c`), or `None` for the frontpage.
    pub fn url_segment(&self) -> Option<String> {
        if self.is_frontpage() {
            return None;
        }
        Some(match self {
            Self::One(name) => name.clone(),
            Self::Many(names) => names.join("+"),
        })
    }
}

impl Default for SourceSelection {
    fn default() -> Self {
        Self::One("all".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayType {
    #[default]
    Headlines,
    /// Only posts with a usable image; album posts show their first image.
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderType {
    /// `r/a, r/b, AND r/c`
    #[default]
    Sentence,
    /// `r/a+b+c`
    Chained,
}

/// Which parts of each post row the renderer emits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DisplayToggles {
    pub show_header: bool,
    pub header_type: HeaderType,
    /// Turns on every `show-*` toggle below (not `show-header`).
    pub show_all: bool,
    pub show_rank: bool,
    pub show_score: bool,
    pub show_num_comments: bool,
    pub show_gilded: bool,
    pub show_author: bool,
    pub show_subreddit: bool,
    /// Headlines only.
    pub show_thumbnail: bool,
    /// Image rows only.
    pub show_title: bool,
}

impl DisplayToggles {
    fn expand_show_all(&mut self) {
        if !self.show_all {
            return;
        }
        self.show_rank = true;
        self.show_score = true;
        self.show_thumbnail = true;
        self.show_title = true;
        self.show_num_comments = true;
        self.show_gilded = true;
        self.show_author = true;
        self.show_subreddit = true;
    }

    /// True when a detail line (comments, gilded, subreddit, author) is shown.
    pub fn has_details(&self) -> bool {
        self.show_num_comments || self.show_gilded || self.show_author || self.show_subreddit
    }
}

impl Default for DisplayToggles {
    fn default() -> Self {
        Self {
            show_header: true,
            header_type: HeaderType::default(),
            show_all: false,
            show_rank: true,
            show_score: true,
            show_num_comments: true,
            show_gilded: true,
            show_author: false,
            show_subreddit: false,
            show_thumbnail: false,
            show_title: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Root of the listing API; source and category paths are appended.
    pub base_url: String,
    /// Source name(s) to read from; `frontpage` or empty for the site-wide listing.
    pub source: SourceSelection,
    /// Listing sort such as `hot`, `new` or `top`.
    pub category: String,
    pub display_type: DisplayType,
    /// Number of posts requested per refresh.
    pub fetch_count: usize,
    /// Posts shown per page; rotation runs when this is below `fetch-count`.
    pub page_size: usize,
    /// Time between listing refreshes.
    #[serde(with = "humantime_serde")]
    pub update_interval: Duration,
    /// Time each page stays visible.
    #[serde(with = "humantime_serde")]
    pub rotate_interval: Duration,
    /// Deploy new posts as soon as they arrive instead of at the end of a cycle.
    pub force_immediate_update: bool,
    /// Maximum title length in characters.
    pub character_limit: Option<usize>,
    pub title_replacements: Vec<TitleRule>,
    pub image_quality: ImageQuality,
    /// Optional overall timeout for one listing request. No timeout when unset.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    pub toggles: DisplayToggles,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(mut self) -> Result<Self> {
        ensure!(self.fetch_count > 0, "fetch-count must be greater than zero");
        ensure!(self.page_size > 0, "page-size must be greater than zero");
        ensure!(
            !self.update_interval.is_zero(),
            "update-interval must be greater than zero"
        );
        ensure!(
            !self.rotate_interval.is_zero(),
            "rotate-interval must be greater than zero"
        );
        ensure!(
            !self.category.trim().is_empty(),
            "category must not be empty"
        );
        url::Url::parse(&self.base_url)
            .with_context(|| format!("base-url {:?} is not a valid URL", self.base_url))?;
        if let Some(timeout) = self.request_timeout {
            ensure!(!timeout.is_zero(), "request-timeout must be greater than zero");
        }
        TitleFormatter::new(&self.title_replacements, self.character_limit)
            .context("invalid title-replacements")?;
        self.toggles.expand_show_all();
        Ok(self)
    }

    /// Message sent to the fetcher on every refresh.
    pub fn config_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            source: self.source.clone(),
            category: self.category.clone(),
            display_type: self.display_type,
            fetch_count: self.fetch_count,
            image_quality: self.image_quality,
            character_limit: self.character_limit,
            title_replacements: self.title_replacements.clone(),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com/".to_string(),
            source: SourceSelection::default(),
            category: "hot".to_string(),
            display_type: DisplayType::default(),
            fetch_count: 10,
            page_size: 5,
            update_interval: Duration::from_secs(15 * 60),
            rotate_interval: Duration::from_secs(30),
            force_immediate_update: true,
            character_limit: None,
            title_replacements: Vec::new(),
            image_quality: ImageQuality::default(),
            request_timeout: None,
            toggles: DisplayToggles::default(),
        }
    }
}
