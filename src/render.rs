//! Rendering contract for the carousel and a plain-text implementation.
//!
//! Renderers must be deterministic for identical input and keep exactly one
//! page visible at a time.

use std::io::Write;

use anyhow::Result;

use crate::config::{DisplayToggles, DisplayType, HeaderType, SourceSelection};
use crate::events::Post;
use crate::rotation::PostSet;

pub const NO_VALID_POSTS: &str = "No valid posts to display";
pub const LOADING: &str = "LOADING";

#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    Loading,
    NoValidPosts,
    Pages { sets: &'a [PostSet], visible: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub header: Option<&'a str>,
    pub body: Body<'a>,
}

pub trait Renderer: Send {
    /// Rebuilds the whole widget.
    fn render(&mut self, view: &View<'_>) -> Result<()>;
    /// Hides page `from` and shows page `to` of the last rendered view.
    fn show_page(&mut self, from: usize, to: usize) -> Result<()>;
}

/// `"<category> posts from <sources>"`.
pub fn header_text(category: &str, source: &SourceSelection, header_type: HeaderType) -> String {
    let from = match source {
        s if s.is_frontpage() => "the frontpage".to_string(),
        SourceSelection::One(name) => format!("r/{name}"),
        SourceSelection::Many(names) => match header_type {
            HeaderType::Chained => format!("r/{}", names.join("+")),
            HeaderType::Sentence => sentence(names),
        },
    };
    format!("{category} posts from {from}")
}

fn sentence(names: &[String]) -> String {
    let second_to_last = names.len().saturating_sub(2);
    let mut text = String::new();
    for (idx, name) in names.iter().enumerate() {
        text.push_str("r/");
        text.push_str(name);
        if names.len() >= 2 && idx == second_to_last {
            text.push_str(", AND ");
        } else if idx < second_to_last {
            text.push_str(", ");
        }
    }
    text
}

/// Scores above 10 000 are shortened to `12.3k`.
pub fn format_score(score: i64) -> String {
    if score > 10_000 {
        format!("{:.1}k", score as f64 / 1000.0)
    } else {
        score.to_string()
    }
}

/// Lines of text for one page.
pub fn compose_page(set: &PostSet, toggles: &DisplayToggles, display: DisplayType) -> Vec<String> {
    let mut lines = Vec::new();
    for (idx, post) in set.posts.iter().enumerate() {
        let rank = set.offset + idx + 1;
        match display {
            DisplayType::Headlines => headline_row(&mut lines, post, rank, toggles),
            DisplayType::Image => image_row(&mut lines, post, rank, toggles),
        }
    }
    lines
}

fn headline_row(lines: &mut Vec<String>, post: &Post, rank: usize, toggles: &DisplayToggles) {
    let mut parts = lead_columns(post, rank, toggles);
    if toggles.show_thumbnail {
        parts.push(format!("[{}]", post.thumbnail));
    }
    parts.push(post.title.clone());
    lines.push(parts.join("  "));
    if let Some(details) = details_line(post, toggles) {
        lines.push(details);
    }
}

fn image_row(lines: &mut Vec<String>, post: &Post, rank: usize, toggles: &DisplayToggles) {
    let image = post.image_url.as_deref().unwrap_or(&post.thumbnail);
    if toggles.show_title {
        lines.push(format!("[image] {image}"));
        let mut parts = lead_columns(post, rank, toggles);
        parts.push(post.title.clone());
        lines.push(parts.join("  "));
    } else if toggles.show_rank {
        lines.push(format!("#{rank}  [image] {image}"));
    } else {
        lines.push(format!("[image] {image}"));
    }
    if let Some(details) = details_line(post, toggles) {
        lines.push(details);
    }
}

fn lead_columns(post: &Post, rank: usize, toggles: &DisplayToggles) -> Vec<String> {
    let mut parts = Vec::new();
    if toggles.show_rank {
        parts.push(format!("#{rank}"));
    }
    if toggles.show_score {
        parts.push(format_score(post.score));
    }
    parts
}

fn details_line(post: &Post, toggles: &DisplayToggles) -> Option<String> {
    if !toggles.has_details() {
        return None;
    }
    let mut parts = Vec::new();
    if toggles.show_num_comments {
        parts.push(format!("{} comments", post.num_comments));
    }
    if toggles.show_gilded && post.gilded > 0 {
        if post.gilded > 1 {
            parts.push(format!("gilded x{}", post.gilded));
        } else {
            parts.push("gilded".to_string());
        }
    }
    if toggles.show_subreddit {
        parts.push(format!("r/{}", post.subreddit));
    }
    if toggles.show_author {
        parts.push(format!("by {}", post.author));
    }
    Some(format!("    {}", parts.join(" | ")))
}

/// Writes the visible page to `out` every time it changes.
pub struct TextRenderer<W> {
    out: W,
    toggles: DisplayToggles,
    display: DisplayType,
    header: Option<String>,
    pages: Vec<Vec<String>>,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W, toggles: DisplayToggles, display: DisplayType) -> Self {
        Self {
            out,
            toggles,
            display,
            header: None,
            pages: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self) -> Result<()> {
        if let Some(header) = &self.header {
            writeln!(self.out, "== {header} ==")?;
        }
        Ok(())
    }

    fn write_page(&mut self, index: usize) -> Result<()> {
        self.write_header()?;
        let total = self.pages.len();
        if let Some(page) = self.pages.get(index) {
            for line in page {
                writeln!(self.out, "{line}")?;
            }
            writeln!(self.out, "-- page {}/{} --", index + 1, total)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render(&mut self, view: &View<'_>) -> Result<()> {
        self.header = view.header.map(str::to_string);
        match view.body {
            Body::Loading | Body::NoValidPosts => {
                self.pages.clear();
                let text = match view.body {
                    Body::Loading => LOADING,
                    _ => NO_VALID_POSTS,
                };
                self.write_header()?;
                writeln!(self.out, "{text}")?;
                self.out.flush()?;
                Ok(())
            }
            Body::Pages { sets, visible } => {
                self.pages = sets
                    .iter()
                    .map(|set| compose_page(set, &self.toggles, self.display))
                    .collect();
                self.write_page(visible)
            }
        }
    }

    fn show_page(&mut self, _from: usize, to: usize) -> Result<()> {
        self.write_page(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::paginate;

    fn post(title: &str, score: i64, gilded: u32) -> Post {
        Post {
            title: title.to_string(),
            score,
            thumbnail: "self".to_string(),
            image_url: None,
            gilded,
            num_comments: 12,
            subreddit: "rust".to_string(),
            author: "ferris".to_string(),
        }
    }

    #[test]
    fn header_variants() {
        let frontpage = SourceSelection::One("frontpage".into());
        assert_eq!(
            header_text("hot", &frontpage, HeaderType::Sentence),
            "hot posts from the frontpage"
        );
        let one = SourceSelection::One("pics".into());
        assert_eq!(
            header_text("new", &one, HeaderType::Sentence),
            "new posts from r/pics"
        );
        let many = SourceSelection::Many(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(
            header_text("top", &many, HeaderType::Sentence),
            "top posts from r/a, r/b, AND r/c"
        );
        assert_eq!(
            header_text("top", &many, HeaderType::Chained),
            "top posts from r/a+b+c"
        );
        let two = SourceSelection::Many(vec!["a".into(), "b".into()]);
        assert_eq!(
            header_text("hot", &two, HeaderType::Sentence),
            "hot posts from r/a, AND r/b"
        );
    }

    #[test]
    fn score_formatting() {
        assert_eq!(format_score(999), "999");
        assert_eq!(format_score(10_000), "10000");
        assert_eq!(format_score(12_345), "12.3k");
    }

    #[test]
    fn ranks_continue_across_pages() {
        let posts: Vec<Post> = (0..4).map(|i| post(&format!("t{i}"), i, 0)).collect();
        let sets = paginate(&posts, 3);
        let toggles = DisplayToggles {
            show_num_comments: false,
            show_gilded: false,
            ..DisplayToggles::default()
        };
        let second = compose_page(&sets[1], &toggles, DisplayType::Headlines);
        assert_eq!(second, vec!["#4  3  t3".to_string()]);
    }

    #[test]
    fn detail_line_follows_toggles() {
        let set = PostSet {
            offset: 0,
            posts: vec![post("hello", 20_500, 3)],
        };
        let toggles = DisplayToggles {
            show_author: true,
            show_subreddit: true,
            ..DisplayToggles::default()
        };
        let lines = compose_page(&set, &toggles, DisplayType::Headlines);
        assert_eq!(
            lines,
            vec![
                "#1  20.5k  hello".to_string(),
                "    12 comments | gilded x3 | r/rust | by ferris".to_string(),
            ]
        );
    }

    #[test]
    fn text_renderer_is_deterministic() {
        let posts: Vec<Post> = (0..4).map(|i| post(&format!("t{i}"), i, 0)).collect();
        let sets = paginate(&posts, 2);
        let view = View {
            header: Some("hot posts from r/rust"),
            body: Body::Pages {
                sets: &sets,
                visible: 0,
            },
        };
        let mut a = TextRenderer::new(Vec::new(), DisplayToggles::default(), DisplayType::Headlines);
        let mut b = TextRenderer::new(Vec::new(), DisplayToggles::default(), DisplayType::Headlines);
        a.render(&view).unwrap();
        b.render(&view).unwrap();
        let a = String::from_utf8(a.into_inner()).unwrap();
        let b = String::from_utf8(b.into_inner()).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("== hot posts from r/rust ==\n#1  0  t0\n"));
        assert!(a.ends_with("-- page 1/2 --\n"));
    }

    #[test]
    fn placeholder_when_invalid() {
        let mut r = TextRenderer::new(Vec::new(), DisplayToggles::default(), DisplayType::Image);
        r.render(&View {
            header: None,
            body: Body::NoValidPosts,
        })
        .unwrap();
        assert_eq!(String::from_utf8(r.into_inner()).unwrap(), "No valid posts to display\n");
    }
}
