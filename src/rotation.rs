//! Pagination and the staged/active double buffer behind the carousel.
//!
//! New results are staged first and only replace the visible pages at a
//! safe point: immediately when nothing is shown yet, when no rotation is
//! running, when immediate updates are configured, or when the rotation
//! wraps back to the first page.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::events::Post;

/// One page of posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSet {
    /// Position of the first post within the full list (for ranking).
    pub offset: usize,
    pub posts: Vec<Post>,
}

impl PostSet {
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Splits `posts` into consecutive pages of `page_size`; the last page holds
/// whatever remains.
pub fn paginate(posts: &[Post], page_size: usize) -> Vec<PostSet> {
    let page_size = page_size.max(1);
    posts
        .chunks(page_size)
        .enumerate()
        .map(|(idx, chunk)| PostSet {
            offset: idx * page_size,
            posts: chunk.to_vec(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub page_size: usize,
    pub fetch_count: usize,
    pub immediate_update: bool,
}

impl RotationPolicy {
    fn rotates(&self) -> bool {
        self.page_size < self.fetch_count
    }
}

#[derive(Debug, Clone)]
struct Staged {
    posts: Vec<Post>,
    sets: Vec<PostSet>,
    received: Instant,
    received_at: DateTime<Utc>,
}

/// Result of moving staged content into the active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// Whether the rotation timer should (re)start from page 0.
    pub restart_rotation: bool,
    /// Time the deployed result spent staged.
    pub waited: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to rotate.
    Idle,
    /// Page `from` hides, page `to` shows.
    Advanced { from: usize, to: usize },
    /// End of cycle with a staged result waiting; deploy instead of wrapping.
    DeployDue,
}

#[derive(Debug, Clone)]
pub struct RotationState {
    policy: RotationPolicy,
    posts: Vec<Post>,
    sets: Vec<PostSet>,
    current: usize,
    staged: Option<Staged>,
    has_valid_posts: bool,
}

impl RotationState {
    pub fn new(policy: RotationPolicy) -> Self {
        Self {
            policy,
            posts: Vec::new(),
            sets: Vec::new(),
            current: 0,
            staged: None,
            has_valid_posts: true,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn sets(&self) -> &[PostSet] {
        &self.sets
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn has_valid_posts(&self) -> bool {
        self.has_valid_posts
    }

    pub fn has_active_content(&self) -> bool {
        !self.posts.is_empty()
    }

    pub fn waiting_to_deploy(&self) -> bool {
        self.staged.is_some()
    }

    /// Wall-clock receipt time of the staged result, if any.
    pub fn staged_received_at(&self) -> Option<DateTime<Utc>> {
        self.staged.as_ref().map(|s| s.received_at)
    }

    /// Holds `posts` until the next deployment, replacing any earlier staged result.
    pub fn stage(&mut self, posts: Vec<Post>, now: Instant) {
        self.has_valid_posts = !posts.is_empty();
        let sets = paginate(&posts, self.policy.page_size);
        debug!(
            posts = posts.len(),
            sets = sets.len(),
            valid = self.has_valid_posts,
            "staged posts"
        );
        self.staged = Some(Staged {
            posts,
            sets,
            received: now,
            received_at: Utc::now(),
        });
    }

    /// Marks the content invalid; any staged result is left alone.
    pub fn record_error(&mut self) {
        self.has_valid_posts = false;
    }

    /// Deploys when it cannot disrupt a running cycle.
    ///
    /// With no active content the deploy is unconditional. Otherwise it only
    /// happens when `cycle_complete`; a deferred result is picked up by
    /// [`tick`](Self::tick) at the end of the cycle.
    pub fn maybe_refresh(&mut self, cycle_complete: bool, now: Instant) -> Option<Deployment> {
        if !self.has_active_content() {
            debug!("no active content; deploying");
            return Some(self.deploy(now));
        }
        if cycle_complete {
            debug!("existing cycle complete; deploying");
            return Some(self.deploy(now));
        }
        debug!("deploy deferred until end of cycle");
        None
    }

    /// Replaces active content with the staged result (or nothing).
    pub fn deploy(&mut self, now: Instant) -> Deployment {
        let waited = self
            .staged
            .as_ref()
            .map(|s| now.saturating_duration_since(s.received));
        let (posts, sets) = match self.staged.take() {
            Some(staged) => (staged.posts, staged.sets),
            None => (Vec::new(), Vec::new()),
        };
        self.posts = posts;
        self.sets = sets;
        self.current = 0;
        Deployment {
            restart_rotation: self.policy.rotates() && self.has_valid_posts,
            waited,
        }
    }

    /// Advances to the next page, wrapping to 0 after the last one.
    pub fn tick(&mut self) -> Tick {
        let count = self.sets.len();
        if count == 0 {
            return Tick::Idle;
        }
        let next = (self.current + 1) % count;
        if next == 0 && self.staged.is_some() && !self.policy.immediate_update {
            return Tick::DeployDue;
        }
        let from = self.current;
        self.current = next;
        Tick::Advanced { from, to: next }
    }
}
