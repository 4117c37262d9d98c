use crate::config::Configuration;
use crate::events::{ConfigUpdate, FetchOutcome};
use crate::render::{Body, Renderer, View, header_text};
use crate::rotation::{Deployment, RotationPolicy, RotationState, Tick};
use anyhow::{Context, Result};
use tokio::select;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PresenterOptions {
    pub policy: RotationPolicy,
    /// How often a fresh listing is requested.
    pub update_interval: Duration,
    /// How long each page stays visible.
    pub rotate_interval: Duration,
    pub header: Option<String>,
}

impl PresenterOptions {
    pub fn from_config(cfg: &Configuration) -> Self {
        let header = cfg
            .toggles
            .show_header
            .then(|| header_text(&cfg.category, &cfg.source, cfg.toggles.header_type));
        Self {
            policy: RotationPolicy {
                page_size: cfg.page_size,
                fetch_count: cfg.fetch_count,
                immediate_update: cfg.force_immediate_update,
            },
            update_interval: cfg.update_interval,
            rotate_interval: cfg.rotate_interval,
            header,
        }
    }
}

/// Tick from the rotation task started in the given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RotationTick(u64);

/// Owns the single rotation task. Starting always cancels the previous one
/// first, and ticks from earlier generations are discarded.
struct Rotator {
    period: Duration,
    tick_tx: Sender<RotationTick>,
    parent: CancellationToken,
    generation: u64,
    running: Option<CancellationToken>,
}

impl Rotator {
    fn new(period: Duration, tick_tx: Sender<RotationTick>, parent: CancellationToken) -> Self {
        Self {
            period,
            tick_tx,
            parent,
            generation: 0,
            running: None,
        }
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }

    fn accepts(&self, tick: RotationTick) -> bool {
        self.is_running() && tick.0 == self.generation
    }

    fn start(&mut self) {
        self.stop();
        self.generation += 1;
        let token = self.parent.child_token();
        let generation = self.generation;
        let period = self.period;
        let tx = self.tick_tx.clone();
        let cancel = token.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if tx.send(RotationTick(generation)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        debug!(generation, period = ?period, "rotation started");
        self.running = Some(token);
    }

    fn stop(&mut self) {
        if let Some(token) = self.running.take() {
            token.cancel();
            debug!(generation = self.generation, "rotation stopped");
        }
    }
}

struct Presenter<R> {
    state: RotationState,
    renderer: R,
    rotator: Rotator,
    header: Option<String>,
    immediate_update: bool,
}

fn view_of<'a>(state: &'a RotationState, header: Option<&'a str>) -> View<'a> {
    let body = if !state.has_valid_posts() {
        Body::NoValidPosts
    } else if state.sets().is_empty() {
        Body::Loading
    } else {
        Body::Pages {
            sets: state.sets(),
            visible: state.current_index(),
        }
    };
    View { header, body }
}

impl<R: Renderer> Presenter<R> {
    fn render(&mut self) -> Result<()> {
        self.renderer
            .render(&view_of(&self.state, self.header.as_deref()))
            .context("render failed")
    }

    fn on_outcome(&mut self, outcome: FetchOutcome) -> Result<()> {
        // Decided before staging: a running rotation means a cycle is in progress.
        let cycle_complete = !self.rotator.is_running() || self.immediate_update;
        match outcome {
            FetchOutcome::PostsReady { posts } => {
                info!(posts = posts.len(), "received posts");
                self.state.stage(posts, now());
            }
            FetchOutcome::PostsError { message } => {
                warn!(%message, "no valid posts");
                self.state.record_error();
            }
        }
        debug!(
            rotating = self.rotator.is_running(),
            cycle_complete, "refresh requested"
        );
        if let Some(deployment) = self.state.maybe_refresh(cycle_complete, now()) {
            self.apply(deployment)?;
        }
        Ok(())
    }

    fn on_tick(&mut self, tick: RotationTick) -> Result<()> {
        if !self.rotator.accepts(tick) {
            debug!(generation = tick.0, "stale rotation tick ignored");
            return Ok(());
        }
        match self.state.tick() {
            Tick::Idle => {}
            Tick::Advanced { from, to } => {
                debug!(from, to, "rotating page");
                self.renderer
                    .show_page(from, to)
                    .context("page switch failed")?;
            }
            Tick::DeployDue => {
                debug!("cycle complete with staged posts");
                if let Some(deployment) = self.state.maybe_refresh(true, now()) {
                    self.apply(deployment)?;
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, deployment: Deployment) -> Result<()> {
        if let Some(waited) = deployment.waited {
            debug!(waited = %humantime::format_duration(waited), "deploying posts");
        }
        self.render()?;
        if deployment.restart_rotation {
            self.rotator.start();
        } else {
            self.rotator.stop();
        }
        Ok(())
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

/// Drives the carousel.
///
/// - Requests a listing at startup and every `update_interval`.
/// - Stages each result and deploys it when no cycle would be interrupted.
/// - Rotates pages every `rotate_interval` while more than one page exists.
pub async fn run<R: Renderer>(
    options: PresenterOptions,
    update: ConfigUpdate,
    to_fetcher: Sender<ConfigUpdate>,
    mut from_fetcher: Receiver<FetchOutcome>,
    renderer: R,
    cancel: CancellationToken,
) -> Result<()> {
    let (tick_tx, mut tick_rx) = mpsc::channel::<RotationTick>(4);
    let mut presenter = Presenter {
        state: RotationState::new(options.policy),
        renderer,
        rotator: Rotator::new(options.rotate_interval, tick_tx, cancel.clone()),
        header: options.header,
        immediate_update: options.policy.immediate_update,
    };
    presenter.render()?;

    let mut refresh = interval(options.update_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        select! {
            _ = cancel.cancelled() => break Ok(()),

            _ = refresh.tick() => {
                match to_fetcher.try_send(update.clone()) {
                    Ok(()) => debug!("requested listing refresh"),
                    Err(TrySendError::Full(_)) => warn!("fetcher busy; skipping refresh"),
                    Err(TrySendError::Closed(_)) => {
                        warn!("fetcher channel closed");
                        break Ok(());
                    }
                }
            }

            maybe = from_fetcher.recv() => match maybe {
                Some(outcome) => {
                    if let Err(err) = presenter.on_outcome(outcome) {
                        break Err(err);
                    }
                }
                None => {
                    debug!("fetcher closed; exiting presenter");
                    break Ok(());
                }
            },

            Some(tick) = tick_rx.recv() => {
                if let Err(err) = presenter.on_tick(tick) {
                    break Err(err);
                }
            }
        }
    };

    presenter.rotator.stop();
    result
}
