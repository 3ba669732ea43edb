use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::extraction::{FeatureExtractionPipeline, PipelineStats, TileReport};
use super::session::{ScoringContext, ScoringSession};
use crate::domain::TileContent;
use crate::error::Result;

/// Notifications from the tile dataset loader and the caller
pub enum TilesetEvent {
    /// A tile entered the visible set; its content is handed back on the
    /// report channel once scored
    TileVisible(Box<dyn TileContent>),
    /// The dataset was reloaded from scratch
    DatasetReloaded,
    /// Recompute the session context (`None` = now)
    Refresh {
        at: Option<DateTime<Utc>>,
        reply: Option<oneshot::Sender<Result<ScoringContext>>>,
    },
}

impl std::fmt::Debug for TilesetEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TilesetEvent::TileVisible(tile) => write!(f, "TileVisible({})", tile.tile_key()),
            TilesetEvent::DatasetReloaded => write!(f, "DatasetReloaded"),
            TilesetEvent::Refresh { at, .. } => write!(f, "Refresh({:?})", at),
        }
    }
}

/// Tile content after scoring, with potentials attached
pub struct ScoredTile {
    pub content: Box<dyn TileContent>,
    pub report: TileReport,
}

/// Drives the pipeline from a stream of tileset events
///
/// All work happens on the task calling [`ScoringService::run`]; events are
/// handled one at a time in arrival order.
pub struct ScoringService {
    session: ScoringSession,
    pipeline: FeatureExtractionPipeline,
    events: mpsc::Receiver<TilesetEvent>,
    scored: Option<mpsc::UnboundedSender<ScoredTile>>,
    refresh_every: Option<Duration>,
}

impl ScoringService {
    /// Prepare the first scoring pass; a session error is returned to the caller
    pub async fn start(
        mut session: ScoringSession,
        mut pipeline: FeatureExtractionPipeline,
        events: mpsc::Receiver<TilesetEvent>,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let context = session.refresh(at).await?;
        pipeline.set_context(Some(context));
        Ok(Self {
            session,
            pipeline,
            events,
            scored: None,
            refresh_every: None,
        })
    }

    pub fn with_scored_sink(mut self, sink: mpsc::UnboundedSender<ScoredTile>) -> Self {
        self.scored = Some(sink);
        self
    }

    /// Recompute the context at wall-clock now on this period
    pub fn with_refresh_interval(mut self, period: Duration) -> Self {
        self.refresh_every = Some(period);
        self
    }

    pub fn stats(&self) -> &PipelineStats {
        self.pipeline.stats()
    }

    /// Handle events until the channel closes or `cancel` fires
    ///
    /// Cancellation is observed between events only; a tile already being
    /// iterated is finished.
    pub async fn run(mut self, cancel: CancellationToken) -> PipelineStats {
        let mut ticker = self.refresh_every.map(|period| {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("scoring service cancelled");
                    break;
                }
                _ = next_tick(&mut ticker) => {
                    debug!("periodic session refresh");
                    TilesetEvent::Refresh { at: None, reply: None }
                }
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => {
                        info!("tileset event stream closed");
                        break;
                    }
                },
            };
            self.handle(event).await;
        }

        let stats = *self.pipeline.stats();
        info!(
            tiles_seen = stats.tiles_seen,
            features_scored = stats.features_scored,
            features_skipped = stats.features_skipped,
            "scoring service stopped"
        );
        stats
    }

    async fn handle(&mut self, event: TilesetEvent) {
        match event {
            TilesetEvent::TileVisible(mut content) => {
                // Never propagated to the loader
                let report = match self.pipeline.on_tile_visible(content.as_mut()) {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(tile = %content.tile_key(), error = %e, "tile not scored");
                        TileReport::rejected(content.tile_key(), e)
                    }
                };
                let receiver_gone = match &self.scored {
                    Some(sink) => sink.send(ScoredTile { content, report }).is_err(),
                    None => false,
                };
                if receiver_gone {
                    warn!("scored tile receiver dropped");
                    self.scored = None;
                }
            }
            TilesetEvent::DatasetReloaded => {
                info!("dataset reloaded");
                self.pipeline.dataset_reloaded();
            }
            TilesetEvent::Refresh { at, reply } => {
                let result = self.session.refresh(at.unwrap_or_else(Utc::now)).await;
                self.pipeline.set_context(result.as_ref().ok().copied());
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
        }
    }
}

/// Pends forever when no refresh period is configured
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
