use anyhow::Result;
use bipv_potential::{config, pipeline, scoring, simulation, solar, telemetry};
use config::Config;
use pipeline::{FeatureExtractionPipeline, ScoringService, ScoringSession, TilesetEvent};
use scoring::{PotentialScorer, StyleRule};
use simulation::TilesetSimulator;
use solar::SolarPositionModel;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    telemetry::init_tracing(&cfg.telemetry);

    let classifier = cfg.classification.classifier()?;
    let style = StyleRule::from_classifier(&classifier);
    println!("{}", serde_json::to_string_pretty(&style.to_json())?);

    let session = ScoringSession::new(
        SolarPositionModel::new(cfg.session.frames()),
        cfg.irradiance.provider(),
    );
    let mut pipeline = FeatureExtractionPipeline::new(PotentialScorer::new(), classifier);
    if cfg.pipeline.dedup_features {
        pipeline = pipeline.with_dedup();
    }

    let (events_tx, events_rx) = mpsc::channel(cfg.session.event_buffer);
    let (scored_tx, mut scored_rx) = mpsc::unbounded_channel();

    let mut service = ScoringService::start(session, pipeline, events_rx, cfg.session.start_time())
        .await?
        .with_scored_sink(scored_tx);
    if let Some(period) = cfg.session.refresh_interval() {
        service = service.with_refresh_interval(period);
    }

    let cancel = CancellationToken::new();
    tokio::spawn(telemetry::shutdown_signal(cancel.clone()));

    // Stand-in for the tile loader: every tile once, then the first one again
    let mut simulator = TilesetSimulator::new(cfg.simulation.clone());
    tokio::spawn(async move {
        let mut tiles = simulator.tiles();
        if let Some(first) = tiles.first().cloned() {
            tiles.push(first);
        }
        for tile in tiles {
            if events_tx
                .send(TilesetEvent::TileVisible(Box::new(tile)))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let consumer = tokio::spawn(async move {
        while let Some(scored) = scored_rx.recv().await {
            for s in &scored.report.scores {
                info!(
                    tile = %scored.report.tile_key,
                    feature_id = ?s.score.feature_id,
                    potential = s.score.value,
                    band = %s.band,
                    "feature band"
                );
            }
        }
    });

    let stats = service.run(cancel.clone()).await;
    cancel.cancel();
    if let Err(e) = consumer.await {
        warn!(error = %e, "report consumer failed");
    }

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
