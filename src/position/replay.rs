use crate::domain::events::Event;
use crate::domain::{Coordinate, InvalidCoordinate, PositionError, PositionFix};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, info, instrument, warn};

/// Plays back a recorded track, one JSON encoded fix per line.
#[derive(Clone, Debug)]
pub struct ReplaySource {
    pub path: PathBuf,
    /// Divides the recorded time between fixes
    pub speedup: f64,
}

/// Keeps the position source alive. Dropping it stops the delivery of fixes.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn subscribe(source: ReplaySource, tx: Sender<Event>) -> Subscription {
    let task = tokio::spawn(async move {
        match replay(&source, &tx).await {
            Ok(count) => info!("📍 Replayed {} fix(es) from {}", count, source.path.display()),
            Err(ReplayError::Io(e)) => {
                warn!("⚠️ Unable to read {}: {}", source.path.display(), e);
                let error = PositionError::Unavailable(format!("cannot read {}", source.path.display()));
                tx.send(Event::PositionError(error)).await.unwrap_or_default();
            }
            Err(ReplayError::Closed) => debug!("📍 Receiver closed, replay stopped"),
        }
    });

    Subscription { task }
}

#[derive(Deserialize)]
struct RecordedFix {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    speed: Option<f64>,
    timestamp: DateTime<Utc>,
}

#[derive(Error, Debug)]
enum ReplayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("the receiver was closed")]
    Closed,
}

#[derive(Error, Debug)]
enum ParseFixError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Coordinate(#[from] InvalidCoordinate),
}

#[instrument(skip_all, fields(path = %source.path.display()))]
async fn replay(source: &ReplaySource, tx: &Sender<Event>) -> Result<usize, ReplayError> {
    debug!("📍 Opening track...");
    let file = File::open(&source.path).await?;
    debug!("📍 Opening track... OK");

    let mut lines = LinesStream::new(BufReader::new(file).lines());
    let mut previous: Option<DateTime<Utc>> = None;
    let mut count = 0;
    let mut line_number = 0;

    while let Some(line) = lines.next().await {
        let line = line?;
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let fix = match parse_fix(&line) {
            Ok(fix) => fix,
            Err(e) => {
                warn!("⚠️ Skipping line {}: {}", line_number, e);
                continue;
            }
        };

        if let Some(previous) = previous {
            sleep(pace(fix.timestamp - previous, source.speedup)).await;
        }
        previous = Some(fix.timestamp);

        tx.send(Event::PositionFix(fix)).await.map_err(|_| ReplayError::Closed)?;
        count += 1;
    }

    Ok(count)
}

fn parse_fix(line: &str) -> Result<PositionFix, ParseFixError> {
    let recorded: RecordedFix = serde_json::from_str(line)?;
    let coordinate = Coordinate::try_new(recorded.latitude, recorded.longitude)?;
    Ok(PositionFix::new(coordinate, recorded.speed, recorded.timestamp))
}

/// The real time to wait between two fixes. Fixes recorded out of order are sent right away.
fn pace(elapsed: chrono::TimeDelta, speedup: f64) -> Duration {
    let Ok(elapsed) = elapsed.to_std() else {
        return Duration::ZERO;
    };

    if !speedup.is_finite() || speedup <= 0.0 {
        return elapsed;
    }
    Duration::try_from_secs_f64(elapsed.as_secs_f64() / speedup).unwrap_or(Duration::ZERO)
}
