//! The one-shot relay pipeline: login, fetch graph, compute trend, notify.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, LibreClient, LibreSession};
use crate::config::Config;
use crate::models::{GlucoseSample, GraphResponse, Reading};
use crate::notify::Notifier;
use crate::trend::{self, TrendError};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Trend(#[from] TrendError),
}

/// Label the latest reading of a graph with the trend of its series.
pub fn enrich(graph: GraphResponse) -> Result<(GlucoseSample, Reading), TrendError> {
    let (latest, series) = graph.into_parts();
    let label = trend::compute_trend(&series)?;
    let latest = latest.with_trend(label);
    let reading = Reading::new(&latest, label);
    Ok((latest, reading))
}

async fn fetch_latest(
    session: &LibreSession,
    config: &Config,
) -> Result<(GlucoseSample, Reading), RelayError> {
    let graph = session.graph(&config.connection_id).await?;
    Ok(enrich(graph)?)
}

/// Run the whole pipeline once and return the reading that was forwarded.
///
/// The LibreLinkUp session is dropped when this returns, on success and on
/// every error path.
pub async fn run(config: &Config) -> Result<Reading, RelayError> {
    if let Some(account_id) = &config.account_id {
        info!(account_id = %account_id, connection_id = %config.connection_id, "Starting relay");
    } else {
        info!(connection_id = %config.connection_id, "Starting relay");
    }

    let client = LibreClient::new(config.base_url.clone(), config.timeout)?
        .with_identity(config.identity.clone());
    let session = client.login(&config.credentials).await?;

    let (latest, reading) = fetch_latest(&session, config).await?;

    match latest.recorded_at() {
        Some(at) => info!(recorded_at = %at, value = %reading.value, trend = %reading.trend, "{}", latest),
        None => {
            warn!(timestamp = %latest.timestamp, "Unrecognised timestamp format");
            info!(value = %reading.value, trend = %reading.trend, "{}", latest);
        }
    }

    let notifier = Notifier::new(config.destination.clone(), config.timeout)?;
    notifier.send(&reading).await?;
    info!(destination = %config.destination, "Reading relayed");

    Ok(reading)
}
