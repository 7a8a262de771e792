//! Two-stage export pipeline: fetch, then encode.

use crate::{JobEvent, JobId, ProgressReporter};
use bytes::Bytes;
use geoport_fetch::progress::{CONNECTING, DOWNLOAD_END, UNKNOWN_LENGTH};
use geoport_fetch::{FeatureClient, FetchConfig};
use geoport_format::encode_collection;
use geoport_types::{ExportError, ExportFormat, FeatureCollection, JobRequest};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Terminal message of a successful export.
pub const COMPLETED_MESSAGE: &str = "Export completed successfully";

/// Progress at which the encode stage starts.
const ENCODE_START: u8 = UNKNOWN_LENGTH;

/// The encoded result of a successful export.
#[derive(Debug, Clone)]
struct Artifact {
    payload: Bytes,
    truncated_at: Option<u32>,
}

/// Runs export jobs.
///
/// Cancellation is checked after the fetch returns and after the encode
/// returns; an in-flight download is not interrupted.
#[derive(Debug, Clone)]
pub struct JobExecutor {
    client: FeatureClient,
}

impl JobExecutor {
    /// Creates an executor that fetches with the given client.
    #[must_use]
    pub const fn new(client: FeatureClient) -> Self {
        Self { client }
    }

    /// Returns the fetch configuration.
    #[must_use]
    pub const fn fetch_config(&self) -> &FetchConfig {
        self.client.config()
    }

    /// Runs one job to completion, sending its events to `events`.
    ///
    /// Exactly one terminal event is sent, after every progress event.
    pub async fn run(
        &self,
        job_id: JobId,
        request: &JobRequest,
        cancel: &CancellationToken,
        events: UnboundedSender<JobEvent>,
    ) {
        let mut reporter = ProgressReporter::new(job_id, events);

        match self.execute(request, cancel, &mut reporter).await {
            Ok(artifact) => {
                let message = match artifact.truncated_at {
                    Some(limit) => {
                        tracing::warn!(
                            job_id,
                            layer = request.layer(),
                            limit,
                            "Feature limit reached; export may be truncated"
                        );
                        format!(
                            "{COMPLETED_MESSAGE} (feature limit of {limit} reached; output may be truncated)"
                        )
                    }
                    None => COMPLETED_MESSAGE.to_string(),
                };
                tracing::info!(
                    job_id,
                    layer = request.layer(),
                    bytes = artifact.payload.len(),
                    "Export completed"
                );
                reporter.complete(artifact.payload, request.filename(), message);
            }
            Err(err) => {
                if err.is_cancelled() {
                    tracing::warn!(job_id, layer = request.layer(), "Export cancelled");
                } else {
                    tracing::warn!(job_id, layer = request.layer(), error = %err, "Export failed");
                }
                reporter.fail(err.to_string());
            }
        }
    }

    async fn execute(
        &self,
        request: &JobRequest,
        cancel: &CancellationToken,
        reporter: &mut ProgressReporter,
    ) -> Result<Artifact, ExportError> {
        reporter.report(CONNECTING, "Connecting to feature service");

        let body = self
            .client
            .fetch_bytes(request.endpoint(), request.layer(), |percent| {
                reporter.report(percent, "Downloading layer data");
            })
            .await?;

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        reporter.report(DOWNLOAD_END, "Parsing feature data");
        let collection = decode_blocking(body).await?;

        let max_features = self.client.config().max_features;
        let truncated_at = (max_features > 0 && collection.len() >= max_features as usize)
            .then_some(max_features);

        let payload = match request.format() {
            ExportFormat::Raw => encode_raw(&collection)?,
            format => {
                reporter.report(ENCODE_START, &format!("Converting to {}", format.label()));
                encode_blocking(format, request.layer().to_string(), collection).await?
            }
        };

        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        Ok(Artifact {
            payload,
            truncated_at,
        })
    }
}

async fn decode_blocking(body: Bytes) -> Result<FeatureCollection, ExportError> {
    match tokio::task::spawn_blocking(move || FeatureCollection::from_slice(&body)).await {
        Ok(decoded) => decoded.map_err(ExportError::from),
        Err(join) => Err(ExportError::DecodeFailed(join.to_string())),
    }
}

fn encode_raw(collection: &FeatureCollection) -> Result<Bytes, ExportError> {
    collection
        .to_vec()
        .map(Bytes::from)
        .map_err(|err| ExportError::EncodeFailed {
            format: ExportFormat::Raw,
            cause: err.to_string(),
        })
}

/// Encodes on the blocking pool so large archives do not stall other jobs.
async fn encode_blocking(
    format: ExportFormat,
    layer: String,
    collection: FeatureCollection,
) -> Result<Bytes, ExportError> {
    let encoded =
        tokio::task::spawn_blocking(move || encode_collection(format, &layer, &collection)).await;

    match encoded {
        Ok(Ok(bytes)) => Ok(Bytes::from(bytes)),
        Ok(Err(err)) => Err(ExportError::EncodeFailed {
            format,
            cause: err.to_string(),
        }),
        Err(join) => Err(ExportError::EncodeFailed {
            format,
            cause: join.to_string(),
        }),
    }
}
