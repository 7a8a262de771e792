//! Export command implementation.
//!
//! Submits one job per layer, renders each job's progress, and saves
//! completed artifacts to the output directory.

use crate::display::{format_bytes, job_bar, multi_progress};
use anyhow::{Context, Result};
use geoport_lib::prelude::*;
use geoport_lib::COMPLETED_MESSAGE;
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments of the export command.
pub(crate) struct ExportArgs {
    pub(crate) layers: Vec<String>,
    pub(crate) endpoint: String,
    pub(crate) format: ExportFormat,
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) max_features: u32,
    pub(crate) timeout: u64,
}

impl ExportArgs {
    fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            fetch: FetchConfig {
                timeout: Duration::from_secs(self.timeout),
                max_features: self.max_features,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Outcome of one job as shown in the summary.
enum Outcome {
    Saved { layer: String, path: PathBuf },
    Failed { layer: String, message: String },
}

/// Execute the export command.
pub(crate) async fn export(args: ExportArgs, quiet: bool) -> Result<()> {
    // Validate every request before starting any work
    let requests = args
        .layers
        .iter()
        .map(|layer| {
            JobRequest::new(layer.as_str(), args.format, &args.endpoint)
                .with_context(|| format!("Invalid export request for layer '{layer}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let sink = match &args.output_dir {
        Some(dir) => DirectorySink::new(dir.clone()),
        None => DirectorySink::with_default_dir(),
    }
    .context("Failed to prepare output directory")?;

    let mut manager =
        JobManager::new(args.manager_config()).context("Failed to initialize job manager")?;
    let multi = multi_progress(quiet);
    let mut bars: HashMap<JobId, ProgressBar> = HashMap::new();

    for request in requests {
        let layer = request.layer().to_string();
        let id = manager.submit(request);
        bars.insert(id, job_bar(&multi, &layer)?);
    }

    let mut outcomes = Vec::with_capacity(bars.len());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            signal = &mut ctrl_c, if !interrupted => {
                signal.context("Failed to listen for Ctrl-C")?;
                interrupted = true;
                tracing::warn!("Interrupted; cancelling running exports");
                // In-flight downloads run to completion before their jobs stop.
                let _ = multi.println("Cancelling exports...");
                manager.cancel_all();
            }
            update = manager.next_update() => {
                let Some(event) = update else {
                    break;
                };
                if let Some(outcome) = handle_event(&manager, &sink, &bars, event) {
                    outcomes.push(outcome);
                }
            }
        }
    }

    let failed = summarize(&outcomes, quiet);
    if failed > 0 {
        anyhow::bail!("{failed} out of {} exports failed", outcomes.len());
    }
    Ok(())
}

fn handle_event(
    manager: &JobManager,
    sink: &DirectorySink,
    bars: &HashMap<JobId, ProgressBar>,
    event: JobEvent,
) -> Option<Outcome> {
    let id = event.job_id();
    let bar = bars.get(&id)?;
    let layer = manager
        .get(id)
        .map_or_else(|| id.to_string(), |job| job.request.layer().to_string());

    match event {
        JobEvent::Progress {
            percent, message, ..
        } => {
            bar.set_position(u64::from(percent));
            bar.set_message(message);
            None
        }
        JobEvent::Completed {
            payload,
            filename,
            message,
            ..
        } => match sink.save(&filename, &payload) {
            Ok(path) => {
                bar.set_position(100);
                bar.finish_with_message(format!(
                    "{} ({})",
                    path.display(),
                    format_bytes(payload.len() as u64)
                ));
                if message != COMPLETED_MESSAGE {
                    let _ = bar.println(format!("  {layer}: {message}"));
                }
                Some(Outcome::Saved { layer, path })
            }
            Err(err) => {
                bar.abandon_with_message("save failed");
                Some(Outcome::Failed {
                    layer,
                    message: err.to_string(),
                })
            }
        },
        JobEvent::Failed { message, .. } => {
            bar.abandon_with_message(message.clone());
            Some(Outcome::Failed { layer, message })
        }
    }
}

/// Prints the summary and returns the number of failed jobs.
fn summarize(outcomes: &[Outcome], quiet: bool) -> usize {
    let failures: Vec<_> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Outcome::Failed { layer, message } => Some((layer, message)),
            Outcome::Saved { .. } => None,
        })
        .collect();

    if !quiet {
        println!("\nExport complete:");
        println!("  Saved: {}", outcomes.len() - failures.len());
        for outcome in outcomes {
            if let Outcome::Saved { layer, path } = outcome {
                println!("    {layer}: {}", path.display());
            }
        }
        if !failures.is_empty() {
            println!("  Failed: {}", failures.len());
            for (layer, message) in &failures {
                println!("    {layer}: {message}");
            }
        }
    }

    failures.len()
}
