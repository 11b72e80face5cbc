use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::api::{self, RiskSource};
use crate::state::{Delta, ProviderCommand};

/// Runs fetch commands against `source` until the command channel closes.
/// Every command becomes an independent job, so results come back in
/// completion order rather than request order.
pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    source: Arc<dyn RiskSource>,
    parallelism: usize,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let pool = build_fetch_pool(parallelism);
        tracing::info!(source = source.label(), parallelism, "provider started");

        for cmd in cmd_rx {
            let tx = tx.clone();
            let source = Arc::clone(&source);
            let job = move || run_command(cmd, source.as_ref(), &tx);

            if let Some(pool) = pool.as_ref() {
                pool.spawn(job);
            } else {
                thread::spawn(job);
            }
        }
        tracing::info!("provider stopped");
    })
}

pub fn run_command(cmd: ProviderCommand, source: &dyn RiskSource, tx: &Sender<Delta>) {
    match cmd {
        ProviderCommand::LoadDirectory => match source.club_names() {
            Ok(names) => {
                let _ = tx.send(Delta::DirectoryLoaded(names));
            }
            Err(err) => {
                let detail = format!("{err:#}");
                tracing::warn!(error = %detail, "club directory fetch failed");
                let _ = tx.send(Delta::DirectoryFailed(err.to_string()));
            }
        },
        ProviderCommand::FetchClubRisk { name, ticket } => {
            match api::assess_one(source, &name) {
                Ok(record) => {
                    let _ = tx.send(Delta::ClubRiskLoaded {
                        name,
                        ticket,
                        record,
                    });
                }
                Err(err) => {
                    let detail = format!("{err:#}");
                    tracing::warn!(club = %name, error = %detail, "club risk fetch failed");
                    let _ = tx.send(Delta::ClubRiskFailed {
                        name,
                        ticket,
                        error: err.to_string(),
                    });
                }
            }
        }
        ProviderCommand::FetchBatchRisk { names, ticket } => match source.assess(&names) {
            Ok(records) => {
                let _ = tx.send(Delta::BatchLoaded { ticket, records });
            }
            Err(err) => {
                let detail = format!("{err:#}");
                tracing::warn!(clubs = names.len(), error = %detail, "risk assessment failed");
                let _ = tx.send(Delta::BatchFailed {
                    ticket,
                    error: err.to_string(),
                });
            }
        },
    }
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|idx| format!("clubrisk-fetch-{idx}"))
        .build()
        .ok()
}
