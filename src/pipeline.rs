use crate::airbnb::MarketplaceApi;
use crate::config;
use crate::credentials::CredentialProvider;
use crate::export::{CsvExporter, ListingRecord};
use crate::extract::{build_record, listing_host_id, listing_identifier};
use crate::host::HostProfileCache;
use crate::identity::resolve_host_reference;
use crate::progress::ProgressStore;
use crate::retry::RetryPolicy;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not resolve a host id from `{0}`")]
    UnresolvedHost(String),
    #[error("progress log access failed: {0}")]
    Progress(#[from] std::io::Error),
    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestReport {
    pub discovered: usize,
    pub already_processed: usize,
    pub written: usize,
}

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub csv_path: PathBuf,
    pub progress_path: PathBuf,
    pub detail_delay: Duration,
    pub retry: RetryPolicy,
}

impl HarvestOptions {
    pub fn from_env() -> Self {
        Self {
            csv_path: PathBuf::from(config::CSV_FILE.as_str()),
            progress_path: PathBuf::from(config::PROCESSED_IDS_FILE.as_str()),
            detail_delay: config::detail_delay(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Sequential harvest of one host's catalog: resolve the host reference,
/// enumerate room ids, skip everything already in the progress log, fetch
/// and extract the rest, then write the full export.
///
/// Upstream failures degrade per listing or per field; only an unresolvable
/// host reference or a local I/O failure aborts the run.
pub struct HarvestPipeline<A> {
    api: A,
    retry: RetryPolicy,
    detail_delay: Duration,
    credentials: CredentialProvider,
    host_cache: HostProfileCache,
    progress: ProgressStore,
    exporter: CsvExporter,
}

impl<A: MarketplaceApi> HarvestPipeline<A> {
    pub fn new(api: A, options: HarvestOptions) -> Self {
        Self {
            api,
            retry: options.retry,
            detail_delay: options.detail_delay,
            credentials: CredentialProvider::new(),
            host_cache: HostProfileCache::new(),
            progress: ProgressStore::new(options.progress_path),
            exporter: CsvExporter::new(options.csv_path),
        }
    }

    pub async fn run(&mut self, host_reference: &str) -> Result<HarvestReport, PipelineError> {
        // The export artifact must exist even when the run stops early.
        self.exporter.write(&[])?;

        let Some(host_id) = resolve_host_reference(host_reference) else {
            return Err(PipelineError::UnresolvedHost(
                host_reference.trim().to_string(),
            ));
        };
        info!(
            target = "harvester.pipeline",
            host_id = %host_id,
            host_reference,
            "starting harvest"
        );

        let processed = self.progress.load()?;
        let room_ids = self.enumerate_rooms(&host_id).await;
        let remaining: Vec<String> = room_ids
            .iter()
            .filter(|id| !processed.contains(id.as_str()))
            .cloned()
            .collect();
        info!(
            target = "harvester.pipeline",
            discovered = room_ids.len(),
            already_processed = room_ids.len() - remaining.len(),
            remaining = remaining.len(),
            "enumeration complete"
        );

        let mut records = Vec::new();
        let total = remaining.len();
        for (idx, room_id) in remaining.iter().enumerate() {
            if let Some(record) = self.process_listing(room_id).await {
                info!(
                    target = "harvester.pipeline",
                    position = idx + 1,
                    total,
                    room_id,
                    title = %record.listing_title,
                    "listing captured"
                );
                records.push(record);
                // Durable before the next listing starts; a crash from here
                // on never reprocesses this id.
                self.progress.record(room_id)?;
            }
            sleep(self.detail_delay).await;
        }

        self.exporter.write(&records)?;
        let report = HarvestReport {
            discovered: room_ids.len(),
            already_processed: room_ids.len() - remaining.len(),
            written: records.len(),
        };
        info!(
            target = "harvester.pipeline",
            written = report.written,
            csv = %self.exporter.path().display(),
            "harvest complete"
        );
        Ok(report)
    }

    /// Room ids for the host, deduplicated preserving first-seen order.
    /// Enumeration failure degrades to an empty catalog.
    async fn enumerate_rooms(&self, host_id: &str) -> Vec<String> {
        let bundle = self.credentials.get(&self.api).await;
        let items = match self.api.fetch_user_listings(host_id, bundle).await {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    target = "harvester.pipeline",
                    host_id,
                    error = %err,
                    "user listings enumeration failed"
                );
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for item in &items {
            let Some(id) = listing_identifier(item) else {
                continue;
            };
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
        ids
    }

    /// One listing: detail fetch through the retry policy, then extraction
    /// with cached host enrichment. `None` skips the listing without marking
    /// it processed, so the next run retries it.
    async fn process_listing(&mut self, room_id: &str) -> Option<ListingRecord> {
        let retry = self.retry;
        let api = &self.api;
        let detail = match retry.run(move || api.fetch_listing_detail(room_id)).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                warn!(
                    target = "harvester.pipeline",
                    room_id, "empty detail payload, leaving for a future run"
                );
                return None;
            }
            Err(err) => {
                warn!(
                    target = "harvester.pipeline",
                    room_id,
                    error = %err,
                    "detail fetch exhausted retries, leaving for a future run"
                );
                return None;
            }
        };

        let host_id = listing_host_id(&detail);
        let profile = self
            .host_cache
            .get(&self.api, &self.credentials, &host_id)
            .await;
        Some(build_record(room_id, &detail, &host_id, &profile))
    }
}
