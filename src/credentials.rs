use crate::airbnb::{CredentialBundle, MarketplaceApi};
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Acquires the platform credential bundle at most once per run.
///
/// A failed acquisition is cached as an explicit empty bundle rather than
/// retried: downstream endpoints may still answer with partial credentials,
/// and re-acquiring per listing would multiply network cost.
#[derive(Debug, Default)]
pub struct CredentialProvider {
    cell: OnceCell<CredentialBundle>,
}

impl CredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<A: MarketplaceApi>(&self, api: &A) -> &CredentialBundle {
        self.cell
            .get_or_init(|| async {
                match api.acquire_credentials().await {
                    Ok(bundle) => {
                        info!(target = "harvester.credentials", "api credentials acquired");
                        bundle
                    }
                    Err(err) => {
                        warn!(
                            target = "harvester.credentials",
                            error = %err,
                            "credential acquisition failed, continuing with empty bundle"
                        );
                        CredentialBundle::empty()
                    }
                }
            })
            .await
    }
}
