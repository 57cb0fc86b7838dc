use crate::airbnb::{CredentialBundle, MarketplaceApi};
use crate::credentials::CredentialProvider;
use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Host fields derived once per host per run. Missing upstream data leaves
/// string fields empty and counts at zero; it never blocks listing output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostProfile {
    pub name: String,
    pub rating: String,
    pub reviews_count: String,
    pub joined_year: String,
    pub years_active: String,
    pub total_listings: u32,
}

/// Outcome of a best-effort enrichment lookup. `Degraded` carries the
/// defaults that stand in for the missing data plus the reason, so callers
/// log the cause instead of inferring it from empty fields.
#[derive(Debug)]
pub enum Enrichment<T> {
    Fresh(T),
    Degraded { value: T, reason: String },
}

impl<T> Enrichment<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Enrichment::Degraded { .. })
    }

    pub fn into_value(self) -> T {
        match self {
            Enrichment::Fresh(value) => value,
            Enrichment::Degraded { value, .. } => value,
        }
    }
}

#[derive(Debug, Default)]
pub struct HostProfileCache {
    entries: HashMap<String, HostProfile>,
}

impl HostProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the profile for `host_id`, fetching and caching it on first
    /// reference. An empty id short-circuits to the default profile with no
    /// network call and no cache entry.
    pub async fn get<A: MarketplaceApi>(
        &mut self,
        api: &A,
        credentials: &CredentialProvider,
        host_id: &str,
    ) -> HostProfile {
        if host_id.is_empty() {
            return HostProfile::default();
        }
        if let Some(hit) = self.entries.get(host_id) {
            return hit.clone();
        }
        let bundle = credentials.get(api).await;
        let profile = match fetch_profile(api, bundle, host_id, Utc::now().year()).await {
            Enrichment::Fresh(profile) => profile,
            Enrichment::Degraded { value, reason } => {
                warn!(
                    target = "harvester.host",
                    host_id,
                    reason = %reason,
                    "host profile degraded to defaults"
                );
                value
            }
        };
        self.entries.insert(host_id.to_string(), profile.clone());
        profile
    }
}

/// Fetches host detail and the host's listing count, deriving the profile
/// fields. Exposed with an explicit `current_year` so the years-active
/// computation is testable against a pinned calendar.
pub async fn fetch_profile<A: MarketplaceApi>(
    api: &A,
    credentials: &CredentialBundle,
    host_id: &str,
    current_year: i32,
) -> Enrichment<HostProfile> {
    let payload = match api.fetch_host_detail(credentials, host_id).await {
        Ok(payload) => payload,
        Err(err) => {
            return Enrichment::Degraded {
                value: HostProfile::default(),
                reason: format!("host detail fetch failed: {err}"),
            };
        }
    };

    let total_listings = match api.fetch_user_listings(host_id, credentials).await {
        Ok(items) => items.len() as u32,
        Err(_) => 0,
    };

    if !payload.is_object() || payload.get("errors").is_some() {
        return Enrichment::Degraded {
            value: HostProfile {
                total_listings,
                ..HostProfile::default()
            },
            reason: "error-shaped host detail payload".into(),
        };
    }

    Enrichment::Fresh(profile_from_payload(&payload, total_listings, current_year))
}

fn profile_from_payload(payload: &Value, total_listings: u32, current_year: i32) -> HostProfile {
    let data = &payload["data"];
    let rating = display_value(&data["node"]["hostRatingStats"]["ratingAverage"]);

    let user_profile = &data["presentation"]["userProfileContainer"]["userProfile"];
    let name = user_profile["smartName"]
        .as_str()
        .filter(|s| !s.is_empty())
        .or_else(|| user_profile["displayFirstName"].as_str())
        .unwrap_or_default()
        .to_string();
    let reviews_count = display_value(&user_profile["reviewsReceivedFromGuests"]["count"]);

    let (joined_year, years_active) = user_profile["createdAt"]
        .as_str()
        .and_then(|created_at| joined_years(created_at, current_year))
        .map(|(joined, active)| (joined.to_string(), active.to_string()))
        .unwrap_or_default();

    HostProfile {
        name,
        rating,
        reviews_count,
        joined_year,
        years_active,
        total_listings,
    }
}

/// Joined year from an ISO-8601 timestamp, plus years active relative to
/// `current_year`. `None` when the timestamp does not parse.
fn joined_years(created_at: &str, current_year: i32) -> Option<(i32, i32)> {
    let created: DateTime<chrono::FixedOffset> = DateTime::parse_from_rfc3339(created_at).ok()?;
    let joined = created.year();
    Some((joined, current_year - joined))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airbnb::ApiError;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn host_payload(created_at: &str) -> Value {
        json!({
            "data": {
                "node": {
                    "hostRatingStats": { "ratingAverage": 4.87 }
                },
                "presentation": {
                    "userProfileContainer": {
                        "userProfile": {
                            "smartName": "Amira",
                            "displayFirstName": "A.",
                            "reviewsReceivedFromGuests": { "count": 152 },
                            "createdAt": created_at,
                        }
                    }
                }
            }
        })
    }

    struct StubApi {
        detail: Result<Value, String>,
        listings: Result<Vec<Value>, String>,
        detail_calls: AtomicU32,
    }

    impl StubApi {
        fn new(detail: Result<Value, String>, listings: Result<Vec<Value>, String>) -> Self {
            Self {
                detail,
                listings,
                detail_calls: AtomicU32::new(0),
            }
        }
    }

    impl MarketplaceApi for StubApi {
        async fn acquire_credentials(&self) -> Result<CredentialBundle, ApiError> {
            Ok(CredentialBundle::empty())
        }

        async fn fetch_listing_detail(&self, _: &str) -> Result<Option<Value>, ApiError> {
            unreachable!("not used in host tests")
        }

        async fn fetch_host_detail(
            &self,
            _: &CredentialBundle,
            _: &str,
        ) -> Result<Value, ApiError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            self.detail
                .clone()
                .map_err(ApiError::Request)
        }

        async fn fetch_user_listings(
            &self,
            _: &str,
            _: &CredentialBundle,
        ) -> Result<Vec<Value>, ApiError> {
            self.listings.clone().map_err(ApiError::Request)
        }
    }

    #[tokio::test]
    async fn derives_profile_fields_with_pinned_year() {
        let api = StubApi::new(
            Ok(host_payload("2020-01-01T00:00:00Z")),
            Ok(vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]),
        );
        let enriched = fetch_profile(&api, &CredentialBundle::empty(), "777777", 2024).await;
        assert!(!enriched.is_degraded());
        let profile = enriched.into_value();
        assert_eq!(profile.name, "Amira");
        assert_eq!(profile.rating, "4.87");
        assert_eq!(profile.reviews_count, "152");
        assert_eq!(profile.joined_year, "2020");
        assert_eq!(profile.years_active, "4");
        assert_eq!(profile.total_listings, 3);
    }

    #[tokio::test]
    async fn malformed_timestamp_leaves_year_fields_empty() {
        let api = StubApi::new(Ok(host_payload("not-a-date")), Ok(vec![]));
        let profile = fetch_profile(&api, &CredentialBundle::empty(), "777777", 2024)
            .await
            .into_value();
        assert_eq!(profile.joined_year, "");
        assert_eq!(profile.years_active, "");
        assert_eq!(profile.name, "Amira");
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_defaults() {
        let api = StubApi::new(Err("timeout".into()), Ok(vec![json!({"id": 1})]));
        let enriched = fetch_profile(&api, &CredentialBundle::empty(), "777777", 2024).await;
        assert!(enriched.is_degraded());
        assert_eq!(enriched.into_value(), HostProfile::default());
    }

    #[tokio::test]
    async fn error_shaped_payload_keeps_listing_count() {
        let api = StubApi::new(
            Ok(json!({"errors": [{"message": "denied"}]})),
            Ok(vec![json!({"id": 1}), json!({"id": 2})]),
        );
        let enriched = fetch_profile(&api, &CredentialBundle::empty(), "777777", 2024).await;
        assert!(enriched.is_degraded());
        let profile = enriched.into_value();
        assert_eq!(profile.name, "");
        assert_eq!(profile.total_listings, 2);
    }

    #[tokio::test]
    async fn listings_failure_counts_zero() {
        let api = StubApi::new(Ok(host_payload("2019-06-01T12:00:00Z")), Err("503".into()));
        let profile = fetch_profile(&api, &CredentialBundle::empty(), "777777", 2024)
            .await
            .into_value();
        assert_eq!(profile.total_listings, 0);
        assert_eq!(profile.joined_year, "2019");
    }

    #[tokio::test]
    async fn cache_fetches_once_per_host() {
        let api = StubApi::new(Ok(host_payload("2020-01-01T00:00:00Z")), Ok(vec![]));
        let credentials = CredentialProvider::new();
        let mut cache = HostProfileCache::new();
        let first = cache.get(&api, &credentials, "777777").await;
        let second = cache.get(&api, &credentials, "777777").await;
        assert_eq!(first, second);
        assert_eq!(api.detail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_host_id_short_circuits() {
        let api = StubApi::new(Err("must not be called".into()), Err("same".into()));
        let credentials = CredentialProvider::new();
        let mut cache = HostProfileCache::new();
        let profile = cache.get(&api, &credentials, "").await;
        assert_eq!(profile, HostProfile::default());
        assert_eq!(api.detail_calls.load(Ordering::SeqCst), 0);
    }
}
