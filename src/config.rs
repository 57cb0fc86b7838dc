use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub static LANGUAGE: Lazy<String> =
    Lazy::new(|| env::var("HARVEST_LANGUAGE").unwrap_or_else(|_| "en".to_string()));

pub static CURRENCY: Lazy<String> =
    Lazy::new(|| env::var("HARVEST_CURRENCY").unwrap_or_else(|_| "AED".to_string()));

pub static PROXY_URL: Lazy<String> = Lazy::new(|| env::var("PROXY_URL").unwrap_or_default());

pub static PLATFORM_ROOT: Lazy<String> =
    Lazy::new(|| env::var("PLATFORM_ROOT").unwrap_or_else(|_| "https://www.airbnb.com".to_string()));

pub static CSV_FILE: Lazy<String> =
    Lazy::new(|| env::var("OUTPUT_CSV").unwrap_or_else(|_| "host_listings.csv".to_string()));

pub static PROCESSED_IDS_FILE: Lazy<String> =
    Lazy::new(|| env::var("PROCESSED_IDS_FILE").unwrap_or_else(|_| "processed_ids.txt".to_string()));

/// Pause between successfully processed listings, throttling the upstream.
pub fn detail_delay() -> Duration {
    let secs = env::var("DELAY_BETWEEN_DETAILS")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| *v >= 0.0)
        .unwrap_or(1.0);
    Duration::from_secs_f64(secs)
}

pub fn listing_url(room_id: &str) -> String {
    format!("{}/rooms/{room_id}", *PLATFORM_ROOT)
}

pub fn host_profile_url(host_id: &str) -> String {
    if host_id.is_empty() {
        String::new()
    } else {
        format!("{}/users/show/{host_id}", *PLATFORM_ROOT)
    }
}
