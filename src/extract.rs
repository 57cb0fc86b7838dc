use crate::config;
use crate::export::ListingRecord;
use crate::host::HostProfile;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));

static LICENSE_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:Registration\s+Details?|Registration\s+(?:Number|No\.?|Code)|License\s+(?:Number|No\.?|Code)|Permit\s+(?:Number|No\.?))[:\s]*([^,\n]+)",
    )
    .expect("license regex")
});

/// Pulls a registration/permit code out of a listing's free-text
/// description. Tags are stripped first so codes inside markup still match.
/// No match is an empty string, not an error.
pub fn extract_license_code(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let cleaned = HTML_TAG.replace_all(text, " ");
    LICENSE_CODE
        .captures(&cleaned)
        .map(|caps| caps[1].split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Host identifier from a detail payload's `host` sub-object, coerced to
/// string. Absent or non-object host data yields an empty string.
pub fn listing_host_id(detail: &Value) -> String {
    detail
        .get("host")
        .filter(|host| host.is_object())
        .and_then(|host| host.get("id"))
        .and_then(id_value)
        .unwrap_or_default()
}

/// Listing identifier from one enumeration item: `room_id`, then `id`, then
/// nested `listing.id`; bare all-digit strings and numbers also count.
pub fn listing_identifier(item: &Value) -> Option<String> {
    if let Some(object) = item.as_object() {
        return object
            .get("room_id")
            .and_then(id_value)
            .or_else(|| object.get("id").and_then(id_value))
            .or_else(|| {
                object
                    .get("listing")
                    .and_then(|listing| listing.get("id"))
                    .and_then(id_value)
            });
    }
    // Some endpoints return bare identifiers instead of listing objects.
    id_value(item).filter(|s| s.chars().all(|ch| ch.is_ascii_digit()))
}

pub fn build_record(
    room_id: &str,
    detail: &Value,
    host_id: &str,
    profile: &HostProfile,
) -> ListingRecord {
    let title = detail
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let description = detail
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    ListingRecord {
        room_id: room_id.to_string(),
        listing_url: config::listing_url(room_id),
        listing_title: title,
        license_code: extract_license_code(description),
        host_id: host_id.to_string(),
        host_name: profile.name.clone(),
        host_profile_url: config::host_profile_url(host_id),
        host_rating: profile.rating.clone(),
        host_reviews_count: profile.reviews_count.clone(),
        host_joined_year: profile.joined_year.clone(),
        host_years_active: profile.years_active.clone(),
        host_total_listings_in_dubai: profile.total_listings,
    }
}

fn id_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
