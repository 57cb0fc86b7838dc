use once_cell::sync::Lazy;
use regex::Regex;

static RAW_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5,25}$").expect("raw id regex"));

static PROFILE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/users/(?:show|profile)/(\d+)").expect("profile path regex"));

/// Normalizes a host reference into its canonical decimal identifier.
///
/// Accepts a bare numeric id (`12345678`), a profile URL
/// (`https://www.airbnb.com/users/show/12345678?locale=en`), or the
/// `/users/profile/<id>` variant. Anything else, including unparseable
/// URLs, resolves to `None`.
pub fn resolve_host_reference(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if RAW_ID.is_match(trimmed) {
        return Some(trimmed.to_string());
    }
    let url = reqwest::Url::parse(trimmed).ok()?;
    PROFILE_PATH
        .captures(url.path())
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_numeric_id_passes_through() {
        assert_eq!(
            resolve_host_reference("12345678"),
            Some("12345678".to_string())
        );
        assert_eq!(
            resolve_host_reference("  12345678  "),
            Some("12345678".to_string())
        );
    }

    #[test]
    fn numeric_id_length_bounds() {
        assert_eq!(resolve_host_reference("1234"), None);
        assert_eq!(
            resolve_host_reference("12345"),
            Some("12345".to_string())
        );
        let too_long = "1".repeat(26);
        assert_eq!(resolve_host_reference(&too_long), None);
    }

    #[test]
    fn show_url_extracts_id() {
        assert_eq!(
            resolve_host_reference("https://www.airbnb.com/users/show/123"),
            Some("123".to_string())
        );
        assert_eq!(
            resolve_host_reference("https://fr.airbnb.ca/users/show/12345678?locale=fr"),
            Some("12345678".to_string())
        );
    }

    #[test]
    fn profile_url_extracts_id() {
        assert_eq!(
            resolve_host_reference("https://fr.airbnb.ca/users/profile/1470630909781985417"),
            Some("1470630909781985417".to_string())
        );
    }

    #[test]
    fn query_digits_do_not_match() {
        // The pattern only applies to the path component.
        assert_eq!(
            resolve_host_reference("https://www.airbnb.com/search?user=/users/show/999"),
            None
        );
    }

    #[test]
    fn garbage_resolves_to_none() {
        assert_eq!(resolve_host_reference(""), None);
        assert_eq!(resolve_host_reference("not a url"), None);
        assert_eq!(
            resolve_host_reference("https://www.airbnb.com/rooms/555555"),
            None
        );
    }
}
