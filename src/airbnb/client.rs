use crate::airbnb::{ApiError, CredentialBundle, MarketplaceApi};
use crate::config::{CURRENCY, LANGUAGE, PLATFORM_ROOT};
use crate::http::build_client;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, StatusCode, header::SET_COOKIE};
use serde_json::{Value, json};
use urlencoding::encode;

// The key ships embedded in the landing page bootstrap payload.
static API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""api_config":\{"key":"([^"]+)""#).expect("api key regex"));

#[derive(Debug, Clone)]
pub struct AirbnbClient {
    http: Client,
}

impl AirbnbClient {
    pub fn new() -> Self {
        Self {
            http: build_client(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", *PLATFORM_ROOT)
    }
}

impl Default for AirbnbClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketplaceApi for AirbnbClient {
    async fn acquire_credentials(&self) -> Result<CredentialBundle, ApiError> {
        let response = self
            .http
            .get(PLATFORM_ROOT.as_str())
            .send()
            .await
            .map_err(|err| ApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ApiError::Request(format!("HTTP {}", response.status())));
        }

        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|raw| {
                let pair = raw.split(';').next()?;
                let (name, value) = pair.split_once('=')?;
                Some((name.trim().to_string(), value.trim().to_string()))
            })
            .collect::<Vec<_>>();

        let body = response
            .text()
            .await
            .map_err(|err| ApiError::Request(err.to_string()))?;
        let api_key = API_KEY_RE
            .captures(&body)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| ApiError::Deserialize("api key not present in landing page".into()))?;

        Ok(CredentialBundle { api_key, cookies })
    }

    async fn fetch_listing_detail(&self, room_id: &str) -> Result<Option<Value>, ApiError> {
        let url = format!(
            "{}?format=v1_legacy_for_p3&locale={}&currency={}",
            self.api_url(&format!("/api/v1/listings/{}", encode(room_id))),
            encode(&LANGUAGE),
            encode(&CURRENCY),
        );
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::Request(err.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Request(format!("HTTP {status}")));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| ApiError::Deserialize(err.to_string()))?;
        let Some(listing) = payload.get("listing").filter(|v| v.is_object()) else {
            return Ok(None);
        };

        // Flatten to the shape the extractor reads.
        Ok(Some(json!({
            "title": listing.get("name").cloned().unwrap_or(Value::String(String::new())),
            "description": listing
                .get("description")
                .cloned()
                .unwrap_or(Value::String(String::new())),
            "host": listing.get("primary_host").cloned().unwrap_or_else(|| json!({})),
        })))
    }

    async fn fetch_host_detail(
        &self,
        credentials: &CredentialBundle,
        host_id: &str,
    ) -> Result<Value, ApiError> {
        let global_id = BASE64.encode(format!("User:{host_id}"));
        let variables = json!({
            "userId": global_id,
            "isPassportStampsEnabled": false,
        });
        let url = format!(
            "{}?operationName=GetUserProfile&locale={}&variables={}",
            self.api_url("/api/v3/GetUserProfile"),
            encode(&LANGUAGE),
            encode(&variables.to_string()),
        );
        let mut request = self.http.get(url);
        if !credentials.api_key.is_empty() {
            request = request.header("x-airbnb-api-key", &credentials.api_key);
        }
        if let Some(cookie_header) = cookie_header(credentials) {
            request = request.header(reqwest::header::COOKIE, cookie_header);
        }
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ApiError::Request(format!("HTTP {}", response.status())));
        }
        response
            .json()
            .await
            .map_err(|err| ApiError::Deserialize(err.to_string()))
    }

    async fn fetch_user_listings(
        &self,
        host_id: &str,
        credentials: &CredentialBundle,
    ) -> Result<Vec<Value>, ApiError> {
        let mut url = format!(
            "{}?user_id={}&locale={}&currency={}",
            self.api_url("/api/v2/user_promo_listings"),
            encode(host_id),
            encode(&LANGUAGE),
            encode(&CURRENCY),
        );
        if !credentials.api_key.is_empty() {
            url.push_str(&format!("&key={}", encode(&credentials.api_key)));
        }
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(ApiError::Request(format!("HTTP {}", response.status())));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|err| ApiError::Deserialize(err.to_string()))?;
        Ok(payload
            .get("user_promo_listings")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

fn cookie_header(credentials: &CredentialBundle) -> Option<String> {
    if credentials.cookies.is_empty() {
        return None;
    }
    Some(
        credentials
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
