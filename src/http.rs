use crate::config::PROXY_URL;
use reqwest::Client;
use std::time::Duration;

pub fn build_client() -> Client {
    let timeout = std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(30);
    let connect = std::env::var("HTTP_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(5);
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeout))
        .connect_timeout(Duration::from_secs(connect))
        .cookie_store(true);
    if !PROXY_URL.is_empty()
        && let Ok(proxy) = reqwest::Proxy::all(PROXY_URL.as_str())
    {
        builder = builder.proxy(proxy);
    }
    builder.build().unwrap_or_else(|_| Client::new())
}
