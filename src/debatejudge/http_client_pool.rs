//! HTTP Client Pool for maintaining persistent connections.
//!
//! Debates send many sequential messages to the same two agent endpoints, and
//! every judge call goes to the same completion endpoint. Each distinct
//! (base URL, request timeout) pair gets one configured `reqwest::Client`
//! that is reused across runs, avoiding DNS/TLS churn between turns.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global cache of HTTP clients indexed by base URL and timeout.
    static ref CLIENT_POOL: Mutex<HashMap<(String, Duration), reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Creates or retrieves a shared HTTP client for the given base URL.
///
/// The client is configured with:
/// - Connection pooling with up to 10 idle connections per host
/// - 90-second idle timeout for persistent connections
/// - TCP keepalive every 60 seconds
/// - 30-second connection timeout
/// - `timeout` as the overall per-request deadline
pub fn get_or_create_client(
    base_url: &str,
    timeout: Duration,
) -> Result<reqwest::Client, reqwest::Error> {
    let key = (base_url.to_string(), timeout);
    let mut pool = CLIENT_POOL
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(client) = pool.get(&key) {
        return Ok(client.clone());
    }

    let client = create_pooled_client(timeout)?;
    pool.insert(key, client.clone());
    Ok(client)
}

/// Number of distinct clients currently pooled.
pub fn pooled_client_count() -> usize {
    CLIENT_POOL
        .lock()
        .map(|pool| pool.len())
        .unwrap_or_else(|poisoned| poisoned.into_inner().len())
}

fn create_pooled_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(base_url: &str, timeout: Duration) -> bool {
        CLIENT_POOL
            .lock()
            .unwrap()
            .contains_key(&(base_url.to_string(), timeout))
    }

    #[test]
    fn test_client_pool_reuses_entry_per_url() {
        let url = "https://pro-debater.pool-test.example";
        let timeout = Duration::from_secs(300);
        get_or_create_client(url, timeout).unwrap();
        assert!(contains(url, timeout));

        // Repeated lookups must not add entries for the same key
        let before = pooled_client_count();
        for _ in 0..5 {
            get_or_create_client(url, timeout).unwrap();
        }
        // Other tests may add entries concurrently, never remove them
        assert!(pooled_client_count() >= before);
        assert!(contains(url, timeout));
    }

    #[test]
    fn test_distinct_timeouts_get_distinct_clients() {
        let url = "https://judge.pool-test.example";
        get_or_create_client(url, Duration::from_secs(10)).unwrap();
        get_or_create_client(url, Duration::from_secs(20)).unwrap();

        assert!(contains(url, Duration::from_secs(10)));
        assert!(contains(url, Duration::from_secs(20)));
    }
}
