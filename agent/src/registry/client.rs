use super::error::RegistryError;
use crate::utils::time::now_iso;
use common::server::config::RegistrySettings;
use common::server::heartbeat::{HeartbeatRecord, NodeStatus};
use log::error;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, ClientBuilder};

/// Remote registry operations the heartbeat engine depends on
pub(crate) trait Registry {
    /// Idempotent last-write-wins upsert keyed on node_id
    async fn upsert(&self, record: &HeartbeatRecord) -> Result<(), RegistryError>;
    /// Flip status and last_seen for an existing key. A missing key is a
    /// server-side no-op, not an error
    async fn mark_offline(&self, node_id: &str) -> Result<(), RegistryError>;
}

pub(crate) struct RegistryClient {
    client: Client,
    /// Fully qualified table endpoint, {url}/rest/v1/{table}
    table_url: String,
}

impl RegistryClient {
    /// Build the REST client and verify the registry answers. Failure here
    /// is a fatal startup condition
    pub(crate) async fn connect(settings: &RegistrySettings) -> Result<Self, RegistryError> {
        let client = match ClientBuilder::new()
            .default_headers(default_headers(&settings.api_key)?)
            .build()
        {
            Ok(result) => result,
            Err(err) => {
                error!("[registry] Could not create registry client: {err:?}");
                return Err(RegistryError::Connect);
            }
        };

        let registry = RegistryClient {
            client,
            table_url: format!(
                "{}/rest/v1/{}",
                settings.url.trim_end_matches('/'),
                settings.table
            ),
        };

        registry.probe().await?;
        Ok(registry)
    }

    /// One lightweight read against the table to confirm reachability and
    /// credentials before the loop starts
    async fn probe(&self) -> Result<(), RegistryError> {
        let response = match self
            .client
            .get(format!("{}?limit=1", self.table_url))
            .send()
            .await
        {
            Ok(result) => result,
            Err(err) => {
                error!("[registry] Startup probe could not reach registry: {err:?}");
                return Err(RegistryError::Connect);
            }
        };

        if !response.status().is_success() {
            error!("[registry] Startup probe got {}", response.status());
            return Err(RegistryError::Connect);
        }

        Ok(())
    }
}

impl Registry for RegistryClient {
    async fn upsert(&self, record: &HeartbeatRecord) -> Result<(), RegistryError> {
        let url = format!("{}?on_conflict=node_id", self.table_url);
        let response = match self
            .client
            .post(&url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(record)
            .send()
            .await
        {
            Ok(result) => result,
            Err(err) => {
                error!("[registry] Could not send heartbeat: {err:?}");
                return Err(RegistryError::Request);
            }
        };

        if !response.status().is_success() {
            error!("[registry] Heartbeat got non-OK response {}", response.status());
            return Err(RegistryError::BadResponse);
        }

        Ok(())
    }

    async fn mark_offline(&self, node_id: &str) -> Result<(), RegistryError> {
        let url = format!("{}?node_id=eq.{node_id}", self.table_url);
        let body = serde_json::json!({
            "status": NodeStatus::Offline,
            "last_seen": now_iso(),
        });

        let response = match self.client.patch(&url).json(&body).send().await {
            Ok(result) => result,
            Err(err) => {
                error!("[registry] Could not send offline update: {err:?}");
                return Err(RegistryError::Request);
            }
        };

        if !response.status().is_success() {
            error!("[registry] Offline update got non-OK response {}", response.status());
            return Err(RegistryError::BadResponse);
        }

        Ok(())
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap, RegistryError> {
    let key_value = match HeaderValue::from_str(api_key) {
        Ok(result) => result,
        Err(err) => {
            error!("[registry] API key is not a valid header value: {err:?}");
            return Err(RegistryError::Connect);
        }
    };

    let bearer = match HeaderValue::from_str(&format!("Bearer {api_key}")) {
        Ok(result) => result,
        Err(err) => {
            error!("[registry] API key is not a valid bearer value: {err:?}");
            return Err(RegistryError::Connect);
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key_value);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        )),
    );

    Ok(headers)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Registry;
    use crate::registry::error::RegistryError;
    use common::server::heartbeat::HeartbeatRecord;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scriptable in-memory registry for engine tests
    pub(crate) struct FakeRegistry {
        fail_first: u32,
        pub(crate) upserts: AtomicU32,
        pub(crate) offlines: AtomicU32,
    }

    impl FakeRegistry {
        /// Fails the first `fail_first` upserts, succeeds afterwards
        pub(crate) fn new(fail_first: u32) -> Self {
            FakeRegistry {
                fail_first,
                upserts: AtomicU32::new(0),
                offlines: AtomicU32::new(0),
            }
        }
    }

    impl Registry for FakeRegistry {
        async fn upsert(&self, _record: &HeartbeatRecord) -> Result<(), RegistryError> {
            let attempt = self.upserts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_first {
                return Err(RegistryError::Request);
            }
            Ok(())
        }

        async fn mark_offline(&self, _node_id: &str) -> Result<(), RegistryError> {
            self.offlines.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
