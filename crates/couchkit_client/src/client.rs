//! Connection entry point and the reqwest transport.

use crate::config::ClientConfig;
use crate::database::Database;
use crate::error::{CouchError, CouchResult};
use crate::http::{HttpClient, HttpRequest, HttpResponse, HttpStore, Method};
use reqwest::blocking;
use reqwest::header::{CONTENT_TYPE, ETAG};

/// [`HttpClient`] implementation on top of `reqwest::blocking`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: blocking::Client,
}

impl ReqwestClient {
    /// Builds a client honouring the configured timeout and user agent.
    pub fn new(config: &ClientConfig) -> CouchResult<Self> {
        let inner = blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CouchError::transport(format!("failed to build http client: {e}")))?;
        Ok(Self { inner })
    }
}

impl HttpClient for ReqwestClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let mut builder = match request.method {
            Method::Get => self.inner.get(&request.url),
            Method::Head => self.inner.head(&request.url),
            Method::Put => self.inner.put(&request.url),
            Method::Post => self.inner.post(&request.url),
            Method::Delete => self.inner.delete(&request.url),
        };

        if let Some(credentials) = &request.credentials {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .map_err(|e| format!("failed to read response body: {e}"))?
            .to_vec();

        Ok(HttpResponse { status, etag, body })
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

/// A connection to a CouchDB server.
///
/// # Example
///
/// ```no_run
/// use couchkit_client::{Client, ClientConfig};
///
/// let config = ClientConfig::new("http://127.0.0.1:5984").with_credentials("admin", "secret");
/// let client = Client::new(config).unwrap();
/// let db = client.use_database("players");
/// let difference = db.plan_seed(&[]).unwrap();
/// println!("{} design documents would be removed", difference.deletions.len());
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: ReqwestClient,
}

impl Client {
    /// Creates a client for the configured server.
    pub fn new(config: ClientConfig) -> CouchResult<Self> {
        let http = ReqwestClient::new(&config)?;
        Ok(Self { config, http })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a handle to the named database.
    ///
    /// No request is made; a missing database surfaces on first use.
    pub fn use_database(&self, name: &str) -> Database<HttpStore<ReqwestClient>> {
        Database::new(HttpStore::new(&self.config, name, self.http.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStore;
    use std::time::Duration;

    #[test]
    fn use_database_builds_http_store() {
        let config = ClientConfig::new("http://127.0.0.1:5984/").with_timeout(Duration::from_secs(2));
        let client = Client::new(config).unwrap();
        let db = client.use_database("players");

        assert_eq!(db.inner().database(), "players");
        assert_eq!(db.inner().database_url(), "http://127.0.0.1:5984/players");
        assert_eq!(client.config().timeout, Duration::from_secs(2));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        struct Refused;

        impl HttpClient for Refused {
            fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, String> {
                Err("connection refused".into())
            }

            fn is_healthy(&self) -> bool {
                false
            }
        }

        let config = ClientConfig::new("http://127.0.0.1:5984");
        let db = Database::new(HttpStore::new(&config, "players", Refused));

        let err = db.inner().fetch("a").unwrap_err();
        assert!(matches!(err, CouchError::Transport { ref message } if message == "connection refused"));
        assert!(!db.inner().is_connected());
    }
}
