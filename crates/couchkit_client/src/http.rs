//! HTTP document store.
//!
//! This module maps [`DocumentStore`] onto the CouchDB REST API. The actual
//! HTTP client is abstracted via a trait so that the transport can be
//! swapped (reqwest in production, scripted clients in tests).

use crate::config::{ClientConfig, Credentials};
use crate::error::{CouchError, CouchResult};
use crate::store::DocumentStore;
use couchkit_protocol::{
    AllDocsQuery, AllDocsResponse, BulkDocsRequest, BulkItemResult, Document, DocumentResponse,
    PurgeResponse, DESIGN_PREFIX,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request handed to an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// JSON body.
    pub body: Option<Vec<u8>>,
    /// Basic-auth credentials.
    pub credentials: Option<Credentials>,
}

/// A response returned by an [`HttpClient`].
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Value of the `ETag` header.
    pub etag: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with a JSON body.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            etag: None,
            body: body.to_string().into_bytes(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Non-2xx
/// responses are returned as `Ok`; `Err` is reserved for requests that
/// never produced a response.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// Error body returned by CouchDB: `{"error": ..., "reason": ...}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    reason: String,
}

/// A [`DocumentStore`] backed by a CouchDB server.
pub struct HttpStore<C: HttpClient> {
    /// Server URL without trailing slash.
    host: String,
    /// Database name.
    database: String,
    /// Credentials sent with every request.
    credentials: Option<Credentials>,
    /// HTTP client implementation.
    client: C,
    /// Last transport error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpStore<C> {
    /// Creates a store for `database` on the server described by `config`.
    pub fn new(config: &ClientConfig, database: impl Into<String>, client: C) -> Self {
        Self {
            host: config.host.clone(),
            database: database.into(),
            credentials: config.credentials.clone(),
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the database URL.
    pub fn database_url(&self) -> String {
        format!("{}/{}", self.host, urlencoding::encode(&self.database))
    }

    /// Returns the URL of a document.
    ///
    /// Design document IDs keep their slash so the server routes them to
    /// the design handler; every other character is percent-encoded.
    pub fn document_url(&self, id: &str) -> String {
        match id.strip_prefix(DESIGN_PREFIX) {
            Some(name) => format!(
                "{}/{}{}",
                self.database_url(),
                DESIGN_PREFIX,
                urlencoding::encode(name)
            ),
            None => format!("{}/{}", self.database_url(), urlencoding::encode(id)),
        }
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns true if the client is healthy and the last request reached
    /// the server.
    pub fn is_connected(&self) -> bool {
        self.client.is_healthy() && self.last_error.read().is_none()
    }

    fn send(&self, method: Method, url: String, body: Option<Vec<u8>>) -> CouchResult<HttpResponse> {
        debug!(%method, %url, "couchdb request");
        let request = HttpRequest {
            method,
            url,
            body,
            credentials: self.credentials.clone(),
        };

        let response = self.client.execute(&request).map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            CouchError::transport(e)
        })?;
        *self.last_error.write() = None;

        if response.is_success() {
            return Ok(response);
        }

        // HEAD responses carry no body to explain the failure.
        let reply = if method == Method::Head || response.body.is_empty() {
            ErrorBody::default()
        } else {
            serde_json::from_slice(&response.body).unwrap_or_else(|_| ErrorBody {
                error: String::new(),
                reason: String::from_utf8_lossy(&response.body).into_owned(),
            })
        };
        Err(CouchError::from_status(
            method.as_str(),
            &request.url,
            response.status,
            reply.error,
            reply.reason,
        ))
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        body: Option<Vec<u8>>,
    ) -> CouchResult<T> {
        let response = self.send(method, url, body)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Queries `_all_docs`.
    pub fn all_docs(&self, query: &AllDocsQuery) -> CouchResult<AllDocsResponse> {
        let mut url = format!("{}/_all_docs", self.database_url());
        let params = query.to_query_string();
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params);
        }
        self.send_json(Method::Get, url, None)
    }

    /// Creates a document with a server-assigned ID.
    pub fn post(&self, doc: &Document) -> CouchResult<DocumentResponse> {
        self.send_json(Method::Post, self.database_url(), Some(encode(doc)?))
    }

    /// Permanently removes the given revisions of deleted documents.
    pub fn purge(&self, revisions: &BTreeMap<String, Vec<String>>) -> CouchResult<PurgeResponse> {
        let url = format!("{}/_purge", self.database_url());
        self.send_json(Method::Post, url, Some(encode(revisions)?))
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> CouchResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

impl<C: HttpClient> DocumentStore for HttpStore<C> {
    fn fetch_range(&self, start: &str, end: &str, include_docs: bool) -> CouchResult<Vec<Document>> {
        let mut query = AllDocsQuery::range(start, end);
        query.include_docs = include_docs;
        let response = self.all_docs(&query)?;

        if include_docs {
            return Ok(response.into_documents());
        }
        Ok(response
            .rows
            .into_iter()
            .map(|row| Document {
                rev: row.value.get("rev").and_then(|v| v.as_str()).map(String::from),
                id: row.id,
                ..Document::default()
            })
            .collect())
    }

    fn fetch(&self, id: &str) -> CouchResult<Document> {
        self.send_json(Method::Get, self.document_url(id), None)
    }

    fn current_revision(&self, id: &str) -> CouchResult<String> {
        let url = self.document_url(id);
        let response = self.send(Method::Head, url.clone(), None)?;
        response
            .etag
            .map(|etag| etag.trim_matches('"').to_string())
            .filter(|rev| !rev.is_empty())
            .ok_or_else(|| CouchError::Codec(format!("HEAD {url}: response has no ETag")))
    }

    fn put(&self, doc: &Document) -> CouchResult<DocumentResponse> {
        if doc.id.is_empty() {
            return Err(CouchError::InvalidArgument("document has no id".into()));
        }
        self.send_json(Method::Put, self.document_url(&doc.id), Some(encode(doc)?))
    }

    fn delete(&self, id: &str, rev: &str) -> CouchResult<DocumentResponse> {
        let url = format!("{}?rev={}", self.document_url(id), urlencoding::encode(rev));
        self.send_json(Method::Delete, url, None)
    }

    fn bulk_write(&self, docs: &[Document]) -> CouchResult<Vec<BulkItemResult>> {
        let url = format!("{}/_bulk_docs", self.database_url());
        let body = encode(&BulkDocsRequest::new(docs))?;
        self.send_json(Method::Post, url, Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct TestClient {
        responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl TestClient {
        fn respond(&self, response: HttpResponse) {
            self.responses.lock().push_back(Ok(response));
        }

        fn fail(&self, message: &str) {
            self.responses.lock().push_back(Err(message.to_string()));
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }
    }

    impl HttpClient for TestClient {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.requests.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err("No response set".into()))
        }

        fn is_healthy(&self) -> bool {
            true
        }
    }

    fn store() -> HttpStore<TestClient> {
        let config = ClientConfig::new("http://couch.local:5984").with_credentials("admin", "pw");
        HttpStore::new(&config, "game data", TestClient::default())
    }

    #[test]
    fn url_construction() {
        let store = store();
        assert_eq!(store.database_url(), "http://couch.local:5984/game%20data");
        assert_eq!(
            store.document_url("player/1"),
            "http://couch.local:5984/game%20data/player%2F1"
        );
        assert_eq!(
            store.document_url("_design/by name"),
            "http://couch.local:5984/game%20data/_design/by%20name"
        );
    }

    #[test]
    fn fetch_range_reads_design_namespace() {
        let store = store();
        store.client.respond(HttpResponse::json(
            200,
            &json!({
                "total_rows": 5, "offset": 1,
                "rows": [{"id": "_design/a", "key": "_design/a", "value": {"rev": "1-a"},
                          "doc": {"_id": "_design/a", "_rev": "1-a", "views": {}}}]
            }),
        ));

        let docs = store.fetch_range("_design/", "_design0", true).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].rev(), Some("1-a"));

        let request = &store.client.requests()[0];
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url,
            "http://couch.local:5984/game%20data/_all_docs?startkey=%22_design%2F%22&endkey=%22_design0%22&include_docs=true"
        );
        assert_eq!(request.credentials, Some(Credentials::new("admin", "pw")));
    }

    #[test]
    fn fetch_range_without_docs_uses_row_revisions() {
        let store = store();
        store.client.respond(HttpResponse::json(
            200,
            &json!({"rows": [{"id": "a", "key": "a", "value": {"rev": "4-d"}}]}),
        ));

        let docs = store.fetch_range("a", "b", false).unwrap();
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[0].rev(), Some("4-d"));
    }

    #[test]
    fn current_revision_from_etag() {
        let store = store();
        store.client.respond(HttpResponse {
            status: 200,
            etag: Some("\"3-abc\"".into()),
            body: Vec::new(),
        });

        assert_eq!(store.current_revision("a").unwrap(), "3-abc");
        assert_eq!(store.client.requests()[0].method, Method::Head);
    }

    #[test]
    fn head_not_found_has_no_reason() {
        let store = store();
        store.client.respond(HttpResponse {
            status: 404,
            ..HttpResponse::default()
        });

        let err = store.current_revision("missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn put_conflict_is_classified() {
        let store = store();
        store.client.respond(HttpResponse::json(
            409,
            &json!({"error": "conflict", "reason": "Document update conflict."}),
        ));

        let err = store.put(&Document::new("a")).unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("Document update conflict."));

        let body: serde_json::Value =
            serde_json::from_slice(store.client.requests()[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"_id": "a"}));
    }

    #[test]
    fn put_without_id_is_rejected_locally() {
        let store = store();
        let err = store.put(&Document::default()).unwrap_err();
        assert!(matches!(err, CouchError::InvalidArgument(_)));
        assert!(store.client.requests().is_empty());
    }

    #[test]
    fn delete_passes_revision() {
        let store = store();
        store
            .client
            .respond(HttpResponse::json(200, &json!({"ok": true, "id": "a", "rev": "2-x"})));

        let response = store.delete("a", "1-a").unwrap();
        assert!(response.ok);
        assert_eq!(
            store.client.requests()[0].url,
            "http://couch.local:5984/game%20data/a?rev=1-a"
        );
    }

    #[test]
    fn bulk_write_posts_docs() {
        let store = store();
        store.client.respond(HttpResponse::json(
            201,
            &json!([
                {"ok": true, "id": "a", "rev": "1-a"},
                {"id": "b", "error": "conflict", "reason": "Document update conflict."}
            ]),
        ));

        let results = store
            .bulk_write(&[Document::new("a"), Document::new("b").with_rev("1-old")])
            .unwrap();
        assert!(results[0].ok);
        assert!(results[1].is_conflict());

        let request = &store.client.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert!(request.url.ends_with("/_bulk_docs"));
        let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["docs"][1], json!({"_id": "b", "_rev": "1-old"}));
    }

    #[test]
    fn transport_failure_is_remembered() {
        let store = store();
        store.client.fail("connection refused");

        let err = store.fetch("a").unwrap_err();
        assert!(matches!(err, CouchError::Transport { .. }));
        assert_eq!(store.last_error().as_deref(), Some("connection refused"));
        assert!(!store.is_connected());

        store
            .client
            .respond(HttpResponse::json(200, &json!({"_id": "a", "_rev": "1-a"})));
        store.fetch("a").unwrap();
        assert_eq!(store.last_error(), None);
        assert!(store.is_connected());
    }

    #[test]
    fn undecodable_body_is_a_codec_error() {
        let store = store();
        store.client.respond(HttpResponse {
            status: 200,
            etag: None,
            body: b"<html>".to_vec(),
        });

        assert!(matches!(store.fetch("a").unwrap_err(), CouchError::Codec(_)));
    }

    #[test]
    fn non_json_error_body_becomes_reason() {
        let store = store();
        store.client.respond(HttpResponse {
            status: 502,
            etag: None,
            body: b"bad gateway".to_vec(),
        });

        let err = store.fetch("a").unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn purge_posts_revisions() {
        let store = store();
        store.client.respond(HttpResponse::json(
            201,
            &json!({"purge_seq": 3, "purged": {"a": ["1-a"]}}),
        ));

        let mut revisions = BTreeMap::new();
        revisions.insert("a".to_string(), vec!["1-a".to_string()]);
        let response = store.purge(&revisions).unwrap();
        assert_eq!(response.purged["a"], vec!["1-a".to_string()]);
        assert!(store.client.requests()[0].url.ends_with("/_purge"));
    }
}
