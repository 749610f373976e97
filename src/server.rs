// Copyright 2019 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server resource.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::{debug, trace};
use reqwest::Url;
use serde_json::{Map, Value};
use static_assertions::assert_impl_all;
use tokio::sync::OnceCell;

use super::protocol::{self, Address, Metadata, MetadataRoot, ServerFields};
use super::query::Query;
use super::request;
use super::transport::Transport;
use super::url;
use super::Error;

/// A server (virtual machine instance).
///
/// A server keeps a copy of the token and the endpoint of the client that created it, so it
/// can issue its own requests. The only mutable state is the metadata cache, which is
/// populated at most once.
#[derive(Clone)]
pub struct Server {
    id: String,
    url: Url,
    name: Option<String>,
    status: Option<String>,
    progress: Option<u64>,
    image_id: Option<String>,
    flavor_id: Option<String>,
    addresses: HashMap<String, Vec<Address>>,
    host_id: Option<String>,
    tenant_id: Option<String>,
    user_id: Option<String>,
    metadata: OnceCell<Metadata>,
    original: Map<String, Value>,
    token: String,
    parent_endpoint: Url,
    transport: Arc<dyn Transport>,
}

assert_impl_all!(Server: Send, Sync);

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.token.hash(&mut hasher);
        f.debug_struct("Server")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("name", &self.name)
            .field("status", &self.status)
            .field("image_id", &self.image_id)
            .field("flavor_id", &self.flavor_id)
            .field("metadata", &self.metadata.get())
            .field("token", &format_args!("hash({})", hasher.finish()))
            .finish()
    }
}

impl Server {
    /// Create a server from its ID and details.
    ///
    /// The URL of the server is derived from the endpoint and the percent-encoded ID. The
    /// image and flavor IDs fall back to `image.id` and `flavor.id` when there are no
    /// top-level `imageId` and `flavorId` fields. Metadata is only considered known if the
    /// details contain a `metadata` object. Fields with values of unexpected types are
    /// treated as absent, the details are kept unmodified in any case.
    pub fn new<S1, S2>(
        id: S1,
        details: Map<String, Value>,
        token: S2,
        endpoint: &Url,
        transport: Arc<dyn Transport>,
    ) -> Server
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let id = id.into();
        let fields = ServerFields::from_details(&details);
        let url = url::extend(endpoint.clone(), &["servers", id.as_str()]);
        trace!("Created server {} with URL {}", id, url);

        let image_id = fields.resolved_image_id();
        let flavor_id = fields.resolved_flavor_id();
        Server {
            url,
            name: fields.name,
            status: fields.status,
            progress: fields.progress,
            image_id,
            flavor_id,
            addresses: fields.addresses.unwrap_or_default(),
            host_id: fields.host_id,
            tenant_id: fields.tenant_id,
            user_id: fields.user_id,
            metadata: OnceCell::new_with(fields.metadata),
            original: details,
            token: token.into(),
            parent_endpoint: endpoint.clone(),
            transport,
            id,
        }
    }

    /// Create a server from a JSON record.
    ///
    /// The record must be an object with an `id` field.
    pub fn from_json<S: Into<String>>(
        value: Value,
        token: S,
        endpoint: &Url,
        transport: Arc<dyn Transport>,
    ) -> Result<Server, Error> {
        let details = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::new_malformed(format!(
                    "Expected a server object, got {}",
                    other
                )))
            }
        };
        let id = details
            .get("id")
            .and_then(protocol::id_from_value)
            .ok_or_else(|| Error::new_malformed("Server record without a valid ID"))?;
        Ok(Server::new(id, details, token, endpoint, transport))
    }

    /// Server ID.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// URL of the server.
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Server name.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Server status, e.g. `ACTIVE`.
    #[inline]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Build progress in percents.
    #[inline]
    pub fn progress(&self) -> Option<u64> {
        self.progress
    }

    /// ID of the image the server was built from.
    #[inline]
    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    /// ID of the flavor of the server.
    #[inline]
    pub fn flavor_id(&self) -> Option<&str> {
        self.flavor_id.as_deref()
    }

    /// Addresses of the server grouped by network name.
    #[inline]
    pub fn addresses(&self) -> &HashMap<String, Vec<Address>> {
        &self.addresses
    }

    /// Host ID (an opaque hash of the hypervisor).
    #[inline]
    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// ID of the project owning the server.
    #[inline]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// ID of the user that created the server.
    #[inline]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Metadata if it is already known.
    ///
    /// Use [list_metadata](#method.list_metadata) to fetch it.
    #[inline]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.get()
    }

    /// The server record exactly as received.
    #[inline]
    pub fn original(&self) -> &Map<String, Value> {
        &self.original
    }

    /// Authentication token used for requests.
    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Endpoint of the client that created the server.
    #[inline]
    pub fn parent_endpoint(&self) -> &Url {
        &self.parent_endpoint
    }

    /// Get the metadata of the server.
    ///
    /// The metadata is fetched at most once, concurrent callers wait for the same request.
    /// A failed request does not change the cache, so the next call tries again.
    pub async fn list_metadata(&self) -> Result<&Metadata, Error> {
        if let Some(metadata) = self.metadata.get() {
            debug!("Using cached metadata for server {}", self.id);
            return Ok(metadata);
        }

        self.metadata
            .get_or_try_init(|| self.fetch_metadata())
            .await
    }

    async fn fetch_metadata(&self) -> Result<Metadata, Error> {
        debug!("Fetching metadata for server {}", self.id);
        let url = url::extend(self.url.clone(), &["metadata"]);
        let root: MetadataRoot =
            request::fetch_json(&*self.transport, url, &Query::json(), &self.token).await?;
        Ok(root.into())
    }
}

#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::Url;
    use serde_json::{json, Value};

    use super::Server;
    use crate::transport::test::FakeTransport;
    use crate::transport::{Transport, TransportRequest, TransportResponse};
    use crate::{Error, ErrorKind};

    const ENDPOINT: &str = "http://compute.local/v2/tenant";

    fn endpoint() -> Url {
        Url::parse(ENDPOINT).unwrap()
    }

    fn server_with(value: Value, transport: Arc<dyn Transport>) -> Server {
        Server::from_json(value, "tkn", &endpoint(), transport).unwrap()
    }

    #[test]
    fn test_new() {
        let server = server_with(
            json!({
                "id": "abc",
                "name": "web1",
                "status": "ACTIVE",
                "progress": 100,
                "hostId": "h1",
                "tenant_id": "t1",
                "user_id": "u1",
                "flavor": {"id": "2"},
                "addresses": {"private": [{"addr": "10.0.0.3", "version": 4}]}
            }),
            Arc::new(FakeTransport::new()),
        );
        assert_eq!(server.id(), "abc");
        assert_eq!(server.url().as_str(), "http://compute.local/v2/tenant/servers/abc");
        assert_eq!(server.name(), Some("web1"));
        assert_eq!(server.status(), Some("ACTIVE"));
        assert_eq!(server.progress(), Some(100));
        assert_eq!(server.host_id(), Some("h1"));
        assert_eq!(server.tenant_id(), Some("t1"));
        assert_eq!(server.user_id(), Some("u1"));
        assert_eq!(server.flavor_id(), Some("2"));
        assert!(server.image_id().is_none());
        assert_eq!(server.addresses()["private"][0].addr, "10.0.0.3");
        assert!(server.metadata().is_none());
        assert_eq!(server.token(), "tkn");
        assert_eq!(server.parent_endpoint().as_str(), ENDPOINT);
        assert_eq!(server.original()["flavor"], json!({"id": "2"}));
    }

    #[test]
    fn test_defaults() {
        let server = server_with(json!({"id": 42}), Arc::new(FakeTransport::new()));
        assert_eq!(server.id(), "42");
        assert!(server.name().is_none());
        assert!(server.addresses().is_empty());
        assert!(server.metadata().is_none());
    }

    #[test]
    fn test_url_encoding() {
        let server = server_with(json!({"id": "a/b c?d#e"}), Arc::new(FakeTransport::new()));
        assert_eq!(
            server.url().as_str(),
            "http://compute.local/v2/tenant/servers/a%2Fb%20c%3Fd%23e"
        );
    }

    #[test]
    fn test_original_untouched() {
        let value = json!({"id": "abc", "OS-EXT-STS:vm_state": "active", "image": ""});
        let server = server_with(value.clone(), Arc::new(FakeTransport::new()));
        assert_eq!(&Value::Object(server.original().clone()), &value);
        assert!(server.image_id().is_none());
    }

    #[test]
    fn test_from_json_malformed() {
        for value in vec![
            json!(["abc"]),
            json!("abc"),
            json!({"name": "no id"}),
            json!({"id": {"nested": true}}),
        ] {
            let err = Server::from_json(value, "tkn", &endpoint(), Arc::new(FakeTransport::new()))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        }
    }

    #[test]
    fn test_lenient_fields() {
        let value = json!({
            "id": "def",
            "name": "web2",
            "tenant_id": 12345,
            "user_id": 678,
            "progress": "lots",
            "metadata": {"count": 3, "role": "db"}
        });
        let server = server_with(value.clone(), Arc::new(FakeTransport::new()));
        assert_eq!(server.name(), Some("web2"));
        assert_eq!(server.tenant_id(), Some("12345"));
        assert_eq!(server.user_id(), Some("678"));
        assert!(server.progress().is_none());
        let md = server.metadata().unwrap();
        assert_eq!(md["count"], "3");
        assert_eq!(md["role"], "db");
        assert_eq!(&Value::Object(server.original().clone()), &value);
    }

    #[test]
    fn test_debug_hides_token() {
        let server = Server::from_json(
            json!({"id": "abc"}),
            "super-secret",
            &endpoint(),
            Arc::new(FakeTransport::new()),
        )
        .unwrap();
        let repr = format!("{:?}", server);
        assert!(repr.contains("abc"));
        assert!(!repr.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_list_metadata_once() {
        let transport = Arc::new(FakeTransport::new().with_body(r#"{"role": "web"}"#));
        let server = server_with(json!({"id": "abc"}), transport.clone());

        let md = server.list_metadata().await.unwrap();
        assert_eq!(md["role"], "web");
        let md = server.list_metadata().await.unwrap();
        assert_eq!(md.len(), 1);

        assert_eq!(
            transport.urls(),
            vec!["http://compute.local/v2/tenant/servers/abc/metadata?format=json"]
        );
        let requests = transport.requests();
        assert_eq!(requests[0].headers.get("x-auth-token").unwrap(), "tkn");
        assert_eq!(server.metadata().unwrap()["role"], "web");
    }

    #[tokio::test]
    async fn test_list_metadata_wrapped() {
        let transport = Arc::new(FakeTransport::new().with_body(r#"{"metadata": {"a": "1"}}"#));
        let server = server_with(json!({"id": "abc"}), transport);
        let md = server.list_metadata().await.unwrap();
        assert_eq!(md["a"], "1");
    }

    #[tokio::test]
    async fn test_list_metadata_prepopulated() {
        let transport = Arc::new(FakeTransport::new());
        let server = server_with(
            json!({"id": "abc", "metadata": {"role": "db"}}),
            transport.clone(),
        );
        assert_eq!(server.metadata().unwrap()["role"], "db");
        let md = server.list_metadata().await.unwrap();
        assert_eq!(md["role"], "db");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_metadata_failure_keeps_cache_empty() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_error(Error::new(ErrorKind::TransportError, "connection reset"))
                .with_body(r#"{"role": "web"}"#),
        );
        let server = server_with(json!({"id": "abc"}), transport.clone());

        let err = server.list_metadata().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert!(server.metadata().is_none());

        let md = server.list_metadata().await.unwrap();
        assert_eq!(md["role"], "web");
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_list_metadata_malformed() {
        let transport = Arc::new(FakeTransport::new().with_body(r#"["not", "a", "map"]"#));
        let server = server_with(json!({"id": "abc"}), transport);
        let err = server.list_metadata().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
        assert!(server.metadata().is_none());
    }

    /// Yields to the scheduler before answering, so that callers overlap.
    #[derive(Debug)]
    struct YieldingTransport(FakeTransport);

    #[async_trait]
    impl Transport for YieldingTransport {
        async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
            tokio::task::yield_now().await;
            self.0.execute(request).await
        }
    }

    #[tokio::test]
    async fn test_list_metadata_concurrent() {
        let transport = Arc::new(YieldingTransport(
            FakeTransport::new().with_body(r#"{"role": "web"}"#),
        ));
        let server = server_with(json!({"id": "abc"}), transport.clone());

        let (first, second) = tokio::join!(server.list_metadata(), server.list_metadata());
        assert_eq!(first.unwrap()["role"], "web");
        assert_eq!(second.unwrap()["role"], "web");
        assert_eq!(transport.0.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_clone_shares_nothing_mutable() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_body(r#"{"a": "1"}"#)
                .with_body(r#"{"a": "2"}"#),
        );
        let server = server_with(json!({"id": "abc"}), transport.clone());
        let copy = server.clone();
        assert_eq!(server.list_metadata().await.unwrap()["a"], "1");
        assert!(copy.metadata().is_none());
        assert_eq!(copy.list_metadata().await.unwrap()["a"], "2");
    }
}
