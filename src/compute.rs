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

//! Compute API client.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::{debug, trace};
use reqwest::Url;
use static_assertions::assert_impl_all;

use super::identity::Identity;
use super::protocol::{Flavor, FlavorRoot, FlavorsRoot, ServersRoot};
use super::query::Query;
use super::request;
use super::transport::{HttpTransport, Transport};
use super::url;
use super::{Error, Server, ServerListOptions};

/// Catalog name of the Compute service.
pub const COMPUTE_SERVICE: &str = "compute";

/// An authenticated client of the Compute API.
///
/// The client is cheap to clone: clones share the same transport.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscompute::Error> {
/// let compute = oscompute::Compute::new("<token>", "https://compute.local/v2/1234")?;
/// for server in compute.servers(5usize).await? {
///     println!("{} {:?}", server.id(), server.name());
/// }
/// # Ok(()) }
/// # #[tokio::main]
/// # async fn main() { example().await.unwrap(); }
/// ```
#[derive(Clone)]
pub struct Compute {
    token: String,
    endpoint: Url,
    transport: Arc<dyn Transport>,
}

assert_impl_all!(Compute: Send, Sync);

impl fmt::Debug for Compute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.token.hash(&mut hasher);
        write!(
            f,
            "Compute {{ endpoint: {}, token: hash({}), transport: {:?} }}",
            self.endpoint.as_str(),
            hasher.finish(),
            self.transport
        )
    }
}

impl Compute {
    /// Create a client from a token and an endpoint.
    ///
    /// Requests are sent using the default [HttpTransport](transport/struct.HttpTransport.html).
    pub fn new<S1, S2>(token: S1, endpoint: S2) -> Result<Compute, Error>
    where
        S1: Into<String>,
        S2: AsRef<str>,
    {
        Compute::new_with_transport(token, endpoint, HttpTransport::new())
    }

    /// Create a client with a custom transport.
    pub fn new_with_transport<S1, S2, T>(
        token: S1,
        endpoint: S2,
        transport: T,
    ) -> Result<Compute, Error>
    where
        S1: Into<String>,
        S2: AsRef<str>,
        T: Transport + 'static,
    {
        let endpoint = url::parse_base(endpoint.as_ref())?;
        debug!("Using Compute endpoint {}", endpoint);
        Ok(Compute {
            token: token.into(),
            endpoint,
            transport: Arc::new(transport),
        })
    }

    /// Create a client using an identity.
    ///
    /// The public URL of the `compute` service in the given region is used. Without a region,
    /// the first matching endpoint is used.
    pub fn from_identity<I>(identity: &I, region: Option<&str>) -> Result<Compute, Error>
    where
        I: Identity + ?Sized,
    {
        Compute::from_identity_with_transport(identity, region, HttpTransport::new())
    }

    /// Create a client using an identity and a custom transport.
    pub fn from_identity_with_transport<I, T>(
        identity: &I,
        region: Option<&str>,
        transport: T,
    ) -> Result<Compute, Error>
    where
        I: Identity + ?Sized,
        T: Transport + 'static,
    {
        let service = identity.service_by_name(COMPUTE_SERVICE, region)?;
        Compute::new_with_transport(identity.token(), service.public_url.as_str(), transport)
    }

    /// Authentication token.
    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Base URL of the Compute service.
    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// List servers with details.
    ///
    /// Accepts anything convertible into [ServerListOptions](struct.ServerListOptions.html):
    /// `()` for no pagination, a limit, or a `(limit, marker)` tuple.
    pub async fn servers<O>(&self, options: O) -> Result<Vec<Server>, Error>
    where
        O: Into<ServerListOptions>,
    {
        let options = options.into();
        self.fetch_servers_page(&options).await
    }

    pub(crate) async fn fetch_servers_page(
        &self,
        options: &ServerListOptions,
    ) -> Result<Vec<Server>, Error> {
        trace!("Listing servers with {:?}", options);
        let url = url::extend(self.endpoint.clone(), &["servers", "detail"]);
        let root: ServersRoot = request::fetch_json(
            &*self.transport,
            url,
            &Query::servers(options),
            &self.token,
        )
        .await?;
        let servers = root
            .servers
            .into_iter()
            .map(|value| {
                Server::from_json(
                    value,
                    self.token.clone(),
                    &self.endpoint,
                    self.transport.clone(),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Received {} servers", servers.len());
        Ok(servers)
    }

    /// List flavors with details.
    ///
    /// Flavors are returned exactly as received.
    pub async fn flavors(&self) -> Result<Vec<Flavor>, Error> {
        let url = url::extend(self.endpoint.clone(), &["flavors", "detail"]);
        let root: FlavorsRoot =
            request::fetch_json(&*self.transport, url, &Query::json(), &self.token).await?;
        debug!("Received {} flavors", root.flavors.len());
        Ok(root.flavors)
    }

    /// Get a flavor by its ID.
    pub async fn flavor<S: AsRef<str>>(&self, id: S) -> Result<Flavor, Error> {
        let url = url::extend(self.endpoint.clone(), &["flavors", id.as_ref()]);
        let root: FlavorRoot =
            request::fetch_json(&*self.transport, url, &Query::json(), &self.token).await?;
        Ok(root.flavor)
    }
}
