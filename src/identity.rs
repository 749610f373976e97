// Copyright 2019 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Service discovery and tokens.
//!
//! The [Identity](trait.Identity.html) trait is what [Compute](../struct.Compute.html)
//! consumes. [CatalogIdentity](struct.CatalogIdentity.html) implements it on top of a token
//! and a service catalog obtained from an Identity service.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use log::debug;
use reqwest::Url;
use serde::Deserialize;
use static_assertions::{assert_impl_all, assert_obj_safe};

use super::catalog::{self, CatalogRecord};
use super::Error;

/// A service resolved from the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    /// Name the service was requested by.
    pub name: String,
    /// Region of the endpoint, if known.
    pub region: Option<String>,
    /// Public URL of the service.
    pub public_url: Url,
}

/// Source of service endpoints and authentication tokens.
pub trait Identity: fmt::Debug + Send + Sync {
    /// Resolve a service by its name in the given region.
    ///
    /// If the region is `None`, the first matching service is returned. Fails with
    /// `ServiceNotFound` if nothing matches.
    fn service_by_name(&self, name: &str, region: Option<&str>) -> Result<Service, Error>;

    /// The current authentication token.
    fn token(&self) -> String;
}

assert_obj_safe!(Identity);

/// Identity backed by a token and a service catalog.
///
/// ```rust
/// let identity = oscompute::CatalogIdentity::from_access(r#"{
///     "access": {
///         "token": {"id": "abcdef"},
///         "serviceCatalog": [{
///             "name": "Compute",
///             "type": "compute",
///             "endpoints": [{
///                 "region": "az-1.region-a.geo-1",
///                 "publicURL": "https://compute.local/v1.1/1234"
///             }]
///         }]
///     }
/// }"#)
/// .expect("Invalid access document");
///
/// let compute = oscompute::Compute::from_identity(&identity, Some("az-1.region-a.geo-1"))
///     .expect("No compute service");
/// assert_eq!(compute.endpoint().as_str(), "https://compute.local/v1.1/1234");
/// ```
#[derive(Clone)]
pub struct CatalogIdentity {
    token: String,
    catalog: Vec<CatalogRecord>,
}

assert_impl_all!(CatalogIdentity: Send, Sync);

#[derive(Debug, Deserialize)]
struct TokenRecord {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: TokenRecord,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<CatalogRecord>,
}

#[derive(Debug, Deserialize)]
struct AccessRoot {
    access: Access,
}

impl fmt::Debug for CatalogIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.token.hash(&mut hasher);
        write!(
            f,
            "CatalogIdentity {{ token: hash({}), catalog: {:?} }}",
            hasher.finish(),
            self.catalog
        )
    }
}

impl CatalogIdentity {
    /// Create an identity from a token and a catalog.
    pub fn new<S: Into<String>>(token: S, catalog: Vec<CatalogRecord>) -> CatalogIdentity {
        CatalogIdentity {
            token: token.into(),
            catalog,
        }
    }

    /// Create an identity from an access document returned by an Identity service.
    ///
    /// The document is expected to have the form
    /// `{"access": {"token": {"id": ...}, "serviceCatalog": [...]}}`.
    pub fn from_access<S: AsRef<str>>(document: S) -> Result<CatalogIdentity, Error> {
        let root: AccessRoot = serde_json::from_str(document.as_ref()).map_err(|e| {
            Error::new_malformed(format!("Cannot parse the access document: {}", e))
        })?;
        debug!(
            "Received an access document with {} catalog records",
            root.access.service_catalog.len()
        );
        Ok(CatalogIdentity::new(
            root.access.token.id,
            root.access.service_catalog,
        ))
    }

    /// The service catalog.
    #[inline]
    pub fn catalog(&self) -> &[CatalogRecord] {
        &self.catalog
    }
}

impl Identity for CatalogIdentity {
    fn service_by_name(&self, name: &str, region: Option<&str>) -> Result<Service, Error> {
        debug!(
            "Requesting a catalog endpoint for service '{}' from region {:?}",
            name, region
        );
        let endpoint = catalog::find_endpoint(&self.catalog, name, region)?;
        let public_url = catalog::endpoint_url(endpoint, name, region)?;
        Ok(Service {
            name: name.to_string(),
            region: endpoint.region.clone(),
            public_url,
        })
    }

    #[inline]
    fn token(&self) -> String {
        self.token.clone()
    }
}
