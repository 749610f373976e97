// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Low-level code to work with the service catalog.

use log::{debug, error};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{Error, ErrorKind};

/// A service in the catalog.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CatalogRecord {
    /// Human-readable service name, e.g. `Compute`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Service type, e.g. `compute`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Endpoints of the service, usually one per region.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// An endpoint of a service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Endpoint {
    /// Region (availability zone) of the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Public URL of the endpoint.
    #[serde(rename = "publicURL")]
    pub public_url: String,
}

impl CatalogRecord {
    /// Whether the record matches the name.
    ///
    /// Both the service type and the human-readable name are accepted, the latter
    /// case-insensitively.
    pub fn matches(&self, name: &str) -> bool {
        self.service_type == name
            || self
                .name
                .as_ref()
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
    }
}

/// Find an endpoint in the service catalog.
///
/// Without a region, the first endpoint of the first matching service is used.
pub fn find_endpoint<'c>(
    catalog: &'c [CatalogRecord],
    name: &str,
    region: Option<&str>,
) -> Result<&'c Endpoint, Error> {
    let mut endpoints = catalog
        .iter()
        .filter(|x| x.matches(name))
        .flat_map(|x| x.endpoints.iter());

    let maybe_endp = if let Some(rgn) = region {
        endpoints.find(|x| x.region.as_deref() == Some(rgn))
    } else {
        endpoints.next()
    };

    maybe_endp.ok_or_else(|| match region {
        Some(rgn) => Error::new_service_not_found(format!("{} in region {}", name, rgn)),
        None => Error::new_service_not_found(name),
    })
}

/// Parse the public URL of an endpoint found for the service.
pub fn endpoint_url(endp: &Endpoint, name: &str, region: Option<&str>) -> Result<Url, Error> {
    debug!("Received {:?} for {}", endp, name);
    Url::parse(&endp.public_url).map_err(|e| {
        error!(
            "Invalid URL {} received from service catalog for service \
             '{}' from region {:?}: {}",
            endp.public_url, name, region, e
        );
        Error::new(
            ErrorKind::InvalidInput,
            format!("Invalid URL {} for {} - {}", endp.public_url, name, e),
        )
    })
}
