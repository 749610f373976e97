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

//! JSON structures of the Compute API.

use std::collections::HashMap;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A flavor as returned by the API.
///
/// Flavors are returned verbatim, without any interpretation.
pub type Flavor = Map<String, Value>;

/// Server metadata: string keys to string values.
pub type Metadata = HashMap<String, String>;

/// A network address of a server.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Address {
    /// IP address.
    pub addr: String,
    /// IP protocol version (4 or 6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
    /// Any other fields of the record (MAC address, address type, etc).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServersRoot {
    pub servers: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlavorsRoot {
    pub flavors: Vec<Flavor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlavorRoot {
    pub flavor: Flavor,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MetadataRoot {
    Wrapped { metadata: Map<String, Value> },
    Flat(Map<String, Value>),
}

impl From<MetadataRoot> for Metadata {
    fn from(value: MetadataRoot) -> Metadata {
        match value {
            MetadataRoot::Wrapped { metadata } => metadata_from_map(metadata),
            MetadataRoot::Flat(metadata) => metadata_from_map(metadata),
        }
    }
}

/// Convert a JSON object into metadata.
///
/// Non-string values are kept in their JSON representation.
pub(crate) fn metadata_from_map(map: Map<String, Value>) -> Metadata {
    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, s),
            other => (key, other.to_string()),
        })
        .collect()
}

/// Fields of a server that are projected into typed accessors.
///
/// The projection never fails: a value of an unexpected type is logged and treated as
/// absent. It is still available in the original record.
#[derive(Debug, Default)]
pub(crate) struct ServerFields {
    pub name: Option<String>,
    pub status: Option<String>,
    pub progress: Option<u64>,
    pub image_id: Option<String>,
    pub image_ref: Option<String>,
    pub flavor_id: Option<String>,
    pub flavor_ref: Option<String>,
    pub addresses: Option<HashMap<String, Vec<Address>>>,
    pub metadata: Option<Metadata>,
    pub host_id: Option<String>,
    pub tenant_id: Option<String>,
    pub user_id: Option<String>,
}

impl ServerFields {
    /// Project the server record.
    pub fn from_details(details: &Map<String, Value>) -> ServerFields {
        ServerFields {
            name: scalar_field(details, "name"),
            status: scalar_field(details, "status"),
            progress: typed_field(details, "progress"),
            image_id: scalar_field(details, "imageId"),
            image_ref: nested_id(details, "image"),
            flavor_id: scalar_field(details, "flavorId"),
            flavor_ref: nested_id(details, "flavor"),
            addresses: typed_field(details, "addresses"),
            metadata: metadata_field(details),
            host_id: scalar_field(details, "hostId"),
            tenant_id: scalar_field(details, "tenant_id"),
            user_id: scalar_field(details, "user_id"),
        }
    }

    /// Image ID, falling back to the nested `image.id`.
    pub fn resolved_image_id(&self) -> Option<String> {
        resolve_id(&self.image_id, &self.image_ref)
    }

    /// Flavor ID, falling back to the nested `flavor.id`.
    pub fn resolved_flavor_id(&self) -> Option<String> {
        resolve_id(&self.flavor_id, &self.flavor_ref)
    }
}

fn resolve_id(top_level: &Option<String>, nested: &Option<String>) -> Option<String> {
    top_level
        .as_ref()
        .filter(|s| !s.is_empty())
        .or(nested.as_ref())
        .cloned()
}

fn ignored<T>(key: &str, value: &Value) -> Option<T> {
    warn!("Ignoring server field {} with unexpected value {}", key, value);
    None
}

/// A string field, numbers are converted to strings.
fn scalar_field(details: &Map<String, Value>, key: &str) -> Option<String> {
    match details.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => id_from_value(value).or_else(|| ignored(key, value)),
    }
}

fn typed_field<T: DeserializeOwned>(details: &Map<String, Value>, key: &str) -> Option<T> {
    match details.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => match T::deserialize(value) {
            Ok(result) => Some(result),
            Err(_) => ignored(key, value),
        },
    }
}

/// The `id` of a nested reference like `"image": {"id": "..."}`.
///
/// An empty string (used for volume-backed servers) means no reference.
fn nested_id(details: &Map<String, Value>, key: &str) -> Option<String> {
    match details.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::Object(reference)) => match reference.get("id") {
            None | Some(Value::Null) => None,
            Some(id) => id_from_value(id).or_else(|| ignored(key, id)),
        },
        Some(value) => ignored(key, value),
    }
}

fn metadata_field(details: &Map<String, Value>) -> Option<Metadata> {
    match details.get("metadata") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(metadata_from_map(map.clone())),
        Some(value) => ignored("metadata", value),
    }
}

/// Convert a JSON identifier into a string.
///
/// Older deployments use numeric identifiers.
pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
