// Copyright 2023 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Query string building.

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::ServerListOptions;

/// An item in a query.
pub(crate) trait QueryItem {
    /// Represent the item for serialization into a query.
    ///
    /// The first item of the resulting tuple is a key, the second - its value.
    fn query_item(&self) -> (&str, Cow<str>);
}

/// A list of query items serialized in insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Query<T>(pub Vec<T>);

impl<T> Default for Query<T> {
    fn default() -> Query<T> {
        Query(Vec::new())
    }
}

impl<T> Query<T> {
    /// Add a query item.
    #[inline]
    pub fn with(mut self, item: T) -> Self {
        self.0.push(item);
        self
    }
}

impl<T> Deref for Query<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T> DerefMut for Query<T> {
    fn deref_mut(&mut self) -> &mut Vec<T> {
        &mut self.0
    }
}

impl<T> Serialize for Query<T>
where
    T: QueryItem,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for e in &self.0 {
            seq.serialize_element(&e.query_item())?;
        }
        seq.end()
    }
}

/// Query items understood by the Compute API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ComputeQuery {
    /// Response format, always JSON.
    JsonFormat,
    /// Maximum number of items to return.
    Limit(usize),
    /// ID of the last seen item.
    Marker(String),
}

impl QueryItem for ComputeQuery {
    fn query_item(&self) -> (&str, Cow<str>) {
        match self {
            ComputeQuery::JsonFormat => ("format", Cow::Borrowed("json")),
            ComputeQuery::Limit(limit) => ("limit", Cow::Owned(limit.to_string())),
            ComputeQuery::Marker(marker) => ("marker", Cow::Borrowed(marker)),
        }
    }
}

impl Query<ComputeQuery> {
    /// The query sent with every request.
    #[inline]
    pub fn json() -> Query<ComputeQuery> {
        Query::default().with(ComputeQuery::JsonFormat)
    }

    /// The query for a server listing.
    ///
    /// Pagination items are only added when supplied. A zero limit and an empty marker
    /// count as not supplied.
    pub fn servers(options: &ServerListOptions) -> Query<ComputeQuery> {
        let mut query = Query::json();
        if let Some(limit) = options.limit.filter(|limit| *limit > 0) {
            query.push(ComputeQuery::Limit(limit));
        }
        if let Some(marker) = options.marker.as_ref().filter(|marker| !marker.is_empty()) {
            query.push(ComputeQuery::Marker(marker.clone()));
        }
        query
    }
}
