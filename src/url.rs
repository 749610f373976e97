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

//! Handy primitives for working with URLs.

use reqwest::Url;
use serde::Serialize;

use super::{Error, ErrorKind};

/// Parse a base URL that can be extended with path segments.
pub fn parse_base(value: &str) -> Result<Url, Error> {
    let url = Url::parse(value).map_err(|e| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Invalid endpoint {}: {}", value, e),
        )
    })?;
    if url.cannot_be_a_base() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("Endpoint {} cannot be used as a base URL", value),
        ));
    }
    Ok(url)
}

/// Append path segments, percent-encoding each of them.
///
/// The URL must be a base URL (see `parse_base`), otherwise the URL is returned unchanged.
#[inline]
pub fn extend<I>(mut url: Url, segments: I) -> Url
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    if let Ok(mut path) = url.path_segments_mut() {
        let _ = path.pop_if_empty().extend(segments);
    }
    url
}

/// Replace the query of the URL with a serialized one.
pub fn with_query<Q: Serialize + ?Sized>(mut url: Url, query: &Q) -> Result<Url, Error> {
    let encoded = serde_urlencoded::to_string(query).map_err(|e| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Cannot encode query: {}", e),
        )
    })?;
    if encoded.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&encoded));
    }
    Ok(url)
}
