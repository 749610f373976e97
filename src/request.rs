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

//! Utilities to issue Compute API requests.

use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use log::{error, trace};
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::query::{ComputeQuery, Query};
use super::transport::{Transport, TransportRequest};
use super::url;
use super::{Error, ErrorKind};

/// Header carrying the authentication token.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Build the headers sent with every request.
pub(crate) fn standard_headers(token: &str) -> Result<HeaderMap, Error> {
    let mut token_value = HeaderValue::from_str(token).map_err(|_| {
        Error::new(
            ErrorKind::InvalidInput,
            "Authentication token contains characters not allowed in a header",
        )
    })?;
    token_value.set_sensitive(true);

    let mut headers = HeaderMap::with_capacity(2);
    let _ = headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), token_value);
    let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Issue an authenticated GET request and parse the JSON response.
pub(crate) async fn fetch_json<T>(
    transport: &dyn Transport,
    url: Url,
    query: &Query<ComputeQuery>,
    token: &str,
) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let url = url::with_query(url, query)?;
    let request = TransportRequest::get(url, standard_headers(token)?);
    trace!("Fetching JSON from {}", request.url);
    let response = transport.execute(request).await?;
    response.json().map_err(|e| {
        error!("Unexpected response received: {}", e);
        e
    })
}
