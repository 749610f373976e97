// Copyright 2021 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! HTTP transport abstraction.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use log::trace;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use static_assertions::{assert_impl_all, assert_obj_safe};

use super::Error;

/// A request to execute.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Full URL including the query string.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
}

/// A response received from the transport.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body as text.
    pub body: String,
}

impl TransportRequest {
    /// Create a request without headers.
    #[inline]
    pub fn new(method: Method, url: Url) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Create a GET request with the given headers.
    #[inline]
    pub fn get(url: Url, headers: HeaderMap) -> TransportRequest {
        TransportRequest {
            method: Method::GET,
            url,
            headers,
        }
    }

    /// Add a header to the request.
    #[inline]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> TransportRequest {
        let _ = self.headers.insert(name, value);
        self
    }
}

impl TransportResponse {
    /// Create a successful response with the given body.
    #[inline]
    pub fn ok<S: Into<String>>(body: S) -> TransportResponse {
        TransportResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Parse the body as JSON.
    ///
    /// A body that does not parse into `T` yields a `MalformedResponse` error.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body).map_err(|e| {
            Error::new_malformed(format!("Cannot parse the response body as JSON: {}", e))
        })
    }
}

/// Trait for an HTTP transport.
///
/// A transport executes one request and reports either an error or a response. Network
/// failures and HTTP error statuses must be reported as errors. Retries, connection handling
/// and TLS are the transport's business.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Execute the request.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, Error>;
}

assert_obj_safe!(Transport);

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    #[inline]
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        self.as_ref().execute(request).await
    }
}

/// Transport based on `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

assert_impl_all!(HttpTransport: Send, Sync);

impl HttpTransport {
    /// Create a transport with a default HTTP client.
    #[inline]
    pub fn new() -> HttpTransport {
        HttpTransport::default()
    }

    /// Create a transport with the provided HTTP client.
    #[inline]
    pub fn new_with_client(client: Client) -> HttpTransport {
        HttpTransport { client }
    }

    /// Get a reference to the inner client.
    #[inline]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

impl From<Client> for HttpTransport {
    fn from(value: Client) -> HttpTransport {
        HttpTransport::new_with_client(value)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        trace!("Sending HTTP {} request to {}", request.method, request.url);
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .send()
            .await?;
        let response = check(response).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Message {
    message: Option<String>,
    faultstring: Option<String>,
    title: Option<String>,
}

impl From<Message> for Option<String> {
    fn from(value: Message) -> Option<String> {
        value.message.or(value.faultstring).or(value.title)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorResponse {
    Map(HashMap<String, Message>),
    Message(Message),
}

fn extract_message(text: String) -> String {
    serde_json::from_str::<ErrorResponse>(&text)
        .ok()
        .and_then(|body| match body {
            ErrorResponse::Map(map) => map.into_iter().next().and_then(|(_k, v)| v.into()),
            ErrorResponse::Message(msg) => msg.into(),
        })
        .unwrap_or(text)
}

/// Check for OpenStack errors in the response.
pub async fn check(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let message = extract_message(response.text().await?);
        trace!("HTTP request returned {}; error: {}", status, message);
        Err(Error::new(status.into(), message).with_status(status))
    } else {
        trace!(
            "HTTP request to {} returned {}",
            response.url(),
            response.status()
        );
        Ok(response)
    }
}
