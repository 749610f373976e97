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

//! Error and Result implementations.

use std::fmt;

use http::StatusCode;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failure.
    ///
    /// Maps to HTTP 401.
    AuthenticationFailed,

    /// Access denied.
    ///
    /// Maps to HTTP 403.
    AccessDenied,

    /// Requested resource was not found.
    ///
    /// Roughly maps to HTTP 404 and 410.
    ResourceNotFound,

    /// Request returned a conflict.
    ///
    /// Maps to HTTP 409.
    Conflict,

    /// Generic failure of a client request.
    ///
    /// Any 4xx status code not covered by a more specific kind.
    OperationFailed,

    /// Internal server error.
    ///
    /// Maps to HTTP 5xx codes.
    InternalServerError,

    /// The request could not be delivered or the response could not be received.
    TransportError,

    /// The requested service is not present in the service catalog.
    ServiceNotFound,

    /// Response body does not have the expected shape.
    MalformedResponse,

    /// Invalid value passed to one of the calls.
    InvalidInput,

    /// Configuration file cannot be found or is invalid.
    InvalidConfig,
}

/// Error from an OpenStack Compute call.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
}

impl Error {
    /// Create a new error of the provided kind.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Add an HTTP status code to the error.
    #[inline]
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Add an HTTP status code to the error.
    #[inline]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.set_status(status);
        self
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status code if the error originated from an HTTP response.
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether the error was reported by the transport layer.
    ///
    /// This covers both failures to exchange data and error HTTP statuses.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::TransportError
                | ErrorKind::AuthenticationFailed
                | ErrorKind::AccessDenied
                | ErrorKind::ResourceNotFound
                | ErrorKind::Conflict
                | ErrorKind::OperationFailed
                | ErrorKind::InternalServerError
        )
    }

    #[inline]
    pub(crate) fn new_service_not_found<D: fmt::Display>(service_type: D) -> Error {
        Error::new(
            ErrorKind::ServiceNotFound,
            format!("Service {} was not found in the catalog", service_type),
        )
    }

    #[inline]
    pub(crate) fn new_malformed<D: fmt::Display>(what: D) -> Error {
        Error::new(ErrorKind::MalformedResponse, what.to_string())
    }
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "Failed to authenticate",
            ErrorKind::AccessDenied => "Access to the resource is denied",
            ErrorKind::ResourceNotFound => "Requested resource was not found",
            ErrorKind::Conflict => "Requested operation conflicts with an existing resource",
            ErrorKind::OperationFailed => "Requested operation has failed",
            ErrorKind::InternalServerError => "Internal server error or bad gateway",
            ErrorKind::TransportError => "Failed to communicate with the server",
            ErrorKind::ServiceNotFound => "Requested service was not found in the catalog",
            ErrorKind::MalformedResponse => "Received a malformed response",
            ErrorKind::InvalidInput => "Input value(s) are invalid or missing",
            ErrorKind::InvalidConfig => "configuration file cannot be found or is invalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl ::std::error::Error for Error {}

impl From<StatusCode> for ErrorKind {
    fn from(value: StatusCode) -> ErrorKind {
        match value {
            StatusCode::UNAUTHORIZED => ErrorKind::AuthenticationFailed,
            StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::ResourceNotFound,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            c if c.is_client_error() => ErrorKind::OperationFailed,
            c if c.is_server_error() => ErrorKind::InternalServerError,
            _ => ErrorKind::TransportError,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let msg = value.to_string();
        let kind = if value.is_decode() {
            ErrorKind::MalformedResponse
        } else {
            value
                .status()
                .map(From::from)
                .unwrap_or(ErrorKind::TransportError)
        };

        let error = Error::new(kind, msg);
        if let Some(status) = value.status() {
            error.with_status(status)
        } else {
            error
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::new(ErrorKind::MalformedResponse, value.to_string())
    }
}
