// Copyright 2024 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Options for listing calls.

/// Pagination options for listing servers.
///
/// A zero limit and an empty marker are not sent to the server, so `(0, "")` lists the same
/// servers as `()`.
///
/// Any call accepting `impl Into<ServerListOptions>` can be given the positional forms
/// directly:
///
/// ```rust
/// use oscompute::ServerListOptions;
///
/// // Nothing supplied.
/// let none: ServerListOptions = ().into();
/// assert_eq!(none, ServerListOptions::default());
///
/// // Only a limit.
/// let limit: ServerListOptions = 10usize.into();
/// assert_eq!(limit.limit, Some(10));
/// assert_eq!(limit.marker, None);
///
/// // A limit and a marker.
/// let both: ServerListOptions = (10usize, "abcd").into();
/// assert_eq!(both.limit, Some(10));
/// assert_eq!(both.marker.as_deref(), Some("abcd"));
///
/// // Anything else uses the builder.
/// let marker_only = ServerListOptions::default().with_marker("abcd");
/// assert_eq!(marker_only.limit, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ServerListOptions {
    /// Maximum number of servers to return.
    pub limit: Option<usize>,
    /// ID of the last server seen, listing continues after it.
    pub marker: Option<String>,
}

impl ServerListOptions {
    /// Options with nothing supplied.
    #[inline]
    pub fn new() -> ServerListOptions {
        ServerListOptions::default()
    }

    /// Set the limit.
    #[inline]
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    /// Set the marker.
    #[inline]
    pub fn set_marker<S: Into<String>>(&mut self, marker: S) {
        self.marker = Some(marker.into());
    }

    /// Add a limit.
    #[inline]
    pub fn with_limit(mut self, limit: usize) -> ServerListOptions {
        self.set_limit(limit);
        self
    }

    /// Add a marker.
    #[inline]
    pub fn with_marker<S: Into<String>>(mut self, marker: S) -> ServerListOptions {
        self.set_marker(marker);
        self
    }
}

impl From<()> for ServerListOptions {
    fn from(_value: ()) -> ServerListOptions {
        ServerListOptions::default()
    }
}

impl From<usize> for ServerListOptions {
    fn from(value: usize) -> ServerListOptions {
        ServerListOptions::default().with_limit(value)
    }
}

impl From<Option<usize>> for ServerListOptions {
    fn from(value: Option<usize>) -> ServerListOptions {
        ServerListOptions {
            limit: value,
            marker: None,
        }
    }
}

impl<S> From<(usize, S)> for ServerListOptions
where
    S: Into<String>,
{
    fn from(value: (usize, S)) -> ServerListOptions {
        ServerListOptions::default()
            .with_limit(value.0)
            .with_marker(value.1)
    }
}

impl<S> From<(Option<usize>, Option<S>)> for ServerListOptions
where
    S: Into<String>,
{
    fn from(value: (Option<usize>, Option<S>)) -> ServerListOptions {
        ServerListOptions {
            limit: value.0,
            marker: value.1.map(Into::into),
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::ServerListOptions;

    #[test]
    fn test_from_unit() {
        let opts = ServerListOptions::from(());
        assert!(opts.limit.is_none());
        assert!(opts.marker.is_none());
    }

    #[test]
    fn test_from_limit() {
        let opts = ServerListOptions::from(5usize);
        assert_eq!(opts.limit, Some(5));
        assert!(opts.marker.is_none());
    }

    #[test]
    fn test_from_limit_and_marker() {
        let opts = ServerListOptions::from((5usize, "abc"));
        assert_eq!(opts.limit, Some(5));
        assert_eq!(opts.marker.as_deref(), Some("abc"));

        let opts = ServerListOptions::from((5usize, String::from("abc")));
        assert_eq!(opts.marker.as_deref(), Some("abc"));
    }

    #[test]
    fn test_from_options() {
        let opts = ServerListOptions::from((None, Some("abc")));
        assert!(opts.limit.is_none());
        assert_eq!(opts.marker.as_deref(), Some("abc"));

        let opts = ServerListOptions::from((Some(1usize), None::<String>));
        assert_eq!(opts.limit, Some(1));
        assert!(opts.marker.is_none());
    }

    #[test]
    fn test_builder() {
        let mut opts = ServerListOptions::new().with_marker("abc");
        assert!(opts.limit.is_none());
        opts.set_limit(10);
        assert_eq!(
            opts,
            ServerListOptions {
                limit: Some(10),
                marker: Some("abc".into()),
            }
        );
    }
}
