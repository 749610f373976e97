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

//! A stream of servers.

use async_stream::try_stream;
use futures::pin_mut;
use futures::stream::{Stream, TryStreamExt};
use log::trace;

use super::{Compute, Error, Server, ServerListOptions};

fn chunks(
    compute: Compute,
    options: ServerListOptions,
) -> impl Stream<Item = Result<Vec<Server>, Error>> {
    let mut options = options;

    try_stream! {
        loop {
            let items = compute.fetch_servers_page(&options).await?;
            if let Some(last) = items.last() {
                trace!("Next page of servers starts after {}", last.id());
                options.marker = Some(last.id().to_string());
                yield items;
            } else {
                break
            }
        }
    }
}

/// Creates a stream of servers walking all pages.
pub(crate) fn paginated(
    compute: Compute,
    options: ServerListOptions,
) -> impl Stream<Item = Result<Server, Error>> {
    try_stream! {
        let iter = chunks(compute, options);
        pin_mut!(iter);
        while let Some(chunk) = iter.try_next().await? {
            for item in chunk {
                yield item;
            }
        }
    }
}

impl Compute {
    /// List all servers as a stream, one page at a time.
    ///
    /// Each page is requested with the configured limit and the ID of the last server of the
    /// previous page as a marker. The stream ends on the first empty page or after the first
    /// error.
    ///
    /// ```rust,no_run
    /// use futures::TryStreamExt;
    ///
    /// # async fn example() -> Result<(), oscompute::Error> {
    /// let compute = oscompute::Compute::new("<token>", "https://compute.local/v2/1234")?;
    /// let servers: Vec<oscompute::Server> = compute
    ///     .servers_stream(10usize)
    ///     .try_collect()
    ///     .await?;
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    pub fn servers_stream<O>(&self, options: O) -> impl Stream<Item = Result<Server, Error>>
    where
        O: Into<ServerListOptions>,
    {
        paginated(self.clone(), options.into())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use futures::{StreamExt, TryStreamExt};

    use crate::transport::test::FakeTransport;
    use crate::{Compute, Error, ErrorKind, Server};

    const ENDPOINT: &str = "http://compute.local/v2";

    #[tokio::test]
    async fn test_paginated() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_body(r#"{"servers": [{"id": "1"}, {"id": "2"}]}"#)
                .with_body(r#"{"servers": [{"id": "3"}]}"#)
                .with_body(r#"{"servers": []}"#),
        );
        let compute = Compute::new_with_transport("tkn", ENDPOINT, transport.clone()).unwrap();

        let servers: Vec<Server> = compute.servers_stream(2usize).try_collect().await.unwrap();
        let ids = servers.iter().map(|s| s.id()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2", "3"]);

        assert_eq!(
            transport.urls(),
            vec![
                format!("{}/servers/detail?format=json&limit=2", ENDPOINT),
                format!("{}/servers/detail?format=json&limit=2&marker=2", ENDPOINT),
                format!("{}/servers/detail?format=json&limit=2&marker=3", ENDPOINT),
            ]
        );
    }

    #[tokio::test]
    async fn test_paginated_starting_marker() {
        let transport = Arc::new(FakeTransport::new().with_body(r#"{"servers": []}"#));
        let compute = Compute::new_with_transport("tkn", ENDPOINT, transport.clone()).unwrap();

        let servers: Vec<Server> = compute
            .servers_stream((Some(5usize), Some("abc")))
            .try_collect()
            .await
            .unwrap();
        assert!(servers.is_empty());
        assert_eq!(
            transport.urls(),
            vec![format!(
                "{}/servers/detail?format=json&limit=5&marker=abc",
                ENDPOINT
            )]
        );
    }

    #[tokio::test]
    async fn test_paginated_error() {
        let transport = Arc::new(
            FakeTransport::new()
                .with_body(r#"{"servers": [{"id": "1"}]}"#)
                .with_error(Error::new(ErrorKind::TransportError, "connection reset"))
                .with_body(r#"{"servers": [{"id": "2"}]}"#),
        );
        let compute = Compute::new_with_transport("tkn", ENDPOINT, transport.clone()).unwrap();

        let results = compute.servers_stream(()).collect::<Vec<_>>().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().id(), "1");
        assert_eq!(
            results[1].as_ref().unwrap_err().kind(),
            ErrorKind::TransportError
        );
        assert_eq!(transport.requests().len(), 2);
    }
}
