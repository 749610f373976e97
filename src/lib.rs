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

//! Asynchronous client for the OpenStack Compute API.
//!
//! The entry point is [Compute](struct.Compute.html). It can be created from a token and an
//! endpoint, from an [Identity](identity/trait.Identity.html), or from the environment:
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), oscompute::Error> {
//! let compute = oscompute::from_env()?;
//! for server in compute.servers(()).await? {
//!     let metadata = server.list_metadata().await?;
//!     println!("{} {:?} {:?}", server.id(), server.name(), metadata);
//! }
//! # Ok(()) }
//! # #[tokio::main]
//! # async fn main() { example().await.unwrap(); }
//! ```
//!
//! Only reading operations are supported: listing servers with their details, listing and
//! fetching flavors, and fetching server metadata.

#![crate_name = "oscompute"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_import_braces,
    unused_parens,
    while_true
)]
#![allow(clippy::new_ret_no_self, clippy::should_implement_trait)]

mod catalog;
mod compute;
mod error;
pub mod identity;
mod loading;
mod options;
mod protocol;
mod query;
mod request;
mod server;
#[cfg(feature = "stream")]
mod stream;
pub mod transport;
mod url;
mod utils;

pub use crate::catalog::{CatalogRecord, Endpoint};
pub use crate::compute::{Compute, COMPUTE_SERVICE};
pub use crate::error::{Error, ErrorKind};
pub use crate::identity::{CatalogIdentity, Identity, Service};
pub use crate::loading::{from_config, from_env};
pub use crate::options::ServerListOptions;
pub use crate::protocol::{Address, Flavor, Metadata};
pub use crate::request::AUTH_TOKEN_HEADER;
pub use crate::server::Server;
pub use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
