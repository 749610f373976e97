// Copyright 2020 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Support for `OS_` environment variables.

use std::env;

use log::debug;

use crate::loading;
use crate::{Compute, Error, ErrorKind};

// This is only used for unit testing.
trait Environment {
    fn get(&self, name: &'static str) -> Result<String, Error>;
}

#[derive(Debug, Clone, Copy)]
struct RealEnvironment;

impl Environment for RealEnvironment {
    fn get(&self, name: &'static str) -> Result<String, Error> {
        env::var(name).map_err(|_| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Required environment variable {} is not provided", name),
            )
        })
    }
}

#[inline]
fn _from_env<E: Environment>(env: E) -> Result<Compute, Error> {
    if let Ok(cloud_name) = env.get("OS_CLOUD") {
        debug!("Using cloud {} from the configuration file", cloud_name);
        return loading::from_config(cloud_name);
    }

    let token = env.get("OS_TOKEN").or_else(|_| env.get("OS_AUTH_TOKEN"))?;
    let endpoint = env
        .get("OS_COMPUTE_ENDPOINT")
        .or_else(|_| env.get("OS_ENDPOINT"))?;

    loading::new_compute(token, &endpoint, env.get("OS_CACERT").ok())
}

/// Create a `Compute` client from environment variables.
///
/// The token is taken from `OS_TOKEN` (or `OS_AUTH_TOKEN`), the endpoint from
/// `OS_COMPUTE_ENDPOINT` (or `OS_ENDPOINT`). `OS_CACERT` may point to a CA certificate.
/// If `OS_CLOUD` is set, the client is created using [from_config](fn.from_config.html).
pub fn from_env() -> Result<Compute, Error> {
    _from_env(RealEnvironment)
}

#[cfg(test)]
pub mod test {
    use std::collections::HashMap;

    use maplit::hashmap;

    use super::{Environment, _from_env};
    use crate::{Error, ErrorKind};

    impl Environment for HashMap<&'static str, &'static str> {
        fn get(&self, name: &'static str) -> Result<String, Error> {
            self.get(name)
                .cloned()
                .map(From::from)
                .ok_or_else(|| Error::new(ErrorKind::InvalidInput, name))
        }
    }

    #[test]
    fn test_token_endpoint() {
        let env = hashmap! {
            "OS_TOKEN" => "abcdef",
            "OS_COMPUTE_ENDPOINT" => "http://compute.local/v2/1234",
        };

        let compute = _from_env(env).unwrap();
        assert_eq!(compute.token(), "abcdef");
        assert_eq!(compute.endpoint().as_str(), "http://compute.local/v2/1234");
    }

    #[test]
    fn test_alternative_names() {
        let env = hashmap! {
            "OS_AUTH_TOKEN" => "abcdef",
            "OS_ENDPOINT" => "http://compute.local/v2/1234",
        };

        let compute = _from_env(env).unwrap();
        assert_eq!(compute.token(), "abcdef");
        assert_eq!(compute.endpoint().as_str(), "http://compute.local/v2/1234");
    }

    #[test]
    fn test_compute_endpoint_preferred() {
        let env = hashmap! {
            "OS_TOKEN" => "abcdef",
            "OS_ENDPOINT" => "http://generic.local",
            "OS_COMPUTE_ENDPOINT" => "http://compute.local/v2",
        };

        let compute = _from_env(env).unwrap();
        assert_eq!(compute.endpoint().as_str(), "http://compute.local/v2");
    }

    #[test]
    fn test_missing_token() {
        let env = hashmap! {
            "OS_ENDPOINT" => "http://compute.local/v2",
        };

        let err = _from_env(env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_endpoint() {
        let env = hashmap! {
            "OS_TOKEN" => "abcdef",
        };

        let err = _from_env(env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_invalid_endpoint() {
        let env = hashmap! {
            "OS_TOKEN" => "abcdef",
            "OS_ENDPOINT" => "compute.local",
        };

        let err = _from_env(env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_cacert_not_found() {
        let env = hashmap! {
            "OS_TOKEN" => "abcdef",
            "OS_ENDPOINT" => "https://compute.local/v2",
            "OS_CACERT" => "/I/do/not/exist",
        };

        let err = _from_env(env).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}
