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

//! Support for cloud configuration file.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::loading;
use crate::url;
use crate::utils;
use crate::{Compute, Error, ErrorKind};

/// Authentication types that carry a ready-made token.
const TOKEN_AUTH_TYPES: &[&str] = &["token", "admin_token", "v2token", "v3token"];

#[derive(Debug, Deserialize)]
struct Auth {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cloud {
    #[serde(default)]
    auth: Option<Auth>,
    #[serde(default)]
    auth_type: Option<String>,
    #[serde(default)]
    cacert: Option<String>,
    #[serde(default)]
    compute_endpoint_override: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Root {
    clouds: HashMap<String, Cloud>,
}

fn find_config<S: AsRef<str>>(filename: S) -> Option<PathBuf> {
    let filename = filename.as_ref();
    let current = Path::new(filename);
    if current.is_file() {
        match current.canonicalize() {
            Ok(val) => return Some(val),
            Err(e) => warn!("Cannot canonicalize {:?}: {}", current, e),
        }
    }

    if let Some(mut config) = dirs::home_dir() {
        config.push(".config");
        config.push("openstack");
        config.push(filename);
        if config.is_file() {
            return Some(config);
        }
    } else {
        warn!("Cannot find home directory");
    }

    let abs = Path::new("/etc/openstack").join(filename);
    if abs.is_file() {
        Some(abs)
    } else {
        None
    }
}

fn read_yaml(filename: &str, required: bool) -> Result<serde_yaml::Mapping, Error> {
    let path = match find_config(filename) {
        Some(path) => path,
        None if required => {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("{} was not found in any location", filename),
            ))
        }
        None => return Ok(serde_yaml::Mapping::new()),
    };
    debug!("Reading cloud configuration from {:?}", path);

    let content = File::open(&path).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot read {:?}: {}", path, e),
        )
    })?;

    match serde_yaml::from_reader(content).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse {:?}: {}", path, e),
        )
    })? {
        serde_yaml::Value::Mapping(mapping) => Ok(mapping),
        other => Err(Error::new(
            ErrorKind::InvalidConfig,
            format!("Root of {:?} is {:?}, not a mapping", path, other),
        )),
    }
}

fn compute_from_cloud(name: &str, cloud: Cloud) -> Result<Compute, Error> {
    if let Some(auth_type) = cloud.auth_type {
        if !TOKEN_AUTH_TYPES.contains(&auth_type.as_str()) {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("Unsupported authentication type: {}", auth_type),
            ));
        }
    }

    let (token, auth_endpoint) = match cloud.auth {
        Some(auth) => (auth.token, auth.endpoint),
        None => (None, None),
    };
    let token = token.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cloud {} does not provide auth.token", name),
        )
    })?;

    let endpoint = cloud
        .compute_endpoint_override
        .or(auth_endpoint)
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!(
                    "Cloud {} provides neither compute_endpoint_override nor auth.endpoint",
                    name
                ),
            )
        })?;
    let endpoint = url::parse_base(&endpoint).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Invalid compute endpoint of cloud {}: {}", name, e.message()),
        )
    })?;

    if let Some(region) = cloud.region_name {
        warn!(
            "Ignoring region {} of cloud {}, the compute endpoint is set explicitly",
            region, name
        );
    }

    loading::new_compute(token, endpoint.as_str(), cloud.cacert)
}

fn from_files(
    name: &str,
    mut clouds: serde_yaml::Mapping,
    secure: serde_yaml::Mapping,
) -> Result<Compute, Error> {
    utils::merge_mappings(secure, &mut clouds, true);

    let mut clouds_root: Root = serde_yaml::from_value(serde_yaml::Value::Mapping(clouds))
        .map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot parse the merged cloud configuration: {}", e),
            )
        })?;

    let cloud = clouds_root.clouds.remove(name).ok_or_else(|| {
        Error::new(ErrorKind::InvalidConfig, format!("No such cloud: {}", name))
    })?;

    compute_from_cloud(name, cloud)
}

/// Create a `Compute` client from a `clouds.yaml` configuration file.
///
/// The file is looked up in the current directory, then in `~/.config/openstack` and
/// `/etc/openstack`. Values from an optional `secure.yaml` override it. The cloud must
/// provide `auth.token` and either `compute_endpoint_override` or `auth.endpoint`.
pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Compute, Error> {
    let clouds = read_yaml("clouds.yaml", true)?;
    let secure = read_yaml("secure.yaml", false)?;

    from_files(cloud_name.as_ref(), clouds, secure)
}

#[cfg(test)]
pub mod test {
    use super::{find_config, from_files, read_yaml};
    use crate::utils::test::to_yaml;
    use crate::ErrorKind;

    #[cfg(any(feature = "native-tls", feature = "rustls"))]
    use std::io::Write;

    #[test]
    fn test_from_config() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      token: abcdef
    compute_endpoint_override: http://compute.local/v2/1234"#,
        );

        let compute = from_files("cloud_name", clouds, serde_yaml::Mapping::new()).unwrap();
        assert_eq!(compute.token(), "abcdef");
        assert_eq!(compute.endpoint().as_str(), "http://compute.local/v2/1234");
    }

    #[test]
    fn test_from_config_auth_endpoint() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth_type: token
    auth:
      token: abcdef
      endpoint: http://compute.local/v2"#,
        );

        let compute = from_files("cloud_name", clouds, serde_yaml::Mapping::new()).unwrap();
        assert_eq!(compute.endpoint().as_str(), "http://compute.local/v2");
    }

    #[test]
    fn test_from_config_override_preferred() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      token: abcdef
      endpoint: http://generic.local
    compute_endpoint_override: http://compute.local/v2
    region_name: region1"#,
        );

        let compute = from_files("cloud_name", clouds, serde_yaml::Mapping::new()).unwrap();
        assert_eq!(compute.endpoint().as_str(), "http://compute.local/v2");
    }

    #[test]
    fn test_from_config_secure() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      endpoint: http://compute.local/v2"#,
        );
        let secure = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      token: secret"#,
        );

        let compute = from_files("cloud_name", clouds, secure).unwrap();
        assert_eq!(compute.token(), "secret");
        assert_eq!(compute.endpoint().as_str(), "http://compute.local/v2");
    }

    #[test]
    fn test_from_config_no_such_cloud() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      token: abcdef
      endpoint: http://compute.local/v2"#,
        );

        let e = from_files("other", clouds, serde_yaml::Mapping::new())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
        assert!(e.to_string().contains("No such cloud: other"));
    }

    #[test]
    fn test_from_config_missing_token() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    compute_endpoint_override: http://compute.local/v2"#,
        );

        let e = from_files("cloud_name", clouds, serde_yaml::Mapping::new())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_from_config_missing_endpoint() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      token: abcdef"#,
        );

        let e = from_files("cloud_name", clouds, serde_yaml::Mapping::new())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_from_config_invalid_endpoint() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      token: abcdef
      endpoint: not a url"#,
        );

        let e = from_files("cloud_name", clouds, serde_yaml::Mapping::new())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_from_config_unsupported_auth_type() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth_type: password
    auth:
      token: abcdef
      endpoint: http://compute.local/v2"#,
        );

        let e = from_files("cloud_name", clouds, serde_yaml::Mapping::new())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
        assert!(e.to_string().contains("Unsupported authentication type"));
    }

    #[test]
    #[cfg(any(feature = "native-tls", feature = "rustls"))]
    fn test_from_config_cacert() {
        let mut cacert = tempfile::NamedTempFile::new().unwrap();
        write!(
            cacert,
            r#"-----BEGIN CERTIFICATE-----
MIIBYzCCAQqgAwIBAgIUJcTlPhsFyWG9S0pAAElKuSFEPBYwCgYIKoZIzj0EAwIw
FDESMBAGA1UEAwwJbG9jYWxob3N0MB4XDTIwMTAwMjExNTU1NloXDTIwMTEwMTEx
NTU1NlowFDESMBAGA1UEAwwJbG9jYWxob3N0MFkwEwYHKoZIzj0CAQYIKoZIzj0D
AQcDQgAEsfpkV9dAThk54U1K+rXUnNbpwuNo5wCRrKpk+cNR/2HBO8VydNj7dkxs
VBUvI7M9hY8dgg1jBVoPcCf0GSOvuqM6MDgwFAYDVR0RBA0wC4IJbG9jYWxob3N0
MAsGA1UdDwQEAwIHgDATBgNVHSUEDDAKBggrBgEFBQcDATAKBggqhkjOPQQDAgNH
ADBEAiAdjF7484kjb3XJoLbgqnZh4V1yHKs57eBVuil9/V0YugIgLwb/vSUAPowb
hK9jLBzNvo8qzKqaGfnGieuLeXCqFDA=
-----END CERTIFICATE-----"#
        )
        .unwrap();
        cacert.flush().unwrap();

        let clouds = to_yaml(format!(
            r#"clouds:
  cloud_name:
    auth:
      token: abcdef
      endpoint: https://compute.local/v2
    cacert: "{}""#,
            cacert.path().display()
        ));

        let _ = from_files("cloud_name", clouds, serde_yaml::Mapping::new()).unwrap();
    }

    #[test]
    fn test_from_config_cacert_not_found() {
        let clouds = to_yaml(
            r#"clouds:
  cloud_name:
    auth:
      token: abcdef
      endpoint: https://compute.local/v2
    cacert: /I/do/not/exist"#,
        );

        let e = from_files("cloud_name", clouds, serde_yaml::Mapping::new())
            .err()
            .unwrap();
        assert_eq!(e.kind(), ErrorKind::InvalidConfig);
        if cfg!(any(feature = "native-tls", feature = "rustls")) {
            assert!(e.to_string().contains("Cannot open cacert file"));
        } else {
            assert!(e.to_string().contains("TLS support is disabled"));
        }
    }

    #[test]
    fn test_read_config_file_error() {
        let e = read_yaml("doesnt_exist", true).err().unwrap();
        assert_eq!(
            "configuration file cannot be found or is invalid: doesnt_exist was not found in any location",
            e.to_string()
        );
    }

    #[test]
    fn test_read_optional_config_file() {
        let mapping = read_yaml("doesnt_exist", false).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_find_config_fail() {
        let config = find_config("shouldnt_exist");
        assert_eq!(config, None);
    }
}
