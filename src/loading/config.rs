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
use crate::{Credential, Error, ErrorKind};

const CLOUDS_YAML: &str = "clouds.yaml";

#[derive(Debug, Default, Deserialize)]
struct Auth {
    #[serde(default)]
    auth_url: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    tenant_id: Option<String>,
    #[serde(default)]
    tenant_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Cloud {
    #[serde(default)]
    auth: Option<Auth>,
    #[serde(default)]
    auth_type: Option<String>,
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

    if let Some(mut home) = dirs::home_dir() {
        home.push(".config/openstack");
        home.push(filename);
        if home.is_file() {
            return Some(home);
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

fn read_yaml(path: &Path) -> Result<Root, Error> {
    let content = File::open(path).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot read {}: {}", path.display(), e),
        )
    })?;

    serde_yaml::from_reader(content).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse {}: {}", path.display(), e),
        )
    })
}

fn credential_from_cloud(name: &str, mut root: Root) -> Result<Credential, Error> {
    let cloud =
        root.clouds.remove(name).ok_or_else(|| {
            Error::new(ErrorKind::InvalidConfig, format!("No such cloud: {}", name))
        })?;

    if let Some(auth_type) = cloud.auth_type {
        if auth_type != "password" {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("Unsupported authentication type: {}", auth_type),
            ));
        }
    }

    let auth = cloud.auth.unwrap_or_default();
    let tenant = auth
        .tenant_name
        .or(auth.project_name)
        .or(auth.tenant_id)
        .or(auth.project_id);

    loading::build_credential(
        &format!("cloud {}", name),
        auth.auth_url,
        auth.username,
        auth.password,
        tenant,
        cloud.region_name,
    )
}

/// Create a `Credential` from an explicit `clouds.yaml`-style file.
pub fn from_config_file<P, S>(path: P, cloud_name: S) -> Result<Credential, Error>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    debug!("Reading cloud configuration from {}", path.display());
    let root = read_yaml(path)?;
    credential_from_cloud(cloud_name.as_ref(), root)
}

/// Create a `Credential` from a `clouds.yaml` configuration file.
///
/// The file is looked up in the current directory, then in `~/.config/openstack` and finally
/// in `/etc/openstack`.
pub fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Credential, Error> {
    let path = find_config(CLOUDS_YAML).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("{} was not found in any location", CLOUDS_YAML),
        )
    })?;
    from_config_file(path, cloud_name)
}
