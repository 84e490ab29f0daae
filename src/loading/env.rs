// Copyright 2018-2020 Dmitry Tantsur <dtantsur@protonmail.com>
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
use crate::{Credential, Error, ErrorKind};

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
                ErrorKind::InvalidConfig,
                format!("Required environment variable {} is not provided", name),
            )
        })
    }
}

fn _from_env<E: Environment>(env: E) -> Result<Credential, Error> {
    if let Ok(cloud_name) = env.get("OS_CLOUD") {
        debug!("Loading cloud {} from clouds.yaml", cloud_name);
        return loading::from_config(cloud_name);
    }

    let tenant = env
        .get("OS_TENANT_NAME")
        .or_else(|_| env.get("OS_PROJECT_NAME"))
        .or_else(|_| env.get("OS_TENANT_ID"))
        .or_else(|_| env.get("OS_PROJECT_ID"))
        .ok();

    loading::build_credential(
        "environment",
        env.get("OS_AUTH_URL").ok(),
        env.get("OS_USERNAME").ok(),
        env.get("OS_PASSWORD").ok(),
        tenant,
        env.get("OS_REGION_NAME").ok(),
    )
}

/// Create a `Credential` from environment variables.
///
/// If `OS_CLOUD` is set, the named cloud is loaded from `clouds.yaml` instead.
/// Otherwise `OS_AUTH_URL`, `OS_USERNAME`, `OS_PASSWORD` and one of `OS_TENANT_NAME`,
/// `OS_PROJECT_NAME`, `OS_TENANT_ID` or `OS_PROJECT_ID` are required, `OS_REGION_NAME` is
/// optional.
pub fn from_env() -> Result<Credential, Error> {
    _from_env(RealEnvironment)
}
