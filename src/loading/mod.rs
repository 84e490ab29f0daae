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

//! Support for loading credentials from external input.

use crate::{Credential, Error, ErrorKind};

/// Build a credential, reporting missing pieces as configuration errors.
fn build_credential(
    source: &str,
    auth_url: Option<String>,
    user_name: Option<String>,
    password: Option<String>,
    tenant: Option<String>,
    region: Option<String>,
) -> Result<Credential, Error> {
    let auth_url = auth_url.ok_or_else(|| missing(source, "an auth_url"))?;
    let user_name = user_name.ok_or_else(|| missing(source, "a user name"))?;
    let password = password.ok_or_else(|| missing(source, "a password"))?;
    let tenant = tenant.ok_or_else(|| missing(source, "a tenant (project) name or ID"))?;

    Credential::new_with_region(
        auth_url.as_str(),
        user_name,
        password,
        tenant,
        region.unwrap_or_default(),
    )
    .map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Invalid credential in {}: {}", source, e),
        )
    })
}

#[inline]
fn missing(source: &str, what: &str) -> Error {
    Error::new(
        ErrorKind::InvalidConfig,
        format!("Identity authentication from {} requires {}", source, what),
    )
}

mod config;
mod env;

pub use config::{from_config, from_config_file};
pub use env::from_env;
