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

//! JSON structures and protocol bits for the Identity v2.0 tokens API.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::catalog::{ServiceDefinition, ServiceEndpoint};
use crate::Credential;

#[derive(Clone, Serialize)]
pub struct PasswordCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Serialize)]
pub struct Auth {
    #[serde(rename = "passwordCredentials")]
    pub password_credentials: PasswordCredentials,
    #[serde(rename = "tenantName")]
    pub tenant_name: String,
}

#[derive(Clone, Serialize)]
pub struct AuthRoot {
    pub auth: Auth,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(default)]
    pub expires: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenAccess {
    pub token: Token,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenRoot {
    pub access: TokenAccess,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "publicURL")]
    pub public_url: String,
    pub region: String,
    #[serde(rename = "versionId", default)]
    pub version_id: Option<String>,
    #[serde(rename = "versionInfo", default)]
    pub version_info: Option<String>,
    #[serde(rename = "versionList", default)]
    pub version_list: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogAccess {
    #[serde(rename = "serviceCatalog")]
    pub service_catalog: Vec<CatalogRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogRoot {
    pub access: CatalogAccess,
}

impl AuthRoot {
    pub fn new(credential: &Credential) -> AuthRoot {
        AuthRoot {
            auth: Auth {
                password_credentials: PasswordCredentials {
                    username: credential.user_name().to_string(),
                    password: credential.password().to_string(),
                },
                tenant_name: credential.tenant_id().to_string(),
            },
        }
    }
}

impl From<Endpoint> for ServiceEndpoint {
    fn from(value: Endpoint) -> ServiceEndpoint {
        ServiceEndpoint::new(value.public_url, value.region).with_version(
            value.version_id.unwrap_or_default(),
            value.version_info.unwrap_or_default(),
            value.version_list.unwrap_or_default(),
        )
    }
}

impl From<CatalogRecord> for ServiceDefinition {
    fn from(value: CatalogRecord) -> ServiceDefinition {
        ServiceDefinition::new(
            value.name,
            value.service_type,
            value.endpoints.into_iter().map(From::from).collect(),
        )
    }
}
