// Copyright 2020 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Inferring the region from the authentication endpoint.

use log::{debug, trace};
use reqwest::Url;

use super::catalog::{names_match, ServiceDefinition, ServiceEndpoint};
use super::url;
use super::Error;

/// Infers which region the caller is implicitly operating in.
///
/// The service is looked up by name first. If there is no such service, the first service with
/// an endpoint that is a part of the authentication URL is used instead. The region of the first
/// endpoint that is a part of the authentication URL and has a region is the result.
///
/// An empty string means the region cannot be resolved. It is not an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionResolver;

impl RegionResolver {
    /// Create a resolver.
    #[inline]
    pub fn new() -> RegionResolver {
        RegionResolver
    }

    /// Resolve the region for the service.
    ///
    /// Fails with `InvalidArgument` only when `service_name` is empty.
    pub fn resolve(
        &self,
        auth_url: &Url,
        services: &[ServiceDefinition],
        service_name: &str,
    ) -> Result<String, Error> {
        if service_name.is_empty() {
            return Err(Error::invalid_argument("Service name cannot be empty"));
        }

        let auth_uri = url::trim_trailing_slash(auth_url.as_str());

        let svc = match services.iter().find(|svc| names_match(svc.name(), service_name)) {
            Some(svc) => svc,
            None => {
                trace!(
                    "No service named '{}', looking for an endpoint matching {}",
                    service_name,
                    auth_uri
                );
                match services
                    .iter()
                    .find(|svc| svc.endpoints().iter().any(|e| is_part_of(e, auth_uri)))
                {
                    Some(svc) => svc,
                    None => {
                        debug!(
                            "Cannot resolve region: no service matches '{}' or {}",
                            service_name, auth_uri
                        );
                        return Ok(String::new());
                    }
                }
            }
        };

        let region = svc
            .endpoints()
            .iter()
            .find(|e| is_part_of(e, auth_uri) && !e.region().is_empty())
            .map(|e| e.region().to_string())
            .unwrap_or_default();
        debug!(
            "Resolved region {:?} using service '{}'",
            region,
            svc.name()
        );
        Ok(region)
    }
}

/// Whether the endpoint URI is a substring of the authentication URI.
#[inline]
fn is_part_of(endpoint: &ServiceEndpoint, auth_uri: &str) -> bool {
    let public_uri = url::trim_trailing_slash(endpoint.public_uri());
    auth_uri.contains(public_uri)
}
