// Copyright 2017 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Service catalog as returned by the Identity service.

use std::slice;

use log::{debug, error};
use reqwest::Url;

use super::{Error, ErrorKind};

const NO_SUCH_SERVICE: &str = "no such service";
const NO_SUCH_REGION: &str = "no such region for service";

/// One region-scoped endpoint of a service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ServiceEndpoint {
    public_uri: String,
    region: String,
    version: String,
    version_info_uri: String,
    version_list_uri: String,
}

/// A named service with its endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceDefinition {
    name: String,
    service_type: String,
    endpoints: Vec<ServiceEndpoint>,
}

/// An ordered collection of service definitions.
///
/// Names are not required to be unique, lookups always use the first match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ServiceCatalog {
    services: Vec<ServiceDefinition>,
}

/// Resolves public endpoints in a plain list of service definitions.
///
/// Useful when only the definitions are available, not a whole `ServiceCatalog`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceEndpointResolver;

/// Case-insensitive comparison used for service names and regions.
#[inline]
pub(crate) fn names_match(left: &str, right: &str) -> bool {
    left == right || left.to_lowercase() == right.to_lowercase()
}

impl ServiceEndpoint {
    /// Create an endpoint with a public URI and a region.
    ///
    /// Version information defaults to empty strings.
    pub fn new<S1, S2>(public_uri: S1, region: S2) -> ServiceEndpoint
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ServiceEndpoint {
            public_uri: public_uri.into(),
            region: region.into(),
            ..ServiceEndpoint::default()
        }
    }

    /// Add version information.
    pub fn with_version<S1, S2, S3>(
        mut self,
        version: S1,
        version_info_uri: S2,
        version_list_uri: S3,
    ) -> ServiceEndpoint
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        self.version = version.into();
        self.version_info_uri = version_info_uri.into();
        self.version_list_uri = version_list_uri.into();
        self
    }

    /// Public URI of the endpoint.
    #[inline]
    pub fn public_uri(&self) -> &str {
        &self.public_uri
    }

    /// Region of the endpoint (may be empty).
    #[inline]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Version ID (empty if unknown).
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Version information URI (empty if unknown).
    #[inline]
    pub fn version_info_uri(&self) -> &str {
        &self.version_info_uri
    }

    /// Version list URI (empty if unknown).
    #[inline]
    pub fn version_list_uri(&self) -> &str {
        &self.version_list_uri
    }

    #[inline]
    fn in_region(&self, region: &str) -> bool {
        names_match(&self.region, region)
    }
}

impl ServiceDefinition {
    /// Create a service definition.
    pub fn new<S1, S2>(name: S1, service_type: S2, endpoints: Vec<ServiceEndpoint>) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ServiceDefinition {
            name: name.into(),
            service_type: service_type.into(),
            endpoints,
        }
    }

    /// Service name, e.g. `Nova`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service type, e.g. `compute`.
    #[inline]
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Endpoints of this service.
    #[inline]
    pub fn endpoints(&self) -> &[ServiceEndpoint] {
        &self.endpoints
    }

    #[inline]
    fn has_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

impl ServiceCatalog {
    /// Create a catalog from service definitions.
    #[inline]
    pub fn new(services: Vec<ServiceDefinition>) -> ServiceCatalog {
        ServiceCatalog { services }
    }

    /// Whether a service with this name exists (case-insensitive).
    pub fn exists(&self, service_name: &str) -> bool {
        self.services.iter().any(|svc| svc.has_name(service_name))
    }

    /// Services with at least one endpoint whose region contains `zone_name`.
    ///
    /// The check is a case-sensitive substring match, not equality: `"region-a"`
    /// matches an endpoint in `"region-a.geo-1"`.
    pub fn services_in_availability_zone(&self, zone_name: &str) -> Vec<&ServiceDefinition> {
        self.services
            .iter()
            .filter(|svc| {
                svc.endpoints
                    .iter()
                    .any(|endp| endp.region.contains(zone_name))
            })
            .collect()
    }

    /// Public endpoint of the service in the given region.
    ///
    /// Fails with `OperationFailed` if there is no such service or the first service with this
    /// name has no endpoint in the region.
    pub fn public_endpoint(&self, service_name: &str, region: &str) -> Result<String, Error> {
        find_public_endpoint(&self.services, service_name, region).map(|e| e.public_uri.clone())
    }

    /// Public endpoint of the service in the given region as a URL.
    pub fn public_url(&self, service_name: &str, region: &str) -> Result<Url, Error> {
        let endp = find_public_endpoint(&self.services, service_name, region)?;
        Url::parse(&endp.public_uri).map_err(|e| {
            error!(
                "Invalid URL {} received from service catalog for service '{}' \
                 from region {:?}: {}",
                endp.public_uri, service_name, region, e
            );
            Error::new(
                ErrorKind::FormatError,
                format!("Invalid URL {} for {} - {}", endp.public_uri, service_name, e),
            )
        })
    }

    /// Service definitions in the catalog order.
    #[inline]
    pub fn services(&self) -> &[ServiceDefinition] {
        &self.services
    }

    /// Iterate over service definitions.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, ServiceDefinition> {
        self.services.iter()
    }

    /// Number of service definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the catalog is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl From<Vec<ServiceDefinition>> for ServiceCatalog {
    fn from(value: Vec<ServiceDefinition>) -> ServiceCatalog {
        ServiceCatalog::new(value)
    }
}

impl FromIterator<ServiceDefinition> for ServiceCatalog {
    fn from_iter<T: IntoIterator<Item = ServiceDefinition>>(iter: T) -> Self {
        ServiceCatalog::new(iter.into_iter().collect())
    }
}

impl<'c> IntoIterator for &'c ServiceCatalog {
    type Item = &'c ServiceDefinition;
    type IntoIter = slice::Iter<'c, ServiceDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl AsRef<[ServiceDefinition]> for ServiceCatalog {
    fn as_ref(&self) -> &[ServiceDefinition] {
        &self.services
    }
}

impl ServiceEndpointResolver {
    /// Create a resolver.
    #[inline]
    pub fn new() -> ServiceEndpointResolver {
        ServiceEndpointResolver
    }

    /// Public URI of the service in the region.
    ///
    /// Has the same contract as [ServiceCatalog::public_endpoint].
    pub fn resolve_endpoint(
        &self,
        services: &[ServiceDefinition],
        service_name: &str,
        region: &str,
    ) -> Result<String, Error> {
        find_public_endpoint(services, service_name, region).map(|e| e.public_uri.clone())
    }
}

/// Find an endpoint in the service catalog.
fn find_public_endpoint<'c>(
    services: &'c [ServiceDefinition],
    service_name: &str,
    region: &str,
) -> Result<&'c ServiceEndpoint, Error> {
    if service_name.is_empty() {
        return Err(Error::invalid_argument("Service name cannot be empty"));
    }

    let svc = services
        .iter()
        .find(|svc| svc.has_name(service_name))
        .ok_or_else(|| {
            debug!("Service '{}' is not in the catalog", service_name);
            Error::new(
                ErrorKind::OperationFailed,
                format!("{}: {}", NO_SUCH_SERVICE, service_name),
            )
        })?;

    let endp = svc
        .endpoints
        .iter()
        .find(|endp| endp.in_region(region))
        .ok_or_else(|| {
            debug!(
                "Service '{}' has no endpoint in region {:?}",
                service_name, region
            );
            Error::new(
                ErrorKind::OperationFailed,
                format!("{}: {} in {:?}", NO_SUCH_REGION, service_name, region),
            )
        })?;

    debug!("Received {:?} for {}", endp, service_name);
    Ok(endp)
}
