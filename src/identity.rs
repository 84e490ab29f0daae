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

//! Authentication using Identity API v2.0.
//!
//! Only password authentication against the `tokens` endpoint is supported. A successful
//! authentication populates the [Credential](../struct.Credential.html) with an access token,
//! a service catalog and, if the credential had none, a region inferred from the catalog:
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), osidentity::Error> {
//! let mut cred = osidentity::Credential::new(
//!     "https://identity.example.com:35357/v2.0",
//!     "admin",
//!     "pa$$w0rd",
//!     "tenant1",
//! )?;
//! let client = osidentity::identity::IdentityServiceClient::new();
//! client.authenticate(&mut cred).await?;
//! let nova = cred.public_endpoint("Nova")?;
//! # Ok(()) }
//! ```
//!
//! No retries are done: every failure is returned to the caller.

use std::future::Future;
use std::sync::Arc;

use futures::future::{self, Either};
use http::StatusCode;
use log::{debug, error, warn};

use super::client::extract_message;
use super::region::RegionResolver;
use super::services;
use super::transport::{HttpTransport, ReqwestTransport, TransportResponse};
use super::{Credential, Error, ErrorKind, SharedCredential};

mod converter;
mod protocol;
mod rest;

pub use converter::{AccessToken, JsonPayloadConverter, PayloadConverter};
pub use rest::IdentityRestClient;

const SUCCESS: &[StatusCode] = &[StatusCode::OK, StatusCode::NON_AUTHORITATIVE_INFORMATION];

/// Authenticates credentials against the Identity service.
///
/// All collaborators are provided explicitly: the HTTP transport, the payload converter and the
/// name of the identity service in the catalog (used to resolve the region).
#[derive(Debug, Clone)]
pub struct IdentityServiceClient {
    rest: IdentityRestClient,
    converter: Arc<dyn PayloadConverter>,
    resolver: RegionResolver,
    service_name: String,
}

impl Default for IdentityServiceClient {
    fn default() -> IdentityServiceClient {
        IdentityServiceClient::new()
    }
}

impl IdentityServiceClient {
    /// Create a client using `reqwest` with default settings.
    #[inline]
    pub fn new() -> IdentityServiceClient {
        IdentityServiceClient::new_with_transport(Arc::new(ReqwestTransport::new()))
    }

    /// Create a client with the provided HTTP transport.
    pub fn new_with_transport(transport: Arc<dyn HttpTransport>) -> IdentityServiceClient {
        IdentityServiceClient {
            rest: IdentityRestClient::new(transport),
            converter: Arc::new(JsonPayloadConverter::new()),
            resolver: RegionResolver::new(),
            service_name: services::IDENTITY.to_string(),
        }
    }

    /// Name of the identity service used to resolve the region.
    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Use another payload converter.
    #[inline]
    pub fn with_converter(mut self, converter: Arc<dyn PayloadConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Use another name of the identity service for region resolution.
    ///
    /// Fails with `InvalidArgument` on an empty name.
    pub fn with_service_name<S: Into<String>>(mut self, service_name: S) -> Result<Self, Error> {
        let service_name = service_name.into();
        if service_name.is_empty() {
            return Err(Error::invalid_argument("Service name cannot be empty"));
        }
        self.service_name = service_name;
        Ok(self)
    }

    /// Authenticate the credential.
    ///
    /// On success the access token and the service catalog are replaced, and the region is
    /// resolved if the credential did not have one. On failure the credential is not modified.
    ///
    /// Dropping the future before the response arrives cancels the request.
    pub async fn authenticate(&self, credential: &mut Credential) -> Result<(), Error> {
        let response = self.rest.authenticate(credential).await?;
        self.apply_response(credential, response)
    }

    /// Authenticate the credential unless `cancel` completes first.
    ///
    /// If `cancel` completes before the response arrives, the request is abandoned and
    /// `ErrorKind::Cancelled` is returned. A response that has arrived is always processed.
    pub async fn authenticate_with_cancel<F>(
        &self,
        credential: &mut Credential,
        cancel: F,
    ) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let request = self.rest.token_request(credential)?;
        let sending = Box::pin(self.rest.send(request));
        match future::select(sending, Box::pin(cancel)).await {
            Either::Left((response, _)) => self.apply_response(credential, response?),
            Either::Right(((), _)) => {
                debug!(
                    "Authentication of user {} at {} was cancelled",
                    credential.user_name(),
                    credential.auth_url()
                );
                Err(Error::new(
                    ErrorKind::Cancelled,
                    "Authentication request was cancelled",
                ))
            }
        }
    }

    /// Authenticate a shared credential.
    ///
    /// The write lock is held for the whole operation, so readers never observe a partially
    /// updated credential.
    pub async fn authenticate_shared(&self, credential: &SharedCredential) -> Result<(), Error> {
        let mut guard = credential.write().await;
        self.authenticate(&mut guard).await
    }

    fn apply_response(
        &self,
        credential: &mut Credential,
        response: TransportResponse,
    ) -> Result<(), Error> {
        if !response.status_in(SUCCESS) {
            error!(
                "Authentication of user {} at {} failed with HTTP {}",
                credential.user_name(),
                credential.auth_url(),
                response.status
            );
            return Err(Error::new(
                ErrorKind::OperationFailed,
                format!(
                    "Failed to authenticate: {}",
                    extract_message(response.body)
                ),
            )
            .with_status(response.status));
        }

        // Parse everything before touching the credential.
        let token = self.converter.convert_token(&response.body)?;
        let catalog = self.converter.convert_catalog(&response.body)?;

        credential.set_access_token_id(token.id)?;
        credential.set_token_expires(token.expires);
        credential.set_service_catalog(catalog);
        debug!(
            "Authenticated user {} at {}, {} services in the catalog",
            credential.user_name(),
            credential.auth_url(),
            credential.service_catalog().len()
        );

        if credential.region().is_none() {
            let region = self.resolver.resolve(
                credential.auth_url(),
                credential.service_catalog().services(),
                &self.service_name,
            )?;
            if region.is_empty() {
                warn!(
                    "Cannot resolve region for {} using service '{}', leaving it unset",
                    credential.auth_url(),
                    self.service_name
                );
            } else {
                debug!("Using region {}", region);
                credential.set_region(region)?;
            }
        }

        Ok(())
    }
}
