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

//! Credentials and their authentication state.
//!
//! A [Credential](struct.Credential.html) starts with the static identity of the caller and is
//! populated with an access token, a service catalog and (possibly) a region by
//! [IdentityServiceClient](../identity/struct.IdentityServiceClient.html). Mutation only happens
//! through `&mut` setters, so a single writer is enforced by the compiler. Use
//! [SharedCredential](struct.SharedCredential.html) to share one credential between many
//! service clients.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{IntoUrl, Url};
use static_assertions::assert_impl_all;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::catalog::ServiceCatalog;
use super::{Error, ErrorKind};

/// Identity of the caller plus the accumulated authentication state.
///
/// ```rust
/// let mut cred = osidentity::Credential::new(
///     "https://identity.example.com:35357/v2.0",
///     "admin",
///     "pa$$w0rd",
///     "tenant1",
/// )
/// .expect("Invalid credential");
/// assert!(cred.access_token_id().is_none());
/// assert!(cred.region().is_none());
///
/// cred.set_access_token_id("abc").expect("Invalid token");
/// assert_eq!(cred.access_token_id(), Some("abc"));
/// ```
#[derive(Clone)]
pub struct Credential {
    auth_url: Url,
    user_name: String,
    password: String,
    tenant_id: String,
    access_token_id: Option<String>,
    token_expires: Option<DateTime<FixedOffset>>,
    region: Option<String>,
    service_catalog: ServiceCatalog,
}

assert_impl_all!(Credential: Send, Sync);

/// A view of a credential that is known to have an access token.
///
/// This is the narrow capability that downstream service clients need.
#[derive(Clone, Copy)]
pub struct AuthenticatedCredential<'c> {
    access_token_id: &'c str,
    region: Option<&'c str>,
    service_catalog: &'c ServiceCatalog,
}

/// A credential shared between service clients.
///
/// Readers can proceed concurrently, while authentication takes the write lock for the whole
/// token, catalog and region update.
///
/// Clones refer to the same credential.
#[derive(Clone, Debug)]
pub struct SharedCredential {
    inner: Arc<RwLock<Credential>>,
}

assert_impl_all!(SharedCredential: Send, Sync);

fn hash_secret(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[inline]
fn require_non_empty(value: String, what: &str) -> Result<String, Error> {
    if value.is_empty() {
        Err(Error::invalid_argument(format!("{} cannot be empty", what)))
    } else {
        Ok(value)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credential")
            .field("auth_url", &self.auth_url.as_str())
            .field("user_name", &self.user_name)
            .field("tenant_id", &self.tenant_id)
            .field(
                "access_token_id",
                &self
                    .access_token_id
                    .as_ref()
                    .map(|t| format!("hash({})", hash_secret(t))),
            )
            .field("token_expires", &self.token_expires)
            .field("region", &self.region)
            .field("service_catalog", &self.service_catalog)
            .finish()
    }
}

impl Credential {
    /// Create a credential.
    ///
    /// Fails with `InvalidArgument` if the URL is invalid, or the user name or tenant are empty.
    pub fn new<U, S1, S2, S3>(
        auth_url: U,
        user_name: S1,
        password: S2,
        tenant_id: S3,
    ) -> Result<Credential, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        let auth_url = auth_url.into_url()?;
        if auth_url.cannot_be_a_base() {
            return Err(Error::invalid_argument(format!(
                "Invalid authentication URL {}: wrong schema?",
                auth_url
            )));
        }

        Ok(Credential {
            auth_url,
            user_name: require_non_empty(user_name.into(), "User name")?,
            password: password.into(),
            tenant_id: require_non_empty(tenant_id.into(), "Tenant")?,
            access_token_id: None,
            token_expires: None,
            region: None,
            service_catalog: ServiceCatalog::default(),
        })
    }

    /// Create a credential with a known region.
    ///
    /// An empty region means the region is not known yet and will be resolved during
    /// authentication.
    pub fn new_with_region<U, S1, S2, S3, S4>(
        auth_url: U,
        user_name: S1,
        password: S2,
        tenant_id: S3,
        region: S4,
    ) -> Result<Credential, Error>
    where
        U: IntoUrl,
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        let mut result = Credential::new(auth_url, user_name, password, tenant_id)?;
        let region = region.into();
        if !region.is_empty() {
            result.region = Some(region);
        }
        Ok(result)
    }

    /// Authentication endpoint of the identity service.
    #[inline]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// User name.
    #[inline]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Password.
    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Tenant (project) to authenticate with.
    #[inline]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Access token, if authenticated.
    #[inline]
    pub fn access_token_id(&self) -> Option<&str> {
        self.access_token_id.as_deref()
    }

    /// Expiration time of the access token, if known.
    #[inline]
    pub fn token_expires(&self) -> Option<&DateTime<FixedOffset>> {
        self.token_expires.as_ref()
    }

    /// Region, if known.
    #[inline]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Service catalog (empty before authentication).
    #[inline]
    pub fn service_catalog(&self) -> &ServiceCatalog {
        &self.service_catalog
    }

    /// Whether an access token is present.
    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.access_token_id.is_some()
    }

    /// Whether the access token is known to be expired.
    ///
    /// Returns `false` if there is no token or its expiration time is unknown.
    pub fn is_token_expired(&self) -> bool {
        match self.token_expires {
            Some(expires) if self.access_token_id.is_some() => {
                expires.signed_duration_since(Utc::now()) <= chrono::Duration::zero()
            }
            _ => false,
        }
    }

    /// A view with the access token, or `None` if not authenticated.
    pub fn authenticated(&self) -> Option<AuthenticatedCredential<'_>> {
        self.access_token_id
            .as_deref()
            .map(|access_token_id| AuthenticatedCredential {
                access_token_id,
                region: self.region.as_deref(),
                service_catalog: &self.service_catalog,
            })
    }

    /// Public endpoint of the service in the credential's region.
    ///
    /// An unknown region is treated as an empty one.
    #[inline]
    pub fn public_endpoint(&self, service_name: &str) -> Result<String, Error> {
        self.service_catalog
            .public_endpoint(service_name, self.region().unwrap_or_default())
    }

    /// Set the access token.
    ///
    /// Fails with `InvalidArgument` on an empty token.
    pub fn set_access_token_id<S: Into<String>>(&mut self, token: S) -> Result<(), Error> {
        self.access_token_id = Some(require_non_empty(token.into(), "Access token")?);
        Ok(())
    }

    /// Set the region.
    ///
    /// Fails with `InvalidArgument` on an empty region.
    pub fn set_region<S: Into<String>>(&mut self, region: S) -> Result<(), Error> {
        self.region = Some(require_non_empty(region.into(), "Region")?);
        Ok(())
    }

    /// Replace the service catalog.
    #[inline]
    pub fn set_service_catalog(&mut self, catalog: ServiceCatalog) {
        self.service_catalog = catalog;
    }

    /// Set the expiration time of the access token.
    #[inline]
    pub(crate) fn set_token_expires(&mut self, expires: Option<DateTime<FixedOffset>>) {
        self.token_expires = expires;
    }
}

impl<'c> AuthenticatedCredential<'c> {
    /// Access token for the `X-Auth-Token` header.
    #[inline]
    pub fn access_token_id(&self) -> &'c str {
        self.access_token_id
    }

    /// Region, if known.
    #[inline]
    pub fn region(&self) -> Option<&'c str> {
        self.region
    }

    /// Service catalog.
    #[inline]
    pub fn service_catalog(&self) -> &'c ServiceCatalog {
        self.service_catalog
    }

    /// Public URL of the service in the given region or the credential's one.
    pub fn public_url(&self, service_name: &str, region: Option<&str>) -> Result<Url, Error> {
        let region = region.or(self.region).unwrap_or_default();
        self.service_catalog.public_url(service_name, region)
    }
}

impl fmt::Debug for AuthenticatedCredential<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "AuthenticatedCredential {{ access_token_id: hash({}), region: {:?}, \
             service_catalog: {:?} }}",
            hash_secret(self.access_token_id),
            self.region,
            self.service_catalog
        )
    }
}

impl SharedCredential {
    /// Share a credential.
    #[inline]
    pub fn new(credential: Credential) -> SharedCredential {
        SharedCredential {
            inner: Arc::new(RwLock::new(credential)),
        }
    }

    /// Lock the credential for reading.
    #[inline]
    pub async fn read(&self) -> RwLockReadGuard<'_, Credential> {
        self.inner.read().await
    }

    /// Lock the credential for writing.
    #[inline]
    pub async fn write(&self) -> RwLockWriteGuard<'_, Credential> {
        self.inner.write().await
    }

    /// A copy of the current state of the credential.
    #[inline]
    pub async fn snapshot(&self) -> Credential {
        self.inner.read().await.clone()
    }

    /// Access token of the current state, failing if not authenticated.
    pub async fn access_token_id(&self) -> Result<String, Error> {
        self.read()
            .await
            .access_token_id()
            .map(ToString::to_string)
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::OperationFailed,
                    "The credential is not authenticated",
                )
            })
    }
}

impl From<Credential> for SharedCredential {
    fn from(value: Credential) -> SharedCredential {
        SharedCredential::new(value)
    }
}

#[cfg(test)]
pub mod test {
    use chrono::{Duration, Utc};

    use super::{Credential, SharedCredential};
    use crate::catalog::test::demo_catalog;
    use crate::ErrorKind;

    pub fn demo_credential() -> Credential {
        Credential::new(
            "http://127.0.0.1:35357/v2.0",
            "user",
            "pa$$w0rd",
            "tenant1",
        )
        .unwrap()
    }

    #[test]
    fn test_credential_new() {
        let cred = demo_credential();
        let e = cred.auth_url();
        assert_eq!(e.scheme(), "http");
        assert_eq!(e.host_str().unwrap(), "127.0.0.1");
        assert_eq!(e.port().unwrap(), 35357u16);
        assert_eq!(e.path(), "/v2.0");
        assert_eq!(cred.user_name(), "user");
        assert_eq!(cred.password(), "pa$$w0rd");
        assert_eq!(cred.tenant_id(), "tenant1");
        assert!(cred.access_token_id().is_none());
        assert!(cred.region().is_none());
        assert!(cred.service_catalog().is_empty());
        assert!(!cred.is_authenticated());
        assert!(cred.authenticated().is_none());
    }

    #[test]
    fn test_credential_new_empty_password() {
        let cred = Credential::new("http://127.0.0.1:35357", "user", "", "tenant1").unwrap();
        assert_eq!(cred.password(), "");
    }

    #[test]
    fn test_credential_new_invalid() {
        for (url, user, tenant) in [
            ("http://127.0.0.1 35357/", "user", "tenant1"),
            ("mailto:user@example.com", "user", "tenant1"),
            ("http://127.0.0.1:35357", "", "tenant1"),
            ("http://127.0.0.1:35357", "user", ""),
        ] {
            let err = Credential::new(url, user, "pa$$w0rd", tenant).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{}", err);
        }
    }

    #[test]
    fn test_credential_new_with_region() {
        let cred = Credential::new_with_region(
            "http://127.0.0.1:35357",
            "user",
            "pa$$w0rd",
            "tenant1",
            "region-a.geo-1",
        )
        .unwrap();
        assert_eq!(cred.region(), Some("region-a.geo-1"));

        let cred =
            Credential::new_with_region("http://127.0.0.1:35357", "user", "pa$$w0rd", "tenant1", "")
                .unwrap();
        assert!(cred.region().is_none());
    }

    #[test]
    fn test_set_access_token_id() {
        let mut cred = demo_credential();
        assert_eq!(
            cred.set_access_token_id("").err().unwrap().kind(),
            ErrorKind::InvalidArgument
        );
        assert!(cred.access_token_id().is_none());

        cred.set_access_token_id("abc").unwrap();
        assert_eq!(cred.access_token_id(), Some("abc"));
        assert!(cred.is_authenticated());

        assert!(cred.set_access_token_id(String::new()).is_err());
        assert_eq!(cred.access_token_id(), Some("abc"));
    }

    #[test]
    fn test_set_region() {
        let mut cred = demo_credential();
        assert_eq!(
            cred.set_region("").err().unwrap().kind(),
            ErrorKind::InvalidArgument
        );
        assert!(cred.region().is_none());

        cred.set_region("region-a.geo-1").unwrap();
        assert_eq!(cred.region(), Some("region-a.geo-1"));
    }

    #[test]
    fn test_set_service_catalog() {
        let mut cred = demo_credential();
        cred.set_service_catalog(demo_catalog());
        assert!(cred.service_catalog().exists("Nova"));

        cred.set_service_catalog(Default::default());
        assert!(!cred.service_catalog().exists("Nova"));
    }

    #[test]
    fn test_public_endpoint_uses_region() {
        let mut cred = demo_credential();
        cred.set_service_catalog(demo_catalog());
        assert_eq!(
            cred.public_endpoint("Nova").err().unwrap().kind(),
            ErrorKind::OperationFailed
        );

        cred.set_region("region-b.geo-1").unwrap();
        assert_eq!(
            cred.public_endpoint("Nova").unwrap(),
            "https://region-b.geo-1.compute.example.com/v2"
        );
    }

    #[test]
    fn test_authenticated_view() {
        let mut cred = demo_credential();
        cred.set_access_token_id("abc").unwrap();
        cred.set_service_catalog(demo_catalog());
        cred.set_region("region-a.geo-1").unwrap();

        let view = cred.authenticated().unwrap();
        assert_eq!(view.access_token_id(), "abc");
        assert_eq!(view.region(), Some("region-a.geo-1"));
        assert_eq!(
            view.public_url("Nova", None).unwrap().host_str(),
            Some("region-a.geo-1.compute.example.com")
        );
        assert_eq!(
            view.public_url("Nova", Some("region-b.geo-1"))
                .unwrap()
                .host_str(),
            Some("region-b.geo-1.compute.example.com")
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut cred = demo_credential();
        cred.set_access_token_id("secret-token").unwrap();
        let repr = format!("{:?}", cred);
        assert!(!repr.contains("secret-token"));
        assert!(!repr.contains("pa$$w0rd"));
        assert!(repr.contains("user"));

        let repr = format!("{:?}", cred.authenticated().unwrap());
        assert!(!repr.contains("secret-token"));
    }

    #[test]
    fn test_token_expired() {
        let mut cred = demo_credential();
        cred.set_token_expires(Some((Utc::now() - Duration::minutes(5)).into()));
        // No token - nothing to expire.
        assert!(!cred.is_token_expired());

        cred.set_access_token_id("abc").unwrap();
        assert!(cred.is_token_expired());

        cred.set_token_expires(Some((Utc::now() + Duration::hours(1)).into()));
        assert!(!cred.is_token_expired());

        cred.set_token_expires(None);
        assert!(!cred.is_token_expired());
    }

    #[tokio::test]
    async fn test_shared_credential() {
        let shared = SharedCredential::new(demo_credential());
        let clone = shared.clone();
        assert_eq!(
            clone.access_token_id().await.err().unwrap().kind(),
            ErrorKind::OperationFailed
        );

        shared.write().await.set_access_token_id("abc").unwrap();
        assert_eq!(clone.access_token_id().await.unwrap(), "abc");
        assert_eq!(clone.snapshot().await.access_token_id(), Some("abc"));
        assert_eq!(clone.read().await.user_name(), "user");
    }
}
