// Copyright 2021 Dmitry Tantsur <dtantsur@protonmail.com>
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

//! Authenticated client for services from the catalog.

use std::collections::HashMap;
use std::sync::Arc;

use http::header::HeaderName;
use http::Method;
use log::trace;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
use super::{url, Error, ErrorKind, SharedCredential};

/// Header carrying the access token.
pub const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");

/// A client for one service from the service catalog.
///
/// The endpoint is looked up in the catalog of the shared credential on every request, so
/// re-authentication is picked up automatically. The credential's region is used unless
/// overridden with [with_region](#method.with_region).
///
/// ```rust,no_run
/// # async fn example() -> Result<(), osidentity::Error> {
/// use osidentity::client::ServiceClient;
/// use osidentity::identity::IdentityServiceClient;
///
/// let cred = osidentity::SharedCredential::new(osidentity::from_env()?);
/// IdentityServiceClient::new().authenticate_shared(&cred).await?;
///
/// let nova = ServiceClient::new(cred, osidentity::services::COMPUTE)?;
/// let flavors: serde_json::Value = nova.get_json(&["flavors"]).await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct ServiceClient {
    credential: SharedCredential,
    transport: Arc<dyn HttpTransport>,
    service_name: String,
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message: Option<String>,
    faultstring: Option<String>,
    title: Option<String>,
}

impl From<Message> for Option<String> {
    fn from(value: Message) -> Option<String> {
        value.message.or(value.faultstring).or(value.title)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorResponse {
    Map(HashMap<String, Message>),
    Message(Message),
}

/// Extract an error message from an OpenStack error payload.
///
/// Falls back to the whole payload.
pub(crate) fn extract_message(text: String) -> String {
    serde_json::from_str::<ErrorResponse>(&text)
        .ok()
        .and_then(|body| match body {
            ErrorResponse::Map(map) => map.into_iter().next().and_then(|(_k, v)| v.into()),
            ErrorResponse::Message(msg) => msg.into(),
        })
        .unwrap_or(text)
}

/// Check for OpenStack errors in the response.
pub fn check(response: TransportResponse) -> Result<TransportResponse, Error> {
    let status = response.status;
    if status.is_client_error() || status.is_server_error() {
        let message = extract_message(response.body);
        trace!("HTTP request returned {}; error: {}", status, message);
        Err(Error::new(ErrorKind::OperationFailed, message).with_status(status))
    } else {
        Ok(response)
    }
}

impl ServiceClient {
    /// Create a client for the named service using `reqwest`.
    #[inline]
    pub fn new<S: Into<String>>(
        credential: SharedCredential,
        service_name: S,
    ) -> Result<ServiceClient, Error> {
        ServiceClient::new_with_transport(
            credential,
            Arc::new(ReqwestTransport::new()),
            service_name,
        )
    }

    /// Create a client for the named service with the provided transport.
    ///
    /// Fails with `InvalidArgument` on an empty service name.
    pub fn new_with_transport<S: Into<String>>(
        credential: SharedCredential,
        transport: Arc<dyn HttpTransport>,
        service_name: S,
    ) -> Result<ServiceClient, Error> {
        let service_name = service_name.into();
        if service_name.is_empty() {
            return Err(Error::invalid_argument("Service name cannot be empty"));
        }

        Ok(ServiceClient {
            credential,
            transport,
            service_name,
            region: None,
        })
    }

    /// Use this region instead of the credential's one.
    #[inline]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Service name.
    #[inline]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The shared credential in use.
    #[inline]
    pub fn credential(&self) -> &SharedCredential {
        &self.credential
    }

    /// Base URL of the service.
    pub async fn endpoint(&self) -> Result<Url, Error> {
        let cred = self.credential.read().await;
        let view = cred.authenticated().ok_or_else(not_authenticated)?;
        view.public_url(&self.service_name, self.region.as_deref())
    }

    /// Start an authenticated request to a path relative to the service endpoint.
    pub async fn request<I>(&self, method: Method, path: I) -> Result<TransportRequest, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let cred = self.credential.read().await;
        let view = cred.authenticated().ok_or_else(not_authenticated)?;
        let base = view.public_url(&self.service_name, self.region.as_deref())?;
        let url = url::extend(base, path)?;
        TransportRequest::new(method, url)
            .accept_json()
            .with_header(X_AUTH_TOKEN, view.access_token_id())
    }

    /// Send the request and check for errors.
    pub async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        check(self.transport.send(request).await?)
    }

    /// Send the request and receive JSON in response.
    pub async fn fetch_json<T>(&self, request: TransportRequest) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        serde_json::from_str(&response.body)
            .map_err(|e| Error::format_error("response", &response.body, e))
    }

    /// Issue a GET request and receive JSON in response.
    pub async fn get_json<T, I>(&self, path: I) -> Result<T, Error>
    where
        T: DeserializeOwned,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let request = self.request(Method::GET, path).await?;
        self.fetch_json(request).await
    }
}

fn not_authenticated() -> Error {
    Error::new(
        ErrorKind::OperationFailed,
        "The credential is not authenticated",
    )
}

#[cfg(test)]
mod test_service_client {
    use std::sync::Arc;

    use http::{Method, StatusCode};
    use serde::Deserialize;

    use super::{ServiceClient, X_AUTH_TOKEN};
    use crate::catalog::test::demo_catalog;
    use crate::credential::test::demo_credential;
    use crate::transport::test::FakeTransport;
    use crate::{ErrorKind, SharedCredential};

    #[derive(Debug, Deserialize)]
    struct Flavor {
        id: String,
        name: String,
    }

    #[derive(Debug, Deserialize)]
    struct FlavorsRoot {
        flavors: Vec<Flavor>,
    }

    fn authenticated() -> SharedCredential {
        let mut cred = demo_credential();
        cred.set_access_token_id("12345").unwrap();
        cred.set_service_catalog(demo_catalog());
        cred.set_region("region-a.geo-1").unwrap();
        SharedCredential::new(cred)
    }

    fn client(fake: &Arc<FakeTransport>, cred: SharedCredential) -> ServiceClient {
        ServiceClient::new_with_transport(cred, fake.clone(), "Nova").unwrap()
    }

    #[tokio::test]
    async fn test_request() {
        let fake = Arc::new(FakeTransport::new());
        let req = client(&fake, authenticated())
            .request(Method::GET, &["servers", "detail"])
            .await
            .unwrap();
        assert_eq!(
            req.url.as_str(),
            "https://region-a.geo-1.compute.example.com/v2/servers/detail"
        );
        assert_eq!(req.headers.get(X_AUTH_TOKEN).unwrap(), "12345");
    }

    #[tokio::test]
    async fn test_request_region_override() {
        let fake = Arc::new(FakeTransport::new());
        let nova = client(&fake, authenticated()).with_region("region-b.geo-1");
        let url = nova.endpoint().await.unwrap();
        assert_eq!(url.host_str(), Some("region-b.geo-1.compute.example.com"));
    }

    #[tokio::test]
    async fn test_request_not_authenticated() {
        let fake = Arc::new(FakeTransport::new());
        let err = client(&fake, SharedCredential::new(demo_credential()))
            .request(Method::GET, &["servers"])
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
    }

    #[tokio::test]
    async fn test_request_unknown_service() {
        let fake = Arc::new(FakeTransport::new());
        let err = ServiceClient::new_with_transport(authenticated(), fake, "Neutron")
            .unwrap()
            .endpoint()
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
    }

    #[tokio::test]
    async fn test_get_json() {
        let fake = Arc::new(FakeTransport::new().with_response(
            StatusCode::OK,
            r#"{"flavors": [{"id": "1", "name": "standard.xsmall", "links": []}]}"#,
        ));
        let root: FlavorsRoot = client(&fake, authenticated())
            .get_json(&["flavors"])
            .await
            .unwrap();
        assert_eq!(root.flavors.len(), 1);
        assert_eq!(root.flavors[0].id, "1");
        assert_eq!(root.flavors[0].name, "standard.xsmall");
        assert_eq!(fake.requests()[0].method, Method::GET);
    }

    #[tokio::test]
    async fn test_get_json_http_error() {
        let fake = Arc::new(FakeTransport::new().with_response(
            StatusCode::NOT_FOUND,
            r#"{"itemNotFound": {"message": "Flavor could not be found", "code": 404}}"#,
        ));
        let err = client(&fake, authenticated())
            .get_json::<FlavorsRoot, _>(&["flavors", "42"])
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.message(), Some("Flavor could not be found"));
    }

    #[tokio::test]
    async fn test_get_json_invalid() {
        let fake = Arc::new(FakeTransport::new().with_response(StatusCode::OK, "[]"));
        let err = client(&fake, authenticated())
            .get_json::<FlavorsRoot, _>(&["flavors"])
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::FormatError);
    }

    #[test]
    fn test_empty_service_name() {
        let fake = Arc::new(FakeTransport::new());
        let err = ServiceClient::new_with_transport(authenticated(), fake, "")
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
