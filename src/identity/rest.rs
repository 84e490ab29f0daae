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

//! Wire-level client of the Identity service.

use std::sync::Arc;

use http::Method;
use log::debug;

use super::protocol::AuthRoot;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
use crate::{url, Credential, Error};

const TOKENS: &str = "tokens";

/// Issues raw requests to the Identity service.
///
/// HTTP statuses are not interpreted here, see
/// [IdentityServiceClient](struct.IdentityServiceClient.html).
#[derive(Debug, Clone)]
pub struct IdentityRestClient {
    transport: Arc<dyn HttpTransport>,
}

impl IdentityRestClient {
    /// Create a client with the provided transport.
    #[inline]
    pub fn new(transport: Arc<dyn HttpTransport>) -> IdentityRestClient {
        IdentityRestClient { transport }
    }

    /// Build the password authentication request for the credential.
    ///
    /// The request is `POST {auth_url}/tokens` with a JSON body.
    pub fn token_request(&self, credential: &Credential) -> Result<TransportRequest, Error> {
        let url = url::extend(credential.auth_url().clone(), &[TOKENS])?;
        TransportRequest::new(Method::POST, url)
            .accept_json()
            .with_json(&AuthRoot::new(credential))
    }

    /// Send a prepared request.
    #[inline]
    pub async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        debug!("Sending authentication request to {}", request.url);
        self.transport.send(request).await
    }

    /// Send the password authentication request for the credential.
    pub async fn authenticate(&self, credential: &Credential) -> Result<TransportResponse, Error> {
        let request = self.token_request(credential)?;
        self.send(request).await
    }
}

#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use http::header::{ACCEPT, CONTENT_TYPE};
    use http::{Method, StatusCode};
    use serde_json::json;

    use super::IdentityRestClient;
    use crate::credential::test::demo_credential;
    use crate::transport::test::FakeTransport;
    use crate::Credential;

    #[test]
    fn test_token_request() {
        let client = IdentityRestClient::new(Arc::new(FakeTransport::new()));
        let req = client.token_request(&demo_credential()).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.url.as_str(), "http://127.0.0.1:35357/v2.0/tokens");
        assert_eq!(req.headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        let body: serde_json::Value = serde_json::from_str(req.body.as_ref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "auth": {
                    "passwordCredentials": {"username": "user", "password": "pa$$w0rd"},
                    "tenantName": "tenant1"
                }
            })
        );
    }

    #[test]
    fn test_token_request_trailing_slash() {
        let client = IdentityRestClient::new(Arc::new(FakeTransport::new()));
        let cred =
            Credential::new("http://127.0.0.1:35357/v2.0/", "user", "pa$$w0rd", "tenant1").unwrap();
        let req = client.token_request(&cred).unwrap();
        assert_eq!(req.url.as_str(), "http://127.0.0.1:35357/v2.0/tokens");
    }

    #[tokio::test]
    async fn test_authenticate_returns_raw_response() {
        let fake = Arc::new(FakeTransport::new().with_response(StatusCode::UNAUTHORIZED, "nope"));
        let client = IdentityRestClient::new(fake.clone());
        let resp = client.authenticate(&demo_credential()).await.unwrap();
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp.body, "nope");
        assert_eq!(fake.requests().len(), 1);
    }
}
