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

//! HTTP transport used by the clients.

use std::fmt::Debug;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use http::{Method, StatusCode};
use log::trace;
use reqwest::{Client, Url};
use serde::Serialize;
use static_assertions::{assert_impl_all, assert_obj_safe};

use super::Error;

const APPLICATION_JSON: &str = "application/json";

/// An HTTP request to send.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Full URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<String>,
}

/// An HTTP response with its body read into memory.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: String,
}

/// An HTTP transport.
///
/// Cancellation happens by dropping the future returned by `send`.
#[async_trait]
pub trait HttpTransport: Debug + Send + Sync {
    /// Send the request and read the whole response.
    ///
    /// HTTP errors are not checked here, only network and protocol ones.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error>;
}

assert_obj_safe!(HttpTransport);

/// Transport implemented with `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

assert_impl_all!(ReqwestTransport: Send, Sync);

impl TransportRequest {
    /// Start a request.
    pub fn new(method: Method, url: Url) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Add a header.
    ///
    /// Fails with `InvalidArgument` if the value cannot be used in a header.
    pub fn with_header<V: AsRef<str>>(mut self, name: HeaderName, value: V) -> Result<Self, Error> {
        let value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| Error::invalid_argument(format!("Invalid value for {}: {}", name, e)))?;
        let _ = self.headers.insert(name, value);
        Ok(self)
    }

    /// Accept JSON in response.
    pub fn accept_json(mut self) -> Self {
        let _ = self
            .headers
            .insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        self
    }

    /// Add a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_string(body)?);
        let _ = self
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Ok(self)
    }
}

impl TransportResponse {
    /// Whether the status is one of the provided ones.
    #[inline]
    pub fn status_in(&self, expected: &[StatusCode]) -> bool {
        expected.contains(&self.status)
    }
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    #[inline]
    pub fn new() -> ReqwestTransport {
        ReqwestTransport::new_with_client(Client::new())
    }

    /// Create a transport with the provided client.
    #[inline]
    pub fn new_with_client(client: Client) -> ReqwestTransport {
        ReqwestTransport { client }
    }

    /// Get a reference to the inner client.
    #[inline]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

impl From<Client> for ReqwestTransport {
    fn from(value: Client) -> ReqwestTransport {
        ReqwestTransport::new_with_client(value)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        trace!("Sending HTTP {} request to {}", request.method, request.url);
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        trace!("HTTP request to {} returned {}", response.url(), status);
        let body = response.text().await?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
