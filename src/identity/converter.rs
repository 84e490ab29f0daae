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

//! Converting Identity service payloads into tokens and service catalogs.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use log::{trace, warn};
use serde::de::DeserializeOwned;
use static_assertions::assert_obj_safe;

use super::protocol;
use crate::catalog::{ServiceCatalog, ServiceDefinition, ServiceEndpoint};
use crate::Error;

/// An access token extracted from an authentication response.
#[derive(Clone)]
pub struct AccessToken {
    /// Token ID, never empty.
    pub id: String,
    /// Expiration time, if provided by the service.
    pub expires: Option<DateTime<FixedOffset>>,
}

/// Converts authentication payloads.
///
/// Every failure is reported as `FormatError`.
pub trait PayloadConverter: fmt::Debug + Send + Sync {
    /// Extract the access token from `access.token`.
    fn convert_token(&self, payload: &str) -> Result<AccessToken, Error>;

    /// Build the service catalog from `access.serviceCatalog`.
    fn convert_catalog(&self, payload: &str) -> Result<ServiceCatalog, Error>;
}

assert_obj_safe!(PayloadConverter);

/// Converter for JSON payloads of the Identity v2.0 API.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPayloadConverter;

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("id", &"***")
            .field("expires", &self.expires)
            .finish()
    }
}

const TOKEN_ID_POINTER: &str = "/access/token/id";

/// Hide the token ID so that the payload can go into error messages.
fn redact_token(payload: &str) -> Cow<'_, str> {
    let token_id = serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| {
            value
                .pointer(TOKEN_ID_POINTER)
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        });
    match token_id {
        Some(id) if !id.is_empty() => Cow::Owned(payload.replace(&id, "***")),
        _ => Cow::Borrowed(payload),
    }
}

fn parse<T: DeserializeOwned>(what: &str, payload: &str) -> Result<T, Error> {
    serde_json::from_str(payload).map_err(|e| Error::format_error(what, &redact_token(payload), e))
}

fn parse_expires(value: Option<String>) -> Option<DateTime<FixedOffset>> {
    let value = value?;
    match DateTime::parse_from_rfc3339(&value) {
        Ok(expires) => Some(expires),
        Err(e) => {
            warn!("Ignoring invalid token expiration time {}: {}", value, e);
            None
        }
    }
}

impl JsonPayloadConverter {
    /// Create a converter.
    #[inline]
    pub fn new() -> JsonPayloadConverter {
        JsonPayloadConverter
    }

    /// Convert one service definition.
    ///
    /// `name` and `type` are required, `endpoints` default to an empty list.
    pub fn convert_definition(&self, payload: &str) -> Result<ServiceDefinition, Error> {
        parse::<protocol::CatalogRecord>("service definition", payload).map(From::from)
    }

    /// Convert one service endpoint.
    ///
    /// `publicURL` and `region` are required, version information defaults to empty strings.
    pub fn convert_endpoint(&self, payload: &str) -> Result<ServiceEndpoint, Error> {
        parse::<protocol::Endpoint>("service endpoint", payload).map(From::from)
    }
}

impl PayloadConverter for JsonPayloadConverter {
    fn convert_token(&self, payload: &str) -> Result<AccessToken, Error> {
        let root = parse::<protocol::TokenRoot>("access token", payload)?;
        let token = root.access.token;
        if token.id.is_empty() {
            return Err(Error::format_error(
                "access token",
                payload,
                "empty token ID",
            ));
        }

        let expires = parse_expires(token.expires);
        trace!("Received a token expiring at {:?}", expires);
        Ok(AccessToken {
            id: token.id,
            expires,
        })
    }

    fn convert_catalog(&self, payload: &str) -> Result<ServiceCatalog, Error> {
        let root = parse::<protocol::CatalogRoot>("service catalog", payload)?;
        let catalog: ServiceCatalog = root
            .access
            .service_catalog
            .into_iter()
            .map(ServiceDefinition::from)
            .collect();
        trace!("Received catalog: {:?}", catalog);
        Ok(catalog)
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> String {
        value.id
    }
}

#[cfg(test)]
pub mod test {
    use std::error::Error as _;

    use super::{JsonPayloadConverter, PayloadConverter};
    use crate::ErrorKind;

    pub const AUTH_RESPONSE: &str = r#"{
    "access": {
        "token": {
            "expires": "2014-02-06T04:29:11.339Z",
            "id": "12345",
            "tenant": {"id": "98765", "name": "tenant1"}
        },
        "user": {"id": "1", "name": "user"},
        "serviceCatalog": [
            {
                "name": "Nova",
                "type": "compute",
                "endpoints": [
                    {
                        "tenantId": "98765",
                        "publicURL": "https://region-a.geo-1.compute.example.com/v2/98765",
                        "publicURL2": "",
                        "region": "region-a.geo-1",
                        "versionId": "2",
                        "versionInfo": "https://region-a.geo-1.compute.example.com/v2/",
                        "versionList": "https://region-a.geo-1.compute.example.com"
                    }
                ]
            },
            {
                "name": "Identity",
                "type": "identity",
                "endpoints": [
                    {
                        "publicURL": "https://region-a.geo-1.identity.example.com:35357/v2.0/",
                        "region": "region-a.geo-1",
                        "versionId": "2.0"
                    },
                    {
                        "publicURL": "https://region-b.geo-1.identity.example.com:35357/v2.0/",
                        "region": "region-b.geo-1",
                        "versionId": "2.0"
                    }
                ]
            }
        ]
    }
}"#;

    fn assert_format_error<T: std::fmt::Debug>(result: Result<T, crate::Error>) {
        let err = result.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::FormatError, "{}", err);
    }

    #[test]
    fn test_convert_token() {
        let token = JsonPayloadConverter::new()
            .convert_token(AUTH_RESPONSE)
            .unwrap();
        assert_eq!(token.id, "12345");
        assert_eq!(token.expires.unwrap().to_rfc3339(), "2014-02-06T04:29:11.339+00:00");
        assert!(!format!("{:?}", token).contains("12345"));
    }

    #[test]
    fn test_convert_token_without_expires() {
        let token = JsonPayloadConverter::new()
            .convert_token(r#"{"access": {"token": {"id": "abc"}}}"#)
            .unwrap();
        assert_eq!(String::from(token.clone()), "abc");
        assert!(token.expires.is_none());

        let token = JsonPayloadConverter::new()
            .convert_token(r#"{"access": {"token": {"id": "abc", "expires": "tomorrow"}}}"#)
            .unwrap();
        assert!(token.expires.is_none());
    }

    #[test]
    fn test_convert_token_invalid() {
        let conv = JsonPayloadConverter::new();
        assert_format_error(conv.convert_token("not json"));
        assert_format_error(conv.convert_token("{}"));
        assert_format_error(conv.convert_token(r#"{"access": {}}"#));
        assert_format_error(conv.convert_token(r#"{"access": {"token": {}}}"#));
        assert_format_error(conv.convert_token(r#"{"access": {"token": {"id": null}}}"#));
        assert_format_error(conv.convert_token(r#"{"access": {"token": {"id": 42}}}"#));
        assert_format_error(conv.convert_token(r#"{"access": {"token": {"id": ""}}}"#));
    }

    #[test]
    fn test_convert_token_error_has_payload() {
        let err = JsonPayloadConverter::new()
            .convert_token(r#"{"access": {"token": {}}}"#)
            .err()
            .unwrap();
        let msg = err.message().unwrap();
        assert!(msg.contains(r#"{"access": {"token": {}}}"#), "{}", msg);
        assert!(msg.contains("id"), "{}", msg);
    }

    #[test]
    fn test_convert_token_error_has_source() {
        let err = JsonPayloadConverter::new()
            .convert_token("not json")
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        assert!(err.source().unwrap().is::<serde_json::Error>());
    }

    #[test]
    fn test_convert_catalog_error_hides_token() {
        let payload = r#"{"access": {"token": {"id": "s3cr3t-t0ken"}, "serviceCatalog": 42}}"#;
        let err = JsonPayloadConverter::new()
            .convert_catalog(payload)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        assert!(err.source().is_some());
        let msg = err.to_string();
        assert!(!msg.contains("s3cr3t-t0ken"), "{}", msg);
        assert!(msg.contains(r#""id": "***""#), "{}", msg);
    }

    #[test]
    fn test_convert_catalog() {
        let cat = JsonPayloadConverter::new()
            .convert_catalog(AUTH_RESPONSE)
            .unwrap();
        assert_eq!(cat.len(), 2);
        assert!(cat.exists("Nova"));
        assert!(cat.exists("Identity"));

        let nova = &cat.services()[0];
        assert_eq!(nova.name(), "Nova");
        assert_eq!(nova.service_type(), "compute");
        let endp = &nova.endpoints()[0];
        assert_eq!(
            endp.public_uri(),
            "https://region-a.geo-1.compute.example.com/v2/98765"
        );
        assert_eq!(endp.region(), "region-a.geo-1");
        assert_eq!(endp.version(), "2");
        assert_eq!(
            endp.version_info_uri(),
            "https://region-a.geo-1.compute.example.com/v2/"
        );
        assert_eq!(
            endp.version_list_uri(),
            "https://region-a.geo-1.compute.example.com"
        );

        let identity = &cat.services()[1];
        assert_eq!(identity.endpoints().len(), 2);
        assert_eq!(identity.endpoints()[1].version_info_uri(), "");
    }

    #[test]
    fn test_convert_catalog_invalid() {
        let conv = JsonPayloadConverter::new();
        assert_format_error(conv.convert_catalog("<html></html>"));
        assert_format_error(conv.convert_catalog(r#"{"access": {"token": {"id": "1"}}}"#));
        assert_format_error(conv.convert_catalog(r#"{"access": {"serviceCatalog": {}}}"#));
        assert_format_error(
            conv.convert_catalog(r#"{"access": {"serviceCatalog": [{"type": "compute"}]}}"#),
        );
        assert_format_error(conv.convert_catalog(
            r#"{"access": {"serviceCatalog": [{"name": "Nova", "type": "compute",
                "endpoints": [{"publicURL": "http://nova"}]}]}}"#,
        ));
    }

    #[test]
    fn test_convert_catalog_empty() {
        let cat = JsonPayloadConverter::new()
            .convert_catalog(r#"{"access": {"serviceCatalog": []}}"#)
            .unwrap();
        assert!(cat.is_empty());
    }

    #[test]
    fn test_convert_definition() {
        let conv = JsonPayloadConverter::new();
        let def = conv
            .convert_definition(r#"{"name": "Neutron", "type": "network"}"#)
            .unwrap();
        assert_eq!(def.name(), "Neutron");
        assert_eq!(def.service_type(), "network");
        assert!(def.endpoints().is_empty());

        assert_format_error(conv.convert_definition(r#"{"name": "Neutron"}"#));
        assert_format_error(conv.convert_definition(r#"{"type": "network"}"#));
        assert_format_error(conv.convert_definition(r#"{"name": 1, "type": "network"}"#));
    }

    #[test]
    fn test_convert_endpoint() {
        let conv = JsonPayloadConverter::new();
        let endp = conv
            .convert_endpoint(
                r#"{"publicURL": "http://public.endpoint.org", "region": "some region",
                    "versionId": "1.0"}"#,
            )
            .unwrap();
        assert_eq!(endp.public_uri(), "http://public.endpoint.org");
        assert_eq!(endp.region(), "some region");
        assert_eq!(endp.version(), "1.0");
        assert_eq!(endp.version_info_uri(), "");
        assert_eq!(endp.version_list_uri(), "");

        let endp = conv
            .convert_endpoint(r#"{"publicURL": "http://public.endpoint.org", "region": ""}"#)
            .unwrap();
        assert_eq!(endp.region(), "");
        assert_eq!(endp.version(), "");
    }

    #[test]
    fn test_convert_endpoint_invalid() {
        let conv = JsonPayloadConverter::new();
        assert_format_error(conv.convert_endpoint(r#"{"publicURL": "http://public.endpoint.org"}"#));
        assert_format_error(conv.convert_endpoint(r#"{"region": "some region"}"#));
        assert_format_error(
            conv.convert_endpoint(r#"{"publicURL": "http://public.endpoint.org", "region": null}"#),
        );
        assert_format_error(conv.convert_endpoint("[]"));
    }
}
