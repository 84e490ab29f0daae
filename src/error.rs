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

//! Error and Result implementations.

use std::error;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

// Payload fragments longer than this are cut in error messages.
const MAX_PAYLOAD_IN_MESSAGE: usize = 256;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required input was empty or otherwise invalid.
    ///
    /// Always detected before any I/O or mutation takes place.
    InvalidArgument,

    /// A JSON payload could not be parsed or a required field is missing.
    FormatError,

    /// The remote service returned an unexpected status or a catalog lookup failed.
    OperationFailed,

    /// Network or protocol error.
    ProtocolError,

    /// Configuration (environment or clouds.yaml) is invalid.
    InvalidConfig,

    /// The operation was cancelled by the caller.
    Cancelled,
}

type Source = Arc<dyn error::Error + Send + Sync>;

/// Error from an OpenStack call.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    status: Option<StatusCode>,
    source: Option<Source>,
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "Invalid argument",
            ErrorKind::FormatError => "Malformed payload",
            ErrorKind::OperationFailed => "Operation failed",
            ErrorKind::ProtocolError => "Error when accessing the server",
            ErrorKind::InvalidConfig => "Invalid configuration",
            ErrorKind::Cancelled => "Operation cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl Error {
    /// Create a new error of the provided kind.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            message: Some(message.into()),
            status: None,
            source: None,
        }
    }

    /// Create an `InvalidArgument` error.
    #[inline]
    pub(crate) fn invalid_argument<S: Into<String>>(message: S) -> Error {
        Error::new(ErrorKind::InvalidArgument, message)
    }

    /// Create a `FormatError` for the payload with the underlying cause.
    pub(crate) fn format_error<E>(what: &str, payload: &str, cause: E) -> Error
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        let cause = cause.into();
        Error::new(
            ErrorKind::FormatError,
            format!(
                "Cannot parse {} ({}) from payload: {}",
                what,
                cause,
                truncate(payload)
            ),
        )
        .with_source(cause)
    }

    #[inline]
    fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        self.source = Some(Arc::from(source.into()));
        self
    }

    /// Add an HTTP status code to the error.
    #[inline]
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Add an HTTP status code to the error.
    #[inline]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.set_status(status);
        self
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error message, if any.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// HTTP status code (if present).
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status.as_u16())?;
        }
        if let Some(ref msg) = self.message {
            write!(f, ": {}", msg)?;
        }
        Ok(())
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        let source: &(dyn error::Error + 'static) = self.source.as_deref()?;
        Some(source)
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let msg = value.to_string();
        let kind = if value.is_builder() {
            ErrorKind::InvalidArgument
        } else if value.is_decode() {
            ErrorKind::FormatError
        } else {
            ErrorKind::ProtocolError
        };

        let err = match value.status() {
            Some(status) => Error::new(kind, msg).with_status(status),
            None => Error::new(kind, msg),
        };
        err.with_source(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::new(ErrorKind::FormatError, value.to_string()).with_source(value)
    }
}

fn truncate(payload: &str) -> &str {
    if payload.len() <= MAX_PAYLOAD_IN_MESSAGE {
        return payload;
    }

    let mut end = MAX_PAYLOAD_IN_MESSAGE;
    while !payload.is_char_boundary(end) {
        end -= 1;
    }
    &payload[..end]
}
