// Copyright 2019 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Asynchronous OpenStack identity, credentials and service catalog.
//!
//! A [Credential](struct.Credential.html) holds what is needed to authenticate against the
//! Identity service (API v2.0) and, once authenticated, the access token, the service catalog
//! and the region. [IdentityServiceClient](identity/struct.IdentityServiceClient.html) performs
//! the authentication, [ServiceClient](client/struct.ServiceClient.html) issues authenticated
//! requests to services from the catalog.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), osidentity::Error> {
//! use osidentity::identity::IdentityServiceClient;
//!
//! let mut cred = osidentity::from_env()?;
//! IdentityServiceClient::new().authenticate(&mut cred).await?;
//! println!("Compute is at {}", cred.public_endpoint(osidentity::services::COMPUTE)?);
//! # Ok(()) }
//! ```

#![crate_name = "osidentity"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    dead_code,
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_doc_comments,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    unused_results,
    while_true
)]
#![allow(
    clippy::new_ret_no_self,
    clippy::should_implement_trait,
    clippy::wrong_self_convention
)]

mod catalog;
pub mod client;
mod credential;
mod error;
pub mod identity;
mod loading;
mod region;
pub mod services;
pub mod transport;
mod url;

pub use crate::catalog::{
    ServiceCatalog, ServiceDefinition, ServiceEndpoint, ServiceEndpointResolver,
};
pub use crate::credential::{AuthenticatedCredential, Credential, SharedCredential};
pub use crate::error::{Error, ErrorKind};
pub use crate::loading::{from_config, from_config_file, from_env};
pub use crate::region::RegionResolver;
