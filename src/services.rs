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

//! Names of OpenStack services in the service catalog.
//!
//! Catalog entries are matched by name case-insensitively. Clouds are free to name their
//! services differently, in which case pass the actual name as a string.

/// Compute service.
pub const COMPUTE: &str = "Nova";

/// Identity service.
pub const IDENTITY: &str = "Identity";

/// Networking service.
pub const NETWORK: &str = "Neutron";

/// Object storage service.
pub const OBJECT_STORAGE: &str = "Object Storage";
