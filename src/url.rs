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

//! Handy primitives for working with URLs.

use reqwest::Url;

use super::Error;

#[inline]
pub fn trim_trailing_slash(value: &str) -> &str {
    value.trim_end_matches('/')
}

/// Append path segments to the URL, ignoring a trailing slash.
#[allow(unused_results)]
pub fn extend<I>(mut url: Url, segments: I) -> Result<Url, Error>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    if url.cannot_be_a_base() {
        return Err(Error::invalid_argument(format!("URL {} cannot be a base", url)));
    }

    url.path_segments_mut()
        .map_err(|_| Error::invalid_argument("URL cannot be a base"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
