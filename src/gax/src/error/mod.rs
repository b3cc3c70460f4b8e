// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors returned by the upload client.
//!
//! The upload client distinguishes between errors detected before a request
//! is sent (e.g. an invalid configuration), errors sending the request or
//! receiving the response (e.g. a broken connection), errors reported by the
//! service as HTTP status codes, and violations of the upload protocol
//! detected by the client.
//!
//! # Examples
//!
//! ```
//! use drive_upload_gax::error::Error;
//! fn handle_error(e: Error) {
//!     if e.is_transient() {
//!         println!("this may succeed if you try again: {e}");
//!     } else if let Some(code) = e.http_status_code() {
//!         println!("the service rejected the request with {code}: {e}");
//!     } else {
//!         println!("{e}");
//!     }
//! }
//! ```

mod core_error;
pub use core_error::*;
