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

//! Resumable uploads for Google Drive.
//!
//! This crate uploads arbitrarily large files to Google Drive using the
//! [resumable upload] protocol. The upload starts a session with a single
//! `POST` request, then sends the data in fixed-size chunks using `PUT`
//! requests, verifying the offset confirmed by the service after each chunk.
//!
//! Most applications will use [Drive][client::Drive]:
//!
//! ```
//! # use drive_upload::client::Drive;
//! # use drive_upload::model::UploadMetadata;
//! # async fn sample() -> anyhow::Result<()> {
//! let client = Drive::builder().build().await?;
//! let data = "the quick brown fox jumps over the lazy dog";
//! let metadata = UploadMetadata::new("fox.txt", data.len() as u64)
//!     .set_mime_type("text/plain");
//! let file = client
//!     .upload_file(metadata, data.as_bytes())
//!     .send()
//!     .await?;
//! println!("uploaded file id={:?}", file.id());
//! # Ok(()) }
//! ```
//!
//! The client does not obtain credentials. Applications provide an HTTP client
//! that attaches them, see [ClientBuilder::with_http_client].
//!
//! [resumable upload]: https://developers.google.com/drive/api/guides/manage-uploads#resumable
//! [ClientBuilder::with_http_client]: builder::drive::ClientBuilder::with_http_client

pub use gax::Result;
pub use gax::error::Error;

pub mod backoff_policy;
pub mod error;
pub mod model;
pub mod retry_policy;

mod drive;

/// Clients to interact with Google Drive.
pub mod client {
    pub use crate::drive::client::Drive;
}

/// Request builders.
pub mod builder {
    pub mod drive {
        pub use crate::drive::client::ClientBuilder;
        pub use crate::drive::upload_file::UploadFile;
    }
}
