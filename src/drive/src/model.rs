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

//! The request and response types for uploads.

use serde::{Deserialize, Serialize};

/// Describes the file created by an upload.
///
/// The metadata is sent as the JSON body of the request that starts the
/// upload session. The size is sent in a separate header, and must match the
/// number of bytes in the data source.
///
/// # Example
/// ```
/// # use drive_upload::model::UploadMetadata;
/// let metadata = UploadMetadata::new("report.csv", 1024)
///     .set_parents(["folder-id-1"])
///     .set_mime_type("text/csv")
///     .set_description("quarterly numbers");
/// assert_eq!(metadata.size, 1024);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct UploadMetadata {
    /// The name of the file.
    pub name: String,

    /// The ids of the parent folders, if empty the file is created in the
    /// root folder of the caller.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,

    /// The MIME type of the file, if empty the service detects it.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mime_type: String,

    /// A short description of the file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// The total size of the file, in bytes.
    #[serde(skip)]
    pub size: u64,
}

impl UploadMetadata {
    /// Creates metadata for a file with the given name and size.
    pub fn new<T: Into<String>>(name: T, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            ..Default::default()
        }
    }

    /// Sets the value of [parents][UploadMetadata::parents].
    pub fn set_parents<T, V>(mut self, v: T) -> Self
    where
        T: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.parents = v.into_iter().map(|i| i.into()).collect();
        self
    }

    /// Sets the value of [mime_type][UploadMetadata::mime_type].
    pub fn set_mime_type<T: Into<String>>(mut self, v: T) -> Self {
        self.mime_type = v.into();
        self
    }

    /// Sets the value of [description][UploadMetadata::description].
    pub fn set_description<T: Into<String>>(mut self, v: T) -> Self {
        self.description = v.into();
        self
    }
}

/// The result of a successful upload.
///
/// The service returns the metadata of the new file in the response payload.
/// The client keeps the payload as-is, applications can parse it with the
/// types of their choosing.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct UploadedFile {
    /// The HTTP status code of the final response, either 200 or 201.
    pub status: u16,

    /// The payload of the final response.
    pub payload: bytes::Bytes,
}

impl UploadedFile {
    pub(crate) fn new(status: u16, payload: bytes::Bytes) -> Self {
        Self { status, payload }
    }

    /// The id assigned to the file by the service, if the payload contains it.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # use drive_upload::model::UploadMetadata;
    /// # async fn sample(client: &Drive) -> anyhow::Result<()> {
    /// let file = client
    ///     .upload_file(UploadMetadata::new("greeting.txt", 11), "hello world".as_bytes())
    ///     .send()
    ///     .await?;
    /// if let Some(id) = file.id() {
    ///     println!("https://drive.google.com/file/d/{id}/view");
    /// }
    /// # Ok(()) }
    /// ```
    pub fn id(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct Resource {
            id: String,
        }
        serde_json::from_slice::<Resource>(&self.payload)
            .ok()
            .map(|r| r.id)
    }
}
