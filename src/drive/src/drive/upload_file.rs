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

use super::client::DriveInner;
use super::perform_upload::PerformUpload;
use super::request_options::RequestOptions;
use crate::Result;
use crate::model::{UploadMetadata, UploadedFile};
use gax::backoff_policy::BackoffPolicyArg;
use gax::retry_policy::RetryPolicyArg;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A request builder for resumable uploads.
///
/// Created by [Drive::upload_file][crate::client::Drive::upload_file]. The
/// `with_*` methods override the client configuration for this upload only.
pub struct UploadFile<S> {
    inner: Arc<DriveInner>,
    metadata: UploadMetadata,
    source: S,
    options: RequestOptions,
    cancel: CancellationToken,
}

impl<S> UploadFile<S>
where
    S: tokio::io::AsyncRead + Unpin + Send,
{
    pub(crate) fn new(inner: Arc<DriveInner>, metadata: UploadMetadata, source: S) -> Self {
        let options = inner.options.clone();
        Self {
            inner,
            metadata,
            source,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Uploads the file.
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
    /// println!("uploaded {file:?}");
    /// # Ok(()) }
    /// ```
    pub async fn send(self) -> Result<UploadedFile> {
        PerformUpload::new(
            self.inner,
            self.metadata,
            self.source,
            self.options,
            self.cancel,
        )
        .send()
        .await
    }

    /// Overrides the chunk size for this upload.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # use drive_upload::model::UploadMetadata;
    /// # async fn sample(client: &Drive) -> anyhow::Result<()> {
    /// let file = client
    ///     .upload_file(UploadMetadata::new("greeting.txt", 11), "hello world".as_bytes())
    ///     .with_chunk_size(256 * 1024)
    ///     .send()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn with_chunk_size(mut self, v: usize) -> Self {
        self.options.chunk_size = v;
        self
    }

    /// Overrides the timeout of each request for this upload.
    pub fn with_request_timeout(mut self, v: Duration) -> Self {
        self.options.request_timeout = v;
        self
    }

    /// Overrides the retry policy for this upload.
    pub fn with_retry_policy<V: Into<RetryPolicyArg>>(mut self, v: V) -> Self {
        self.options.retry_policy = v.into().into();
        self
    }

    /// Overrides the backoff policy for this upload.
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.options.backoff_policy = v.into().into();
        self
    }

    /// Stops the upload when the token is cancelled.
    ///
    /// The client checks the token before starting the upload session, before
    /// each chunk attempt, and while waiting to resend a chunk. A request in
    /// progress runs until it completes or times out. Cancelled uploads return
    /// an error where [is_cancelled()][crate::Error::is_cancelled] is `true`.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # use drive_upload::model::UploadMetadata;
    /// # async fn sample(client: &Drive) -> anyhow::Result<()> {
    /// use tokio_util::sync::CancellationToken;
    /// let token = CancellationToken::new();
    /// let upload = client
    ///     .upload_file(UploadMetadata::new("greeting.txt", 11), "hello world".as_bytes())
    ///     .with_cancellation_token(token.clone());
    /// // Typically another task cancels the token, e.g. on shutdown.
    /// token.cancel();
    /// let result = upload.send().await;
    /// assert!(result.is_err_and(|e| e.is_cancelled()));
    /// # Ok(()) }
    /// ```
    pub fn with_cancellation_token(mut self, v: CancellationToken) -> Self {
        self.cancel = v;
        self
    }
}
