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

use super::request_options::{RequestOptions, validate_chunk_size};
use crate::builder::drive::UploadFile;
use crate::model::UploadMetadata;
use crate::{Error, Result};
use gax::backoff_policy::BackoffPolicyArg;
use gax::retry_policy::RetryPolicyArg;
use std::sync::Arc;
use std::time::Duration;

/// Implements a client for resumable uploads to Google Drive.
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// # use drive_upload::client::Drive;
/// let client = Drive::builder().build().await?;
/// // use `client` to upload files to Google Drive.
/// # drive_upload::Result::<()>::Ok(()) });
/// ```
///
/// # Configuration
///
/// To configure `Drive` use the `with_*` methods in the type returned by
/// [builder()][Drive::builder]. The default configuration should work for
/// most applications. Common configuration changes include
///
/// * [with_http_client()]: the client does not obtain or refresh credentials.
///   Applications provide an HTTP client that attaches them to each request.
/// * [with_endpoint()]: by default this client uses the global endpoint
///   (`https://www.googleapis.com`). Tests and applications running in
///   restricted networks may want to override this default.
///
/// # Pooling and Cloning
///
/// `Drive` holds a connection pool internally, it is advised to create one and
/// then reuse it. You do not need to wrap `Drive` in an [Rc](std::rc::Rc) or
/// [Arc] to reuse it, because it already uses an `Arc` internally.
///
/// [with_http_client()]: ClientBuilder::with_http_client
/// [with_endpoint()]: ClientBuilder::with_endpoint
#[derive(Clone, Debug)]
pub struct Drive {
    inner: Arc<DriveInner>,
}

#[derive(Clone, Debug)]
pub(crate) struct DriveInner {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub options: RequestOptions,
}

impl Drive {
    /// Returns a builder for [Drive].
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # async fn sample() -> anyhow::Result<()> {
    /// let client = Drive::builder().build().await?;
    /// # Ok(()) }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Uploads a file using a resumable upload session.
    ///
    /// The client reads the data in chunks, and keeps only one chunk in
    /// memory. The data source must produce exactly
    /// [metadata.size][UploadMetadata::size] bytes.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # use drive_upload::model::UploadMetadata;
    /// # async fn sample(client: &Drive) -> anyhow::Result<()> {
    /// let file = tokio::fs::File::open("report.csv").await?;
    /// let size = file.metadata().await?.len();
    /// let response = client
    ///     .upload_file(UploadMetadata::new("report.csv", size), file)
    ///     .send()
    ///     .await?;
    /// println!("response details={response:?}");
    /// # Ok(()) }
    /// ```
    ///
    /// # Parameters
    /// * `metadata` - the name, parents, and size of the new file.
    /// * `source` - the file data.
    pub fn upload_file<S>(&self, metadata: UploadMetadata, source: S) -> UploadFile<S>
    where
        S: tokio::io::AsyncRead + Unpin + Send,
    {
        UploadFile::new(self.inner.clone(), metadata, source)
    }

    pub(crate) fn new(builder: ClientBuilder) -> Result<Self> {
        tracing::info!("builder={builder:?}");
        let client = match builder.client {
            Some(c) => c,
            None => reqwest::Client::builder()
                // The service uses `308 Resume Incomplete` to report progress.
                // These are not redirects.
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(Error::io)?,
        };
        let endpoint = builder
            .endpoint
            .unwrap_or_else(|| self::DEFAULT_HOST.to_string());
        let endpoint = endpoint.trim_end_matches('/').to_string();
        reqwest::Url::parse(&endpoint).map_err(Error::binding)?;
        validate_chunk_size(builder.default_options.chunk_size)?;
        let inner = Arc::new(DriveInner {
            client,
            endpoint,
            options: builder.default_options,
        });
        Ok(Self { inner })
    }
}

/// A builder for [Drive].
///
/// ```
/// # use drive_upload::client::Drive;
/// # async fn sample() -> anyhow::Result<()> {
/// let builder = Drive::builder();
/// let client = builder
///     .with_endpoint("https://www.googleapis.com")
///     .with_chunk_size(8 * 1024 * 1024)
///     .build()
///     .await?;
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    pub(crate) endpoint: Option<String>,
    pub(crate) client: Option<reqwest::Client>,
    // Default options for requests.
    pub(crate) default_options: RequestOptions,
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            endpoint: None,
            client: None,
            default_options: RequestOptions::new(),
        }
    }

    /// Creates a new client.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # async fn sample() -> anyhow::Result<()> {
    /// let client = Drive::builder().build().await?;
    /// # Ok(()) }
    /// ```
    pub async fn build(self) -> Result<Drive> {
        Drive::new(self)
    }

    /// Sets the endpoint.
    ///
    /// Upload sessions are created at `{endpoint}/upload/drive/v3/files`.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # async fn sample() -> anyhow::Result<()> {
    /// let client = Drive::builder()
    ///     .with_endpoint("http://localhost:8080")
    ///     .build()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn with_endpoint<V: Into<String>>(mut self, v: V) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Configures the HTTP client used for all requests.
    ///
    /// The client must attach valid credentials to each request, typically as
    /// a default `Authorization` header. The client should not follow
    /// redirects.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # async fn sample(token: &str) -> anyhow::Result<()> {
    /// use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
    /// let mut headers = HeaderMap::new();
    /// headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    /// let http = reqwest::Client::builder()
    ///     .default_headers(headers)
    ///     .redirect(reqwest::redirect::Policy::none())
    ///     .build()?;
    /// let client = Drive::builder().with_http_client(http).build().await?;
    /// # Ok(()) }
    /// ```
    pub fn with_http_client(mut self, v: reqwest::Client) -> Self {
        self.client = Some(v);
        self
    }

    /// Configure the size of each chunk.
    ///
    /// The client keeps one chunk in memory, and resends it if the request
    /// fails with a transient error. Larger chunks need fewer requests, but
    /// more memory. The service recommends multiples of 256 KiB.
    ///
    /// The default is 1 MiB.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # async fn sample() -> anyhow::Result<()> {
    /// let client = Drive::builder()
    ///     .with_chunk_size(8 * 1024 * 1024)
    ///     .build()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn with_chunk_size(mut self, v: usize) -> Self {
        self.default_options.chunk_size = v;
        self
    }

    /// Configure the timeout for each request.
    ///
    /// The timeout applies to the request that starts the upload session, and
    /// to each chunk upload attempt. The default is 30 seconds.
    pub fn with_request_timeout(mut self, v: Duration) -> Self {
        self.default_options.request_timeout = v;
        self
    }

    /// Configure the retry policy.
    ///
    /// The client resends a chunk after transient errors. The retry policy
    /// controls how many attempts are made, or for how long, before giving up.
    /// The policy restarts for each chunk.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # async fn sample() -> anyhow::Result<()> {
    /// use drive_upload::retry_policy::RetryableErrors;
    /// use gax::retry_policy::RetryPolicyExt;
    /// use std::time::Duration;
    /// let client = Drive::builder()
    ///     .with_retry_policy(RetryableErrors.with_time_limit(Duration::from_secs(120)))
    ///     .build()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn with_retry_policy<V: Into<RetryPolicyArg>>(mut self, v: V) -> Self {
        self.default_options.retry_policy = v.into().into();
        self
    }

    /// Configure the retry backoff policy.
    ///
    /// The backoff policy controls how long to wait before resending a chunk.
    ///
    /// # Example
    /// ```
    /// # use drive_upload::client::Drive;
    /// # async fn sample() -> anyhow::Result<()> {
    /// use gax::exponential_backoff::ExponentialBackoffBuilder;
    /// use std::time::Duration;
    /// let policy = ExponentialBackoffBuilder::new()
    ///     .with_initial_delay(Duration::from_millis(100))
    ///     .with_maximum_delay(Duration::from_secs(10))
    ///     .build()?;
    /// let client = Drive::builder()
    ///     .with_backoff_policy(policy)
    ///     .build()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.default_options.backoff_policy = v.into().into();
        self
    }
}

const DEFAULT_HOST: &str = "https://www.googleapis.com";

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gax::exponential_backoff::ExponentialBackoffBuilder;
    use gax::retry_policy::{NeverRetry, RetryPolicy};
    use gax::retry_state::RetryState;

    /// A builder with fast backoffs, suitable for tests.
    pub(crate) fn test_builder() -> ClientBuilder {
        Drive::builder().with_backoff_policy(
            ExponentialBackoffBuilder::new()
                .with_initial_delay(Duration::from_millis(1))
                .with_maximum_delay(Duration::from_millis(2))
                .build()
                .expect("hard-coded values are valid"),
        )
    }

    pub(crate) fn test_inner_client(builder: ClientBuilder) -> Arc<DriveInner> {
        let client = Drive::new(builder).expect("test builders are valid");
        client.inner
    }

    #[test]
    fn defaults() {
        let inner = test_inner_client(Drive::builder());
        assert_eq!(inner.endpoint, DEFAULT_HOST);
        assert_eq!(inner.options.chunk_size, 1024 * 1024);
        assert_eq!(inner.options.request_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn with_options() -> anyhow::Result<()> {
        let client = Drive::builder()
            .with_endpoint("http://localhost:8080/")
            .with_http_client(reqwest::Client::new())
            .with_chunk_size(4)
            .with_request_timeout(Duration::from_secs(5))
            .with_retry_policy(NeverRetry)
            .build()
            .await?;
        let inner = client.inner;
        assert_eq!(inner.endpoint, "http://localhost:8080");
        assert_eq!(inner.options.chunk_size, 4);
        assert_eq!(inner.options.request_timeout, Duration::from_secs(5));
        let e = crate::Error::io("test-only");
        let got = inner.options.retry_policy.on_error(&RetryState::new(true), e);
        assert!(got.is_exhausted(), "{got:?}");
        Ok(())
    }

    #[tokio::test]
    async fn bad_endpoint() {
        let got = Drive::builder().with_endpoint("not a url").build().await;
        assert!(matches!(&got, Err(e) if e.is_binding()), "{got:?}");
    }

    #[tokio::test]
    async fn zero_chunk_size() {
        let got = Drive::builder().with_chunk_size(0).build().await;
        assert!(matches!(&got, Err(e) if e.is_binding()), "{got:?}");
    }

    #[test]
    fn retry_policy_trait_object() {
        let inner = test_inner_client(test_builder());
        let policy: &dyn RetryPolicy = inner.options.retry_policy.as_ref();
        let got = policy.on_error(&RetryState::new(true), crate::Error::io("test-only"));
        assert!(got.is_continue(), "{got:?}");
    }
}
