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

use http::HeaderMap;
use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The core error returned by the upload client.
///
/// The upload client reports errors from multiple sources. For example, the
/// service may reject the request, the transport may be unable to create the
/// necessary connection, the request may timeout before a response is
/// received, the retry policy may be exhausted, the service may violate the
/// upload protocol, or the data source may fail while reading.
///
/// Use the `is_*` predicates to decide how to react, and the `http_*`
/// accessors to inspect the service response when there is one. The
/// [source][std::error::Error::source] holds the underlying cause for errors
/// detected on the client side.
///
/// # Example
/// ```
/// use drive_upload_gax::error::Error;
/// match upload_report() {
///     Ok(id) => println!("created file {id}"),
///     Err(e) if e.is_authentication() => println!("refresh the access token: {e}"),
///     Err(e) if e.is_integrity() => println!("restart the upload from scratch: {e}"),
///     Err(e) => println!("upload failed: {e}"),
/// }
///
/// fn upload_report() -> Result<String, Error> {
///     # Err(Error::authentication(401, http::HeaderMap::new(), bytes::Bytes::from_static(b"invalid token")))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error for a request that did not finish in time.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use drive_upload_gax::error::Error;
    /// let error = Error::timeout("chunk upload took longer than 30s");
    /// assert!(error.is_timeout());
    /// assert!(error.is_transient());
    /// assert!(error.source().is_some());
    /// ```
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            source: Some(source.into()),
        }
    }

    /// The client gave up waiting for a response.
    ///
    /// The service may or may not have received the request. Chunk uploads
    /// carry their byte range, so sending them again is safe.
    ///
    /// # Troubleshooting
    ///
    /// A chunk must cross the network within the request timeout. Use a
    /// longer timeout or a smaller chunk size on slow links.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Wraps the last error of a retry loop that gave up.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use drive_upload_gax::error::Error;
    /// let last = Error::io("connection reset by peer");
    /// let error = Error::exhausted(last);
    /// assert!(error.is_exhausted());
    /// assert!(error.source().is_some());
    /// ```
    pub fn exhausted<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Exhausted,
            source: Some(source.into()),
        }
    }

    /// A chunk kept failing with transient errors until the retry policy
    /// stopped the loop.
    ///
    /// The last transient error is the [source][std::error::Error::source].
    ///
    /// # Troubleshooting
    ///
    /// The service or the network was unavailable for longer than the retry
    /// policy allows. Raise the attempt or time limits if the application can
    /// wait longer.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted)
    }

    /// Creates an error representing a cancelled operation.
    ///
    /// # Example
    /// ```
    /// use drive_upload_gax::error::Error;
    /// let error = Error::cancelled();
    /// assert!(error.is_cancelled());
    /// ```
    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: None,
        }
    }

    /// The application cancelled the operation before it completed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Creates an error for file metadata that cannot be encoded as JSON.
    ///
    /// # Example
    /// ```
    /// use drive_upload_gax::error::Error;
    /// let error = Error::ser("key must be a string");
    /// assert!(error.is_serialization());
    /// assert!(!error.is_transient());
    /// ```
    pub fn ser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            source: Some(source.into()),
        }
    }

    /// The file metadata could not be encoded, no request was sent.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization)
    }

    /// Creates an error representing an invalid configuration.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use drive_upload_gax::error::Error;
    /// let error = Error::binding("chunk size must be greater than zero");
    /// assert!(error.is_binding());
    /// assert!(error.source().is_some());
    /// ```
    pub fn binding<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Binding,
            source: Some(source.into()),
        }
    }

    /// The request parameters are invalid, the request was never sent.
    ///
    /// # Troubleshooting
    ///
    /// Typically this indicates a problem in the application. For example, a
    /// zero chunk size or a malformed endpoint.
    pub fn is_binding(&self) -> bool {
        matches!(self.kind, ErrorKind::Binding)
    }

    /// Creates an error representing a violation of the upload protocol.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use drive_upload_gax::error::Error;
    /// let error = Error::protocol("missing Location header");
    /// assert!(error.is_protocol());
    /// assert!(error.source().is_some());
    /// ```
    pub fn protocol<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Protocol,
            source: Some(source.into()),
        }
    }

    /// The service response is missing required headers, or their format is
    /// invalid.
    ///
    /// # Troubleshooting
    ///
    /// This indicates a bug in the service, a proxy that modifies the
    /// responses, or a corrupted message in transit. The upload cannot
    /// continue because the client cannot determine what data the service
    /// has received.
    pub fn is_protocol(&self) -> bool {
        matches!(self.kind, ErrorKind::Protocol)
    }

    /// Creates an error representing a loss of integrity in the upload.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use drive_upload_gax::error::Error;
    /// let error = Error::integrity("confirmed offset does not match");
    /// assert!(error.is_integrity());
    /// assert!(error.source().is_some());
    /// ```
    pub fn integrity<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Integrity,
            source: Some(source.into()),
        }
    }

    /// The data persisted by the service does not match the data sent.
    ///
    /// # Troubleshooting
    ///
    /// Resuming from an unverified offset risks silent data corruption, so
    /// the upload is aborted. The [source][std::error::Error::source] has the
    /// details. Most often the declared size of the upload does not match the
    /// number of bytes in the data source.
    pub fn is_integrity(&self) -> bool {
        matches!(self.kind, ErrorKind::Integrity)
    }

    /// Creates an error representing a failure reading the upload data.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use drive_upload_gax::error::Error;
    /// let error = Error::source_read(std::io::Error::other("disk on fire"));
    /// assert!(error.is_source_read());
    /// assert!(error.source().is_some());
    /// ```
    pub fn source_read<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::SourceRead,
            source: Some(source.into()),
        }
    }

    /// The data source returned an error while reading.
    pub fn is_source_read(&self) -> bool {
        matches!(self.kind, ErrorKind::SourceRead)
    }

    /// Creates an error for a request rejected due to credentials or
    /// permissions.
    ///
    /// # Example
    /// ```
    /// use drive_upload_gax::error::Error;
    /// let error = Error::authentication(401, http::HeaderMap::new(), bytes::Bytes::from_static(b"UNAUTHENTICATED"));
    /// assert!(error.is_authentication());
    /// assert_eq!(error.http_status_code(), Some(401));
    /// ```
    pub fn authentication(status_code: u16, headers: HeaderMap, payload: bytes::Bytes) -> Self {
        Self {
            kind: ErrorKind::Authentication(Box::new(TransportDetails::response(
                status_code,
                headers,
                payload,
            ))),
            source: None,
        }
    }

    /// The service rejected the credentials or the permissions of the caller.
    ///
    /// # Troubleshooting
    ///
    /// Verify the HTTP client used by the upload client attaches valid
    /// credentials, and that the principal can create files in the requested
    /// parent folders.
    pub fn is_authentication(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    /// Creates an error for a request rejected by the service.
    ///
    /// # Example
    /// ```
    /// use drive_upload_gax::error::Error;
    /// let error = Error::rejected(400, http::HeaderMap::new(), bytes::Bytes::from_static(b"BAD REQUEST"));
    /// assert!(error.is_rejected());
    /// assert_eq!(error.http_status_code(), Some(400));
    /// ```
    pub fn rejected(status_code: u16, headers: HeaderMap, payload: bytes::Bytes) -> Self {
        Self {
            kind: ErrorKind::Rejected(Box::new(TransportDetails::response(
                status_code,
                headers,
                payload,
            ))),
            source: None,
        }
    }

    /// The service rejected the request, sending it again will not succeed.
    ///
    /// # Troubleshooting
    ///
    /// The [payload][Error::http_payload] typically includes a description of
    /// the problem.
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, ErrorKind::Rejected(_))
    }

    /// Creates an error for a response that may succeed on a retry.
    ///
    /// # Example
    /// ```
    /// use drive_upload_gax::error::Error;
    /// let error = Error::http(503, http::HeaderMap::new(), bytes::Bytes::from_static(b"try again"));
    /// assert!(error.is_server_error());
    /// assert!(error.is_transient());
    /// ```
    pub fn http(status_code: u16, headers: HeaderMap, payload: bytes::Bytes) -> Self {
        Self {
            kind: ErrorKind::Transport(Box::new(TransportDetails::response(
                status_code,
                headers,
                payload,
            ))),
            source: None,
        }
    }

    /// The service returned an error status code, typically in the 5xx range.
    pub fn is_server_error(&self) -> bool {
        matches!(&self.kind, ErrorKind::Transport(d) if d.status_code.is_some())
    }

    /// A problem in the transport layer without a full HTTP response.
    ///
    /// Examples include: a broken connection after the request is sent, or
    /// a connection that cannot be established.
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Transport(Box::new(TransportDetails::default())),
            source: Some(source.into()),
        }
    }

    /// A problem in the transport layer without a full HTTP response.
    ///
    /// # Troubleshooting
    ///
    /// This indicates a problem completing the request. This type of error is
    /// rare, but includes crashes and restarts on proxies and load balancers.
    /// The retry policy resends the chunk automatically.
    pub fn is_io(&self) -> bool {
        matches!(
            &self.kind,
            ErrorKind::Transport(d) if matches!(**d, TransportDetails {
                status_code: None,
                headers: None,
                payload: None,
            })
        )
    }

    /// Sending the same request again may succeed.
    ///
    /// Transport failures, timeouts, and server errors are transient. All
    /// other errors are permanent.
    pub fn is_transient(&self) -> bool {
        self.is_io() || self.is_timeout() || self.is_server_error()
    }

    /// The status code of the service response, if there was one.
    ///
    /// # Example
    /// ```
    /// use drive_upload_gax::error::Error;
    /// let e = create_file("my-file");
    /// if let Some(code) = e.http_status_code() {
    ///     if code == 404 {
    ///         println!("cannot find the parent folder, more details in {e}");
    ///     }
    /// }
    ///
    /// fn create_file(name: &str) -> Error {
    ///     # Error::rejected(404, http::HeaderMap::new(), bytes::Bytes::from_static(b"NOT FOUND"))
    /// }
    /// ```
    pub fn http_status_code(&self) -> Option<u16> {
        self.details().and_then(|d| d.status_code)
    }

    /// The headers of the service response, if there was one.
    pub fn http_headers(&self) -> Option<&http::HeaderMap> {
        self.details().and_then(|d| d.headers.as_ref())
    }

    /// The body of the service response, if there was one.
    ///
    /// # Example
    /// ```
    /// use drive_upload_gax::error::Error;
    /// let e = Error::rejected(400, http::HeaderMap::new(), bytes::Bytes::from_static(b"BAD REQUEST"));
    /// if let Some(payload) = e.http_payload() {
    ///     println!("service details: {}", String::from_utf8_lossy(payload));
    /// }
    /// ```
    pub fn http_payload(&self) -> Option<&bytes::Bytes> {
        self.details().and_then(|d| d.payload.as_ref())
    }

    fn details(&self) -> Option<&TransportDetails> {
        match &self.kind {
            ErrorKind::Transport(d) | ErrorKind::Rejected(d) | ErrorKind::Authentication(d) => {
                Some(d.as_ref())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Binding, Some(e)) => {
                write!(f, "the request configuration is invalid {e}")
            }
            (ErrorKind::Serialization, Some(e)) => write!(f, "cannot encode the file metadata {e}"),
            (ErrorKind::Protocol, Some(e)) => {
                write!(f, "the response violates the upload protocol {e}")
            }
            (ErrorKind::Integrity, Some(e)) => {
                write!(f, "the upload cannot continue safely {e}")
            }
            (ErrorKind::SourceRead, Some(e)) => write!(f, "cannot read the upload data {e}"),
            (ErrorKind::Timeout, Some(e)) => write!(f, "the request timed out {e}"),
            (ErrorKind::Exhausted, Some(e)) => {
                write!(f, "the retry policy is exhausted, the last error was: {e}")
            }
            (ErrorKind::Cancelled, _) => write!(f, "the upload was cancelled"),
            (ErrorKind::Authentication(d), _) => {
                write!(f, "the service rejected the credentials or permissions, ")?;
                d.display(self.source(), f)
            }
            (ErrorKind::Rejected(d), _) => {
                write!(f, "the service rejected the request, ")?;
                d.display(self.source(), f)
            }
            (ErrorKind::Transport(d), _) => d.display(self.source(), f),
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error))
    }
}

#[derive(Debug)]
enum ErrorKind {
    Binding,
    Serialization,
    Protocol,
    Integrity,
    SourceRead,
    Timeout,
    Exhausted,
    Cancelled,
    Authentication(Box<TransportDetails>),
    Rejected(Box<TransportDetails>),
    Transport(Box<TransportDetails>),
}

#[derive(Debug, Default)]
struct TransportDetails {
    status_code: Option<u16>,
    headers: Option<HeaderMap>,
    payload: Option<bytes::Bytes>,
}

impl TransportDetails {
    fn response(status_code: u16, headers: HeaderMap, payload: bytes::Bytes) -> Self {
        Self {
            status_code: Some(status_code),
            headers: Some(headers),
            payload: Some(payload),
        }
    }

    fn display(
        &self,
        source: Option<&(dyn StdError + 'static)>,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match (source, &self) {
            (
                _,
                TransportDetails {
                    status_code: Some(code),
                    payload: Some(p),
                    ..
                },
            ) => {
                if let Ok(message) = std::str::from_utf8(p.as_ref()) {
                    write!(f, "the service responded with [{code}]: {message}")
                } else {
                    write!(f, "the service responded with [{code}] and a binary body: {p:?}")
                }
            }
            (Some(source), _) => {
                write!(f, "cannot send the request or read the response: {source}")
            }
            (None, _) => unreachable!("no Error constructor allows this"),
        }
    }
}
