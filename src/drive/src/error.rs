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

//! Custom errors for the Drive upload client.
//!
//! These types are returned as the [source][std::error::Error::source] of an
//! [Error][crate::Error]. Most applications only need the predicates in
//! [Error][crate::Error]; use these types to get more details.

/// The upload cannot continue because the data persisted by the service does
/// not match the data sent.
///
/// # Example
/// ```
/// # use drive_upload::client::Drive;
/// # use drive_upload::model::UploadMetadata;
/// # use drive_upload::error::UploadError;
/// # async fn sample(client: &Drive) -> anyhow::Result<()> {
/// use std::error::Error as _;
/// let upload = client.upload_file(UploadMetadata::new("greeting.txt", 11), "hello world".as_bytes());
/// match upload.send().await {
///     Ok(file) => println!("uploaded {:?}", file.id()),
///     Err(error) if error.is_integrity() => {
///         if let Some(e) = error.source().and_then(|e| e.downcast_ref::<UploadError>()) {
///             println!("the upload failed, details: {e}");
///         }
///     },
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(()) }
/// ```
///
/// # Troubleshooting
///
/// The most common cause is a data source with a different number of bytes
/// than the size declared in the [UploadMetadata][crate::model::UploadMetadata].
/// The other variants indicate a bug in the service or the client, or data
/// corrupted in transit. Resuming from an unverified offset could silently
/// corrupt the file, so the upload is aborted.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum UploadError {
    /// The service confirmed fewer bytes than the chunk contained.
    #[error(
        "the service confirmed bytes up to offset {confirmed}, but the chunk ended at offset {expected}"
    )]
    UnexpectedOffset { expected: u64, confirmed: u64 },

    /// The service confirmed more bytes than were sent.
    #[error("the service reports {persisted} bytes as persisted, but we only sent {sent} bytes")]
    TooMuchProgress { sent: u64, persisted: u64 },

    /// The size declared for the upload does not match the data source.
    #[error(
        "the upload declared a size of {declared} bytes, but the data source produced {read} bytes"
    )]
    SizeMismatch { declared: u64, read: u64 },
}

/// The service responses do not follow the resumable upload protocol.
///
/// # Troubleshooting
///
/// This indicates a bug in the service, or a proxy that modifies the
/// responses. Verify the HTTP client does not follow redirects: the service
/// uses `308 Resume Incomplete` responses that some clients mistake for
/// redirects.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ProtocolError {
    /// The response is missing a required header.
    #[error("the response is missing '{0}', a required header")]
    MissingHeader(&'static str),

    /// The received header format is invalid.
    #[error("the format for header '{0}' is incorrect")]
    BadHeaderFormat(
        &'static str,
        #[source] Box<dyn std::error::Error + Send + Sync + 'static>,
    ),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn upload_error() {
        let e = UploadError::UnexpectedOffset {
            expected: 3,
            confirmed: 2,
        };
        let fmt = e.to_string();
        assert!(fmt.contains("offset 2"), "{fmt}");
        assert!(fmt.contains("offset 3"), "{fmt}");

        let e = UploadError::SizeMismatch {
            declared: 10,
            read: 6,
        };
        let fmt = e.to_string();
        assert!(fmt.contains("10 bytes"), "{fmt}");
        assert!(fmt.contains("6 bytes"), "{fmt}");
    }

    #[test]
    fn protocol_error() {
        let e = ProtocolError::MissingHeader("Location");
        assert!(e.to_string().contains("'Location'"), "{e}");

        let e = ProtocolError::BadHeaderFormat("Range", "bad".into());
        assert!(e.to_string().contains("'Range'"), "{e}");
        assert!(e.source().is_some(), "{e:?}");
    }
}
