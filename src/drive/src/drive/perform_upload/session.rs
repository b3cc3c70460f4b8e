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

use super::{ResponseDetails, send_err};
use crate::drive::client::DriveInner;
use crate::error::ProtocolError;
use crate::model::UploadMetadata;
use crate::{Error, Result};
use std::time::Duration;

/// An upload session, created by [initiate].
#[derive(Clone, Debug, PartialEq)]
pub struct UploadSession {
    pub(super) url: reqwest::Url,
}

impl UploadSession {
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }
}

/// Starts a resumable upload session.
///
/// The request is sent once. The caller decides what to do with any errors.
pub async fn initiate(
    inner: &DriveInner,
    metadata: &UploadMetadata,
    timeout: Duration,
) -> Result<UploadSession> {
    let body = serde_json::to_vec(metadata).map_err(Error::ser)?;
    let response = inner
        .client
        .request(
            reqwest::Method::POST,
            format!("{}/upload/drive/v3/files", &inner.endpoint),
        )
        .query(&[("uploadType", "resumable")])
        .query(&[("supportsAllDrives", "true"), ("supportsTeamDrives", "true")])
        .header("content-type", "application/json; charset=UTF-8")
        .header("x-upload-content-length", metadata.size)
        .timeout(timeout)
        .body(body)
        .send()
        .await
        .map_err(send_err)?;
    handle_initiate_response(response).await
}

async fn handle_initiate_response(response: reqwest::Response) -> Result<UploadSession> {
    if !response.status().is_success() {
        let ResponseDetails {
            status,
            headers,
            payload,
        } = ResponseDetails::from_response(response).await;
        if (400..500).contains(&status) {
            return Err(Error::authentication(status, headers, payload));
        }
        return Err(Error::rejected(status, headers, payload));
    }
    parse_location(response.headers()).map_err(Error::protocol)
}

fn parse_location(
    headers: &reqwest::header::HeaderMap,
) -> std::result::Result<UploadSession, ProtocolError> {
    let location = headers
        .get(reqwest::header::LOCATION)
        .ok_or(ProtocolError::MissingHeader("Location"))?;
    let location = location
        .to_str()
        .map_err(|e| ProtocolError::BadHeaderFormat("Location", e.into()))?;
    let url = reqwest::Url::parse(location)
        .map_err(|e| ProtocolError::BadHeaderFormat("Location", e.into()))?;
    Ok(UploadSession { url })
}
