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

use anyhow::bail;
use clap::Parser;
use humantime::parse_duration;
use std::path::PathBuf;
use std::time::Duration;

/// Chunk sizes must be multiples of this value.
const QUANTUM: usize = 256 * 1024;

/// Configuration options for the upload.
#[derive(Clone, Parser)]
#[command(version, about, long_about = super::DESCRIPTION)]
pub struct Args {
    /// The file to upload.
    #[arg(long)]
    pub file: PathBuf,

    /// The name of the new file in Google Drive.
    ///
    /// Defaults to the file name of `--file`.
    #[arg(long)]
    pub name: Option<String>,

    /// The id of a parent folder, can be repeated.
    #[arg(long)]
    pub parent: Vec<String>,

    /// The MIME type of the new file, detected by the service if not set.
    #[arg(long)]
    pub mime_type: Option<String>,

    /// A short description of the new file.
    #[arg(long)]
    pub description: Option<String>,

    /// An OAuth2 access token with permissions to create files.
    #[arg(long, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Override the service endpoint, mostly useful for testing.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// The size of each chunk, e.g. `8MiB`.
    #[arg(long, value_parser = parse_size_arg, default_value = "8MiB")]
    pub chunk_size: usize,

    /// The timeout for each request.
    #[arg(long, value_parser = parse_duration, default_value = "30s")]
    pub timeout: Duration,

    /// The maximum number of attempts to send each chunk.
    #[arg(long, default_value_t = 5)]
    pub max_attempts: u32,

    /// Log each chunk as it is sent.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Validates the arguments after parsing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_size == 0 || self.chunk_size % QUANTUM != 0 {
            bail!(
                "invalid chunk size ({}), should be a multiple of {QUANTUM}",
                self.chunk_size
            )
        }
        if self.max_attempts == 0 {
            bail!("invalid number of attempts, should be > 0")
        }
        Ok(())
    }

    /// The name for the new file.
    pub fn file_name(&self) -> anyhow::Result<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        match self.file.file_name().and_then(|n| n.to_str()) {
            Some(n) => Ok(n.to_string()),
            None => bail!("cannot infer the file name from {:?}, use --name", self.file),
        }
    }
}

fn parse_size_arg(arg: &str) -> anyhow::Result<usize> {
    let value = parse_size::parse_size(arg)?;
    Ok(usize::try_from(value)?)
}
