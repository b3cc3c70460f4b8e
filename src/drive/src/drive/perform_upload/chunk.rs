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

use crate::{Error, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

/// The data for one `PUT` request.
///
/// The data is immutable once filled. Resending a chunk after a transient
/// error sends the same bytes, without reading the source again.
#[derive(Clone, PartialEq)]
pub struct ChunkBuffer {
    data: bytes::Bytes,
    capacity: usize,
}

impl ChunkBuffer {
    pub fn new(data: bytes::Bytes, capacity: usize) -> Self {
        Self { data, capacity }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A cheap copy of the data, suitable for a request body.
    pub fn body(&self) -> bytes::Bytes {
        self.data.clone()
    }
}

// The chunks can be large, only print a summary.
impl std::fmt::Debug for ChunkBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkBuffer")
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .field(
                "contents[0..32]",
                &self.data.slice(..std::cmp::min(32, self.data.len())),
            )
            .finish()
    }
}

/// Fills chunks from the upload source.
///
/// The filler reads one byte past each full chunk. A source whose length is
/// a multiple of the chunk size ends with a full chunk marked as final, and
/// never with an extra empty chunk.
pub struct ChunkFiller<R> {
    source: R,
    capacity: usize,
    carry: Option<u8>,
    exhausted: bool,
}

impl<R> ChunkFiller<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(source: R, capacity: usize) -> Self {
        Self {
            source,
            capacity,
            carry: None,
            exhausted: false,
        }
    }

    /// Reads the next chunk.
    ///
    /// Returns the chunk and `true` if the source reached end-of-input while
    /// filling it. Short reads do not end the chunk, only a read returning
    /// zero bytes does.
    pub async fn next_chunk(&mut self) -> Result<(ChunkBuffer, bool)> {
        let mut buffer = bytes::BytesMut::zeroed(self.capacity);
        let mut filled = 0;
        if let Some(b) = self.carry.take() {
            buffer[0] = b;
            filled = 1;
        }
        while filled < self.capacity && !self.exhausted {
            match self.read_some(&mut buffer[filled..]).await? {
                0 => self.exhausted = true,
                n => filled += n,
            }
        }
        if !self.exhausted {
            let mut probe = [0_u8; 1];
            match self.read_some(&mut probe).await? {
                0 => self.exhausted = true,
                _ => self.carry = Some(probe[0]),
            }
        }
        buffer.truncate(filled);
        let chunk = ChunkBuffer::new(buffer.freeze(), self.capacity);
        Ok((chunk, self.exhausted))
    }

    async fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.source.read(buf).await {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::source_read(e)),
            }
        }
    }
}
