//! Streaming reader that computes the content key on-the-fly.

use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, ReadBuf};

use crate::ContentKey;
use crate::content_type::{self, SNIFF_LEN};

pin_project! {
    /// An async reader wrapper that hashes, counts and samples data as it
    /// flows through.
    ///
    /// The first [`SNIFF_LEN`] bytes are retained so the media type can be
    /// detected once the stream is drained, without buffering the whole
    /// content in memory.
    pub struct HashingReader<R> {
        #[pin]
        inner: R,
        hasher: Sha256,
        size: u64,
        head: Vec<u8>,
    }
}

/// What a drained [`HashingReader`] learned about its stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digested {
    /// SHA-256 content key.
    pub key: ContentKey,
    /// Number of bytes read.
    pub size: u64,
    /// Media type detected from the leading bytes.
    pub mime_type: &'static str,
}

impl<R> HashingReader<R> {
    /// Creates a new hashing reader wrapping the given reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            size: 0,
            head: Vec::with_capacity(SNIFF_LEN),
        }
    }

    /// Consumes the reader and returns the key, size and media type.
    pub fn finalize(self) -> Digested {
        let digest: [u8; 32] = self.hasher.finalize().into();
        Digested {
            key: ContentKey::from_bytes(digest.to_vec()),
            size: self.size,
            mime_type: content_type::detect(&self.head),
        }
    }
}

impl<R: AsyncRead> AsyncRead for HashingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.project();
        let before = buf.filled().len();

        match this.inner.poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                let new_bytes = &buf.filled()[before..];
                if !new_bytes.is_empty() {
                    this.hasher.update(new_bytes);
                    *this.size += new_bytes.len() as u64;

                    let room = SNIFF_LEN.saturating_sub(this.head.len());
                    this.head
                        .extend_from_slice(&new_bytes[..room.min(new_bytes.len())]);
                }
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}
