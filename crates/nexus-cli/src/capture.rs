//! Time-capped audio capture.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;

/// Hard ceiling on capture length. The capture auto-stops at this boundary
/// no matter how much more input the source produces.
pub const MAX_CAPTURE_SECONDS: u64 = 10;

/// Result of a capped capture.
#[derive(Debug)]
pub struct CappedCapture {
    /// Bytes read before EOF or the cap.
    pub bytes: Vec<u8>,
    /// Whether the cap (not EOF) ended the capture.
    pub hit_cap: bool,
}

/// Read from `source` until EOF or until `limit` has elapsed.
///
/// The source is dropped on return, releasing the underlying device or
/// pipe on every exit path.
pub async fn read_capped<R>(mut source: R, limit: Duration) -> std::io::Result<CappedCapture>
where
    R: AsyncRead + Unpin,
{
    let deadline = Instant::now() + limit;
    let mut bytes = Vec::new();
    let mut buf = [0u8; 8 * 1024];

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(CappedCapture {
                bytes,
                hit_cap: true,
            });
        }
        match tokio::time::timeout_at(deadline, source.read(&mut buf)).await {
            Err(_) => {
                return Ok(CappedCapture {
                    bytes,
                    hit_cap: true,
                })
            }
            Ok(Ok(0)) => {
                return Ok(CappedCapture {
                    bytes,
                    hit_cap: false,
                })
            }
            Ok(Ok(n)) => bytes.extend_from_slice(&buf[..n]),
            Ok(Err(err)) => return Err(err),
        }
    }
}
