// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::error::WireError;

/// Reads an entire connection to EOF. The reference protocol used a single
/// fixed-size `recv`, which truncates large Bloom filter payloads — this
/// reads until the peer closes its write half instead, per the spec's
/// framing resolution (read-to-EOF, not a fixed-size chunk).
pub async fn read_to_end(stream: &mut TcpStream) -> Result<Vec<u8>, WireError> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Connects to `addr`, writes `payload`, shuts down the write half, and
/// closes the connection. One message per connection, as the wire spec
/// requires.
pub async fn send_and_close(addr: impl ToSocketAddrs, payload: &[u8]) -> Result<(), WireError> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(payload).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Binds a loopback listener. Passing port `0` asks the OS for an
/// ephemeral port; the caller reads it back with `local_addr()`.
pub async fn bind_loopback(port: u16) -> Result<TcpListener, WireError> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    Ok(listener)
}
