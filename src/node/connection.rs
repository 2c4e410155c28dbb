//! Connection manager: accepts inbound connections and dials outbound ones,
//! with length-prefixed message framing feeding the peer state machine
//! instead of a single handler closure.

use crate::diameter::DiameterMessage;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Maximum accepted message size, guarding against a malformed or hostile
/// length field.
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Reads one framed `DiameterMessage` off the wire.
pub async fn read_message<R>(reader: &mut R) -> Result<DiameterMessage>
where
    R: AsyncRead + Unpin,
{
    let mut header_prefix = [0u8; 4];
    reader.read_exact(&mut header_prefix).await?;
    let length = u32::from_be_bytes([0, header_prefix[1], header_prefix[2], header_prefix[3]]) as usize;

    if length > MAX_MESSAGE_LEN {
        return Err(Error::MalformedHeader(format!(
            "message length {} exceeds maximum {}",
            length, MAX_MESSAGE_LEN
        )));
    }
    if length < 4 {
        return Err(Error::MalformedHeader(format!("message length {} too short", length)));
    }

    let mut buffer = Vec::with_capacity(length);
    buffer.extend_from_slice(&header_prefix);
    buffer.resize(length, 0);
    reader.read_exact(&mut buffer[4..]).await?;

    let mut cursor = Cursor::new(buffer);
    DiameterMessage::decode_from(&mut cursor)
}

/// Writes one framed `DiameterMessage` to the wire.
pub async fn write_message<W>(writer: &mut W, msg: &DiameterMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = msg.as_bytes()?;
    writer.write_all(&bytes).await?;
    Ok(())
}

/// Configuration for reconnecting to a statically-configured peer.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_wait: Duration,
    pub max_wait: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            initial_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
        }
    }
}

/// Dials `addr` with exponential backoff up to `config.max_wait`, retrying
/// forever. Returns the first successful `TcpStream`; reconnection after a
/// later disconnect is the caller's responsibility (call again).
pub async fn dial_with_backoff(addr: &str, config: &ReconnectConfig) -> TcpStream {
    let mut wait = config.initial_wait;
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return stream,
            Err(e) => {
                log::warn!("failed to connect to {}: {}; retrying in {:?}", addr, e, wait);
                tokio::time::sleep(wait).await;
                wait = std::cmp::min(wait * 2, config.max_wait);
            }
        }
    }
}

/// Binds a listener for inbound peer connections.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    Ok(TcpListener::bind(addr).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avp::{Identity, UTF8String};
    use crate::diameter::flags;

    #[tokio::test]
    async fn test_read_write_message_roundtrip() {
        let mut msg = DiameterMessage::new(257, 0, flags::REQUEST, 1, 1);
        msg.add_avp(crate::avp!(264, None, Identity::from_str("host.example.com")));
        msg.add_avp(crate::avp!(263, None, UTF8String::new("session;1")));

        let mut buf = Vec::new();
        write_message(&mut buf, &msg).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_message(&mut cursor).await.unwrap();
        assert_eq!(decoded.header.code, 257);
        assert_eq!(decoded.header.hop_by_hop_id, 1);
    }

    #[tokio::test]
    async fn test_read_message_rejects_oversized_length() {
        let mut buf = vec![0u8; 4];
        let huge = (MAX_MESSAGE_LEN as u32) + 1;
        buf[0] = 1;
        buf[1..4].copy_from_slice(&huge.to_be_bytes()[1..]);
        let mut cursor = Cursor::new(buf);
        assert!(read_message(&mut cursor).await.is_err());
    }
}
