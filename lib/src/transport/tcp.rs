use crate::constants::HEADER_LEN;
use crate::error::ProbeError;
use crate::transport::{IoStream, Received, StunTransport};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};

// rfc 5389, 7.2.2: messages are back to back on the stream,
// so one receive reads the 20-byte header and then msg_len bytes

pub struct TcpStreamTransport {
    stream: IoStream,
    local: SocketAddr,
    peer: SocketAddr,
}

impl TcpStreamTransport {
    pub fn new(stream: IoStream, local: SocketAddr, peer: SocketAddr) -> Self {
        Self {
            stream,
            local,
            peer,
        }
    }
}

#[async_trait]
impl StunTransport for TcpStreamTransport {
    async fn send(&mut self, buf: &[u8], _dest: SocketAddr) -> Result<(), ProbeError> {
        self.stream.write_all(buf).await?;
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<Received, ProbeError> {
        if buf.len() < HEADER_LEN {
            return Err(ProbeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "recv buffer too small",
            )));
        }

        self.stream.read_exact(&mut buf[..HEADER_LEN]).await?;
        let msg_len = u16::from_be_bytes([buf[2], buf[3]]) as usize;

        if HEADER_LEN + msg_len > buf.len() {
            return Err(ProbeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("framed message len:{} too large", msg_len),
            )));
        }
        self.stream
            .read_exact(&mut buf[HEADER_LEN..HEADER_LEN + msg_len])
            .await?;

        Ok(Received {
            len: HEADER_LEN + msg_len,
            remote: self.peer,
            local: self.local,
        })
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local)
    }

    async fn close(&mut self) {
        let _ = self.stream.shutdown().await;
    }
}

// SO_REUSEADDR so consecutive tests can reuse the same local port
pub async fn connect_reuse(local: SocketAddr, dest: SocketAddr) -> Result<TcpStream, ProbeError> {
    let socket = if dest.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(local)?;
    Ok(socket.connect(dest).await?)
}
