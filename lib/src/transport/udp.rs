use crate::error::ProbeError;
use crate::transport::{Received, StunTransport};
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

pub struct UdpDirect {
    socket: UdpSocket,
}

impl UdpDirect {
    pub async fn bind(local: SocketAddr) -> Result<Self, ProbeError> {
        let socket = UdpSocket::bind(local).await?;
        Ok(Self { socket })
    }
}

#[async_trait]
impl StunTransport for UdpDirect {
    async fn send(&mut self, buf: &[u8], dest: SocketAddr) -> Result<(), ProbeError> {
        self.socket.send_to(buf, dest).await?;
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<Received, ProbeError> {
        let (len, remote) = self.socket.recv_from(buf).await?;
        let local = self.socket.local_addr()?;
        Ok(Received { len, remote, local })
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    async fn close(&mut self) {
        // dropped with the socket
    }
}
