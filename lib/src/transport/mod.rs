use crate::endpoint::{resolve_endpoint, DnsQuery, HostnameEndpoint};
use crate::error::ProbeError;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;

pub mod socks5;
pub mod tcp;
pub mod tls;
pub mod udp;

pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

pub type IoStream = Box<dyn AsyncStream>;

// one received message with its addressing info
#[derive(Debug, Clone, Copy)]
pub struct Received {
    pub len: usize,
    pub remote: SocketAddr,
    // may differ from the bound address behind a proxy
    pub local: SocketAddr,
}

// how bytes reach the network; the nat clients never care which variant
#[async_trait]
pub trait StunTransport: Send {
    async fn send(&mut self, buf: &[u8], dest: SocketAddr) -> Result<(), ProbeError>;

    async fn recv(&mut self, buf: &mut [u8]) -> Result<Received, ProbeError>;

    fn local_addr(&self) -> Option<SocketAddr>;

    async fn close(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct ProxyOptions {
    // None means direct
    pub proxy: Option<HostnameEndpoint>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyOptions {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn socks5(proxy: HostnameEndpoint, username: Option<String>, password: Option<String>) -> Self {
        Self {
            proxy: Some(proxy),
            username,
            password,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    Udp,
    Tcp,
    Tls,
}

pub async fn udp_transport(
    local: SocketAddr,
    proxy: &ProxyOptions,
    dns: &dyn DnsQuery,
) -> Result<Box<dyn StunTransport>, ProbeError> {
    match &proxy.proxy {
        None => Ok(Box::new(udp::UdpDirect::bind(local).await?)),
        Some(p) => {
            let proxy_addr = resolve_endpoint(dns, p).await?;
            let t = socks5::Socks5Udp::associate(proxy_addr, local, proxy).await?;
            Ok(Box::new(t))
        }
    }
}

// plain tcp, socks5 tunnel, tls, or tls over socks5
pub async fn tcp_transport(
    local: SocketAddr,
    dest: SocketAddr,
    server_host: &str,
    use_tls: bool,
    proxy: &ProxyOptions,
    dns: &dyn DnsQuery,
    connect_timeout: Duration,
) -> Result<Box<dyn StunTransport>, ProbeError> {
    let connect = async {
        let (stream, local_addr) = match &proxy.proxy {
            None => {
                let s = tcp::connect_reuse(local, dest).await?;
                let local_addr = s.local_addr()?;
                (Box::new(s) as IoStream, local_addr)
            }
            Some(p) => {
                let proxy_addr = resolve_endpoint(dns, p).await?;
                let s = socks5::connect_tcp(proxy_addr, dest, proxy).await?;
                let local_addr = s.local_addr()?;
                (Box::new(s) as IoStream, local_addr)
            }
        };

        let stream = if use_tls {
            tls::wrap(stream, server_host).await?
        } else {
            stream
        };

        Ok::<_, ProbeError>(Box::new(tcp::TcpStreamTransport::new(stream, local_addr, dest))
            as Box<dyn StunTransport>)
    };

    match timeout(connect_timeout, connect).await {
        Ok(v) => v,
        Err(_) => Err(ProbeError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "connect timeout",
        ))),
    }
}
