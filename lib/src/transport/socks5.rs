use crate::error::ProbeError;
use crate::transport::{ProxyOptions, Received, StunTransport};
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use log::{debug, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

// rfc 1928 client: method negotiation, optional rfc 1929 user/pass auth,
// CONNECT and UDP ASSOCIATE commands

const SOCKS_VERSION: u8 = 0x05;
const AUTH_VERSION: u8 = 0x01;

const METHOD_NONE: u8 = 0x00;
const METHOD_USERPASS: u8 = 0x02;
const METHOD_REJECTED: u8 = 0xFF;

const CMD_CONNECT: u8 = 0x01;
const CMD_UDP_ASSOCIATE: u8 = 0x03;

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

const REPLY_SUCCESS: u8 = 0x00;

fn reply_message(code: u8) -> &'static str {
    match code {
        0x01 => "general server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "ttl expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown reply",
    }
}

fn put_socks_addr(buf: &mut BytesMut, addr: SocketAddr) {
    match addr {
        SocketAddr::V4(v) => {
            buf.put_u8(ATYP_IPV4);
            buf.put_slice(&v.ip().octets());
        }
        SocketAddr::V6(v) => {
            buf.put_u8(ATYP_IPV6);
            buf.put_slice(&v.ip().octets());
        }
    }
    buf.put_u16(addr.port());
}

async fn read_socks_addr<S>(stream: &mut S) -> Result<SocketAddr, ProbeError>
where
    S: AsyncRead + Unpin,
{
    let atyp = stream.read_u8().await?;
    let ip = match atyp {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            stream.read_exact(&mut octets).await?;
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        ATYP_IPV6 => {
            let mut octets = [0u8; 16];
            stream.read_exact(&mut octets).await?;
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        ATYP_DOMAIN => {
            return Err(ProbeError::Proxy("domain in reply not supported".to_string()));
        }
        v => {
            return Err(ProbeError::Proxy(format!("bad address type: {}", v)));
        }
    };
    let port = stream.read_u16().await?;
    Ok(SocketAddr::new(ip, port))
}

async fn negotiate<S>(stream: &mut S, opts: &ProxyOptions) -> Result<(), ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let offer_userpass = opts.username.is_some();

    let mut greeting = BytesMut::with_capacity(4);
    greeting.put_u8(SOCKS_VERSION);
    if offer_userpass {
        greeting.put_u8(2);
        greeting.put_u8(METHOD_NONE);
        greeting.put_u8(METHOD_USERPASS);
    } else {
        greeting.put_u8(1);
        greeting.put_u8(METHOD_NONE);
    }
    stream.write_all(&greeting).await?;

    let version = stream.read_u8().await?;
    if version != SOCKS_VERSION {
        return Err(ProbeError::Proxy(format!("bad version: {}", version)));
    }

    match stream.read_u8().await? {
        METHOD_NONE => Ok(()),
        METHOD_USERPASS if offer_userpass => {
            auth_userpass(
                stream,
                opts.username.as_deref().unwrap_or(""),
                opts.password.as_deref().unwrap_or(""),
            )
            .await
        }
        METHOD_REJECTED => Err(ProbeError::Proxy("no acceptable auth method".to_string())),
        v => Err(ProbeError::Proxy(format!("unexpected auth method: {}", v))),
    }
}

async fn auth_userpass<S>(stream: &mut S, user: &str, pass: &str) -> Result<(), ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if user.len() > 255 || pass.len() > 255 {
        return Err(ProbeError::Proxy("username/password too long".to_string()));
    }

    let mut req = BytesMut::with_capacity(3 + user.len() + pass.len());
    req.put_u8(AUTH_VERSION);
    req.put_u8(user.len() as u8);
    req.put_slice(user.as_bytes());
    req.put_u8(pass.len() as u8);
    req.put_slice(pass.as_bytes());
    stream.write_all(&req).await?;

    let _version = stream.read_u8().await?;
    let status = stream.read_u8().await?;
    if status != 0 {
        return Err(ProbeError::Proxy(format!("auth rejected: {}", status)));
    }
    Ok(())
}

async fn command<S>(stream: &mut S, cmd: u8, dest: SocketAddr) -> Result<SocketAddr, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut req = BytesMut::with_capacity(22);
    req.put_u8(SOCKS_VERSION);
    req.put_u8(cmd);
    req.put_u8(0); // reserved
    put_socks_addr(&mut req, dest);
    stream.write_all(&req).await?;

    let version = stream.read_u8().await?;
    if version != SOCKS_VERSION {
        return Err(ProbeError::Proxy(format!("bad version: {}", version)));
    }
    let reply = stream.read_u8().await?;
    if reply != REPLY_SUCCESS {
        return Err(ProbeError::Proxy(format!(
            "command {} refused: {}",
            cmd,
            reply_message(reply)
        )));
    }
    let _reserved = stream.read_u8().await?;
    read_socks_addr(stream).await
}

// CONNECT: the proxy originates the tcp stream
pub async fn connect_tcp(
    proxy: SocketAddr,
    dest: SocketAddr,
    opts: &ProxyOptions,
) -> Result<TcpStream, ProbeError> {
    let mut stream = TcpStream::connect(proxy).await?;
    negotiate(&mut stream, opts).await?;
    let bound = command(&mut stream, CMD_CONNECT, dest).await?;
    debug!("socks5 connect via {}, bound {}", proxy, bound);
    Ok(stream)
}

// every relayed datagram carries this header:
// [rsv:2 = 0][frag:1 = 0][atyp][addr][port][payload]
pub fn wrap_udp(dest: SocketAddr, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(22 + payload.len());
    buf.put_u16(0);
    buf.put_u8(0);
    put_socks_addr(&mut buf, dest);
    buf.put_slice(payload);
    buf.freeze()
}

pub fn unwrap_udp(buf: &[u8]) -> Result<(SocketAddr, Bytes), ProbeError> {
    if buf.len() < 10 {
        return Err(ProbeError::Proxy(format!("udp header len:{} < 10", buf.len())));
    }
    if buf[2] != 0 {
        return Err(ProbeError::Proxy("fragmented datagram".to_string()));
    }

    let (addr, header_len) = match buf[3] {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&buf[4..8]);
            let port = u16::from_be_bytes([buf[8], buf[9]]);
            (SocketAddr::new(IpAddr::V4(Ipv4Addr::from(octets)), port), 10)
        }
        ATYP_IPV6 => {
            if buf.len() < 22 {
                return Err(ProbeError::Proxy(format!("udp header len:{} < 22", buf.len())));
            }
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&buf[4..20]);
            let port = u16::from_be_bytes([buf[20], buf[21]]);
            (SocketAddr::new(IpAddr::V6(Ipv6Addr::from(octets)), port), 22)
        }
        v => {
            return Err(ProbeError::Proxy(format!("bad address type: {}", v)));
        }
    };

    Ok((addr, Bytes::copy_from_slice(&buf[header_len..])))
}

// UDP ASSOCIATE: datagrams go through the relay while the control
// connection stays open
pub struct Socks5Udp {
    // closing this tears down the association
    _control: TcpStream,
    socket: UdpSocket,
    relay: SocketAddr,
}

impl Socks5Udp {
    pub async fn associate(
        proxy: SocketAddr,
        local: SocketAddr,
        opts: &ProxyOptions,
    ) -> Result<Self, ProbeError> {
        let mut control = TcpStream::connect(proxy).await?;
        negotiate(&mut control, opts).await?;

        // we do not know our own reflexive address yet
        let unspecified = match proxy {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let mut relay = command(&mut control, CMD_UDP_ASSOCIATE, unspecified).await?;

        // some servers answer with an unspecified bind address
        if relay.ip().is_unspecified() {
            relay = SocketAddr::new(proxy.ip(), relay.port());
        }
        debug!("socks5 udp associate via {}, relay {}", proxy, relay);

        let socket = UdpSocket::bind(local).await?;

        Ok(Self {
            _control: control,
            socket,
            relay,
        })
    }

    // the relay endpoint the proxy bound for us
    pub fn relay_endpoint(&self) -> SocketAddr {
        self.relay
    }
}

#[async_trait]
impl StunTransport for Socks5Udp {
    async fn send(&mut self, buf: &[u8], dest: SocketAddr) -> Result<(), ProbeError> {
        let wrapped = wrap_udp(dest, buf);
        self.socket.send_to(&wrapped, self.relay).await?;
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<Received, ProbeError> {
        let mut raw = vec![0u8; buf.len() + 22];

        // everything legitimate arrives via the relay, drop the rest
        let len = loop {
            let (len, from) = self.socket.recv_from(&mut raw).await?;
            if from == self.relay {
                break len;
            }
            warn!("drop datagram from {}: not the relay {}", from, self.relay);
        };

        let (remote, payload) = unwrap_udp(&raw[..len])?;
        if payload.len() > buf.len() {
            return Err(ProbeError::Proxy(format!(
                "relayed payload len:{} > {}",
                payload.len(),
                buf.len()
            )));
        }
        buf[..payload.len()].copy_from_slice(&payload);

        let local = self.socket.local_addr()?;
        Ok(Received {
            len: payload.len(),
            remote,
            local,
        })
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    async fn close(&mut self) {
        let _ = self._control.shutdown().await;
    }
}
