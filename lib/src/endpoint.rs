use crate::constants::{DEFAULT_STUN_PORT, DEFAULT_TLS_PORT};
use crate::error::ProbeError;
use async_trait::async_trait;
use log::debug;
use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use tokio::net::lookup_host;

// human-entered host:port strings
// accepts "host", "host:port", "1.2.3.4:5", "[2001:db8::1]:1919", "::1"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameEndpoint {
    pub host: String,
    pub port: u16,
}

impl HostnameEndpoint {
    pub fn parse(s: &str, default_port: u16) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // bracketed ipv6
        if let Some(rest) = s.strip_prefix('[') {
            let close = rest.find(']')?;
            let host = &rest[..close];
            host.parse::<Ipv6Addr>().ok()?;

            let tail = &rest[close + 1..];
            let port = match tail {
                "" => default_port,
                _ => parse_port(tail.strip_prefix(':')?)?,
            };
            return Some(Self {
                host: host.to_string(),
                port,
            });
        }

        // bare ipv6 has its own colons
        if s.parse::<Ipv6Addr>().is_ok() {
            return Some(Self {
                host: s.to_string(),
                port: default_port,
            });
        }

        match s.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() || host.contains(':') {
                    return None;
                }
                let port = parse_port(port)?;
                Some(Self {
                    host: host.to_string(),
                    port,
                })
            }
            None => Some(Self {
                host: s.to_string(),
                port: default_port,
            }),
        }
    }
}

impl fmt::Display for HostnameEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(s: &str) -> Option<u16> {
    let port = s.parse::<u16>().ok()?;
    if port == 0 {
        return None;
    }
    Some(port)
}

// a stun server endpoint, default port depends on the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunServer(pub HostnameEndpoint);

impl StunServer {
    pub fn parse(s: &str) -> Option<Self> {
        HostnameEndpoint::parse(s, DEFAULT_STUN_PORT).map(Self)
    }

    pub fn parse_tls(s: &str) -> Option<Self> {
        HostnameEndpoint::parse(s, DEFAULT_TLS_PORT).map(Self)
    }

    pub fn host(&self) -> &str {
        &self.0.host
    }

    pub fn port(&self) -> u16 {
        self.0.port
    }
}

impl fmt::Display for StunServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// hostname resolution is a collaborator, injected so tests can stub it
#[async_trait]
pub trait DnsQuery: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> Option<SocketAddr>;
}

pub struct SystemDns;

#[async_trait]
impl DnsQuery for SystemDns {
    async fn resolve(&self, host: &str, port: u16) -> Option<SocketAddr> {
        // literal addresses skip the resolver
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Some(SocketAddr::new(ip, port));
        }

        match lookup_host((host, port)).await {
            Ok(mut addrs) => addrs.next(),
            Err(e) => {
                debug!("lookup {} fail, {}", host, e);
                None
            }
        }
    }
}

pub async fn resolve_endpoint(
    dns: &dyn DnsQuery,
    endpoint: &HostnameEndpoint,
) -> Result<SocketAddr, ProbeError> {
    dns.resolve(&endpoint.host, endpoint.port)
        .await
        .ok_or_else(|| ProbeError::Dns(format!("can't resolve {}", endpoint.host)))
}
