use crate::behavior::{ModernStunClient, NetworkBindingProbe, TcpBindingProbe};
use crate::classic::{ClassicNatClient, NetworkClassicProbe};
use crate::constants::DEFAULT_RTT_TIMEOUT;
use crate::correlate::RequestCorrelator;
use crate::endpoint::{DnsQuery, StunServer};
use crate::error::ProbeError;
use crate::result::{ClassicStunResult, StunResult5389};
use crate::transport::{udp_transport, ProxyOptions, TransportProtocol};
use log::info;
use std::net::SocketAddr;
use tokio::sync::watch;

// the two entry points: bind, run the state machine, always close

async fn resolve_server(
    server: &StunServer,
    local: SocketAddr,
    dns: &dyn DnsQuery,
) -> Result<SocketAddr, ProbeError> {
    let server_addr = dns
        .resolve(server.host(), server.port())
        .await
        .ok_or_else(|| ProbeError::Dns(format!("can't resolve {}", server.host())))?;

    if server_addr.is_ipv4() != local.is_ipv4() {
        return Err(ProbeError::Config(format!(
            "address family mismatch: server {}, local {}",
            server_addr, local
        )));
    }

    Ok(server_addr)
}

pub async fn test_classic_nat_type(
    server: &StunServer,
    local: SocketAddr,
    proxy: &ProxyOptions,
    dns: &dyn DnsQuery,
    progress: Option<watch::Sender<ClassicStunResult>>,
) -> Result<ClassicStunResult, ProbeError> {
    let server_addr = resolve_server(server, local, dns).await?;
    info!("classic nat probe, server {} ({})", server, server_addr);

    let mut transport = udp_transport(local, proxy, dns).await?;

    let mut client = ClassicNatClient::new(server_addr);
    if let Some(tx) = progress {
        client = client.with_progress(tx);
    }

    let result = {
        let correlator = RequestCorrelator::new(DEFAULT_RTT_TIMEOUT);
        let mut probe = NetworkClassicProbe::new(transport.as_mut(), correlator);
        client.query(&mut probe).await
    };

    transport.close().await;
    result
}

pub async fn test_modern_nat_type(
    server: &StunServer,
    local: SocketAddr,
    protocol: TransportProtocol,
    proxy: &ProxyOptions,
    dns: &dyn DnsQuery,
    progress: Option<watch::Sender<StunResult5389>>,
) -> Result<StunResult5389, ProbeError> {
    let server_addr = resolve_server(server, local, dns).await?;
    info!(
        "modern nat probe over {:?}, server {} ({})",
        protocol, server, server_addr
    );

    let mut client = ModernStunClient::new(server_addr);
    if let Some(tx) = progress {
        client = client.with_progress(tx);
    }

    match protocol {
        TransportProtocol::Udp => {
            let mut transport = udp_transport(local, proxy, dns).await?;
            let result = {
                let correlator = RequestCorrelator::new(DEFAULT_RTT_TIMEOUT);
                let mut probe =
                    NetworkBindingProbe::new(transport.as_mut(), correlator, server_addr);
                client.query_udp(&mut probe).await
            };
            transport.close().await;
            result
        }
        TransportProtocol::Tcp | TransportProtocol::Tls => {
            let use_tls = protocol == TransportProtocol::Tls;
            let mut probe =
                TcpBindingProbe::new(local, server.host(), use_tls, proxy.clone(), dns);
            client.query_tcp(&mut probe).await
        }
    }
}
