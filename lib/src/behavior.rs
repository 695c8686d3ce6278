use crate::constants::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RTT_TIMEOUT};
use crate::correlate::{RecvFilter, RequestCorrelator};
use crate::endpoint::DnsQuery;
use crate::error::ProbeError;
use crate::packet::Packet;
use crate::result::{BindingTestResult, FilteringBehavior, MappingBehavior, StunResult5389};
use crate::transport::{tcp_transport, ProxyOptions, StunTransport};
use crate::util;
use async_trait::async_trait;
use log::{debug, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;

// rfc 5780, 4.3 (mapping) and 4.4 (filtering)

#[derive(Debug, Clone)]
pub struct BindingOutcome {
    pub result: BindingTestResult,
    pub mapped: Option<SocketAddr>,
    pub other: Option<SocketAddr>,
    pub remote: Option<SocketAddr>,
    pub local: Option<SocketAddr>,
}

impl BindingOutcome {
    fn fail() -> Self {
        Self {
            result: BindingTestResult::Fail,
            mapped: None,
            other: None,
            remote: None,
            local: None,
        }
    }
}

// probe seam: binding tests and change-request probes are injected,
// the behavior tables never touch the network directly
#[async_trait]
pub trait BindingProbe: Send {
    async fn binding_test(&mut self, target: SocketAddr) -> Result<BindingOutcome, ProbeError>;

    // change-request binding to the primary address, reply source wanted
    async fn filtering_probe(
        &mut self,
        change_ip: bool,
        change_port: bool,
    ) -> Result<Option<SocketAddr>, ProbeError>;

    fn local_addr(&self) -> Option<SocketAddr>;
}

fn outcome_from_response(response: Option<crate::correlate::StunResponse>) -> BindingOutcome {
    match response {
        None => BindingOutcome::fail(),
        Some(r) => {
            let mapped = r.packet.xor_mapped_address();
            let other = r.packet.other_address().or_else(|| r.packet.changed_address());
            let result = match mapped {
                Some(_) => BindingTestResult::Success,
                None => BindingTestResult::UnsupportedServer,
            };
            BindingOutcome {
                result,
                mapped,
                other,
                remote: Some(r.remote),
                local: Some(r.local),
            }
        }
    }
}

pub struct NetworkBindingProbe<'a> {
    transport: &'a mut dyn StunTransport,
    correlator: RequestCorrelator,
    server: SocketAddr,
}

impl<'a> NetworkBindingProbe<'a> {
    pub fn new(
        transport: &'a mut dyn StunTransport,
        correlator: RequestCorrelator,
        server: SocketAddr,
    ) -> Self {
        Self {
            transport,
            correlator,
            server,
        }
    }
}

#[async_trait]
impl BindingProbe for NetworkBindingProbe<'_> {
    async fn binding_test(&mut self, target: SocketAddr) -> Result<BindingOutcome, ProbeError> {
        let request = Packet::binding_request(util::new_trans_id(), None);
        let response = self
            .correlator
            .request(self.transport, &request, target, RecvFilter::From(target))
            .await?;
        Ok(outcome_from_response(response))
    }

    async fn filtering_probe(
        &mut self,
        change_ip: bool,
        change_port: bool,
    ) -> Result<Option<SocketAddr>, ProbeError> {
        let request =
            Packet::binding_request(util::new_trans_id(), Some((change_ip, change_port)));
        // the whole point is a reply from somewhere else
        let response = self
            .correlator
            .request(self.transport, &request, self.server, RecvFilter::Any)
            .await?;
        Ok(response.map(|r| r.remote))
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.local_addr()
    }
}

// one fresh connection per target; SO_REUSEADDR keeps the local port stable
pub struct TcpBindingProbe<'a> {
    local: SocketAddr,
    server_host: String,
    use_tls: bool,
    proxy: ProxyOptions,
    dns: &'a dyn DnsQuery,
    connect_timeout: Duration,
    rtt_timeout: Duration,
}

impl<'a> TcpBindingProbe<'a> {
    pub fn new(
        local: SocketAddr,
        server_host: &str,
        use_tls: bool,
        proxy: ProxyOptions,
        dns: &'a dyn DnsQuery,
    ) -> Self {
        Self {
            local,
            server_host: server_host.to_string(),
            use_tls,
            proxy,
            dns,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            rtt_timeout: DEFAULT_RTT_TIMEOUT,
        }
    }
}

#[async_trait]
impl BindingProbe for TcpBindingProbe<'_> {
    async fn binding_test(&mut self, target: SocketAddr) -> Result<BindingOutcome, ProbeError> {
        let mut transport = match tcp_transport(
            self.local,
            target,
            &self.server_host,
            self.use_tls,
            &self.proxy,
            self.dns,
            self.connect_timeout,
        )
        .await
        {
            Ok(v) => v,
            Err(e) => {
                // an unreachable alternate address reads as "no reply"
                warn!("connect {} fail, {}", target, e);
                return Ok(BindingOutcome::fail());
            }
        };

        // keep the same local port for the following tests
        if self.local.port() == 0 {
            if let Some(bound) = transport.local_addr() {
                self.local = bound;
            }
        }

        let correlator = RequestCorrelator::new(self.rtt_timeout);
        let request = Packet::binding_request(util::new_trans_id(), None);
        let response = correlator
            .request(transport.as_mut(), &request, target, RecvFilter::From(target))
            .await?;
        transport.close().await;

        Ok(outcome_from_response(response))
    }

    async fn filtering_probe(
        &mut self,
        _change_ip: bool,
        _change_port: bool,
    ) -> Result<Option<SocketAddr>, ProbeError> {
        // meaningless over a connection-oriented transport
        Ok(None)
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local)
    }
}

// the other address must differ from the primary in both ip and port
fn valid_other(other: Option<SocketAddr>, server: SocketAddr) -> Option<SocketAddr> {
    match other {
        Some(o) if o.ip() != server.ip() && o.port() != server.port() => Some(o),
        _ => None,
    }
}

pub struct ModernStunClient {
    server: SocketAddr,
    progress: Option<watch::Sender<StunResult5389>>,
}

impl ModernStunClient {
    pub fn new(server: SocketAddr) -> Self {
        Self {
            server,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: watch::Sender<StunResult5389>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn publish(&self, result: &StunResult5389) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(result.clone());
        }
    }

    // full udp discovery: binding, mapping, filtering
    pub async fn query_udp(
        &self,
        probe: &mut dyn BindingProbe,
    ) -> Result<StunResult5389, ProbeError> {
        let mut result = self.run_binding_and_mapping(probe).await?;

        result.filtering_behavior = match valid_other(result.other_end_point, self.server) {
            Some(other) if result.binding_test_result == BindingTestResult::Success => {
                self.filtering_test(probe, other).await?
            }
            _ => FilteringBehavior::UnsupportedServer,
        };
        self.publish(&result);
        Ok(result)
    }

    // reduced variant: filtering probes need udp
    pub async fn query_tcp(
        &self,
        probe: &mut dyn BindingProbe,
    ) -> Result<StunResult5389, ProbeError> {
        let mut result = self.run_binding_and_mapping(probe).await?;
        result.filtering_behavior = FilteringBehavior::None;
        self.publish(&result);
        Ok(result)
    }

    async fn run_binding_and_mapping(
        &self,
        probe: &mut dyn BindingProbe,
    ) -> Result<StunResult5389, ProbeError> {
        let mut result = StunResult5389 {
            local_end_point: probe.local_addr(),
            ..Default::default()
        };
        self.publish(&result);

        let b1 = probe.binding_test(self.server).await?;
        debug!("binding test: {:?}", b1);

        result.binding_test_result = b1.result;
        result.public_end_point = b1.mapped;
        result.other_end_point = b1.other;
        if b1.local.is_some() {
            result.local_end_point = b1.local;
        }
        self.publish(&result);

        if b1.result != BindingTestResult::Success {
            result.mapping_behavior = match b1.result {
                BindingTestResult::Fail => MappingBehavior::Fail,
                _ => MappingBehavior::UnsupportedServer,
            };
            self.publish(&result);
            return Ok(result);
        }

        result.mapping_behavior = match valid_other(b1.other, self.server) {
            None => MappingBehavior::UnsupportedServer,
            Some(other) => self.mapping_test(probe, &b1, other).await?,
        };
        self.publish(&result);
        Ok(result)
    }

    async fn mapping_test(
        &self,
        probe: &mut dyn BindingProbe,
        b1: &BindingOutcome,
        other: SocketAddr,
    ) -> Result<MappingBehavior, ProbeError> {
        // no translation: the server already sees our local endpoint
        if b1.mapped.is_some() && b1.mapped == b1.local.or_else(|| probe.local_addr()) {
            return Ok(MappingBehavior::Direct);
        }

        // test II: alternate ip, primary port
        let target2 = SocketAddr::new(other.ip(), self.server.port());
        let t2 = probe.binding_test(target2).await?;
        debug!("mapping test2: {:?}", t2);
        if t2.result != BindingTestResult::Success {
            return Ok(MappingBehavior::Fail);
        }
        if t2.mapped == b1.mapped {
            return Ok(MappingBehavior::EndpointIndependent);
        }

        // test III: alternate ip and port
        let t3 = probe.binding_test(other).await?;
        debug!("mapping test3: {:?}", t3);
        if t3.result != BindingTestResult::Success {
            return Ok(MappingBehavior::Fail);
        }
        if t3.mapped == t2.mapped {
            Ok(MappingBehavior::AddressDependent)
        } else {
            Ok(MappingBehavior::AddressAndPortDependent)
        }
    }

    async fn filtering_test(
        &self,
        probe: &mut dyn BindingProbe,
        other: SocketAddr,
    ) -> Result<FilteringBehavior, ProbeError> {
        // test II: ask for a reply from the fully changed address
        let f2 = probe.filtering_probe(true, true).await?;
        debug!("filtering test2 reply from: {:?}", f2);
        if let Some(src) = f2 {
            return if src == other {
                Ok(FilteringBehavior::EndpointIndependent)
            } else {
                Ok(FilteringBehavior::UnsupportedServer)
            };
        }

        // test III: same ip, changed port
        let f3 = probe.filtering_probe(false, true).await?;
        debug!("filtering test3 reply from: {:?}", f3);
        match f3 {
            None => Ok(FilteringBehavior::AddressAndPortDependent),
            Some(src) if src.ip() == self.server.ip() && src.port() != self.server.port() => {
                Ok(FilteringBehavior::AddressDependent)
            }
            Some(_) => Ok(FilteringBehavior::UnsupportedServer),
        }
    }
}
