use crate::correlate::{RecvFilter, RequestCorrelator};
use crate::error::ProbeError;
use crate::packet::Packet;
use crate::result::{ClassicStunResult, NatType};
use crate::transport::StunTransport;
use crate::util;
use async_trait::async_trait;
use log::debug;
use std::net::SocketAddr;
use tokio::sync::watch;

// rfc 3489, 10.1
//
// Test I    plain binding request to the primary address
// Test II   change-request {ip, port} to the primary address
// Test I(II) plain binding request to the changed address
// Test III  change-request {port} to the changed address

#[derive(Debug, Clone)]
pub struct ProbeReply {
    pub mapped: Option<SocketAddr>,
    pub changed: Option<SocketAddr>,
    pub remote: SocketAddr,
}

// probe seam: the decision tree never touches the network directly
#[async_trait]
pub trait ClassicProbe: Send {
    async fn binding_request(
        &mut self,
        dest: SocketAddr,
        change_ip: bool,
        change_port: bool,
    ) -> Result<Option<ProbeReply>, ProbeError>;

    fn local_addr(&self) -> Option<SocketAddr>;
}

pub struct NetworkClassicProbe<'a> {
    transport: &'a mut dyn StunTransport,
    correlator: RequestCorrelator,
}

impl<'a> NetworkClassicProbe<'a> {
    pub fn new(transport: &'a mut dyn StunTransport, correlator: RequestCorrelator) -> Self {
        Self {
            transport,
            correlator,
        }
    }
}

#[async_trait]
impl ClassicProbe for NetworkClassicProbe<'_> {
    async fn binding_request(
        &mut self,
        dest: SocketAddr,
        change_ip: bool,
        change_port: bool,
    ) -> Result<Option<ProbeReply>, ProbeError> {
        let change = if change_ip || change_port {
            Some((change_ip, change_port))
        } else {
            None
        };
        let request = Packet::binding_request(util::new_trans_id(), change);

        // change-request replies come from another address, never filter
        let response = self
            .correlator
            .request(self.transport, &request, dest, RecvFilter::Any)
            .await?;

        Ok(response.map(|r| ProbeReply {
            mapped: r.packet.mapped_address(),
            changed: r.packet.changed_address(),
            remote: r.remote,
        }))
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.local_addr()
    }
}

pub struct ClassicNatClient {
    server: SocketAddr,
    progress: Option<watch::Sender<ClassicStunResult>>,
}

impl ClassicNatClient {
    pub fn new(server: SocketAddr) -> Self {
        Self {
            server,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: watch::Sender<ClassicStunResult>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn publish(&self, result: &ClassicStunResult) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(result.clone());
        }
    }

    pub async fn query(
        &self,
        probe: &mut dyn ClassicProbe,
    ) -> Result<ClassicStunResult, ProbeError> {
        let local = probe.local_addr();
        let mut result = ClassicStunResult {
            nat_type: NatType::Unknown,
            public_end_point: None,
            local_end_point: local,
        };
        self.publish(&result);

        // Test I
        let test1 = match probe.binding_request(self.server, false, false).await? {
            Some(v) => v,
            None => {
                result.nat_type = NatType::UdpBlocked;
                self.publish(&result);
                return Ok(result);
            }
        };
        debug!("test1: {:?}", test1);

        let mapped1 = match test1.mapped {
            Some(v) => v,
            None => {
                result.nat_type = NatType::UnsupportedServer;
                self.publish(&result);
                return Ok(result);
            }
        };
        result.public_end_point = Some(mapped1);
        self.publish(&result);

        // no translation observed
        if Some(mapped1) == local {
            let test2 = probe.binding_request(self.server, true, true).await?;
            result.nat_type = match test2 {
                Some(_) => NatType::OpenInternet,
                None => NatType::SymmetricUdpFirewall,
            };
            self.publish(&result);
            return Ok(result);
        }

        // nat present
        let test2 = probe.binding_request(self.server, true, true).await?;
        debug!("test2: {:?}", test2);

        if let Some(reply) = test2 {
            // the reply must come from the fully changed address
            result.nat_type = match test1.changed {
                Some(changed) if reply.remote == changed => NatType::FullCone,
                _ => NatType::UnsupportedServer,
            };
            self.publish(&result);
            return Ok(result);
        }

        let changed = match test1.changed {
            Some(v) => v,
            None => {
                result.nat_type = NatType::UnsupportedServer;
                self.publish(&result);
                return Ok(result);
            }
        };

        // Test I(II)
        let test12 = match probe.binding_request(changed, false, false).await? {
            Some(v) => v,
            None => {
                result.nat_type = NatType::UnsupportedServer;
                self.publish(&result);
                return Ok(result);
            }
        };
        debug!("test1(2): {:?}", test12);

        match test12.mapped {
            Some(mapped12) if mapped12 != mapped1 => {
                result.public_end_point = Some(mapped12);
                result.nat_type = NatType::Symmetric;
                self.publish(&result);
                return Ok(result);
            }
            Some(_) => {}
            None => {
                result.nat_type = NatType::UnsupportedServer;
                self.publish(&result);
                return Ok(result);
            }
        }

        // Test III: same ip as the changed address, different port
        let test3 = probe.binding_request(changed, false, true).await?;
        debug!("test3: {:?}", test3);

        result.nat_type = match test3 {
            Some(reply) if reply.remote.ip() == changed.ip() && reply.remote.port() != changed.port() => {
                NatType::RestrictedCone
            }
            _ => NatType::PortRestrictedCone,
        };
        self.publish(&result);
        Ok(result)
    }
}
