use crate::error::ProbeError;
use crate::packet::Packet;
use crate::transport::StunTransport;
use crate::util::print_bytes;
use bytes::Bytes;
use log::{debug, warn};
use std::net::SocketAddr;
use std::time::Duration;

// single send, single receive, one transaction.
// timeout and noise are "no reply", never errors; retries are the caller's.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvFilter {
    Any,
    From(SocketAddr),
}

#[derive(Debug, Clone)]
pub struct StunResponse {
    pub packet: Packet,
    // where the reply actually came from
    pub remote: SocketAddr,
    pub local: SocketAddr,
}

pub struct RequestCorrelator {
    pub timeout: Duration,
}

impl RequestCorrelator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn request(
        &self,
        transport: &mut dyn StunTransport,
        req: &Packet,
        dest: SocketAddr,
        filter: RecvFilter,
    ) -> Result<Option<StunResponse>, ProbeError> {
        let out = req.pack();
        debug!("--> {}\n{}", dest, print_bytes(&out, " ", 8));

        if let Err(e) = transport.send(&out, dest).await {
            warn!("send to {} fail, {}", dest, e);
            return Ok(None);
        }

        let mut buf = vec![0u8; 2048];
        let received = match tokio::time::timeout(self.timeout, transport.recv(&mut buf)).await {
            Err(_) => {
                debug!("no reply from {} within {:?}", dest, self.timeout);
                return Ok(None);
            }
            Ok(Err(e)) => {
                warn!("recv fail, {}", e);
                return Ok(None);
            }
            Ok(Ok(v)) => v,
        };

        let raw = Bytes::copy_from_slice(&buf[..received.len]);
        debug!(
            "<-- {}\n{}",
            received.remote,
            print_bytes(&raw, " ", 8)
        );

        let packet = match Packet::unpack(raw) {
            Ok(v) => v,
            Err(e) => {
                debug!("drop malformed reply from {}, {:?}", received.remote, e);
                return Ok(None);
            }
        };

        if !req.is_same_transaction(&packet) {
            debug!("drop reply from {}: transaction mismatch", received.remote);
            return Ok(None);
        }

        if let RecvFilter::From(expected) = filter {
            if received.remote != expected {
                debug!(
                    "drop reply from {}: expected {}",
                    received.remote, expected
                );
                return Ok(None);
            }
        }

        Ok(Some(StunResponse {
            packet,
            remote: received.remote,
            local: received.local,
        }))
    }
}
