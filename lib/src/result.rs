use std::fmt;
use std::net::SocketAddr;

// rfc 3489 classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NatType {
    Unknown,
    UdpBlocked,
    OpenInternet,
    SymmetricUdpFirewall,
    FullCone,
    RestrictedCone,
    PortRestrictedCone,
    Symmetric,
    UnsupportedServer,
}

impl fmt::Display for NatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NatType::Unknown => "Unknown",
            NatType::UdpBlocked => "UDP blocked",
            NatType::OpenInternet => "Open internet",
            NatType::SymmetricUdpFirewall => "Symmetric UDP firewall",
            NatType::FullCone => "Full cone",
            NatType::RestrictedCone => "Restricted cone",
            NatType::PortRestrictedCone => "Port restricted cone",
            NatType::Symmetric => "Symmetric",
            NatType::UnsupportedServer => "Unsupported server",
        };
        f.write_str(s)
    }
}

// immutable snapshot; a fresh one is published per test step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassicStunResult {
    pub nat_type: NatType,
    pub public_end_point: Option<SocketAddr>,
    pub local_end_point: Option<SocketAddr>,
}

impl Default for ClassicStunResult {
    fn default() -> Self {
        Self {
            nat_type: NatType::Unknown,
            public_end_point: None,
            local_end_point: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingTestResult {
    Unknown,
    Success,
    Fail,
    UnsupportedServer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingBehavior {
    Unknown,
    UnsupportedServer,
    Direct,
    EndpointIndependent,
    AddressDependent,
    AddressAndPortDependent,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilteringBehavior {
    Unknown,
    UnsupportedServer,
    EndpointIndependent,
    AddressDependent,
    AddressAndPortDependent,
    Fail,
    // filtering tests are udp-only
    None,
}

// rfc 5389/5780 result snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunResult5389 {
    pub binding_test_result: BindingTestResult,
    pub mapping_behavior: MappingBehavior,
    pub filtering_behavior: FilteringBehavior,
    pub public_end_point: Option<SocketAddr>,
    pub local_end_point: Option<SocketAddr>,
    pub other_end_point: Option<SocketAddr>,
}

impl Default for StunResult5389 {
    fn default() -> Self {
        Self {
            binding_test_result: BindingTestResult::Unknown,
            mapping_behavior: MappingBehavior::Unknown,
            filtering_behavior: FilteringBehavior::Unknown,
            public_end_point: None,
            local_end_point: None,
            other_end_point: None,
        }
    }
}
