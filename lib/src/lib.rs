// stun client library for nat behavior discovery
//
// rfc 3489 classification (classic) and rfc 5389/5780 mapping and
// filtering tests (behavior), over direct udp/tcp sockets, socks5
// relays, or tls.

pub mod attrs;
pub mod behavior;
pub mod classic;
pub mod constants;
pub mod correlate;
pub mod endpoint;
pub mod error;
pub mod header;
pub mod packet;
pub mod probe;
pub mod result;
pub mod transport;
pub mod util;

pub use endpoint::{DnsQuery, HostnameEndpoint, StunServer, SystemDns};
pub use error::ProbeError;
pub use probe::{test_classic_nat_type, test_modern_nat_type};
pub use result::{
    BindingTestResult, ClassicStunResult, FilteringBehavior, MappingBehavior, NatType,
    StunResult5389,
};
pub use transport::{ProxyOptions, TransportProtocol};
