use async_trait::async_trait;
use std::collections::VecDeque;
use std::net::SocketAddr;

use natprobe::behavior::{BindingOutcome, BindingProbe, ModernStunClient};
use natprobe::error::ProbeError;
use natprobe::result::{BindingTestResult, FilteringBehavior, MappingBehavior};

const SERVER: &str = "203.0.113.1:3478";
const OTHER: &str = "203.0.113.2:3479";
const LOCAL: &str = "192.168.1.10:54321";
const MAPPED: &str = "198.51.100.7:54321";

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

fn success(mapped: &str, other: Option<&str>) -> BindingOutcome {
    BindingOutcome {
        result: BindingTestResult::Success,
        mapped: Some(addr(mapped)),
        other: other.map(addr),
        remote: Some(addr(SERVER)),
        local: Some(addr(LOCAL)),
    }
}

fn fail() -> BindingOutcome {
    BindingOutcome {
        result: BindingTestResult::Fail,
        mapped: None,
        other: None,
        remote: None,
        local: None,
    }
}

struct ScriptedProbe {
    bindings: VecDeque<BindingOutcome>,
    filters: VecDeque<Option<SocketAddr>>,
    targets: Vec<SocketAddr>,
}

impl ScriptedProbe {
    fn new(bindings: Vec<BindingOutcome>, filters: Vec<Option<SocketAddr>>) -> Self {
        Self {
            bindings: bindings.into(),
            filters: filters.into(),
            targets: vec![],
        }
    }
}

#[async_trait]
impl BindingProbe for ScriptedProbe {
    async fn binding_test(&mut self, target: SocketAddr) -> Result<BindingOutcome, ProbeError> {
        self.targets.push(target);
        Ok(self.bindings.pop_front().expect("binding script exhausted"))
    }

    async fn filtering_probe(
        &mut self,
        _change_ip: bool,
        _change_port: bool,
    ) -> Result<Option<SocketAddr>, ProbeError> {
        Ok(self.filters.pop_front().expect("filter script exhausted"))
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(addr(LOCAL))
    }
}

#[tokio::test]
async fn test_binding_fail() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(vec![fail()], vec![]);

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.binding_test_result, BindingTestResult::Fail);
    assert_eq!(result.mapping_behavior, MappingBehavior::Fail);
    assert_eq!(result.filtering_behavior, FilteringBehavior::UnsupportedServer);
}

#[tokio::test]
async fn test_missing_other_address_is_unsupported() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(vec![success(MAPPED, None)], vec![]);

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.binding_test_result, BindingTestResult::Success);
    assert_eq!(result.mapping_behavior, MappingBehavior::UnsupportedServer);
    assert_eq!(result.filtering_behavior, FilteringBehavior::UnsupportedServer);
}

#[tokio::test]
async fn test_self_referential_other_address_is_unsupported() {
    let client = ModernStunClient::new(addr(SERVER));
    // other shares the primary port
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some("203.0.113.2:3478"))],
        vec![],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.mapping_behavior, MappingBehavior::UnsupportedServer);
    assert_eq!(result.filtering_behavior, FilteringBehavior::UnsupportedServer);
}

#[tokio::test]
async fn test_direct_mapping() {
    let client = ModernStunClient::new(addr(SERVER));
    // the server sees our local endpoint untranslated
    let mut probe = ScriptedProbe::new(
        vec![success(LOCAL, Some(OTHER))],
        vec![Some(addr(OTHER))],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.mapping_behavior, MappingBehavior::Direct);
    assert_eq!(
        result.filtering_behavior,
        FilteringBehavior::EndpointIndependent
    );
}

#[tokio::test]
async fn test_endpoint_independent_mapping() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![Some(addr(OTHER))],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(
        result.mapping_behavior,
        MappingBehavior::EndpointIndependent
    );
    // test II went to the alternate ip on the primary port
    assert_eq!(probe.targets[1], addr("203.0.113.2:3478"));
}

#[tokio::test]
async fn test_address_dependent_mapping() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![
            success(MAPPED, Some(OTHER)),
            success("198.51.100.7:60000", Some(OTHER)),
            success("198.51.100.7:60000", Some(OTHER)),
        ],
        vec![None, None],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.mapping_behavior, MappingBehavior::AddressDependent);
    assert_eq!(probe.targets[2], addr(OTHER));
}

#[tokio::test]
async fn test_address_and_port_dependent_mapping() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![
            success(MAPPED, Some(OTHER)),
            success("198.51.100.7:60000", Some(OTHER)),
            success("198.51.100.7:60001", Some(OTHER)),
        ],
        vec![None, None],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(
        result.mapping_behavior,
        MappingBehavior::AddressAndPortDependent
    );
}

#[tokio::test]
async fn test_mapping_test2_failure() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), fail()],
        vec![None, None],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.mapping_behavior, MappingBehavior::Fail);
}

#[tokio::test]
async fn test_filtering_reply_from_other_is_endpoint_independent() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![Some(addr(OTHER))],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(
        result.filtering_behavior,
        FilteringBehavior::EndpointIndependent
    );
}

#[tokio::test]
async fn test_filtering_reply_from_elsewhere_is_unsupported() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![Some(addr("198.18.0.1:9999"))],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(
        result.filtering_behavior,
        FilteringBehavior::UnsupportedServer
    );
}

#[tokio::test]
async fn test_filtering_test3_from_server_ip_new_port_is_address_dependent() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![None, Some(addr("203.0.113.1:3479"))],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.filtering_behavior, FilteringBehavior::AddressDependent);
}

#[tokio::test]
async fn test_filtering_no_replies_is_address_and_port_dependent() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![None, None],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(
        result.filtering_behavior,
        FilteringBehavior::AddressAndPortDependent
    );
}

#[tokio::test]
async fn test_filtering_test3_unexpected_source_is_unsupported() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![None, Some(addr("198.18.0.1:3479"))],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(
        result.filtering_behavior,
        FilteringBehavior::UnsupportedServer
    );
}

#[tokio::test]
async fn test_tcp_variant_has_no_filtering() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![],
    );

    let result = client.query_tcp(&mut probe).await.unwrap();
    assert_eq!(
        result.mapping_behavior,
        MappingBehavior::EndpointIndependent
    );
    assert_eq!(result.filtering_behavior, FilteringBehavior::None);
}

#[tokio::test]
async fn test_result_carries_endpoints() {
    let client = ModernStunClient::new(addr(SERVER));
    let mut probe = ScriptedProbe::new(
        vec![success(MAPPED, Some(OTHER)), success(MAPPED, Some(OTHER))],
        vec![None, None],
    );

    let result = client.query_udp(&mut probe).await.unwrap();
    assert_eq!(result.public_end_point, Some(addr(MAPPED)));
    assert_eq!(result.local_end_point, Some(addr(LOCAL)));
    assert_eq!(result.other_end_point, Some(addr(OTHER)));
}
