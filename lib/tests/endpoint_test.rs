use natprobe::constants::{DEFAULT_STUN_PORT, DEFAULT_TLS_PORT};
use natprobe::endpoint::{HostnameEndpoint, StunServer};

fn parse(s: &str) -> Option<HostnameEndpoint> {
    HostnameEndpoint::parse(s, DEFAULT_STUN_PORT)
}

#[test]
fn test_parse_ipv4_with_port() {
    let ep = parse("1.1.1.1:1").unwrap();
    assert_eq!(ep.host, "1.1.1.1");
    assert_eq!(ep.port, 1);
}

#[test]
fn test_parse_hostname_with_port() {
    let ep = parse("stun.example.org:3479").unwrap();
    assert_eq!(ep.host, "stun.example.org");
    assert_eq!(ep.port, 3479);
}

#[test]
fn test_parse_bare_hostname_defaults_port() {
    let ep = parse("stun.example.org").unwrap();
    assert_eq!(ep.host, "stun.example.org");
    assert_eq!(ep.port, DEFAULT_STUN_PORT);
}

#[test]
fn test_parse_bracketed_ipv6() {
    let ep = parse("[2001:db8::1]:1919").unwrap();
    assert_eq!(ep.host, "2001:db8::1");
    assert_eq!(ep.port, 1919);
}

#[test]
fn test_parse_bracketed_ipv6_without_port() {
    let ep = parse("[2001:db8::1]").unwrap();
    assert_eq!(ep.host, "2001:db8::1");
    assert_eq!(ep.port, DEFAULT_STUN_PORT);
}

#[test]
fn test_parse_bare_ipv6() {
    let ep = parse("::1").unwrap();
    assert_eq!(ep.host, "::1");
    assert_eq!(ep.port, DEFAULT_STUN_PORT);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse("").is_none());
    assert!(parse("   ").is_none());
    assert!(parse("host:name:3478").is_none());
    assert!(parse(":3478").is_none());
    assert!(parse("host:99999").is_none());
    assert!(parse("host:0").is_none());
    assert!(parse("host:abc").is_none());
    assert!(parse("[2001:db8::1").is_none());
    assert!(parse("[notanip]:1").is_none());
}

#[test]
fn test_stun_server_default_ports() {
    assert_eq!(StunServer::parse("stun.example.org").unwrap().port(), 3478);
    assert_eq!(
        StunServer::parse_tls("stun.example.org").unwrap().port(),
        DEFAULT_TLS_PORT
    );
}

#[test]
fn test_display_brackets_ipv6() {
    let ep = parse("[2001:db8::1]:1919").unwrap();
    assert_eq!(format!("{}", ep), "[2001:db8::1]:1919");

    let ep = parse("stun.example.org").unwrap();
    assert_eq!(format!("{}", ep), "stun.example.org:3478");
}
