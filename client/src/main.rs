// ./client --server stun.example.org:3478 --rfc 5780 --protocol udp

use std::net::SocketAddr;

use clap::builder::ValueParser;
use clap::{Arg, Command};
use log::debug;

use natprobe::transport::ProxyOptions;
use natprobe::{
    test_classic_nat_type, test_modern_nat_type, HostnameEndpoint, StunServer, SystemDns,
    TransportProtocol,
};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// the default port depends on the transport, so the server string is
// parsed only after --protocol is known
fn server_for_protocol(s: &str, protocol: TransportProtocol) -> Option<StunServer> {
    match protocol {
        TransportProtocol::Tls => StunServer::parse_tls(s),
        _ => StunServer::parse(s),
    }
}

fn parse_proxy(s: &str) -> Result<HostnameEndpoint, String> {
    HostnameEndpoint::parse(s, 1080).ok_or_else(|| format!("bad proxy: {}", s))
}

fn parse_local(s: &str) -> Result<SocketAddr, String> {
    s.parse::<SocketAddr>().map_err(|e| format!("{}", e))
}

fn parse_protocol(s: &str) -> Result<TransportProtocol, String> {
    match s {
        "udp" => Ok(TransportProtocol::Udp),
        "tcp" => Ok(TransportProtocol::Tcp),
        "tls" => Ok(TransportProtocol::Tls),
        v => Err(format!("bad protocol: {}", v)),
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("probe nat mapping and filtering behavior via stun")
        .arg(
            Arg::new("server")
                .long("server")
                .takes_value(true)
                .required(true)
                .help("stun server, host[:port]"),
        )
        .arg(
            Arg::new("local")
                .long("local")
                .takes_value(true)
                .default_value("0.0.0.0:0")
                .help("local endpoint to bind")
                .value_parser(ValueParser::new(parse_local)),
        )
        .arg(
            Arg::new("rfc")
                .long("rfc")
                .takes_value(true)
                .default_value("5780")
                .possible_values(["3489", "5780"])
                .help("which discovery algorithm to run"),
        )
        .arg(
            Arg::new("protocol")
                .long("protocol")
                .takes_value(true)
                .default_value("udp")
                .help("udp, tcp or tls (rfc 5780 only)")
                .value_parser(ValueParser::new(parse_protocol)),
        )
        .arg(
            Arg::new("socks5")
                .long("socks5")
                .takes_value(true)
                .help("socks5 proxy, host[:port]")
                .value_parser(ValueParser::new(parse_proxy)),
        )
        .arg(
            Arg::new("socks5_user")
                .long("socks5-user")
                .takes_value(true)
                .help("socks5 username"),
        )
        .arg(
            Arg::new("socks5_pass")
                .long("socks5-pass")
                .takes_value(true)
                .help("socks5 password"),
        )
        .get_matches();

    let local: SocketAddr = *app.get_one("local").expect("wrong local");
    let rfc: &String = app.get_one("rfc").expect("wrong rfc");
    let protocol: TransportProtocol = *app.get_one("protocol").expect("wrong protocol");

    let server_str: &String = app.get_one("server").expect("wrong server");
    let server = match server_for_protocol(server_str, protocol) {
        Some(v) => v,
        None => {
            eprintln!("bad server: {}", server_str);
            std::process::exit(2);
        }
    };

    let proxy = match app.get_one::<HostnameEndpoint>("socks5") {
        Some(p) => ProxyOptions::socks5(
            p.clone(),
            app.get_one::<String>("socks5_user").cloned(),
            app.get_one::<String>("socks5_pass").cloned(),
        ),
        None => ProxyOptions::plain(),
    };

    let dns = SystemDns;
    debug!("server: {}, local: {}", server, local);

    match rfc.as_str() {
        "3489" => {
            match test_classic_nat_type(&server, local, &proxy, &dns, None).await {
                Ok(v) => {
                    println!("nat type:   {}", v.nat_type);
                    if let Some(addr) = v.public_end_point {
                        println!("public:     {}", addr);
                    }
                    if let Some(addr) = v.local_end_point {
                        println!("local:      {}", addr);
                    }
                }
                Err(e) => {
                    eprintln!("error, {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => {
            match test_modern_nat_type(&server, local, protocol, &proxy, &dns, None).await {
                Ok(v) => {
                    println!("binding:    {:?}", v.binding_test_result);
                    println!("mapping:    {:?}", v.mapping_behavior);
                    println!("filtering:  {:?}", v.filtering_behavior);
                    if let Some(addr) = v.public_end_point {
                        println!("public:     {}", addr);
                    }
                    if let Some(addr) = v.local_end_point {
                        println!("local:      {}", addr);
                    }
                    if let Some(addr) = v.other_end_point {
                        println!("other:      {}", addr);
                    }
                }
                Err(e) => {
                    eprintln!("error, {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
