use std::io;

#[derive(Debug)]
pub enum ParsePacketErr {
    // length or value disagrees with the buffer
    NotMatch(String),

    // buffer too short
    BufSize(String),

    // a field holds an out-of-spec value
    BadValue(String),

    // reason phrase is not utf8
    NotUtf8,
}

#[derive(Debug)]
pub struct ValidateErr(pub String);

pub trait AttrValidator {
    fn validate(&self) -> Option<ValidateErr>;
}

// setup and transport failures; classification outcomes are never errors
#[derive(Debug)]
pub enum ProbeError {
    // bad server/proxy string, mismatched address families
    Config(String),

    // hostname did not resolve
    Dns(String),

    Io(io::Error),

    // socks5 handshake rejected
    Proxy(String),

    Tls(String),
}

impl From<io::Error> for ProbeError {
    fn from(e: io::Error) -> Self {
        ProbeError::Io(e)
    }
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Config(v) => write!(f, "config error: {}", v),
            ProbeError::Dns(v) => write!(f, "dns error: {}", v),
            ProbeError::Io(v) => write!(f, "io error: {}", v),
            ProbeError::Proxy(v) => write!(f, "proxy error: {}", v),
            ProbeError::Tls(v) => write!(f, "tls error: {}", v),
        }
    }
}

impl std::error::Error for ProbeError {}
