use std::time::Duration;

// 0x2112A442
pub const MAGIC_COOKIE: [u8; 4] = [0x21, 0x12, 0xA4, 0x42];

pub const TRANS_ID_LEN: usize = 12;
pub const HEADER_LEN: usize = 20;

pub const MESSAGE_TYPE_BIND_REQ: u16 = 0x0001;
pub const MESSAGE_TYPE_BIND_RES: u16 = 0x0101;
pub const MESSAGE_TYPE_BIND_ERR_RES: u16 = 0x0111;
pub const MESSAGE_TYPE_SHARED_SECRET_REQ: u16 = 0x0002;
pub const MESSAGE_TYPE_SHARED_SECRET_RES: u16 = 0x0102;
pub const MESSAGE_TYPE_SHARED_SECRET_ERR_RES: u16 = 0x0112;

// top 2 bits must be zero on the wire
pub const MESSAGE_TYPE_MASK: u16 = 0x3FFF;

pub const ATTR_FAMILY_IPV4: u8 = 0x01;
pub const ATTR_FAMILY_IPV6: u8 = 0x02;

pub const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
pub const ATTR_RESPONSE_ADDRESS: u16 = 0x0002;
pub const ATTR_CHANGE_REQUEST: u16 = 0x0003;
pub const ATTR_SOURCE_ADDRESS: u16 = 0x0004;
pub const ATTR_CHANGED_ADDRESS: u16 = 0x0005;
pub const ATTR_USERNAME: u16 = 0x0006;
pub const ATTR_PASSWORD: u16 = 0x0007;
pub const ATTR_MESSAGE_INTEGRITY: u16 = 0x0008;
pub const ATTR_ERROR_CODE: u16 = 0x0009;
pub const ATTR_UNKNOWN_ATTRIBUTE: u16 = 0x000A;
pub const ATTR_REFLECTED_FROM: u16 = 0x000B;
pub const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;
pub const ATTR_OTHER_ADDRESS: u16 = 0x802C;

pub const ERROR_REASON_MAX_LEN: usize = 762;

pub const DEFAULT_STUN_PORT: u16 = 3478;
pub const DEFAULT_TLS_PORT: u16 = 5349;

pub const DEFAULT_RTT_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
