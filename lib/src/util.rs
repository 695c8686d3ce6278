use crate::constants::{MAGIC_COOKIE, TRANS_ID_LEN};
use crate::header::TransId;
use rand::prelude::*;
use std::fmt::Write as _;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};

pub fn print_bytes(buf: &[u8], separator: &str, row_width: usize) -> String {
    let mut hex = String::new();
    buf.iter().enumerate().for_each(|(x, y)| {
        let _ = write!(hex, "{:02X}", y);
        if (x + 1) % row_width == 0 {
            hex.push('\n');
        } else {
            hex.push_str(separator);
        }
    });

    hex
}

// 12 random bytes, regenerated per outgoing request
pub fn new_trans_id() -> TransId {
    let mut trans_id = [0u8; TRANS_ID_LEN];
    rand::thread_rng().fill_bytes(&mut trans_id);
    trans_id
}

// attribute padding filler, content is arbitrary
pub fn random_filler(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

// xor key is (magic cookie || trans_id), port uses only the first 2 key bytes
pub fn xor_address_v4(addr: SocketAddrV4) -> SocketAddrV4 {
    let magic_prefix = u16::from_be_bytes([MAGIC_COOKIE[0], MAGIC_COOKIE[1]]);
    let port = addr.port() ^ magic_prefix;

    let src_buf = addr.ip().octets();
    let mut buf = [0_u8; 4];
    for i in 0..buf.len() {
        buf[i] = src_buf[i] ^ MAGIC_COOKIE[i];
    }

    SocketAddrV4::new(Ipv4Addr::from(buf), port)
}

pub fn xor_address_v6(addr: SocketAddrV6, trans_id: &TransId) -> SocketAddrV6 {
    let magic_prefix = u16::from_be_bytes([MAGIC_COOKIE[0], MAGIC_COOKIE[1]]);
    let port = addr.port() ^ magic_prefix;

    let src_buf = addr.ip().octets();
    let mut buf = [0_u8; 16];
    for i in 0..buf.len() {
        if i < MAGIC_COOKIE.len() {
            buf[i] = src_buf[i] ^ MAGIC_COOKIE[i];
        } else {
            buf[i] = src_buf[i] ^ trans_id[i - MAGIC_COOKIE.len()];
        }
    }

    SocketAddrV6::new(Ipv6Addr::from(buf), port, 0, 0)
}

// the transform is its own inverse
pub fn xor_address(addr: SocketAddr, trans_id: &TransId) -> SocketAddr {
    match addr {
        SocketAddr::V4(v) => SocketAddr::V4(xor_address_v4(v)),
        SocketAddr::V6(v) => SocketAddr::V6(xor_address_v6(v, trans_id)),
    }
}

// class: 3 bit, number: 0-99
pub fn pack_error_code(code: u16) -> u16 {
    let n1 = (code / 100) & 0x07;
    let n2 = code % 100;

    n1 << 8 | n2
}

pub fn unpack_error_code(packed: u16) -> u16 {
    let n1 = (packed >> 8) & 0x07;
    let n2 = (packed & 0x00ff).min(99);
    n1 * 100 + n2
}
