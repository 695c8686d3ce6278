use bytes::{BufMut, BytesMut};
use std::net::SocketAddr;

use natprobe::attrs::address_attr::AddressAttr;
use natprobe::attrs::change_request::ChangeRequest;
use natprobe::attrs::errcode_attr::ErrcodeAttr;
use natprobe::attrs::unknown_attrs::UnknownAttrs;
use natprobe::attrs::xor_address::XorMappedAddress;
use natprobe::attrs::RawAttr;
use natprobe::constants::*;
use natprobe::header::Header;
use natprobe::packet::Packet;
use natprobe::util;

#[test]
fn test_address_attr_round_trip_v4() {
    let addr: SocketAddr = "192.168.8.100:5678".parse().unwrap();
    let raw: RawAttr = AddressAttr::new(ATTR_MAPPED_ADDRESS, addr).into();
    assert_eq!(raw.attr_len, 8);

    let parsed: AddressAttr = raw.try_into().unwrap();
    assert_eq!(parsed.attr_type, ATTR_MAPPED_ADDRESS);
    assert_eq!(parsed.address, addr);
}

#[test]
fn test_address_attr_round_trip_v6() {
    let addr: SocketAddr = "[2001:db8::1]:1919".parse().unwrap();
    let raw: RawAttr = AddressAttr::new(ATTR_OTHER_ADDRESS, addr).into();
    assert_eq!(raw.attr_len, 20);

    let parsed: AddressAttr = raw.try_into().unwrap();
    assert_eq!(parsed.address, addr);
}

#[test]
fn test_address_attr_rejects_bad_family() {
    let mut buf = BytesMut::new();
    buf.put_u8(0);
    buf.put_u8(0x09);
    buf.put_u16(1234);
    buf.put_slice(&[1, 2, 3, 4]);
    let raw = RawAttr::new(ATTR_MAPPED_ADDRESS, buf.freeze());

    let parsed: Result<AddressAttr, _> = raw.try_into();
    assert!(parsed.is_err());
}

#[test]
fn test_address_attr_rejects_wrong_size() {
    // family says ipv4 but carries 16 address bytes
    let mut buf = BytesMut::new();
    buf.put_u8(0);
    buf.put_u8(ATTR_FAMILY_IPV4);
    buf.put_u16(1234);
    buf.put_slice(&[0u8; 16]);
    let raw = RawAttr::new(ATTR_MAPPED_ADDRESS, buf.freeze());

    let parsed: Result<AddressAttr, _> = raw.try_into();
    assert!(parsed.is_err());
}

#[test]
fn test_xor_address_round_trip_v4() {
    let trans_id = util::new_trans_id();
    let addr: SocketAddr = "203.0.113.9:32853".parse().unwrap();

    let raw: RawAttr = XorMappedAddress::new(trans_id, addr).into();
    // on the wire the bytes must differ from the plain encoding
    let plain: RawAttr = AddressAttr::new(ATTR_XOR_MAPPED_ADDRESS, addr).into();
    assert_ne!(raw.value, plain.value);

    let parsed = XorMappedAddress::from_base_attr(raw, &trans_id).unwrap();
    assert_eq!(parsed.address, addr);
}

#[test]
fn test_xor_address_round_trip_v6() {
    let trans_id = util::new_trans_id();
    let addr: SocketAddr = "[2001:db8::a:b:c:d]:8080".parse().unwrap();

    let raw: RawAttr = XorMappedAddress::new(trans_id, addr).into();
    let parsed = XorMappedAddress::from_base_attr(raw, &trans_id).unwrap();
    assert_eq!(parsed.address, addr);
}

#[test]
fn test_xor_port_uses_cookie_prefix() {
    let addr: SocketAddr = "0.0.0.0:0".parse().unwrap();
    let xored = util::xor_address(addr, &[0u8; TRANS_ID_LEN]);
    assert_eq!(xored.port(), 0x2112);
}

#[test]
fn test_change_request_all_zero() {
    let raw: RawAttr = ChangeRequest::new(false, false).into();
    assert_eq!(&raw.value[..], &[0, 0, 0, 0]);
}

#[test]
fn test_change_request_bits() {
    let raw: RawAttr = ChangeRequest::new(true, true).into();
    assert_eq!(&raw.value[..], &[0, 0, 0, 0x06]);

    let parsed: ChangeRequest = raw.try_into().unwrap();
    assert!(parsed.change_ip);
    assert!(parsed.change_port);

    let raw: RawAttr = ChangeRequest::new(false, true).into();
    let parsed: ChangeRequest = raw.try_into().unwrap();
    assert!(!parsed.change_ip);
    assert!(parsed.change_port);
}

#[test]
fn test_errcode_round_trip() {
    let raw: RawAttr = ErrcodeAttr::new(420, "unknown attribute").into();
    let parsed: ErrcodeAttr = raw.try_into().unwrap();
    assert_eq!(parsed.code, 420);
    assert_eq!(parsed.msg, "unknown attribute");
}

#[test]
fn test_errcode_number_capped() {
    // number byte above 99 is capped on read
    let mut buf = BytesMut::new();
    buf.put_u16(0);
    buf.put_u8(0x04);
    buf.put_u8(200);
    let raw = RawAttr::new(ATTR_ERROR_CODE, buf.freeze());

    let parsed: ErrcodeAttr = raw.try_into().unwrap();
    assert_eq!(parsed.code, 499);
}

#[test]
fn test_errcode_reason_truncated_at_cap() {
    let long = "a".repeat(800);
    let raw: RawAttr = ErrcodeAttr::new(431, &long).into();
    assert_eq!(raw.value.len(), 4 + ERROR_REASON_MAX_LEN);
}

#[test]
fn test_errcode_reason_truncated_on_char_boundary() {
    // 761 ascii bytes plus a two-byte char straddling the 762-byte cap
    let mut msg = "a".repeat(761);
    msg.push('é');
    let raw: RawAttr = ErrcodeAttr::new(431, &msg).into();
    assert_eq!(raw.value.len(), 4 + 761);

    let parsed: ErrcodeAttr = raw.try_into().unwrap();
    assert_eq!(parsed.msg, "a".repeat(761));
}

#[test]
fn test_unknown_attrs_round_trip() {
    let raw: RawAttr = UnknownAttrs::new(vec![0x0006, 0x0007, 0x8028]).into();
    let parsed: UnknownAttrs = raw.try_into().unwrap();
    assert_eq!(parsed.types, vec![0x0006, 0x0007, 0x8028]);
}

#[test]
fn test_unrecognized_attr_kept_raw() {
    let trans_id = util::new_trans_id();
    let header = Header::new(MESSAGE_TYPE_BIND_RES, 0, trans_id);
    let mut packet = Packet::new(header, vec![]);
    packet.add_attr(RawAttr::new(0x7777, bytes::Bytes::from_static(&[9, 9, 9, 9])));

    let parsed = Packet::unpack(packet.pack()).unwrap();
    assert_eq!(parsed.attrs.len(), 1);
    assert_eq!(parsed.attrs[0].attr_type, 0x7777);
    assert_eq!(&parsed.attrs[0].value[..], &[9, 9, 9, 9]);
}

#[test]
fn test_packet_round_trip() {
    let trans_id = util::new_trans_id();
    let header = Header::new(MESSAGE_TYPE_BIND_RES, 0, trans_id);

    let mapped_addr: SocketAddr = "10.20.30.40:1234".parse().unwrap();
    let other_addr: SocketAddr = "10.20.30.41:1235".parse().unwrap();

    let mut attr_list: Vec<RawAttr> = Vec::new();
    attr_list.push(AddressAttr::new(ATTR_MAPPED_ADDRESS, mapped_addr).into());
    attr_list.push(AddressAttr::new(ATTR_OTHER_ADDRESS, other_addr).into());
    attr_list.push(XorMappedAddress::new(trans_id, mapped_addr).into());

    let packet = Packet::new(header, attr_list);
    let buf = packet.pack();

    let parsed = Packet::unpack(buf).unwrap();
    assert_eq!(parsed.header.msg_type, MESSAGE_TYPE_BIND_RES);
    assert_eq!(parsed.header.magic_cookie, MAGIC_COOKIE);
    assert_eq!(parsed.header.trans_id, trans_id);
    assert_eq!(parsed.attrs.len(), 3);
    assert_eq!(parsed.mapped_address(), Some(mapped_addr));
    assert_eq!(parsed.other_address(), Some(other_addr));
    assert_eq!(parsed.xor_mapped_address(), Some(mapped_addr));
}

#[test]
fn test_packet_padding_alignment() {
    let trans_id = util::new_trans_id();
    let header = Header::new(MESSAGE_TYPE_BIND_ERR_RES, 0, trans_id);
    // 4 + 6 value bytes, so 2 padding bytes on the wire
    let packet = Packet::new(header, vec![ErrcodeAttr::new(400, "no").into()]);

    let buf = packet.pack();
    assert_eq!(buf.len() % 4, 0);
    assert_eq!(buf.len(), HEADER_LEN + 4 + 6 + 2);

    let parsed = Packet::unpack(buf).unwrap();
    let err = parsed.error_code().unwrap();
    assert_eq!(err.code, 400);
    assert_eq!(err.msg, "no");
}

#[test]
fn test_packet_rejects_short_buffer() {
    let buf = bytes::Bytes::from_static(&[0u8; 12]);
    assert!(Packet::unpack(buf).is_err());
}

#[test]
fn test_packet_rejects_unknown_message_type() {
    let trans_id = util::new_trans_id();
    let header = Header::new(MESSAGE_TYPE_BIND_REQ, 0, trans_id);
    let packet = Packet::new(header, vec![]);
    let buf = packet.pack();

    let mut bad = BytesMut::from(&buf[..]);
    bad[0] = 0x3F;
    bad[1] = 0xFF;
    assert!(Packet::unpack(bad.freeze()).is_err());
}

#[test]
fn test_packet_rejects_length_mismatch() {
    let trans_id = util::new_trans_id();
    let header = Header::new(MESSAGE_TYPE_BIND_REQ, 0, trans_id);
    let packet = Packet::new(header, vec![ChangeRequest::new(true, true).into()]);
    let buf = packet.pack();

    let mut bad = BytesMut::from(&buf[..]);
    bad[3] = 0xFF;
    assert!(Packet::unpack(bad.freeze()).is_err());
}

#[test]
fn test_partial_parse_keeps_leading_attrs() {
    let trans_id = util::new_trans_id();
    let header = Header::new(MESSAGE_TYPE_BIND_RES, 0, trans_id);
    let mapped_addr: SocketAddr = "10.20.30.40:1234".parse().unwrap();
    let packet = Packet::new(
        header,
        vec![AddressAttr::new(ATTR_MAPPED_ADDRESS, mapped_addr).into()],
    );
    let buf = packet.pack();

    // append an attribute whose declared length overruns the buffer
    let mut bad = BytesMut::from(&buf[..]);
    bad.put_u16(0x7788);
    bad.put_u16(0xFFFF);
    let new_len = (bad.len() - HEADER_LEN) as u16;
    bad[2..4].copy_from_slice(&new_len.to_be_bytes());

    let parsed = Packet::unpack(bad.freeze()).unwrap();
    assert_eq!(parsed.attrs.len(), 1);
    assert_eq!(parsed.mapped_address(), Some(mapped_addr));
}

#[test]
fn test_transaction_matching() {
    let trans_id = util::new_trans_id();
    let a = Packet::binding_request(trans_id, None);
    let b = Packet::new(Header::new(MESSAGE_TYPE_BIND_RES, 0, trans_id), vec![]);
    assert!(a.is_same_transaction(&b));

    let c = Packet::binding_request(util::new_trans_id(), None);
    assert!(!a.is_same_transaction(&c));

    // same trans_id but a foreign cookie is a different transaction
    let mut d = Packet::new(Header::new(MESSAGE_TYPE_BIND_RES, 0, trans_id), vec![]);
    d.header.magic_cookie = [1, 2, 3, 4];
    assert!(!a.is_same_transaction(&d));
}

#[test]
fn test_binding_request_with_change() {
    let request = Packet::binding_request(util::new_trans_id(), Some((true, false)));
    assert_eq!(request.attrs.len(), 1);
    assert_eq!(request.attrs[0].attr_type, ATTR_CHANGE_REQUEST);

    let parsed: ChangeRequest = request.attrs[0].clone().try_into().unwrap();
    assert!(parsed.change_ip);
    assert!(!parsed.change_port);
}
