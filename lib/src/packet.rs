use crate::attrs;
use crate::attrs::address_attr::AddressAttr;
use crate::attrs::change_request::ChangeRequest;
use crate::attrs::errcode_attr::ErrcodeAttr;
use crate::attrs::xor_address::XorMappedAddress;
use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::{AttrValidator, ParsePacketErr, ValidateErr};
use crate::header::{Header, TransId};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt::Debug;
use std::net::SocketAddr;

// whole-message codec
// - message type must be a recognized value
// - declared length must agree with the buffer
// - a trailing attribute that overruns the buffer is dropped,
//   everything parsed before it is kept

#[derive(Debug, Clone)]
pub struct Packet {
    pub header: Header,
    pub attrs: Vec<RawAttr>,
}

impl Packet {
    pub fn new(header: Header, attrs: Vec<RawAttr>) -> Self {
        let mut packet = Self { header, attrs };
        packet.update_header_len();
        packet
    }

    // plain binding request, optionally with change-request
    pub fn binding_request(trans_id: TransId, change: Option<(bool, bool)>) -> Self {
        let header = Header::new(MESSAGE_TYPE_BIND_REQ, 0, trans_id);
        let mut request = Packet::new(header, vec![]);

        if let Some((change_ip, change_port)) = change {
            let attr = ChangeRequest::new(change_ip, change_port);
            request.add_attr(attr.into());
        }

        request
    }

    fn update_header_len(&mut self) {
        let total = self.attrs.iter().fold(0_usize, |acc, x| acc + x.len());
        self.header.msg_len = total as u16;
    }

    pub fn add_attr(&mut self, attr: RawAttr) {
        self.attrs.push(attr);
        self.update_header_len();
    }

    pub fn add_attrs(&mut self, mut attrs: Vec<RawAttr>) {
        self.attrs.append(&mut attrs);
        self.update_header_len();
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_slice(&self.header.pack());
        for v in self.attrs.iter() {
            buf.put_slice(&v.pack());
        }

        buf.freeze()
    }

    pub fn unpack(mut buf_bytes: Bytes) -> Result<Self, ParsePacketErr> {
        if buf_bytes.len() < HEADER_LEN {
            return Err(ParsePacketErr::BufSize(format!(
                "header buf len:{} < {}",
                buf_bytes.len(),
                HEADER_LEN
            )));
        }

        let header_buf = buf_bytes.split_to(HEADER_LEN);
        let header = Header::unpack(header_buf)?;

        if let Some(e) = header.validate() {
            return Err(ParsePacketErr::BadValue(e.0));
        }

        if header.msg_len as usize != buf_bytes.len() {
            return Err(ParsePacketErr::NotMatch(format!(
                "header len:{} != {}",
                header.msg_len,
                buf_bytes.len()
            )));
        }

        let mut attr_list = vec![];

        let mut max_attr = 32_usize;

        while buf_bytes.len() >= 4 {
            if max_attr == 0 {
                break;
            }

            let attr_len = u16::from_be_bytes([buf_bytes[2], buf_bytes[3]]) as usize;

            // a lying trailing attribute stops the loop, prior attrs stay
            if buf_bytes.len() < attr_len + 4 {
                break;
            }

            let attr_buf = buf_bytes.split_to(attr_len + 4);
            let attr = RawAttr::unpack(attr_buf)?;
            attr_list.push(attr);

            // skip padding, filler bytes are arbitrary
            let pad = match attr_len % 4 {
                0 => 0,
                v => 4 - v,
            };
            if buf_bytes.len() < pad {
                break;
            }
            let _ = buf_bytes.split_to(pad);

            max_attr -= 1;
        }

        Ok(Self { header, attrs: attr_list })
    }

    pub fn is_same_transaction(&self, other: &Packet) -> bool {
        self.header.is_same_transaction(&other.header)
    }

    pub fn validate(&self) -> Option<ValidateErr> {
        if let Some(v) = self.header.validate() {
            return Some(v);
        }

        for v in self.attrs.iter() {
            if v.attr_type == ATTR_ERROR_CODE {
                if let Some(e) = validate_attr::<ErrcodeAttr>(v) {
                    return Some(e);
                }
            }
        }

        None
    }

    // ---- attribute lookup ----

    pub fn address_attr(&self, attr_type: u16) -> Option<SocketAddr> {
        for attr in self.attrs.iter() {
            if attr.attr_type == attr_type {
                let address_attr: Result<AddressAttr, _> = attr.clone().try_into();
                return address_attr.ok().map(|v| v.address);
            }
        }
        None
    }

    pub fn mapped_address(&self) -> Option<SocketAddr> {
        self.address_attr(ATTR_MAPPED_ADDRESS)
    }

    pub fn changed_address(&self) -> Option<SocketAddr> {
        self.address_attr(ATTR_CHANGED_ADDRESS)
    }

    pub fn other_address(&self) -> Option<SocketAddr> {
        self.address_attr(ATTR_OTHER_ADDRESS)
    }

    pub fn xor_mapped_address(&self) -> Option<SocketAddr> {
        for attr in self.attrs.iter() {
            if attr.attr_type == ATTR_XOR_MAPPED_ADDRESS {
                let xor = XorMappedAddress::from_base_attr(attr.clone(), &self.header.trans_id);
                return xor.ok().map(|v| v.address);
            }
        }
        None
    }

    pub fn error_code(&self) -> Option<ErrcodeAttr> {
        for attr in self.attrs.iter() {
            if attr.attr_type == ATTR_ERROR_CODE {
                let err: Result<ErrcodeAttr, _> = attr.clone().try_into();
                return err.ok();
            }
        }
        None
    }
}

fn validate_attr<T>(raw_attr: &RawAttr) -> Option<ValidateErr>
where
    T: AttrValidator + TryFrom<RawAttr>,
    <T as std::convert::TryFrom<attrs::RawAttr>>::Error: Debug,
{
    let attr: Result<T, _> = raw_attr.clone().try_into();
    match attr {
        Ok(v) => v.validate(),
        Err(e) => Some(ValidateErr(format!("{:?}", e))),
    }
}
