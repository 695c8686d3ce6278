use crate::attrs::RawAttr;
use crate::constants::ATTR_UNKNOWN_ATTRIBUTE;
use crate::error::ParsePacketErr;
use bytes::{BufMut, BytesMut};

// unknown-attribute: a list of 16-bit registry codes

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttrs {
    pub types: Vec<u16>,
}

impl UnknownAttrs {
    pub fn new(types: Vec<u16>) -> Self {
        Self { types }
    }
}

impl From<UnknownAttrs> for RawAttr {
    fn from(attr: UnknownAttrs) -> Self {
        let mut bytes_buf = BytesMut::with_capacity(attr.types.len() * 2);
        for v in attr.types.iter() {
            bytes_buf.put_u16(*v);
        }

        let value = bytes_buf.freeze();
        RawAttr::new(ATTR_UNKNOWN_ATTRIBUTE, value)
    }
}

impl TryFrom<RawAttr> for UnknownAttrs {
    type Error = ParsePacketErr;

    fn try_from(base_attr: RawAttr) -> Result<Self, Self::Error> {
        if base_attr.value.len() % 2 != 0 {
            return Err(ParsePacketErr::BufSize(format!(
                "unknown_attrs attr len:{} odd",
                base_attr.value.len()
            )));
        }

        let types = base_attr
            .value
            .chunks_exact(2)
            .map(|v| u16::from_be_bytes([v[0], v[1]]))
            .collect();

        Ok(Self { types })
    }
}
