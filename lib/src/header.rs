#![allow(clippy::len_without_is_empty)]

use crate::constants::*;
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ParsePacketErr, ValidateErr};
use std::ops::Deref;

pub type TransId = [u8; TRANS_ID_LEN];

// rfc 5389, 6.
// [type:2][length:2][magic cookie:4][trans_id:12]
#[derive(Debug, Clone)]
pub struct Header {
    pub msg_type: u16,

    // attribute bytes only, header not counted
    pub msg_len: u16,

    pub magic_cookie: [u8; 4],

    pub trans_id: TransId,
}

impl Header {
    pub fn new(msg_type: u16, msg_len: u16, trans_id: TransId) -> Self {
        Self {
            msg_type,
            msg_len,
            magic_cookie: MAGIC_COOKIE,
            trans_id,
        }
    }

    pub fn len(&self) -> usize {
        HEADER_LEN
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN);
        buf.put_u16(self.msg_type & MESSAGE_TYPE_MASK);
        buf.put_u16(self.msg_len);
        buf.put_slice(&self.magic_cookie);
        buf.put_slice(&self.trans_id);
        buf.freeze()
    }

    pub fn unpack(buf_bytes: Bytes) -> Result<Self, ParsePacketErr> {
        let buf = buf_bytes.deref();

        if buf.len() < HEADER_LEN {
            return Err(ParsePacketErr::BufSize(format!(
                "header buf len:{} < {}",
                buf.len(),
                HEADER_LEN
            )));
        }

        let mut index = 0_usize;
        let msg_type = u16::from_be_bytes([buf[index], buf[index + 1]]);

        index += 2;
        let msg_len = u16::from_be_bytes([buf[index], buf[index + 1]]);

        index += 2;
        let mut magic_cookie = [0_u8; 4];
        magic_cookie.copy_from_slice(&buf[index..index + 4]);

        index += 4;
        let mut trans_id = [0_u8; TRANS_ID_LEN];
        trans_id.copy_from_slice(&buf[index..index + TRANS_ID_LEN]);

        Ok(Self {
            msg_type,
            msg_len,
            magic_cookie,
            trans_id,
        })
    }

    pub fn validate(&self) -> Option<ValidateErr> {
        if self.msg_type == MESSAGE_TYPE_BIND_REQ
            || self.msg_type == MESSAGE_TYPE_BIND_RES
            || self.msg_type == MESSAGE_TYPE_BIND_ERR_RES
            || self.msg_type == MESSAGE_TYPE_SHARED_SECRET_REQ
            || self.msg_type == MESSAGE_TYPE_SHARED_SECRET_RES
            || self.msg_type == MESSAGE_TYPE_SHARED_SECRET_ERR_RES
        {
            return None;
        }

        let err_msg = format!("not support message type: {}", self.msg_type);
        Some(ValidateErr(err_msg))
    }

    // cookie and trans_id must both match to correlate a reply
    pub fn is_same_transaction(&self, other: &Header) -> bool {
        self.magic_cookie == other.magic_cookie && self.trans_id == other.trans_id
    }
}
