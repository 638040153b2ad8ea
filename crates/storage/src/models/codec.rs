//! Byte-level helpers shared by the hand-written `Compact` implementations.
//!
//! Fixed-width fields are encoded big-endian; variable-length fields carry a
//! `u32` length prefix. Decoding panics on truncated input, matching how the
//! compact codec treats corrupted table bytes elsewhere.

use alloy_primitives::{Address, B256};
use bytes::BufMut;

pub(crate) fn put_u8<B: BufMut>(buf: &mut B, v: u8) -> usize {
    buf.put_u8(v);
    1
}

pub(crate) fn put_u32<B: BufMut>(buf: &mut B, v: u32) -> usize {
    buf.put_u32(v);
    4
}

pub(crate) fn put_u64<B: BufMut>(buf: &mut B, v: u64) -> usize {
    buf.put_u64(v);
    8
}

pub(crate) fn put_u128<B: BufMut>(buf: &mut B, v: u128) -> usize {
    buf.put_u128(v);
    16
}

pub(crate) fn put_i128<B: BufMut>(buf: &mut B, v: i128) -> usize {
    buf.put_slice(&v.to_be_bytes());
    16
}

pub(crate) fn put_bool<B: BufMut>(buf: &mut B, v: bool) -> usize {
    put_u8(buf, v as u8)
}

pub(crate) fn put_b256<B: BufMut>(buf: &mut B, v: &B256) -> usize {
    buf.put_slice(v.as_slice());
    32
}

pub(crate) fn put_address<B: BufMut>(buf: &mut B, v: &Address) -> usize {
    buf.put_slice(v.as_slice());
    20
}

pub(crate) fn put_str<B: BufMut>(buf: &mut B, v: &str) -> usize {
    put_u32(buf, v.len() as u32);
    buf.put_slice(v.as_bytes());
    4 + v.len()
}

pub(crate) fn put_opt_u64<B: BufMut>(buf: &mut B, v: Option<u64>) -> usize {
    match v {
        Some(v) => put_u8(buf, 1) + put_u64(buf, v),
        None => put_u8(buf, 0),
    }
}

pub(crate) fn put_opt_b256<B: BufMut>(buf: &mut B, v: &Option<B256>) -> usize {
    match v {
        Some(v) => put_u8(buf, 1) + put_b256(buf, v),
        None => put_u8(buf, 0),
    }
}

/// Sequential reader over a compact-encoded value.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        head
    }

    pub(crate) fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_be_bytes(self.take(4).try_into().expect("4 bytes"))
    }

    pub(crate) fn u64(&mut self) -> u64 {
        u64::from_be_bytes(self.take(8).try_into().expect("8 bytes"))
    }

    pub(crate) fn u128(&mut self) -> u128 {
        u128::from_be_bytes(self.take(16).try_into().expect("16 bytes"))
    }

    pub(crate) fn i128(&mut self) -> i128 {
        i128::from_be_bytes(self.take(16).try_into().expect("16 bytes"))
    }

    pub(crate) fn bool(&mut self) -> bool {
        self.u8() != 0
    }

    pub(crate) fn b256(&mut self) -> B256 {
        B256::from_slice(self.take(32))
    }

    pub(crate) fn address(&mut self) -> Address {
        Address::from_slice(self.take(20))
    }

    pub(crate) fn string(&mut self) -> String {
        let len = self.u32() as usize;
        String::from_utf8(self.take(len).to_vec()).expect("valid utf8")
    }

    pub(crate) fn opt_u64(&mut self) -> Option<u64> {
        (self.u8() != 0).then(|| self.u64())
    }

    pub(crate) fn opt_b256(&mut self) -> Option<B256> {
        (self.u8() != 0).then(|| self.b256())
    }

    pub(crate) const fn rest(self) -> &'a [u8] {
        self.buf
    }
}
