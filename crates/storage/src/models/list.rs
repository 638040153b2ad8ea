//! Small list values used by the per-height rollback indexes.

use super::codec::{Reader, put_u32, put_u64};
use reth_codecs::Compact;
use serde::{Deserialize, Serialize};

/// A list of internal ids, stored per height so rollback can find every
/// entity a block created without scanning the main tables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct U64List(pub Vec<u64>);

impl Compact for U64List {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        let mut len = put_u32(buf, self.0.len() as u32);
        for v in &self.0 {
            len += put_u64(buf, *v);
        }
        len
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let count = reader.u32() as usize;
        let values = (0..count).map(|_| reader.u64()).collect();
        (Self(values), reader.rest())
    }
}

/// A list of id pairs, used to index rollup/account join rows by height.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdPairList(pub Vec<(u64, u64)>);

impl Compact for IdPairList {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        let mut len = put_u32(buf, self.0.len() as u32);
        for (a, b) in &self.0 {
            len += put_u64(buf, *a);
            len += put_u64(buf, *b);
        }
        len
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let count = reader.u32() as usize;
        let values = (0..count).map(|_| (reader.u64(), reader.u64())).collect();
        (Self(values), reader.rest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_list_compact_roundtrip() {
        let list = U64List(vec![1, 7, u64::MAX]);
        let mut buf = Vec::new();
        let written = list.to_compact(&mut buf);
        assert_eq!(written, buf.len());
        let (decoded, rest) = U64List::from_compact(&buf, written);
        assert_eq!(decoded, list);
        assert!(rest.is_empty());
    }

    #[test]
    fn id_pair_list_compact_roundtrip() {
        let list = IdPairList(vec![(1, 2), (3, 4)]);
        let mut buf = Vec::new();
        let written = list.to_compact(&mut buf);
        let (decoded, rest) = IdPairList::from_compact(&buf, written);
        assert_eq!(decoded, list);
        assert!(rest.is_empty());
    }
}
