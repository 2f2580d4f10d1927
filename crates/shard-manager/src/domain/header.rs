//! Collation header and its wire encoding.
//!
//! Wire format is an RLP list, in order:
//!
//! ```text
//! [shard_id, period_number, period_start_prevhash, parent_header_hash,
//!  tx_list_root, coinbase, post_state_root, receipt_root, height, signature]
//! ```
//!
//! Integers are minimal big-endian, hashes are 32-byte strings, the coinbase
//! is a 20-byte string. The signing hash covers the first nine fields; the
//! header's identity is the keccak256 of the full encoding with the
//! signature's `v` written as 27 or 28.

use super::errors::{Address, Hash, ManagerError, ShardId};
use super::invariants::{keccak256, SIGNATURE_LENGTH};
use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Serialize};

/// Number of fields in a signed header.
pub const HEADER_FIELD_COUNT: usize = 10;

/// Collation header submitted to a shard chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollationHeader {
    /// Shard the collation belongs to.
    pub shard_id: ShardId,
    /// Period the header was built for.
    pub period_number: u64,
    /// Hash of the last block before the period started.
    pub period_start_prevhash: Hash,
    /// Parent header on the same shard ([`GENESIS_HASH`](super::GENESIS_HASH) for the first).
    pub parent_header_hash: Hash,
    /// Root of the collation's transaction list.
    pub tx_list_root: Hash,
    /// Fee recipient.
    pub coinbase: Address,
    /// Shard state root after the collation.
    pub post_state_root: Hash,
    /// Root of the collation's receipts.
    pub receipt_root: Hash,
    /// Parent height + 1.
    pub height: u64,
    /// `r || s || v` over [`CollationHeader::signing_hash`].
    pub signature: Vec<u8>,
}

impl CollationHeader {
    /// Encode all ten fields.
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(HEADER_FIELD_COUNT);
        self.append_unsigned_fields(&mut stream);
        stream.append(&self.signature);
        stream.out().to_vec()
    }

    /// Encode the nine fields covered by the signature.
    pub fn encode_unsigned(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(HEADER_FIELD_COUNT - 1);
        self.append_unsigned_fields(&mut stream);
        stream.out().to_vec()
    }

    /// Hash the proposer signs.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.encode_unsigned())
    }

    /// Identity hash of this header's canonical encoding.
    ///
    /// A raw recovery id (`v` of 0 or 1) is hashed as 27 or 28, so both
    /// spellings of one signature name the same header.
    pub fn hash(&self) -> Hash {
        match self.signature.len() {
            SIGNATURE_LENGTH if self.signature[SIGNATURE_LENGTH - 1] < 2 => {
                let mut canonical = self.clone();
                canonical.signature[SIGNATURE_LENGTH - 1] += 27;
                keccak256(&canonical.encode())
            }
            _ => keccak256(&self.encode()),
        }
    }

    /// Decode a header from wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ManagerError> {
        let rlp = Rlp::new(bytes);
        if !rlp.is_list() {
            return Err(ManagerError::MalformedHeader("not an RLP list".to_string()));
        }

        let info = rlp.payload_info().map_err(malformed)?;
        if info.header_len + info.value_len != bytes.len() {
            return Err(ManagerError::MalformedHeader(format!(
                "{} trailing bytes",
                bytes.len().saturating_sub(info.header_len + info.value_len)
            )));
        }

        let count = rlp.item_count().map_err(malformed)?;
        if count != HEADER_FIELD_COUNT {
            return Err(ManagerError::MalformedHeader(format!(
                "expected {} fields, got {}",
                HEADER_FIELD_COUNT, count
            )));
        }

        Ok(Self {
            shard_id: rlp.val_at(0).map_err(malformed)?,
            period_number: rlp.val_at(1).map_err(malformed)?,
            period_start_prevhash: fixed_at(&rlp, 2)?,
            parent_header_hash: fixed_at(&rlp, 3)?,
            tx_list_root: fixed_at(&rlp, 4)?,
            coinbase: fixed_at(&rlp, 5)?,
            post_state_root: fixed_at(&rlp, 6)?,
            receipt_root: fixed_at(&rlp, 7)?,
            height: rlp.val_at(8).map_err(malformed)?,
            signature: rlp.val_at(9).map_err(malformed)?,
        })
    }

    fn append_unsigned_fields(&self, stream: &mut RlpStream) {
        stream.append(&self.shard_id);
        stream.append(&self.period_number);
        stream.append(&self.period_start_prevhash.to_vec());
        stream.append(&self.parent_header_hash.to_vec());
        stream.append(&self.tx_list_root.to_vec());
        stream.append(&self.coinbase.to_vec());
        stream.append(&self.post_state_root.to_vec());
        stream.append(&self.receipt_root.to_vec());
        stream.append(&self.height);
    }
}

fn malformed(err: rlp::DecoderError) -> ManagerError {
    ManagerError::MalformedHeader(format!("{:?}", err))
}

/// Decode a fixed-width byte string field.
fn fixed_at<const N: usize>(rlp: &Rlp<'_>, index: usize) -> Result<[u8; N], ManagerError> {
    let bytes: Vec<u8> = rlp.val_at(index).map_err(malformed)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        ManagerError::MalformedHeader(format!("field {} has {} bytes, expected {}", index, len, N))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> CollationHeader {
        CollationHeader {
            shard_id: 3,
            period_number: 12,
            period_start_prevhash: [1u8; 32],
            parent_header_hash: [0u8; 32],
            tx_list_root: [2u8; 32],
            coinbase: [3u8; 20],
            post_state_root: [4u8; 32],
            receipt_root: [5u8; 32],
            height: 1,
            signature: vec![7u8; 65],
        }
    }

    #[test]
    fn test_decode_inverts_encode() {
        let header = sample_header();
        let decoded = CollationHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_zero_integers_encode_as_empty_string() {
        let header = CollationHeader {
            shard_id: 0,
            period_number: 0,
            height: 0,
            ..sample_header()
        };
        let encoded = header.encode_unsigned();
        let rlp = Rlp::new(&encoded);
        assert_eq!(rlp.at(0).unwrap().as_raw(), &[0x80]);
        assert_eq!(rlp.at(1).unwrap().as_raw(), &[0x80]);
        assert_eq!(CollationHeader::decode(&header.encode()).unwrap(), header);
    }

    #[test]
    fn test_signing_hash_ignores_signature() {
        let a = sample_header();
        let b = CollationHeader {
            signature: vec![9u8; 65],
            ..sample_header()
        };
        assert_eq!(a.signing_hash(), b.signing_hash());
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_is_independent_of_v_spelling() {
        let mut signature = vec![7u8; 65];
        signature[64] = 28;
        let header = CollationHeader {
            signature,
            ..sample_header()
        };
        assert_eq!(header.hash(), keccak256(&header.encode()));

        let mut raw_v = header.clone();
        raw_v.signature[64] = 1;
        assert_eq!(raw_v.hash(), header.hash());

        let mut other_v = header.clone();
        other_v.signature[64] = 27;
        assert_ne!(other_v.hash(), header.hash());
    }

    #[test]
    fn test_signing_hash_covers_fields() {
        let a = sample_header();
        let b = CollationHeader {
            height: 2,
            ..sample_header()
        };
        assert_ne!(a.signing_hash(), b.signing_hash());
    }

    #[test]
    fn test_decode_rejects_non_list() {
        let mut stream = RlpStream::new();
        stream.append(&vec![1u8, 2, 3]);
        let err = CollationHeader::decode(&stream.out()).unwrap_err();
        assert!(matches!(err, ManagerError::MalformedHeader(_)));
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        let header = sample_header();
        // Unsigned encoding has only nine fields
        let err = CollationHeader::decode(&header.encode_unsigned()).unwrap_err();
        assert!(err.to_string().contains("expected 10 fields"));
    }

    #[test]
    fn test_decode_rejects_short_hash_field() {
        let mut stream = RlpStream::new_list(HEADER_FIELD_COUNT);
        stream.append(&1u16);
        stream.append(&1u64);
        stream.append(&vec![1u8; 31]); // one byte short
        stream.append(&vec![0u8; 32]);
        stream.append(&vec![0u8; 32]);
        stream.append(&vec![0u8; 20]);
        stream.append(&vec![0u8; 32]);
        stream.append(&vec![0u8; 32]);
        stream.append(&1u64);
        stream.append(&vec![0u8; 65]);
        let err = CollationHeader::decode(&stream.out()).unwrap_err();
        assert!(err.to_string().contains("field 2"));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut bytes = sample_header().encode();
        bytes.push(0x00);
        assert!(CollationHeader::decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(CollationHeader::decode(&[]).is_err());
        assert!(CollationHeader::decode(&[0xff, 0x01]).is_err());
    }
}
