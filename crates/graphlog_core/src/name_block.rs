//! Packing token names into chained dynamic blocks.
//!
//! Token names (labels, property keys, relationship types) live in a dynamic
//! chain of fixed-capacity blocks. The block ids are allocated by the caller
//! before the name is encoded, and the allocation must match the encoded
//! length exactly: `blocks * capacity` must cover the name, and the name must
//! not fit in one block fewer. A mismatch is an allocator bug, reported as a
//! construction error and never retried.

use crate::error::{CoreError, CoreResult};
use crate::record::{DynamicRecord, StoreRecord, TokenRecord, NULL_REFERENCE};

/// Capacity in bytes of one token name block.
pub const NAME_STORE_BLOCK_SIZE: usize = 30;

/// Number of blocks needed to hold `len` bytes at `block_size` bytes each.
#[must_use]
pub const fn blocks_needed(len: usize, block_size: usize) -> usize {
    len.div_ceil(block_size)
}

/// Splits names into name-store blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameBlockEncoder {
    block_size: usize,
}

impl NameBlockEncoder {
    /// An encoder for the name store's block size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            block_size: NAME_STORE_BLOCK_SIZE,
        }
    }

    /// An encoder for blocks of `block_size` bytes (at least one).
    #[must_use]
    pub const fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size: if block_size == 0 { 1 } else { block_size },
        }
    }

    /// Capacity of one block.
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Encodes `name` into one block per id in `dynamic_ids`.
    ///
    /// Every block is in use and created; blocks are linked in id order and
    /// only the first is a chain start.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NoNameBlocks`] if `dynamic_ids` is empty
    /// - [`CoreError::NameTooLong`] if the name overflows the blocks
    /// - [`CoreError::NameTooShort`] if the name fits in one block fewer
    /// - [`CoreError::BlockIdOutOfRange`] if a linked id does not fit an `i64`
    pub fn encode(&self, name: &str, dynamic_ids: &[u64]) -> CoreResult<Vec<DynamicRecord>> {
        if dynamic_ids.is_empty() {
            return Err(CoreError::NoNameBlocks);
        }

        let data = name.as_bytes();
        let blocks = dynamic_ids.len();
        // A product past usize::MAX covers any name.
        if blocks
            .checked_mul(self.block_size)
            .is_some_and(|capacity| data.len() > capacity)
        {
            return Err(CoreError::NameTooLong {
                name: name.to_owned(),
                blocks,
            });
        }
        if (blocks - 1)
            .checked_mul(self.block_size)
            .is_none_or(|capacity| data.len() <= capacity)
        {
            return Err(CoreError::NameTooShort {
                name: name.to_owned(),
                blocks,
            });
        }

        data.chunks(self.block_size)
            .zip(dynamic_ids)
            .enumerate()
            .map(|(index, (part, &id))| {
                let mut record = DynamicRecord::with_data(id, part);
                record.set_created();
                record.start_record = index == 0;
                record.next_block = match dynamic_ids.get(index + 1) {
                    Some(&next) => pointer(next)?,
                    None => NULL_REFERENCE,
                };
                Ok(record)
            })
            .collect()
    }

    /// Encodes `name` into `record`'s name chain and marks the token in use.
    ///
    /// The token's name pointer becomes the first block id.
    ///
    /// # Errors
    ///
    /// Fails as [`encode`](Self::encode) does, and with
    /// [`CoreError::BlockIdOutOfRange`] if the first id does not fit an `i64`.
    pub fn attach<T: AsMut<TokenRecord>>(
        &self,
        mut record: T,
        dynamic_ids: &[u64],
        name: &str,
    ) -> CoreResult<T> {
        let blocks = self.encode(name, dynamic_ids)?;
        let name_id = pointer(dynamic_ids[0])?;
        let token = record.as_mut();
        token.in_use = true;
        token.name_id = name_id;
        token.name_records.extend(blocks);
        Ok(record)
    }

    /// Reassembles a name from its chain.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LogCorruption`] if the bytes are not UTF-8.
    pub fn decode(blocks: &[DynamicRecord]) -> CoreResult<String> {
        let bytes: Vec<u8> = blocks.iter().flat_map(|b| b.data.iter().copied()).collect();
        String::from_utf8(bytes)
            .map_err(|err| CoreError::log_corruption(format!("token name is not UTF-8: {err}")))
    }
}

fn pointer(id: u64) -> CoreResult<i64> {
    i64::try_from(id).map_err(|_| CoreError::BlockIdOutOfRange { id })
}

impl Default for NameBlockEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PropertyKeyTokenRecord;
    use proptest::prelude::*;

    #[test]
    fn short_name_fits_one_block() {
        let encoder = NameBlockEncoder::with_block_size(4);
        let blocks = encoder.encode("age", &[11]).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data, b"age");
        assert!(blocks[0].in_use && blocks[0].created && blocks[0].start_record);
        assert_eq!(blocks[0].next_block, NULL_REFERENCE);
    }

    #[test]
    fn short_name_rejects_extra_block() {
        let encoder = NameBlockEncoder::with_block_size(4);
        let err = encoder.encode("age", &[11, 12]).unwrap_err();
        assert!(matches!(err, CoreError::NameTooShort { blocks: 2, .. }));
    }

    #[test]
    fn empty_id_list_is_rejected() {
        let err = NameBlockEncoder::new().encode("name", &[]).unwrap_err();
        assert!(matches!(err, CoreError::NoNameBlocks));
    }

    #[test]
    fn empty_name_underfills_any_block() {
        let err = NameBlockEncoder::new().encode("", &[1]).unwrap_err();
        assert!(matches!(err, CoreError::NameTooShort { blocks: 1, .. }));
    }

    #[test]
    fn long_name_overflows() {
        let encoder = NameBlockEncoder::with_block_size(4);
        let err = encoder.encode("birthday", &[1]).unwrap_err();
        assert!(matches!(err, CoreError::NameTooLong { blocks: 1, .. }));
    }

    #[test]
    fn blocks_are_chained_in_id_order() {
        let encoder = NameBlockEncoder::with_block_size(4);
        let blocks = encoder.encode("birthday!", &[20, 21, 22]).unwrap();
        let data: Vec<&[u8]> = blocks.iter().map(|b| b.data.as_slice()).collect();
        assert_eq!(data, vec![&b"birt"[..], b"hday", b"!"]);
        assert_eq!(blocks[0].next_block, 21);
        assert_eq!(blocks[1].next_block, 22);
        assert_eq!(blocks[2].next_block, NULL_REFERENCE);
        assert!(!blocks[1].start_record);
    }

    #[test]
    fn multibyte_names_count_bytes() {
        let encoder = NameBlockEncoder::with_block_size(4);
        // "größe" is 7 bytes in UTF-8.
        assert!(encoder.encode("größe", &[1, 2]).is_ok());
        assert!(encoder.encode("größe", &[1]).is_err());
    }

    #[test]
    fn attach_sets_name_pointer() {
        let token = NameBlockEncoder::new()
            .attach(PropertyKeyTokenRecord::new(5), &[40], "since")
            .unwrap();
        assert!(token.in_use());
        assert_eq!(token.token.name_id, 40);
        assert_eq!(token.token.name_bytes(), b"since");
    }

    #[test]
    fn huge_block_size_does_not_overflow_capacity() {
        let encoder = NameBlockEncoder::with_block_size(usize::MAX);
        let err = encoder.encode("x", &[1, 2]).unwrap_err();
        assert!(matches!(err, CoreError::NameTooShort { blocks: 2, .. }));

        let blocks = encoder.encode("x", &[1]).unwrap();
        assert_eq!(blocks[0].data, b"x");
    }

    #[test]
    fn overflowing_capacity_still_checks_lower_bound() {
        let encoder = NameBlockEncoder::with_block_size(usize::MAX / 2 + 1);
        let ids: Vec<u64> = (1..=3).collect();
        assert!(matches!(
            encoder.encode("abc", &ids),
            Err(CoreError::NameTooShort { blocks: 3, .. })
        ));
    }

    #[test]
    fn block_id_past_i64_is_rejected() {
        let encoder = NameBlockEncoder::with_block_size(1);
        let err = encoder.encode("ab", &[1, u64::MAX]).unwrap_err();
        assert!(matches!(err, CoreError::BlockIdOutOfRange { id: u64::MAX }));
        assert!(err.is_construction_error());

        let err = encoder
            .attach(PropertyKeyTokenRecord::new(5), &[u64::MAX], "a")
            .unwrap_err();
        assert!(matches!(err, CoreError::BlockIdOutOfRange { id: u64::MAX }));
    }

    proptest! {
        #[test]
        fn exact_allocation_roundtrips(name in "\\PC{1,120}", block_size in 1usize..40) {
            let encoder = NameBlockEncoder::with_block_size(block_size);
            let needed = blocks_needed(name.len(), block_size);
            let ids: Vec<u64> = (100..100 + needed as u64 + 1).collect();

            let blocks = encoder.encode(&name, &ids[..needed]).unwrap();
            prop_assert_eq!(NameBlockEncoder::decode(&blocks).unwrap(), name.clone());

            prop_assert!(encoder.encode(&name, &ids[..needed + 1]).is_err());
            prop_assert!(encoder.encode(&name, &ids[..needed - 1]).is_err());
        }
    }
}
