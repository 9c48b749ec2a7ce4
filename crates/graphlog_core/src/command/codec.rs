//! Command payload encoding.
//!
//! ```text
//! | kind (1) | record fields... |
//! ```
//!
//! Integers are little-endian. Every record starts with its id (when it has
//! one) followed by a flags byte. Variable-length parts carry a u32 count or
//! byte length. The payload is self-delimiting; the entry frame around it
//! carries its own length, and a payload that does not fill that length
//! exactly is corruption.

use super::{Command, CommandKind};
use crate::error::{CoreError, CoreResult};
use crate::record::{
    DynamicRecord, NodeRecord, PropertyBlock, PropertyKeyTokenRecord, PropertyOwner,
    PropertyRecord, RelationshipGroupRecord, RelationshipRecord, StoreHeaderRecord, TokenRecord,
};
use bytes::{Buf, BufMut};

const IN_USE: u8 = 0x01;
const CREATED: u8 = 0x02;
const NODE_DENSE: u8 = 0x04;
const REL_FIRST_IN_FIRST_CHAIN: u8 = 0x04;
const REL_FIRST_IN_SECOND_CHAIN: u8 = 0x08;
const DYNAMIC_START_RECORD: u8 = 0x04;

const OWNER_NONE: u8 = 0;
const OWNER_NODE: u8 = 1;
const OWNER_RELATIONSHIP: u8 = 2;

fn flags(in_use: bool, created: bool) -> u8 {
    let mut flags = 0;
    if in_use {
        flags |= IN_USE;
    }
    if created {
        flags |= CREATED;
    }
    flags
}

fn put_len(buf: &mut Vec<u8>, len: usize, what: &str) -> CoreResult<()> {
    let len = u32::try_from(len).map_err(|_| {
        CoreError::invalid_operation(format!("{what} too large: {len} exceeds u32::MAX"))
    })?;
    buf.put_u32_le(len);
    Ok(())
}

impl Command {
    /// Serializes the command payload.
    ///
    /// # Errors
    ///
    /// Fails only if a variable-length part exceeds `u32::MAX` elements.
    pub fn encode_payload(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(64);
        self.write_payload(&mut buf)?;
        Ok(buf)
    }

    /// Appends the command payload to `buf`.
    pub fn write_payload(&self, buf: &mut Vec<u8>) -> CoreResult<()> {
        buf.put_u8(self.kind().as_byte());
        match self {
            Self::Node { before, after } => {
                write_node(buf, before);
                write_node(buf, after);
            }
            Self::Relationship(record) => write_relationship(buf, record),
            Self::RelationshipGroup(record) => write_group(buf, record),
            Self::Property { before, after } => {
                write_property(buf, before)?;
                write_property(buf, after)?;
            }
            Self::LabelToken(record) | Self::RelationshipTypeToken(record) => {
                write_token(buf, record)?;
            }
            Self::PropertyKeyToken(record) => {
                write_token(buf, &record.token)?;
                buf.put_u32_le(record.property_count);
            }
            Self::SchemaRule { before, after } => {
                write_dynamic_list(buf, before)?;
                write_dynamic_list(buf, after)?;
            }
            Self::StoreHeader(record) => {
                buf.put_u8(flags(record.in_use, record.created));
                buf.put_i64_le(record.next_prop);
            }
        }
        Ok(())
    }

    /// Deserializes a payload that holds exactly one command.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownCommandKind`] for an unrecognised kind byte
    /// - [`CoreError::LogCorruption`] for short or trailing data
    pub fn decode_payload(payload: &[u8]) -> CoreResult<Self> {
        let mut reader = PayloadReader::new(payload);
        let command = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(CoreError::log_corruption(format!(
                "trailing bytes in {} command: expected {} bytes, got {}",
                command.kind().name(),
                reader.position(),
                payload.len()
            )));
        }
        Ok(command)
    }

    pub(crate) fn read_from(reader: &mut PayloadReader<'_>) -> CoreResult<Self> {
        let kind_byte = reader.u8("command kind")?;
        let kind = CommandKind::from_byte(kind_byte).ok_or(CoreError::UnknownCommandKind(kind_byte))?;

        let command = match kind {
            CommandKind::Node => Self::Node {
                before: read_node(reader)?,
                after: read_node(reader)?,
            },
            CommandKind::Relationship => Self::Relationship(read_relationship(reader)?),
            CommandKind::RelationshipGroup => Self::RelationshipGroup(read_group(reader)?),
            CommandKind::Property => Self::Property {
                before: read_property(reader)?,
                after: read_property(reader)?,
            },
            CommandKind::LabelToken => Self::LabelToken(read_token(reader)?),
            CommandKind::RelationshipTypeToken => {
                Self::RelationshipTypeToken(read_token(reader)?)
            }
            CommandKind::PropertyKeyToken => {
                let token = read_token(reader)?;
                let property_count = reader.u32("property count")?;
                Self::PropertyKeyToken(PropertyKeyTokenRecord {
                    token,
                    property_count,
                })
            }
            CommandKind::SchemaRule => Self::SchemaRule {
                before: read_dynamic_list(reader)?,
                after: read_dynamic_list(reader)?,
            },
            CommandKind::StoreHeader => {
                let flags = reader.u8("header flags")?;
                Self::StoreHeader(StoreHeaderRecord {
                    in_use: flags & IN_USE != 0,
                    created: flags & CREATED != 0,
                    next_prop: reader.i64("header next_prop")?,
                })
            }
        };
        Ok(command)
    }
}

fn write_node(buf: &mut Vec<u8>, record: &NodeRecord) {
    let mut bits = flags(record.in_use, record.created);
    if record.dense {
        bits |= NODE_DENSE;
    }
    buf.put_u64_le(record.id);
    buf.put_u8(bits);
    buf.put_i64_le(record.next_rel);
    buf.put_i64_le(record.next_prop);
    buf.put_u64_le(record.labels);
}

fn read_node(reader: &mut PayloadReader<'_>) -> CoreResult<NodeRecord> {
    let id = reader.u64("node id")?;
    let bits = reader.u8("node flags")?;
    Ok(NodeRecord {
        id,
        in_use: bits & IN_USE != 0,
        created: bits & CREATED != 0,
        dense: bits & NODE_DENSE != 0,
        next_rel: reader.i64("node next_rel")?,
        next_prop: reader.i64("node next_prop")?,
        labels: reader.u64("node labels")?,
    })
}

fn write_relationship(buf: &mut Vec<u8>, record: &RelationshipRecord) {
    let mut bits = flags(record.in_use, record.created);
    if record.first_in_first_chain {
        bits |= REL_FIRST_IN_FIRST_CHAIN;
    }
    if record.first_in_second_chain {
        bits |= REL_FIRST_IN_SECOND_CHAIN;
    }
    buf.put_u64_le(record.id);
    buf.put_u8(bits);
    buf.put_u64_le(record.first_node);
    buf.put_u64_le(record.second_node);
    buf.put_u32_le(record.rel_type);
    buf.put_i64_le(record.first_prev_rel);
    buf.put_i64_le(record.first_next_rel);
    buf.put_i64_le(record.second_prev_rel);
    buf.put_i64_le(record.second_next_rel);
    buf.put_i64_le(record.next_prop);
}

fn read_relationship(reader: &mut PayloadReader<'_>) -> CoreResult<RelationshipRecord> {
    let id = reader.u64("relationship id")?;
    let bits = reader.u8("relationship flags")?;
    Ok(RelationshipRecord {
        id,
        in_use: bits & IN_USE != 0,
        created: bits & CREATED != 0,
        first_in_first_chain: bits & REL_FIRST_IN_FIRST_CHAIN != 0,
        first_in_second_chain: bits & REL_FIRST_IN_SECOND_CHAIN != 0,
        first_node: reader.u64("relationship first_node")?,
        second_node: reader.u64("relationship second_node")?,
        rel_type: reader.u32("relationship type")?,
        first_prev_rel: reader.i64("relationship first_prev_rel")?,
        first_next_rel: reader.i64("relationship first_next_rel")?,
        second_prev_rel: reader.i64("relationship second_prev_rel")?,
        second_next_rel: reader.i64("relationship second_next_rel")?,
        next_prop: reader.i64("relationship next_prop")?,
    })
}

fn write_group(buf: &mut Vec<u8>, record: &RelationshipGroupRecord) {
    buf.put_u64_le(record.id);
    buf.put_u8(flags(record.in_use, record.created));
    buf.put_u32_le(record.rel_type);
    buf.put_i64_le(record.next);
    buf.put_i64_le(record.first_out);
    buf.put_i64_le(record.first_in);
    buf.put_i64_le(record.first_loop);
    buf.put_i64_le(record.owning_node);
}

fn read_group(reader: &mut PayloadReader<'_>) -> CoreResult<RelationshipGroupRecord> {
    let id = reader.u64("group id")?;
    let bits = reader.u8("group flags")?;
    Ok(RelationshipGroupRecord {
        id,
        in_use: bits & IN_USE != 0,
        created: bits & CREATED != 0,
        rel_type: reader.u32("group type")?,
        next: reader.i64("group next")?,
        first_out: reader.i64("group first_out")?,
        first_in: reader.i64("group first_in")?,
        first_loop: reader.i64("group first_loop")?,
        owning_node: reader.i64("group owning_node")?,
    })
}

fn write_dynamic(buf: &mut Vec<u8>, record: &DynamicRecord) -> CoreResult<()> {
    let mut bits = flags(record.in_use, record.created);
    if record.start_record {
        bits |= DYNAMIC_START_RECORD;
    }
    buf.put_u64_le(record.id);
    buf.put_u8(bits);
    buf.put_i64_le(record.next_block);
    put_len(buf, record.data.len(), "dynamic record data")?;
    buf.put_slice(&record.data);
    Ok(())
}

fn read_dynamic(reader: &mut PayloadReader<'_>) -> CoreResult<DynamicRecord> {
    let id = reader.u64("dynamic id")?;
    let bits = reader.u8("dynamic flags")?;
    let next_block = reader.i64("dynamic next_block")?;
    let len = reader.u32("dynamic data length")? as usize;
    let data = reader.take(len, "dynamic data")?.to_vec();
    Ok(DynamicRecord {
        id,
        in_use: bits & IN_USE != 0,
        created: bits & CREATED != 0,
        start_record: bits & DYNAMIC_START_RECORD != 0,
        next_block,
        data,
    })
}

fn write_dynamic_list(buf: &mut Vec<u8>, records: &[DynamicRecord]) -> CoreResult<()> {
    put_len(buf, records.len(), "dynamic record list")?;
    for record in records {
        write_dynamic(buf, record)?;
    }
    Ok(())
}

fn read_dynamic_list(reader: &mut PayloadReader<'_>) -> CoreResult<Vec<DynamicRecord>> {
    let count = reader.u32("dynamic record count")?;
    let mut records = Vec::new();
    for _ in 0..count {
        records.push(read_dynamic(reader)?);
    }
    Ok(records)
}

fn write_property(buf: &mut Vec<u8>, record: &PropertyRecord) -> CoreResult<()> {
    buf.put_u64_le(record.id);
    buf.put_u8(flags(record.in_use, record.created));
    buf.put_i64_le(record.prev_prop);
    buf.put_i64_le(record.next_prop);
    match record.owner {
        PropertyOwner::None => buf.put_u8(OWNER_NONE),
        PropertyOwner::Node(id) => {
            buf.put_u8(OWNER_NODE);
            buf.put_u64_le(id);
        }
        PropertyOwner::Relationship(id) => {
            buf.put_u8(OWNER_RELATIONSHIP);
            buf.put_u64_le(id);
        }
    }

    put_len(buf, record.blocks.len(), "property block list")?;
    for block in &record.blocks {
        buf.put_u32_le(block.key_id);
        put_len(buf, block.value.len(), "property value")?;
        for word in &block.value {
            buf.put_u64_le(*word);
        }
        write_dynamic_list(buf, &block.value_records)?;
    }
    write_dynamic_list(buf, &record.deleted_records)
}

fn read_property(reader: &mut PayloadReader<'_>) -> CoreResult<PropertyRecord> {
    let id = reader.u64("property id")?;
    let bits = reader.u8("property flags")?;
    let prev_prop = reader.i64("property prev_prop")?;
    let next_prop = reader.i64("property next_prop")?;
    let owner = match reader.u8("property owner")? {
        OWNER_NONE => PropertyOwner::None,
        OWNER_NODE => PropertyOwner::Node(reader.u64("property owner id")?),
        OWNER_RELATIONSHIP => PropertyOwner::Relationship(reader.u64("property owner id")?),
        other => {
            return Err(CoreError::log_corruption(format!(
                "unknown property owner tag {other} in property {id}"
            )))
        }
    };

    let block_count = reader.u32("property block count")?;
    let mut blocks = Vec::new();
    for _ in 0..block_count {
        let key_id = reader.u32("property key")?;
        let words = reader.u32("property value length")?;
        let mut value = Vec::new();
        for _ in 0..words {
            value.push(reader.u64("property value word")?);
        }
        let value_records = read_dynamic_list(reader)?;
        blocks.push(PropertyBlock {
            key_id,
            value,
            value_records,
        });
    }
    let deleted_records = read_dynamic_list(reader)?;

    Ok(PropertyRecord {
        id,
        in_use: bits & IN_USE != 0,
        created: bits & CREATED != 0,
        prev_prop,
        next_prop,
        owner,
        blocks,
        deleted_records,
    })
}

fn write_token(buf: &mut Vec<u8>, record: &TokenRecord) -> CoreResult<()> {
    buf.put_u32_le(record.id);
    buf.put_u8(flags(record.in_use, record.created));
    buf.put_i64_le(record.name_id);
    write_dynamic_list(buf, &record.name_records)
}

fn read_token(reader: &mut PayloadReader<'_>) -> CoreResult<TokenRecord> {
    let id = reader.u32("token id")?;
    let bits = reader.u8("token flags")?;
    Ok(TokenRecord {
        id,
        in_use: bits & IN_USE != 0,
        created: bits & CREATED != 0,
        name_id: reader.i64("token name_id")?,
        name_records: read_dynamic_list(reader)?,
    })
}

/// Bounds-checked little-endian reader over an entry or command payload.
///
/// A read past the end fails with [`CoreError::LogCorruption`]. The reader
/// only ever sees a complete entry body, so running out of bytes is never a
/// torn write.
#[derive(Debug)]
pub(crate) struct PayloadReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn take(&mut self, len: usize, what: &str) -> CoreResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CoreError::log_corruption(format!(
                "unexpected end of payload reading {what}: need {len} bytes at {}, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self, what: &str) -> CoreResult<u8> {
        Ok(self.take(1, what)?.get_u8())
    }

    pub(crate) fn u32(&mut self, what: &str) -> CoreResult<u32> {
        Ok(self.take(4, what)?.get_u32_le())
    }

    pub(crate) fn i32(&mut self, what: &str) -> CoreResult<i32> {
        Ok(self.take(4, what)?.get_i32_le())
    }

    pub(crate) fn u64(&mut self, what: &str) -> CoreResult<u64> {
        Ok(self.take(8, what)?.get_u64_le())
    }

    pub(crate) fn i64(&mut self, what: &str) -> CoreResult<i64> {
        Ok(self.take(8, what)?.get_i64_le())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NULL_REFERENCE;

    fn name_block(id: u64, data: &[u8]) -> DynamicRecord {
        let mut record = DynamicRecord::with_data(id, data);
        record.created = true;
        record
    }

    #[test]
    fn node_command_roundtrip() {
        let mut after = NodeRecord::with(7, true, 3, NULL_REFERENCE);
        after.created = true;
        after.dense = true;
        after.labels = 0x0102;
        let command = Command::Node {
            before: NodeRecord::new(7),
            after,
        };
        let payload = command.encode_payload().unwrap();
        assert_eq!(payload[0], CommandKind::Node.as_byte());
        assert_eq!(Command::decode_payload(&payload).unwrap(), command);
    }

    #[test]
    fn property_command_roundtrip() {
        let before = PropertyRecord::owned_by(12, PropertyOwner::Relationship(3));
        let mut after = before.clone();
        after.in_use = true;
        after.next_prop = 13;
        after.blocks = vec![
            PropertyBlock::inline(2, vec![0xdead_beef]),
            PropertyBlock {
                key_id: 5,
                value: vec![1, 2],
                value_records: vec![name_block(90, b"a long string value")],
            },
        ];
        after.deleted_records = vec![DynamicRecord::new(88)];
        let command = Command::Property { before, after };
        let payload = command.encode_payload().unwrap();
        assert_eq!(Command::decode_payload(&payload).unwrap(), command);
    }

    #[test]
    fn token_and_schema_roundtrip() {
        let mut token = TokenRecord::new(4);
        token.in_use = true;
        token.name_id = 30;
        token.name_records = vec![name_block(30, b"KNOWS")];
        let commands = vec![
            Command::LabelToken(token.clone()),
            Command::RelationshipTypeToken(token.clone()),
            Command::PropertyKeyToken(PropertyKeyTokenRecord {
                token,
                property_count: 9,
            }),
            Command::SchemaRule {
                before: vec![],
                after: vec![name_block(1, b"rule-part-1"), name_block(2, b"rule-part-2")],
            },
            Command::StoreHeader(StoreHeaderRecord::with_next_prop(77)),
            Command::RelationshipGroup(RelationshipGroupRecord::new(6, 2)),
            Command::Relationship(RelationshipRecord::between(8, 1, 2, 3)),
        ];
        for command in commands {
            let payload = command.encode_payload().unwrap();
            assert_eq!(Command::decode_payload(&payload).unwrap(), command);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Command::decode_payload(&[0xEE, 0, 0]).unwrap_err();
        assert!(matches!(err, CoreError::UnknownCommandKind(0xEE)));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut payload = Command::StoreHeader(StoreHeaderRecord::new())
            .encode_payload()
            .unwrap();
        payload.push(0);
        assert!(matches!(
            Command::decode_payload(&payload),
            Err(CoreError::LogCorruption { .. })
        ));
    }

    #[test]
    fn short_payload_is_corruption() {
        let payload = Command::Relationship(RelationshipRecord::between(1, 2, 3, 4))
            .encode_payload()
            .unwrap();
        let mut reader = PayloadReader::new(&payload[..payload.len() - 3]);
        assert!(matches!(
            Command::read_from(&mut reader),
            Err(CoreError::LogCorruption { .. })
        ));
    }

    #[test]
    fn bad_owner_tag_is_corruption() {
        let mut payload = Command::Property {
            before: PropertyRecord::new(1),
            after: PropertyRecord::new(1),
        }
        .encode_payload()
        .unwrap();
        // kind (1) + id (8) + flags (1) + prev (8) + next (8) puts the owner tag at 26.
        payload[26] = 9;
        let mut reader = PayloadReader::new(&payload);
        assert!(matches!(
            Command::read_from(&mut reader),
            Err(CoreError::LogCorruption { .. })
        ));
    }
}
