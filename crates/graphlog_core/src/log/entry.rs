//! Log entry types and their on-log encoding.

use crate::command::{Command, PayloadReader};
use crate::error::{CoreError, CoreResult};
use crate::types::{CommitPhase, TransactionId};
use crate::xid::Xid;
use bytes::BufMut;

/// Value written in the master-committed-tx slot of every Start entry.
///
/// The slot is reserved for the coordinator's view of the last committed
/// transaction; writers never know it, so it always carries this placeholder.
pub const MASTER_COMMITTED_TX_PLACEHOLDER: i64 = -1;

/// Tag byte plus body length that open every entry frame.
pub const ENTRY_HEADER_LEN: usize = 1 + 4;

/// CRC32 trailer closing every entry frame.
pub const ENTRY_TRAILER_LEN: usize = 4;

/// Tag byte that starts every log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntryKind {
    /// Transaction start.
    Start = 1,
    /// Prepare vote.
    Prepare = 2,
    /// One command.
    Command = 3,
    /// Transaction fully written.
    Done = 4,
    /// Commit without a prepare.
    OnePhaseCommit = 5,
    /// Commit after a prepare.
    TwoPhaseCommit = 6,
}

impl EntryKind {
    /// Converts a tag byte to a kind.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Start),
            2 => Some(Self::Prepare),
            3 => Some(Self::Command),
            4 => Some(Self::Done),
            5 => Some(Self::OnePhaseCommit),
            6 => Some(Self::TwoPhaseCommit),
            _ => None,
        }
    }

    /// Converts the kind to its tag byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Protocol step name, as used in sequencing errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Prepare => "prepare",
            Self::Command => "command",
            Self::Done => "done",
            Self::OnePhaseCommit | Self::TwoPhaseCommit => "commit",
        }
    }
}

/// One durable unit of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// A transaction began.
    Start {
        /// Global transaction id.
        xid: Xid,
        /// Local identifier stamped on every entry of the transaction.
        identifier: i32,
        /// Coordinating instance.
        master_id: i32,
        /// Originating instance.
        my_id: i32,
        /// Always [`MASTER_COMMITTED_TX_PLACEHOLDER`] when written.
        master_committed_tx: i64,
        /// Wall-clock start, millis since the epoch.
        start_timestamp: u64,
        /// Last transaction known committed when this one started.
        last_committed_tx: TransactionId,
    },
    /// A record transition.
    Command {
        /// Local identifier.
        identifier: i32,
        /// The transition.
        command: Command,
    },
    /// The transaction voted to commit.
    Prepare {
        /// Local identifier.
        identifier: i32,
        /// Millis since the epoch.
        timestamp: u64,
    },
    /// The transaction committed and got its final id.
    Commit {
        /// Local identifier.
        identifier: i32,
        /// One- or two-phase, carried as the entry tag.
        phase: CommitPhase,
        /// Final transaction id.
        tx_id: TransactionId,
        /// Millis since the epoch.
        timestamp: u64,
    },
    /// All entries of the transaction are durable.
    Done {
        /// Local identifier.
        identifier: i32,
    },
}

impl LogEntry {
    /// Tag of this entry.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Start { .. } => EntryKind::Start,
            Self::Command { .. } => EntryKind::Command,
            Self::Prepare { .. } => EntryKind::Prepare,
            Self::Commit {
                phase: CommitPhase::OnePhase,
                ..
            } => EntryKind::OnePhaseCommit,
            Self::Commit {
                phase: CommitPhase::TwoPhase,
                ..
            } => EntryKind::TwoPhaseCommit,
            Self::Done { .. } => EntryKind::Done,
        }
    }

    /// Local identifier of the transaction this entry belongs to.
    #[must_use]
    pub fn identifier(&self) -> i32 {
        match self {
            Self::Start { identifier, .. }
            | Self::Command { identifier, .. }
            | Self::Prepare { identifier, .. }
            | Self::Commit { identifier, .. }
            | Self::Done { identifier } => *identifier,
        }
    }

    /// Serializes the entry as one frame: tag, body length, body, CRC32.
    ///
    /// The checksum covers the tag, the length and the body.
    ///
    /// # Errors
    ///
    /// Fails if a global or branch id is longer than 255 bytes, or if the
    /// command payload cannot be encoded.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(64);
        buf.put_u8(self.kind().as_byte());
        buf.put_u32_le(0);
        self.write_body(&mut buf)?;

        let body_len = u32::try_from(buf.len() - ENTRY_HEADER_LEN)
            .map_err(|_| CoreError::invalid_operation("entry body larger than 4 GiB"))?;
        buf[1..ENTRY_HEADER_LEN].copy_from_slice(&body_len.to_le_bytes());
        let crc = crc32fast::hash(&buf);
        buf.put_u32_le(crc);
        Ok(buf)
    }

    fn write_body(&self, buf: &mut Vec<u8>) -> CoreResult<()> {
        match self {
            Self::Start {
                xid,
                identifier,
                master_id,
                my_id,
                master_committed_tx,
                start_timestamp,
                last_committed_tx,
            } => {
                let global_len = u8::try_from(xid.global_id.len()).map_err(|_| {
                    CoreError::invalid_operation("global transaction id longer than 255 bytes")
                })?;
                let branch_len = u8::try_from(xid.branch_id.len()).map_err(|_| {
                    CoreError::invalid_operation("branch id longer than 255 bytes")
                })?;
                buf.put_i32_le(xid.format_id);
                buf.put_u8(global_len);
                buf.put_u8(branch_len);
                buf.put_slice(&xid.global_id);
                buf.put_slice(&xid.branch_id);
                buf.put_i32_le(*identifier);
                buf.put_i32_le(*master_id);
                buf.put_i32_le(*my_id);
                buf.put_i64_le(*master_committed_tx);
                buf.put_u64_le(*start_timestamp);
                buf.put_u64_le(last_committed_tx.as_u64());
            }
            Self::Command {
                identifier,
                command,
            } => {
                buf.put_i32_le(*identifier);
                command.write_payload(buf)?;
            }
            Self::Prepare {
                identifier,
                timestamp,
            } => {
                buf.put_i32_le(*identifier);
                buf.put_u64_le(*timestamp);
            }
            Self::Commit {
                identifier,
                tx_id,
                timestamp,
                ..
            } => {
                buf.put_i32_le(*identifier);
                buf.put_u64_le(tx_id.as_u64());
                buf.put_u64_le(*timestamp);
            }
            Self::Done { identifier } => buf.put_i32_le(*identifier),
        }
        Ok(())
    }

    /// Decodes the entry at the start of `data`.
    ///
    /// `offset` is the entry's position in the log, used in error messages.
    /// Returns the entry and the number of bytes its frame occupies, or
    /// `None` if `data` ends before the frame does. Only a frame that runs
    /// past the end of `data` is incomplete; every complete frame either
    /// decodes or fails.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownEntryKind`] for an unrecognised tag
    /// - [`CoreError::LogCorruption`] for a checksum mismatch, or a body that
    ///   is short, malformed or longer than its fields
    /// - [`CoreError::UnknownCommandKind`] for a command body with an
    ///   unrecognised command tag
    pub fn decode(data: &[u8], offset: u64) -> CoreResult<Option<(Self, usize)>> {
        let Some(&tag) = data.first() else {
            return Ok(None);
        };
        let kind =
            EntryKind::from_byte(tag).ok_or(CoreError::UnknownEntryKind { kind: tag, offset })?;
        if data.len() < ENTRY_HEADER_LEN {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[1..ENTRY_HEADER_LEN]);
        let body_len = u32::from_le_bytes(len_bytes) as usize;
        let body_end = ENTRY_HEADER_LEN.saturating_add(body_len);
        let frame_len = body_end.saturating_add(ENTRY_TRAILER_LEN);
        if data.len() < frame_len {
            return Ok(None);
        }

        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&data[body_end..frame_len]);
        let stored = u32::from_le_bytes(crc_bytes);
        let computed = crc32fast::hash(&data[..body_end]);
        if stored != computed {
            return Err(CoreError::log_corruption(format!(
                "{} entry at offset {offset}: checksum mismatch, stored {stored:#010x}, computed {computed:#010x}",
                kind.name()
            )));
        }

        let mut reader = PayloadReader::new(&data[ENTRY_HEADER_LEN..body_end]);
        let entry = Self::read_body(kind, &mut reader).map_err(|e| match e {
            CoreError::LogCorruption { message } => CoreError::log_corruption(format!(
                "{} entry at offset {offset}: {message}",
                kind.name()
            )),
            other => other,
        })?;
        if reader.remaining() != 0 {
            return Err(CoreError::log_corruption(format!(
                "{} entry at offset {offset}: {} unread body bytes",
                kind.name(),
                reader.remaining()
            )));
        }
        Ok(Some((entry, frame_len)))
    }

    fn read_body(kind: EntryKind, reader: &mut PayloadReader<'_>) -> CoreResult<Self> {
        let entry = match kind {
            EntryKind::Start => {
                let format_id = reader.i32("xid format")?;
                let global_len = reader.u8("global id length")? as usize;
                let branch_len = reader.u8("branch id length")? as usize;
                let global_id = reader.take(global_len, "global id")?.to_vec();
                let branch_id = reader.take(branch_len, "branch id")?.to_vec();
                Self::Start {
                    xid: Xid {
                        format_id,
                        global_id,
                        branch_id,
                    },
                    identifier: reader.i32("identifier")?,
                    master_id: reader.i32("master id")?,
                    my_id: reader.i32("my id")?,
                    master_committed_tx: reader.i64("master committed tx")?,
                    start_timestamp: reader.u64("start timestamp")?,
                    last_committed_tx: TransactionId::new(reader.u64("last committed tx")?),
                }
            }
            EntryKind::Command => Self::Command {
                identifier: reader.i32("identifier")?,
                command: Command::read_from(reader)?,
            },
            EntryKind::Prepare => Self::Prepare {
                identifier: reader.i32("identifier")?,
                timestamp: reader.u64("prepare timestamp")?,
            },
            EntryKind::OnePhaseCommit | EntryKind::TwoPhaseCommit => Self::Commit {
                identifier: reader.i32("identifier")?,
                phase: CommitPhase::from_two_phase(kind == EntryKind::TwoPhaseCommit),
                tx_id: TransactionId::new(reader.u64("tx id")?),
                timestamp: reader.u64("commit timestamp")?,
            },
            EntryKind::Done => Self::Done {
                identifier: reader.i32("identifier")?,
            },
        };
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NodeRecord;
    use crate::xid::STORE_BRANCH_ID;

    fn start() -> LogEntry {
        LogEntry::Start {
            xid: Xid::new(vec![1, 2, 3], STORE_BRANCH_ID.to_vec()),
            identifier: 5,
            master_id: 1,
            my_id: 2,
            master_committed_tx: MASTER_COMMITTED_TX_PLACEHOLDER,
            start_timestamp: 1_700_000_000_000,
            last_committed_tx: TransactionId::new(41),
        }
    }

    #[test]
    fn every_entry_kind_roundtrips() {
        let mut node = NodeRecord::with(7, true, -1, -1);
        node.created = true;
        let entries = vec![
            start(),
            LogEntry::Command {
                identifier: 5,
                command: Command::Node {
                    before: NodeRecord::new(7),
                    after: node,
                },
            },
            LogEntry::Prepare {
                identifier: 5,
                timestamp: 10,
            },
            LogEntry::Commit {
                identifier: 5,
                phase: CommitPhase::TwoPhase,
                tx_id: TransactionId::new(42),
                timestamp: 11,
            },
            LogEntry::Commit {
                identifier: 6,
                phase: CommitPhase::OnePhase,
                tx_id: TransactionId::new(43),
                timestamp: 12,
            },
            LogEntry::Done { identifier: 5 },
        ];

        for entry in entries {
            let bytes = entry.encode().unwrap();
            assert_eq!(bytes[0], entry.kind().as_byte());
            let (decoded, used) = LogEntry::decode(&bytes, 0).unwrap().unwrap();
            assert_eq!(decoded, entry);
            assert_eq!(used, bytes.len());
        }
    }

    #[test]
    fn commit_phase_is_the_tag() {
        let one = LogEntry::Commit {
            identifier: 1,
            phase: CommitPhase::OnePhase,
            tx_id: TransactionId::new(1),
            timestamp: 0,
        };
        assert_eq!(one.encode().unwrap()[0], 5);
        assert_eq!(one.kind().name(), "commit");
    }

    #[test]
    fn start_layout_matches_format() {
        let bytes = start().encode().unwrap();
        // format id, two lengths, 3 + 6 id bytes, 3 x i32, i64, 2 x u64
        let body_len = 4 + 2 + 3 + 6 + 12 + 8 + 16;
        assert_eq!(bytes.len(), ENTRY_HEADER_LEN + body_len + ENTRY_TRAILER_LEN);
        assert_eq!(&bytes[1..5], &(body_len as u32).to_le_bytes());
        assert_eq!(&bytes[5..9], &crate::xid::XID_FORMAT_ID.to_le_bytes());
        let placeholder_at = ENTRY_HEADER_LEN + 4 + 2 + 9 + 12;
        assert_eq!(
            &bytes[placeholder_at..placeholder_at + 8],
            &(-1i64).to_le_bytes()
        );
    }

    #[test]
    fn partial_entry_needs_more_bytes() {
        let bytes = start().encode().unwrap();
        for cut in 0..bytes.len() {
            assert!(LogEntry::decode(&bytes[..cut], 0).unwrap().is_none());
        }
    }

    #[test]
    fn unknown_tag_is_fatal() {
        let err = LogEntry::decode(&[0x7F, 0, 0, 0, 0], 99).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnknownEntryKind {
                kind: 0x7F,
                offset: 99
            }
        ));
    }

    #[test]
    fn flipped_body_byte_fails_the_checksum() {
        let mut bytes = start().encode().unwrap();
        bytes[ENTRY_HEADER_LEN + 3] ^= 0x01;
        let err = LogEntry::decode(&bytes, 64).unwrap_err();
        match err {
            CoreError::LogCorruption { message } => {
                assert!(message.contains("offset 64"), "{message}");
                assert!(message.contains("checksum"), "{message}");
            }
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn flipped_checksum_byte_is_corruption() {
        let mut bytes = LogEntry::Done { identifier: 3 }.encode().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x80;
        assert!(matches!(
            LogEntry::decode(&bytes, 0),
            Err(CoreError::LogCorruption { .. })
        ));
    }

    /// Frames `body` under `kind` with a valid length and checksum.
    fn frame(kind: EntryKind, body: &[u8]) -> Vec<u8> {
        let mut buf = vec![kind.as_byte()];
        buf.put_u32_le(body.len() as u32);
        buf.put_slice(body);
        let crc = crc32fast::hash(&buf);
        buf.put_u32_le(crc);
        buf
    }

    #[test]
    fn short_body_in_complete_frame_is_corruption() {
        // Prepare needs identifier + timestamp; give it the identifier only.
        let bytes = frame(EntryKind::Prepare, &7i32.to_le_bytes());
        assert!(matches!(
            LogEntry::decode(&bytes, 0),
            Err(CoreError::LogCorruption { .. })
        ));
        let mut longer = bytes.clone();
        longer.extend_from_slice(&[0; 32]);
        assert!(LogEntry::decode(&longer, 0).is_err());
    }

    #[test]
    fn unread_body_bytes_are_corruption() {
        let mut body = 7i32.to_le_bytes().to_vec();
        body.push(0);
        let bytes = frame(EntryKind::Done, &body);
        assert!(matches!(
            LogEntry::decode(&bytes, 0),
            Err(CoreError::LogCorruption { .. })
        ));
    }

    #[test]
    fn oversized_global_id_is_rejected() {
        let entry = LogEntry::Start {
            xid: Xid::new(vec![0; 300], vec![]),
            identifier: 1,
            master_id: 0,
            my_id: 0,
            master_committed_tx: MASTER_COMMITTED_TX_PLACEHOLDER,
            start_timestamp: 0,
            last_committed_tx: TransactionId::new(0),
        };
        assert!(matches!(
            entry.encode(),
            Err(CoreError::InvalidOperation { .. })
        ));
    }
}
