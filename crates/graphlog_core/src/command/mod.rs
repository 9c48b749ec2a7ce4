//! Commands: one durable record transition each.
//!
//! The command family is closed. Every consumer (payload codec, replay,
//! tooling) matches on [`Command`] exhaustively, so a new record kind cannot
//! be added without every consumer being updated.

mod codec;

pub(crate) use codec::PayloadReader;

use crate::record::{
    DynamicRecord, NodeRecord, PropertyKeyTokenRecord, PropertyRecord, RelationshipGroupRecord,
    RelationshipRecord, StoreHeaderRecord, TokenRecord,
};

/// Tag byte identifying a command's record kind in its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    /// Node before/after.
    Node = 1,
    /// Property before/after.
    Property = 2,
    /// Relationship after-state.
    Relationship = 3,
    /// Relationship-type token.
    RelationshipTypeToken = 4,
    /// Property-key token.
    PropertyKeyToken = 5,
    /// Store header.
    StoreHeader = 6,
    /// Schema rule dynamic chain.
    SchemaRule = 7,
    /// Label token.
    LabelToken = 8,
    /// Relationship group after-state.
    RelationshipGroup = 9,
}

impl CommandKind {
    /// Converts a payload tag byte to a kind.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Node),
            2 => Some(Self::Property),
            3 => Some(Self::Relationship),
            4 => Some(Self::RelationshipTypeToken),
            5 => Some(Self::PropertyKeyToken),
            6 => Some(Self::StoreHeader),
            7 => Some(Self::SchemaRule),
            8 => Some(Self::LabelToken),
            9 => Some(Self::RelationshipGroup),
            _ => None,
        }
    }

    /// Converts the kind to its tag byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Short lower-case name, for logs and tooling.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Property => "property",
            Self::Relationship => "relationship",
            Self::RelationshipTypeToken => "relationship_type_token",
            Self::PropertyKeyToken => "property_key_token",
            Self::StoreHeader => "store_header",
            Self::SchemaRule => "schema_rule",
            Self::LabelToken => "label_token",
            Self::RelationshipGroup => "relationship_group",
        }
    }
}

/// A record transition, the unit written to the log and replayed.
///
/// Creations and updates carry the after-state with `in_use = true`;
/// deletions carry it with `in_use = false`. Kinds whose replay needs the
/// prior state keep the before-state as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A node changed.
    Node {
        /// State before the transaction.
        before: NodeRecord,
        /// State after the transaction.
        after: NodeRecord,
    },
    /// A relationship changed.
    Relationship(RelationshipRecord),
    /// A relationship group changed.
    RelationshipGroup(RelationshipGroupRecord),
    /// A property record changed.
    Property {
        /// State before the transaction.
        before: PropertyRecord,
        /// State after the transaction.
        after: PropertyRecord,
    },
    /// A label token changed.
    LabelToken(TokenRecord),
    /// A property-key token changed.
    PropertyKeyToken(PropertyKeyTokenRecord),
    /// A relationship-type token changed.
    RelationshipTypeToken(TokenRecord),
    /// A schema rule's dynamic chain changed.
    SchemaRule {
        /// Chain before the transaction.
        before: Vec<DynamicRecord>,
        /// Chain after the transaction.
        after: Vec<DynamicRecord>,
    },
    /// The store header changed.
    StoreHeader(StoreHeaderRecord),
}

impl Command {
    /// Record kind of this command.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Node { .. } => CommandKind::Node,
            Self::Relationship(_) => CommandKind::Relationship,
            Self::RelationshipGroup(_) => CommandKind::RelationshipGroup,
            Self::Property { .. } => CommandKind::Property,
            Self::LabelToken(_) => CommandKind::LabelToken,
            Self::PropertyKeyToken(_) => CommandKind::PropertyKeyToken,
            Self::RelationshipTypeToken(_) => CommandKind::RelationshipTypeToken,
            Self::SchemaRule { .. } => CommandKind::SchemaRule,
            Self::StoreHeader(_) => CommandKind::StoreHeader,
        }
    }

    /// Id of the slot this command changes.
    ///
    /// `None` for the store header, which has a single slot, and for an
    /// empty schema chain.
    #[must_use]
    pub fn record_id(&self) -> Option<u64> {
        match self {
            Self::Node { after, .. } => Some(after.id),
            Self::Relationship(record) => Some(record.id),
            Self::RelationshipGroup(record) => Some(record.id),
            Self::Property { after, .. } => Some(after.id),
            Self::LabelToken(record) | Self::RelationshipTypeToken(record) => {
                Some(u64::from(record.id))
            }
            Self::PropertyKeyToken(record) => Some(u64::from(record.token.id)),
            Self::SchemaRule { after, .. } => after.first().map(|record| record.id),
            Self::StoreHeader(_) => None,
        }
    }

    /// Whether the after-state leaves the slot in use.
    #[must_use]
    pub fn after_in_use(&self) -> bool {
        match self {
            Self::Node { after, .. } => after.in_use,
            Self::Relationship(record) => record.in_use,
            Self::RelationshipGroup(record) => record.in_use,
            Self::Property { after, .. } => after.in_use,
            Self::LabelToken(record) | Self::RelationshipTypeToken(record) => record.in_use,
            Self::PropertyKeyToken(record) => record.token.in_use,
            Self::SchemaRule { after, .. } => after.iter().all(|record| record.in_use),
            Self::StoreHeader(record) => record.in_use,
        }
    }

    /// Whether the after-state was created by this transaction.
    #[must_use]
    pub fn after_created(&self) -> bool {
        match self {
            Self::Node { after, .. } => after.created,
            Self::Relationship(record) => record.created,
            Self::RelationshipGroup(record) => record.created,
            Self::Property { after, .. } => after.created,
            Self::LabelToken(record) | Self::RelationshipTypeToken(record) => record.created,
            Self::PropertyKeyToken(record) => record.token.created,
            Self::SchemaRule { after, .. } => {
                !after.is_empty() && after.iter().all(|record| record.created)
            }
            Self::StoreHeader(record) => record.created,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_bytes_roundtrip() {
        for b in 0u8..=12 {
            if let Some(kind) = CommandKind::from_byte(b) {
                assert_eq!(kind.as_byte(), b);
            } else {
                assert!(b == 0 || b > 9);
            }
        }
    }

    #[test]
    fn deletion_reports_not_in_use() {
        let command = Command::Node {
            before: NodeRecord::with(4, true, 1, 2),
            after: NodeRecord::new(4),
        };
        assert_eq!(command.kind(), CommandKind::Node);
        assert_eq!(command.record_id(), Some(4));
        assert!(!command.after_in_use());
        assert!(!command.after_created());
    }

    #[test]
    fn header_has_no_slot_id() {
        let command = Command::StoreHeader(StoreHeaderRecord::with_next_prop(12));
        assert_eq!(command.record_id(), None);
        assert!(command.after_in_use());
    }
}
