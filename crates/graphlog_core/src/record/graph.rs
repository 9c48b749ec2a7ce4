//! Node, relationship and relationship group records.

use super::{impl_store_record, NULL_REFERENCE};

/// A node slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Slot id.
    pub id: u64,
    /// Whether the slot holds a live node.
    pub in_use: bool,
    /// Set when this transaction created the node.
    pub created: bool,
    /// Relationships are kept in per-type groups instead of one chain.
    pub dense: bool,
    /// First relationship, or first relationship group when `dense`.
    pub next_rel: i64,
    /// First property record.
    pub next_prop: i64,
    /// Inlined label ids or a pointer to a dynamic label chain.
    pub labels: u64,
}

impl NodeRecord {
    /// A not-in-use node with empty chains.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self::with(id, false, NULL_REFERENCE, NULL_REFERENCE)
    }

    /// A node with the given usage and chain heads.
    #[must_use]
    pub fn with(id: u64, in_use: bool, next_rel: i64, next_prop: i64) -> Self {
        Self {
            id,
            in_use,
            created: false,
            dense: false,
            next_rel,
            next_prop,
            labels: 0,
        }
    }
}

impl_store_record!(NodeRecord, "node");

/// A relationship slot, linked into the chains of both its nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRecord {
    /// Slot id.
    pub id: u64,
    /// Whether the slot holds a live relationship.
    pub in_use: bool,
    /// Set when this transaction created the relationship.
    pub created: bool,
    /// Start node.
    pub first_node: u64,
    /// End node.
    pub second_node: u64,
    /// Relationship type token id.
    pub rel_type: u32,
    /// Previous relationship in the start node's chain (chain length when first).
    pub first_prev_rel: i64,
    /// Next relationship in the start node's chain.
    pub first_next_rel: i64,
    /// Previous relationship in the end node's chain (chain length when first).
    pub second_prev_rel: i64,
    /// Next relationship in the end node's chain.
    pub second_next_rel: i64,
    /// First property record.
    pub next_prop: i64,
    /// Head of the start node's chain.
    pub first_in_first_chain: bool,
    /// Head of the end node's chain.
    pub first_in_second_chain: bool,
}

impl RelationshipRecord {
    /// A not-in-use relationship with no links.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            in_use: false,
            created: false,
            first_node: 0,
            second_node: 0,
            rel_type: 0,
            first_prev_rel: NULL_REFERENCE,
            first_next_rel: NULL_REFERENCE,
            second_prev_rel: NULL_REFERENCE,
            second_next_rel: NULL_REFERENCE,
            next_prop: NULL_REFERENCE,
            first_in_first_chain: true,
            first_in_second_chain: true,
        }
    }

    /// A live relationship of `rel_type` from `first_node` to `second_node`.
    #[must_use]
    pub fn between(id: u64, first_node: u64, second_node: u64, rel_type: u32) -> Self {
        Self {
            in_use: true,
            first_node,
            second_node,
            rel_type,
            ..Self::new(id)
        }
    }
}

impl_store_record!(RelationshipRecord, "relationship");

/// A per-type relationship group of a dense node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipGroupRecord {
    /// Slot id.
    pub id: u64,
    /// Whether the slot holds a live group.
    pub in_use: bool,
    /// Set when this transaction created the group.
    pub created: bool,
    /// Relationship type this group holds.
    pub rel_type: u32,
    /// Next group of the same node.
    pub next: i64,
    /// First outgoing relationship.
    pub first_out: i64,
    /// First incoming relationship.
    pub first_in: i64,
    /// First self-loop.
    pub first_loop: i64,
    /// Node owning the group.
    pub owning_node: i64,
}

impl RelationshipGroupRecord {
    /// An empty, not-in-use group of `rel_type`.
    #[must_use]
    pub fn new(id: u64, rel_type: u32) -> Self {
        Self {
            id,
            in_use: false,
            created: false,
            rel_type,
            next: NULL_REFERENCE,
            first_out: NULL_REFERENCE,
            first_in: NULL_REFERENCE,
            first_loop: NULL_REFERENCE,
            owning_node: NULL_REFERENCE,
        }
    }
}

impl_store_record!(RelationshipGroupRecord, "relationship group");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::StoreRecord;

    #[test]
    fn fresh_records_are_free_with_null_chains() {
        let node = NodeRecord::new(7);
        assert!(!node.in_use());
        assert!(!node.is_created());
        assert_eq!(node.next_rel, NULL_REFERENCE);
        assert_eq!(node.next_prop, NULL_REFERENCE);

        let group = RelationshipGroupRecord::new(1, 4);
        assert_eq!(group.first_loop, NULL_REFERENCE);
        assert_eq!(group.rel_type, 4);
    }

    #[test]
    fn set_created_only_touches_created() {
        let mut rel = RelationshipRecord::between(3, 1, 2, 0);
        rel.set_created();
        assert!(rel.is_created());
        assert!(rel.in_use());
        assert_eq!(rel.id(), 3);
        assert_eq!(RelationshipRecord::STORE, "relationship");
    }
}
