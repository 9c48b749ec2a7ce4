//! Property-based test generators using proptest.
//!
//! Records are generated with arbitrary field values, including flag
//! combinations the writer never produces, so codec tests see the whole
//! value space.

use graphlog_core::record::{
    DynamicRecord, NodeRecord, PropertyBlock, PropertyKeyTokenRecord, PropertyOwner,
    PropertyRecord, RelationshipGroupRecord, RelationshipRecord, StoreHeaderRecord, TokenRecord,
};
use graphlog_core::{Command, CommitPhase, LogEntry, TransactionId, Xid};
use proptest::prelude::*;

/// Strategy for record pointers: mostly small ids, sometimes null.
pub fn reference_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        1 => Just(-1i64),
        4 => 0i64..10_000,
        1 => any::<i64>(),
    ]
}

/// Strategy for a dynamic block with up to 64 bytes of data.
pub fn dynamic_record_strategy() -> impl Strategy<Value = DynamicRecord> {
    (
        0u64..100_000,
        any::<[bool; 3]>(),
        reference_strategy(),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(id, [in_use, created, start_record], next_block, data)| DynamicRecord {
            id,
            in_use,
            created,
            start_record,
            next_block,
            data,
        })
}

/// Strategy for short dynamic chains.
pub fn dynamic_chain_strategy() -> impl Strategy<Value = Vec<DynamicRecord>> {
    prop::collection::vec(dynamic_record_strategy(), 0..4)
}

/// Strategy for node records.
pub fn node_record_strategy() -> impl Strategy<Value = NodeRecord> {
    (
        0u64..100_000,
        any::<[bool; 3]>(),
        reference_strategy(),
        reference_strategy(),
        any::<u64>(),
    )
        .prop_map(|(id, [in_use, created, dense], next_rel, next_prop, labels)| NodeRecord {
            id,
            in_use,
            created,
            dense,
            next_rel,
            next_prop,
            labels,
        })
}

/// Strategy for relationship records.
pub fn relationship_record_strategy() -> impl Strategy<Value = RelationshipRecord> {
    (
        (0u64..100_000, any::<[bool; 4]>(), 0u64..100_000, 0u64..100_000, any::<u32>()),
        prop::array::uniform5(reference_strategy()),
    )
        .prop_map(
            |((id, flags, first_node, second_node, rel_type), links)| RelationshipRecord {
                id,
                in_use: flags[0],
                created: flags[1],
                first_in_first_chain: flags[2],
                first_in_second_chain: flags[3],
                first_node,
                second_node,
                rel_type,
                first_prev_rel: links[0],
                first_next_rel: links[1],
                second_prev_rel: links[2],
                second_next_rel: links[3],
                next_prop: links[4],
            },
        )
}

/// Strategy for relationship group records.
pub fn relationship_group_strategy() -> impl Strategy<Value = RelationshipGroupRecord> {
    (
        (0u64..100_000, any::<[bool; 2]>(), any::<u32>()),
        prop::array::uniform5(reference_strategy()),
    )
        .prop_map(|((id, [in_use, created], rel_type), links)| RelationshipGroupRecord {
            id,
            in_use,
            created,
            rel_type,
            next: links[0],
            first_out: links[1],
            first_in: links[2],
            first_loop: links[3],
            owning_node: links[4],
        })
}

/// Strategy for property owners.
pub fn property_owner_strategy() -> impl Strategy<Value = PropertyOwner> {
    prop_oneof![
        Just(PropertyOwner::None),
        any::<u64>().prop_map(PropertyOwner::Node),
        any::<u64>().prop_map(PropertyOwner::Relationship),
    ]
}

/// Strategy for property blocks.
pub fn property_block_strategy() -> impl Strategy<Value = PropertyBlock> {
    (
        any::<u32>(),
        prop::collection::vec(any::<u64>(), 1..4),
        dynamic_chain_strategy(),
    )
        .prop_map(|(key_id, value, value_records)| PropertyBlock {
            key_id,
            value,
            value_records,
        })
}

/// Strategy for property records.
pub fn property_record_strategy() -> impl Strategy<Value = PropertyRecord> {
    (
        (0u64..100_000, any::<[bool; 2]>()),
        (reference_strategy(), reference_strategy()),
        property_owner_strategy(),
        prop::collection::vec(property_block_strategy(), 0..4),
        dynamic_chain_strategy(),
    )
        .prop_map(
            |((id, [in_use, created]), (prev_prop, next_prop), owner, blocks, deleted_records)| {
                PropertyRecord {
                    id,
                    in_use,
                    created,
                    prev_prop,
                    next_prop,
                    owner,
                    blocks,
                    deleted_records,
                }
            },
        )
}

/// Strategy for token records.
pub fn token_record_strategy() -> impl Strategy<Value = TokenRecord> {
    (
        any::<u32>(),
        any::<[bool; 2]>(),
        reference_strategy(),
        dynamic_chain_strategy(),
    )
        .prop_map(|(id, [in_use, created], name_id, name_records)| TokenRecord {
            id,
            in_use,
            created,
            name_id,
            name_records,
        })
}

/// Strategy for commands of every kind.
pub fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        (node_record_strategy(), node_record_strategy())
            .prop_map(|(before, after)| Command::Node { before, after }),
        relationship_record_strategy().prop_map(Command::Relationship),
        relationship_group_strategy().prop_map(Command::RelationshipGroup),
        (property_record_strategy(), property_record_strategy())
            .prop_map(|(before, after)| Command::Property { before, after }),
        token_record_strategy().prop_map(Command::LabelToken),
        (token_record_strategy(), any::<u32>()).prop_map(|(token, property_count)| {
            Command::PropertyKeyToken(PropertyKeyTokenRecord {
                token,
                property_count,
            })
        }),
        token_record_strategy().prop_map(Command::RelationshipTypeToken),
        (dynamic_chain_strategy(), dynamic_chain_strategy())
            .prop_map(|(before, after)| Command::SchemaRule { before, after }),
        (any::<[bool; 2]>(), reference_strategy()).prop_map(|([in_use, created], next_prop)| {
            Command::StoreHeader(StoreHeaderRecord {
                in_use,
                created,
                next_prop,
            })
        }),
    ]
}

/// Strategy for global transaction ids.
pub fn xid_strategy() -> impl Strategy<Value = Xid> {
    (
        any::<i32>(),
        prop::collection::vec(any::<u8>(), 0..64),
        prop::collection::vec(any::<u8>(), 0..16),
    )
        .prop_map(|(format_id, global_id, branch_id)| Xid {
            format_id,
            global_id,
            branch_id,
        })
}

/// Strategy for single log entries of any kind.
pub fn log_entry_strategy() -> impl Strategy<Value = LogEntry> {
    let identifier = any::<i32>();
    prop_oneof![
        (
            xid_strategy(),
            identifier,
            any::<(i32, i32, i64)>(),
            any::<u64>(),
            any::<u64>()
        )
            .prop_map(
                |(xid, identifier, (master_id, my_id, master_committed_tx), ts, last)| {
                    LogEntry::Start {
                        xid,
                        identifier,
                        master_id,
                        my_id,
                        master_committed_tx,
                        start_timestamp: ts,
                        last_committed_tx: TransactionId::new(last),
                    }
                }
            ),
        (identifier, command_strategy())
            .prop_map(|(identifier, command)| LogEntry::Command { identifier, command }),
        (identifier, any::<u64>())
            .prop_map(|(identifier, timestamp)| LogEntry::Prepare { identifier, timestamp }),
        (identifier, any::<bool>(), any::<u64>(), any::<u64>()).prop_map(
            |(identifier, two_phase, tx, timestamp)| LogEntry::Commit {
                identifier,
                phase: CommitPhase::from_two_phase(two_phase),
                tx_id: TransactionId::new(tx),
                timestamp,
            }
        ),
        identifier.prop_map(|identifier| LogEntry::Done { identifier }),
    ]
}

/// Strategy for token names of 1 to 120 characters.
pub fn token_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_ äöü]{0,119}").expect("Invalid regex")
}
