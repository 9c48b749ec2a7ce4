//! Translation of record changes into transaction entries.

use crate::command::Command;
use crate::config::LogConfig;
use crate::error::CoreResult;
use crate::name_block::NameBlockEncoder;
use crate::output::{Output, TxStart};
use crate::record::{
    DynamicRecord, NodeRecord, PropertyKeyTokenRecord, PropertyRecord, RelationshipGroupRecord,
    RelationshipRecord, StoreHeaderRecord, StoreRecord, TokenRecord,
};
use crate::types::{now_millis, CommitPhase, TransactionId};
use crate::xid::Xid;
use tracing::trace;

/// Writes one transaction's entries to an [`Output`].
///
/// Every method forwards exactly one entry and keeps nothing between
/// calls. Methods come in four families per record kind:
///
/// - `create_*` flags the record created, then updates it
/// - `update_*` marks the after-state in use, then adds it
/// - `delete_*` marks the after-state not in use, then adds it
/// - `add_*` forwards the record exactly as given
///
/// The writer does not check that calls follow Start, Command*, Prepare?,
/// Commit, Done; wrap the output in a
/// [`SequenceValidatingOutput`](crate::output::SequenceValidatingOutput)
/// for that.
#[derive(Debug)]
pub struct TransactionWriter<O> {
    output: O,
    identifier: i32,
    local_id: i32,
    config: LogConfig,
    names: NameBlockEncoder,
}

impl<O: Output> TransactionWriter<O> {
    /// Creates a writer stamping `identifier` on every entry.
    ///
    /// `local_id` identifies this writer's instance in generated global ids.
    pub fn new(output: O, identifier: i32, local_id: i32) -> Self {
        Self::with_config(output, identifier, local_id, LogConfig::default())
    }

    /// Creates a writer using `config` for global ids.
    pub fn with_config(output: O, identifier: i32, local_id: i32, config: LogConfig) -> Self {
        Self {
            output,
            identifier,
            local_id,
            config,
            names: NameBlockEncoder::new(),
        }
    }

    /// Uses `encoder` for token names instead of the store's block size.
    #[must_use]
    pub fn with_name_encoder(mut self, encoder: NameBlockEncoder) -> Self {
        self.names = encoder;
        self
    }

    /// Identifier stamped on every entry.
    pub fn identifier(&self) -> i32 {
        self.identifier
    }

    /// The output entries go to.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// The output entries go to.
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Unwraps the output.
    pub fn into_output(self) -> O {
        self.output
    }

    // Transaction boundaries

    /// Starts the transaction with a generated global id and the current time.
    pub fn start(
        &mut self,
        master_id: i32,
        my_id: i32,
        last_committed_tx: TransactionId,
    ) -> CoreResult<()> {
        let global_id = Xid::new_global_id(self.config.global_id_seed, self.local_id);
        self.start_with(global_id, master_id, my_id, now_millis(), last_committed_tx)
    }

    /// Starts the transaction with an explicit global id and timestamp.
    pub fn start_with(
        &mut self,
        global_id: Vec<u8>,
        master_id: i32,
        my_id: i32,
        start_timestamp: u64,
        last_committed_tx: TransactionId,
    ) -> CoreResult<()> {
        let start = TxStart {
            xid: Xid::new(global_id, self.config.branch_id.clone()),
            identifier: self.identifier,
            master_id,
            my_id,
            start_timestamp,
            last_committed_tx,
        };
        self.output.write_start(&start)
    }

    /// Writes a prepare stamped with the current time.
    pub fn prepare(&mut self) -> CoreResult<()> {
        self.prepare_at(now_millis())
    }

    /// Writes a prepare stamped with `timestamp`.
    pub fn prepare_at(&mut self, timestamp: u64) -> CoreResult<()> {
        self.output.write_prepare(self.identifier, timestamp)
    }

    /// Commits as `tx_id`, stamped with the current time.
    pub fn commit(&mut self, two_phase: bool, tx_id: TransactionId) -> CoreResult<()> {
        self.commit_at(two_phase, tx_id, now_millis())
    }

    /// Commits as `tx_id`, stamped with `timestamp`.
    pub fn commit_at(
        &mut self,
        two_phase: bool,
        tx_id: TransactionId,
        timestamp: u64,
    ) -> CoreResult<()> {
        let phase = CommitPhase::from_two_phase(two_phase);
        self.output
            .write_commit(self.identifier, phase, tx_id, timestamp)
    }

    /// Marks every entry of the transaction written.
    pub fn done(&mut self) -> CoreResult<()> {
        self.output.write_done(self.identifier)
    }

    // Tokens with names

    /// Writes a new property key named `key`, stored in `dynamic_ids`.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if `dynamic_ids` is empty or does not
    /// match the encoded length of `key`.
    pub fn property_key(&mut self, id: u32, key: &str, dynamic_ids: &[u64]) -> CoreResult<()> {
        let record = self
            .names
            .attach(PropertyKeyTokenRecord::new(id), dynamic_ids, key)?;
        self.write(Command::PropertyKeyToken(record))
    }

    /// Writes a new label named `name`, stored in `dynamic_ids`.
    pub fn label(&mut self, id: u32, name: &str, dynamic_ids: &[u64]) -> CoreResult<()> {
        let record = self.names.attach(TokenRecord::new(id), dynamic_ids, name)?;
        self.write(Command::LabelToken(record))
    }

    /// Writes a new relationship type named `name`, stored in `dynamic_ids`.
    pub fn relationship_type(
        &mut self,
        id: u32,
        name: &str,
        dynamic_ids: &[u64],
    ) -> CoreResult<()> {
        let record = self.names.attach(TokenRecord::new(id), dynamic_ids, name)?;
        self.write(Command::RelationshipTypeToken(record))
    }

    // Creation

    /// Writes a node created by this transaction.
    ///
    /// The before-state is a free slot with empty chains.
    pub fn create_node(&mut self, mut node: NodeRecord) -> CoreResult<()> {
        node.set_created();
        let before = NodeRecord::new(node.id);
        self.update_node(before, node)
    }

    /// Writes a relationship created by this transaction.
    pub fn create_relationship(&mut self, mut relationship: RelationshipRecord) -> CoreResult<()> {
        relationship.set_created();
        self.update_relationship(relationship)
    }

    /// Writes a relationship group created by this transaction.
    pub fn create_relationship_group(
        &mut self,
        mut group: RelationshipGroupRecord,
    ) -> CoreResult<()> {
        group.set_created();
        self.update_relationship_group(group)
    }

    /// Writes a property record created by this transaction.
    ///
    /// The before-state is an empty record with the same id and owner.
    pub fn create_property(&mut self, mut property: PropertyRecord) -> CoreResult<()> {
        property.set_created();
        let before = PropertyRecord::owned_by(property.id, property.owner);
        self.update_property(before, property)
    }

    /// Writes a label token created by this transaction.
    pub fn create_label_token(&mut self, mut token: TokenRecord) -> CoreResult<()> {
        token.set_created();
        self.update_label_token(token)
    }

    /// Writes a property key token created by this transaction.
    pub fn create_property_key_token(&mut self, mut token: PropertyKeyTokenRecord) -> CoreResult<()> {
        token.set_created();
        self.update_property_key_token(token)
    }

    /// Writes a relationship type token created by this transaction.
    pub fn create_relationship_type_token(&mut self, mut token: TokenRecord) -> CoreResult<()> {
        token.set_created();
        self.update_relationship_type_token(token)
    }

    /// Writes a schema rule created by this transaction.
    pub fn create_schema(
        &mut self,
        before: Vec<DynamicRecord>,
        mut after: Vec<DynamicRecord>,
    ) -> CoreResult<()> {
        for record in &mut after {
            record.set_created();
        }
        self.update_schema(before, after)
    }

    // Update

    /// Writes a node change.
    pub fn update_node(&mut self, before: NodeRecord, mut after: NodeRecord) -> CoreResult<()> {
        after.set_in_use(true);
        self.add_node(before, after)
    }

    /// Writes a relationship change.
    pub fn update_relationship(&mut self, mut relationship: RelationshipRecord) -> CoreResult<()> {
        relationship.set_in_use(true);
        self.add_relationship(relationship)
    }

    /// Writes a relationship group change.
    pub fn update_relationship_group(
        &mut self,
        mut group: RelationshipGroupRecord,
    ) -> CoreResult<()> {
        group.set_in_use(true);
        self.add_relationship_group(group)
    }

    /// Writes a property record change.
    pub fn update_property(
        &mut self,
        before: PropertyRecord,
        mut after: PropertyRecord,
    ) -> CoreResult<()> {
        after.set_in_use(true);
        self.add_property(before, after)
    }

    /// Writes a label token change.
    pub fn update_label_token(&mut self, mut token: TokenRecord) -> CoreResult<()> {
        token.set_in_use(true);
        self.add_label_token(token)
    }

    /// Writes a property key token change.
    pub fn update_property_key_token(&mut self, mut token: PropertyKeyTokenRecord) -> CoreResult<()> {
        token.set_in_use(true);
        self.add_property_key_token(token)
    }

    /// Writes a relationship type token change.
    pub fn update_relationship_type_token(&mut self, mut token: TokenRecord) -> CoreResult<()> {
        token.set_in_use(true);
        self.add_relationship_type_token(token)
    }

    /// Writes a schema rule change; every after-state block is marked in use.
    pub fn update_schema(
        &mut self,
        before: Vec<DynamicRecord>,
        mut after: Vec<DynamicRecord>,
    ) -> CoreResult<()> {
        for record in &mut after {
            record.set_in_use(true);
        }
        self.write(Command::SchemaRule { before, after })
    }

    /// Writes a store header change.
    pub fn update_store_header(&mut self, header: StoreHeaderRecord) -> CoreResult<()> {
        self.add_store_header(header)
    }

    // Deletion

    /// Writes the removal of `node`.
    ///
    /// The command's before-state is `node` marked not in use; its
    /// after-state is a free slot with empty chains.
    pub fn delete_node(&mut self, mut node: NodeRecord) -> CoreResult<()> {
        node.set_in_use(false);
        let after = NodeRecord::new(node.id);
        self.add_node(node, after)
    }

    /// Writes the removal of a relationship.
    pub fn delete_relationship(&mut self, mut relationship: RelationshipRecord) -> CoreResult<()> {
        relationship.set_in_use(false);
        self.add_relationship(relationship)
    }

    /// Writes the removal of a relationship group.
    pub fn delete_relationship_group(
        &mut self,
        mut group: RelationshipGroupRecord,
    ) -> CoreResult<()> {
        group.set_in_use(false);
        self.add_relationship_group(group)
    }

    /// Writes the removal of a property record.
    pub fn delete_property(
        &mut self,
        before: PropertyRecord,
        mut after: PropertyRecord,
    ) -> CoreResult<()> {
        after.set_in_use(false);
        self.add_property(before, after)
    }

    // Raw adds

    /// Forwards a node command as given.
    pub fn add_node(&mut self, before: NodeRecord, after: NodeRecord) -> CoreResult<()> {
        self.write(Command::Node { before, after })
    }

    /// Forwards a relationship command as given.
    pub fn add_relationship(&mut self, relationship: RelationshipRecord) -> CoreResult<()> {
        self.write(Command::Relationship(relationship))
    }

    /// Forwards a relationship group command as given.
    pub fn add_relationship_group(&mut self, group: RelationshipGroupRecord) -> CoreResult<()> {
        self.write(Command::RelationshipGroup(group))
    }

    /// Forwards a property command as given.
    pub fn add_property(&mut self, before: PropertyRecord, after: PropertyRecord) -> CoreResult<()> {
        self.write(Command::Property { before, after })
    }

    /// Forwards a label token command as given.
    pub fn add_label_token(&mut self, token: TokenRecord) -> CoreResult<()> {
        self.write(Command::LabelToken(token))
    }

    /// Forwards a property key token command as given.
    pub fn add_property_key_token(&mut self, token: PropertyKeyTokenRecord) -> CoreResult<()> {
        self.write(Command::PropertyKeyToken(token))
    }

    /// Forwards a relationship type token command as given.
    pub fn add_relationship_type_token(&mut self, token: TokenRecord) -> CoreResult<()> {
        self.write(Command::RelationshipTypeToken(token))
    }

    /// Forwards a store header command as given.
    pub fn add_store_header(&mut self, header: StoreHeaderRecord) -> CoreResult<()> {
        self.write(Command::StoreHeader(header))
    }

    fn write(&mut self, command: Command) -> CoreResult<()> {
        trace!(
            identifier = self.identifier,
            kind = command.kind().name(),
            id = command.record_id(),
            "write command"
        );
        self.output.write_command(self.identifier, command)
    }
}
