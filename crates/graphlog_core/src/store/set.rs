//! The full set of record stores behind one handle.

use super::{ApplyMode, InMemoryRecordStore, RecordStore, RecoveryFlag};
use crate::command::Command;
use crate::error::CoreResult;
use crate::record::{
    DynamicRecord, NodeRecord, PropertyKeyTokenRecord, PropertyRecord, RelationshipGroupRecord,
    RelationshipRecord, StoreHeaderRecord, TokenRecord,
};

/// Every store a command can touch, plus the store header and the shared
/// recovery flag.
pub struct StoreSet {
    nodes: Box<dyn RecordStore<NodeRecord>>,
    relationships: Box<dyn RecordStore<RelationshipRecord>>,
    relationship_groups: Box<dyn RecordStore<RelationshipGroupRecord>>,
    properties: Box<dyn RecordStore<PropertyRecord>>,
    label_tokens: Box<dyn RecordStore<TokenRecord>>,
    property_key_tokens: Box<dyn RecordStore<PropertyKeyTokenRecord>>,
    relationship_type_tokens: Box<dyn RecordStore<TokenRecord>>,
    schema: Box<dyn RecordStore<DynamicRecord>>,
    header: StoreHeaderRecord,
    recovery: RecoveryFlag,
}

impl StoreSet {
    /// Creates a set of empty in-memory stores.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            nodes: Box::new(InMemoryRecordStore::new()),
            relationships: Box::new(InMemoryRecordStore::new()),
            relationship_groups: Box::new(InMemoryRecordStore::new()),
            properties: Box::new(InMemoryRecordStore::new()),
            label_tokens: Box::new(InMemoryRecordStore::new()),
            property_key_tokens: Box::new(InMemoryRecordStore::new()),
            relationship_type_tokens: Box::new(InMemoryRecordStore::new()),
            schema: Box::new(InMemoryRecordStore::new()),
            header: StoreHeaderRecord::new(),
            recovery: RecoveryFlag::new(),
        }
    }

    /// Replaces the node store.
    #[must_use]
    pub fn with_node_store(mut self, store: Box<dyn RecordStore<NodeRecord>>) -> Self {
        self.nodes = store;
        self
    }

    /// Replaces the relationship store.
    #[must_use]
    pub fn with_relationship_store(
        mut self,
        store: Box<dyn RecordStore<RelationshipRecord>>,
    ) -> Self {
        self.relationships = store;
        self
    }

    /// Replaces the relationship group store.
    #[must_use]
    pub fn with_relationship_group_store(
        mut self,
        store: Box<dyn RecordStore<RelationshipGroupRecord>>,
    ) -> Self {
        self.relationship_groups = store;
        self
    }

    /// Replaces the property store.
    #[must_use]
    pub fn with_property_store(mut self, store: Box<dyn RecordStore<PropertyRecord>>) -> Self {
        self.properties = store;
        self
    }

    /// Replaces the label token store.
    #[must_use]
    pub fn with_label_token_store(mut self, store: Box<dyn RecordStore<TokenRecord>>) -> Self {
        self.label_tokens = store;
        self
    }

    /// Replaces the property key token store.
    #[must_use]
    pub fn with_property_key_token_store(
        mut self,
        store: Box<dyn RecordStore<PropertyKeyTokenRecord>>,
    ) -> Self {
        self.property_key_tokens = store;
        self
    }

    /// Replaces the relationship type token store.
    #[must_use]
    pub fn with_relationship_type_token_store(
        mut self,
        store: Box<dyn RecordStore<TokenRecord>>,
    ) -> Self {
        self.relationship_type_tokens = store;
        self
    }

    /// Replaces the schema store.
    #[must_use]
    pub fn with_schema_store(mut self, store: Box<dyn RecordStore<DynamicRecord>>) -> Self {
        self.schema = store;
        self
    }

    /// Shares `flag` instead of the set's own recovery flag.
    #[must_use]
    pub fn with_recovery_flag(mut self, flag: RecoveryFlag) -> Self {
        self.recovery = flag;
        self
    }

    /// The node store.
    pub fn nodes(&self) -> &dyn RecordStore<NodeRecord> {
        self.nodes.as_ref()
    }

    /// The relationship store.
    pub fn relationships(&self) -> &dyn RecordStore<RelationshipRecord> {
        self.relationships.as_ref()
    }

    /// The relationship group store.
    pub fn relationship_groups(&self) -> &dyn RecordStore<RelationshipGroupRecord> {
        self.relationship_groups.as_ref()
    }

    /// The property store.
    pub fn properties(&self) -> &dyn RecordStore<PropertyRecord> {
        self.properties.as_ref()
    }

    /// The label token store.
    pub fn label_tokens(&self) -> &dyn RecordStore<TokenRecord> {
        self.label_tokens.as_ref()
    }

    /// The property key token store.
    pub fn property_key_tokens(&self) -> &dyn RecordStore<PropertyKeyTokenRecord> {
        self.property_key_tokens.as_ref()
    }

    /// The relationship type token store.
    pub fn relationship_type_tokens(&self) -> &dyn RecordStore<TokenRecord> {
        self.relationship_type_tokens.as_ref()
    }

    /// The schema store.
    pub fn schema(&self) -> &dyn RecordStore<DynamicRecord> {
        self.schema.as_ref()
    }

    /// The store header.
    pub fn header(&self) -> &StoreHeaderRecord {
        &self.header
    }

    /// Points the graph property chain at `next_prop`.
    pub fn set_graph_next_prop(&mut self, next_prop: i64) {
        self.header.next_prop = next_prop;
    }

    /// The recovery flag shared with this set's stores and observers.
    pub fn recovery_flag(&self) -> &RecoveryFlag {
        &self.recovery
    }

    /// Writes the after-state of `command` to its store.
    ///
    /// Schema rule chains are written one dynamic record at a time; the
    /// first failing record stops the rest.
    ///
    /// # Errors
    ///
    /// Propagates the store's rejection or failure unchanged.
    pub fn apply(&mut self, command: &Command, mode: ApplyMode) -> CoreResult<()> {
        match command {
            Command::Node { after, .. } => self.nodes.update_record(after, mode),
            Command::Relationship(record) => self.relationships.update_record(record, mode),
            Command::RelationshipGroup(record) => {
                self.relationship_groups.update_record(record, mode)
            }
            Command::Property { after, .. } => self.properties.update_record(after, mode),
            Command::LabelToken(record) => self.label_tokens.update_record(record, mode),
            Command::PropertyKeyToken(record) => {
                self.property_key_tokens.update_record(record, mode)
            }
            Command::RelationshipTypeToken(record) => {
                self.relationship_type_tokens.update_record(record, mode)
            }
            Command::SchemaRule { after, .. } => {
                for record in after {
                    self.schema.update_record(record, mode)?;
                }
                Ok(())
            }
            Command::StoreHeader(record) => {
                self.set_graph_next_prop(record.next_prop);
                Ok(())
            }
        }
    }

    /// In-use slot counts per store, in a fixed order.
    pub fn in_use_counts(&self) -> CoreResult<Vec<(&'static str, usize)>> {
        Ok(vec![
            ("node", self.nodes.in_use_count()?),
            ("relationship", self.relationships.in_use_count()?),
            ("relationship_group", self.relationship_groups.in_use_count()?),
            ("property", self.properties.in_use_count()?),
            ("label_token", self.label_tokens.in_use_count()?),
            ("property_key_token", self.property_key_tokens.in_use_count()?),
            (
                "relationship_type_token",
                self.relationship_type_tokens.in_use_count()?,
            ),
            ("schema", self.schema.in_use_count()?),
        ])
    }
}

impl Default for StoreSet {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSet")
            .field("header", &self.header)
            .field("recovering", &self.recovery.is_raised())
            .finish_non_exhaustive()
    }
}
