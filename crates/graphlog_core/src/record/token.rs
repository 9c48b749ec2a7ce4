//! Label, relationship-type and property-key tokens.

use super::{impl_store_record, DynamicRecord, NULL_REFERENCE};

/// A label or relationship-type token slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// Token id.
    pub id: u32,
    /// Whether the slot holds a live token.
    pub in_use: bool,
    /// Set when this transaction created the token.
    pub created: bool,
    /// First block of the name chain.
    pub name_id: i64,
    /// Name chain blocks written together with the token.
    pub name_records: Vec<DynamicRecord>,
}

impl TokenRecord {
    /// A not-in-use token without a name.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            in_use: false,
            created: false,
            name_id: NULL_REFERENCE,
            name_records: Vec::new(),
        }
    }

    /// Concatenates the name chain back into the stored bytes.
    #[must_use]
    pub fn name_bytes(&self) -> Vec<u8> {
        self.name_records
            .iter()
            .flat_map(|block| block.data.iter().copied())
            .collect()
    }
}

impl_store_record!(TokenRecord, "token");

/// A property-key token slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKeyTokenRecord {
    /// Common token fields.
    pub token: TokenRecord,
    /// Number of properties using this key.
    pub property_count: u32,
}

impl PropertyKeyTokenRecord {
    /// A not-in-use key token without a name.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            token: TokenRecord::new(id),
            property_count: 0,
        }
    }
}

impl super::StoreRecord for PropertyKeyTokenRecord {
    const STORE: &'static str = "property key token";

    fn id(&self) -> u64 {
        u64::from(self.token.id)
    }

    fn in_use(&self) -> bool {
        self.token.in_use
    }

    fn set_in_use(&mut self, in_use: bool) {
        self.token.in_use = in_use;
    }

    fn is_created(&self) -> bool {
        self.token.created
    }

    fn set_created(&mut self) {
        self.token.created = true;
    }
}

impl AsMut<TokenRecord> for TokenRecord {
    fn as_mut(&mut self) -> &mut TokenRecord {
        self
    }
}

impl AsMut<TokenRecord> for PropertyKeyTokenRecord {
    fn as_mut(&mut self) -> &mut TokenRecord {
        &mut self.token
    }
}
