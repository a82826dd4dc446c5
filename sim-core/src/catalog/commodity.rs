use serde::{Deserialize, Serialize};

// === COMMODITY ID ===

/// Index into the catalog's interned commodity table.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CommodityId(pub u32);

impl CommodityId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

// === COMMODITY DEFINITION ===

/// A tradeable (or facility) good. Definitions are interned in the catalog
/// and referenced by `CommodityId` from every inventory line and order;
/// they are never duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityDef {
    pub id: CommodityId,
    /// Stable string key, unique across the catalog.
    pub key: String,
    pub name: String,
    /// Non-transportable commodities (facilities) cannot be carried by ships.
    pub transportable: bool,
    pub description: String,
}

impl CommodityDef {
    pub fn new(
        id: CommodityId,
        key: impl Into<String>,
        name: impl Into<String>,
        transportable: bool,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            transportable,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
