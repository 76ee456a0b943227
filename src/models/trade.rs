use serde::{Deserialize, Serialize};

/// A category of construction work (plumbing, roofing, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub name: String,
}

/// Trade as supplied by a collaborator, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
