//! Store snapshot entity - Stores one serialized store per key.
//!
//! Each row holds the JSON snapshot of one of the persisted stores
//! (market, services, parcels). Rows are overwritten in place; there is no
//! history and no schema version.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Store snapshot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "store_snapshots")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Store key (e.g. `"superapp.market"`)
    #[sea_orm(unique)]
    pub key: String,
    /// JSON-serialized store contents
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this snapshot was last written
    pub updated_at: DateTimeUtc,
}

/// `StoreSnapshot` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
