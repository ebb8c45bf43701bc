//! Entity module - Contains the SeaORM entity definitions for the database.
//! The superapp persists whole stores as JSON snapshots, so a single
//! key-value table is enough.

pub mod store_snapshot;

pub use store_snapshot::{
    Column as StoreSnapshotColumn, Entity as StoreSnapshot, Model as StoreSnapshotModel,
};
