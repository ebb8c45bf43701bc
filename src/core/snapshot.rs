//! Store snapshot persistence.
//!
//! Each persisted store is serialized to JSON and written under its own key in
//! the `store_snapshots` table. Loading a key that was never written returns
//! `None` so the caller can seed fresh state. There is no versioning: a
//! snapshot whose shape no longer matches fails with a serialization error.

use crate::{
    entities::{StoreSnapshot, store_snapshot},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use tracing::{debug, instrument};

/// The independently persisted stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Cart, comparison, wishlist, profile, addresses, preferences, catalog
    Market,
    /// Ride, wallet and agent account
    Services,
    /// Parcel book
    Parcels,
}

impl StoreKey {
    /// Key under which the store is saved.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Market => "superapp.market",
            Self::Services => "superapp.services",
            Self::Parcels => "superapp.parcels",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads and deserializes a store snapshot.
///
/// # Returns
/// * `Ok(Some(value))` - Snapshot found and parsed
/// * `Ok(None)` - Nothing saved under this key yet
#[instrument(skip(db))]
pub async fn load_snapshot<C, T>(db: &C, key: StoreKey) -> Result<Option<T>>
where
    C: ConnectionTrait,
    T: DeserializeOwned,
{
    let row = StoreSnapshot::find()
        .filter(store_snapshot::Column::Key.eq(key.as_str()))
        .one(db)
        .await?;

    match row {
        Some(row) => {
            debug!(bytes = row.value.len(), "Snapshot loaded");
            Ok(Some(serde_json::from_str(&row.value)?))
        }
        None => {
            debug!("No snapshot stored");
            Ok(None)
        }
    }
}

/// Serializes a store and writes it under its key, replacing any previous snapshot.
#[instrument(skip(db, value))]
pub async fn save_snapshot<C, T>(db: &C, key: StoreKey, value: &T) -> Result<()>
where
    C: ConnectionTrait,
    T: Serialize,
{
    let json = serde_json::to_string(value)?;
    let now = Utc::now();
    let bytes = json.len();

    let existing = StoreSnapshot::find()
        .filter(store_snapshot::Column::Key.eq(key.as_str()))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active_model: store_snapshot::ActiveModel = row.into();
        active_model.value = Set(json);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_row = store_snapshot::ActiveModel {
            key: Set(key.as_str().to_string()),
            value: Set(json),
            updated_at: Set(now),
            ..Default::default()
        };
        new_row.insert(db).await?;
    }

    debug!(bytes, "Snapshot saved");
    Ok(())
}

/// Deletes a snapshot so the store is seeded afresh on next load.
#[instrument(skip(db))]
pub async fn clear_snapshot<C>(db: &C, key: StoreKey) -> Result<()>
where
    C: ConnectionTrait,
{
    StoreSnapshot::delete_many()
        .filter(store_snapshot::Column::Key.eq(key.as_str()))
        .exec(db)
        .await?;
    Ok(())
}
