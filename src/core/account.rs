//! User profile, roles, saved addresses and preferences.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper and rider
    #[default]
    Customer,
    /// Marketplace seller
    Vendor,
    /// Ride-hailing driver
    Driver,
    /// Mobile-money cash agent
    Agent,
    /// Operations staff
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Driver => "driver",
            Self::Agent => "agent",
            Self::Admin => "admin",
        };
        f.write_str(label)
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Phone number
    pub phone: String,
    /// Assigned role
    #[serde(default)]
    pub role: Role,
}

/// Fails with [`Error::Unauthorized`] unless a user with exactly `required` is signed in.
pub fn require_role(user: Option<&User>, required: Role) -> Result<()> {
    match user {
        Some(u) if u.role == required => Ok(()),
        other => {
            warn!(
                user = ?other.map(|u| &u.id),
                role = ?other.map(|u| u.role),
                %required,
                "Role check failed"
            );
            Err(Error::Unauthorized {
                required: required.to_string(),
            })
        }
    }
}

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Identifier
    pub id: Uuid,
    /// Short name, e.g. "Home"
    pub label: String,
    /// Street and building
    pub line: String,
    /// City
    pub city: String,
}

/// Display and notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// ISO currency code used for display
    pub currency: String,
    /// UI language tag
    pub language: String,
    /// Whether push notifications are enabled
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            currency: "ETB".to_string(),
            language: "en".to_string(),
            notifications: true,
        }
    }
}

/// Saved addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBook {
    addresses: Vec<Address>,
}

impl AddressBook {
    /// All addresses in the order they were saved.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Saves an address and returns its id.
    pub fn add(&mut self, label: &str, line: &str, city: &str) -> Result<Uuid> {
        if line.trim().is_empty() {
            return Err(Error::MissingField { field: "address" });
        }
        let id = Uuid::new_v4();
        self.addresses.push(Address {
            id,
            label: label.trim().to_string(),
            line: line.trim().to_string(),
            city: city.trim().to_string(),
        });
        debug!(%id, label, "Address saved");
        Ok(id)
    }

    /// Deletes an address. Returns whether it existed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.addresses.len();
        self.addresses.retain(|a| a.id != id);
        before != self.addresses.len()
    }
}
