//! Parcel courier business logic.
//!
//! A [`Parcel`] moves through `Pending → Picked Up → In Transit → Out for
//! Delivery → Delivered`, or ends in `Cancelled`. Every status change appends a
//! [`StatusLog`] entry in the same call, so the last log entry always carries
//! the parcel's current status. Parcels are never deleted.

use crate::core::wallet::validate_amount;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

/// Flat fee charged for every parcel.
pub const BASE_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);
/// Price per kilogram.
pub const RATE_PER_KG: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
/// Extra handling charge for fragile and electronic goods.
pub const HANDLING_SURCHARGE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

const TRACKING_PREFIX: &str = "TRK-";
const TRACKING_CODE_ATTEMPTS: usize = 64;

/// What is being shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageType {
    /// Letters and papers
    Document,
    /// General goods
    Box,
    /// Needs careful handling
    Fragile,
    /// Devices
    Electronics,
}

impl PackageType {
    const fn needs_handling(self) -> bool {
        matches!(self, Self::Fragile | Self::Electronics)
    }
}

/// Courier status of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParcelStatus {
    /// Booked, waiting for pickup
    Pending,
    /// Collected from the sender
    #[serde(rename = "Picked Up")]
    PickedUp,
    /// Moving between hubs
    #[serde(rename = "In Transit")]
    InTransit,
    /// With the last-mile courier
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    /// Handed to the receiver
    Delivered,
    /// Withdrawn before delivery
    Cancelled,
}

impl ParcelStatus {
    /// Whether no further courier progress is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for ParcelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::PickedUp => "Picked Up",
            Self::InTransit => "In Transit",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// A person on either end of a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Full name
    pub name: String,
    /// Phone number, also used to look up a person's parcels
    pub phone: String,
    /// Pickup or drop-off address
    pub address: String,
}

/// One entry of a parcel's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLog {
    /// Status entered
    pub status: ParcelStatus,
    /// When it was entered
    pub timestamp: DateTime<Utc>,
    /// Free-text note
    pub note: String,
}

/// Input for booking a parcel.
#[derive(Debug, Clone)]
pub struct NewParcel {
    /// Sender details
    pub sender: Contact,
    /// Receiver details
    pub receiver: Contact,
    /// Kind of package
    pub package_type: PackageType,
    /// Weight in kilograms
    pub weight_kg: Decimal,
}

/// A booked shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    /// Internal identifier
    pub id: Uuid,
    /// Code shared with sender and receiver, e.g. `TRK-042317`
    pub tracking_code: String,
    /// Sender details
    pub sender: Contact,
    /// Receiver details
    pub receiver: Contact,
    /// Kind of package
    pub package_type: PackageType,
    /// Weight in kilograms
    pub weight_kg: Decimal,
    /// Price fixed at booking time
    pub price: Decimal,
    status: ParcelStatus,
    logs: Vec<StatusLog>,
    /// Booking time
    pub created_at: DateTime<Utc>,
}

impl Parcel {
    /// Current status.
    #[must_use]
    pub const fn status(&self) -> ParcelStatus {
        self.status
    }

    /// Status history, oldest first.
    #[must_use]
    pub fn logs(&self) -> &[StatusLog] {
        &self.logs
    }

    /// Checks that the history is non-empty and ends in the current status.
    fn check_history(&self) -> std::result::Result<(), String> {
        match self.logs.last() {
            None => Err(format!("parcel {} has no status history", self.tracking_code)),
            Some(last) if last.status != self.status => Err(format!(
                "parcel {} is '{}' but its history ends in '{}'",
                self.tracking_code, self.status, last.status
            )),
            Some(_) => Ok(()),
        }
    }

    fn transition(&mut self, status: ParcelStatus, note: impl Into<String>) {
        let note = note.into();
        info!(
            tracking_code = %self.tracking_code,
            from = %self.status,
            to = %status,
            note = %note,
            "Parcel status changed"
        );
        self.status = status;
        self.logs.push(StatusLog {
            status,
            timestamp: Utc::now(),
            note,
        });
    }
}

/// Price of a shipment: base fee plus weight charge plus handling surcharge.
#[must_use]
pub fn quote_price(package_type: PackageType, weight_kg: Decimal) -> Decimal {
    let surcharge = if package_type.needs_handling() {
        HANDLING_SURCHARGE
    } else {
        Decimal::ZERO
    };
    weight_kg
        .saturating_mul(RATE_PER_KG)
        .saturating_add(BASE_FEE)
        .saturating_add(surcharge)
}

fn validate_contact(
    contact: &Contact,
    name_field: &'static str,
    phone_field: &'static str,
) -> Result<()> {
    if contact.name.trim().is_empty() {
        return Err(Error::MissingField { field: name_field });
    }
    if contact.phone.trim().is_empty() {
        return Err(Error::MissingField { field: phone_field });
    }
    Ok(())
}

/// All parcels known to this session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelBook {
    parcels: Vec<Parcel>,
}

impl ParcelBook {
    /// Every parcel, in booking order.
    #[must_use]
    pub fn parcels(&self) -> &[Parcel] {
        &self.parcels
    }

    /// Verifies a book read back from storage: every parcel has a status
    /// history ending in its current status, and tracking codes are unique.
    ///
    /// # Errors
    /// Returns `Error::CorruptSnapshot` naming the first offending parcel.
    pub fn check_integrity(&self) -> Result<()> {
        let corrupt = |message: String| Error::CorruptSnapshot {
            store: "parcels",
            message,
        };
        let mut seen = HashSet::new();
        for parcel in &self.parcels {
            parcel.check_history().map_err(corrupt)?;
            if !seen.insert(parcel.tracking_code.as_str()) {
                return Err(corrupt(format!(
                    "tracking code {} is used twice",
                    parcel.tracking_code
                )));
            }
        }
        Ok(())
    }

    /// Books a parcel in `Pending` state with a fresh tracking code.
    pub fn create(&mut self, request: NewParcel) -> Result<&Parcel> {
        validate_contact(&request.sender, "sender name", "sender phone")?;
        validate_contact(&request.receiver, "receiver name", "receiver phone")?;
        validate_amount(request.weight_kg)?;

        let tracking_code = self.unused_tracking_code()?;
        let price = quote_price(request.package_type, request.weight_kg);
        let now = Utc::now();
        let parcel = Parcel {
            id: Uuid::new_v4(),
            tracking_code,
            sender: request.sender,
            receiver: request.receiver,
            package_type: request.package_type,
            weight_kg: request.weight_kg,
            price,
            status: ParcelStatus::Pending,
            logs: vec![StatusLog {
                status: ParcelStatus::Pending,
                timestamp: now,
                note: "Parcel booked".to_string(),
            }],
            created_at: now,
        };
        info!(
            tracking_code = %parcel.tracking_code,
            %price,
            package_type = ?parcel.package_type,
            "Parcel created"
        );

        self.parcels.push(parcel);
        let index = self.parcels.len() - 1;
        Ok(&self.parcels[index])
    }

    fn unused_tracking_code(&self) -> Result<String> {
        let mut rng = rand::thread_rng();
        for _ in 0..TRACKING_CODE_ATTEMPTS {
            let suffix: u32 = rng.gen_range(0..1_000_000);
            let code = format!("{TRACKING_PREFIX}{suffix:06}");
            if self.find_by_tracking_code(&code).is_none() {
                return Ok(code);
            }
        }
        warn!(parcels = self.parcels.len(), "Tracking code space exhausted");
        Err(Error::TrackingCodeExhausted)
    }

    /// Finds a parcel by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Parcel> {
        self.parcels.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Parcel> {
        self.parcels
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound {
                entity: "parcel",
                id: id.to_string(),
            })
    }

    /// Finds a parcel by tracking code, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find_by_tracking_code(&self, code: &str) -> Option<&Parcel> {
        let code = code.trim();
        self.parcels
            .iter()
            .find(|p| p.tracking_code.eq_ignore_ascii_case(code))
    }

    /// Parcels sent from this phone number.
    pub fn sent_by<'a>(&'a self, phone: &'a str) -> impl Iterator<Item = &'a Parcel> {
        self.parcels.iter().filter(move |p| p.sender.phone == phone)
    }

    /// Parcels addressed to this phone number.
    pub fn addressed_to<'a>(&'a self, phone: &'a str) -> impl Iterator<Item = &'a Parcel> {
        self.parcels.iter().filter(move |p| p.receiver.phone == phone)
    }

    /// Parcels not yet delivered or cancelled.
    pub fn active(&self) -> impl Iterator<Item = &Parcel> {
        self.parcels.iter().filter(|p| !p.status.is_terminal())
    }

    /// Sets any status on a parcel and logs it. Used by administrators; no
    /// transition rules apply.
    pub fn update_status(
        &mut self,
        id: Uuid,
        status: ParcelStatus,
        note: &str,
    ) -> Result<&Parcel> {
        let parcel = self.get_mut(id)?;
        parcel.transition(status, note);
        Ok(&*parcel)
    }

    /// Sender withdraws a parcel that has not been picked up yet.
    pub fn cancel(&mut self, id: Uuid) -> Result<&Parcel> {
        let parcel = self.get_mut(id)?;
        if parcel.status != ParcelStatus::Pending {
            return Err(Error::InvalidTransition {
                entity: "parcel",
                from: parcel.status.to_string(),
                to: ParcelStatus::Cancelled.to_string(),
            });
        }
        parcel.transition(ParcelStatus::Cancelled, "Cancelled by sender");
        Ok(&*parcel)
    }

    /// Receiver confirms a parcel that is out for delivery has arrived.
    pub fn confirm_delivery(&mut self, id: Uuid) -> Result<&Parcel> {
        let parcel = self.get_mut(id)?;
        if parcel.status != ParcelStatus::OutForDelivery {
            return Err(Error::InvalidTransition {
                entity: "parcel",
                from: parcel.status.to_string(),
                to: ParcelStatus::Delivered.to_string(),
            });
        }
        parcel.transition(ParcelStatus::Delivered, "Receipt confirmed by receiver");
        Ok(&*parcel)
    }
}
