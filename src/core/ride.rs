//! Ride-hailing lifecycle.
//!
//! A [`Ride`] is the single in-flight ride request of the session. It moves
//! `idle → searching → arriving → in-progress → completed` and returns to `idle`
//! on completion or cancellation. Driver and route data only exist once a
//! driver has been matched, and are cleared again when the ride resets.
//!
//! Every request gets a fresh request id. Background matching tasks carry the
//! id they were started for and are ignored once it no longer matches, so a
//! cancelled or replaced request is never advanced by a stale task.

use crate::core::wallet::{Category, Wallet, validate_amount};
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

/// Fare multiplier while surge pricing is active.
pub const SURGE_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// Vehicle classes offered for a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    /// Motorbike taxi
    Bike,
    /// Three-wheeler
    Auto,
    /// Standard car
    Car,
    /// Premium sedan
    Premium,
    /// Six-seater
    Xl,
}

impl VehicleType {
    /// Price multiplier applied to the base fare.
    #[must_use]
    pub const fn price_multiplier(self) -> Decimal {
        match self {
            Self::Bike => Decimal::from_parts(6, 0, 0, false, 1),
            Self::Auto => Decimal::from_parts(8, 0, 0, false, 1),
            Self::Car => Decimal::ONE,
            Self::Xl => Decimal::from_parts(15, 0, 0, false, 1),
            Self::Premium => Decimal::from_parts(18, 0, 0, false, 1),
        }
    }
}

/// Where the ride is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RideStatus {
    /// No ride requested
    #[default]
    Idle,
    /// Looking for a driver
    Searching,
    /// Driver matched and on the way to pickup
    Arriving,
    /// Passenger on board
    InProgress,
    /// Dropped off and paid
    Completed,
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Arriving => "arriving",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

/// The driver assigned to a ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Display name
    pub name: String,
    /// Average rating out of 5
    pub rating: f32,
    /// Vehicle make, model and colour
    pub vehicle: String,
    /// Licence plate
    pub plate: String,
    /// Whether identity documents have been checked
    pub verified: bool,
    /// Contact number
    pub phone: String,
    /// Last known position
    pub location: GeoPoint,
}

/// Road conditions along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficCondition {
    /// Free-flowing
    Light,
    /// Some slowdowns
    Moderate,
    /// Congested
    Heavy,
}

/// One way of getting from pickup to destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOption {
    /// Name shown to the rider, e.g. "via Ring Road"
    pub label: String,
    /// Length in kilometres
    pub distance_km: f64,
    /// Expected travel time in minutes
    pub duration_min: u32,
    /// Traffic along the way
    pub traffic: TrafficCondition,
}

/// Route chosen for a ride, with the alternatives that were considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    /// Length in kilometres
    pub distance_km: f64,
    /// Expected travel time in minutes
    pub duration_min: u32,
    /// Traffic along the way
    pub traffic: TrafficCondition,
    /// Other routes, possibly empty
    #[serde(default)]
    pub alternatives: Vec<RouteOption>,
}

/// Summary of a finished ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideReceipt {
    /// Request the receipt belongs to
    pub request_id: Uuid,
    /// Ledger entry of the fare payment
    pub transaction_id: Uuid,
    /// Pickup location
    pub pickup: String,
    /// Destination
    pub destination: String,
    /// Vehicle class used
    pub vehicle: VehicleType,
    /// Driver who drove
    pub driver: Option<Driver>,
    /// Fare charged
    pub fare: Decimal,
    /// Whether surge pricing applied
    pub surge: bool,
    /// When the ride was completed
    pub completed_at: DateTime<Utc>,
}

/// Fare for a ride: base fare times vehicle multiplier, times 1.5 under surge.
#[must_use]
pub fn quote_fare(base_fare: Decimal, vehicle: VehicleType, surge: bool) -> Decimal {
    let fare = base_fare.saturating_mul(vehicle.price_multiplier());
    if surge {
        fare.saturating_mul(SURGE_MULTIPLIER)
    } else {
        fare
    }
}

/// The session's current ride request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    request_id: Option<Uuid>,
    status: RideStatus,
    pickup: String,
    destination: String,
    vehicle: Option<VehicleType>,
    surge: bool,
    fare: Option<Decimal>,
    driver: Option<Driver>,
    route: Option<RouteEstimate>,
    eta_min: Option<u32>,
    progress: Option<u8>,
    #[serde(default)]
    last_receipt: Option<RideReceipt>,
}

impl Ride {
    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> RideStatus {
        self.status
    }

    /// Identifier of the active request, `None` while idle.
    #[must_use]
    pub const fn request_id(&self) -> Option<Uuid> {
        self.request_id
    }

    /// Pickup location of the active request.
    #[must_use]
    pub fn pickup(&self) -> &str {
        &self.pickup
    }

    /// Destination of the active request.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Vehicle class of the active request.
    #[must_use]
    pub const fn vehicle(&self) -> Option<VehicleType> {
        self.vehicle
    }

    /// Whether surge pricing applies to the active request.
    #[must_use]
    pub const fn surge(&self) -> bool {
        self.surge
    }

    /// Fare quoted for the active request.
    #[must_use]
    pub const fn fare(&self) -> Option<Decimal> {
        self.fare
    }

    /// Matched driver.
    #[must_use]
    pub const fn driver(&self) -> Option<&Driver> {
        self.driver.as_ref()
    }

    /// Route estimate.
    #[must_use]
    pub const fn route(&self) -> Option<&RouteEstimate> {
        self.route.as_ref()
    }

    /// Minutes until pickup (arriving) or drop-off (in progress).
    #[must_use]
    pub const fn eta_min(&self) -> Option<u32> {
        self.eta_min
    }

    /// Trip progress in percent.
    #[must_use]
    pub const fn progress(&self) -> Option<u8> {
        self.progress
    }

    /// Receipt of the most recently completed ride.
    #[must_use]
    pub const fn last_receipt(&self) -> Option<&RideReceipt> {
        self.last_receipt.as_ref()
    }

    fn invalid(&self, to: RideStatus) -> Error {
        Error::InvalidTransition {
            entity: "ride",
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    fn check_request(
        &self,
        request_id: Uuid,
        expected: RideStatus,
        to: RideStatus,
    ) -> Result<()> {
        if self.request_id != Some(request_id) || self.status != expected {
            return Err(self.invalid(to));
        }
        Ok(())
    }

    /// Requests a ride: `idle → searching`. Returns the new request id.
    ///
    /// # Errors
    /// * `Error::MissingField` if the destination is empty
    /// * `Error::InvalidAmount` if the base fare is not positive
    /// * `Error::InvalidTransition` if a ride is already underway
    pub fn request(
        &mut self,
        pickup: &str,
        destination: &str,
        vehicle: VehicleType,
        surge: bool,
        base_fare: Decimal,
    ) -> Result<Uuid> {
        if destination.trim().is_empty() {
            return Err(Error::MissingField {
                field: "destination",
            });
        }
        validate_amount(base_fare)?;
        if self.status != RideStatus::Idle {
            return Err(self.invalid(RideStatus::Searching));
        }

        let request_id = Uuid::new_v4();
        let fare = quote_fare(base_fare, vehicle, surge);
        *self = Self {
            request_id: Some(request_id),
            status: RideStatus::Searching,
            pickup: pickup.trim().to_string(),
            destination: destination.trim().to_string(),
            vehicle: Some(vehicle),
            surge,
            fare: Some(fare),
            last_receipt: self.last_receipt.take(),
            ..Self::default()
        };
        info!(%request_id, ?vehicle, surge, %fare, "Ride requested");
        Ok(request_id)
    }

    /// Records a driver match: `searching → arriving`.
    pub fn assign_driver(
        &mut self,
        request_id: Uuid,
        driver: Driver,
        route: RouteEstimate,
        eta_min: u32,
    ) -> Result<()> {
        self.check_request(request_id, RideStatus::Searching, RideStatus::Arriving)?;
        info!(%request_id, driver = %driver.name, eta_min, "Driver assigned");
        self.status = RideStatus::Arriving;
        self.driver = Some(driver);
        self.route = Some(route);
        self.eta_min = Some(eta_min);
        Ok(())
    }

    /// Driver has arrived and the trip begins: `arriving → in-progress`.
    pub fn start_trip(&mut self, request_id: Uuid) -> Result<()> {
        self.check_request(request_id, RideStatus::Arriving, RideStatus::InProgress)?;
        self.status = RideStatus::InProgress;
        self.progress = Some(0);
        self.eta_min = self.route.as_ref().map(|r| r.duration_min);
        info!(%request_id, "Trip started");
        Ok(())
    }

    /// Updates trip progress, capped at 100%.
    pub fn update_progress(&mut self, percent: u8) -> Result<()> {
        if self.status != RideStatus::InProgress {
            return Err(self.invalid(RideStatus::InProgress));
        }
        self.progress = Some(percent.min(100));
        Ok(())
    }

    /// Updates the remaining minutes while arriving or in progress.
    pub fn update_eta(&mut self, minutes: u32) -> Result<()> {
        if !matches!(self.status, RideStatus::Arriving | RideStatus::InProgress) {
            return Err(self.invalid(self.status));
        }
        self.eta_min = Some(minutes);
        Ok(())
    }

    /// Completes the trip and charges the fare to the wallet: `in-progress → completed → idle`.
    ///
    /// The fare must be paid for the ride to complete. If the wallet cannot
    /// cover it, the ride stays in progress and the payment error is returned.
    pub fn complete(&mut self, wallet: &mut Wallet) -> Result<RideReceipt> {
        if self.status != RideStatus::InProgress {
            return Err(self.invalid(RideStatus::Completed));
        }
        let (Some(request_id), Some(vehicle), Some(fare)) =
            (self.request_id, self.vehicle, self.fare)
        else {
            return Err(self.invalid(RideStatus::Completed));
        };

        let title = format!("Ride to {}", self.destination);
        let payment = wallet.pay(fare, &title, Category::Ride).inspect_err(|e| {
            warn!(%request_id, %fare, error = %e, "Ride fare payment failed");
        })?;

        self.status = RideStatus::Completed;
        let receipt = RideReceipt {
            request_id,
            transaction_id: payment.id,
            pickup: std::mem::take(&mut self.pickup),
            destination: std::mem::take(&mut self.destination),
            vehicle,
            driver: self.driver.take(),
            fare,
            surge: self.surge,
            completed_at: Utc::now(),
        };
        info!(%request_id, %fare, "Ride completed");

        *self = Self {
            last_receipt: Some(receipt.clone()),
            ..Self::default()
        };
        Ok(receipt)
    }

    /// Cancels the active request from any non-idle state and clears driver,
    /// route, ETA and progress.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status == RideStatus::Idle {
            return Err(self.invalid(RideStatus::Idle));
        }
        info!(request_id = ?self.request_id, from = %self.status, "Ride cancelled");
        *self = Self {
            last_receipt: self.last_receipt.take(),
            ..Self::default()
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{sample_driver, sample_route};

    fn in_progress_ride(base_fare: i64, surge: bool) -> Ride {
        let mut ride = Ride::default();
        let id = ride
            .request("Bole", "Piassa", VehicleType::Car, surge, Decimal::from(base_fare))
            .unwrap();
        ride.assign_driver(id, sample_driver(), sample_route(), 4)
            .unwrap();
        ride.start_trip(id).unwrap();
        ride
    }

    #[test]
    fn test_fare_quote() {
        let base = Decimal::ONE_HUNDRED;
        assert_eq!(quote_fare(base, VehicleType::Car, false), base);
        assert_eq!(quote_fare(base, VehicleType::Xl, true), Decimal::from(225));
        assert_eq!(quote_fare(base, VehicleType::Bike, false), Decimal::from(60));
        assert_eq!(
            quote_fare(Decimal::new(12_345, 2), VehicleType::Premium, false),
            Decimal::new(22_221, 2)
        );
    }

    #[test]
    fn test_request_requires_destination() {
        let mut ride = Ride::default();
        assert!(matches!(
            ride.request("Bole", " ", VehicleType::Car, false, Decimal::ONE_HUNDRED),
            Err(Error::MissingField {
                field: "destination"
            })
        ));
        assert_eq!(ride.status(), RideStatus::Idle);
    }

    #[test]
    fn test_request_while_busy_rejected() {
        let mut ride = Ride::default();
        ride.request("Bole", "Piassa", VehicleType::Car, false, Decimal::ONE_HUNDRED)
            .unwrap();
        assert!(matches!(
            ride.request("Bole", "CMC", VehicleType::Car, false, Decimal::ONE_HUNDRED),
            Err(Error::InvalidTransition { .. })
        ));
        assert_eq!(ride.destination(), "Piassa");
    }

    #[test]
    fn test_driver_only_after_searching() {
        let mut ride = Ride::default();
        let stale = Uuid::new_v4();
        assert!(
            ride.assign_driver(stale, sample_driver(), sample_route(), 3)
                .is_err()
        );
        assert!(ride.driver().is_none());

        let id = ride
            .request("Bole", "Piassa", VehicleType::Car, false, Decimal::ONE_HUNDRED)
            .unwrap();
        assert!(ride.driver().is_none());
        assert!(ride.route().is_none());
        assert!(ride.start_trip(id).is_err());

        ride.assign_driver(id, sample_driver(), sample_route(), 3)
            .unwrap();
        assert_eq!(ride.status(), RideStatus::Arriving);
        assert_eq!(ride.eta_min(), Some(3));
        assert!(ride.route().is_some());
    }

    #[test]
    fn test_progress_and_eta_updates() {
        let mut ride = in_progress_ride(100, false);
        assert_eq!(ride.progress(), Some(0));
        assert_eq!(ride.eta_min(), Some(sample_route().duration_min));
        ride.update_progress(250).unwrap();
        assert_eq!(ride.progress(), Some(100));
        ride.update_eta(2).unwrap();
        assert_eq!(ride.eta_min(), Some(2));

        let mut idle = Ride::default();
        assert!(idle.update_progress(10).is_err());
        assert!(idle.update_eta(1).is_err());
    }

    #[test]
    fn test_complete_charges_fare_and_resets() {
        let mut wallet = Wallet::new(Decimal::from(500), Decimal::ZERO, Decimal::ZERO, 0);
        let mut ride = in_progress_ride(100, true);

        let receipt = ride.complete(&mut wallet).unwrap();
        assert_eq!(receipt.fare, Decimal::from(150));
        assert_eq!(receipt.destination, "Piassa");
        assert_eq!(wallet.balance(), Decimal::from(350));
        assert_eq!(
            wallet.find_transaction(receipt.transaction_id).unwrap().category,
            Category::Ride
        );

        assert_eq!(ride.status(), RideStatus::Idle);
        assert!(ride.driver().is_none());
        assert!(ride.route().is_none());
        assert_eq!(ride.last_receipt(), Some(&receipt));
    }

    #[test]
    fn test_complete_blocked_by_failed_payment() {
        let mut wallet = Wallet::new(Decimal::from(20), Decimal::ZERO, Decimal::ZERO, 0);
        let mut ride = in_progress_ride(100, false);
        let before = ride.clone();

        let err = ride.complete(&mut wallet).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(ride, before);
        assert_eq!(wallet.balance(), Decimal::from(20));

        wallet.top_up(Decimal::ONE_HUNDRED, crate::core::wallet::FundingMethod::Card)
            .unwrap();
        ride.complete(&mut wallet).unwrap();
        assert_eq!(ride.status(), RideStatus::Idle);
    }

    #[test]
    fn test_cancel_clears_everything() {
        let mut ride = Ride::default();
        assert!(ride.cancel().is_err());

        let id = ride
            .request("Bole", "Piassa", VehicleType::Auto, false, Decimal::ONE_HUNDRED)
            .unwrap();
        ride.assign_driver(id, sample_driver(), sample_route(), 5)
            .unwrap();
        ride.cancel().unwrap();

        assert_eq!(ride.status(), RideStatus::Idle);
        assert_eq!(ride.request_id(), None);
        assert!(ride.driver().is_none());
        assert!(ride.route().is_none());
        assert_eq!(ride.eta_min(), None);
        assert_eq!(ride.progress(), None);
    }
}
