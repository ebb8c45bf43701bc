//! Shared test utilities for the superapp.
//!
//! This module provides common helper functions for setting up test databases
//! and building domain values with sensible defaults.

use crate::{
    app::SuperApp,
    config::settings::AppConfig,
    core::{
        dispatch::{DispatchTimings, Dispatcher, DriverMatch, DriverMatcher, RoutePlanner},
        parcel::{Contact, NewParcel, PackageType},
        product::{Catalog, Product},
        ride::{Driver, GeoPoint, RouteEstimate, RouteOption, TrafficCondition, VehicleType},
    },
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all persistence tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Loads a fresh session on an empty in-memory database with the default configuration.
pub async fn setup_test_app() -> Result<SuperApp> {
    init_test_tracing();
    let db = setup_test_db().await?;
    SuperApp::load(db, Arc::new(AppConfig::default())).await
}

/// The demo catalog.
///
/// Contains `phone-a` (vendor `v1`), four products in `phones` and products
/// from other vendors and categories.
pub fn sample_catalog() -> Catalog {
    Catalog::demo()
}

/// Parses a money literal such as `"0.1"`.
#[allow(clippy::unwrap_used)]
pub fn money(value: &str) -> Decimal {
    value.parse().unwrap()
}

/// Builds a product with ten units in stock, priced in whole birr.
pub fn product(id: &str, vendor_id: &str, category_id: &str, price: i64) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {id}"),
        price: Decimal::from(price),
        vendor_id: vendor_id.to_string(),
        category_id: category_id.to_string(),
        stock: 10,
    }
}

/// Builds a booking request between two Addis Ababa contacts.
///
/// # Defaults
/// * sender phone: `+251911111111`
/// * receiver phone: `+251922222222`
pub fn new_parcel(package_type: PackageType, weight_kg: Decimal) -> NewParcel {
    NewParcel {
        sender: Contact {
            name: "Meron Haile".to_string(),
            phone: "+251911111111".to_string(),
            address: "Bole, Addis Ababa".to_string(),
        },
        receiver: Contact {
            name: "Dawit Tadesse".to_string(),
            phone: "+251922222222".to_string(),
            address: "Piassa, Addis Ababa".to_string(),
        },
        package_type,
        weight_kg,
    }
}

/// A verified driver with a car.
pub fn sample_driver() -> Driver {
    Driver {
        name: "Kebede Alemu".to_string(),
        rating: 4.8,
        vehicle: "Toyota Vitz (white)".to_string(),
        plate: "AA 3-48211".to_string(),
        verified: true,
        phone: "+251911234567".to_string(),
        location: GeoPoint {
            lat: 9.0108,
            lng: 38.7613,
        },
    }
}

/// An 8.5 km route taking 22 minutes, with one alternative.
pub fn sample_route() -> RouteEstimate {
    RouteEstimate {
        distance_km: 8.5,
        duration_min: 22,
        traffic: TrafficCondition::Moderate,
        alternatives: vec![RouteOption {
            label: "via Ring Road".to_string(),
            distance_km: 10.2,
            duration_min: 20,
            traffic: TrafficCondition::Light,
        }],
    }
}

/// Matcher that gives the same answer to every search.
pub struct FixedMatcher(pub Option<DriverMatch>);

impl DriverMatcher for FixedMatcher {
    fn find_driver(&self, _pickup: &str, _vehicle: VehicleType) -> Option<DriverMatch> {
        self.0.clone()
    }
}

/// Planner that always returns [`sample_route`].
pub struct FixedPlanner;

impl RoutePlanner for FixedPlanner {
    fn plan(&self, _pickup: &str, _destination: &str) -> RouteEstimate {
        sample_route()
    }
}

/// Dispatcher on [`FixedMatcher`] and [`FixedPlanner`] that searches every
/// 100ms, gives up after three attempts and starts the trip 200ms after a match.
pub fn dispatcher_matching(found: Option<DriverMatch>) -> Dispatcher {
    Dispatcher::new(
        Arc::new(FixedMatcher(found)),
        Arc::new(FixedPlanner),
        DispatchTimings {
            search_delay: Duration::from_millis(100),
            arrival_delay: Duration::from_millis(200),
            max_search_attempts: 3,
        },
    )
}

/// Dispatcher that always matches [`sample_driver`], 4 minutes away,
/// and reaches `in-progress` within 300ms.
pub fn fixed_dispatcher() -> Dispatcher {
    dispatcher_matching(Some(DriverMatch {
        driver: sample_driver(),
        eta_min: 4,
    }))
}

/// Dispatcher that never finds a driver and resets the ride after 300ms.
pub fn driverless_dispatcher() -> Dispatcher {
    dispatcher_matching(None)
}
