//! Ride dispatch simulation.
//!
//! After a ride is requested, [`Dispatcher::spawn`] starts a background task
//! that waits for a driver match, moves the ride to `arriving`, waits for the
//! driver to reach the pickup and then starts the trip. The returned
//! [`DispatchHandle`] cancels the task and resets the ride in one call.
//!
//! Driver matching and route planning sit behind the [`DriverMatcher`] and
//! [`RoutePlanner`] traits. The mock implementations produce plausible random
//! values; tests plug in fixed ones.

use crate::core::ride::{
    Driver, GeoPoint, Ride, RideStatus, RouteEstimate, RouteOption, TrafficCondition, VehicleType,
};
use crate::errors::Result;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// The session ride, shared with background dispatch tasks.
pub type SharedRide = Arc<Mutex<Ride>>;

/// A driver willing to take the ride and how far away they are.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverMatch {
    /// Matched driver
    pub driver: Driver,
    /// Minutes until the driver reaches the pickup
    pub eta_min: u32,
}

/// Finds drivers for ride requests.
pub trait DriverMatcher: Send + Sync {
    /// Returns a driver for the pickup, or `None` if nobody is available right now.
    fn find_driver(&self, pickup: &str, vehicle: VehicleType) -> Option<DriverMatch>;
}

/// Estimates routes between two places.
pub trait RoutePlanner: Send + Sync {
    /// Plans the route from `pickup` to `destination`.
    fn plan(&self, pickup: &str, destination: &str) -> RouteEstimate;
}

fn random_traffic(rng: &mut impl Rng) -> TrafficCondition {
    match rng.gen_range(0.0..1.0) {
        x if x < 0.5 => TrafficCondition::Light,
        x if x < 0.85 => TrafficCondition::Moderate,
        _ => TrafficCondition::Heavy,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn travel_minutes(distance_km: f64, traffic: TrafficCondition) -> u32 {
    let minutes_per_km = match traffic {
        TrafficCondition::Light => 2.0,
        TrafficCondition::Moderate => 3.0,
        TrafficCondition::Heavy => 4.5,
    };
    (distance_km * minutes_per_km).ceil().max(1.0) as u32
}

/// Random route estimates between 2 and 25 km with up to two alternatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockRoutePlanner;

impl RoutePlanner for MockRoutePlanner {
    fn plan(&self, pickup: &str, destination: &str) -> RouteEstimate {
        let mut rng = rand::thread_rng();
        let distance_km = (rng.gen_range(2.0..=25.0_f64) * 10.0).round() / 10.0;
        let traffic = random_traffic(&mut rng);
        let alternatives = ["via Ring Road", "via city centre"]
            .into_iter()
            .map(|label| {
                let detour = rng.gen_range(1.05..1.4);
                let distance = (distance_km * detour * 10.0).round() / 10.0;
                let traffic = random_traffic(&mut rng);
                RouteOption {
                    label: label.to_string(),
                    distance_km: distance,
                    duration_min: travel_minutes(distance, traffic),
                    traffic,
                }
            })
            .collect();
        debug!(pickup, destination, distance_km, ?traffic, "Route planned");
        RouteEstimate {
            distance_km,
            duration_min: travel_minutes(distance_km, traffic),
            traffic,
            alternatives,
        }
    }
}

/// Picks a random driver from a fixed roster; occasionally finds nobody.
#[derive(Debug, Clone)]
pub struct MockDriverMatcher {
    roster: Vec<Driver>,
    availability: f64,
}

impl Default for MockDriverMatcher {
    fn default() -> Self {
        let driver = |name: &str, rating: f32, plate: &str, phone: &str, lat: f64, lng: f64| {
            Driver {
                name: name.to_string(),
                rating,
                vehicle: String::new(),
                plate: plate.to_string(),
                verified: true,
                phone: phone.to_string(),
                location: GeoPoint { lat, lng },
            }
        };
        Self {
            roster: vec![
                driver("Kebede Alemu", 4.8, "AA 3-48211", "+251911234567", 9.0108, 38.7613),
                driver("Selam Tesfaye", 4.9, "AA 2-19374", "+251922345678", 9.0054, 38.7636),
                driver("Yohannes Girma", 4.6, "AA 3-77520", "+251933456789", 9.0227, 38.7469),
                driver("Hirut Bekele", 4.7, "AA 2-60418", "+251944567890", 8.9975, 38.7867),
            ],
            availability: 0.9,
        }
    }
}

impl MockDriverMatcher {
    /// Uses a custom roster; `availability` is the chance a search finds someone.
    #[must_use]
    pub fn new(roster: Vec<Driver>, availability: f64) -> Self {
        Self {
            roster,
            availability: availability.clamp(0.0, 1.0),
        }
    }
}

const fn vehicle_description(vehicle: VehicleType) -> &'static str {
    match vehicle {
        VehicleType::Bike => "Bajaj Boxer (red)",
        VehicleType::Auto => "Bajaj RE three-wheeler (blue)",
        VehicleType::Car => "Toyota Vitz (white)",
        VehicleType::Premium => "Toyota Camry (black)",
        VehicleType::Xl => "Toyota HiAce (silver)",
    }
}

impl DriverMatcher for MockDriverMatcher {
    fn find_driver(&self, pickup: &str, vehicle: VehicleType) -> Option<DriverMatch> {
        let mut rng = rand::thread_rng();
        let available = rng.gen_range(0.0..1.0) < self.availability;
        let Some(driver) = self.roster.choose(&mut rng).filter(|_| available) else {
            debug!(pickup, ?vehicle, "No driver available");
            return None;
        };
        let mut driver = driver.clone();
        driver.vehicle = vehicle_description(vehicle).to_string();
        let eta_min = rng.gen_range(2..=9);
        Some(DriverMatch { driver, eta_min })
    }
}

/// Delays of the simulated dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTimings {
    /// Wait before each matching attempt
    pub search_delay: Duration,
    /// Wait between the match and the trip start
    pub arrival_delay: Duration,
    /// Matching attempts before the request is given up
    pub max_search_attempts: u32,
}

impl Default for DispatchTimings {
    fn default() -> Self {
        Self {
            search_delay: Duration::from_secs(3),
            arrival_delay: Duration::from_secs(5),
            max_search_attempts: 5,
        }
    }
}

/// Starts dispatch tasks for ride requests.
#[derive(Clone)]
pub struct Dispatcher {
    matcher: Arc<dyn DriverMatcher>,
    planner: Arc<dyn RoutePlanner>,
    timings: DispatchTimings,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Creates a dispatcher from a matcher, a planner and the simulated delays.
    #[must_use]
    pub fn new(
        matcher: Arc<dyn DriverMatcher>,
        planner: Arc<dyn RoutePlanner>,
        timings: DispatchTimings,
    ) -> Self {
        Self {
            matcher,
            planner,
            timings,
        }
    }

    /// Dispatcher backed by the mock matcher and planner.
    #[must_use]
    pub fn mock(timings: DispatchTimings) -> Self {
        Self::new(
            Arc::new(MockDriverMatcher::default()),
            Arc::new(MockRoutePlanner),
            timings,
        )
    }

    /// Spawns the dispatch task for `request_id` on the current tokio runtime.
    #[must_use = "dropping the handle leaves the dispatch running without a way to cancel it"]
    pub fn spawn(&self, ride: SharedRide, request_id: Uuid) -> DispatchHandle {
        let task = tokio::spawn(run_dispatch(
            Arc::clone(&ride),
            request_id,
            Arc::clone(&self.matcher),
            Arc::clone(&self.planner),
            self.timings,
        ));
        debug!(%request_id, "Dispatch task spawned");
        DispatchHandle {
            request_id,
            ride,
            task,
        }
    }
}

async fn run_dispatch(
    ride: SharedRide,
    request_id: Uuid,
    matcher: Arc<dyn DriverMatcher>,
    planner: Arc<dyn RoutePlanner>,
    timings: DispatchTimings,
) {
    let mut attempts = 0;
    loop {
        tokio::time::sleep(timings.search_delay).await;
        attempts += 1;

        let mut guard = ride.lock().await;
        if guard.request_id() != Some(request_id) || guard.status() != RideStatus::Searching {
            debug!(%request_id, "Dispatch stopped: request no longer searching");
            return;
        }
        let Some(vehicle) = guard.vehicle() else {
            return;
        };

        match matcher.find_driver(guard.pickup(), vehicle) {
            Some(found) => {
                let route = planner.plan(guard.pickup(), guard.destination());
                if let Err(e) = guard.assign_driver(request_id, found.driver, route, found.eta_min)
                {
                    error!(%request_id, error = %e, "Failed to assign driver");
                    return;
                }
                break;
            }
            None if attempts >= timings.max_search_attempts => {
                warn!(%request_id, attempts, "No driver found, giving up");
                if let Err(e) = guard.cancel() {
                    error!(%request_id, error = %e, "Failed to reset unmatched ride");
                }
                return;
            }
            None => debug!(%request_id, attempts, "Still searching for a driver"),
        }
    }

    tokio::time::sleep(timings.arrival_delay).await;

    let mut guard = ride.lock().await;
    if guard.request_id() != Some(request_id) || guard.status() != RideStatus::Arriving {
        debug!(%request_id, "Dispatch stopped: request no longer arriving");
        return;
    }
    if let Err(e) = guard.start_trip(request_id) {
        error!(%request_id, error = %e, "Failed to start trip");
    }
}

/// Control over a running dispatch task.
#[derive(Debug)]
pub struct DispatchHandle {
    request_id: Uuid,
    ride: SharedRide,
    task: JoinHandle<()>,
}

impl DispatchHandle {
    /// Request this handle belongs to.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Whether the task has stopped, either by finishing or by being cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task and cancels the ride if it still belongs to this request.
    pub async fn cancel(self) -> Result<()> {
        self.task.abort();
        let mut ride = self.ride.lock().await;
        if ride.request_id() == Some(self.request_id) && ride.status() != RideStatus::Idle {
            ride.cancel()?;
        }
        info!(request_id = %self.request_id, "Dispatch cancelled");
        Ok(())
    }

    /// Waits until the task is done. A cancelled task counts as done.
    pub async fn finished(self) {
        if let Err(e) = self.task.await
            && !e.is_cancelled()
        {
            error!(request_id = %self.request_id, error = %e, "Dispatch task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{driverless_dispatcher, fixed_dispatcher, sample_driver};
    use rust_decimal::Decimal;

    async fn requested_ride() -> (SharedRide, Uuid) {
        let ride: SharedRide = Arc::new(Mutex::new(Ride::default()));
        let id = ride
            .lock()
            .await
            .request("Bole", "Piassa", VehicleType::Car, false, Decimal::ONE_HUNDRED)
            .unwrap();
        (ride, id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_moves_ride_to_in_progress() {
        let (ride, id) = requested_ride().await;
        let handle = fixed_dispatcher().spawn(Arc::clone(&ride), id);

        tokio::time::sleep(Duration::from_millis(150)).await;
        {
            let guard = ride.lock().await;
            assert_eq!(guard.status(), RideStatus::Arriving);
            assert_eq!(guard.driver().unwrap().name, sample_driver().name);
            assert_eq!(guard.eta_min(), Some(4));
        }

        handle.finished().await;
        let guard = ride.lock().await;
        assert_eq!(guard.status(), RideStatus::InProgress);
        assert_eq!(guard.progress(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_searching_resets_ride() {
        let (ride, id) = requested_ride().await;
        let handle = fixed_dispatcher().spawn(Arc::clone(&ride), id);

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let guard = ride.lock().await;
        assert_eq!(guard.status(), RideStatus::Idle);
        assert!(guard.driver().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_task_ignores_new_request() {
        let (ride, old_id) = requested_ride().await;
        let stale = fixed_dispatcher().spawn(Arc::clone(&ride), old_id);

        let new_id = {
            let mut guard = ride.lock().await;
            guard.cancel().unwrap();
            guard
                .request("Bole", "CMC", VehicleType::Bike, false, Decimal::ONE_HUNDRED)
                .unwrap()
        };

        stale.finished().await;
        let guard = ride.lock().await;
        assert_eq!(guard.request_id(), Some(new_id));
        assert_eq!(guard.status(), RideStatus::Searching);
        assert!(guard.driver().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_when_no_driver() {
        let (ride, id) = requested_ride().await;
        let handle = driverless_dispatcher().spawn(Arc::clone(&ride), id);

        handle.finished().await;
        assert_eq!(ride.lock().await.status(), RideStatus::Idle);
    }

    #[test]
    fn test_mock_planner_is_consistent() {
        for _ in 0..50 {
            let route = MockRoutePlanner.plan("Bole", "Piassa");
            assert!((2.0..=25.0).contains(&route.distance_km));
            assert!(route.duration_min >= 1);
            assert_eq!(route.alternatives.len(), 2);
            assert!(
                route
                    .alternatives
                    .iter()
                    .all(|alt| alt.distance_km >= route.distance_km)
            );
        }
    }

    #[test]
    fn test_mock_matcher_describes_vehicle() {
        let matcher = MockDriverMatcher::new(vec![sample_driver()], 1.0);
        let found = matcher.find_driver("Bole", VehicleType::Premium).unwrap();
        assert_eq!(found.driver.vehicle, "Toyota Camry (black)");
        assert!((2..=9).contains(&found.eta_min));

        let nobody = MockDriverMatcher::new(vec![sample_driver()], 0.0);
        assert!(nobody.find_driver("Bole", VehicleType::Car).is_none());
    }
}
