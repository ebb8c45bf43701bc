//! Session service object.
//!
//! [`SuperApp`] owns every piece of session state (market, wallet, agent
//! account, ride, parcels) together with the database connection used to
//! persist it. It is built explicitly with [`SuperApp::load`] and torn down
//! with [`SuperApp::shutdown`], which stops background dispatch and writes
//! the final snapshots.

use crate::config::settings::AppConfig;
use crate::core::{
    account::{AddressBook, Preferences, Role, User, require_role},
    cart::{Cart, CompareList, Wishlist},
    dispatch::{DispatchHandle, Dispatcher, SharedRide},
    parcel::{NewParcel, Parcel, ParcelBook, ParcelStatus},
    product::Catalog,
    ride::{Ride, RideReceipt, RideStatus, VehicleType},
    snapshot::{StoreKey, load_snapshot, save_snapshot},
    wallet::{AgentAccount, AgentReceipt, Category, TransactionRecord, Wallet},
};
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Marketplace state persisted under [`StoreKey::Market`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStore {
    /// Products on offer
    pub catalog: Catalog,
    /// Shopping cart
    pub cart: Cart,
    /// Products being compared
    pub compare: CompareList,
    /// Saved products
    pub wishlist: Wishlist,
    /// Signed-in user
    pub user: Option<User>,
    /// Saved addresses
    pub addresses: AddressBook,
    /// Display settings
    pub preferences: Preferences,
}

/// Service state persisted under [`StoreKey::Services`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesStore {
    /// Current ride request
    pub ride: Ride,
    /// User wallet
    pub wallet: Wallet,
    /// Agent float and commission
    pub agent: AgentAccount,
}

impl ServicesStore {
    fn seeded(config: &AppConfig) -> Self {
        let seed = &config.wallet;
        Self {
            ride: Ride::default(),
            wallet: Wallet::new(seed.balance, seed.savings, seed.loan_due, seed.points),
            agent: AgentAccount::new(seed.agent_balance, seed.agent_commission),
        }
    }
}

/// The running superapp session.
#[derive(Debug)]
pub struct SuperApp {
    db: DatabaseConnection,
    config: Arc<AppConfig>,
    market: MarketStore,
    wallet: Wallet,
    agent: AgentAccount,
    ride: SharedRide,
    parcels: ParcelBook,
    surge_active: bool,
    dispatcher: Dispatcher,
    dispatch: Option<DispatchHandle>,
}

impl SuperApp {
    /// Loads the three stores from the database, seeding any that were never saved.
    #[instrument(skip(db, config))]
    pub async fn load(db: DatabaseConnection, config: Arc<AppConfig>) -> Result<Self> {
        let stored_market = load_snapshot::<_, MarketStore>(&db, StoreKey::Market).await?;
        let market = if let Some(market) = stored_market {
            market
        } else {
            info!("Seeding market store");
            MarketStore {
                catalog: Catalog::demo(),
                user: config.user.clone(),
                ..MarketStore::default()
            }
        };

        let stored_services = load_snapshot::<_, ServicesStore>(&db, StoreKey::Services).await?;
        let services = if let Some(services) = stored_services {
            services
        } else {
            info!("Seeding services store");
            ServicesStore::seeded(&config)
        };

        let parcels: ParcelBook = load_snapshot(&db, StoreKey::Parcels)
            .await?
            .unwrap_or_default();
        parcels.check_integrity()?;

        let ServicesStore {
            mut ride,
            wallet,
            agent,
        } = services;
        // A dispatch task does not survive a restart, so an unfinished request cannot progress.
        if ride.status() != RideStatus::Idle {
            warn!(status = %ride.status(), "Dropping ride left over from previous session");
            ride.cancel()?;
        }

        info!(
            balance = %wallet.balance(),
            parcels = parcels.parcels().len(),
            "Session loaded"
        );
        Ok(Self {
            dispatcher: Dispatcher::mock(config.ride.timings()),
            surge_active: config.ride.surge_active,
            db,
            config,
            market,
            wallet,
            agent,
            ride: Arc::new(Mutex::new(ride)),
            parcels,
            dispatch: None,
        })
    }

    /// Replaces the dispatcher, e.g. with deterministic matching.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Writes all three stores to the database.
    #[instrument(skip(self))]
    pub async fn persist(&self) -> Result<()> {
        let services = ServicesStore {
            ride: self.ride.lock().await.clone(),
            wallet: self.wallet.clone(),
            agent: self.agent.clone(),
        };
        save_snapshot(&self.db, StoreKey::Market, &self.market).await?;
        save_snapshot(&self.db, StoreKey::Services, &services).await?;
        save_snapshot(&self.db, StoreKey::Parcels, &self.parcels).await?;
        info!("Session persisted");
        Ok(())
    }

    /// Stops background work and persists the final state.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.dispatch.take() {
            handle.cancel().await?;
        }
        self.persist().await
    }

    /// Configuration the session was started with.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ---- account ----

    /// Signed-in user.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.market.user.as_ref()
    }

    /// Signs a user in, replacing any previous one.
    pub fn sign_in(&mut self, user: User) {
        info!(user = %user.id, role = %user.role, "User signed in");
        self.market.user = Some(user);
    }

    /// Signs the current user out.
    pub fn sign_out(&mut self) {
        self.market.user = None;
    }

    /// Saved addresses, mutable.
    pub const fn addresses_mut(&mut self) -> &mut AddressBook {
        &mut self.market.addresses
    }

    /// Display settings, mutable.
    pub const fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.market.preferences
    }

    // ---- market ----

    /// Marketplace state.
    #[must_use]
    pub const fn market(&self) -> &MarketStore {
        &self.market
    }

    /// Adds a catalog product to the cart.
    pub fn add_to_cart(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        let product = self.market.catalog.require(product_id)?;
        self.market.cart.add(product, quantity)
    }

    /// Empties the cart and adds the product, resolving a vendor conflict.
    pub fn replace_cart(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        let product = self.market.catalog.require(product_id)?;
        self.market.cart.replace(product, quantity)
    }

    /// Changes the quantity of a cart line; zero removes it.
    pub fn update_cart_quantity(&mut self, product_id: &str, quantity: u32) -> Result<()> {
        self.market.cart.update_quantity(product_id, quantity)
    }

    /// Removes a product from the cart. Returns whether it was there.
    pub fn remove_from_cart(&mut self, product_id: &str) -> bool {
        self.market.cart.remove(product_id)
    }

    /// Adds a catalog product to the comparison.
    pub fn add_to_compare(&mut self, product_id: &str) -> Result<()> {
        let product = self.market.catalog.require(product_id)?;
        self.market.compare.add(product)
    }

    /// Removes a product from the comparison. Returns whether it was there.
    pub fn remove_from_compare(&mut self, product_id: &str) -> bool {
        self.market.compare.remove(product_id)
    }

    /// Empties the comparison.
    pub fn clear_compare(&mut self) {
        self.market.compare.clear();
    }

    /// Saves or unsaves a catalog product. Returns whether it is now saved.
    pub fn toggle_wishlist(&mut self, product_id: &str) -> Result<bool> {
        self.market.catalog.require(product_id)?;
        Ok(self.market.wishlist.toggle(product_id))
    }

    /// Pays for the cart from the wallet under `title`. The cart is emptied
    /// only if payment succeeds.
    pub fn checkout(&mut self, title: &str) -> Result<TransactionRecord> {
        let Some(vendor) = self.market.cart.vendor() else {
            return Err(Error::MissingField { field: "cart" });
        };
        let total = self.market.cart.total();

        let record = self.wallet.pay(total, title, Category::Shop)?;
        info!(vendor, %total, units = self.market.cart.unit_count(), "Order placed");
        self.market.cart.clear();
        Ok(record)
    }

    // ---- wallet ----

    /// Wallet state.
    #[must_use]
    pub const fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Wallet for direct financial operations.
    pub const fn wallet_mut(&mut self) -> &mut Wallet {
        &mut self.wallet
    }

    /// Agent float and commission.
    #[must_use]
    pub const fn agent(&self) -> &AgentAccount {
        &self.agent
    }

    /// Agent hands e-money to a customer. Requires the agent role.
    pub fn agent_cash_in(&mut self, customer: &str, amount: Decimal) -> Result<AgentReceipt> {
        require_role(self.user(), Role::Agent)?;
        self.agent.cash_in(customer, amount)
    }

    /// Agent pays out cash to a customer. Requires the agent role.
    pub fn agent_cash_out(&mut self, customer: &str, amount: Decimal) -> Result<AgentReceipt> {
        require_role(self.user(), Role::Agent)?;
        self.agent.cash_out(customer, amount)
    }

    // ---- ride ----

    /// Copy of the current ride state.
    pub async fn ride(&self) -> Ride {
        self.ride.lock().await.clone()
    }

    /// Shared handle to the ride, for observers that poll its state.
    #[must_use]
    pub fn shared_ride(&self) -> SharedRide {
        Arc::clone(&self.ride)
    }

    /// Whether new ride requests are priced with surge.
    #[must_use]
    pub const fn surge_active(&self) -> bool {
        self.surge_active
    }

    /// Turns surge pricing on or off for future requests.
    pub fn set_surge(&mut self, active: bool) {
        info!(active, "Surge pricing toggled");
        self.surge_active = active;
    }

    /// Requests a ride and starts the background driver search.
    #[instrument(skip(self))]
    pub async fn request_ride(
        &mut self,
        pickup: &str,
        destination: &str,
        vehicle: VehicleType,
    ) -> Result<Uuid> {
        let request_id = self.ride.lock().await.request(
            pickup,
            destination,
            vehicle,
            self.surge_active,
            self.config.ride.base_fare,
        )?;

        if let Some(previous) = self.dispatch.take() {
            previous.cancel().await?;
        }
        self.dispatch = Some(self.dispatcher.spawn(Arc::clone(&self.ride), request_id));
        Ok(request_id)
    }

    /// Cancels the current ride and any background search for it.
    #[instrument(skip(self))]
    pub async fn cancel_ride(&mut self) -> Result<()> {
        let current = self.ride.lock().await.request_id();
        match self.dispatch.take() {
            Some(handle) if current == Some(handle.request_id()) => handle.cancel().await,
            _ => self.ride.lock().await.cancel(),
        }
    }

    /// Completes the trip in progress and pays the fare from the wallet.
    #[instrument(skip(self))]
    pub async fn complete_ride(&mut self) -> Result<RideReceipt> {
        let receipt = self.ride.lock().await.complete(&mut self.wallet)?;
        self.dispatch = None;
        Ok(receipt)
    }

    // ---- parcels ----

    /// All parcels.
    #[must_use]
    pub const fn parcels(&self) -> &ParcelBook {
        &self.parcels
    }

    /// Books a parcel.
    pub fn send_parcel(&mut self, request: NewParcel) -> Result<Parcel> {
        self.parcels.create(request).cloned()
    }

    /// Sender cancels a parcel that is still pending.
    pub fn cancel_parcel(&mut self, id: Uuid) -> Result<Parcel> {
        self.parcels.cancel(id).cloned()
    }

    /// Receiver confirms delivery of a parcel that is out for delivery.
    pub fn confirm_parcel_delivery(&mut self, id: Uuid) -> Result<Parcel> {
        self.parcels.confirm_delivery(id).cloned()
    }

    /// Sets any parcel status. Requires the admin role.
    pub fn admin_update_parcel(
        &mut self,
        id: Uuid,
        status: ParcelStatus,
        note: &str,
    ) -> Result<Parcel> {
        require_role(self.user(), Role::Admin)?;
        self.parcels.update_status(id, status, note).cloned()
    }
}
