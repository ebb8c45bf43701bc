/// User profile, roles, addresses and preferences
pub mod account;

/// Shopping cart, product comparison and wishlist
pub mod cart;

/// Background driver search and trip start
pub mod dispatch;

/// Parcel booking, pricing and tracking
pub mod parcel;

/// Marketplace product catalog
pub mod product;

/// Spending totals and breakdowns over the wallet ledger
pub mod report;

/// Ride request lifecycle and fare pricing
pub mod ride;

/// JSON snapshots of the session stores
pub mod snapshot;

/// Wallet balances, ledger and agent float
pub mod wallet;
