use dotenvy::dotenv;
use std::sync::Arc;
use superapp::app::SuperApp;
use superapp::config::{database, settings};
use superapp::core::{parcel::ParcelStatus, report};
use superapp::errors::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = settings::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Initialize database
    let db = database::init_database(&app_config.database_url)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Load or seed the session
    let app = SuperApp::load(db, Arc::new(app_config)).await?;

    let totals = report::totals(app.wallet(), report::Period::all_time());
    let pending = app
        .parcels()
        .active()
        .filter(|p| p.status() == ParcelStatus::Pending)
        .count();
    info!(
        user = app.user().map_or("guest", |u| u.name.as_str()),
        balance = %app.wallet().balance(),
        savings = %app.wallet().savings(),
        points = app.wallet().points(),
        spent = %totals.debits,
        cart_units = app.market().cart.unit_count(),
        parcels_pending = pending,
        "Session ready"
    );
    for (category, amount) in report::spending_by_category(app.wallet(), report::Period::all_time())
    {
        info!(%category, %amount, "Spending");
    }

    // 6. Persist and shut down
    app.shutdown().await?;
    Ok(())
}
