use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liondine_api::{
    config::Config,
    db, routes,
    scrape::{
        browser::{Browser, WebDriverBrowser},
        ferris::FerrisSource,
        john_jay::JohnJaySource,
        johnnys::JohnnysSource,
        liondine::{LiondineSource, LIONDINE_BASE_URL},
        SupplementalSource,
    },
    services::{menu::MenuService, ratings::RatingsService},
    store::postgres::PgStore,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let store = Arc::new(PgStore::new(pool));

    let browser: Arc<dyn Browser> = Arc::new(WebDriverBrowser::new(&config.webdriver_url)?);
    let supplementals: Vec<Arc<dyn SupplementalSource>> = vec![
        Arc::new(FerrisSource::new(browser.clone())),
        Arc::new(JohnJaySource::new(browser.clone())),
        Arc::new(JohnnysSource::new(browser)),
    ];
    let menu = Arc::new(MenuService::new(
        store.clone(),
        Arc::new(LiondineSource::new(LIONDINE_BASE_URL)?),
        supplementals,
    ));
    let ratings = Arc::new(RatingsService::new(store));

    let state = AppState {
        menu: menu.clone(),
        ratings,
        config: config.clone(),
    };

    if let Err(e) = menu.refresh().await {
        warn!("Initial menu refresh failed; will retry on interval: {e}");
    }
    spawn_refresh_loop(menu, config.refresh_interval_minutes);

    // Localhost is always allowed for development; the deployed frontend
    // origin comes from config. Credentials are on for the visitor cookie.
    let frontend = config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]))
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let Ok(o) = origin.to_str() else { return false };
            if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
                return true;
            }
            frontend.as_deref() == Some(o)
        }));

    let app = Router::new()
        .route("/", get(routes::root::index))
        .route("/health", get(routes::health::health_check))
        .route("/api/menu", get(routes::menu::get_menu))
        .route("/api/menu/{meal}", get(routes::menu::get_meal))
        .route("/api/ratings", post(routes::ratings::submit_rating))
        .route("/api/ratings/today", get(routes::ratings::today_ratings))
        .route("/api/ratings/debug", get(routes::ratings::debug_info))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!(
        "liondine API listening on {} (menu refreshes every {} min)",
        addr, config.refresh_interval_minutes
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Fire a refresh every interval; failures are logged and retried on the
/// next tick, never fatal.
fn spawn_refresh_loop(menu: Arc<MenuService>, minutes: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
        // the first tick fires immediately and the startup refresh already ran
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = menu.refresh().await {
                warn!("Scheduled menu refresh failed: {e}");
            }
        }
    });
}
