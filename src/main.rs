use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use clinic_backend::{
    AppState,
    access::{PgAuthProvider, PgMembershipStore},
    app,
    config::Config,
    database,
    forms::SubmissionTracker,
    middleware::{RateLimiter, rate_limit},
    routes::auth::SessionRecord,
};
#[cfg(debug_assertions)]
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置数据库连接池并执行迁移
    let pool = database::connect(&config)
        .await
        .expect("Failed to connect to database");
    database::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    match SessionRecord::purge_expired(&pool).await {
        Ok(removed) => tracing::info!("Removed {} expired sessions", removed),
        Err(e) => tracing::warn!("Failed to purge expired sessions: {}", e),
    }

    // 设置 Redis 限流器
    let redis_client =
        redis::Client::open(config.redis_url.as_str()).expect("Failed to create Redis client");
    let rate_limiter = Arc::new(RateLimiter::new(redis_client, &config));

    let auth = Arc::new(PgAuthProvider::new(
        pool.clone(),
        config.session_expiration(),
    ));
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        sessions: auth.clone(),
        credentials: auth,
        memberships: Arc::new(PgMembershipStore::new(pool)),
        submissions: SubmissionTracker::new(),
    };

    let router = app(state).layer(axum::middleware::from_fn_with_state(
        rate_limiter,
        rate_limit,
    ));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
