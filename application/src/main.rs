use std::{future, io, net::SocketAddr, sync::OnceLock};

use application::{
    api,
    middleware::{CorsPolicy, IdentityResolver},
    AppState, Args, Config, Pipeline, SessionCookie,
};
use service::{
    infra::{postgres, Postgres, Redis},
    Service,
};
use tokio::net::TcpListener;
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    _ = start().await;
}

async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        server,
        service,
        postgres,
        redis,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let pool_size = redis.pool_size;
    let redis = Redis::connect(redis.into(), pool_size).await.map_err(|e| {
        log::error!("failed to connect to Redis: {e}");
    })?;

    let service = Service::new(service.into(), postgres, redis);
    let cookie = SessionCookie::from(server.cookie);

    let pipeline = Pipeline {
        identity: IdentityResolver::new(service.clone(), cookie.clone()),
        csrf: server
            .csrf
            .guard(service.config().csrf.clone(), cookie.clone())
            .map_err(|e| log::error!("invalid CSRF configuration: {e}"))?,
        cors: CorsPolicy::try_from(server.cors)
            .map_err(|e| log::error!("invalid CORS configuration: {e}"))?,
    };

    let app = pipeline.wrap(
        api::router().with_state(AppState { service, cookie }),
    );

    let listener = TcpListener::bind((server.host.clone(), server.port))
        .await
        .map_err(|e| {
            log::error!(
                "failed to listen on `{}:{}`: {e}",
                server.host,
                server.port,
            );
        })?;

    log::info!("listening on `{}:{}`", server.host, server.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown())
    .await
    .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Resolves once the process is asked to stop.
async fn shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutting down"),
        Err(e) => {
            log::error!("failed to listen for shutdown signal: {e}");
            future::pending().await
        }
    }
}
