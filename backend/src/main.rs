//! Backend entry-point: wires the REST endpoints, session layer, and OpenAPI docs.

use std::env;
use std::sync::Arc;

use actix_session::config::PersistentSession;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Key, SameSite};
use actix_web::{App, HttpServer, web};
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use neoreddit::ApiDoc;
use neoreddit::Trace;
use neoreddit::domain::{AccountService, PostService, VoteService};
use neoreddit::inbound::http::health::{HealthState, live, ready};
use neoreddit::inbound::http::posts::{create_post, delete_post, feed, get_post, update_post};
use neoreddit::inbound::http::state::HttpState;
use neoreddit::inbound::http::users::{
    change_password, forgot_password, login, logout, me, register,
};
use neoreddit::inbound::http::votes::{cast_vote, retract_vote};
use neoreddit::outbound::mail::LogMailSender;
use neoreddit::outbound::persistence::{
    DbPool, DieselPostRepository, DieselUserRepository, DieselVoteRepository, PoolConfig,
};
use neoreddit::outbound::reset_tokens::InMemoryResetTokenStore;
use neoreddit::outbound::security::Argon2PasswordHasher;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Sessions stay valid for roughly five months of inactivity.
const SESSION_TTL: CookieDuration = CookieDuration::days(150);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| std::io::Error::other("DATABASE_URL must be set"))?;
    let key = load_session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);
    let reset_base_url =
        env::var("RESET_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());

    run_migrations(database_url.clone()).await?;

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(std::io::Error::other)?;

    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let posts = Arc::new(DieselPostRepository::new(pool.clone()));
    let votes = Arc::new(DieselVoteRepository::new(pool));

    let state = web::Data::new(HttpState::new(
        AccountService::new(
            users.clone(),
            Arc::new(Argon2PasswordHasher),
            Arc::new(LogMailSender::new(reset_base_url)),
            Arc::new(InMemoryResetTokenStore::default()),
        ),
        PostService::new(posts.clone(), votes.clone(), users),
        VoteService::new(posts, votes),
    ));

    let health_state = web::Data::new(HealthState::new());
    // Clone for server factory so readiness probe remains accessible.
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".into())
            .cookie_path("/".into())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .session_lifecycle(PersistentSession::default().session_ttl(SESSION_TTL))
            .build();

        let api = web::scope("/api/v1")
            .wrap(session)
            .service(register)
            .service(login)
            .service(logout)
            .service(me)
            .service(forgot_password)
            .service(change_password)
            .service(feed)
            .service(get_post)
            .service(create_post)
            .service(update_post)
            .service(delete_post)
            .service(cast_vote)
            .service(retract_vote);

        let app = App::new()
            .app_data(state.clone())
            .app_data(server_health_state.clone())
            .wrap(Trace)
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(bind_addr.as_str())?;

    health_state.mark_ready();
    info!(addr = %bind_addr, "listening");
    server.run().await
}

/// Read the session signing key, generating an ephemeral one in development.
fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

/// Apply pending schema migrations before serving traffic.
///
/// Uses a dedicated synchronous connection on a blocking thread; the async
/// pool is only built afterwards.
async fn run_migrations(database_url: String) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| std::io::Error::other(format!("database connection failed: {e}")))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| std::io::Error::other(format!("migrations failed: {e}")))?;
        for migration in applied {
            info!(version = %migration, "applied migration");
        }
        Ok(())
    })
    .await
    .map_err(|e| std::io::Error::other(format!("migration task panicked: {e}")))?
}
