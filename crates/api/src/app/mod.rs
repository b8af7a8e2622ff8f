//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and engine wiring, navigation assembly
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and id parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tracing::{debug, info};

use coursedesk_infra::seed;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Router over already-built services. Used by `build_app` and by tests.
pub fn router(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        credentials: services.stores.credentials.clone(),
    };

    // Protected routes: require a live credential.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(&config.store).await?);

    if config.seed_demo {
        let report = seed::seed_demo(&services.stores).await?;
        announce_seed(&report);
    }

    Ok(router(services))
}

fn announce_seed(report: &seed::SeedReport) {
    info!(
        admin_user = %report.admin.user_id,
        instructor_user = %report.instructor.user_id,
        "demo credentials issued (development only)"
    );
    // Bearer secrets stay out of info-level logs.
    debug!(
        admin_token = %report.admin.credential.token,
        instructor_token = %report.instructor.credential.token,
        "demo bearer tokens"
    );
}

pub use services::AppServices;

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::Level;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged_at(level: Level, report: &seed::SeedReport) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || announce_seed(report));
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn seeded_tokens_never_reach_info_logs() {
        let services = AppServices::in_memory(false).unwrap();
        let report = seed::seed_demo(&services.stores).await.unwrap();

        let info_output = logged_at(Level::INFO, &report);
        assert!(info_output.contains(&report.admin.user_id.to_string()));
        assert!(!info_output.contains(&report.admin.credential.token));
        assert!(!info_output.contains(&report.instructor.credential.token));

        let debug_output = logged_at(Level::DEBUG, &report);
        assert!(debug_output.contains(&report.admin.credential.token));
    }
}
