use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use shared::captcha::CaptchaSigner;
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    login_rate_limit, metrics_handler, metrics_middleware, public_rate_limit, require_admin,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    admin_availability, admin_blog, admin_bookings, admin_contacts, admin_testimonials, auth,
    availability, blog, bookings, captcha, contact, cron, dashboard, health, services,
    testimonials,
};
use crate::services::email::EmailService;
use crate::services::graph::GraphClient;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub captcha: Arc<CaptchaSigner>,
    pub email: EmailService,
    /// Present when `[graph]` is configured.
    pub graph: Option<Arc<GraphClient>>,
    pub public_limiter: Option<Arc<RateLimiterState>>,
    pub login_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// Builds the shared services. Fails on bad signing keys or email settings.
    pub fn new(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let jwt = config.jwt.build()?;
        let captcha = CaptchaSigner::new(
            &config.security.captcha_secret,
            config.security.captcha_ttl_secs,
        );

        let graph = if config.graph.is_configured() {
            Some(Arc::new(GraphClient::new(config.graph.clone())?))
        } else {
            None
        };

        let email = if config.email.enabled {
            EmailService::new(config.email.clone(), graph.clone())?
        } else {
            EmailService::console(config.email.clone())
        };

        Ok(Self {
            pool,
            jwt: Arc::new(jwt),
            captcha: Arc::new(captcha),
            email,
            graph,
            public_limiter: RateLimiterState::new(config.security.public_rate_limit_per_minute)
                .map(Arc::new),
            login_limiter: RateLimiterState::new(config.security.login_rate_limit_per_minute)
                .map(Arc::new),
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public form submissions, limited per client IP
    let submission_routes = Router::new()
        .route("/api/v1/bookings", post(bookings::create_booking))
        .route(
            "/api/v1/bookings/:reference/cancel",
            post(bookings::cancel_booking),
        )
        .route("/api/v1/contact", post(contact::submit_contact))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            public_rate_limit,
        ));

    let login_routes = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/services", get(services::list_services))
        .route("/api/v1/availability", get(availability::get_availability))
        .route(
            "/api/v1/availability/days",
            get(availability::get_available_days),
        )
        .route("/api/v1/captcha", get(captcha::new_challenge))
        .route("/api/v1/blog", get(blog::list_posts))
        .route("/api/v1/blog/:slug", get(blog::get_post))
        .route("/api/v1/testimonials", get(testimonials::list_testimonials))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/cron/inbox-poll", post(cron::inbox_poll));

    // Admin routes (require a valid admin access token)
    let admin_routes = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/password", put(auth::change_password))
        .route("/api/v1/admin/dashboard", get(dashboard::get_dashboard))
        .route("/api/v1/admin/bookings", get(admin_bookings::list_bookings))
        .route(
            "/api/v1/admin/bookings/:id",
            get(admin_bookings::get_booking).delete(admin_bookings::delete_booking),
        )
        .route(
            "/api/v1/admin/bookings/:id/status",
            patch(admin_bookings::update_status),
        )
        .route(
            "/api/v1/admin/bookings/:id/notes",
            put(admin_bookings::update_notes),
        )
        .route(
            "/api/v1/admin/bookings/:id/reply",
            post(admin_bookings::reply),
        )
        .route(
            "/api/v1/admin/blog",
            get(admin_blog::list_posts).post(admin_blog::create_post),
        )
        .route(
            "/api/v1/admin/blog/:id",
            get(admin_blog::get_post)
                .put(admin_blog::update_post)
                .delete(admin_blog::delete_post),
        )
        .route(
            "/api/v1/admin/testimonials",
            get(admin_testimonials::list_testimonials).post(admin_testimonials::create_testimonial),
        )
        .route(
            "/api/v1/admin/testimonials/:id",
            put(admin_testimonials::update_testimonial)
                .delete(admin_testimonials::delete_testimonial),
        )
        .route("/api/v1/admin/contacts", get(admin_contacts::list_contacts))
        .route(
            "/api/v1/admin/contacts/:id",
            get(admin_contacts::get_contact).delete(admin_contacts::delete_contact),
        )
        .route(
            "/api/v1/admin/contacts/:id/status",
            patch(admin_contacts::update_status),
        )
        .route(
            "/api/v1/admin/contacts/:id/reply",
            post(admin_contacts::reply),
        )
        .route(
            "/api/v1/admin/availability",
            get(admin_availability::list_windows)
                .put(admin_availability::replace_windows)
                .post(admin_availability::create_window),
        )
        .route(
            "/api/v1/admin/availability/:id",
            put(admin_availability::update_window).delete(admin_availability::delete_window),
        )
        .route(
            "/api/v1/admin/blocked-dates",
            get(admin_availability::list_blocked_dates).post(admin_availability::create_blocked_date),
        )
        .route(
            "/api/v1/admin/blocked-dates/:id",
            axum::routing::delete(admin_availability::delete_blocked_date),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(submission_routes)
        .merge(login_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
