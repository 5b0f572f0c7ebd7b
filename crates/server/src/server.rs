use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{audit, auth, games, password, players, statistics, tenants};
use engine::{Engine, Player, Tenant};

/// Server-side knobs the app binary reads from its settings file.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bare domain that selects the operator scope; `label.base_domain`
    /// selects a tenant.
    pub base_domain: String,
    /// Pre-filled buy-in for the new-game form.
    pub default_buyin: i64,
    pub operator_username: String,
    /// Argon2 PHC hash of the operator password.
    pub operator_password_hash: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub config: Arc<ServerConfig>,
}

/// Which scope a request's Host header selects.
#[derive(Clone, Debug, PartialEq, Eq)]
enum HostScope {
    Operator,
    Tenant(String),
    Unknown,
}

/// Classify the Host header against the base domain. The port is
/// ignored; only a single subdomain label selects a tenant.
fn scope_for_host(base_domain: &str, host: &str) -> HostScope {
    let host = host.split(':').next().unwrap_or_default();
    if host == base_domain {
        return HostScope::Operator;
    }
    match host.strip_suffix(base_domain).and_then(|h| h.strip_suffix('.')) {
        Some(label) if !label.is_empty() && !label.contains('.') => {
            HostScope::Tenant(label.to_string())
        }
        _ => HostScope::Unknown,
    }
}

fn request_scope(config: &ServerConfig, request: &Request) -> HostScope {
    let host = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    scope_for_host(&config.base_domain, host)
}

/// Client address as reported by the reverse proxy, for the audit log.
#[derive(Clone, Debug)]
pub struct ClientIp(pub Option<String>);

fn client_ip(request: &Request) -> ClientIp {
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    ClientIp(ip)
}

/// Guard for operator routes: they only exist on the bare base domain,
/// and the credentials come from the settings file, not the database.
async fn operator_auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if request_scope(&state.config, &request) != HostScope::Operator {
        return Err(StatusCode::NOT_FOUND);
    }

    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username() != state.config.operator_username
        || !password::verify_password(
            auth_header.password(),
            &state.config.operator_password_hash,
        )
    {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

/// Tenant resolution plus player authentication.
///
/// Runs before any tenant handler: an unknown subdomain is rejected
/// with 404 without touching credentials. A player still flagged
/// must-set-password may only reach `POST /set-password`; until a
/// hash is stored they authenticate with an empty password.
async fn tenant_auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let HostScope::Tenant(label) = request_scope(&state.config, &request) else {
        return Err(StatusCode::NOT_FOUND);
    };

    let tenant = state
        .engine
        .tenant_by_name(&label)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let player = state
        .engine
        .player_by_username(tenant.id, auth_header.username())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let credentials_ok = if player.password_hash.is_empty() {
        player.must_set_password && auth_header.password().is_empty()
    } else {
        password::verify_password(auth_header.password(), &player.password_hash)
    };
    if !credentials_ok {
        return Err(StatusCode::UNAUTHORIZED);
    }

    if player.must_set_password && request.uri().path() != "/set-password" {
        return Err(StatusCode::FORBIDDEN);
    }

    let ip = client_ip(&request);
    request.extensions_mut().insert::<Tenant>(tenant);
    request.extensions_mut().insert::<Player>(player);
    request.extensions_mut().insert::<ClientIp>(ip);
    Ok(next.run(request).await)
}

/// Build the full application router. Public so embedders and tests
/// can drive it without binding a socket.
pub fn router(state: ServerState) -> Router {
    let operator = Router::new()
        .route("/tenants", get(tenants::list).post(tenants::create))
        .route("/tenants/{name}", delete(tenants::remove))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            operator_auth,
        ));

    let tenant = Router::new()
        .route("/set-password", post(auth::set_password))
        .route("/change-password", post(auth::change_password))
        .route("/players", get(players::list).post(players::create))
        .route("/players/{username}", delete(players::remove))
        .route(
            "/players/{username}/toggle-admin",
            post(players::toggle_admin),
        )
        .route("/players/{username}/balance", post(players::set_balance))
        .route(
            "/players/{username}/reset-password",
            post(players::reset_password),
        )
        .route("/players/{username}/profile", get(statistics::profile))
        .route("/games", get(games::list).post(games::create))
        .route("/games/defaults", get(games::defaults))
        .route("/games/{id}", get(games::detail))
        .route("/games/{id}/players/{username}", post(games::correct))
        .route("/dashboard", get(statistics::dashboard))
        .route("/leaderboard", get(statistics::leaderboard))
        .route("/stats/monthly", get(statistics::monthly))
        .route("/stats/global", get(statistics::global))
        .route("/stats/progress", get(statistics::progress))
        .route("/audit", get(audit::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), tenant_auth));

    operator.merge(tenant).with_state(state)
}

pub async fn run(engine: Engine, config: ServerConfig, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, config, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        config: Arc::new(config),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_base_domain_is_operator_scope() {
        assert_eq!(
            scope_for_host("poker.example", "poker.example"),
            HostScope::Operator
        );
        assert_eq!(
            scope_for_host("poker.example", "poker.example:8080"),
            HostScope::Operator
        );
    }

    #[test]
    fn single_label_selects_a_tenant() {
        assert_eq!(
            scope_for_host("poker.example", "friday.poker.example"),
            HostScope::Tenant("friday".to_string())
        );
        assert_eq!(
            scope_for_host("poker.example", "friday.poker.example:443"),
            HostScope::Tenant("friday".to_string())
        );
    }

    #[test]
    fn foreign_hosts_are_unknown() {
        assert_eq!(
            scope_for_host("poker.example", "other.example"),
            HostScope::Unknown
        );
        assert_eq!(
            scope_for_host("poker.example", "a.b.poker.example"),
            HostScope::Unknown
        );
        assert_eq!(scope_for_host("poker.example", ""), HostScope::Unknown);
        assert_eq!(
            scope_for_host("poker.example", ".poker.example"),
            HostScope::Unknown
        );
    }
}
