use crate::core::AppError;
use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use futures_util::future::LocalBoxFuture;
use sqlx::MySqlPool;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::str::FromStr;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Role granted every permission
pub const ADMIN_ROLE: &str = "admin";

/// Paths served without an API key
pub const PUBLIC_PATHS: [&str; 3] = ["/", "/health", "/ready"];

/// Operation-level permission carried by an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    InvoicesRead,
    InvoicesWrite,
    PaymentsWrite,
    ConciliationsRead,
    ConciliationsWrite,
    CasesRead,
    CasesWrite,
    ReportsRead,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::InvoicesRead,
        Permission::InvoicesWrite,
        Permission::PaymentsWrite,
        Permission::ConciliationsRead,
        Permission::ConciliationsWrite,
        Permission::CasesRead,
        Permission::CasesWrite,
        Permission::ReportsRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::InvoicesRead => "invoices.read",
            Permission::InvoicesWrite => "invoices.write",
            Permission::PaymentsWrite => "payments.write",
            Permission::ConciliationsRead => "conciliations.read",
            Permission::ConciliationsWrite => "conciliations.write",
            Permission::CasesRead => "cases.read",
            Permission::CasesWrite => "cases.write",
            Permission::ReportsRead => "reports.read",
        }
    }

    /// Parse a comma-separated permission list, ignoring unknown entries
    pub fn parse_list(raw: &str) -> Vec<Permission> {
        raw.split(',')
            .filter_map(|p| Permission::from_str(p.trim()).ok())
            .collect()
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(s: &str) -> crate::core::Result<Self> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown permission: {}", s)))
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller resolved from a valid API key
///
/// Inserted into request extensions by [`ApiKeyAuth`]; handlers take it as
/// an extractor and check permissions before doing any work.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub key_id: String,
    pub user_name: String,
    pub role: String,
    pub permissions: Vec<Permission>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.is_admin() || self.permissions.contains(&permission)
    }

    pub fn require(&self, permission: Permission) -> crate::core::Result<()> {
        if self.has(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user = %self.user_name,
                permission = %permission,
                "Permission denied"
            );
            Err(AppError::forbidden(format!("Missing permission: {}", permission)))
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or_else(|| AppError::unauthorized("Authentication required")),
        )
    }
}

/// API Key authentication middleware
pub struct ApiKeyAuth {
    pool: MySqlPool,
}

impl ApiKeyAuth {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthMiddleware<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthMiddleware {
            service: Rc::new(service),
            pool: self.pool.clone(),
        }))
    }
}

pub struct ApiKeyAuthMiddleware<S> {
    service: Rc<S>,
    pool: MySqlPool,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let pool = self.pool.clone();

        Box::pin(async move {
            if PUBLIC_PATHS.contains(&req.path()) {
                return svc.call(req).await.map(|res| res.map_into_left_body());
            }

            let api_key = req
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);

            let outcome = match api_key {
                Some(api_key) => authenticate(&pool, &api_key).await,
                None => Err(AppError::unauthorized("Missing X-API-Key header")),
            };

            match outcome {
                Ok(user) => {
                    tracing::debug!(user = %user.user_name, role = %user.role, "API key accepted");
                    req.extensions_mut().insert(user);
                    svc.call(req).await.map(|res| res.map_into_left_body())
                }
                Err(e) => {
                    tracing::debug!(path = %req.path(), error = %e, "Request rejected by API key check");
                    Ok(req.into_response(e.error_response()).map_into_right_body())
                }
            }
        })
    }
}

/// Split `<prefix>.<secret>`
pub fn split_api_key(api_key: &str) -> Option<(&str, &str)> {
    api_key
        .split_once('.')
        .filter(|(prefix, secret)| !prefix.is_empty() && !secret.is_empty())
}

#[derive(Debug, sqlx::FromRow)]
struct ApiKeyRow {
    id: String,
    key_hash: String,
    user_name: String,
    role: String,
    permissions: String,
    is_active: bool,
}

async fn authenticate(pool: &MySqlPool, api_key: &str) -> crate::core::Result<AuthenticatedUser> {
    let (prefix, secret) =
        split_api_key(api_key).ok_or_else(|| AppError::unauthorized("Invalid API key"))?;

    let record = sqlx::query_as::<_, ApiKeyRow>(
        r#"
        SELECT id, key_hash, user_name, role, permissions, is_active
        FROM api_keys
        WHERE key_prefix = ?
        LIMIT 1
        "#,
    )
    .bind(prefix)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::unauthorized("Invalid API key"))?;

    if !record.is_active {
        return Err(AppError::unauthorized("API key is inactive"));
    }

    if !verify_api_key(secret, &record.key_hash)? {
        tracing::warn!(key_prefix = prefix, "API key secret mismatch");
        return Err(AppError::unauthorized("Invalid API key"));
    }

    if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = UTC_TIMESTAMP() WHERE id = ?")
        .bind(&record.id)
        .execute(pool)
        .await
    {
        tracing::warn!(error = %e, key_id = %record.id, "Failed to update API key last_used_at");
    }

    Ok(AuthenticatedUser {
        key_id: record.id,
        user_name: record.user_name,
        permissions: Permission::parse_list(&record.permissions),
        role: record.role,
    })
}

/// Hash an API key secret using Argon2
pub fn hash_api_key(secret: &str) -> crate::core::Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
        Argon2,
    };

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash API key: {}", e)))
}

/// Verify an API key secret against its Argon2 hash
pub fn verify_api_key(secret: &str, hash: &str) -> crate::core::Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}
