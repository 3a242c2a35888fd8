//! Password hashing, sessions and the admin guard

use ams_core::{Error, Result};
use ams_database::{queries, sqlx::Pool, sqlx::Sqlite, CreateStaff};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crate::config::AdminConfig;
use crate::routes::ApiError;
use crate::state::AppState;

/// Session key holding the signed-in staff member
pub const USER_KEY: &str = "user";

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Signed-in staff member, stored in the session and handed to admin
/// handlers as a request extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub userid: String,
    pub name: String,
}

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::AuthError(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

/// Look up a staff member and check their password.
///
/// Inactive staff and staff with login disabled are refused even with the
/// right password.
pub async fn authenticate(pool: &Pool<Sqlite>, userid: &str, password: &str) -> Result<SessionUser> {
    let denied = || Error::AuthError("Invalid user id or password".to_string());

    let staff = match queries::get_staff_by_userid(pool, userid).await {
        Ok(staff) => staff,
        Err(Error::NotFound(_)) => return Err(denied()),
        Err(e) => return Err(e),
    };

    if !verify_password(password, &staff.password_hash) {
        return Err(denied());
    }
    if !staff.can_login() {
        return Err(Error::AuthError("Login is disabled for this account".to_string()));
    }

    Ok(SessionUser {
        id: staff.id,
        userid: staff.userid,
        name: staff.name,
    })
}

/// Create the configured admin account unless that user id already exists
pub async fn ensure_admin(pool: &Pool<Sqlite>, admin: &AdminConfig) -> Result<bool> {
    match queries::get_staff_by_userid(pool, &admin.userid).await {
        Ok(_) => {
            debug!(userid = %admin.userid, "Admin account already present");
            return Ok(false);
        }
        Err(Error::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let input = CreateStaff {
        name: "Administrator".to_string(),
        role: "admin".to_string(),
        userid: admin.userid.clone(),
        password_hash: hash_password(&admin.password)?,
        login_enabled: true,
        ..Default::default()
    };
    queries::create_staff(pool, &input).await?;

    info!(userid = %admin.userid, "Created admin account");
    Ok(true)
}

/// Guard for admin routes.
///
/// The signed-in account is re-read on every request, so staff that were
/// deleted, deactivated or had login disabled lose access immediately and
/// their session is dropped. Without a usable account the dashboard page
/// redirects to the login form and every JSON endpoint answers 401.
pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match session.get::<SessionUser>(USER_KEY).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "Failed to read session");
            None
        }
    };

    let current = match user {
        Some(user) => match queries::get_staff(&state.pool, user.id).await {
            Ok(staff) if staff.can_login() => Some(SessionUser {
                id: staff.id,
                userid: staff.userid,
                name: staff.name,
            }),
            Ok(_) | Err(Error::NotFound(_)) => {
                info!(userid = %user.userid, "Session revoked for account without access");
                if let Err(e) = session.flush().await {
                    warn!(error = %e, "Failed to flush revoked session");
                }
                None
            }
            Err(e) => return ApiError::from_error(e).into_response(),
        },
        None => None,
    };

    match current {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None if request.uri().path() == "/admin" => Redirect::to("/login").into_response(),
        None => ApiError::unauthorized("Login required").into_response(),
    }
}
