//! Accounts, password hashing and bearer sessions.
//!
//! Passwords are stored as hex PBKDF2-HMAC-SHA256 with a fresh 16-byte salt
//! per user. Session tokens are 32 random bytes, hex encoded,
//! kept in the `sessions` table until they expire.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use mindcoach_shared::records::{TokenResponse, User, UserCreate};
use rand::RngCore;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::mask_token;
use crate::server::AppState;
use crate::store::Store;

pub const SALT_BYTES: usize = 16;
pub const TOKEN_BYTES: usize = 32;
pub const PBKDF2_ROUNDS: u32 = 100_000;
const HASH_BYTES: usize = 32;

fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

pub fn new_salt() -> String {
    random_hex(SALT_BYTES)
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut out = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut out);
    hex::encode(out)
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let actual = hash_password(password, salt);
    // Compare without early exit
    actual.len() == expected_hash.len()
        && actual
            .bytes()
            .zip(expected_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Create a session for `user_id` and return its token.
pub fn issue_token(store: &Store, config: &AuthConfig, user_id: i64) -> anyhow::Result<String> {
    let token = random_hex(TOKEN_BYTES);
    let expires_at = Utc::now() + Duration::minutes(config.token_ttl_minutes);
    store.insert_session(&token, user_id, expires_at)?;
    debug!("Issued session {} for user {}", mask_token(&token), user_id);
    Ok(token)
}

fn token_response(token: String, user: User) -> TokenResponse {
    TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user,
    }
}

pub fn register(store: &Store, config: &AuthConfig, request: &UserCreate) -> ApiResult<TokenResponse> {
    let email = request.email.trim();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if request.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }
    if store.email_exists(email)? {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let salt = new_salt();
    let hash = hash_password(&request.password, &salt);
    // A concurrent register can pass the check above; the UNIQUE index decides
    let Some(user) = store.create_user(email, request.username.trim(), &hash, &salt)? else {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    };
    info!("Registered user {} ({})", user.id, user.username);

    let token = issue_token(store, config, user.id)?;
    Ok(token_response(token, user))
}

pub fn login(store: &Store, config: &AuthConfig, email: &str, password: &str) -> ApiResult<TokenResponse> {
    let Some(creds) = store.user_credentials(email.trim())? else {
        warn!("Login failed: unknown account");
        return Err(ApiError::Unauthorized);
    };
    if !verify_password(password, &creds.password_salt, &creds.password_hash) {
        warn!("Login failed for user {}", creds.user.id);
        return Err(ApiError::Unauthorized);
    }

    // Opportunistic sweep so the table doesn't grow without bound
    let purged = store.purge_expired_sessions(Utc::now())?;
    if purged > 0 {
        debug!("Purged {} expired sessions", purged);
    }

    let token = issue_token(store, config, creds.user.id)?;
    Ok(token_response(token, creds.user))
}

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// The user owning the request's bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let user_id = state
            .store
            .session_user(token, Utc::now())?
            .ok_or(ApiError::Unauthorized)?;
        let user = state.store.get_user(user_id)?.ok_or(ApiError::Unauthorized)?;
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> UserCreate {
        UserCreate {
            email: email.to_string(),
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("pw", "aa");
        let b = hash_password("pw", "bb");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(verify_password("pw", "aa", &a));
        assert!(!verify_password("pw", "bb", &a));
        assert!(!verify_password("PW", "aa", &a));
    }

    #[test]
    fn test_hash_is_not_plain_sha256() {
        use sha2::Digest;
        let single = hex::encode(Sha256::digest(b"aapw"));
        assert_ne!(hash_password("pw", "aa"), single);
    }

    #[test]
    fn test_salt_and_token_lengths() {
        assert_eq!(new_salt().len(), SALT_BYTES * 2);
        assert_ne!(new_salt(), new_salt());
    }

    #[test]
    fn test_register_then_login() {
        let store = Store::open_in_memory().unwrap();
        let config = AuthConfig::default();

        let registered = register(&store, &config, &new_user("a@example.com")).unwrap();
        assert_eq!(registered.token_type, "bearer");
        assert_eq!(registered.access_token.len(), TOKEN_BYTES * 2);

        let logged_in = login(&store, &config, "a@example.com", "s3cret").unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
        assert_ne!(logged_in.access_token, registered.access_token);
        assert_eq!(
            store.session_user(&logged_in.access_token, Utc::now()).unwrap(),
            Some(registered.user.id)
        );
    }

    #[test]
    fn test_register_duplicate_email() {
        let store = Store::open_in_memory().unwrap();
        let config = AuthConfig::default();
        register(&store, &config, &new_user("a@example.com")).unwrap();
        let err = register(&store, &config, &new_user("a@example.com")).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        // Insert behind register's back, as a racing request would
        let store = Store::open_in_memory().unwrap();
        store
            .create_user("a@example.com", "first", "h", "s")
            .unwrap()
            .unwrap();
        assert!(store
            .create_user("a@example.com", "second", "h", "s")
            .unwrap()
            .is_none());
        let err = register(&store, &AuthConfig::default(), &new_user("a@example.com")).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_register_rejects_bad_email() {
        let store = Store::open_in_memory().unwrap();
        let err = register(&store, &AuthConfig::default(), &new_user("nope")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_login_failures() {
        let store = Store::open_in_memory().unwrap();
        let config = AuthConfig::default();
        register(&store, &config, &new_user("a@example.com")).unwrap();

        assert!(matches!(
            login(&store, &config, "a@example.com", "wrong"),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            login(&store, &config, "b@example.com", "s3cret"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_ttl_token_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let config = AuthConfig {
            token_ttl_minutes: 0,
        };
        let response = register(&store, &config, &new_user("a@example.com")).unwrap();
        assert_eq!(
            store.session_user(&response.access_token, Utc::now()).unwrap(),
            None
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert("authorization", "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer   ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
