//! User Service
//! Mission: Account lifecycle and credential checks over the store

use crate::auth::attempts::LoginAttemptTracker;
use crate::auth::models::{AddUserRequest, RegisterRequest, UpdateUserRequest, UserRecord};
use crate::auth::principal::UserPrincipal;
use crate::auth::roles::Role;
use crate::auth::user_store::UserStore;
use crate::email::Mailer;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

const GENERATED_PASSWORD_LEN: usize = 10;
const MEMBER_ID_LEN: usize = 10;

/// Expected, caller-recoverable failures of the user service.
#[derive(Debug)]
pub enum ServiceError {
    InvalidCredentials,
    AccountDisabled,
    AccountLocked,
    UsernameExists,
    EmailExists,
    UserNotFound(String),
    EmailNotFound(String),
    UnknownRole(String),
    Internal(anyhow::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::InvalidCredentials => write!(f, "Invalid username or password"),
            ServiceError::AccountDisabled => write!(f, "Account is disabled"),
            ServiceError::AccountLocked => {
                write!(f, "Account is locked after too many failed logins")
            }
            ServiceError::UsernameExists => write!(f, "Username already exists"),
            ServiceError::EmailExists => write!(f, "Email already exists"),
            ServiceError::UserNotFound(name) => write!(f, "No user found by username: {}", name),
            ServiceError::EmailNotFound(email) => write!(f, "No user found by email: {}", email),
            ServiceError::UnknownRole(role) => write!(f, "Unknown role: {}", role),
            ServiceError::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<anyhow::Error> for ServiceError {
    fn from(e: anyhow::Error) -> Self {
        ServiceError::Internal(e)
    }
}

/// Account lifecycle and authentication logic. Owns the injected
/// attempt tracker and the mail seam; never holds request state.
pub struct UserService {
    store: Arc<UserStore>,
    attempts: LoginAttemptTracker,
    mailer: Arc<dyn Mailer>,
}

impl UserService {
    pub fn new(store: Arc<UserStore>, attempts: LoginAttemptTracker, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            attempts,
            mailer,
        }
    }

    pub fn attempts(&self) -> &LoginAttemptTracker {
        &self.attempts
    }

    /// Check credentials and build the principal for this attempt.
    ///
    /// Disabled and locked accounts fail before the password is ever
    /// compared, with distinct error kinds. A wrong password feeds the
    /// attempt tracker; a correct one evicts the failure record and
    /// rolls the last-login dates.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserPrincipal, ServiceError> {
        let Some(record) = self.store.find_by_username(username)? else {
            warn!(username, "Login attempt for unknown username");
            self.attempts.record_failure(username);
            return Err(ServiceError::InvalidCredentials);
        };

        let principal = UserPrincipal::from_record(&record, &self.attempts);

        // A lock flip earned through failed attempts is durable: write
        // it back so the account stays locked across the attempt
        // window and process restarts, until an admin unlocks it.
        if record.not_locked && !principal.is_account_non_locked() {
            let mut locked = record.clone();
            locked.not_locked = false;
            self.store.update(&locked)?;
        }

        if !principal.is_enabled() {
            return Err(ServiceError::AccountDisabled);
        }
        if !principal.is_account_non_locked() {
            warn!(username, "Login attempt for locked account");
            return Err(ServiceError::AccountLocked);
        }

        let valid = verify(password, &record.password_hash).unwrap_or(false);
        if !valid {
            self.attempts.record_failure(username);
            warn!(username, "Failed login attempt");
            return Err(ServiceError::InvalidCredentials);
        }

        self.attempts.evict(username);

        let mut updated = record.clone();
        updated.last_login_date_display = record.last_login_date;
        updated.last_login_date = Some(Utc::now());
        self.store.update(&updated)?;

        info!(username, "Login successful");
        Ok(principal)
    }

    /// Self-service registration. The account always starts as an
    /// active, unlocked ROLE_USER; the generated password is delivered
    /// by mail, never returned over the wire.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserRecord, ServiceError> {
        self.validate_new_username_and_email(None, &request.username, &request.email)?;

        let password = generate_password();
        let record = UserRecord {
            id: 0,
            member_id: generate_member_id(),
            first_name: request.first_name.clone(),
            last_name: request.last_name,
            email: request.email.clone(),
            username: request.username,
            password_hash: encode_password(&password)?,
            profile_image_url: None,
            last_login_date: None,
            last_login_date_display: None,
            date_of_join: Utc::now(),
            role: Role::User,
            active: true,
            not_locked: true,
        };

        let created = self.store.insert(&record)?;
        self.mailer
            .send_new_password_email(&request.first_name, &password, &request.email)
            .await?;
        info!(username = %created.username, "Registered new user");
        Ok(created)
    }

    /// Admin user creation with caller-chosen role and account flags.
    pub async fn add_user(&self, request: AddUserRequest) -> Result<UserRecord, ServiceError> {
        self.validate_new_username_and_email(None, &request.username, &request.email)?;
        let role = Role::parse(&request.role)
            .map_err(|_| ServiceError::UnknownRole(request.role.clone()))?;

        let password = generate_password();
        let record = UserRecord {
            id: 0,
            member_id: generate_member_id(),
            first_name: request.first_name.clone(),
            last_name: request.last_name,
            email: request.email.clone(),
            username: request.username,
            password_hash: encode_password(&password)?,
            profile_image_url: None,
            last_login_date: None,
            last_login_date_display: None,
            date_of_join: Utc::now(),
            role,
            active: request.active,
            not_locked: request.not_locked,
        };

        let created = self.store.insert(&record)?;
        self.mailer
            .send_new_password_email(&request.first_name, &password, &request.email)
            .await?;
        Ok(created)
    }

    /// Update profile, role, and account flags of an existing user.
    pub fn update_user(&self, request: UpdateUserRequest) -> Result<UserRecord, ServiceError> {
        let current = self
            .store
            .find_by_username(&request.current_username)?
            .ok_or_else(|| ServiceError::UserNotFound(request.current_username.clone()))?;

        self.validate_new_username_and_email(
            Some(&current),
            &request.username,
            &request.email,
        )?;
        let role = Role::parse(&request.role)
            .map_err(|_| ServiceError::UnknownRole(request.role.clone()))?;

        let mut updated = current;
        updated.first_name = request.first_name;
        updated.last_name = request.last_name;
        updated.email = request.email;
        updated.username = request.username;
        updated.role = role;
        updated.active = request.active;
        updated.not_locked = request.not_locked;

        self.store.update(&updated)?;
        info!(username = %updated.username, "Updated user");
        Ok(updated)
    }

    /// Replace the password with a fresh generated one and mail it.
    pub async fn reset_password(&self, email: &str) -> Result<(), ServiceError> {
        let mut record = self
            .store
            .find_by_email(email)?
            .ok_or_else(|| ServiceError::EmailNotFound(email.to_string()))?;

        let password = generate_password();
        record.password_hash = encode_password(&password)?;
        self.store.update(&record)?;

        self.mailer
            .send_new_password_email(&record.first_name, &password, email)
            .await?;
        info!(username = %record.username, "Password reset");
        Ok(())
    }

    pub fn find_by_username(&self, username: &str) -> Result<UserRecord, ServiceError> {
        self.store
            .find_by_username(username)?
            .ok_or_else(|| ServiceError::UserNotFound(username.to_string()))
    }

    pub fn list(&self) -> Result<Vec<UserRecord>, ServiceError> {
        Ok(self.store.list()?)
    }

    pub fn delete(&self, username: &str) -> Result<(), ServiceError> {
        if self.store.delete_by_username(username)? {
            Ok(())
        } else {
            Err(ServiceError::UserNotFound(username.to_string()))
        }
    }

    /// Uniqueness validation for registration and updates. When
    /// `current` is set, matches against the user's own row are
    /// allowed.
    fn validate_new_username_and_email(
        &self,
        current: Option<&UserRecord>,
        new_username: &str,
        new_email: &str,
    ) -> Result<(), ServiceError> {
        let by_username = self.store.find_by_username(new_username)?;
        let by_email = self.store.find_by_email(new_email)?;

        match current {
            Some(current) => {
                if by_username.is_some_and(|u| u.member_id != current.member_id) {
                    return Err(ServiceError::UsernameExists);
                }
                if by_email.is_some_and(|u| u.member_id != current.member_id) {
                    return Err(ServiceError::EmailExists);
                }
            }
            None => {
                if by_username.is_some() {
                    return Err(ServiceError::UsernameExists);
                }
                if by_email.is_some() {
                    return Err(ServiceError::EmailExists);
                }
            }
        }
        Ok(())
    }
}

fn encode_password(password: &str) -> Result<String, ServiceError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

fn generate_password() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_PASSWORD_LEN)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}

fn generate_member_id() -> String {
    let mut rng = rand::thread_rng();
    (0..MEMBER_ID_LEN)
        .map(|_| rng.gen_range(b'0'..=b'9') as char)
        .collect()
}
