//! # Autenticación
//!
//! Registro y login de huéspedes y administradores, cierre de sesión por rol
//! y traspaso de la reserva pendiente a la cuenta recién autenticada.
//!
//! Las contraseñas se guardan con argon2 (sal aleatoria por cuenta). Un
//! identificador desconocido y una contraseña errónea producen exactamente el
//! mismo error.

use serde::Deserialize;

use crate::api::{AppError, AppResult, ResultExt, StatusMessage};
use crate::db::models::{AdminAccount, Booking, GuestAccount};
use crate::db::SqliteRepo;
use crate::lifecycle::{self, BookingDraft};
use crate::session::{AdminIdentity, GuestIdentity, SessionData};

pub const MIN_PASSWORD_LEN: usize = 6;

const GUEST_LOGIN_FAILED: &str = "Invalid email or password.";
const ADMIN_LOGIN_FAILED: &str = "Invalid username/email or password.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Guest,
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Validación básica de email: una arroba, parte local no vacía y dominio
/// con punto
pub fn validate_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !email.chars().any(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

fn validate_password(password: &str, confirm_password: &str) -> AppResult<()> {
    if password != confirm_password {
        return Err(AppError::validation_field("confirm_password", "Passwords do not match."));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation_field(
            "password",
            "Password must be at least 6 characters long.",
        ));
    }
    Ok(())
}

fn is_unique_violation(error: &AppError) -> bool {
    matches!(
        error,
        AppError::Database { source: sqlx::Error::Database(db), .. } if db.is_unique_violation()
    )
}

impl From<&GuestAccount> for GuestIdentity {
    fn from(account: &GuestAccount) -> Self {
        GuestIdentity {
            id: account.id,
            full_name: account.full_name.clone(),
            email: account.email.clone(),
            phone_number: account.phone_number.clone(),
        }
    }
}

impl From<&AdminAccount> for AdminIdentity {
    fn from(account: &AdminAccount) -> Self {
        AdminIdentity {
            id: account.id,
            username: account.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestRegistration {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminRegistration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestLogin {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminLogin {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Resultado de un registro o login de huésped
#[derive(Debug)]
pub struct GuestAuthenticated {
    pub guest: GuestIdentity,
    /// `Ok(None)` si no había reserva pendiente
    pub drained: AppResult<Option<Booking>>,
}

impl GuestAuthenticated {
    /// Mensaje para la vista de "mis reservas"
    pub fn status_message(&self, action: &str) -> StatusMessage {
        match &self.drained {
            Ok(Some(_)) => StatusMessage::success(format!(
                "{} successful and your booking has been confirmed!",
                action
            )),
            Ok(None) if action == "Registration" => {
                StatusMessage::success("Registration successful! Welcome!")
            }
            Ok(None) => StatusMessage::success(format!("{} successful! Welcome back!", action)),
            Err(e) => StatusMessage::error(format!(
                "{} successful, but there was an error confirming your booking: {}",
                action, e
            )),
        }
    }
}

/// Persiste la reserva pendiente a nombre del huésped autenticado
///
/// Nombre, email y teléfono se toman de la cuenta, no de lo que se escribió
/// en el formulario anónimo. El hueco se vacía solo si la inserción tuvo
/// éxito.
pub async fn drain_pending_booking(
    repo: &SqliteRepo,
    session: &mut SessionData,
    guest: &GuestIdentity,
) -> AppResult<Option<Booking>> {
    let Some(pending) = session.pending_booking.clone() else {
        return Ok(None);
    };

    let draft = BookingDraft::from(pending).with_contact_of(guest);
    let booking = lifecycle::create_booking(repo, &draft, Some(guest.id)).await?;
    session.pending_booking = None;

    tracing::info!(booking_id = booking.id, guest_id = guest.id, "Pending booking confirmed");
    Ok(Some(booking))
}

/// Registra un huésped, inicia su sesión y confirma la reserva pendiente
pub async fn register_guest(
    repo: &SqliteRepo,
    session: &mut SessionData,
    form: &GuestRegistration,
) -> AppResult<GuestAuthenticated> {
    let full_name = form.full_name.trim();
    let email = form.email.trim();
    let phone_number = form.phone_number.trim();

    if full_name.is_empty()
        || email.is_empty()
        || phone_number.is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return Err(AppError::Validation("All fields are required.".to_string()));
    }
    if !validate_email(email) {
        return Err(AppError::validation_field("email", "Invalid email format."));
    }
    validate_password(&form.password, &form.confirm_password)?;

    let duplicate = || {
        AppError::Validation(
            "Email already registered. Please login or use a different email.".to_string(),
        )
    };
    if repo.guest_email_exists(email).await? {
        return Err(duplicate());
    }

    let password_hash = hash_password(&form.password).map_err_internal("hashing password")?;
    let account = match repo.insert_guest(full_name, email, phone_number, &password_hash).await {
        Ok(account) => account,
        Err(e) if is_unique_violation(&e) => return Err(duplicate()),
        Err(e) => return Err(e),
    };

    let guest = GuestIdentity::from(&account);
    session.guest = Some(guest.clone());
    tracing::info!(guest_id = guest.id, "Guest registered");

    let drained = drain_pending_booking(repo, session, &guest).await;
    Ok(GuestAuthenticated { guest, drained })
}

/// Login de huésped por email
pub async fn login_guest(
    repo: &SqliteRepo,
    session: &mut SessionData,
    form: &GuestLogin,
) -> AppResult<GuestAuthenticated> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation(
            "Both email and password are required.".to_string(),
        ));
    }

    let account = repo
        .find_guest_by_email(email)
        .await?
        .filter(|account| verify_password(&form.password, &account.password_hash));

    let Some(account) = account else {
        tracing::warn!(email = %email, "Guest login failed");
        return Err(AppError::InvalidCredentials(GUEST_LOGIN_FAILED.to_string()));
    };

    let guest = GuestIdentity::from(&account);
    session.guest = Some(guest.clone());
    tracing::info!(guest_id = guest.id, "Guest logged in");

    let drained = drain_pending_booking(repo, session, &guest).await;
    Ok(GuestAuthenticated { guest, drained })
}

/// Registra un administrador. No inicia sesión.
pub async fn register_admin(repo: &SqliteRepo, form: &AdminRegistration) -> AppResult<AdminIdentity> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty()
        || email.is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return Err(AppError::Validation("All fields are required.".to_string()));
    }
    if !validate_email(email) {
        return Err(AppError::validation_field("email", "Invalid email format."));
    }
    validate_password(&form.password, &form.confirm_password)?;

    let duplicate = || AppError::Validation("Username or Email already registered.".to_string());
    if repo.admin_exists(username, email).await? {
        return Err(duplicate());
    }

    let password_hash = hash_password(&form.password).map_err_internal("hashing password")?;
    let account = match repo.insert_admin(username, email, &password_hash).await {
        Ok(account) => account,
        Err(e) if is_unique_violation(&e) => return Err(duplicate()),
        Err(e) => return Err(e),
    };

    tracing::info!(admin_id = account.id, username = %account.username, "Admin registered");
    Ok(AdminIdentity::from(&account))
}

/// Login de administrador por nombre de usuario o email
pub async fn login_admin(
    repo: &SqliteRepo,
    session: &mut SessionData,
    form: &AdminLogin,
) -> AppResult<AdminIdentity> {
    let identifier = form.identifier.trim();
    if identifier.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation("Both fields are required.".to_string()));
    }

    let mut matches = repo.find_admins_by_identifier(identifier).await?;
    let account = match matches.len() {
        1 => matches.pop().filter(|account| verify_password(&form.password, &account.password_hash)),
        _ => None,
    };

    let Some(account) = account else {
        tracing::warn!(identifier = %identifier, "Admin login failed");
        return Err(AppError::InvalidCredentials(ADMIN_LOGIN_FAILED.to_string()));
    };

    let admin = AdminIdentity::from(&account);
    session.admin = Some(admin.clone());
    tracing::info!(admin_id = admin.id, username = %admin.username, "Admin logged in");
    Ok(admin)
}

/// Borra solo la identidad del rol indicado
pub fn logout(session: &mut SessionData, role: Role) {
    match role {
        Role::Admin => {
            if let Some(admin) = session.admin.take() {
                tracing::info!(admin_id = admin.id, "Admin logged out");
            }
        }
        Role::Guest => {
            if let Some(guest) = session.guest.take() {
                tracing::info!(guest_id = guest.id, "Guest logged out");
            }
        }
    }
}
