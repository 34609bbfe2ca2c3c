// src/services/auth.rs

//! Sign-in rules: seeded demo accounts, stored users, and student accounts
//! created on first login.

use chrono::Utc;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginResponse, PublicUser, RegisterRequest, Role, User},
    storage::Stores,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

pub fn new_user_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Name derived from the e-mail's local part.
pub fn name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Creates the configured admin and student accounts if they are missing.
pub async fn seed_users(stores: &Stores, config: &Config) -> Result<(), AppError> {
    let seeds = [
        (&config.admin_email, &config.admin_password, "Admin User", Role::Admin),
        (&config.student_email, &config.student_password, "John Student", Role::Student),
    ];

    for (email, password, name, role) in seeds {
        let (Some(email), Some(password)) = (email, password) else {
            continue;
        };
        if stores.users.find_by_email(email).await?.is_some() {
            continue;
        }

        tracing::info!("Seeding {} account: {}", role.as_str(), email);
        stores
            .users
            .insert(User {
                id: new_user_id(),
                name: name.to_string(),
                email: email.clone(),
                role,
                password_hash: Some(hash_password(password)?),
                created_at: Some(Utc::now()),
            })
            .await?;
    }
    Ok(())
}

/// Resolves the user for a login attempt.
///
/// Known e-mails must match the stored password when one was set. Unknown
/// e-mails get a new student account protected by the given password.
pub async fn authenticate(stores: &Stores, email: &str, password: &str) -> Result<User, AppError> {
    if let Some(user) = stores.users.find_by_email(email).await? {
        return match &user.password_hash {
            Some(hash) if !verify_password(password, hash)? => {
                tracing::warn!("Failed login for {}", email);
                Err(AppError::AuthError("Invalid credentials".to_string()))
            }
            _ => Ok(user),
        };
    }

    let user = User {
        id: new_user_id(),
        name: name_from_email(email),
        email: email.to_string(),
        role: Role::Student,
        password_hash: Some(hash_password(password)?),
        created_at: Some(Utc::now()),
    };
    tracing::info!("Creating student account on first login: {}", email);
    stores.users.insert(user).await
}

pub async fn register(stores: &Stores, req: RegisterRequest) -> Result<User, AppError> {
    let user = User {
        id: new_user_id(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        role: Role::Student,
        password_hash: Some(hash_password(&req.password)?),
        created_at: Some(Utc::now()),
    };

    let user = stores.users.insert(user).await.inspect_err(|e| {
        if matches!(e, AppError::Conflict(_)) {
            tracing::warn!("Registration refused, e-mail in use: {}", req.email);
        }
    })?;
    tracing::info!("Registered user {}", user.id);
    Ok(user)
}

/// Opens the session record and signs a token for it.
pub async fn open_session(
    stores: &Stores,
    config: &Config,
    user: &User,
) -> Result<LoginResponse, AppError> {
    let record = stores.users.open_session(user).await?;
    let token = sign_jwt(&user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;

    tracing::info!("User {} signed in", user.id);
    Ok(LoginResponse {
        token,
        token_type: "Bearer",
        user: record.user,
    })
}

pub async fn current_user(stores: &Stores, user_id: &str) -> Result<PublicUser, AppError> {
    stores
        .users
        .find_by_id(user_id)
        .await?
        .map(|u| PublicUser::from(&u))
        .ok_or(AppError::NotFound("User not found".to_string()))
}
