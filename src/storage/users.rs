// src/storage/users.rs

use chrono::Utc;

use super::{JsonStore, keys};
use crate::{
    error::AppError,
    models::user::{PublicUser, Role, SessionRecord, User},
};

#[derive(Clone)]
pub struct UserStore {
    json: JsonStore,
}

impl UserStore {
    pub fn new(json: JsonStore) -> Self {
        Self { json }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.json.load_or_default(keys::USERS).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.list().await?.into_iter().find(|u| u.id == id))
    }

    /// E-mail lookup is case-insensitive.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    /// Appends a user. Fails with `Conflict` if the e-mail is taken.
    pub async fn insert(&self, user: User) -> Result<User, AppError> {
        self.json
            .update(keys::USERS, move |users: &mut Vec<User>| {
                if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
                    return Err(AppError::Conflict("User already exists".to_string()));
                }
                users.push(user.clone());
                Ok(user)
            })
            .await
    }

    pub async fn set_name(&self, id: &str, name: &str) -> Result<User, AppError> {
        self.modify(id, |user| user.name = name.to_string()).await
    }

    pub async fn set_role(&self, id: &str, role: Role) -> Result<User, AppError> {
        self.modify(id, |user| user.role = role).await
    }

    async fn modify<F>(&self, id: &str, f: F) -> Result<User, AppError>
    where
        F: FnOnce(&mut User) + Send,
    {
        self.json
            .update(keys::USERS, |users: &mut Vec<User>| {
                let user = users
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or(AppError::NotFound("User not found".to_string()))?;
                f(user);
                Ok(user.clone())
            })
            .await
    }

    pub async fn open_session(&self, user: &User) -> Result<SessionRecord, AppError> {
        let record = SessionRecord {
            user: PublicUser::from(user),
            signed_in_at: Utc::now(),
        };
        self.json.save(&keys::session(&user.id), &record).await?;
        Ok(record)
    }

    /// Rewrites an existing session record with the user's current details.
    pub async fn refresh_session(&self, user: &User) -> Result<(), AppError> {
        if let Some(mut record) = self.session(&user.id).await? {
            record.user = PublicUser::from(user);
            self.json.save(&keys::session(&user.id), &record).await?;
        }
        Ok(())
    }

    pub async fn session(&self, user_id: &str) -> Result<Option<SessionRecord>, AppError> {
        self.json.load(&keys::session(user_id)).await
    }

    pub async fn close_session(&self, user_id: &str) -> Result<(), AppError> {
        self.json.remove(&keys::session(user_id)).await
    }
}
