//! User accounts.

use std::collections::HashMap;

use chrono::Utc;
use common::{ComunaId, RegionId, UserId};
use domain::{DomainError, NewUser, Role, User, UserPatch};
use store::{Store, UserQuery};

use crate::error::{Result, ServiceError};

/// A user with region and comuna names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub user: User,
    pub region_name: Option<String>,
    pub comuna_name: Option<String>,
}

pub struct UserService<S: Store> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks that the referenced region and comuna exist and agree.
    ///
    /// When only a comuna is given, its region is returned.
    async fn resolve_location(
        &self,
        region_id: Option<RegionId>,
        comuna_id: Option<ComunaId>,
    ) -> Result<Option<RegionId>> {
        if let Some(region_id) = region_id
            && self.store.get_region(region_id).await?.is_none()
        {
            return Err(ServiceError::not_found("Region", region_id));
        }
        let Some(comuna_id) = comuna_id else {
            return Ok(region_id);
        };
        let comuna = self
            .store
            .get_comuna(comuna_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comuna", comuna_id))?;
        match region_id {
            Some(region_id) if region_id != comuna.region_id => Err(DomainError::validation(
                "comuna_id",
                "does not belong to the given region",
            )
            .into()),
            _ => Ok(Some(comuna.region_id)),
        }
    }

    /// Resolves location names for `users`, reading regions and comunas once.
    pub async fn describe_users(&self, users: Vec<User>) -> Result<Vec<UserView>> {
        let regions: HashMap<RegionId, String> = self
            .store
            .list_regions(false)
            .await?
            .into_iter()
            .map(|region| (region.id, region.name))
            .collect();
        let comunas: HashMap<ComunaId, String> = self
            .store
            .list_comunas(None, false)
            .await?
            .into_iter()
            .map(|comuna| (comuna.id, comuna.name))
            .collect();
        Ok(users
            .into_iter()
            .map(|user| UserView {
                region_name: user.region_id.and_then(|id| regions.get(&id).cloned()),
                comuna_name: user.comuna_id.and_then(|id| comunas.get(&id).cloned()),
                user,
            })
            .collect())
    }

    pub async fn describe_user(&self, user: User) -> Result<UserView> {
        let region_name = match user.region_id {
            Some(id) => self.store.get_region(id).await?.map(|region| region.name),
            None => None,
        };
        let comuna_name = match user.comuna_id {
            Some(id) => self.store.get_comuna(id).await?.map(|comuna| comuna.name),
            None => None,
        };
        Ok(UserView {
            user,
            region_name,
            comuna_name,
        })
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.list_users(UserQuery::new()).await?)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    pub async fn users_with_role(&self, role: Role) -> Result<Vec<User>> {
        Ok(self.store.list_users(UserQuery::new().role(role)).await?)
    }

    /// Users whose first or last names contain `text`, ignoring case.
    pub async fn search_users(&self, text: &str) -> Result<Vec<User>> {
        Ok(self
            .store
            .list_users(UserQuery::new().name_contains(text))
            .await?)
    }

    #[tracing::instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create_user(&self, mut new: NewUser) -> Result<User> {
        new.region_id = self.resolve_location(new.region_id, new.comuna_id).await?;
        let user = User::register(new, Utc::now())?;
        let user = self.store.insert_user(user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    #[tracing::instrument(skip(self, patch))]
    pub async fn update_user(&self, id: UserId, mut patch: UserPatch) -> Result<User> {
        let mut user = self.get_user(id).await?;
        if let Some(comuna_id) = patch.comuna_id {
            patch.region_id = self.resolve_location(patch.region_id, Some(comuna_id)).await?;
        } else if let Some(region_id) = patch.region_id {
            self.resolve_location(Some(region_id), None).await?;
            // A comuna from the previous region no longer applies.
            if let Some(current) = user.comuna_id {
                let same_region = self
                    .store
                    .get_comuna(current)
                    .await?
                    .is_some_and(|comuna| comuna.region_id == region_id);
                if !same_region {
                    user.comuna_id = None;
                }
            }
        }
        user.apply(patch)?;
        Ok(self.store.update_user(user).await?)
    }

    pub async fn deactivate_user(&self, id: UserId) -> Result<User> {
        self.update_user(
            id,
            UserPatch {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes a user and every order they placed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        self.store.delete_user(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
