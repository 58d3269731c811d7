//! User accounts and roles.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{ComunaId, RegionId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::validation;

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Seller,
    #[default]
    Customer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Seller, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Seller => "SELLER",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == upper)
            .ok_or_else(|| DomainError::InvalidRole(s.to_string()))
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Chilean national id without separators, unique when present.
    pub run: Option<String>,
    pub first_names: String,
    pub last_names: String,
    /// Unique across users.
    pub email: String,
    pub role: Role,
    pub address: Option<String>,
    pub region_id: Option<RegionId>,
    pub comuna_id: Option<ComunaId>,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub active: bool,
}

/// Input for registering a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub run: Option<String>,
    pub first_names: String,
    pub last_names: String,
    pub email: String,
    pub role: Option<Role>,
    pub address: Option<String>,
    pub region_id: Option<RegionId>,
    pub comuna_id: Option<ComunaId>,
    pub phone: Option<String>,
}

/// Partial update of a user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub run: Option<String>,
    pub first_names: Option<String>,
    pub last_names: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub address: Option<String>,
    pub region_id: Option<RegionId>,
    pub comuna_id: Option<ComunaId>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

impl User {
    /// Validates the input and builds a new active user.
    ///
    /// Email is lowercased. Region and comuna consistency is checked by the
    /// service, which can see the location table.
    pub fn register(new: NewUser, now: DateTime<Utc>) -> Result<Self, DomainError> {
        if let Some(run) = &new.run {
            validation::run(run)?;
        }
        validation::required("first_names", &new.first_names, 50)?;
        validation::required("last_names", &new.last_names, 50)?;
        validation::email(&new.email)?;
        validation::optional("address", new.address.as_deref(), 200)?;
        validation::optional("phone", new.phone.as_deref(), 20)?;

        Ok(Self {
            id: UserId::new(),
            run: new.run.map(|run| run.to_ascii_uppercase()),
            first_names: new.first_names.trim().to_string(),
            last_names: new.last_names.trim().to_string(),
            email: normalize_email(&new.email),
            role: new.role.unwrap_or_default(),
            address: new.address,
            region_id: new.region_id,
            comuna_id: new.comuna_id,
            phone: new.phone,
            registered_at: now,
            active: true,
        })
    }

    /// Applies a partial update, validating every provided field first.
    pub fn apply(&mut self, patch: UserPatch) -> Result<(), DomainError> {
        if let Some(run) = &patch.run {
            validation::run(run)?;
        }
        if let Some(first) = &patch.first_names {
            validation::required("first_names", first, 50)?;
        }
        if let Some(last) = &patch.last_names {
            validation::required("last_names", last, 50)?;
        }
        if let Some(email) = &patch.email {
            validation::email(email)?;
        }
        validation::optional("address", patch.address.as_deref(), 200)?;
        validation::optional("phone", patch.phone.as_deref(), 20)?;

        if let Some(run) = patch.run {
            self.run = Some(run.to_ascii_uppercase());
        }
        if let Some(first) = patch.first_names {
            self.first_names = first.trim().to_string();
        }
        if let Some(last) = patch.last_names {
            self.last_names = last.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = normalize_email(&email);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
        if let Some(region_id) = patch.region_id {
            self.region_id = Some(region_id);
        }
        if let Some(comuna_id) = patch.comuna_id {
            self.comuna_id = Some(comuna_id);
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        Ok(())
    }

    /// First and last names joined by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_names)
            .trim()
            .to_string()
    }

    /// Case-insensitive substring match over first or last names.
    pub fn name_matches(&self, text: &str) -> bool {
        let needle = text.to_lowercase();
        self.first_names.to_lowercase().contains(&needle)
            || self.last_names.to_lowercase().contains(&needle)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
