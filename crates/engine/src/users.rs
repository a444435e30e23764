//! Staff accounts.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{EngineError, ResultEngine, Role};

/// A staff account as exposed by the engine. The password hash never leaves
/// the entity model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub nama_lengkap: String,
    pub role: Role,
    pub email: Option<String>,
    pub no_hp: Option<String>,
    pub aktif: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for account creation.
#[derive(Clone, Debug, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub nama_lengkap: String,
    /// Defaults to `operator` (or `admin` for the bootstrap account).
    pub role: Option<Role>,
    pub email: Option<String>,
    pub no_hp: Option<String>,
}

/// Partial update of an account. Only `Some` fields are written; an empty
/// `email`/`no_hp` string clears the column.
#[derive(Clone, Debug, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub nama_lengkap: Option<String>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub no_hp: Option<String>,
    pub aktif: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.nama_lengkap.is_none()
            && self.role.is_none()
            && self.email.is_none()
            && self.no_hp.is_none()
            && self.aktif.is_none()
    }

    /// Move the present fields into `active`. Values must already be
    /// normalized.
    pub(crate) fn apply(self, active: &mut ActiveModel) {
        if let Some(username) = self.username {
            active.username = ActiveValue::Set(username);
        }
        if let Some(nama_lengkap) = self.nama_lengkap {
            active.nama_lengkap = ActiveValue::Set(nama_lengkap);
        }
        if let Some(role) = self.role {
            active.role = ActiveValue::Set(role.as_str().to_string());
        }
        if let Some(email) = self.email {
            active.email = ActiveValue::Set(crate::util::non_empty(email));
        }
        if let Some(no_hp) = self.no_hp {
            active.no_hp = ActiveValue::Set(crate::util::non_empty(no_hp));
        }
        if let Some(aktif) = self.aktif {
            active.aktif = ActiveValue::Set(aktif);
        }
    }
}

/// Self-service profile update.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub nama_lengkap: String,
    pub email: Option<String>,
    pub no_hp: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub nama_lengkap: String,
    pub role: String,
    pub email: Option<String>,
    pub no_hp: Option<String>,
    pub aktif: bool,
    pub last_login: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_sessions::Entity")]
    Sessions,
    #[sea_orm(has_many = "super::user_permissions::Entity")]
    Permissions,
}

impl Related<super::user_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl Related<super::user_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Permissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn role(&self) -> ResultEngine<Role> {
        Role::try_from(self.role.as_str())
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let role = model.role()?;
        Ok(User {
            id: model.id,
            username: model.username,
            nama_lengkap: model.nama_lengkap,
            role,
            email: model.email,
            no_hp: model.no_hp,
            aktif: model.aktif,
            last_login: model.last_login,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
