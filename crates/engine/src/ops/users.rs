use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use tracing::info;

use crate::{
    Action, Actor, EngineError, NewUser, ProfileUpdate, Resource, ResultEngine, Role, User,
    UserPatch, password, payments, user_permissions, user_sessions, users,
    util::{
        check_max_len, non_empty, normalize_optional_text, normalize_required, validate_password,
    },
};

use super::{Engine, with_tx};

const USERNAME_MAX_LEN: usize = 50;
const NAMA_MAX_LEN: usize = 100;

impl Engine {
    /// Open registration.
    ///
    /// While no account exists anybody may register and the account becomes
    /// `admin`. Afterwards `actor` must be an admin.
    pub async fn register(&self, actor: Option<&Actor>, new_user: NewUser) -> ResultEngine<User> {
        let new_user = prepare_new_user(new_user)?;
        let hashed = password::hash(&new_user.password, self.password_cost)?;
        with_tx!(self, |db_tx| {
            let existing = users::Entity::find().count(&db_tx).await?;
            let role = if existing == 0 {
                Role::Admin
            } else {
                let actor = actor.ok_or_else(|| {
                    EngineError::Unauthorized("Access token required".to_string())
                })?;
                Self::require_admin(actor)?;
                new_user.role.unwrap_or_default()
            };
            self.insert_user(&db_tx, new_user, hashed, role).await
        })
    }

    /// Create an account on behalf of an administrator. Only an admin may
    /// hand out the `admin` role.
    pub async fn create_user(&self, actor: &Actor, new_user: NewUser) -> ResultEngine<User> {
        let new_user = prepare_new_user(new_user)?;
        let role = new_user.role.unwrap_or_default();
        if role == Role::Admin {
            Self::require_admin(actor)?;
        }
        let hashed = password::hash(&new_user.password, self.password_cost)?;
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Users, Action::Create)
                .await?;
            self.insert_user(&db_tx, new_user, hashed, role).await
        })
    }

    /// Create an account without an acting user, for operator tooling
    /// running next to the database. The role defaults to `operator`.
    pub async fn provision_user(&self, new_user: NewUser) -> ResultEngine<User> {
        let new_user = prepare_new_user(new_user)?;
        let hashed = password::hash(&new_user.password, self.password_cost)?;
        with_tx!(self, |db_tx| {
            let role = new_user.role.unwrap_or_default();
            self.insert_user(&db_tx, new_user, hashed, role).await
        })
    }

    /// All accounts, newest first.
    pub async fn users(&self, actor: &Actor) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Users, Action::Read)
                .await?;
            let models = users::Entity::find()
                .order_by_desc(users::Column::CreatedAt)
                .order_by_desc(users::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(User::try_from).collect()
        })
    }

    pub async fn user(&self, actor: &Actor, user_id: i32) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            if actor.id != user_id {
                self.authorize(&db_tx, actor, Resource::Users, Action::Read)
                    .await?;
            }
            User::try_from(self.require_user(&db_tx, user_id).await?)
        })
    }

    pub async fn update_user(
        &self,
        actor: &Actor,
        user_id: i32,
        mut patch: UserPatch,
    ) -> ResultEngine<User> {
        if patch.is_empty() {
            return Err(EngineError::NothingToUpdate);
        }
        // Role changes stay with admins whatever the `users` override says.
        if patch.role.is_some() {
            Self::require_admin(actor)?;
        }
        if let Some(username) = patch.username.take() {
            patch.username = Some(normalize_username(&username)?);
        }
        if let Some(nama_lengkap) = patch.nama_lengkap.take() {
            patch.nama_lengkap = Some(normalize_nama_lengkap(&nama_lengkap)?);
        }
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Users, Action::Update)
                .await?;
            let model = self.require_user(&db_tx, user_id).await?;
            if model.role()? == Role::Admin {
                Self::require_admin(actor)?;
            }

            if let Some(username) = patch.username.as_deref() {
                self.ensure_username_free(&db_tx, username, Some(user_id))
                    .await?;
            }

            let demoted = patch.role.is_some_and(|role| role != Role::Admin);
            let deactivated = patch.aktif == Some(false);
            if (demoted || deactivated) && model.aktif && model.role()? == Role::Admin {
                self.ensure_other_active_admin(&db_tx, user_id).await?;
            }
            if deactivated {
                self.revoke_sessions(&db_tx, user_id, None).await?;
            }

            let mut active: users::ActiveModel = model.into();
            patch.apply(&mut active);
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            info!(user_id, by = actor.id, "user updated");
            User::try_from(model)
        })
    }

    /// Hard-delete an account. Self-deletion and removal of the last active
    /// admin are rejected.
    pub async fn delete_user(&self, actor: &Actor, user_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Users, Action::Delete)
                .await?;
            if actor.id == user_id {
                return Err(EngineError::InvalidField(
                    "Tidak dapat menghapus akun sendiri".to_string(),
                ));
            }
            let model = self.require_user(&db_tx, user_id).await?;
            if model.role()? == Role::Admin {
                Self::require_admin(actor)?;
                if model.aktif {
                    self.ensure_other_active_admin(&db_tx, user_id).await?;
                }
            }

            payments::Entity::update_many()
                .col_expr(payments::Column::CreatedBy, Expr::value(Option::<i32>::None))
                .filter(payments::Column::CreatedBy.eq(user_id))
                .exec(&db_tx)
                .await?;
            user_sessions::Entity::delete_many()
                .filter(user_sessions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            user_permissions::Entity::delete_many()
                .filter(user_permissions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(user_id).exec(&db_tx).await?;
            info!(user_id, by = actor.id, "user deleted");
            Ok(())
        })
    }

    pub async fn profile(&self, actor: &Actor) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            User::try_from(self.require_user(&db_tx, actor.id).await?)
        })
    }

    pub async fn update_profile(&self, actor: &Actor, update: ProfileUpdate) -> ResultEngine<User> {
        let nama_lengkap = normalize_nama_lengkap(&update.nama_lengkap)?;
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, actor.id).await?;
            let mut active: users::ActiveModel = model.into();
            active.nama_lengkap = ActiveValue::Set(nama_lengkap);
            active.email = ActiveValue::Set(update.email.and_then(non_empty));
            active.no_hp = ActiveValue::Set(update.no_hp.and_then(non_empty));
            active.updated_at = ActiveValue::Set(Utc::now());
            User::try_from(active.update(&db_tx).await?)
        })
    }

    /// Change the caller's own password. Every other session of the caller
    /// is revoked; `current_token` stays valid.
    pub async fn change_password(
        &self,
        actor: &Actor,
        old_password: &str,
        new_password: &str,
        current_token: Option<&str>,
    ) -> ResultEngine<()> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(EngineError::InvalidField(
                "Password lama dan baru harus diisi".to_string(),
            ));
        }
        validate_password(new_password, "Password baru minimal 6 karakter")?;
        let hashed = password::hash(new_password, self.password_cost)?;
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, actor.id).await?;
            if !password::verify(old_password, &model.password) {
                return Err(EngineError::InvalidField("Password lama salah".to_string()));
            }
            self.store_password(&db_tx, model, hashed).await?;
            self.revoke_sessions(&db_tx, actor.id, current_token).await?;
            info!(user_id = actor.id, "password changed");
            Ok(())
        })
    }

    /// `PUT /users/{id}/password`: a self-change needs the old password, an
    /// admin may reset anybody else's. The target loses its other sessions.
    pub async fn set_password(
        &self,
        actor: &Actor,
        user_id: i32,
        old_password: Option<&str>,
        new_password: &str,
        current_token: Option<&str>,
    ) -> ResultEngine<()> {
        if actor.id == user_id {
            let old_password = old_password.filter(|p| !p.is_empty()).ok_or_else(|| {
                EngineError::InvalidField("Password lama harus diisi".to_string())
            })?;
            return self
                .change_password(actor, old_password, new_password, current_token)
                .await;
        }
        if !actor.is_admin() {
            return Err(EngineError::Forbidden("Akses ditolak".to_string()));
        }
        validate_password(new_password, "Password baru minimal 6 karakter")?;
        let hashed = password::hash(new_password, self.password_cost)?;
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            self.store_password(&db_tx, model, hashed).await?;
            self.revoke_sessions(&db_tx, user_id, None).await?;
            info!(user_id, by = actor.id, "password reset");
            Ok(())
        })
    }

    async fn insert_user(
        &self,
        db: &DatabaseTransaction,
        new_user: NewUser,
        hashed: String,
        role: Role,
    ) -> ResultEngine<User> {
        self.ensure_username_free(db, &new_user.username, None)
            .await?;
        let now = Utc::now();
        let model = users::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(new_user.username),
            password: ActiveValue::Set(hashed),
            nama_lengkap: ActiveValue::Set(new_user.nama_lengkap),
            role: ActiveValue::Set(role.as_str().to_string()),
            email: ActiveValue::Set(new_user.email),
            no_hp: ActiveValue::Set(new_user.no_hp),
            aktif: ActiveValue::Set(true),
            last_login: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(db)
        .await?;
        info!(username = %model.username, role = %role, "user registered");
        User::try_from(model)
    }

    async fn ensure_username_free(
        &self,
        db: &DatabaseTransaction,
        username: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query =
            users::Entity::find().filter(Expr::cust("LOWER(username)").eq(username.to_lowercase()));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey("Username sudah digunakan".to_string()));
        }
        Ok(())
    }

    async fn ensure_other_active_admin(
        &self,
        db: &DatabaseTransaction,
        user_id: i32,
    ) -> ResultEngine<()> {
        let others = users::Entity::find()
            .filter(users::Column::Role.eq(Role::Admin.as_str()))
            .filter(users::Column::Aktif.eq(true))
            .filter(users::Column::Id.ne(user_id))
            .count(db)
            .await?;
        if others == 0 {
            return Err(EngineError::InvalidField(
                "Tidak dapat menghapus atau menonaktifkan admin terakhir".to_string(),
            ));
        }
        Ok(())
    }

    async fn store_password(
        &self,
        db: &DatabaseTransaction,
        model: users::Model,
        hashed: String,
    ) -> ResultEngine<()> {
        let mut active: users::ActiveModel = model.into();
        active.password = ActiveValue::Set(hashed);
        active.updated_at = ActiveValue::Set(Utc::now());
        active.update(db).await?;
        Ok(())
    }
}

fn normalize_username(value: &str) -> ResultEngine<String> {
    let username = normalize_required(value, "Username harus diisi")?;
    check_max_len(&username, USERNAME_MAX_LEN, "Username")?;
    Ok(username)
}

fn normalize_nama_lengkap(value: &str) -> ResultEngine<String> {
    let nama_lengkap = normalize_required(value, "Nama lengkap harus diisi")?;
    check_max_len(&nama_lengkap, NAMA_MAX_LEN, "Nama lengkap")?;
    Ok(nama_lengkap)
}

fn prepare_new_user(new_user: NewUser) -> ResultEngine<NewUser> {
    if new_user.username.trim().is_empty()
        || new_user.password.is_empty()
        || new_user.nama_lengkap.trim().is_empty()
    {
        return Err(EngineError::InvalidField(
            "Username, password, dan nama lengkap harus diisi".to_string(),
        ));
    }
    validate_password(&new_user.password, "Password minimal 6 karakter")?;
    Ok(NewUser {
        username: normalize_username(&new_user.username)?,
        password: new_user.password,
        nama_lengkap: normalize_nama_lengkap(&new_user.nama_lengkap)?,
        role: new_user.role,
        email: normalize_optional_text(new_user.email.as_deref()),
        no_hp: normalize_optional_text(new_user.no_hp.as_deref()),
    })
}
