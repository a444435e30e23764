use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};
use tracing::info;

use crate::{
    Action, Actor, EngineError, Permission, PermissionSet, Resource, ResultEngine, Role,
    user_permissions, users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Fail with `Forbidden` unless `actor` may perform `action` on `resource`.
    pub(super) async fn authorize(
        &self,
        db: &DatabaseTransaction,
        actor: &Actor,
        resource: Resource,
        action: Action,
    ) -> ResultEngine<()> {
        if actor.is_admin() {
            return Ok(());
        }
        let permission = self
            .effective_permission(db, actor.id, actor.role, resource)
            .await?;
        if !permission.set.allows(action) {
            return Err(EngineError::Forbidden(format!(
                "Akses ditolak: tidak ada izin {} untuk {}",
                action.as_str(),
                resource.as_str()
            )));
        }
        Ok(())
    }

    pub(super) fn require_admin(actor: &Actor) -> ResultEngine<()> {
        if !actor.is_admin() {
            return Err(EngineError::Forbidden("Admin access required".to_string()));
        }
        Ok(())
    }

    async fn effective_permission(
        &self,
        db: &DatabaseTransaction,
        user_id: i32,
        role: Role,
        resource: Resource,
    ) -> ResultEngine<Permission> {
        if role == Role::Admin {
            return Ok(Permission {
                resource,
                set: PermissionSet::ALL,
                explicit: false,
            });
        }
        let row = user_permissions::Entity::find_by_id((user_id, resource.as_str().to_string()))
            .one(db)
            .await?;
        Ok(match row {
            Some(row) => Permission {
                resource,
                set: row.set(),
                explicit: true,
            },
            None => Permission {
                resource,
                set: role.default_permissions(resource),
                explicit: false,
            },
        })
    }

    async fn permissions_of(
        &self,
        db: &DatabaseTransaction,
        user: &users::Model,
    ) -> ResultEngine<Vec<Permission>> {
        let role = user.role()?;
        let mut out = Vec::with_capacity(Resource::ALL.len());
        for resource in Resource::ALL {
            out.push(
                self.effective_permission(db, user.id, role, resource)
                    .await?,
            );
        }
        Ok(out)
    }

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: i32,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("User tidak ditemukan".to_string()))
    }

    /// Effective permissions of `user_id` on every resource. Admin only.
    pub async fn user_permissions(
        &self,
        actor: &Actor,
        user_id: i32,
    ) -> ResultEngine<Vec<Permission>> {
        Self::require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            self.permissions_of(&db_tx, &user).await
        })
    }

    /// Store explicit overrides for `user_id`. Resources not listed keep
    /// their current state. Admin only.
    pub async fn set_user_permissions(
        &self,
        actor: &Actor,
        user_id: i32,
        overrides: Vec<(Resource, PermissionSet)>,
    ) -> ResultEngine<Vec<Permission>> {
        Self::require_admin(actor)?;
        if overrides.is_empty() {
            return Err(EngineError::NothingToUpdate);
        }
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            for (resource, set) in overrides {
                let row = user_permissions::ActiveModel {
                    user_id: ActiveValue::Set(user_id),
                    permission: ActiveValue::Set(resource.as_str().to_string()),
                    can_read: ActiveValue::Set(set.can_read),
                    can_create: ActiveValue::Set(set.can_create),
                    can_update: ActiveValue::Set(set.can_update),
                    can_delete: ActiveValue::Set(set.can_delete),
                };
                user_permissions::Entity::insert(row)
                    .on_conflict(
                        OnConflict::columns([
                            user_permissions::Column::UserId,
                            user_permissions::Column::Permission,
                        ])
                        .update_columns([
                            user_permissions::Column::CanRead,
                            user_permissions::Column::CanCreate,
                            user_permissions::Column::CanUpdate,
                            user_permissions::Column::CanDelete,
                        ])
                        .to_owned(),
                    )
                    .exec(&db_tx)
                    .await?;
            }
            info!(user_id, by = actor.id, "permissions updated");
            self.permissions_of(&db_tx, &user).await
        })
    }

    /// Drop every explicit override of `user_id`, falling back to the role
    /// defaults. Admin only.
    pub async fn reset_user_permissions(&self, actor: &Actor, user_id: i32) -> ResultEngine<()> {
        Self::require_admin(actor)?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            user_permissions::Entity::delete_many()
                .filter(user_permissions::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
