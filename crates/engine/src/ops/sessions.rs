use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{info, warn};

use crate::{
    Actor, EngineError, IssuedSession, ResultEngine, SessionInfo, User, password,
    sessions::{generate_token, token_digest},
    user_sessions, users,
};

use super::{Engine, with_tx};

const INVALID_CREDENTIALS: &str = "Username atau password salah";
const INVALID_SESSION: &str = "Invalid or expired session";

impl Engine {
    /// Verify credentials of an active account and open a session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember_me: bool,
    ) -> ResultEngine<IssuedSession> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(EngineError::InvalidField(
                "Username dan password harus diisi".to_string(),
            ));
        }
        // Usernames are unique case-insensitively.
        let model = users::Entity::find()
            .filter(Expr::cust("LOWER(username)").eq(username.to_lowercase()))
            .one(&self.database)
            .await?;
        let Some(model) = model.filter(|m| m.aktif) else {
            warn!(username, "login rejected: unknown or inactive user");
            return Err(EngineError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !password::verify(password, &model.password) {
            warn!(username, "login rejected: wrong password");
            return Err(EngineError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let user_id = model.id;
            let mut active: users::ActiveModel = model.into();
            active.last_login = ActiveValue::Set(Some(now));
            let model = active.update(&db_tx).await?;

            let token = generate_token();
            let expires_at = now + self.sessions.ttl(remember_me);
            user_sessions::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                token_hash: ActiveValue::Set(token_digest(&token)),
                remember_me: ActiveValue::Set(remember_me),
                expires_at: ActiveValue::Set(expires_at),
                created_at: ActiveValue::Set(now),
                last_activity: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            info!(username, remember_me, "login succeeded");
            Ok(IssuedSession {
                token,
                expires_at,
                user: User::try_from(model)?,
            })
        })
    }

    /// Resolve a bearer token into the acting user and slide its expiry.
    pub async fn authenticate(&self, token: &str) -> ResultEngine<SessionInfo> {
        let digest = token_digest(token.trim());
        with_tx!(self, |db_tx| {
            let session = user_sessions::Entity::find()
                .filter(user_sessions::Column::TokenHash.eq(digest.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::Unauthorized(INVALID_SESSION.to_string()))?;

            let now = Utc::now();
            if session.expires_at <= now {
                user_sessions::Entity::delete_by_id(session.id)
                    .exec(&db_tx)
                    .await?;
                // Commit the removal before rejecting the request.
                db_tx.commit().await?;
                return Err(EngineError::Unauthorized(INVALID_SESSION.to_string()));
            }

            let user = users::Entity::find_by_id(session.user_id)
                .one(&db_tx)
                .await?
                .filter(|u| u.aktif)
                .ok_or_else(|| EngineError::Unauthorized(INVALID_SESSION.to_string()))?;

            let role = user.role()?;
            let remember_me = session.remember_me;
            let expires_at = now + self.sessions.ttl(remember_me);
            let mut active: user_sessions::ActiveModel = session.into();
            active.last_activity = ActiveValue::Set(now);
            active.expires_at = ActiveValue::Set(expires_at);
            active.update(&db_tx).await?;

            Ok(SessionInfo {
                actor: Actor {
                    id: user.id,
                    username: user.username,
                    role,
                    nama_lengkap: user.nama_lengkap,
                },
                remember_me,
                expires_at,
            })
        })
    }

    /// Revoke the session behind `token`. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> ResultEngine<()> {
        let digest = token_digest(token.trim());
        let res = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::TokenHash.eq(digest))
            .exec(&self.database)
            .await?;
        if res.rows_affected > 0 {
            info!("session revoked");
        }
        Ok(())
    }

    /// Delete every expired session and return how many were removed.
    pub async fn sweep_expired_sessions(&self) -> ResultEngine<u64> {
        let res = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.database)
            .await?;
        if res.rows_affected > 0 {
            info!(removed = res.rows_affected, "expired sessions swept");
        }
        Ok(res.rows_affected)
    }

    /// Revoke all sessions of `user_id`, except the one matching `keep_token`.
    pub(super) async fn revoke_sessions(
        &self,
        db: &DatabaseTransaction,
        user_id: i32,
        keep_token: Option<&str>,
    ) -> ResultEngine<u64> {
        let mut query = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::UserId.eq(user_id));
        if let Some(token) = keep_token {
            query = query.filter(user_sessions::Column::TokenHash.ne(token_digest(token.trim())));
        }
        Ok(query.exec(db).await?.rows_affected)
    }
}
