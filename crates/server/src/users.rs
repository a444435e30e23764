//! Account, session and permission endpoints.

use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{Actor, Permission, PermissionSet, User};

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath, BearerHeader, CurrentSession, bearer_token},
    server::ServerState,
    types::{
        Message,
        user::{
            KeepAlive, Login, LoginResponse, PasswordChange, PermissionView, PermissionsResponse,
            PermissionsUpdate, ProfileUpdate, Registered, Resource, Role, SessionUser,
            SessionView, UserNew, UserUpdate, UserUpdated, UserView,
        },
    },
};

fn map_role(role: engine::Role) -> Role {
    match role {
        engine::Role::Admin => Role::Admin,
        engine::Role::Operator => Role::Operator,
    }
}

fn map_role_in(role: Role) -> engine::Role {
    match role {
        Role::Admin => engine::Role::Admin,
        Role::Operator => engine::Role::Operator,
    }
}

fn map_resource(resource: engine::Resource) -> Resource {
    match resource {
        engine::Resource::Users => Resource::Users,
        engine::Resource::Students => Resource::Students,
        engine::Resource::Payments => Resource::Payments,
        engine::Resource::PaymentTypes => Resource::PaymentTypes,
    }
}

fn map_resource_in(resource: Resource) -> engine::Resource {
    match resource {
        Resource::Users => engine::Resource::Users,
        Resource::Students => engine::Resource::Students,
        Resource::Payments => engine::Resource::Payments,
        Resource::PaymentTypes => engine::Resource::PaymentTypes,
    }
}

fn map_user(user: User) -> UserView {
    UserView {
        id: user.id,
        username: user.username,
        nama_lengkap: user.nama_lengkap,
        role: map_role(user.role),
        email: user.email,
        no_hp: user.no_hp,
        aktif: user.aktif,
        last_login: user.last_login,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

fn map_session_user(actor: &Actor) -> SessionUser {
    SessionUser {
        id: actor.id,
        username: actor.username.clone(),
        role: map_role(actor.role),
        nama_lengkap: actor.nama_lengkap.clone(),
    }
}

fn map_permission(permission: Permission) -> PermissionView {
    PermissionView {
        permission: map_resource(permission.resource),
        can_read: permission.set.can_read,
        can_create: permission.set.can_create,
        can_update: permission.set.can_update,
        can_delete: permission.set.can_delete,
        explicit: permission.explicit,
    }
}

fn map_new_user(payload: UserNew) -> engine::NewUser {
    engine::NewUser {
        username: payload.username,
        password: payload.password,
        nama_lengkap: payload.nama_lengkap,
        role: payload.role.map(map_role_in),
        email: payload.email,
        no_hp: payload.no_hp,
    }
}

fn message(text: &str) -> Json<Message> {
    Json(Message {
        message: text.to_string(),
    })
}

pub async fn login(
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<Login>,
) -> Result<Json<LoginResponse>, ServerError> {
    let issued = state
        .engine
        .login(&payload.username, &payload.password, payload.remember_me)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login berhasil".to_string(),
        token: issued.token,
        expires_at: issued.expires_at,
        user: map_user(issued.user),
    }))
}

/// Open while no account exists; afterwards an admin bearer token is needed.
pub async fn register(
    State(state): State<ServerState>,
    header: BearerHeader,
    ApiJson(payload): ApiJson<UserNew>,
) -> Result<(StatusCode, Json<Registered>), ServerError> {
    let actor = match bearer_token(header)? {
        Some(token) => Some(state.engine.authenticate(&token).await?.actor),
        None => None,
    };
    let user = state
        .engine
        .register(actor.as_ref(), map_new_user(payload))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            message: "User berhasil didaftarkan".to_string(),
            user_id: user.id,
        }),
    ))
}

pub async fn logout(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
) -> Result<Json<Message>, ServerError> {
    state.engine.logout(&session.token).await?;
    Ok(message("Logout berhasil"))
}

pub async fn session(Extension(session): Extension<CurrentSession>) -> Json<SessionView> {
    Json(SessionView {
        user: map_session_user(session.actor()),
        remember_me: session.info.remember_me,
        expires_at: session.info.expires_at,
    })
}

/// The auth layer already slid the expiry; this only reports it.
pub async fn keep_alive(Extension(session): Extension<CurrentSession>) -> Json<KeepAlive> {
    Json(KeepAlive {
        message: "Session diperpanjang".to_string(),
        expires_at: session.info.expires_at,
    })
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<UserView>>, ServerError> {
    let users = state.engine.users(&actor).await?;
    Ok(Json(users.into_iter().map(map_user).collect()))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<UserNew>,
) -> Result<(StatusCode, Json<Registered>), ServerError> {
    let user = state
        .engine
        .create_user(&actor, map_new_user(payload))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            message: "User berhasil dibuat".to_string(),
            user_id: user.id,
        }),
    ))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(&actor, id).await?;
    Ok(Json(map_user(user)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> Result<Json<UserUpdated>, ServerError> {
    let patch = engine::UserPatch {
        username: payload.username,
        nama_lengkap: payload.nama_lengkap,
        role: payload.role.map(map_role_in),
        email: payload.email,
        no_hp: payload.no_hp,
        aktif: payload.aktif,
    };
    let user = state.engine.update_user(&actor, id, patch).await?;

    Ok(Json(UserUpdated {
        message: "User berhasil diupdate".to_string(),
        user: map_user(user),
    }))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_user(&actor, id).await?;
    Ok(message("User berhasil dihapus"))
}

pub async fn permissions(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<PermissionsResponse>, ServerError> {
    let permissions = state.engine.user_permissions(&actor, id).await?;
    Ok(Json(PermissionsResponse {
        user_id: id,
        permissions: permissions.into_iter().map(map_permission).collect(),
    }))
}

/// An empty `permissions` list drops every override of the user.
pub async fn update_permissions(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PermissionsUpdate>,
) -> Result<Json<PermissionsResponse>, ServerError> {
    let permissions = if payload.permissions.is_empty() {
        state.engine.reset_user_permissions(&actor, id).await?;
        state.engine.user_permissions(&actor, id).await?
    } else {
        let overrides = payload
            .permissions
            .into_iter()
            .map(|entry| {
                (
                    map_resource_in(entry.permission),
                    PermissionSet {
                        can_read: entry.can_read,
                        can_create: entry.can_create,
                        can_update: entry.can_update,
                        can_delete: entry.can_delete,
                    },
                )
            })
            .collect();
        state
            .engine
            .set_user_permissions(&actor, id, overrides)
            .await?
    };

    Ok(Json(PermissionsResponse {
        user_id: id,
        permissions: permissions.into_iter().map(map_permission).collect(),
    }))
}

pub async fn set_password(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PasswordChange>,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .set_password(
            session.actor(),
            id,
            payload.old_password.as_deref(),
            &payload.new_password,
            Some(&session.token),
        )
        .await?;
    Ok(message("Password berhasil diubah"))
}

pub async fn change_password(
    Extension(session): Extension<CurrentSession>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<PasswordChange>,
) -> Result<Json<Message>, ServerError> {
    state
        .engine
        .change_password(
            session.actor(),
            payload.old_password.as_deref().unwrap_or_default(),
            &payload.new_password,
            Some(&session.token),
        )
        .await?;
    Ok(message("Password berhasil diubah"))
}

pub async fn profile(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.profile(&actor).await?;
    Ok(Json(map_user(user)))
}

pub async fn update_profile(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> Result<Json<UserUpdated>, ServerError> {
    let update = engine::ProfileUpdate {
        nama_lengkap: payload.nama_lengkap,
        email: payload.email,
        no_hp: payload.no_hp,
    };
    let user = state.engine.update_profile(&actor, update).await?;

    Ok(Json(UserUpdated {
        message: "Profile berhasil diupdate".to_string(),
        user: map_user(user),
    }))
}
