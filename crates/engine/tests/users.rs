mod common;

use engine::{
    Action, EngineError, NewUser, PermissionSet, ProfileUpdate, Resource, Role, StudentKey,
    UserPatch,
};

use common::{actor, add_student, engine_with_db, fixture};

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "secret1".to_string(),
        nama_lengkap: "Pak Joko".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn first_registration_becomes_admin() {
    let (engine, _db) = engine_with_db().await;
    let mut first = new_user("kepala");
    first.role = Some(Role::Operator);
    let user = engine.register(None, first).await.unwrap();
    assert_eq!(user.role, Role::Admin);
    assert!(user.aktif);
}

#[tokio::test]
async fn later_registration_needs_admin() {
    let fx = fixture().await;
    let err = fx
        .engine
        .register(None, new_user("tamu"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let err = fx
        .engine
        .register(Some(&fx.operator), new_user("tamu"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let user = fx
        .engine
        .register(Some(&fx.admin), new_user("tamu"))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Operator);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let fx = fixture().await;
    let err = fx
        .engine
        .create_user(&fx.admin, new_user("Operator"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Username sudah digunakan".to_string()));
}

#[tokio::test]
async fn short_password_is_rejected() {
    let fx = fixture().await;
    let mut user = new_user("baru");
    user.password = "123".to_string();
    let err = fx.engine.create_user(&fx.admin, user).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn cannot_delete_self_and_second_delete_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .engine
        .delete_user(&fx.admin, fx.admin.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidField("Tidak dapat menghapus akun sendiri".to_string())
    );

    fx.engine
        .delete_user(&fx.admin, fx.operator.id)
        .await
        .unwrap();
    let err = fx
        .engine
        .delete_user(&fx.admin, fx.operator.id)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("User tidak ditemukan".to_string()));
}

#[tokio::test]
async fn last_admin_cannot_be_demoted_or_deleted() {
    let fx = fixture().await;
    let err = fx
        .engine
        .update_user(
            &fx.admin,
            fx.admin.id,
            UserPatch {
                role: Some(Role::Operator),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));

    // A second admin makes the first one removable.
    let mut second = new_user("wakasek");
    second.role = Some(Role::Admin);
    let second = fx.engine.create_user(&fx.admin, second).await.unwrap();
    let second = actor(&second);
    fx.engine.delete_user(&second, fx.admin.id).await.unwrap();

    // Now `second` is the last admin; nobody else can delete it.
    let mut third = new_user("staf");
    third.role = Some(Role::Admin);
    let third = fx.engine.create_user(&second, third).await.unwrap();
    fx.engine
        .update_user(
            &second,
            third.id,
            UserPatch {
                aktif: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = fx
        .engine
        .delete_user(&actor(&third), second.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn operator_cannot_manage_users() {
    let fx = fixture().await;
    let err = fx.engine.users(&fx.operator).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // ...but may read its own record.
    let me = fx.engine.user(&fx.operator, fx.operator.id).await.unwrap();
    assert_eq!(me.username, "operator");
}

#[tokio::test]
async fn explicit_permission_overrides_role_default() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;

    let permissions = fx
        .engine
        .set_user_permissions(
            &fx.admin,
            fx.operator.id,
            vec![(Resource::Students, PermissionSet::ALL)],
        )
        .await
        .unwrap();
    let students = permissions
        .iter()
        .find(|p| p.resource == Resource::Students)
        .unwrap();
    assert!(students.explicit);
    assert!(students.set.allows(Action::Delete));

    let key = StudentKey::parse("2024001001").unwrap();
    fx.engine
        .delete_student(&fx.operator, &key)
        .await
        .unwrap();

    fx.engine
        .reset_user_permissions(&fx.admin, fx.operator.id)
        .await
        .unwrap();
    let permissions = fx
        .engine
        .user_permissions(&fx.admin, fx.operator.id)
        .await
        .unwrap();
    assert!(permissions.iter().all(|p| !p.explicit));
}

#[tokio::test]
async fn users_override_does_not_grant_admin_powers() {
    let fx = fixture().await;
    fx.engine
        .set_user_permissions(
            &fx.admin,
            fx.operator.id,
            vec![(Resource::Users, PermissionSet::ALL)],
        )
        .await
        .unwrap();

    let err = fx
        .engine
        .update_user(
            &fx.operator,
            fx.operator.id,
            UserPatch {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .update_user(
            &fx.operator,
            fx.admin.id,
            UserPatch {
                aktif: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = fx
        .engine
        .delete_user(&fx.operator, fx.admin.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let mut promoted = new_user("calon");
    promoted.role = Some(Role::Admin);
    let err = fx
        .engine
        .create_user(&fx.operator, promoted)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // Plain operator accounts remain manageable through the override.
    let staff = fx
        .engine
        .create_user(&fx.operator, new_user("staf"))
        .await
        .unwrap();
    assert_eq!(staff.role, Role::Operator);
    let renamed = fx
        .engine
        .update_user(
            &fx.operator,
            staff.id,
            UserPatch {
                nama_lengkap: Some("Bu Rina".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.nama_lengkap, "Bu Rina");
    let admin = fx.engine.user(&fx.admin, fx.admin.id).await.unwrap();
    assert!(admin.aktif);
    assert_eq!(admin.role, Role::Admin);
}

#[tokio::test]
async fn overlong_full_name_is_rejected() {
    let fx = fixture().await;
    let mut user = new_user("panjang");
    user.nama_lengkap = "a".repeat(101);
    let err = fx.engine.create_user(&fx.admin, user).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidField("Nama lengkap maksimal 100 karakter".to_string())
    );
}

#[tokio::test]
async fn permission_management_is_admin_only() {
    let fx = fixture().await;
    let err = fx
        .engine
        .set_user_permissions(
            &fx.operator,
            fx.operator.id,
            vec![(Resource::Users, PermissionSet::ALL)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn profile_update_clears_blank_contacts() {
    let fx = fixture().await;
    let updated = fx
        .engine
        .update_profile(
            &fx.operator,
            ProfileUpdate {
                nama_lengkap: "Sari Wulandari".to_string(),
                email: Some("sari@sekolah.id".to_string()),
                no_hp: Some("  ".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.nama_lengkap, "Sari Wulandari");
    assert_eq!(updated.email.as_deref(), Some("sari@sekolah.id"));
    assert_eq!(updated.no_hp, None);
}

#[tokio::test]
async fn password_change_checks_old_password() {
    let fx = fixture().await;
    let err = fx
        .engine
        .change_password(&fx.operator, "salah123", "baru1234", None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidField("Password lama salah".to_string()));

    let err = fx
        .engine
        .change_password(&fx.operator, "operator123", "123", None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidField("Password baru minimal 6 karakter".to_string())
    );

    fx.engine
        .change_password(&fx.operator, "operator123", "baru1234", None)
        .await
        .unwrap();
    fx.engine.login("operator", "baru1234", false).await.unwrap();
}

#[tokio::test]
async fn only_admin_resets_other_passwords() {
    let fx = fixture().await;
    let err = fx
        .engine
        .set_password(&fx.operator, fx.admin.id, None, "hijack99", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    fx.engine
        .set_password(&fx.admin, fx.operator.id, None, "reset123", None)
        .await
        .unwrap();
    fx.engine.login("operator", "reset123", false).await.unwrap();
}

#[tokio::test]
async fn provisioned_user_can_log_in() {
    let (engine, _db) = engine_with_db().await;
    let user = engine
        .provision_user(NewUser {
            username: "kepsek".to_string(),
            password: "kepsek123".to_string(),
            nama_lengkap: "Kepala Sekolah".to_string(),
            role: Some(Role::Admin),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(user.role, Role::Admin);

    let session = engine.login("kepsek", "kepsek123", false).await.unwrap();
    assert_eq!(session.user.id, user.id);
}
