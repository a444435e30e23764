mod common;

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Statement};

use engine::{EngineError, UserPatch};

use common::fixture;

#[tokio::test]
async fn login_issues_token_that_authenticates() {
    let fx = fixture().await;
    let issued = fx.engine.login("operator", "operator123", false).await.unwrap();
    assert_eq!(issued.token.len(), 64);
    assert_eq!(issued.user.username, "operator");
    assert!(issued.user.last_login.is_some());

    let session = fx.engine.authenticate(&issued.token).await.unwrap();
    assert_eq!(session.actor, fx.operator);
    assert!(!session.remember_me);
    assert!(session.expires_at >= issued.expires_at);
}

#[tokio::test]
async fn username_match_ignores_case() {
    let fx = fixture().await;
    let issued = fx.engine.login(" Operator ", "operator123", false).await.unwrap();
    assert_eq!(issued.user.username, "operator");
    let session = fx.engine.authenticate(&issued.token).await.unwrap();
    assert_eq!(session.actor.id, fx.operator.id);
}

#[tokio::test]
async fn remember_me_gets_the_long_ttl() {
    let fx = fixture().await;
    let short = fx.engine.login("admin", "admin123", false).await.unwrap();
    let long = fx.engine.login("admin", "admin123", true).await.unwrap();
    assert!(long.expires_at - short.expires_at > Duration::hours(20));
}

#[tokio::test]
async fn wrong_password_and_inactive_user_are_rejected() {
    let fx = fixture().await;
    let err = fx
        .engine
        .login("operator", "nope-nope", false)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Unauthorized("Username atau password salah".to_string())
    );

    fx.engine
        .update_user(
            &fx.admin,
            fx.operator.id,
            UserPatch {
                aktif: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = fx
        .engine
        .login("operator", "operator123", false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let fx = fixture().await;
    let err = fx.engine.authenticate("not-a-token").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Unauthorized("Invalid or expired session".to_string())
    );
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let fx = fixture().await;
    let issued = fx.engine.login("admin", "admin123", false).await.unwrap();
    fx.engine.logout(&issued.token).await.unwrap();
    assert!(fx.engine.authenticate(&issued.token).await.is_err());
}

#[tokio::test]
async fn expired_sessions_are_rejected_and_swept() {
    let fx = fixture().await;
    let a = fx.engine.login("admin", "admin123", false).await.unwrap();
    let b = fx.engine.login("operator", "operator123", false).await.unwrap();
    let live = fx.engine.login("operator", "operator123", true).await.unwrap();

    let past = Utc::now() - Duration::minutes(5);
    let backend = fx.db.get_database_backend();
    fx.db
        .execute(Statement::from_sql_and_values(
            backend,
            "UPDATE user_sessions SET expires_at = ? WHERE remember_me = ?",
            vec![past.into(), false.into()],
        ))
        .await
        .unwrap();

    assert!(fx.engine.authenticate(&a.token).await.is_err());
    // `a` was removed on access, only `b` is left to sweep.
    assert_eq!(fx.engine.sweep_expired_sessions().await.unwrap(), 1);
    assert!(fx.engine.authenticate(&b.token).await.is_err());
    assert!(fx.engine.authenticate(&live.token).await.is_ok());
}

#[tokio::test]
async fn password_change_revokes_other_sessions() {
    let fx = fixture().await;
    let laptop = fx.engine.login("operator", "operator123", false).await.unwrap();
    let phone = fx.engine.login("operator", "operator123", false).await.unwrap();

    fx.engine
        .change_password(&fx.operator, "operator123", "baru1234", Some(&laptop.token))
        .await
        .unwrap();

    assert!(fx.engine.authenticate(&laptop.token).await.is_ok());
    assert!(fx.engine.authenticate(&phone.token).await.is_err());
}

#[tokio::test]
async fn deactivation_revokes_sessions() {
    let fx = fixture().await;
    let issued = fx.engine.login("operator", "operator123", false).await.unwrap();
    fx.engine
        .update_user(
            &fx.admin,
            fx.operator.id,
            UserPatch {
                aktif: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(fx.engine.authenticate(&issued.token).await.is_err());
}
