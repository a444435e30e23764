#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};

use engine::{Actor, Engine, MIN_COST, NewStudent, NewUser, Role, SessionPolicy, Student, User};
use migration::MigratorTrait;

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub admin: Actor,
    pub operator: Actor,
}

pub fn actor(user: &User) -> Actor {
    Actor {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
        nama_lengkap: user.nama_lengkap.clone(),
    }
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .session_policy(SessionPolicy::new(30, 24 * 60))
        .password_cost(MIN_COST)
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// An engine with a bootstrap admin (`admin`/`admin123`) and an operator
/// (`operator`/`operator123`).
pub async fn fixture() -> Fixture {
    let (engine, db) = engine_with_db().await;
    let admin = engine
        .register(
            None,
            NewUser {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                nama_lengkap: "Administrator".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let admin = actor(&admin);
    let operator = engine
        .create_user(
            &admin,
            NewUser {
                username: "operator".to_string(),
                password: "operator123".to_string(),
                nama_lengkap: "Bu Sari".to_string(),
                role: Some(Role::Operator),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let operator = actor(&operator);
    Fixture {
        engine,
        db,
        admin,
        operator,
    }
}

pub async fn add_student(fixture: &Fixture, nisn: &str, nama: &str) -> Student {
    fixture
        .engine
        .new_student(
            &fixture.admin,
            NewStudent {
                nisn: nisn.to_string(),
                nama: nama.to_string(),
                kelas: Some("1A".to_string()),
                angkatan: Some("2024".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}
