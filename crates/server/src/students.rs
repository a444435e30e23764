//! Student endpoints.

use axum::{Extension, Json, extract::State};
use engine::{Actor, Student, StudentKey};

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath},
    server::ServerState,
    types::{
        Message,
        student::{Gender, StudentCreated, StudentNew, StudentUpdate, StudentUpdated, StudentView},
    },
};

fn map_gender(gender: engine::Gender) -> Gender {
    match gender {
        engine::Gender::L => Gender::L,
        engine::Gender::P => Gender::P,
    }
}

fn map_gender_in(gender: Gender) -> engine::Gender {
    match gender {
        Gender::L => engine::Gender::L,
        Gender::P => engine::Gender::P,
    }
}

fn map_student(student: Student) -> StudentView {
    StudentView {
        id: student.id,
        nisn: student.nisn,
        nama: student.nama,
        kelas: student.kelas,
        alamat: student.alamat,
        no_hp: student.no_hp,
        nama_wali: student.nama_wali,
        jenis_kelamin: map_gender(student.jenis_kelamin),
        angkatan: student.angkatan,
        created_at: student.created_at,
        updated_at: student.updated_at,
    }
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<StudentView>>, ServerError> {
    let students = state.engine.students(&actor).await?;
    Ok(Json(students.into_iter().map(map_student).collect()))
}

/// `id` is either a NISN or a legacy numeric id.
pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<StudentView>, ServerError> {
    let key = StudentKey::parse(&id)?;
    let student = state.engine.student(&actor, &key).await?;
    Ok(Json(map_student(student)))
}

pub async fn get_by_nisn(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(nisn): ApiPath<String>,
) -> Result<Json<StudentView>, ServerError> {
    let student = state.engine.student_by_nisn(&actor, &nisn).await?;
    Ok(Json(map_student(student)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<StudentNew>,
) -> Result<Json<StudentCreated>, ServerError> {
    let new = engine::NewStudent {
        nisn: payload.nisn,
        nama: payload.nama,
        kelas: payload.kelas,
        alamat: payload.alamat,
        no_hp: payload.no_hp,
        nama_wali: payload.nama_wali,
        jenis_kelamin: payload.jenis_kelamin.map(map_gender_in),
        angkatan: payload.angkatan,
    };
    let student = state.engine.new_student(&actor, new).await?;

    Ok(Json(StudentCreated {
        message: "Siswa ditambahkan".to_string(),
        nisn: student.nisn,
    }))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<StudentUpdate>,
) -> Result<Json<StudentUpdated>, ServerError> {
    let key = StudentKey::parse(&id)?;
    let patch = engine::StudentPatch {
        nisn: payload.nisn,
        nama: payload.nama,
        kelas: payload.kelas,
        alamat: payload.alamat,
        no_hp: payload.no_hp,
        nama_wali: payload.nama_wali,
        jenis_kelamin: payload.jenis_kelamin.map(map_gender_in),
        angkatan: payload.angkatan,
    };
    let student = state.engine.update_student(&actor, &key, patch).await?;

    Ok(Json(StudentUpdated {
        message: "Siswa diperbarui".to_string(),
        student: map_student(student),
    }))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Message>, ServerError> {
    let key = StudentKey::parse(&id)?;
    state.engine.delete_student(&actor, &key).await?;

    Ok(Json(Message {
        message: "Siswa berhasil dihapus".to_string(),
    }))
}
