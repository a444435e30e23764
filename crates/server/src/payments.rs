//! Payment endpoints.

use axum::{Extension, Json, extract::State};
use engine::{Actor, Payment, PaymentTypeRef, StudentRef};

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath, ApiQuery},
    server::ServerState,
    types::{
        Created, Message,
        payment::{
            PaymentList, PaymentNew, PaymentStatus, PaymentUpdate, PaymentUpdated, PaymentView,
            PaymentsByMonth,
        },
    },
};

fn map_status(status: engine::PaymentStatus) -> PaymentStatus {
    match status {
        engine::PaymentStatus::Lunas => PaymentStatus::Lunas,
        engine::PaymentStatus::BelumLunas => PaymentStatus::BelumLunas,
    }
}

fn map_status_in(status: PaymentStatus) -> engine::PaymentStatus {
    match status {
        PaymentStatus::Lunas => engine::PaymentStatus::Lunas,
        PaymentStatus::BelumLunas => engine::PaymentStatus::BelumLunas,
    }
}

fn map_payment(payment: Payment) -> PaymentView {
    PaymentView {
        id: payment.id,
        student_nisn: payment.student_nisn,
        payment_type_id: payment.payment_type_id,
        jenis_pembayaran: payment.jenis_pembayaran,
        nominal: payment.nominal,
        tanggal_pembayaran: payment.tanggal_pembayaran,
        status: map_status(payment.status),
        keterangan: payment.keterangan,
        catatan: payment.catatan,
        petugas: payment.petugas,
        created_by: payment.created_by,
        created_at: payment.created_at,
        updated_at: payment.updated_at,
    }
}

/// `payment_type_id` takes precedence over a type name.
fn payment_type_ref(id: Option<i32>, name: Option<String>) -> Option<PaymentTypeRef> {
    match (id, name) {
        (Some(id), _) => Some(PaymentTypeRef::Id(id)),
        (None, Some(name)) if !name.trim().is_empty() => Some(PaymentTypeRef::Name(name)),
        _ => None,
    }
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<PaymentList>,
) -> Result<Json<Vec<PaymentView>>, ServerError> {
    let filter = engine::PaymentFilter {
        student_nisn: query.student_nisn,
        student_id: query.student_id,
    };
    let payments = state.engine.payments(&actor, filter).await?;
    Ok(Json(payments.into_iter().map(map_payment).collect()))
}

pub async fn by_month(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<PaymentsByMonth>,
) -> Result<Json<Vec<PaymentView>>, ServerError> {
    let payments = state
        .engine
        .payments_by_month(&actor, query.student_nisn.as_deref(), query.month, query.year)
        .await?;
    Ok(Json(payments.into_iter().map(map_payment).collect()))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<PaymentView>, ServerError> {
    let payment = state.engine.payment(&actor, id).await?;
    Ok(Json(map_payment(payment)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<PaymentNew>,
) -> Result<Json<Created>, ServerError> {
    let student = match (payload.student_nisn, payload.student_id) {
        (Some(nisn), _) if !nisn.trim().is_empty() => StudentRef::Nisn(nisn),
        (_, Some(id)) => StudentRef::Id(id),
        _ => {
            return Err(ServerError::Generic(
                "student_nisn atau student_id harus diisi".to_string(),
            ));
        }
    };
    let payment_type = payment_type_ref(payload.payment_type_id, payload.jenis_pembayaran)
        .ok_or_else(|| {
            ServerError::Generic("payment_type_id atau jenis_pembayaran harus diisi".to_string())
        })?;

    let new = engine::NewPayment {
        student,
        payment_type,
        nominal: payload.nominal,
        tanggal_pembayaran: payload.tanggal_pembayaran,
        status: payload.status.map(map_status_in),
        keterangan: payload.keterangan,
        catatan: payload.catatan,
        petugas: payload.petugas,
    };
    let payment = state.engine.new_payment(&actor, new).await?;

    Ok(Json(Created {
        message: "Pembayaran ditambahkan".to_string(),
        id: payment.id,
    }))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PaymentUpdate>,
) -> Result<Json<PaymentUpdated>, ServerError> {
    let patch = engine::PaymentPatch {
        student: payload.student_nisn.map(StudentRef::Nisn),
        payment_type: payment_type_ref(payload.payment_type_id, payload.jenis_pembayaran),
        nominal: payload.nominal,
        tanggal_pembayaran: payload.tanggal_pembayaran,
        status: payload.status.map(map_status_in),
        keterangan: payload.keterangan,
        catatan: payload.catatan,
        petugas: payload.petugas,
    };
    let payment = state.engine.update_payment(&actor, id, patch).await?;

    Ok(Json(PaymentUpdated {
        message: "Pembayaran berhasil diupdate".to_string(),
        payment: map_payment(payment),
    }))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_payment(&actor, id).await?;

    Ok(Json(Message {
        message: "Pembayaran berhasil dihapus".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_type_id_wins_over_name() {
        assert_eq!(
            payment_type_ref(Some(3), Some("SPP".to_string())),
            Some(PaymentTypeRef::Id(3))
        );
        assert_eq!(
            payment_type_ref(None, Some("SPP".to_string())),
            Some(PaymentTypeRef::Name("SPP".to_string()))
        );
        assert_eq!(payment_type_ref(None, Some("  ".to_string())), None);
    }
}
