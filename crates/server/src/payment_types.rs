//! Payment type endpoints.

use axum::{Extension, Json, extract::State};
use engine::{Actor, PaymentType};

use crate::{
    ServerError,
    extract::{ApiJson, ApiPath, ApiQuery},
    server::ServerState,
    types::{
        Created, Message,
        payment_type::{
            PaymentTypeList, PaymentTypeNew, PaymentTypeUpdate, PaymentTypeUpdated,
            PaymentTypeView, Period,
        },
    },
};

fn map_period(period: engine::Period) -> Period {
    match period {
        engine::Period::Bulanan => Period::Bulanan,
        engine::Period::Tahunan => Period::Tahunan,
        engine::Period::Semester => Period::Semester,
    }
}

fn map_period_in(period: Period) -> engine::Period {
    match period {
        Period::Bulanan => engine::Period::Bulanan,
        Period::Tahunan => engine::Period::Tahunan,
        Period::Semester => engine::Period::Semester,
    }
}

fn map_payment_type(payment_type: PaymentType) -> PaymentTypeView {
    PaymentTypeView {
        id: payment_type.id,
        nama: payment_type.nama,
        nominal: payment_type.nominal,
        periode: map_period(payment_type.periode),
        aktif: payment_type.aktif,
        created_at: payment_type.created_at,
        updated_at: payment_type.updated_at,
    }
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<PaymentTypeList>,
) -> Result<Json<Vec<PaymentTypeView>>, ServerError> {
    let payment_types = state
        .engine
        .payment_types(&actor, query.include_inactive)
        .await?;
    Ok(Json(payment_types.into_iter().map(map_payment_type).collect()))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<PaymentTypeView>, ServerError> {
    let payment_type = state.engine.payment_type(&actor, id).await?;
    Ok(Json(map_payment_type(payment_type)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<PaymentTypeNew>,
) -> Result<Json<Created>, ServerError> {
    let new = engine::NewPaymentType {
        nama: payload.nama,
        nominal: payload.nominal,
        periode: payload.periode.map(map_period_in),
        aktif: payload.aktif,
    };
    let payment_type = state.engine.new_payment_type(&actor, new).await?;

    Ok(Json(Created {
        message: "Jenis pembayaran berhasil ditambahkan".to_string(),
        id: payment_type.id,
    }))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<PaymentTypeUpdate>,
) -> Result<Json<PaymentTypeUpdated>, ServerError> {
    let patch = engine::PaymentTypePatch {
        nama: payload.nama,
        nominal: payload.nominal,
        periode: payload.periode.map(map_period_in),
        aktif: payload.aktif,
    };
    let payment_type = state.engine.update_payment_type(&actor, id, patch).await?;

    Ok(Json(PaymentTypeUpdated {
        message: "Jenis pembayaran berhasil diupdate".to_string(),
        payment_type: map_payment_type(payment_type),
    }))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Message>, ServerError> {
    state.engine.delete_payment_type(&actor, id).await?;

    Ok(Json(Message {
        message: "Jenis pembayaran berhasil dihapus".to_string(),
    }))
}
