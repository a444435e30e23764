use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, Select, TransactionTrait,
    prelude::*,
};
use tracing::info;

use crate::{
    Action, Actor, EngineError, NewPayment, Payment, PaymentFilter, PaymentPatch, PaymentTypeRef,
    Resource, ResultEngine, StudentRef, payment_types, payments, students,
    util::{month_range, normalize_optional_text, normalize_required, validate_nominal},
};

use super::{Engine, with_tx};

impl Engine {
    /// Payments, newest first, optionally narrowed to one student.
    pub async fn payments(
        &self,
        actor: &Actor,
        filter: PaymentFilter,
    ) -> ResultEngine<Vec<Payment>> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Payments, Action::Read)
                .await?;
            let nisn = match (normalize_optional_text(filter.student_nisn.as_deref()), filter.student_id) {
                (Some(nisn), _) => Some(nisn),
                (None, Some(id)) => match students::Entity::find_by_id(id).one(&db_tx).await? {
                    Some(student) => Some(student.nisn),
                    None => return Ok(Vec::new()),
                },
                (None, None) => None,
            };
            let mut query = payments::Entity::find();
            if let Some(nisn) = nisn {
                query = query.filter(payments::Column::StudentNisn.eq(nisn));
            }
            load_payments(&db_tx, query).await
        })
    }

    pub async fn payment(&self, actor: &Actor, id: i32) -> ResultEngine<Payment> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Payments, Action::Read)
                .await?;
            self.require_payment(&db_tx, id).await
        })
    }

    /// Payments dated within `month`/`year`, optionally for one student.
    pub async fn payments_by_month(
        &self,
        actor: &Actor,
        student_nisn: Option<&str>,
        month: u32,
        year: i32,
    ) -> ResultEngine<Vec<Payment>> {
        let (start, end) = month_range(year, month)?;
        let student_nisn = normalize_optional_text(student_nisn);
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Payments, Action::Read)
                .await?;
            let mut query = payments::Entity::find()
                .filter(payments::Column::TanggalPembayaran.gte(start))
                .filter(payments::Column::TanggalPembayaran.lt(end));
            if let Some(nisn) = student_nisn {
                query = query.filter(payments::Column::StudentNisn.eq(nisn));
            }
            load_payments(&db_tx, query).await
        })
    }

    /// Record a payment. Missing amount, date, status and officer are filled
    /// from the payment type, today, `lunas` and the caller.
    pub async fn new_payment(&self, actor: &Actor, new: NewPayment) -> ResultEngine<Payment> {
        let nominal = new.nominal.map(validate_nominal).transpose()?;
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Payments, Action::Create)
                .await?;
            let student = self.resolve_student_ref(&db_tx, &new.student).await?;
            let payment_type = self
                .resolve_payment_type_ref(&db_tx, &new.payment_type)
                .await?;
            if !payment_type.aktif {
                return Err(EngineError::InvalidField(format!(
                    "Jenis pembayaran '{}' tidak aktif",
                    payment_type.nama
                )));
            }

            let now = Utc::now();
            let petugas = normalize_optional_text(new.petugas.as_deref())
                .unwrap_or_else(|| actor.nama_lengkap.clone());
            let model = payments::ActiveModel {
                id: ActiveValue::NotSet,
                student_nisn: ActiveValue::Set(student.nisn),
                payment_type_id: ActiveValue::Set(payment_type.id),
                nominal: ActiveValue::Set(nominal.unwrap_or(payment_type.nominal)),
                tanggal_pembayaran: ActiveValue::Set(
                    new.tanggal_pembayaran.unwrap_or_else(|| now.date_naive()),
                ),
                status: ActiveValue::Set(new.status.unwrap_or_default().as_str().to_string()),
                keterangan: ActiveValue::Set(normalize_optional_text(new.keterangan.as_deref())),
                catatan: ActiveValue::Set(normalize_optional_text(new.catatan.as_deref())),
                petugas: ActiveValue::Set(petugas),
                created_by: ActiveValue::Set(Some(actor.id)),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            info!(
                id = model.id,
                nisn = %model.student_nisn,
                nominal = model.nominal,
                by = actor.id,
                "payment recorded"
            );
            Payment::try_from((model, payment_type.nama))
        })
    }

    pub async fn update_payment(
        &self,
        actor: &Actor,
        id: i32,
        mut patch: PaymentPatch,
    ) -> ResultEngine<Payment> {
        if patch.is_empty() {
            return Err(EngineError::NothingToUpdate);
        }
        if let Some(nominal) = patch.nominal {
            validate_nominal(nominal)?;
        }
        if let Some(petugas) = patch.petugas.take() {
            patch.petugas = Some(normalize_required(&petugas, "Petugas harus diisi")?);
        }
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Payments, Action::Update)
                .await?;
            let model = payments::Entity::find_by_id(id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("Pembayaran tidak ditemukan".to_string()))?;

            let student = match patch.student.take() {
                Some(student) => Some(self.resolve_student_ref(&db_tx, &student).await?),
                None => None,
            };
            let payment_type = match patch.payment_type.take() {
                Some(payment_type) => Some(
                    self.resolve_payment_type_ref(&db_tx, &payment_type)
                        .await?,
                ),
                None => None,
            };

            let mut active: payments::ActiveModel = model.into();
            if let Some(student) = student {
                active.student_nisn = ActiveValue::Set(student.nisn);
            }
            if let Some(payment_type) = payment_type {
                active.payment_type_id = ActiveValue::Set(payment_type.id);
            }
            patch.apply(&mut active);
            active.updated_at = ActiveValue::Set(Utc::now());
            active.update(&db_tx).await?;
            info!(id, by = actor.id, "payment updated");
            self.require_payment(&db_tx, id).await
        })
    }

    pub async fn delete_payment(&self, actor: &Actor, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Payments, Action::Delete)
                .await?;
            let res = payments::Entity::delete_by_id(id).exec(&db_tx).await?;
            if res.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(
                    "Pembayaran tidak ditemukan".to_string(),
                ));
            }
            info!(id, by = actor.id, "payment deleted");
            Ok(())
        })
    }

    async fn require_payment(&self, db: &DatabaseTransaction, id: i32) -> ResultEngine<Payment> {
        load_payments(db, payments::Entity::find_by_id(id))
            .await?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("Pembayaran tidak ditemukan".to_string()))
    }

    async fn resolve_student_ref(
        &self,
        db: &DatabaseTransaction,
        student: &StudentRef,
    ) -> ResultEngine<students::Model> {
        let query = match student {
            StudentRef::Nisn(nisn) => {
                students::Entity::find().filter(students::Column::Nisn.eq(nisn.trim()))
            }
            StudentRef::Id(id) => students::Entity::find_by_id(*id),
        };
        query
            .one(db)
            .await?
            .ok_or_else(|| EngineError::MissingReference("Siswa tidak ditemukan".to_string()))
    }

    async fn resolve_payment_type_ref(
        &self,
        db: &DatabaseTransaction,
        payment_type: &PaymentTypeRef,
    ) -> ResultEngine<payment_types::Model> {
        let model = match payment_type {
            PaymentTypeRef::Id(id) => payment_types::Entity::find_by_id(*id).one(db).await?,
            PaymentTypeRef::Name(nama) => self.find_payment_type_by_name(db, nama, None).await?,
        };
        model.ok_or_else(|| {
            EngineError::MissingReference("Jenis pembayaran tidak ditemukan".to_string())
        })
    }
}

/// Run `query` joined with the payment type names.
async fn load_payments(
    db: &DatabaseTransaction,
    query: Select<payments::Entity>,
) -> ResultEngine<Vec<Payment>> {
    let rows = query
        .order_by_desc(payments::Column::TanggalPembayaran)
        .order_by_desc(payments::Column::Id)
        .find_also_related(payment_types::Entity)
        .all(db)
        .await?;
    rows.into_iter()
        .map(|(payment, payment_type)| {
            let nama = payment_type.map(|t| t.nama).unwrap_or_default();
            Payment::try_from((payment, nama))
        })
        .collect()
}
