use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use tracing::info;

use crate::{
    Action, Actor, EngineError, NewPaymentType, PaymentType, PaymentTypePatch, Resource,
    ResultEngine, payment_types, payments,
    util::{check_max_len, normalize_required, validate_nominal},
};

use super::{Engine, with_tx};

const NAMA_MAX_LEN: usize = 100;

impl Engine {
    /// Payment types ordered by name. Inactive ones only when asked for.
    pub async fn payment_types(
        &self,
        actor: &Actor,
        include_inactive: bool,
    ) -> ResultEngine<Vec<PaymentType>> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::PaymentTypes, Action::Read)
                .await?;
            let mut query = payment_types::Entity::find();
            if !include_inactive {
                query = query.filter(payment_types::Column::Aktif.eq(true));
            }
            let models = query
                .order_by_asc(payment_types::Column::Nama)
                .all(&db_tx)
                .await?;
            models.into_iter().map(PaymentType::try_from).collect()
        })
    }

    pub async fn payment_type(&self, actor: &Actor, id: i32) -> ResultEngine<PaymentType> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::PaymentTypes, Action::Read)
                .await?;
            PaymentType::try_from(self.require_payment_type(&db_tx, id).await?)
        })
    }

    pub async fn new_payment_type(
        &self,
        actor: &Actor,
        new: NewPaymentType,
    ) -> ResultEngine<PaymentType> {
        let nama = normalize_required(&new.nama, "Nama dan nominal harus diisi")?;
        check_max_len(&nama, NAMA_MAX_LEN, "Nama jenis pembayaran")?;
        let nominal = validate_nominal(new.nominal)?;
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::PaymentTypes, Action::Create)
                .await?;
            if self.find_payment_type_by_name(&db_tx, &nama, None).await?.is_some() {
                return Err(EngineError::ExistingKey(
                    "Jenis pembayaran sudah ada".to_string(),
                ));
            }
            let now = Utc::now();
            let model = payment_types::ActiveModel {
                id: ActiveValue::NotSet,
                nama: ActiveValue::Set(nama),
                nominal: ActiveValue::Set(nominal),
                periode: ActiveValue::Set(new.periode.unwrap_or_default().as_str().to_string()),
                aktif: ActiveValue::Set(new.aktif.unwrap_or(true)),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            info!(id = model.id, nama = %model.nama, "payment type added");
            PaymentType::try_from(model)
        })
    }

    pub async fn update_payment_type(
        &self,
        actor: &Actor,
        id: i32,
        mut patch: PaymentTypePatch,
    ) -> ResultEngine<PaymentType> {
        if patch.is_empty() {
            return Err(EngineError::NothingToUpdate);
        }
        if let Some(nama) = patch.nama.take() {
            let nama = normalize_required(&nama, "Nama jenis pembayaran harus diisi")?;
            check_max_len(&nama, NAMA_MAX_LEN, "Nama jenis pembayaran")?;
            patch.nama = Some(nama);
        }
        if let Some(nominal) = patch.nominal {
            validate_nominal(nominal)?;
        }
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::PaymentTypes, Action::Update)
                .await?;
            let model = self.require_payment_type(&db_tx, id).await?;
            if let Some(nama) = patch.nama.as_deref()
                && self
                    .find_payment_type_by_name(&db_tx, nama, Some(id))
                    .await?
                    .is_some()
            {
                return Err(EngineError::ExistingKey(
                    "Nama jenis pembayaran sudah digunakan".to_string(),
                ));
            }
            let mut active: payment_types::ActiveModel = model.into();
            patch.apply(&mut active);
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;
            info!(id, by = actor.id, "payment type updated");
            PaymentType::try_from(model)
        })
    }

    /// Delete a payment type no payment refers to.
    pub async fn delete_payment_type(&self, actor: &Actor, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::PaymentTypes, Action::Delete)
                .await?;
            self.require_payment_type(&db_tx, id).await?;
            let used = payments::Entity::find()
                .filter(payments::Column::PaymentTypeId.eq(id))
                .count(&db_tx)
                .await?;
            if used > 0 {
                return Err(EngineError::InUse(
                    "Tidak dapat menghapus jenis pembayaran yang sedang digunakan".to_string(),
                ));
            }
            payment_types::Entity::delete_by_id(id).exec(&db_tx).await?;
            info!(id, by = actor.id, "payment type deleted");
            Ok(())
        })
    }

    pub(super) async fn require_payment_type(
        &self,
        db: &DatabaseTransaction,
        id: i32,
    ) -> ResultEngine<payment_types::Model> {
        payment_types::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("Jenis pembayaran tidak ditemukan".to_string()))
    }

    /// Case-insensitive lookup by name.
    pub(super) async fn find_payment_type_by_name(
        &self,
        db: &DatabaseTransaction,
        nama: &str,
        except: Option<i32>,
    ) -> ResultEngine<Option<payment_types::Model>> {
        let mut query = payment_types::Entity::find()
            .filter(Expr::cust("LOWER(nama)").eq(nama.trim().to_lowercase()));
        if let Some(id) = except {
            query = query.filter(payment_types::Column::Id.ne(id));
        }
        Ok(query.one(db).await?)
    }
}
