//! Fee categories (`payment_types`).

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::EngineError;

/// Billing period of a payment type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Period {
    #[default]
    Bulanan,
    Tahunan,
    Semester,
}

impl Period {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bulanan => "Bulanan",
            Self::Tahunan => "Tahunan",
            Self::Semester => "Semester",
        }
    }
}

impl TryFrom<&str> for Period {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "bulanan" => Ok(Self::Bulanan),
            "tahunan" => Ok(Self::Tahunan),
            "semester" => Ok(Self::Semester),
            _ => Err(EngineError::InvalidField(
                "Periode harus Bulanan, Tahunan, atau Semester".to_string(),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentType {
    pub id: i32,
    pub nama: String,
    /// Rupiah.
    pub nominal: i64,
    pub periode: Period,
    pub aktif: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewPaymentType {
    pub nama: String,
    pub nominal: i64,
    pub periode: Option<Period>,
    /// Defaults to `true`.
    pub aktif: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct PaymentTypePatch {
    pub nama: Option<String>,
    pub nominal: Option<i64>,
    pub periode: Option<Period>,
    pub aktif: Option<bool>,
}

impl PaymentTypePatch {
    pub fn is_empty(&self) -> bool {
        self.nama.is_none() && self.nominal.is_none() && self.periode.is_none() && self.aktif.is_none()
    }

    pub(crate) fn apply(self, active: &mut ActiveModel) {
        if let Some(nama) = self.nama {
            active.nama = ActiveValue::Set(nama);
        }
        if let Some(nominal) = self.nominal {
            active.nominal = ActiveValue::Set(nominal);
        }
        if let Some(periode) = self.periode {
            active.periode = ActiveValue::Set(periode.as_str().to_string());
        }
        if let Some(aktif) = self.aktif {
            active.aktif = ActiveValue::Set(aktif);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub nama: String,
    pub nominal: i64,
    pub periode: String,
    pub aktif: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for PaymentType {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let periode = Period::try_from(model.periode.as_str())?;
        Ok(PaymentType {
            id: model.id,
            nama: model.nama,
            nominal: model.nominal,
            periode,
            aktif: model.aktif,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
