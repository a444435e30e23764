//! Recorded fee payments.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PaymentStatus {
    #[default]
    Lunas,
    BelumLunas,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lunas => "lunas",
            Self::BelumLunas => "belum_lunas",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "lunas" => Ok(Self::Lunas),
            "belum_lunas" | "belum lunas" => Ok(Self::BelumLunas),
            _ => Err(EngineError::InvalidField(
                "Status harus lunas atau belum_lunas".to_string(),
            )),
        }
    }
}

/// A payment joined with the name of its payment type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub id: i32,
    pub student_nisn: String,
    pub payment_type_id: i32,
    /// Name of the payment type, derived on read.
    pub jenis_pembayaran: String,
    pub nominal: i64,
    pub tanggal_pembayaran: NaiveDate,
    pub status: PaymentStatus,
    pub keterangan: Option<String>,
    pub catatan: Option<String>,
    pub petugas: String,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which student a payment belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudentRef {
    Nisn(String),
    /// Legacy numeric student id, resolved to the NISN before storing.
    Id(i32),
}

/// Which payment type a payment is for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentTypeRef {
    Id(i32),
    /// Case-insensitive payment type name.
    Name(String),
}

#[derive(Clone, Debug)]
pub struct NewPayment {
    pub student: StudentRef,
    pub payment_type: PaymentTypeRef,
    /// Defaults to the payment type's nominal.
    pub nominal: Option<i64>,
    /// Defaults to today.
    pub tanggal_pembayaran: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
    pub keterangan: Option<String>,
    pub catatan: Option<String>,
    /// Defaults to the recording user's full name.
    pub petugas: Option<String>,
}

/// Partial update of a payment. The student and payment type references
/// are resolved by the engine before being written.
#[derive(Clone, Debug, Default)]
pub struct PaymentPatch {
    pub student: Option<StudentRef>,
    pub payment_type: Option<PaymentTypeRef>,
    pub nominal: Option<i64>,
    pub tanggal_pembayaran: Option<NaiveDate>,
    pub status: Option<PaymentStatus>,
    pub keterangan: Option<String>,
    pub catatan: Option<String>,
    pub petugas: Option<String>,
}

impl PaymentPatch {
    pub fn is_empty(&self) -> bool {
        self.student.is_none()
            && self.payment_type.is_none()
            && self.nominal.is_none()
            && self.tanggal_pembayaran.is_none()
            && self.status.is_none()
            && self.keterangan.is_none()
            && self.catatan.is_none()
            && self.petugas.is_none()
    }

    /// Move the plain columns into `active`; references are left to the
    /// caller.
    pub(crate) fn apply(self, active: &mut ActiveModel) {
        if let Some(nominal) = self.nominal {
            active.nominal = ActiveValue::Set(nominal);
        }
        if let Some(tanggal) = self.tanggal_pembayaran {
            active.tanggal_pembayaran = ActiveValue::Set(tanggal);
        }
        if let Some(status) = self.status {
            active.status = ActiveValue::Set(status.as_str().to_string());
        }
        if let Some(keterangan) = self.keterangan {
            active.keterangan = ActiveValue::Set(crate::util::non_empty(keterangan));
        }
        if let Some(catatan) = self.catatan {
            active.catatan = ActiveValue::Set(crate::util::non_empty(catatan));
        }
        if let Some(petugas) = self.petugas {
            active.petugas = ActiveValue::Set(petugas);
        }
    }
}

/// Filters for listing payments. Both student fields narrow the result to
/// one student; `student_id` is resolved to its NISN first.
#[derive(Clone, Debug, Default)]
pub struct PaymentFilter {
    pub student_nisn: Option<String>,
    pub student_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_nisn: String,
    pub payment_type_id: i32,
    pub nominal: i64,
    pub tanggal_pembayaran: Date,
    pub status: String,
    pub keterangan: Option<String>,
    pub catatan: Option<String>,
    pub petugas: String,
    pub created_by: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentNisn",
        to = "super::students::Column::Nisn",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Students,
    #[sea_orm(
        belongs_to = "super::payment_types::Entity",
        from = "Column::PaymentTypeId",
        to = "super::payment_types::Column::Id",
        on_delete = "Restrict"
    )]
    PaymentTypes,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    Users,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::payment_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<(Model, String)> for Payment {
    type Error = EngineError;

    fn try_from((model, jenis_pembayaran): (Model, String)) -> Result<Self, Self::Error> {
        let status = PaymentStatus::try_from(model.status.as_str())?;
        Ok(Payment {
            id: model.id,
            student_nisn: model.student_nisn,
            payment_type_id: model.payment_type_id,
            jenis_pembayaran,
            nominal: model.nominal,
            tanggal_pembayaran: model.tanggal_pembayaran,
            status,
            keterangan: model.keterangan,
            catatan: model.catatan,
            petugas: model.petugas,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_spaced_form() {
        assert_eq!(
            PaymentStatus::try_from("Belum Lunas").unwrap(),
            PaymentStatus::BelumLunas
        );
        assert_eq!(PaymentStatus::try_from("lunas").unwrap(), PaymentStatus::Lunas);
        assert!(PaymentStatus::try_from("pending").is_err());
    }
}
