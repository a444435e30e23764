//! The module contains `Student`, its identifiers and the `students` table.

use chrono::{DateTime, Utc};
use sea_orm::{
    Condition,
    entity::{ActiveValue, prelude::*},
};

use crate::{EngineError, ResultEngine};

/// Longest NISN accepted by the schema.
pub const NISN_MAX_LEN: usize = 20;

/// Parameters longer than this are never treated as a legacy numeric id.
const LEGACY_ID_MAX_LEN: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Gender {
    /// Laki-laki
    #[default]
    L,
    /// Perempuan
    P,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::P => "P",
        }
    }
}

impl TryFrom<&str> for Gender {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "L" | "l" => Ok(Self::L),
            "P" | "p" => Ok(Self::P),
            _ => Err(EngineError::InvalidField(
                "jenis_kelamin harus L atau P".to_string(),
            )),
        }
    }
}

/// A student record.
///
/// `nisn` is the canonical identifier and the key payments refer to. `id`
/// is kept for clients that still address students by their legacy number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Student {
    pub id: i32,
    pub nisn: String,
    pub nama: String,
    pub kelas: String,
    pub alamat: String,
    pub no_hp: String,
    pub nama_wali: String,
    pub jenis_kelamin: Gender,
    pub angkatan: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewStudent {
    pub nisn: String,
    pub nama: String,
    /// Defaults to `1A`.
    pub kelas: Option<String>,
    pub alamat: Option<String>,
    pub no_hp: Option<String>,
    pub nama_wali: Option<String>,
    pub jenis_kelamin: Option<Gender>,
    /// Defaults to the current year.
    pub angkatan: Option<String>,
}

/// Partial update of a student. Only `Some` fields become assignments.
#[derive(Clone, Debug, Default)]
pub struct StudentPatch {
    pub nisn: Option<String>,
    pub nama: Option<String>,
    pub kelas: Option<String>,
    pub alamat: Option<String>,
    pub no_hp: Option<String>,
    pub nama_wali: Option<String>,
    pub jenis_kelamin: Option<Gender>,
    pub angkatan: Option<String>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.nisn.is_none()
            && self.nama.is_none()
            && self.kelas.is_none()
            && self.alamat.is_none()
            && self.no_hp.is_none()
            && self.nama_wali.is_none()
            && self.jenis_kelamin.is_none()
            && self.angkatan.is_none()
    }

    pub(crate) fn apply(self, active: &mut ActiveModel) {
        if let Some(nisn) = self.nisn {
            active.nisn = ActiveValue::Set(nisn);
        }
        if let Some(nama) = self.nama {
            active.nama = ActiveValue::Set(nama);
        }
        if let Some(kelas) = self.kelas {
            active.kelas = ActiveValue::Set(kelas);
        }
        if let Some(alamat) = self.alamat {
            active.alamat = ActiveValue::Set(alamat);
        }
        if let Some(no_hp) = self.no_hp {
            active.no_hp = ActiveValue::Set(no_hp);
        }
        if let Some(nama_wali) = self.nama_wali {
            active.nama_wali = ActiveValue::Set(nama_wali);
        }
        if let Some(jenis_kelamin) = self.jenis_kelamin {
            active.jenis_kelamin = ActiveValue::Set(jenis_kelamin.as_str().to_string());
        }
        if let Some(angkatan) = self.angkatan {
            active.angkatan = ActiveValue::Set(angkatan);
        }
    }
}

/// How a `/students/{id}` path parameter is matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudentKey {
    /// Match on NISN only.
    Nisn(String),
    /// Match on NISN, or on the legacy numeric id when the value parses as
    /// one. A NISN match takes precedence.
    NisnOrId { value: String, id: Option<i32> },
}

impl StudentKey {
    /// Classify a raw identifier.
    ///
    /// Values longer than ten characters can only be a NISN; shorter ones may
    /// also be a legacy id. A short NISN that collides with another
    /// student's numeric id resolves to the NISN owner.
    pub fn parse(raw: &str) -> ResultEngine<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(EngineError::InvalidField("ID/NISN tidak valid".to_string()));
        }
        if value.len() > LEGACY_ID_MAX_LEN {
            return Ok(Self::Nisn(value.to_string()));
        }
        Ok(Self::NisnOrId {
            value: value.to_string(),
            id: value.parse().ok(),
        })
    }

    /// The identifier as the caller supplied it (trimmed).
    pub fn searched(&self) -> &str {
        match self {
            Self::Nisn(value) | Self::NisnOrId { value, .. } => value,
        }
    }

    pub(crate) fn condition(&self) -> Condition {
        match self {
            Self::Nisn(nisn) => Condition::all().add(Column::Nisn.eq(nisn.as_str())),
            Self::NisnOrId { value, id } => {
                let mut cond = Condition::any().add(Column::Nisn.eq(value.as_str()));
                if let Some(id) = id {
                    cond = cond.add(Column::Id.eq(*id));
                }
                cond
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub nisn: String,
    pub nama: String,
    pub kelas: String,
    pub alamat: String,
    pub no_hp: String,
    pub nama_wali: String,
    pub jenis_kelamin: String,
    pub angkatan: String,
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

impl TryFrom<Model> for Student {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let jenis_kelamin = Gender::try_from(model.jenis_kelamin.as_str())?;
        Ok(Student {
            id: model.id,
            nisn: model.nisn,
            nama: model.nama,
            kelas: model.kelas,
            alamat: model.alamat,
            no_hp: model.no_hp,
            nama_wali: model.nama_wali,
            jenis_kelamin,
            angkatan: model.angkatan,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_identifier_is_nisn_only() {
        let key = StudentKey::parse("20240010012").unwrap();
        assert_eq!(key, StudentKey::Nisn("20240010012".to_string()));
    }

    #[test]
    fn short_numeric_identifier_may_be_legacy_id() {
        let key = StudentKey::parse(" 42 ").unwrap();
        assert_eq!(
            key,
            StudentKey::NisnOrId {
                value: "42".to_string(),
                id: Some(42),
            }
        );
        assert_eq!(key.searched(), "42");
    }

    #[test]
    fn short_non_numeric_identifier_has_no_id() {
        let key = StudentKey::parse("A12").unwrap();
        assert_eq!(
            key,
            StudentKey::NisnOrId {
                value: "A12".to_string(),
                id: None,
            }
        );
    }

    #[test]
    fn ten_digit_identifier_still_tries_id() {
        // 2024001001 fits in an i32, so it is also tried as a legacy id.
        let key = StudentKey::parse("2024001001").unwrap();
        assert!(matches!(key, StudentKey::NisnOrId { id: Some(2024001001), .. }));
    }

    #[test]
    fn blank_identifier_is_rejected() {
        assert_eq!(
            StudentKey::parse("   ").unwrap_err(),
            EngineError::InvalidField("ID/NISN tidak valid".to_string())
        );
    }

    #[test]
    fn gender_parsing() {
        assert_eq!(Gender::try_from("p").unwrap(), Gender::P);
        assert!(Gender::try_from("X").is_err());
    }
}
