use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};
use tracing::info;

use crate::{
    Action, Actor, EngineError, NewStudent, Resource, ResultEngine, Student, StudentKey,
    StudentPatch, payments, students,
    util::{
        check_max_len, normalize_angkatan, normalize_nisn, normalize_required, trimmed_or_empty,
    },
};

use super::{Engine, with_tx};

const DEFAULT_KELAS: &str = "1A";
const NAMA_MAX_LEN: usize = 100;
const KELAS_MAX_LEN: usize = 10;
const NO_HP_MAX_LEN: usize = 20;

impl Engine {
    pub async fn students(&self, actor: &Actor) -> ResultEngine<Vec<Student>> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Students, Action::Read)
                .await?;
            let models = students::Entity::find()
                .order_by_asc(students::Column::Kelas)
                .order_by_asc(students::Column::Nama)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Student::try_from).collect()
        })
    }

    /// Look a student up by NISN or legacy id, see [`StudentKey::parse`].
    pub async fn student(&self, actor: &Actor, key: &StudentKey) -> ResultEngine<Student> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Students, Action::Read)
                .await?;
            Student::try_from(self.require_student(&db_tx, key).await?)
        })
    }

    pub async fn student_by_nisn(&self, actor: &Actor, nisn: &str) -> ResultEngine<Student> {
        let nisn = nisn.trim();
        if nisn.is_empty() {
            return Err(EngineError::InvalidField("NISN tidak valid".to_string()));
        }
        self.student(actor, &StudentKey::Nisn(nisn.to_string()))
            .await
    }

    pub async fn new_student(&self, actor: &Actor, new: NewStudent) -> ResultEngine<Student> {
        let nisn = normalize_nisn(&new.nisn)?;
        let nama = normalize_nama(&new.nama)?;
        let kelas = match new.kelas.as_deref().map(str::trim) {
            Some(kelas) if !kelas.is_empty() => normalize_kelas(kelas)?,
            _ => DEFAULT_KELAS.to_string(),
        };
        let angkatan = match new.angkatan.as_deref().map(str::trim) {
            Some(angkatan) if !angkatan.is_empty() => normalize_angkatan(angkatan)?,
            _ => Utc::now().year().to_string(),
        };
        let alamat = trimmed_or_empty(new.alamat);
        let no_hp = normalize_no_hp(trimmed_or_empty(new.no_hp))?;
        let nama_wali = normalize_nama_wali(trimmed_or_empty(new.nama_wali))?;

        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Students, Action::Create)
                .await?;
            self.ensure_nisn_free(&db_tx, &nisn, None).await?;
            let now = Utc::now();
            let model = students::ActiveModel {
                id: ActiveValue::NotSet,
                nisn: ActiveValue::Set(nisn),
                nama: ActiveValue::Set(nama),
                kelas: ActiveValue::Set(kelas),
                alamat: ActiveValue::Set(alamat),
                no_hp: ActiveValue::Set(no_hp),
                nama_wali: ActiveValue::Set(nama_wali),
                jenis_kelamin: ActiveValue::Set(
                    new.jenis_kelamin.unwrap_or_default().as_str().to_string(),
                ),
                angkatan: ActiveValue::Set(angkatan),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;
            info!(nisn = %model.nisn, by = actor.id, "student added");
            Student::try_from(model)
        })
    }

    /// Apply a partial update. Changing the NISN cascades to the student's
    /// payments.
    pub async fn update_student(
        &self,
        actor: &Actor,
        key: &StudentKey,
        mut patch: StudentPatch,
    ) -> ResultEngine<Student> {
        if patch.is_empty() {
            return Err(EngineError::NothingToUpdate);
        }
        if let Some(nisn) = patch.nisn.take() {
            patch.nisn = Some(normalize_nisn(&nisn)?);
        }
        if let Some(nama) = patch.nama.take() {
            patch.nama = Some(normalize_nama(&nama)?);
        }
        if let Some(kelas) = patch.kelas.take() {
            patch.kelas = Some(normalize_kelas(&kelas)?);
        }
        if let Some(alamat) = patch.alamat.take() {
            patch.alamat = Some(alamat.trim().to_string());
        }
        if let Some(no_hp) = patch.no_hp.take() {
            patch.no_hp = Some(normalize_no_hp(no_hp.trim().to_string())?);
        }
        if let Some(nama_wali) = patch.nama_wali.take() {
            patch.nama_wali = Some(normalize_nama_wali(nama_wali.trim().to_string())?);
        }
        if let Some(angkatan) = patch.angkatan.take() {
            patch.angkatan = Some(normalize_angkatan(&angkatan)?);
        }
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Students, Action::Update)
                .await?;
            let model = self.require_student(&db_tx, key).await?;
            let old_nisn = model.nisn.clone();
            let new_nisn = patch.nisn.clone().filter(|nisn| *nisn != old_nisn);
            if let Some(nisn) = new_nisn.as_deref() {
                self.ensure_nisn_free(&db_tx, nisn, Some(model.id)).await?;
            }

            let mut active: students::ActiveModel = model.into();
            patch.apply(&mut active);
            active.updated_at = ActiveValue::Set(Utc::now());
            let model = active.update(&db_tx).await?;

            if let Some(nisn) = new_nisn {
                // No-op where the FK already cascaded.
                payments::Entity::update_many()
                    .col_expr(payments::Column::StudentNisn, Expr::value(nisn))
                    .filter(payments::Column::StudentNisn.eq(old_nisn))
                    .exec(&db_tx)
                    .await?;
            }
            info!(nisn = %model.nisn, by = actor.id, "student updated");
            Student::try_from(model)
        })
    }

    /// Delete a student without payment history.
    pub async fn delete_student(&self, actor: &Actor, key: &StudentKey) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.authorize(&db_tx, actor, Resource::Students, Action::Delete)
                .await?;
            let model = self.require_student(&db_tx, key).await?;
            let payments = payments::Entity::find()
                .filter(payments::Column::StudentNisn.eq(model.nisn.as_str()))
                .count(&db_tx)
                .await?;
            if payments > 0 {
                return Err(EngineError::InUse(
                    "Tidak dapat menghapus siswa yang memiliki riwayat pembayaran".to_string(),
                ));
            }
            students::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            info!(nisn = %model.nisn, by = actor.id, "student deleted");
            Ok(())
        })
    }

    pub(super) async fn require_student(
        &self,
        db: &DatabaseTransaction,
        key: &StudentKey,
    ) -> ResultEngine<students::Model> {
        let candidates = students::Entity::find()
            .filter(key.condition())
            .all(db)
            .await?;
        let searched = key.searched();
        let mut by_id = None;
        for model in candidates {
            if model.nisn == searched {
                return Ok(model);
            }
            by_id.get_or_insert(model);
        }
        by_id.ok_or_else(|| EngineError::StudentNotFound {
            searched: searched.to_string(),
        })
    }

    async fn ensure_nisn_free(
        &self,
        db: &DatabaseTransaction,
        nisn: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = students::Entity::find().filter(students::Column::Nisn.eq(nisn));
        if let Some(id) = except {
            query = query.filter(students::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey("NISN sudah terdaftar".to_string()));
        }
        Ok(())
    }
}

fn normalize_nama(value: &str) -> ResultEngine<String> {
    let nama = normalize_required(value, "Nama siswa harus diisi")?;
    check_max_len(&nama, NAMA_MAX_LEN, "Nama siswa")?;
    Ok(nama)
}

fn normalize_kelas(value: &str) -> ResultEngine<String> {
    let kelas = normalize_required(value, "Kelas harus diisi")?;
    check_max_len(&kelas, KELAS_MAX_LEN, "Kelas")?;
    Ok(kelas)
}

fn normalize_no_hp(no_hp: String) -> ResultEngine<String> {
    check_max_len(&no_hp, NO_HP_MAX_LEN, "No HP")?;
    Ok(no_hp)
}

fn normalize_nama_wali(nama_wali: String) -> ResultEngine<String> {
    check_max_len(&nama_wali, NAMA_MAX_LEN, "Nama wali")?;
    Ok(nama_wali)
}
