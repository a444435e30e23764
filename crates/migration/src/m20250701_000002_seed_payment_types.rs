//! Seeds the default fee catalogue.

use chrono::Utc;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum PaymentTypes {
    Table,
    Nama,
    Nominal,
    Periode,
    Aktif,
    CreatedAt,
    UpdatedAt,
}

/// `(nama, nominal, periode)` of the default payment types.
const DEFAULT_PAYMENT_TYPES: &[(&str, i64, &str)] = &[
    ("SPP Bulanan", 150_000, "Bulanan"),
    ("Uang Gedung", 500_000, "Tahunan"),
    ("Uang Seragam", 300_000, "Tahunan"),
    ("Uang Buku", 200_000, "Tahunan"),
    ("Uang Kegiatan", 100_000, "Semester"),
    ("Uang Praktikum", 75_000, "Semester"),
    ("Dana Sosial", 50_000, "Bulanan"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = Utc::now();
        let mut insert = Query::insert();
        insert.into_table(PaymentTypes::Table).columns([
            PaymentTypes::Nama,
            PaymentTypes::Nominal,
            PaymentTypes::Periode,
            PaymentTypes::Aktif,
            PaymentTypes::CreatedAt,
            PaymentTypes::UpdatedAt,
        ]);

        for (nama, nominal, periode) in DEFAULT_PAYMENT_TYPES {
            insert
                .values([
                    (*nama).into(),
                    (*nominal).into(),
                    (*periode).into(),
                    true.into(),
                    now.into(),
                    now.into(),
                ])
                .map_err(|err| DbErr::Custom(err.to_string()))?;
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names: Vec<&str> = DEFAULT_PAYMENT_TYPES
            .iter()
            .map(|(nama, _, _)| *nama)
            .collect();
        let delete = Query::delete()
            .from_table(PaymentTypes::Table)
            .and_where(Expr::col(PaymentTypes::Nama).is_in(names))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
