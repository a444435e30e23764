mod common;

use chrono::NaiveDate;
use engine::{
    EngineError, NewPayment, PaymentFilter, PaymentPatch, PaymentStatus, PaymentTypeRef,
    StudentRef,
};

use common::{add_student, fixture};

fn spp_for(nisn: &str, date: Option<NaiveDate>) -> NewPayment {
    NewPayment {
        student: StudentRef::Nisn(nisn.to_string()),
        payment_type: PaymentTypeRef::Name("SPP Bulanan".to_string()),
        nominal: None,
        tanggal_pembayaran: date,
        status: None,
        keterangan: None,
        catatan: None,
        petugas: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn defaults_come_from_type_and_actor() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let payment = fx
        .engine
        .new_payment(&fx.operator, spp_for("2024001001", None))
        .await
        .unwrap();

    assert_eq!(payment.student_nisn, "2024001001");
    assert_eq!(payment.jenis_pembayaran, "SPP Bulanan");
    assert_eq!(payment.nominal, 150_000);
    assert_eq!(payment.status, PaymentStatus::Lunas);
    assert_eq!(payment.petugas, "Bu Sari");
    assert_eq!(payment.created_by, Some(fx.operator.id));
    assert_eq!(payment.tanggal_pembayaran, chrono::Utc::now().date_naive());
}

#[tokio::test]
async fn legacy_student_id_is_resolved_to_nisn() {
    let fx = fixture().await;
    let student = add_student(&fx, "2024001001", "Ani").await;
    let mut new = spp_for("ignored", None);
    new.student = StudentRef::Id(student.id);
    let payment = fx.engine.new_payment(&fx.admin, new).await.unwrap();
    assert_eq!(payment.student_nisn, "2024001001");

    let by_id = fx
        .engine
        .payments(
            &fx.admin,
            PaymentFilter {
                student_nisn: None,
                student_id: Some(student.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(by_id.len(), 1);

    let unknown = fx
        .engine
        .payments(
            &fx.admin,
            PaymentFilter {
                student_nisn: None,
                student_id: Some(student.id + 100),
            },
        )
        .await
        .unwrap();
    assert!(unknown.is_empty());
}

#[tokio::test]
async fn unknown_references_are_rejected() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;

    let err = fx
        .engine
        .new_payment(&fx.admin, spp_for("2024009999", None))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::MissingReference("Siswa tidak ditemukan".to_string())
    );

    let mut new = spp_for("2024001001", None);
    new.payment_type = PaymentTypeRef::Id(9_999);
    let err = fx.engine.new_payment(&fx.admin, new).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::MissingReference("Jenis pembayaran tidak ditemukan".to_string())
    );

    assert!(
        fx.engine
            .payments(&fx.admin, PaymentFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn non_positive_nominal_is_rejected() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let mut new = spp_for("2024001001", None);
    new.nominal = Some(-5);
    let err = fx.engine.new_payment(&fx.admin, new).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn by_month_uses_half_open_range() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    add_student(&fx, "2024001002", "Budi").await;
    for d in [date(2024, 7, 1), date(2024, 7, 31), date(2024, 8, 1), date(2024, 6, 30)] {
        fx.engine
            .new_payment(&fx.admin, spp_for("2024001001", Some(d)))
            .await
            .unwrap();
    }
    fx.engine
        .new_payment(&fx.admin, spp_for("2024001002", Some(date(2024, 7, 15))))
        .await
        .unwrap();

    let july = fx
        .engine
        .payments_by_month(&fx.admin, Some("2024001001"), 7, 2024)
        .await
        .unwrap();
    assert_eq!(july.len(), 2);
    assert!(july.iter().all(|p| p.tanggal_pembayaran.format("%Y-%m").to_string() == "2024-07"));

    let everyone = fx
        .engine
        .payments_by_month(&fx.operator, None, 7, 2024)
        .await
        .unwrap();
    assert_eq!(everyone.len(), 3);

    let err = fx
        .engine
        .payments_by_month(&fx.admin, None, 13, 2024)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn update_changes_type_and_status() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let payment = fx
        .engine
        .new_payment(&fx.admin, spp_for("2024001001", None))
        .await
        .unwrap();

    let updated = fx
        .engine
        .update_payment(
            &fx.operator,
            payment.id,
            PaymentPatch {
                payment_type: Some(PaymentTypeRef::Name("uang buku".to_string())),
                status: Some(PaymentStatus::BelumLunas),
                catatan: Some("cicilan pertama".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.jenis_pembayaran, "Uang Buku");
    assert_eq!(updated.status, PaymentStatus::BelumLunas);
    assert_eq!(updated.catatan.as_deref(), Some("cicilan pertama"));
    // The amount is not re-derived on update.
    assert_eq!(updated.nominal, 150_000);
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let payment = fx
        .engine
        .new_payment(&fx.admin, spp_for("2024001001", None))
        .await
        .unwrap();
    let err = fx
        .engine
        .update_payment(&fx.admin, payment.id, PaymentPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NothingToUpdate);
}

#[tokio::test]
async fn operator_cannot_delete_and_second_delete_is_not_found() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let payment = fx
        .engine
        .new_payment(&fx.operator, spp_for("2024001001", None))
        .await
        .unwrap();

    let err = fx
        .engine
        .delete_payment(&fx.operator, payment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    fx.engine.delete_payment(&fx.admin, payment.id).await.unwrap();
    let err = fx
        .engine
        .delete_payment(&fx.admin, payment.id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("Pembayaran tidak ditemukan".to_string())
    );
}
