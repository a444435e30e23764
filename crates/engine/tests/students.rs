mod common;

use engine::{
    EngineError, Gender, NewPayment, NewStudent, PaymentTypeRef, StudentKey, StudentPatch,
    StudentRef,
};

use common::{add_student, fixture};

#[tokio::test]
async fn create_then_fetch_by_nisn_returns_same_values() {
    let fx = fixture().await;
    let created = fx
        .engine
        .new_student(
            &fx.admin,
            NewStudent {
                nisn: "2024009001".to_string(),
                nama: "Test".to_string(),
                kelas: Some("1A".to_string()),
                jenis_kelamin: Some(Gender::L),
                angkatan: Some("2024".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let fetched = fx
        .engine
        .student_by_nisn(&fx.operator, "2024009001")
        .await
        .unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.nama, "Test");
    assert_eq!(fetched.kelas, "1A");
    assert_eq!(fetched.jenis_kelamin, Gender::L);
    assert_eq!(fetched.angkatan, "2024");
}

#[tokio::test]
async fn defaults_are_applied() {
    let fx = fixture().await;
    let student = fx
        .engine
        .new_student(
            &fx.admin,
            NewStudent {
                nisn: "12345".to_string(),
                nama: "  Budi  ".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(student.nama, "Budi");
    assert_eq!(student.kelas, "1A");
    assert_eq!(student.jenis_kelamin, Gender::L);
    assert_eq!(student.angkatan.len(), 4);
}

#[tokio::test]
async fn duplicate_nisn_is_rejected() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let err = fx
        .engine
        .new_student(
            &fx.admin,
            NewStudent {
                nisn: "2024001001".to_string(),
                nama: "Ani Lagi".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("NISN sudah terdaftar".to_string()));
}

#[tokio::test]
async fn invalid_nisn_is_rejected() {
    let fx = fixture().await;
    let err = fx
        .engine
        .new_student(
            &fx.admin,
            NewStudent {
                nisn: "12AB".to_string(),
                nama: "X".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn missing_nisn_echoes_searched_value() {
    let fx = fixture().await;
    let key = StudentKey::parse("99999999999").unwrap();
    let err = fx.engine.student(&fx.admin, &key).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::StudentNotFound {
            searched: "99999999999".to_string()
        }
    );
}

#[tokio::test]
async fn short_key_matches_legacy_id() {
    let fx = fixture().await;
    let student = add_student(&fx, "2024001001", "Ani").await;
    let key = StudentKey::parse(&student.id.to_string()).unwrap();
    let found = fx.engine.student(&fx.admin, &key).await.unwrap();
    assert_eq!(found.nisn, "2024001001");
}

#[tokio::test]
async fn nisn_match_wins_over_id_match() {
    let fx = fixture().await;
    let first = add_student(&fx, "2024001001", "Ani").await;
    // A second student whose NISN equals the first student's numeric id.
    let second = add_student(&fx, &first.id.to_string(), "Budi").await;

    let key = StudentKey::parse(&first.id.to_string()).unwrap();
    let found = fx.engine.student(&fx.admin, &key).await.unwrap();
    assert_eq!(found.id, second.id);
    assert_eq!(found.nama, "Budi");
}

#[tokio::test]
async fn nisn_route_never_consults_id() {
    let fx = fixture().await;
    let student = add_student(&fx, "2024001001", "Ani").await;
    let err = fx
        .engine
        .student_by_nisn(&fx.admin, &student.id.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StudentNotFound { .. }));
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    let fx = fixture().await;
    let student = add_student(&fx, "2024001001", "Ani").await;
    let key = StudentKey::parse("2024001001").unwrap();
    let updated = fx
        .engine
        .update_student(
            &fx.admin,
            &key,
            StudentPatch {
                kelas: Some("2B".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.kelas, "2B");
    assert_eq!(updated.nama, student.nama);
    assert_eq!(updated.angkatan, student.angkatan);
    assert!(updated.updated_at >= student.updated_at);
}

#[tokio::test]
async fn update_trims_contact_fields() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let key = StudentKey::parse("2024001001").unwrap();
    let updated = fx
        .engine
        .update_student(
            &fx.admin,
            &key,
            StudentPatch {
                alamat: Some("  Jl. Melati 3 ".to_string()),
                no_hp: Some(" 08123456789 ".to_string()),
                nama_wali: Some(" Pak Budi  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.alamat, "Jl. Melati 3");
    assert_eq!(updated.no_hp, "08123456789");
    assert_eq!(updated.nama_wali, "Pak Budi");
}

#[tokio::test]
async fn overlong_fields_are_rejected() {
    let fx = fixture().await;
    let err = fx
        .engine
        .new_student(
            &fx.admin,
            NewStudent {
                nisn: "2024001001".to_string(),
                nama: "Ani".to_string(),
                kelas: Some("10 IPA 1 Unggulan".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidField("Kelas maksimal 10 karakter".to_string())
    );

    add_student(&fx, "2024001001", "Ani").await;
    let key = StudentKey::parse("2024001001").unwrap();
    let err = fx
        .engine
        .update_student(
            &fx.admin,
            &key,
            StudentPatch {
                nama_wali: Some("w".repeat(101)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidField(_)));
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let key = StudentKey::parse("2024001001").unwrap();
    let err = fx
        .engine
        .update_student(&fx.admin, &key, StudentPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NothingToUpdate);
}

#[tokio::test]
async fn update_to_taken_nisn_is_rejected() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    add_student(&fx, "2024001002", "Budi").await;
    let key = StudentKey::parse("2024001002").unwrap();
    let err = fx
        .engine
        .update_student(
            &fx.admin,
            &key,
            StudentPatch {
                nisn: Some("2024001001".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("NISN sudah terdaftar".to_string()));
}

#[tokio::test]
async fn nisn_change_carries_payments_along() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    fx.engine
        .new_payment(
            &fx.admin,
            NewPayment {
                student: StudentRef::Nisn("2024001001".to_string()),
                payment_type: PaymentTypeRef::Name("SPP Bulanan".to_string()),
                nominal: None,
                tanggal_pembayaran: None,
                status: None,
                keterangan: None,
                catatan: None,
                petugas: None,
            },
        )
        .await
        .unwrap();

    let key = StudentKey::parse("2024001001").unwrap();
    fx.engine
        .update_student(
            &fx.admin,
            &key,
            StudentPatch {
                nisn: Some("2024001099".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let payments = fx
        .engine
        .payments(
            &fx.admin,
            engine::PaymentFilter {
                student_nisn: Some("2024001099".to_string()),
                student_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
}

#[tokio::test]
async fn student_with_payments_cannot_be_deleted() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    fx.engine
        .new_payment(
            &fx.admin,
            NewPayment {
                student: StudentRef::Nisn("2024001001".to_string()),
                payment_type: PaymentTypeRef::Name("SPP Bulanan".to_string()),
                nominal: None,
                tanggal_pembayaran: None,
                status: None,
                keterangan: None,
                catatan: None,
                petugas: None,
            },
        )
        .await
        .unwrap();

    let key = StudentKey::parse("2024001001").unwrap();
    let err = fx.engine.delete_student(&fx.admin, &key).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InUse(
            "Tidak dapat menghapus siswa yang memiliki riwayat pembayaran".to_string()
        )
    );
    // Both rows survive.
    assert!(fx.engine.student(&fx.admin, &key).await.is_ok());
    let payments = fx
        .engine
        .payments(&fx.admin, Default::default())
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
}

#[tokio::test]
async fn second_delete_is_not_found() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    let key = StudentKey::parse("2024001001").unwrap();
    fx.engine.delete_student(&fx.admin, &key).await.unwrap();
    let err = fx.engine.delete_student(&fx.admin, &key).await.unwrap_err();
    assert!(matches!(err, EngineError::StudentNotFound { .. }));
}

#[tokio::test]
async fn operator_can_read_but_not_delete() {
    let fx = fixture().await;
    add_student(&fx, "2024001001", "Ani").await;
    assert_eq!(fx.engine.students(&fx.operator).await.unwrap().len(), 1);

    let key = StudentKey::parse("2024001001").unwrap();
    let err = fx
        .engine
        .delete_student(&fx.operator, &key)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
