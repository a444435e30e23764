use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// Echo of the identifier a failed student lookup searched for.
    #[serde(rename = "searchedId", skip_serializing_if = "Option::is_none", default)]
    pub searched_id: Option<String>,
}

/// Plain acknowledgement of a mutation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Acknowledgement of a create, carrying the new row id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub message: String,
    pub id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Admin,
        #[default]
        Operator,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        #[serde(default)]
        pub username: String,
        #[serde(default)]
        pub password: String,
        #[serde(default, alias = "rememberMe")]
        pub remember_me: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub message: String,
        pub token: String,
        pub expires_at: DateTime<Utc>,
        pub user: UserView,
    }

    /// Account as returned by the API. There is no password field.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i32,
        pub username: String,
        pub nama_lengkap: String,
        pub role: Role,
        pub email: Option<String>,
        pub no_hp: Option<String>,
        pub aktif: bool,
        pub last_login: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Body of `POST /users/register` and `POST /users`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        #[serde(default)]
        pub username: String,
        #[serde(default)]
        pub password: String,
        #[serde(default)]
        pub nama_lengkap: String,
        pub role: Option<Role>,
        pub email: Option<String>,
        pub no_hp: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Registered {
        pub message: String,
        pub user_id: i32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub username: Option<String>,
        pub nama_lengkap: Option<String>,
        pub role: Option<Role>,
        pub email: Option<String>,
        pub no_hp: Option<String>,
        pub aktif: Option<bool>,
    }

    /// Response of user and profile updates.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserUpdated {
        pub message: String,
        pub user: UserView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        #[serde(default)]
        pub nama_lengkap: String,
        pub email: Option<String>,
        pub no_hp: Option<String>,
    }

    /// Body of the password endpoints. `old_password` may be omitted only
    /// when an admin resets another account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        #[serde(default, alias = "oldPassword")]
        pub old_password: Option<String>,
        #[serde(default, alias = "newPassword")]
        pub new_password: String,
    }

    /// The authenticated caller.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionUser {
        pub id: i32,
        pub username: String,
        pub role: Role,
        pub nama_lengkap: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionView {
        pub user: SessionUser,
        pub remember_me: bool,
        pub expires_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct KeepAlive {
        pub message: String,
        pub expires_at: DateTime<Utc>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Resource {
        Users,
        Students,
        Payments,
        PaymentTypes,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PermissionView {
        pub permission: Resource,
        pub can_read: bool,
        pub can_create: bool,
        pub can_update: bool,
        pub can_delete: bool,
        /// `false` when the flags are the role default.
        pub explicit: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PermissionsResponse {
        pub user_id: i32,
        pub permissions: Vec<PermissionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PermissionEntry {
        pub permission: Resource,
        #[serde(default)]
        pub can_read: bool,
        #[serde(default)]
        pub can_create: bool,
        #[serde(default)]
        pub can_update: bool,
        #[serde(default)]
        pub can_delete: bool,
    }

    /// Body of `PUT /users/{id}/permissions`. An empty list resets the
    /// user to its role defaults.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PermissionsUpdate {
        #[serde(default)]
        pub permissions: Vec<PermissionEntry>,
    }
}

pub mod student {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Gender {
        #[default]
        #[serde(alias = "l")]
        L,
        #[serde(alias = "p")]
        P,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StudentView {
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

    /// Body of `POST /students`. Older clients send `nama_lengkap`/`name`,
    /// `no_telepon` and `nama_orang_tua`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StudentNew {
        #[serde(default)]
        pub nisn: String,
        #[serde(default, alias = "nama_lengkap", alias = "name")]
        pub nama: String,
        pub kelas: Option<String>,
        pub alamat: Option<String>,
        #[serde(alias = "no_telepon")]
        pub no_hp: Option<String>,
        #[serde(alias = "nama_orang_tua")]
        pub nama_wali: Option<String>,
        pub jenis_kelamin: Option<Gender>,
        pub angkatan: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StudentCreated {
        pub message: String,
        pub nisn: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StudentUpdate {
        pub nisn: Option<String>,
        #[serde(alias = "nama_lengkap", alias = "name")]
        pub nama: Option<String>,
        pub kelas: Option<String>,
        pub alamat: Option<String>,
        #[serde(alias = "no_telepon")]
        pub no_hp: Option<String>,
        #[serde(alias = "nama_orang_tua")]
        pub nama_wali: Option<String>,
        pub jenis_kelamin: Option<Gender>,
        pub angkatan: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StudentUpdated {
        pub message: String,
        pub student: StudentView,
    }
}

pub mod payment_type {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Period {
        #[default]
        #[serde(alias = "bulanan")]
        Bulanan,
        #[serde(alias = "tahunan")]
        Tahunan,
        #[serde(alias = "semester")]
        Semester,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentTypeView {
        pub id: i32,
        pub nama: String,
        pub nominal: i64,
        pub periode: Period,
        pub aktif: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentTypeNew {
        #[serde(default)]
        pub nama: String,
        #[serde(default)]
        pub nominal: i64,
        pub periode: Option<Period>,
        pub aktif: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentTypeUpdate {
        pub nama: Option<String>,
        pub nominal: Option<i64>,
        pub periode: Option<Period>,
        pub aktif: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentTypeList {
        #[serde(default)]
        pub include_inactive: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentTypeUpdated {
        pub message: String,
        pub payment_type: PaymentTypeView,
    }
}

pub mod payment {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentStatus {
        #[default]
        Lunas,
        #[serde(alias = "belum lunas")]
        BelumLunas,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        pub id: i32,
        pub student_nisn: String,
        pub payment_type_id: i32,
        /// Name of the payment type.
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

    /// Body of `POST /payments`. One of `student_nisn`/`student_id` and one
    /// of `payment_type_id`/`jenis_pembayaran` are required.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub student_nisn: Option<String>,
        pub student_id: Option<i32>,
        pub payment_type_id: Option<i32>,
        pub jenis_pembayaran: Option<String>,
        pub nominal: Option<i64>,
        pub tanggal_pembayaran: Option<NaiveDate>,
        pub status: Option<PaymentStatus>,
        pub keterangan: Option<String>,
        pub catatan: Option<String>,
        pub petugas: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentUpdate {
        pub student_nisn: Option<String>,
        pub payment_type_id: Option<i32>,
        pub jenis_pembayaran: Option<String>,
        pub nominal: Option<i64>,
        pub tanggal_pembayaran: Option<NaiveDate>,
        pub status: Option<PaymentStatus>,
        pub keterangan: Option<String>,
        pub catatan: Option<String>,
        pub petugas: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentUpdated {
        pub message: String,
        pub payment: PaymentView,
    }

    /// Query of `GET /payments`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentList {
        pub student_nisn: Option<String>,
        pub student_id: Option<i32>,
    }

    /// Query of `GET /payments/by-month`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentsByMonth {
        #[serde(rename = "studentNisn", alias = "student_nisn")]
        pub student_nisn: Option<String>,
        pub month: u32,
        pub year: i32,
    }
}
