//! Domain layer of the school fee-payment backend.
//!
//! [`Engine`] owns the database connection and exposes every operation the
//! HTTP layer needs. Each operation takes the calling [`Actor`] and performs
//! its own authorization check.

pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use password::{DEFAULT_COST, MIN_COST};
pub use payment_types::{NewPaymentType, PaymentType, PaymentTypePatch, Period};
pub use payments::{
    NewPayment, Payment, PaymentFilter, PaymentPatch, PaymentStatus, PaymentTypeRef, StudentRef,
};
pub use roles::{Action, Actor, Permission, PermissionSet, Resource, Role};
pub use sessions::{IssuedSession, MAX_TTL_MINUTES, MIN_TTL_MINUTES, SessionInfo, SessionPolicy};
pub use students::{Gender, NewStudent, Student, StudentKey, StudentPatch};
pub use users::{NewUser, ProfileUpdate, User, UserPatch};

mod error;
mod ops;
mod password;
mod payment_types;
mod payments;
mod roles;
mod sessions;
mod students;
mod user_permissions;
mod user_sessions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
