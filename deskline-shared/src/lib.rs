pub mod clients;
pub mod errors;
pub mod session;
pub mod telemetry;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use session::{AuthErrorHandler, ForceLogout, SessionStore};
pub use types::*;
