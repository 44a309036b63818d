pub mod cascade;
pub use cascade::{CascadeError, CascadeService, LikeState};

pub mod password_reset;
pub use password_reset::{PasswordResetService, ResetError, ResetRequested};
