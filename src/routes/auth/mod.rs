mod handler;
mod model;

pub use handler::{login, sign_out, sign_up};
pub use model::{Account, ActiveSession, CREDENTIAL_PROVIDER, SessionRecord, User};
