mod handler;
mod model;

pub use handler::{create_clinic, current_clinic, delete_clinic, list_clinics};
pub use model::{Clinic, CreateClinicRequest, Membership};
