mod handler;
mod model;

pub use handler::{create_doctor, list_doctors};
pub use model::{Availability, CreateDoctorRequest, Doctor};
