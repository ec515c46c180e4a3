mod handler;
mod model;

pub use handler::{create_appointment, list_appointments};
pub use model::{Appointment, CreateAppointmentRequest, ensure_same_clinic};
