mod handler;
mod model;

pub use handler::{create_patient, list_patients};
pub use model::{CreatePatientRequest, Patient, PatientSex};
