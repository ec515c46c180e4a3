mod handler;

pub use handler::{authentication, clinic_form, dashboard, index};
