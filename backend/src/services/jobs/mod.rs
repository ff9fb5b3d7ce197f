//! # Job Intake Service Module
//!
//! Routes the job-intake endpoint to its handler. Intake is the first half of
//! the workflow: the form on the landing page posts here, a record is created
//! in the external record store, and the caller gets back the QR image URL
//! that the label flow will later stamp into the template.

mod create;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/create-job";

/// Configures and returns the Actix `Scope` for the intake route.
///
/// # Registered Routes:
///
/// *   **`POST /create-job`**:
///     - **Handler**: `create::process`
///     - **Description**: Accepts the urlencoded intake form (`customer`,
///       `job`, `colorName`, `address`, `date`, `finish`, `texture`,
///       `formula`), creates the job record in the record store, attaches a
///       QR image URL pointing at the record's shareable link, and responds
///       with that URL as `{"qrCodeUrl": ...}`.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(create::process))
}
