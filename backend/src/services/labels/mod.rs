//! # Label Generation Service Module
//!
//! Routes the label endpoint to its handler. This is the second half of the
//! workflow: once a job record exists and its QR image URL is known, the
//! frontend posts both back here and a printable label file is produced from
//! the on-disk template.

mod generate;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/generate-label";

/// Configures and returns the Actix `Scope` for the label route.
///
/// # Registered Routes:
///
/// *   **`POST /generate-label`**:
///     - **Handler**: `generate::process`
///     - **Description**: Accepts `{jobId, qrCodeUrl, customer, job}` as
///       JSON, patches the QR code field of the label template with
///       `qrCodeUrl`, writes the result as `{customer}-{job}.dymo` under the
///       upload directory and responds with `{"newLabelFilePath": ...}`.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(generate::process))
}
