//! # Job Intake Handler
//!
//! Implements `POST /create-job`. The flow runs strictly in order:
//!
//! 1.  **Form intake**: the urlencoded form body deserializes into a
//!     `JobRecord`. Absent fields become empty strings; nothing is rejected
//!     server-side (the form itself marks required fields, and that gap is
//!     deliberate, long-standing behavior).
//! 2.  **Record creation**: the record is created in the record store, which
//!     returns the new record's identifier and shareable URL.
//! 3.  **QR payload**: the shareable URL is percent-encoded into the QR image
//!     service URL.
//! 4.  **Patch-back**: the QR image URL is attached to the record so the
//!     store shows the code alongside the job.
//! 5.  **Response**: `200 {"qrCodeUrl": ...}`.
//!
//! Any failure along the way is logged with its cause and collapses to a
//! generic `500 {"error": "Internal server error"}` — no detail leaks to the
//! caller. A record created before a later step fails stays in the store
//! unpatched; there is no rollback and no retry.

use actix_web::{web, HttpResponse, Responder};
use common::model::job::JobRecord;
use log::error;

use crate::qr;
use crate::record_store::{RecordStore, RecordStoreError};

pub(crate) async fn process(
    store: web::Data<dyn RecordStore>,
    form: web::Form<JobRecord>,
) -> impl Responder {
    match create_job(store.get_ref(), form.into_inner()).await {
        Ok(qr_code_url) => {
            HttpResponse::Ok().json(serde_json::json!({ "qrCodeUrl": qr_code_url }))
        }
        Err(err) => {
            error!("Error in /create-job: {}", err);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

/// Creates the record, derives the QR payload and patches it back.
///
/// Returns the QR image URL on success. The first failing step is terminal.
async fn create_job(store: &dyn RecordStore, job: JobRecord) -> Result<String, RecordStoreError> {
    let created = store.create_job(&job).await?;
    let qr_code_url = qr::qr_code_url(&created.url);
    store.attach_qr_code(&created.id, &qr_code_url).await?;
    Ok(qr_code_url)
}
