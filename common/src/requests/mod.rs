use serde::{Deserialize, Serialize};

/// Request payload for the label generation endpoint.
///
/// `qr_code_url` is taken as sent by the client rather than recomputed from
/// `job_id`; the intake endpoint returns it and the frontend passes it back
/// verbatim. `job_id` identifies the record the label belongs to and is kept
/// for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateLabelRequest {
    #[serde(rename = "jobId")]
    pub job_id: String,
    #[serde(rename = "qrCodeUrl")]
    pub qr_code_url: String,
    pub customer: String,
    pub job: String,
}
