//! QR payload derivation.
//!
//! The QR image is never generated or stored locally; the label and the
//! record store both carry a URL to a third-party QR image service with the
//! record's shareable link percent-encoded into the query string. The value
//! is deterministic, so it can be recomputed from the link at any time.

const QR_SERVICE_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Builds the QR image URL encoding `page_url`.
pub fn qr_code_url(page_url: &str) -> String {
    format!(
        "{}?size=100x100&data={}",
        QR_SERVICE_ENDPOINT,
        urlencoding::encode(page_url)
    )
}
