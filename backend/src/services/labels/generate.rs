//! # Label Generation Handler
//!
//! Implements `POST /generate-label`. The handler reads the label template
//! from the configured path, patches the QR code field with the URL supplied
//! in the request, and writes the result out as a new `.dymo` file named
//! after the customer and job.
//!
//! Two behaviors are preserved on purpose from the workflow this service
//! replaces:
//!
//! - `qrCodeUrl` is trusted as sent by the client instead of being recomputed
//!   from `jobId`; the intake endpoint handed it out and the frontend passes
//!   it straight back.
//! - The output filename is derived only from the customer and job names, so
//!   two concurrent requests for the same pair race on the write and the last
//!   writer wins. No uniqueness suffix is applied.
//!
//! Failures respond with `500` and a short fixed message that tells the
//! operator which stage failed (template read, template shape, or file save)
//! without exposing the underlying cause, which goes to the log instead.

use std::error::Error as _;
use std::fs;
use std::path::PathBuf;

use actix_web::{web, HttpResponse, Responder};
use common::requests::GenerateLabelRequest;
use log::{error, info};
use regex::Regex;

use crate::config::AppConfig;
use crate::label::{self, codec, LabelError};

/// Extension of generated label files.
const LABEL_EXTENSION: &str = "dymo";

#[derive(Debug, thiserror::Error)]
enum GenerateError {
    #[error("Error reading the label template")]
    ReadTemplate(#[source] std::io::Error),
    #[error("Error creating label")]
    QrFieldNotFound,
    #[error("Error creating label")]
    MissingSlot(#[source] LabelError),
    #[error("Error generating the new label file")]
    MalformedTemplate(#[source] LabelError),
    #[error("Error generating the new label file")]
    Internal(String),
    #[error("Error saving the new label file")]
    SaveLabel(#[source] std::io::Error),
}

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    payload: web::Json<GenerateLabelRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    info!("Generating label for job {}", request.job_id);

    match generate_label(&config, &request) {
        Ok(path) => HttpResponse::Ok().json(serde_json::json!({ "newLabelFilePath": path })),
        Err(err) => {
            match err.source() {
                Some(cause) => error!("Error in /generate-label: {}: {}", err, cause),
                None => error!("Error in /generate-label: {}", err),
            }
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": err.to_string() }))
        }
    }
}

/// Runs the full flow: read, parse, locate, patch, serialize, write.
///
/// Returns the path of the written label file. Nothing is written unless
/// every earlier stage succeeded, and the template file itself is never
/// modified.
fn generate_label(
    config: &AppConfig,
    request: &GenerateLabelRequest,
) -> Result<String, GenerateError> {
    let text = fs::read_to_string(&config.template_path).map_err(GenerateError::ReadTemplate)?;
    let mut tree = codec::parse(&text).map_err(GenerateError::MalformedTemplate)?;

    let field = label::find_named_field(&mut tree, label::QR_FIELD_TAG)
        .ok_or(GenerateError::QrFieldNotFound)?;
    label::set_qr_slots(field, &request.qr_code_url).map_err(GenerateError::MissingSlot)?;

    let output = codec::serialize(&tree);
    let path = label_file_path(config, &request.customer, &request.job)?;
    fs::write(&path, output).map_err(GenerateError::SaveLabel)?;

    Ok(path.display().to_string())
}

/// Derives `<upload_dir>/{customer}-{job}.dymo`, collapsing every whitespace
/// run inside the names to a single hyphen.
fn label_file_path(
    config: &AppConfig,
    customer: &str,
    job: &str,
) -> Result<PathBuf, GenerateError> {
    let whitespace = Regex::new(r"\s+")
        .map_err(|e| GenerateError::Internal(format!("filename regex: {}", e)))?;
    let file_name = format!(
        "{}-{}.{}",
        whitespace.replace_all(customer, "-"),
        whitespace.replace_all(job, "-"),
        LABEL_EXTENSION
    );
    Ok(config.upload_dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordStoreConfig;
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DieCutLabel Version="8.0" Units="twips">
  <PaperOrientation>Landscape</PaperOrientation>
  <ObjectInfo>
    <QRCodeObject>
      <Name>QRCode</Name>
      <Data>
        <DataString>placeholder</DataString>
      </Data>
      <WebAddressDataHolder>
        <DataString>placeholder</DataString>
      </WebAddressDataHolder>
    </QRCodeObject>
  </ObjectInfo>
</DieCutLabel>
"#;

    const TEMPLATE_WITHOUT_QR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DieCutLabel Version="8.0" Units="twips">
  <PaperOrientation>Landscape</PaperOrientation>
</DieCutLabel>
"#;

    const QR_URL: &str =
        "https://api.qrserver.com/v1/create-qr-code/?size=100x100&data=https%3A%2F%2Fnotion.so%2Fabc123";

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig {
            port: 0,
            record_store: RecordStoreConfig {
                base_url: "https://record-store.invalid".to_string(),
                api_key: "unused".to_string(),
                database_id: "unused".to_string(),
            },
            template_path: dir.path().join("template.xml"),
            upload_dir: dir.path().to_path_buf(),
        }
    }

    fn request_body(customer: &str, job: &str) -> serde_json::Value {
        serde_json::json!({
            "jobId": "page-1",
            "qrCodeUrl": QR_URL,
            "customer": customer,
            "job": job,
        })
    }

    async fn post_label(
        config: AppConfig,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .service(crate::services::labels::configure_routes()),
        )
        .await;
        let req = actix_test::TestRequest::post()
            .uri("/generate-label")
            .set_json(&body)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        let status = resp.status();
        let json = actix_test::read_body_json(resp).await;
        (status, json)
    }

    #[test]
    fn filename_collapses_whitespace_runs_to_hyphens() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let path = label_file_path(&config, "Acme Co", "Tile  Run\t2").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "Acme-Co-Tile-Run-2.dymo"
        );
    }

    #[actix_web::test]
    async fn writes_a_patched_label_and_returns_its_path() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.template_path, TEMPLATE).unwrap();

        let (status, body) = post_label(config.clone(), request_body("Acme Co", "Tile Run 2")).await;
        assert_eq!(status, StatusCode::OK);

        let expected_path = dir.path().join("Acme-Co-Tile-Run-2.dymo");
        assert_eq!(body["newLabelFilePath"], expected_path.display().to_string());

        let written = fs::read_to_string(&expected_path).unwrap();
        let mut tree = codec::parse(&written).unwrap();
        let field = label::find_named_field(&mut tree, label::QR_FIELD_TAG).unwrap();
        for slot in [label::DATA_SLOT, label::WEB_ADDRESS_SLOT] {
            let value = field.child_group(slot).unwrap()[0]
                .child_group("DataString")
                .unwrap()[0]
                .leaf()
                .unwrap();
            assert_eq!(value, QR_URL);
        }
    }

    #[actix_web::test]
    async fn template_without_qr_field_fails_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.template_path, TEMPLATE_WITHOUT_QR).unwrap();

        let (status, body) = post_label(config.clone(), request_body("Acme Co", "Tile Run 2")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error creating label");
        assert!(!dir.path().join("Acme-Co-Tile-Run-2.dymo").exists());
    }

    #[actix_web::test]
    async fn missing_template_file_reports_the_read_stage() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir); // template.xml never written

        let (status, body) = post_label(config, request_body("Acme Co", "Tile Run 2")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error reading the label template");
    }

    #[actix_web::test]
    async fn malformed_template_reports_the_generic_stage() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.template_path, "<DieCutLabel><Oops></DieCutLabel>").unwrap();

        let (status, body) = post_label(config, request_body("Acme Co", "Tile Run 2")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error generating the new label file");
    }

    #[actix_web::test]
    async fn same_names_overwrite_the_previous_label() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.template_path, TEMPLATE).unwrap();

        let (first, _) = post_label(config.clone(), request_body("Acme Co", "Tile Run 2")).await;
        assert_eq!(first, StatusCode::OK);

        let mut second_body = request_body("Acme Co", "Tile Run 2");
        second_body["qrCodeUrl"] = serde_json::Value::String("https://example.com/other".into());
        let (second, _) = post_label(config, second_body).await;
        assert_eq!(second, StatusCode::OK);

        let written = fs::read_to_string(dir.path().join("Acme-Co-Tile-Run-2.dymo")).unwrap();
        assert!(written.contains("https://example.com/other"));
    }
}
