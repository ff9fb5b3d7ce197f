use serde::{Deserialize, Serialize};

/// A job record as captured by the intake form and sent to the record store.
///
/// All fields are plain text and all are optional on the wire: an absent form
/// field deserializes to an empty string rather than being rejected. Required-
/// field enforcement is left to the form itself, matching the service's
/// current behavior.
///
/// `color` is never supplied by the intake form; it exists on the record from
/// the start (always empty) so the record store column can be filled in later
/// by hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub job: String,
    #[serde(default, rename = "colorName")]
    pub color_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub finish: String,
    #[serde(default)]
    pub texture: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub color: String,
}
