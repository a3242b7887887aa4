//! Persisted report document.
//!
//! ```json
//! {
//!   "__retroMeta": { "uhid": "...", "startFrame": 10, ... },
//!   "__meta": { "lastActive": { "loc": "Stomach", "disease": "Ulcer" } },
//!   "report": { "Stomach": { "diseases": { ... } } },
//!   "overallRemarks": ""
//! }
//! ```
//!
//! Older files have no `report` key; the report then sits at the top level
//! next to the metadata keys. Metadata blocks are kept as raw JSON objects so
//! fields this crate does not know about survive a load/save cycle.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::report::{ActivePointer, Report};

const RETRO_META_KEY: &str = "__retroMeta";
const PROSP_META_KEY: &str = "__prospMeta";
const META_KEY: &str = "__meta";
const REPORT_KEY: &str = "report";
const REMARKS_KEY: &str = "overallRemarks";

/// A metadata block: a JSON object with typed accessors for known fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaBlock(pub Map<String, Value>);

impl MetaBlock {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String field; null and non-strings read as `None`.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Integer field. Numeric strings are accepted.
    pub fn int_field(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean field.
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Sets a field, writing `null` for `None`.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.to_string(), value.into());
        self
    }
}

/// Retrospective-study metadata (`__retroMeta`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetroMeta(pub MetaBlock);

impl RetroMeta {
    pub fn uhid(&self) -> Option<&str> {
        self.0.str_field("uhid")
    }

    pub fn video(&self) -> Option<&str> {
        self.0.str_field("video")
    }

    pub fn start_frame(&self) -> Option<i64> {
        self.0.int_field("startFrame")
    }

    pub fn end_frame(&self) -> Option<i64> {
        self.0.int_field("endFrame")
    }

    pub fn segmentation_frame(&self) -> Option<i64> {
        self.0.int_field("segmentationFrame")
    }

    /// Whether patient-identifying data was shown when the file was saved.
    pub fn pii(&self) -> Option<bool> {
        self.0.bool_field("pii")
    }

    pub fn csv_file(&self) -> Option<&str> {
        self.0.str_field("csvFile")
    }

    /// ISO-8601 save time.
    pub fn saved_at(&self) -> Option<&str> {
        self.0.str_field("savedAt")
    }
}

/// Prospective-study metadata (`__prospMeta`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProspectiveMeta(pub MetaBlock);

impl ProspectiveMeta {
    pub fn uhid(&self) -> Option<&str> {
        self.0.str_field("uhid")
    }

    pub fn patient_name(&self) -> Option<&str> {
        self.0.str_field("patientName")
    }

    pub fn gender(&self) -> Option<&str> {
        self.0.str_field("gender")
    }

    /// Age as entered; may be a number or free text.
    pub fn age(&self) -> Option<String> {
        match self.0.get("age")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn indication(&self) -> Option<&str> {
        self.0.str_field("indication")
    }

    pub fn csv_file(&self) -> Option<&str> {
        self.0.str_field("csvFile")
    }
}

/// Session bookkeeping (`__meta`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    #[serde(default)]
    pub last_active: Option<ActivePointer>,
}

/// A report file: report state plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(rename = "__retroMeta", default, skip_serializing_if = "Option::is_none")]
    pub retro_meta: Option<RetroMeta>,
    #[serde(rename = "__prospMeta", default, skip_serializing_if = "Option::is_none")]
    pub prosp_meta: Option<ProspectiveMeta>,
    #[serde(rename = "__meta", default)]
    pub meta: Option<SessionMeta>,
    #[serde(default)]
    pub report: Report,
    #[serde(rename = "overallRemarks", default)]
    pub overall_remarks: String,
}

impl ReportDocument {
    /// Creates a document around `report`.
    pub fn new(report: Report) -> Self {
        Self {
            report,
            ..Self::default()
        }
    }

    /// Parses a document, accepting both the current and the legacy layout.
    ///
    /// Legacy single `sublocation` strings are folded into `sublocations`.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut root) = value else {
            return Err(ModelError::InvalidDocument {
                reason: "top-level value is not an object".to_string(),
            });
        };

        let retro_meta = take_block(&mut root, RETRO_META_KEY)?.map(|b| RetroMeta(MetaBlock(b)));
        let prosp_meta =
            take_block(&mut root, PROSP_META_KEY)?.map(|b| ProspectiveMeta(MetaBlock(b)));
        let meta = match root.remove(META_KEY) {
            None | Some(Value::Null) => None,
            Some(v) => Some(serde_json::from_value::<SessionMeta>(v)?),
        };
        let overall_remarks = match root.remove(REMARKS_KEY) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };

        let report_value = match root.remove(REPORT_KEY) {
            Some(v) if is_present(&v) => v,
            _ => {
                tracing::debug!("report document has no `report` key, reading legacy layout");
                Value::Object(root)
            }
        };
        let mut report: Report = serde_json::from_value(report_value)?;
        normalize_report(&mut report);

        Ok(Self {
            retro_meta,
            prosp_meta,
            meta,
            report,
            overall_remarks,
        })
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Last-active pointer recorded in `__meta`.
    pub fn last_active(&self) -> Option<&ActivePointer> {
        self.meta.as_ref()?.last_active.as_ref()
    }

    /// UHID from whichever metadata block is present.
    pub fn uhid(&self) -> Option<&str> {
        self.retro_meta
            .as_ref()
            .and_then(RetroMeta::uhid)
            .or_else(|| self.prosp_meta.as_ref().and_then(ProspectiveMeta::uhid))
            .filter(|u| !u.is_empty())
    }

    /// File-name stem for this document saved at `now`.
    pub fn file_stem(&self, now: NaiveDateTime) -> String {
        file_stem(self.uhid(), now)
    }
}

/// Saved-report file-name stem: `<uhid>_<YYYYMMDD_HHMM>` or
/// `report_<YYYYMMDD_HHMM>`.
pub fn file_stem(uhid: Option<&str>, now: NaiveDateTime) -> String {
    let ts = now.format("%Y%m%d_%H%M");
    match uhid.filter(|u| !u.is_empty()) {
        Some(uhid) => format!("{uhid}_{ts}"),
        None => format!("report_{ts}"),
    }
}

/// Folds legacy sub-locations on every disease entry.
pub fn normalize_report(report: &mut Report) {
    for location in report.locations.values_mut() {
        for entry in location.diseases.values_mut() {
            entry.normalize_sublocations();
        }
    }
}

fn is_present(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

fn take_block(root: &mut Map<String, Value>, key: &str) -> Result<Option<Map<String, Value>>> {
    match root.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ModelError::InvalidDocument {
            reason: format!("`{key}` is not an object"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Some("UH123"), at(9, 5)), "UH123_20240307_0905");
        assert_eq!(file_stem(Some(""), at(14, 30)), "report_20240307_1430");
        assert_eq!(file_stem(None, at(0, 0)), "report_20240307_0000");
    }

    #[test]
    fn test_reads_current_layout() {
        let doc = ReportDocument::from_json_str(
            r#"{
                "__retroMeta": {"uhid": "U1", "startFrame": 10, "endFrame": "34", "pii": false, "custom": [1, 2]},
                "__meta": {"lastActive": {"loc": "Stomach", "disease": "Ulcer"}},
                "report": {"Stomach": {"diseases": {"Ulcer": {"sections": {}, "sublocation": "Antrum"}}}},
                "overallRemarks": "Normal study otherwise"
            }"#,
        )
        .unwrap();

        let retro = doc.retro_meta.as_ref().unwrap();
        assert_eq!(retro.uhid(), Some("U1"));
        assert_eq!(retro.start_frame(), Some(10));
        assert_eq!(retro.end_frame(), Some(34));
        assert_eq!(retro.pii(), Some(false));
        assert_eq!(doc.last_active(), Some(&ActivePointer::new("Stomach", "Ulcer")));
        assert_eq!(doc.overall_remarks, "Normal study otherwise");
        let entry = doc.report.disease("Stomach", "Ulcer").unwrap();
        assert_eq!(entry.sublocations, vec!["Antrum"]);
    }

    #[test]
    fn test_reads_legacy_layout() {
        let doc = ReportDocument::from_json_str(
            r#"{
                "__meta": null,
                "Esophagus": {"diseases": {"Varices": {"sections": {"Grade": {"attrs": {"II": true}}}}}},
                "overallRemarks": "x"
            }"#,
        )
        .unwrap();
        assert!(doc.meta.is_none());
        assert_eq!(doc.overall_remarks, "x");
        let entry = doc.report.disease("Esophagus", "Varices").unwrap();
        assert!(entry.sections["Grade"].attrs.contains("II"));
    }

    #[test]
    fn test_unknown_metadata_round_trips() {
        let text = r#"{"__prospMeta":{"uhid":"P9","patientName":"A B","age":41,"ward":"3B"},"__meta":null,"report":{},"overallRemarks":""}"#;
        let doc = ReportDocument::from_json_str(text).unwrap();
        let prosp = doc.prosp_meta.as_ref().unwrap();
        assert_eq!(prosp.age().as_deref(), Some("41"));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["__prospMeta"]["ward"], "3B");
        assert_eq!(doc.uhid(), Some("P9"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            ReportDocument::from_json_str("[1, 2]"),
            Err(ModelError::InvalidDocument { .. })
        ));
        assert!(matches!(
            ReportDocument::from_json_str("{not json"),
            Err(ModelError::Json(_))
        ));
    }
}
