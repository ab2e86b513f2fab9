//! Comparison reports
//!
//! Field names serialize in camelCase so a report can be attached to an API
//! response as-is.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use super::classify::{classify, ChangeKind, Compatibility};

/// Old and new `type` of a field whose type diverged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDetail {
    pub old_type: Option<String>,
    pub new_type: Option<String>,
}

/// One detected change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Dotted field path from the document root (e.g., `address.city`)
    pub path: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ChangeDetail>,
}

impl ChangeRecord {
    pub fn new(kind: ChangeKind, path: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            description: description.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, old_type: Option<&str>, new_type: Option<&str>) -> Self {
        self.detail = Some(ChangeDetail {
            old_type: old_type.map(String::from),
            new_type: new_type.map(String::from),
        });
        self
    }

    pub fn is_breaking(&self) -> bool {
        self.kind.is_breaking()
    }
}

/// Change counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub breaking_changes_count: usize,
    pub non_breaking_changes_count: usize,
    pub has_breaking_changes: bool,
}

/// Result of comparing two versions of one schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub breaking: Vec<ChangeRecord>,
    pub non_breaking: Vec<ChangeRecord>,
    pub has_breaking_changes: bool,
    pub summary: ComparisonSummary,
}

impl ComparisonReport {
    /// File a record under `breaking` or `non_breaking` per the classification table
    pub(crate) fn push(&mut self, record: ChangeRecord) {
        match classify(record.kind) {
            Compatibility::Breaking => {
                self.breaking.push(record);
                self.has_breaking_changes = true;
            }
            Compatibility::NonBreaking => self.non_breaking.push(record),
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.summary = ComparisonSummary {
            breaking_changes_count: self.breaking.len(),
            non_breaking_changes_count: self.non_breaking.len(),
            has_breaking_changes: self.has_breaking_changes,
        };
        self
    }

    pub fn is_empty(&self) -> bool {
        self.breaking.is_empty() && self.non_breaking.is_empty()
    }

    /// All records, breaking first
    pub fn changes(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.breaking.iter().chain(self.non_breaking.iter())
    }

    /// Records of one kind
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.changes().filter(move |change| change.kind == kind)
    }

    /// Short multi-line summary for display
    pub fn to_human_readable(&self) -> String {
        let mut summary = String::new();

        if self.has_breaking_changes {
            summary.push_str(&format!(
                "⚠️ Contains {} breaking changes:",
                self.breaking.len()
            ));
            for change in &self.breaking {
                summary.push_str(&format!("\n- {} at {}", change.description, change.path));
            }
        } else {
            summary.push_str("✅ No breaking changes detected.");
        }

        summary.push_str(&format!(
            "\n{} non-breaking changes found.",
            self.non_breaking.len()
        ));
        summary
    }
}

/// Line diff of two schema contents, pretty-printed, with `-`/`+` markers
pub fn content_diff(old: &serde_json::Value, new: &serde_json::Value) -> String {
    let old_text = serde_json::to_string_pretty(old).unwrap_or_default();
    let new_text = serde_json::to_string_pretty(new).unwrap_or_default();

    let diff = TextDiff::from_lines(&old_text, &new_text);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let marker = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => ' ',
        };
        out.push(marker);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_and_finish() {
        let mut report = ComparisonReport::default();
        report.push(ChangeRecord::new(ChangeKind::FieldAdded, "phone", "Field 'phone' was added"));
        assert!(!report.has_breaking_changes);

        report.push(ChangeRecord::new(ChangeKind::FieldRemoved, "email", "Field 'email' was removed"));
        let report = report.finish();

        assert!(report.has_breaking_changes);
        assert_eq!(report.summary.breaking_changes_count, 1);
        assert_eq!(report.summary.non_breaking_changes_count, 1);
        assert!(report.summary.has_breaking_changes);
    }

    #[test]
    fn test_wire_format() {
        let mut report = ComparisonReport::default();
        report.push(
            ChangeRecord::new(ChangeKind::TypeChanged, "age", "Type changed from 'string' to 'number'")
                .with_detail(Some("string"), Some("number")),
        );
        let value = serde_json::to_value(report.finish()).unwrap();

        assert_eq!(value["hasBreakingChanges"], json!(true));
        assert_eq!(value["nonBreaking"], json!([]));
        assert_eq!(value["breaking"][0]["type"], json!("TYPE_CHANGED"));
        assert_eq!(value["breaking"][0]["detail"]["oldType"], json!("string"));
        assert_eq!(value["summary"]["breakingChangesCount"], json!(1));
    }

    #[test]
    fn test_human_readable() {
        let mut report = ComparisonReport::default();
        report.push(ChangeRecord::new(ChangeKind::FieldRemoved, "email", "Field 'email' was removed"));
        let text = report.finish().to_human_readable();
        assert!(text.contains("Contains 1 breaking changes"));
        assert!(text.contains("- Field 'email' was removed at email"));
        assert!(text.ends_with("0 non-breaking changes found."));

        let clean = ComparisonReport::default().finish().to_human_readable();
        assert!(clean.starts_with("✅ No breaking changes detected."));
    }

    #[test]
    fn test_content_diff_marks_lines() {
        let diff = content_diff(
            &json!({ "type": "string" }),
            &json!({ "type": "number" }),
        );
        assert!(diff.contains("-  \"type\": \"string\""));
        assert!(diff.contains("+  \"type\": \"number\""));
    }
}
