//! Domain types: students, subject sources, marks, summaries and change events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RollcallError};

/// One row from a record-store table, column name → JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Name of the dated column for `date` (`DD_MM_YYYY`).
pub fn date_column(date: NaiveDate) -> String {
    date.format("%d_%m_%Y").to_string()
}

/// A column counts as dated when its key holds exactly two underscores.
/// Identity columns such as `Roll_No` have one and are never counted.
pub fn is_date_column(key: &str) -> bool {
    key.matches('_').count() == 2
}

/// Render a cell as text. Roll numbers may be stored as text or numbers.
pub fn value_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A recognized presence mark. Anything else in a dated column is unmarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
}

impl Mark {
    /// Parse a column value; `None` for null, empty, or unrecognized values.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value.as_str() {
            Some("P") => Some(Self::Present),
            Some("A") => Some(Self::Absent),
            _ => None,
        }
    }

    /// Read the mark held by `column` in `row`, if any.
    pub fn in_row(row: &Row, column: &str) -> Option<Self> {
        row.get(column).and_then(Self::from_value)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "P",
            Self::Absent => "A",
        }
    }
}

/// Which bucket a subject source's counts land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Theory,
    Lab,
}

/// One per-subject attendance table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSource {
    /// Table key, lowercase and underscore-separated.
    pub key: String,
    pub kind: SubjectKind,
}

impl SubjectSource {
    /// Build a source from its table key; keys ending in `_lab` are lab sources.
    pub fn new(key: &str) -> Self {
        let kind = if key.ends_with("_lab") {
            SubjectKind::Lab
        } else {
            SubjectKind::Theory
        };
        Self {
            key: key.to_string(),
            kind,
        }
    }

    /// Human label: underscores become spaces and each word is title-cased.
    pub fn display_name(&self) -> String {
        display_name(&self.key)
    }
}

/// `data_structures_and_algorithms_lab` → `Data Structures And Algorithms Lab`.
///
/// A letter starts a word when the character before it is not a letter, so
/// `lab_2a` becomes `Lab 2A` and a doubled underscore keeps both spaces.
pub fn display_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut in_word = false;
    for c in key.chars() {
        if c == '_' {
            out.push(' ');
            in_word = false;
        } else if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// A registered student, read-only to this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub roll_no: String,
    pub name: String,
    /// Messaging-gateway address (WhatsApp number).
    pub address: Option<String>,
}

impl Student {
    /// The address, if present and non-blank.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }
}

/// A subject that carried a mark on the current calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayMark {
    pub subject: String,
    pub mark: Mark,
}

/// Attendance for one student at one point in time. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub roll_no: String,
    pub name: String,
    pub address: Option<String>,
    pub theory_present: u32,
    pub theory_total: u32,
    pub lab_present: u32,
    pub lab_total: u32,
    pub todays_marks: Vec<TodayMark>,
}

impl AttendanceSummary {
    /// Empty summary for `student`.
    pub fn for_student(student: &Student) -> Self {
        Self {
            roll_no: student.roll_no.clone(),
            name: student.name.clone(),
            address: student.address.clone(),
            ..Self::default()
        }
    }

    /// Count one recognized mark into the bucket for `kind`.
    pub fn record(&mut self, kind: SubjectKind, mark: Mark) {
        let (present, total) = match kind {
            SubjectKind::Theory => (&mut self.theory_present, &mut self.theory_total),
            SubjectKind::Lab => (&mut self.lab_present, &mut self.lab_total),
        };
        *total += 1;
        if mark == Mark::Present {
            *present += 1;
        }
    }

    /// Theory attendance percentage; 0 when nothing is recorded.
    pub fn theory_percentage(&self) -> f64 {
        percentage(self.theory_present, self.theory_total)
    }

    /// Whether any source contributed a recognized mark.
    pub fn has_data(&self) -> bool {
        self.theory_total > 0 || self.lab_total > 0
    }
}

/// `present / total * 100`, or 0 for an empty total.
pub fn percentage(present: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(present) / f64::from(total) * 100.0
    }
}

/// A row change notification from the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert {
        table: String,
        record: Row,
    },
    Update {
        table: String,
        record: Row,
        old_record: Row,
    },
    Delete {
        table: String,
        old_record: Row,
    },
    /// Any event type this system does not react to.
    #[serde(other)]
    Other,
}

impl ChangeEvent {
    /// Decode an inbound webhook body.
    pub fn from_json(body: serde_json::Value) -> Result<Self> {
        serde_json::from_value(body).map_err(|e| RollcallError::MalformedEvent(e.to_string()))
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Insert { table, .. } | Self::Update { table, .. } | Self::Delete { table, .. } => {
                Some(table)
            }
            Self::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_date_column_format() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(date_column(date), "05_01_2025");
        assert!(is_date_column("05_01_2025"));
        assert!(!is_date_column("Roll_No"));
        assert!(!is_date_column("Name"));
    }

    #[test]
    fn test_mark_parsing_ignores_unrecognized() {
        assert_eq!(Mark::from_value(&json!("P")), Some(Mark::Present));
        assert_eq!(Mark::from_value(&json!("A")), Some(Mark::Absent));
        assert_eq!(Mark::from_value(&json!("")), None);
        assert_eq!(Mark::from_value(&json!(null)), None);
        assert_eq!(Mark::from_value(&json!("L")), None);
        assert_eq!(Mark::from_value(&json!(1)), None);
    }

    #[test]
    fn test_subject_kind_by_suffix() {
        assert_eq!(SubjectSource::new("digital_electronics").kind, SubjectKind::Theory);
        assert_eq!(SubjectSource::new("digital_electronics_lab").kind, SubjectKind::Lab);
        assert_eq!(SubjectSource::new("laboratory_safety").kind, SubjectKind::Theory);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name("advance_engineering_mathematics_i"),
            "Advance Engineering Mathematics I"
        );
        assert_eq!(
            SubjectSource::new("object_oriented_programming_lab").display_name(),
            "Object Oriented Programming Lab"
        );
        assert_eq!(display_name("physics_lab_2a"), "Physics Lab 2A");
        assert_eq!(display_name("a__b"), "A  B");
        assert_eq!(display_name("DBMS"), "Dbms");
    }

    #[test]
    fn test_student_blank_address() {
        let mut s = Student {
            roll_no: "1".into(),
            name: "Asha".into(),
            address: Some("  ".into()),
        };
        assert!(s.address().is_none());
        s.address = Some("+919800000000".into());
        assert_eq!(s.address(), Some("+919800000000"));
    }

    #[test]
    fn test_summary_record_buckets() {
        let mut summary = AttendanceSummary::default();
        summary.record(SubjectKind::Theory, Mark::Present);
        summary.record(SubjectKind::Theory, Mark::Absent);
        summary.record(SubjectKind::Lab, Mark::Present);
        assert_eq!((summary.theory_present, summary.theory_total), (1, 2));
        assert_eq!((summary.lab_present, summary.lab_total), (1, 1));
        assert!((summary.theory_percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_change_event_decoding() {
        let insert = ChangeEvent::from_json(json!({
            "type": "INSERT",
            "table": "studentsrecord",
            "schema": "public",
            "record": {"Roll_No": "22CS001"},
            "old_record": null
        }))
        .unwrap();
        assert!(matches!(insert, ChangeEvent::Insert { ref table, .. } if table == "studentsrecord"));

        let update = ChangeEvent::from_json(json!({
            "type": "UPDATE",
            "table": "digital_electronics",
            "record": {"Roll_No": "22CS001", "25_01_2025": "A"},
            "old_record": {"Roll_No": "22CS001", "25_01_2025": "P"}
        }))
        .unwrap();
        assert_eq!(update.table(), Some("digital_electronics"));

        let other = ChangeEvent::from_json(json!({"type": "TRUNCATE", "table": "x"})).unwrap();
        assert_eq!(other, ChangeEvent::Other);
    }

    #[test]
    fn test_change_event_missing_fields_is_malformed() {
        let err = ChangeEvent::from_json(json!({"type": "UPDATE", "table": "x", "record": {}}))
            .unwrap_err();
        assert!(matches!(err, RollcallError::MalformedEvent(_)));
    }
}
