//! What differs between object types outside the rule tables.

use serde_json::{Value, json};

use catmig_model::{FieldPath, ObjectType, SourceRecord};

use crate::error::RecordError;

/// Legacy-id columns and post-mapping defaults of one object type.
#[derive(Debug, Clone)]
pub struct ObjectProfile {
    object_type: ObjectType,
    legacy_id_columns: Vec<String>,
    defaults: Vec<(FieldPath, Value)>,
}

impl ObjectProfile {
    pub fn for_type(object_type: ObjectType) -> Self {
        let (columns, defaults): (&[&str], Vec<(&str, Value)>) = match object_type {
            ObjectType::Instance => (
                &["legacy_id", "bib_id", "001", "id"],
                vec![("source", json!("MARC"))],
            ),
            ObjectType::Holdings => (&["legacy_id", "holdings_id", "mfhd_id", "id"], vec![]),
            ObjectType::Item => (&["legacy_id", "item_id", "barcode", "id"], vec![]),
            ObjectType::User => (
                &["legacy_id", "user_id", "patron_id", "barcode", "id"],
                vec![("active", json!(true))],
            ),
            ObjectType::Course => (&["legacy_id", "course_id", "id"], vec![]),
            ObjectType::Request => (&["legacy_id", "request_id", "hold_id", "id"], vec![]),
            ObjectType::Reserve => (&["legacy_id", "reserve_id", "id"], vec![]),
            ObjectType::Organization => (
                &["legacy_id", "vendor_id", "organization_id", "code", "id"],
                vec![("status", json!("Active"))],
            ),
            ObjectType::Loan => (
                &["legacy_id", "loan_id", "id"],
                vec![("action", json!("checkedout"))],
            ),
        };
        let defaults = defaults
            .into_iter()
            .filter_map(|(path, value)| FieldPath::parse(path).ok().map(|path| (path, value)))
            .collect();
        Self {
            object_type,
            legacy_id_columns: columns.iter().map(|column| (*column).to_string()).collect(),
            defaults,
        }
    }

    /// Prefer `column` over the built-in candidates.
    pub fn with_legacy_id_column(mut self, column: &str) -> Self {
        let column = catmig_model::normalize_key(column);
        self.legacy_id_columns.retain(|existing| *existing != column);
        self.legacy_id_columns.insert(0, column);
        self
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn legacy_id_columns(&self) -> &[String] {
        &self.legacy_id_columns
    }

    pub fn defaults(&self) -> &[(FieldPath, Value)] {
        &self.defaults
    }

    /// First non-blank legacy-id column, trimmed.
    pub fn legacy_id(&self, record: &SourceRecord) -> Result<String, RecordError> {
        self.legacy_id_columns
            .iter()
            .filter_map(|column| record.text(column))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| RecordError::MissingLegacyId {
                columns: self.legacy_id_columns.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_present_column_wins() {
        let profile = ObjectProfile::for_type(ObjectType::Item);
        let record = SourceRecord::from_row([("Barcode", "39001"), ("ITEM_ID", "  ")]);
        assert_eq!(profile.legacy_id(&record).unwrap(), "39001");

        let record = SourceRecord::from_row([("barcode", "39001"), ("item_id", " I-7 ")]);
        assert_eq!(profile.legacy_id(&record).unwrap(), "I-7");
    }

    #[test]
    fn missing_legacy_id_lists_the_columns_tried() {
        let profile = ObjectProfile::for_type(ObjectType::Course);
        let err = profile
            .legacy_id(&SourceRecord::from_row([("title", "Biology")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no legacy id in any of: legacy_id, course_id, id"
        );
    }

    #[test]
    fn configured_column_takes_precedence() {
        let profile = ObjectProfile::for_type(ObjectType::User).with_legacy_id_column("Patron ID");
        assert_eq!(profile.legacy_id_columns()[0], "patron id");
        assert_eq!(profile.legacy_id_columns().len(), 6);
    }
}
