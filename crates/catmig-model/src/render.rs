//! Display capability shared by records, identifiers and outcomes.

use crate::ids::Identifier;
use crate::source::SourceRecord;
use crate::target::TargetRecord;

/// A value with a one-line form for operators and report examples.
pub trait Renderable {
    fn to_display_string(&self) -> String;
}

impl Renderable for Identifier {
    fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl Renderable for TargetRecord {
    fn to_display_string(&self) -> String {
        self.to_json_line()
    }
}

impl Renderable for SourceRecord {
    fn to_display_string(&self) -> String {
        self.to_json().to_string()
    }
}
