//! Ordered rule sets, one per object type.

use std::collections::{BTreeMap, BTreeSet};

use catmig_model::{Condition, LookupRef, MappingRule, ObjectType, ValueExpr};

use crate::error::RuleSetError;

/// The rules for one object type, checked once when the run starts.
///
/// Rules are applied in order. When several rules write the same path,
/// the last one that produces a value wins; `array` and `list` rules
/// append instead.
#[derive(Debug, Clone)]
pub struct RuleSet {
    object_type: ObjectType,
    rules: Vec<MappingRule>,
}

impl RuleSet {
    pub fn new(object_type: ObjectType, rules: Vec<MappingRule>) -> Result<Self, RuleSetError> {
        if rules.is_empty() {
            return Err(RuleSetError::Empty { object_type });
        }
        for rule in &rules {
            if rule.target.root() == "id" {
                return Err(RuleSetError::GeneratedField {
                    rule: rule.describe(),
                });
            }
            if rule.sources.is_empty() && rule.default.is_none() && !writes_literal(rule) {
                return Err(RuleSetError::NothingToWrite {
                    rule: rule.describe(),
                });
            }
        }
        Ok(Self { object_type, rules })
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Reference tables the rules look codes up in.
    pub fn lookup_tables(&self) -> BTreeSet<&str> {
        self.rules
            .iter()
            .filter_map(|rule| match &rule.lookup {
                Some(LookupRef::Table(name)) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Human-readable notes about rules that shadow each other.
    pub fn lint(&self) -> Vec<String> {
        let mut writers: BTreeMap<&str, Vec<&MappingRule>> = BTreeMap::new();
        for rule in &self.rules {
            if !rule.kind.appends() {
                writers.entry(rule.target.as_str()).or_default().push(rule);
            }
        }
        writers
            .into_iter()
            .filter(|(_, rules)| rules.len() > 1)
            .map(|(target, rules)| {
                let lines: Vec<String> = rules
                    .iter()
                    .map(|rule| rule.line.map_or_else(|| "?".to_string(), |line| line.to_string()))
                    .collect();
                format!(
                    "{target} is written by {} rules (lines {}); the last one with a value wins",
                    rules.len(),
                    lines.join(", ")
                )
            })
            .collect()
    }
}

/// A source-less rule can still write a constant from its conditions.
fn writes_literal(rule: &MappingRule) -> bool {
    rule.conditions.iter().any(|entry| {
        matches!(entry.condition, Condition::Always | Condition::Empty)
            && matches!(entry.value, ValueExpr::Literal(_) | ValueExpr::Empty)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(target: &str, source: &str) -> MappingRule {
        MappingRule::new(target, source).unwrap()
    }

    #[test]
    fn empty_rule_set_is_rejected() {
        let err = RuleSet::new(ObjectType::Item, Vec::new()).unwrap_err();
        assert!(matches!(err, RuleSetError::Empty { .. }));
    }

    #[test]
    fn id_target_is_rejected() {
        let err = RuleSet::new(ObjectType::Item, vec![rule("id", "legacy_id")]).unwrap_err();
        assert!(matches!(err, RuleSetError::GeneratedField { .. }));
    }

    #[test]
    fn sourceless_rule_needs_a_constant() {
        let err = RuleSet::new(ObjectType::Item, vec![rule("status.name", "")]).unwrap_err();
        assert!(matches!(err, RuleSetError::NothingToWrite { .. }));

        let constant = rule("status.name", "").with_conditions("* => Available").unwrap();
        assert!(RuleSet::new(ObjectType::Item, vec![constant]).is_ok());
    }

    #[test]
    fn lookup_tables_and_shadowing_are_reported() {
        let rules = vec![
            rule("materialTypeId", "material")
                .with_lookup("material_types")
                .unwrap()
                .at_line(2),
            rule("title", "title").at_line(3),
            rule("title", "245.a").at_line(4),
            rule("holdingsRecordId", "holdings_id")
                .with_lookup("@holdings")
                .unwrap(),
        ];
        let set = RuleSet::new(ObjectType::Item, rules).unwrap();
        assert_eq!(set.lookup_tables().into_iter().collect::<Vec<_>>(), ["material_types"]);
        assert_eq!(
            set.lint(),
            ["title is written by 2 rules (lines 3, 4); the last one with a value wins"]
        );
    }
}
