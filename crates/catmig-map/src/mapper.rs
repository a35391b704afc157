//! Per-object-type mappers and their registry.

use std::collections::BTreeMap;

use catmig_model::{ObjectType, SourceRecord};

use crate::engine::{MappedRecord, MappingContext, RuleEngine};
use crate::error::{RecordError, RuleSetError};
use crate::profile::ObjectProfile;
use crate::rule_set::RuleSet;

/// Maps one source record into one target record.
pub trait RecordMapper: Send + Sync {
    fn object_type(&self) -> ObjectType;

    /// Legacy id of a record, as used for its identifier.
    fn legacy_id(&self, record: &SourceRecord) -> Result<String, RecordError>;

    fn map(
        &self,
        record: &SourceRecord,
        context: &MappingContext<'_>,
    ) -> Result<MappedRecord, RecordError>;
}

/// Rule-table mapper for any object type.
#[derive(Debug, Clone)]
pub struct RuleMapper {
    rules: RuleSet,
    profile: ObjectProfile,
    engine: RuleEngine,
}

impl RuleMapper {
    pub fn new(rules: RuleSet) -> Self {
        let profile = ObjectProfile::for_type(rules.object_type());
        Self {
            rules,
            profile,
            engine: RuleEngine::default(),
        }
    }

    pub fn with_profile(mut self, profile: ObjectProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn profile(&self) -> &ObjectProfile {
        &self.profile
    }
}

impl RecordMapper for RuleMapper {
    fn object_type(&self) -> ObjectType {
        self.rules.object_type()
    }

    fn legacy_id(&self, record: &SourceRecord) -> Result<String, RecordError> {
        self.profile.legacy_id(record)
    }

    fn map(
        &self,
        record: &SourceRecord,
        context: &MappingContext<'_>,
    ) -> Result<MappedRecord, RecordError> {
        self.engine.map(&self.rules, &self.profile, record, context)
    }
}

/// Mappers by object type.
#[derive(Default)]
pub struct MapperRegistry {
    mappers: BTreeMap<ObjectType, Box<dyn RecordMapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapper, replacing any earlier one for the same type.
    pub fn register(&mut self, mapper: Box<dyn RecordMapper>) {
        self.mappers.insert(mapper.object_type(), mapper);
    }

    /// Convenience for the common case of one rule table per type.
    pub fn register_rules(&mut self, rules: RuleSet) {
        self.register(Box::new(RuleMapper::new(rules)));
    }

    pub fn get(&self, object_type: ObjectType) -> Result<&dyn RecordMapper, RuleSetError> {
        self.mappers
            .get(&object_type)
            .map(Box::as_ref)
            .ok_or(RuleSetError::NoMapper { object_type })
    }

    pub fn object_types(&self) -> impl Iterator<Item = ObjectType> + '_ {
        self.mappers.keys().copied()
    }
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("object_types", &self.mappers.keys().collect::<Vec<_>>())
            .finish()
    }
}
