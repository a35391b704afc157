use std::fmt;

use uuid::Uuid;

use crate::ObjectType;

/// Root of every identifier derivation. Changing it changes every
/// identifier ever produced.
const ROOT_NAMESPACE: Uuid = Uuid::from_u128(0x3c1d_9f4e_6a27_5b80_9e15_d04c_7f2a_61b3);

/// A deterministic target record identifier.
///
/// Rendered as a lowercase hyphenated UUID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Identifier(Uuid);

impl Identifier {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// Derives identifiers from (namespace, legacy id, object type).
///
/// Derivation is chained name-based UUIDs: the namespace string under a
/// fixed root, the object type under the namespace, the legacy id under
/// the object type. No two tuples share a hash input, whatever characters
/// the parts contain.
///
/// Namespace and legacy id are trimmed first, so tuples that differ only
/// in surrounding whitespace (`" 123"` and `"123"`) are the same record and
/// get the same identifier.
#[derive(Debug, Clone)]
pub struct IdentifierGenerator {
    namespace: String,
    type_roots: [Uuid; ObjectType::ALL.len()],
}

impl IdentifierGenerator {
    pub fn new(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into().trim().to_string();
        let namespace_root = Uuid::new_v5(&ROOT_NAMESPACE, namespace.as_bytes());
        let type_roots = ObjectType::ALL
            .map(|object_type| Uuid::new_v5(&namespace_root, object_type.as_str().as_bytes()));
        Self {
            namespace,
            type_roots,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Identifier for one legacy record.
    ///
    /// Surrounding whitespace of the legacy id is ignored, so `" 123"` and
    /// `"123"` collide on purpose. Inner whitespace and case are kept:
    /// `"12 3"` and `"ABC"` stay distinct from `"123"` and `"abc"`.
    pub fn generate(&self, legacy_id: &str, object_type: ObjectType) -> Identifier {
        // Discriminants follow the order of `ObjectType::ALL`.
        let root = &self.type_roots[object_type as usize];
        Identifier(Uuid::new_v5(root, legacy_id.trim().as_bytes()))
    }
}

/// One-off form of [`IdentifierGenerator::generate`].
pub fn generate(namespace: &str, legacy_id: &str, object_type: ObjectType) -> Identifier {
    IdentifierGenerator::new(namespace).generate(legacy_id, object_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_tuples_give_identical_ids() {
        let first = generate("tenant-a", "123", ObjectType::Item);
        let second = generate("tenant-a", "123", ObjectType::Item);
        assert_eq!(first, second);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn any_changed_part_changes_the_id() {
        let base = generate("tenant-a", "123", ObjectType::Item);
        assert_ne!(base, generate("tenant-a", "124", ObjectType::Item));
        assert_ne!(base, generate("tenant-a", "123", ObjectType::Holdings));
        assert_ne!(base, generate("tenant-b", "123", ObjectType::Item));
    }

    #[test]
    fn separators_cannot_be_used_to_forge_a_collision() {
        let left = generate("x:item", "1", ObjectType::Holdings);
        let right = generate("x", "holdings:1", ObjectType::Item);
        assert_ne!(left, right);
    }

    #[test]
    fn only_surrounding_whitespace_is_ignored() {
        let ids = IdentifierGenerator::new(" tenant-a ");
        let plain = ids.generate("123", ObjectType::Item);
        assert_eq!(ids.generate(" 123\t", ObjectType::Item), plain);
        assert_eq!(generate("tenant-a", "123", ObjectType::Item), plain);
        assert_ne!(ids.generate("12 3", ObjectType::Item), plain);
        assert_ne!(
            ids.generate("ABC", ObjectType::Item),
            ids.generate("abc", ObjectType::Item)
        );
    }

    #[test]
    fn renders_as_version_5_uuid() {
        let id = generate("tenant-a", "123", ObjectType::Item);
        assert_eq!(id.as_uuid().get_version_num(), 5);
        assert_eq!(id.to_string().len(), 36);
        assert_eq!(id.to_string(), id.to_string().to_lowercase());
    }
}
