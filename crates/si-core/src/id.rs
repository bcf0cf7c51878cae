use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Global string interner for tree node keys.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// The three kinds of object that live in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Body,
    Constraint,
    Composite,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Body => "body",
            ObjectKind::Constraint => "constraint",
            ObjectKind::Composite => "composite",
        }
    }
}

impl FromStr for ObjectKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "body" => Ok(ObjectKind::Body),
            "constraint" => Ok(ObjectKind::Constraint),
            "composite" => Ok(ObjectKind::Composite),
            _ => Err(()),
        }
    }
}

/// The globally unique `(type, id)` pair of a world object.
///
/// Displayed and parsed as `<type>_<id>`, e.g. `body_12`. Numeric ids are
/// shared across kinds (one allocator per world), but identity is always the
/// pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    pub kind: ObjectKind,
    pub id: u32,
}

impl ObjectId {
    pub const fn body(id: u32) -> Self {
        Self {
            kind: ObjectKind::Body,
            id,
        }
    }

    pub const fn constraint(id: u32) -> Self {
        Self {
            kind: ObjectKind::Constraint,
            id,
        }
    }

    pub const fn composite(id: u32) -> Self {
        Self {
            kind: ObjectKind::Composite,
            id,
        }
    }

    /// The tree key used by the mirror for this object.
    pub fn key(&self) -> NodeKey {
        NodeKey::intern(&self.to_string())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.as_str(), self.id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.as_str(), self.id)
    }
}

impl FromStr for ObjectId {
    type Err = ();

    /// Parse `body_3` style keys. Category keys (`bodies_3`) are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.split_once('_').ok_or(())?;
        Ok(Self {
            kind: kind.parse()?,
            id: id.parse().map_err(|_| ())?,
        })
    }
}

/// A lightweight, interned key for nodes in the inspector tree.
/// Internally a `Spur` index: 4 bytes, Copy, O(1) Eq and Hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(Spur);

impl NodeKey {
    /// Intern a new string as a NodeKey, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        NodeKey(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// The object this key refers to, if it is an object key rather than a
    /// synthetic category key.
    pub fn object(&self) -> Option<ObjectId> {
        self.as_str().parse().ok()
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeKey::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeKey::intern("body_4");
        let b = NodeKey::intern("body_4");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "body_4");
    }

    #[test]
    fn object_id_display_and_parse() {
        let id = ObjectId::constraint(17);
        assert_eq!(id.to_string(), "constraint_17");
        assert_eq!("constraint_17".parse::<ObjectId>(), Ok(id));
        assert_eq!(id.key().object(), Some(id));
    }

    #[test]
    fn category_keys_are_not_objects() {
        assert_eq!(NodeKey::intern("bodies_3").object(), None);
        assert_eq!(NodeKey::intern("composites_3").object(), None);
        assert!("body_x".parse::<ObjectId>().is_err());
    }
}
