//! Domain entities: curriculum nodes and their identity

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::{DomainError, DomainResult};

/// Opaque node identity.
///
/// Node files may spell ids as integers (`id = 1`) or strings (`id = "math"`);
/// both normalise to the same string. Ids that look like integers are written
/// back as integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) if n.to_string() == self.0 => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self::from(n),
            RawId::Text(s) => Self(s),
        })
    }
}

/// Category of a curriculum node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Subject,
    Unit,
    Topic,
    Lesson,
    /// Any tag not known to this crate, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Subject => f.write_str("subject"),
            NodeType::Unit => f.write_str("unit"),
            NodeType::Topic => f.write_str("topic"),
            NodeType::Lesson => f.write_str("lesson"),
            NodeType::Other(tag) => f.write_str(tag),
        }
    }
}

/// Grade level tag, e.g. "9" or "K".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeLevel(pub String);

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Curriculum node as delivered by a data source, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawNode {
    pub id: Option<NodeId>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type", alias = "node_type", alias = "nodeType")]
    pub node_type: Option<NodeType>,
    pub order: Option<i64>,
    #[serde(alias = "parentId")]
    pub parent_id: Option<NodeId>,
    #[serde(alias = "gradeLevel", alias = "grade_level")]
    pub grade_levels: Vec<GradeLevel>,
}

/// A validated curriculum entry with an optional parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurriculumNode {
    pub id: NodeId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grade_levels: Vec<GradeLevel>,
}

impl CurriculumNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            node_type,
            order: None,
            parent_id: None,
            grade_levels: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_grade_levels<I, S>(mut self, grades: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grade_levels = grades.into_iter().map(|g| GradeLevel(g.into())).collect();
        self
    }

    /// Validate a raw record.
    ///
    /// `index` is the record's position in its source and only used for
    /// reporting records that have no id at all.
    pub fn validate(raw: RawNode, index: usize) -> DomainResult<Self> {
        let id = match raw.id {
            Some(id) if !id.is_blank() => id,
            _ => return Err(DomainError::MissingId { index }),
        };
        let name = raw.name.ok_or_else(|| DomainError::MissingField {
            id: id.clone(),
            field: "name",
        })?;
        let node_type = raw.node_type.ok_or_else(|| DomainError::MissingField {
            id: id.clone(),
            field: "type",
        })?;
        // an empty parent reference is the same as none
        let parent_id = raw.parent_id.filter(|p| !p.is_blank());

        Ok(Self {
            id,
            name,
            description: raw.description,
            node_type,
            order: raw.order,
            parent_id,
            grade_levels: raw.grade_levels,
        })
    }
}

/// Sibling ordering: `order` ascending with missing orders last, then `name`,
/// then `id` so the result never depends on input order.
pub fn sibling_cmp(a: &CurriculumNode, b: &CurriculumNode) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}
