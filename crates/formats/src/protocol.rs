//! Wire types for the Grasshopper evaluation endpoint.

use std::borrow::Cow;
use std::fmt;

use base64::Engine as _;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Branch address used when a parameter holds a single value.
pub const DEFAULT_BRANCH: &str = "{0}";

/// Raw bytes of a Grasshopper definition plus a content hash for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    bytes: Vec<u8>,
    content_hash: String,
}

impl Definition {
    pub fn new(bytes: Vec<u8>) -> Self {
        let content_hash = blake3::hash(&bytes).to_hex().to_string();
        Self {
            bytes,
            content_hash,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Scalar input value, tagged with the .NET type name the evaluator expects.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "System.Double",
            ParamValue::Integer(_) => "System.Int32",
            ParamValue::Boolean(_) => "System.Boolean",
            ParamValue::Text(_) => "System.String",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Number(v) => serde_json::json!(v),
            ParamValue::Integer(v) => serde_json::json!(v),
            ParamValue::Boolean(v) => Value::Bool(*v),
            ParamValue::Text(v) => Value::String(v.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
}

impl Param {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, ParamValue::Number(value))
    }
}

/// One value inside a data tree branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ResultItem {
    pub fn new(type_name: impl Into<String>, data: Value) -> Self {
        Self {
            type_name: Some(type_name.into()),
            data,
        }
    }

    /// Text handed to the geometry kernel. `None` for null or absent data.
    pub fn payload(&self) -> Option<Cow<'_, str>> {
        match &self.data {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

/// Path key → items, kept in the order the evaluator sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InnerTree(pub Vec<(String, Vec<ResultItem>)>);

impl InnerTree {
    pub fn single(item: ResultItem) -> Self {
        InnerTree(vec![(DEFAULT_BRANCH.to_string(), vec![item])])
    }

    pub fn branches(&self) -> impl Iterator<Item = (&str, &[ResultItem])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl Serialize for InnerTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (path, items) in &self.0 {
            map.serialize_entry(path, items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InnerTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = InnerTree;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of branch paths to item lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<InnerTree, A::Error> {
                let mut branches = Vec::new();
                while let Some((path, items)) =
                    access.next_entry::<String, Option<Vec<ResultItem>>>()?
                {
                    branches.push((path, items.unwrap_or_default()));
                }
                Ok(InnerTree(branches))
            }
        }

        deserializer.deserialize_map(TreeVisitor)
    }
}

/// A named data tree. Used both for inputs and for output groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTree {
    #[serde(rename = "ParamName", default)]
    pub param_name: String,
    #[serde(rename = "InnerTree", default)]
    pub inner_tree: InnerTree,
}

impl DataTree {
    pub fn from_param(param: &Param) -> Self {
        Self {
            param_name: param.name.clone(),
            inner_tree: InnerTree::single(ResultItem::new(
                param.value.type_name(),
                param.value.to_json(),
            )),
        }
    }
}

pub type OutputGroup = DataTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Base64 definition bytes.
    pub algo: Option<String>,
    pub pointer: Option<String>,
    pub values: Vec<DataTree>,
}

impl EvaluationRequest {
    pub fn new(definition: &Definition, params: &[Param]) -> Self {
        Self {
            algo: Some(definition.to_base64()),
            pointer: None,
            values: params.iter().map(DataTree::from_param).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    #[serde(default)]
    pub values: Vec<OutputGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,
}

impl EvaluationResponse {
    /// Every item of every branch of every group, in response order.
    pub fn items(&self) -> impl Iterator<Item = &ResultItem> {
        self.values
            .iter()
            .flat_map(|group| group.inner_tree.0.iter())
            .flat_map(|(_, items)| items.iter())
    }

    /// Like [`Self::items`], paired with the owning group's parameter name.
    pub fn named_items(&self) -> impl Iterator<Item = (&str, &ResultItem)> {
        self.values.iter().flat_map(|group| {
            group
                .inner_tree
                .0
                .iter()
                .flat_map(move |(_, items)| {
                    items.iter().map(move |i| (group.param_name.as_str(), i))
                })
        })
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }
}
