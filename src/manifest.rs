use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::domain::{Filter, FilterOp, OrderBy};
use crate::error::GdmError;

pub const MANIFEST_FILE: &str = "info.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub url: String,
    pub metadata: Metadata,
    pub structure: Structure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip_deserializing)]
    pub folder: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub author: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "tags_or_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub nodes: u64,
    pub edges: u64,
    pub directed: bool,
    pub weighted: bool,
    pub labeled: bool,
    #[serde(default, deserialize_with = "mapping_or_empty")]
    pub optional: Mapping,
}

/// A manifest value normalised for comparison and display.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Sequence(items) => Some(FieldValue::List(
                items.iter().filter_map(Self::from_yaml).collect(),
            )),
            Value::Mapping(_) => None,
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
        }
    }

    /// Compares against a filter literal: numerically when both sides are
    /// numbers, as booleans for `true`/`false`, textually otherwise.
    pub fn compare_literal(&self, literal: &str) -> Ordering {
        match self {
            FieldValue::Number(n) => match literal.parse::<f64>() {
                Ok(other) => n.partial_cmp(&other).unwrap_or(Ordering::Equal),
                Err(_) => self.to_string().as_str().cmp(literal),
            },
            FieldValue::Bool(b) => match literal.to_ascii_lowercase().as_str() {
                "true" => b.cmp(&true),
                "false" => b.cmp(&false),
                _ => self.to_string().as_str().cmp(literal),
            },
            FieldValue::Text(s) => s.as_str().cmp(literal),
            FieldValue::List(_) => self.to_string().as_str().cmp(literal),
        }
    }

    /// `=` and `!=` on a list test membership; every other operator
    /// compares the comma-joined text.
    pub fn satisfies(&self, op: FilterOp, literal: &str) -> bool {
        match (self, op) {
            (FieldValue::List(items), FilterOp::Eq | FilterOp::Ne) => {
                let found = items
                    .iter()
                    .any(|item| item.compare_literal(literal) == Ordering::Equal);
                found == (op == FilterOp::Eq)
            }
            _ => op.holds(self.compare_literal(literal)),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => {
                let joined: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, GdmError> {
        let content = fs::read_to_string(path).map_err(|err| GdmError::InvalidManifest {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::parse(&content).map_err(|message| GdmError::InvalidManifest {
            path: path.to_path_buf(),
            message,
        })
    }

    /// A `folder` key in the YAML is dropped; the catalog sets the folder.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut manifest: Self = serde_yaml::from_str(content).map_err(|err| err.to_string())?;
        manifest.extra.remove("folder");
        Ok(manifest)
    }

    /// Looks a field up in structure, then `structure.optional`, then the
    /// top level, then metadata. Structure fields shadow metadata ones.
    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.structure_field(key)
            .or_else(|| {
                self.structure
                    .optional
                    .get(key)
                    .and_then(FieldValue::from_yaml)
            })
            .or_else(|| self.top_level_field(key))
            .or_else(|| self.metadata_field(key))
    }

    pub fn matches(&self, filter: &Filter) -> bool {
        self.field(&filter.field)
            .map(|value| value.satisfies(filter.op, &filter.value))
            .unwrap_or(false)
    }

    pub fn compare_by(&self, other: &Self, order_by: OrderBy) -> Ordering {
        match order_by {
            OrderBy::Name => self.name.cmp(&other.name),
            OrderBy::Date => compare_dates(&self.metadata.date, &other.metadata.date),
            OrderBy::Nodes => self.structure.nodes.cmp(&other.structure.nodes),
            OrderBy::Edges => self.structure.edges.cmp(&other.structure.edges),
        }
    }

    /// Optional structure fields that carry a value, in declaration order.
    pub fn optional_fields(&self) -> Vec<(String, FieldValue)> {
        self.structure
            .optional
            .iter()
            .filter_map(|(key, value)| {
                let key = match key {
                    Value::String(s) => s.clone(),
                    other => FieldValue::from_yaml(other)?.to_string(),
                };
                Some((key, FieldValue::from_yaml(value)?))
            })
            .collect()
    }

    fn structure_field(&self, key: &str) -> Option<FieldValue> {
        let s = &self.structure;
        match key {
            "nodes" => Some(FieldValue::Number(s.nodes as f64)),
            "edges" => Some(FieldValue::Number(s.edges as f64)),
            "directed" => Some(FieldValue::Bool(s.directed)),
            "weighted" => Some(FieldValue::Bool(s.weighted)),
            "labeled" => Some(FieldValue::Bool(s.labeled)),
            _ => None,
        }
    }

    fn top_level_field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "name" => Some(FieldValue::Text(self.name.clone())),
            "url" => Some(FieldValue::Text(self.url.clone())),
            _ => self.extra.get(key).and_then(FieldValue::from_yaml),
        }
    }

    fn metadata_field(&self, key: &str) -> Option<FieldValue> {
        let m = &self.metadata;
        match key {
            "author" => Some(FieldValue::Text(m.author.clone())),
            "date" => Some(FieldValue::Text(m.date.clone())),
            "description" => Some(FieldValue::Text(m.description.clone())),
            "tags" => Some(FieldValue::List(
                m.tags.iter().cloned().map(FieldValue::Text).collect(),
            )),
            _ => m.extra.get(key).and_then(FieldValue::from_yaml),
        }
    }
}

fn compare_dates(a: &str, b: &str) -> Ordering {
    match (parse_date(a), parse_date(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn parse_date(value: &str) -> Option<chrono::NaiveDate> {
    let value = value.trim();
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| chrono::NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d"))
        .or_else(|_| chrono::NaiveDate::parse_from_str(&format!("{value}-01-01"), "%Y-%m-%d"))
        .ok()
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(FieldValue::from_yaml(&value)
        .map(|value| value.to_string())
        .unwrap_or_default())
}

fn tags_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn mapping_or_empty<'de, D>(deserializer: D) -> Result<Mapping, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Mapping>::deserialize(deserializer)?.unwrap_or_default())
}
