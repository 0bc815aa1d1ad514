use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GdmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Bfs,
    Sssp,
}

impl Algorithm {
    pub fn executable(self) -> &'static str {
        match self {
            Algorithm::Bfs => "bfs",
            Algorithm::Sssp => "sssp",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OrderBy {
    #[default]
    Name,
    Date,
    Nodes,
    Edges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    Mtx,
    Bin,
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphFormat::Mtx => write!(f, "mtx"),
            GraphFormat::Bin => write!(f, "bin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Directed,
    Undirected,
}

/// One graph to benchmark, as written on the command line:
/// `path.(mtx|bin)[source:orientation]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSpec {
    pub path: PathBuf,
    pub name: String,
    pub format: GraphFormat,
    pub orientation: Option<Orientation>,
    pub source: Option<u64>,
}

impl GraphSpec {
    pub fn is_undirected(&self) -> bool {
        self.orientation == Some(Orientation::Undirected)
    }
}

static GRAPH_SPEC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>[^\[\]]+\.(?P<ext>[A-Za-z0-9]+))(?:\[(?P<suffix>[^\[\]]*)\])?$")
        .expect("graph spec pattern is valid")
});

impl FromStr for GraphSpec {
    type Err = GdmError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || GdmError::InvalidGraphSpec(value.to_string());
        let caps = GRAPH_SPEC_RE.captures(value.trim()).ok_or_else(invalid)?;

        let format = match &caps["ext"] {
            "mtx" => GraphFormat::Mtx,
            "bin" => GraphFormat::Bin,
            _ => return Err(invalid()),
        };
        let path = PathBuf::from(&caps["path"]);
        let name = graph_name(&path).ok_or_else(invalid)?;

        let (source, orientation) = match caps.name("suffix") {
            Some(suffix) => parse_suffix(suffix.as_str()).ok_or_else(invalid)?,
            None => (None, None),
        };

        Ok(Self {
            path,
            name,
            format,
            orientation,
            source,
        })
    }
}

/// Basename up to the first dot, the way result rows name a graph.
pub fn graph_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.split('.').next()?;
    (!stem.is_empty()).then(|| stem.to_string())
}

fn parse_suffix(suffix: &str) -> Option<(Option<u64>, Option<Orientation>)> {
    let (source, flag) = match suffix.split_once(':') {
        Some((source, flag)) => (source, flag),
        None if suffix.chars().all(|ch| ch.is_ascii_digit()) => (suffix, ""),
        None => ("", suffix),
    };
    let source = if source.is_empty() {
        None
    } else {
        Some(source.parse().ok()?)
    };
    let orientation = match flag {
        "" => None,
        "u" => Some(Orientation::Undirected),
        "d" => Some(Orientation::Directed),
        _ => return None,
    };
    Some((source, orientation))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl FilterOp {
    // At equal positions the longer operator wins, so `>=` is never read as `>`.
    const ALL: [(&'static str, FilterOp); 6] = [
        (">=", FilterOp::Ge),
        ("<=", FilterOp::Le),
        ("!=", FilterOp::Ne),
        ("=", FilterOp::Eq),
        (">", FilterOp::Gt),
        ("<", FilterOp::Lt),
    ];

    pub fn symbol(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(symbol, _)| *symbol)
            .unwrap_or("=")
    }

    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            FilterOp::Eq => ordering == Equal,
            FilterOp::Ne => ordering != Equal,
            FilterOp::Lt => ordering == Less,
            FilterOp::Gt => ordering == Greater,
            FilterOp::Le => ordering != Greater,
            FilterOp::Ge => ordering != Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op.symbol(), self.value)
    }
}

impl FromStr for Filter {
    type Err = GdmError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (symbol, op) = FilterOp::ALL
            .iter()
            .filter_map(|(symbol, op)| value.find(symbol).map(|pos| (pos, *symbol, *op)))
            .min_by_key(|(pos, symbol, _)| (*pos, std::cmp::Reverse(symbol.len())))
            .map(|(_, symbol, op)| (symbol, op))
            .ok_or_else(|| GdmError::InvalidFilter(value.to_string()))?;

        let (field, rest) = value
            .split_once(symbol)
            .ok_or_else(|| GdmError::InvalidFilter(value.to_string()))?;
        let field = field.trim();
        let rest = rest.trim();
        if field.is_empty() || rest.is_empty() {
            return Err(GdmError::InvalidFilter(value.to_string()));
        }

        Ok(Self {
            field: field.to_string(),
            op,
            value: rest.to_string(),
        })
    }
}
