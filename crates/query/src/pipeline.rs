//! Aggregation pipelines.
//!
//! Only grouped sums are modelled: the one shape reporting needs.

use core::fmt;

use serde_json::{Map, Value, json};

/// Output key holding the group value.
pub const GROUP_KEY: &str = "_id";

/// `output = sum(source)` over each group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumField {
    pub output: String,
    pub source: String,
}

/// Group documents by `key` and emit one row per distinct value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStage {
    pub key: String,
    pub sums: Vec<SumField>,
}

impl GroupStage {
    pub fn by(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sums: Vec::new(),
        }
    }

    pub fn sum(mut self, output: impl Into<String>, source: impl Into<String>) -> Self {
        self.sums.push(SumField {
            output: output.into(),
            source: source.into(),
        });
        self
    }

    pub fn to_value(&self) -> Value {
        let mut group = Map::new();
        group.insert(GROUP_KEY.to_string(), Value::String(format!("${}", self.key)));
        for sum in &self.sums {
            group.insert(sum.output.clone(), json!({ "$sum": format!("${}", sum.source) }));
        }
        json!({ "$group": group })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Group(GroupStage),
}

impl Stage {
    pub fn to_value(&self) -> Value {
        match self {
            Stage::Group(group) => group.to_value(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn group(group: GroupStage) -> Self {
        Self::new().then(Stage::Group(group))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn to_document(&self) -> Value {
        Value::Array(self.stages.iter().map(Stage::to_value).collect())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}
