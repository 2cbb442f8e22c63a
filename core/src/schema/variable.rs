use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::Link;

/// A custom field on runs; subcategory variables split leaderboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Variable {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub scope: VariableScope,
    pub mandatory: bool,
    pub user_defined: bool,
    pub obsoletes: bool,
    pub values: VariableValues,
    pub is_subcategory: bool,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Variable {
    /// Label of the value with id `value_id`.
    pub fn label(&self, value_id: &str) -> Option<&str> {
        self.values
            .values
            .get(value_id)
            .map(|value| value.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VariableScope {
    Global,
    FullGame,
    AllLevels,
    SingleLevel { level: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValues {
    #[serde(rename = "_note", default)]
    pub note: Option<String>,
    pub values: BTreeMap<String, VariableValue>,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableValue {
    pub label: String,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub flags: Option<ValueFlags>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFlags {
    #[serde(default)]
    pub miscellaneous: Option<bool>,
}
