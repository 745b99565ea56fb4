use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider node identifier. Sent back in the same JSON type it arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Text(String),
}

impl NodeId {
    /// Zero and blank ids mean "no node".
    pub fn is_empty(&self) -> bool {
        match self {
            NodeId::Int(id) => *id == 0,
            NodeId::Text(id) => id.trim().is_empty(),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(id) => write!(f, "{}", id),
            NodeId::Text(id) => f.write_str(id),
        }
    }
}

/// One entry of the node list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    #[serde(default)]
    pub node_id: Option<NodeId>,
    #[serde(default)]
    pub name_cn: Option<String>,
    #[serde(default)]
    pub name_en: Option<String>,
    #[serde(default)]
    pub region_name_cn: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl NodeSummary {
    pub fn id(&self) -> Option<&NodeId> {
        self.node_id.as_ref().filter(|id| !id.is_empty())
    }

    /// Display label: localized name, English name, region, then `Node-<id>`.
    pub fn label(&self) -> String {
        if let Some(name) = non_blank(&self.name_cn) {
            return name.to_string();
        }
        if let Some(name) = non_blank(&self.name_en) {
            return name.to_string();
        }
        if let Some(region) = non_blank(&self.region_name_cn) {
            return format!("{} Node", region);
        }
        match &self.node_id {
            Some(id) => format!("Node-{}", id),
            None => "Node-unknown".to_string(),
        }
    }
}
