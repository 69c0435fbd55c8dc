//! Graph configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for a [`DataGraph`](crate::graph::DataGraph).
///
/// ```rust
/// use datagraph_core::GraphConfig;
///
/// let config = GraphConfig::from_json(r#"{ "max_cascade_depth": 64 }"#).unwrap();
/// assert_eq!(config.max_cascade_depth, Some(64));
/// assert!(config.notify_subscribers_on_drain);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Deepest change cascade a pass may follow before failing with
    /// [`GraphError::CascadeDepthExceeded`](crate::GraphError::CascadeDepthExceeded).
    ///
    /// `None` leaves cascades unbounded, so a dependency cycle whose values
    /// keep changing never terminates.
    pub max_cascade_depth: Option<usize>,

    /// Whether [`DataGraph::drain`](crate::graph::DataGraph::drain) triggers
    /// subscription callbacks after each pass.
    pub notify_subscribers_on_drain: bool,
}

impl GraphConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_cascade_depth: None,
            notify_subscribers_on_drain: true,
        }
    }
}
