//! Toolkit configuration

use serde::{Deserialize, Serialize};

use crate::insert::Position;

/// Phase in which delegated listeners are installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationPhase {
    /// Fires before any descendant sees the event, even if a descendant
    /// stops propagation
    #[default]
    Capture,
    Bubble,
}

/// How `next`/`previous` treat a selector that the nearest element sibling
/// fails to match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingScan {
    /// Only the nearest element sibling is considered
    #[default]
    Abort,
    /// Keep scanning for the nearest matching element sibling
    Skip,
}

/// Per-instance options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Position used when an insertion names none
    pub default_position: Position,

    /// Phase for delegated `on` bindings
    pub delegation_phase: DelegationPhase,

    /// Sibling scan policy for `next`/`previous`
    pub sibling_scan: SiblingScan,

    /// Token delimiters for `template`
    pub template_delimiters: (String, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_position: Position::Bottom,
            delegation_phase: DelegationPhase::Capture,
            sibling_scan: SiblingScan::Abort,
            template_delimiters: ("{".to_string(), "}".to_string()),
        }
    }
}
