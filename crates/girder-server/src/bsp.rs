//! The BSP 2.x build-target wire model, restricted to what this server
//! produces. Field names follow the protocol schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Build-target tags this server assigns.
pub mod tag {
    pub const LIBRARY: &str = "library";
    pub const TEST: &str = "test";
    pub const APPLICATION: &str = "application";
}

pub const DATA_KIND_JVM: &str = "jvm";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTargetIdentifier {
    pub uri: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildTargetCapabilities {
    pub can_compile: bool,
    pub can_test: bool,
    pub can_run: bool,
    pub can_debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTarget {
    pub id: BuildTargetIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// File URI of the target's base directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_directory: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub language_ids: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<BuildTargetIdentifier>,
    pub capabilities: BuildTargetCapabilities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// The standard `jvm` data payload extended with Gradle-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JvmBuildTargetEx {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_home: Option<String>,
    pub java_version: String,
    pub gradle_version: String,
    pub source_compatibility: String,
    pub target_compatibility: String,
}
