// ABOUTME: Module registry and shared record types
// ABOUTME: Every table name used in generated SQL comes from the ModuleType match below

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A module type string that is not part of the registry.
///
/// Surfaced when polymorphic child rows or API callers carry an unknown
/// entity type; this is a configuration error and is never retried.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown module type: {0}")]
pub struct ParseModuleError(pub String);

/// Registry of entity modules that own record numbers.
///
/// The table name and id prefix for each module come from the matches below,
/// so dynamically assembled SQL never interpolates caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Organization,
    HiringManager,
    JobSeeker,
    Lead,
    Job,
    Placement,
    Task,
}

/// All modules, in the order the cleanup sweep visits them.
pub const ALL_MODULES: [ModuleType; 7] = [
    ModuleType::Organization,
    ModuleType::HiringManager,
    ModuleType::JobSeeker,
    ModuleType::Lead,
    ModuleType::Job,
    ModuleType::Placement,
    ModuleType::Task,
];

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Organization => "organization",
            ModuleType::HiringManager => "hiring_manager",
            ModuleType::JobSeeker => "job_seeker",
            ModuleType::Lead => "lead",
            ModuleType::Job => "job",
            ModuleType::Placement => "placement",
            ModuleType::Task => "task",
        }
    }

    /// SQL table holding this module's rows.
    pub fn table(&self) -> &'static str {
        match self {
            ModuleType::Organization => "organizations",
            ModuleType::HiringManager => "hiring_managers",
            ModuleType::JobSeeker => "job_seekers",
            ModuleType::Lead => "leads",
            ModuleType::Job => "jobs",
            ModuleType::Placement => "placements",
            ModuleType::Task => "tasks",
        }
    }

    /// Prefix for generated row ids, e.g. `org-V1StGXR8_Z5j`.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ModuleType::Organization => "org",
            ModuleType::HiringManager => "hm",
            ModuleType::JobSeeker => "js",
            ModuleType::Lead => "lead",
            ModuleType::Job => "job",
            ModuleType::Placement => "plc",
            ModuleType::Task => "task",
        }
    }
}

impl FromStr for ModuleType {
    type Err = ParseModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" => Ok(ModuleType::Organization),
            "hiring_manager" => Ok(ModuleType::HiringManager),
            "job_seeker" => Ok(ModuleType::JobSeeker),
            "lead" => Ok(ModuleType::Lead),
            "job" => Ok(ModuleType::Job),
            "placement" => Ok(ModuleType::Placement),
            "task" => Ok(ModuleType::Task),
            other => Err(ParseModuleError(other.to_string())),
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an entity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum RecordStatus {
    Active,
    Archived,
}

/// Polymorphic (entity_type, entity_id) key used by notes, history, documents
/// and scheduling tasks, which are shared across entity tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub module: ModuleType,
    pub id: String,
}

impl EntityRef {
    pub fn new(module: ModuleType, id: impl Into<String>) -> Self {
        Self {
            module,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module, self.id)
    }
}
