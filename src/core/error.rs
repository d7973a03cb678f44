use thiserror::Error;

use crate::core::types::{FleetId, MissionId, UnitId};

/// Why a unit could not be given a move order
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("no path to destination for {0}")]
    NoPath(UnitId),

    #[error("{0} is no longer in the world")]
    UnknownUnit(UnitId),
}

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Move not possible: {0}")]
    MoveNotPossible(#[from] MoveError),

    #[error("Fleet not found: {0}")]
    FleetNotFound(FleetId),

    #[error("Mission not found: {0}")]
    MissionNotFound(MissionId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Mission {mission} has no {handler} handler for phase {phase}")]
    IncompleteMissionTable {
        mission: &'static str,
        phase: String,
        handler: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AiError>;
