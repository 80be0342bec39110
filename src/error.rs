use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to read {path:?}: {source}")]
    ReadTable { path: PathBuf, source: csv::Error },

    #[error("Malformed row {row} in {table}: {reason}")]
    MalformedRow {
        table: String,
        row: usize,
        reason: String,
    },

    #[error("No such Station {stop_id:?} on Route {route_id:?}")]
    NoStationOnRoute { stop_id: String, route_id: String },

    #[error("Station {0:?} is listed more than once")]
    DuplicateStation(String),

    #[error("Station {stop_id:?} has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        stop_id: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("Route {0:?} lists no stations")]
    EmptyRoute(String),

    #[error("Unknown service pattern {0:?}")]
    UnknownPattern(String),

    #[error("Failed to write {path:?}: {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}
