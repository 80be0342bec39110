pub mod config;
pub mod data;
pub mod emitter;
pub mod enumerator;
pub mod error;
pub mod gtfs;
pub mod pipeline;
pub mod progress;
pub mod scorer;
pub mod selector;
