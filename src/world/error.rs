//! Error types for content and level data loading.

use thiserror::Error;

/// Errors that can occur when loading or validating data files.
///
/// All of these are load-time failures. Once a [`GameData`](super::GameData)
/// exists, the simulation never fails at runtime.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// File could not be found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File could not be read.
    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    /// A name refers to a hero, enemy, mount, or attack that was never defined.
    #[error("{owner} refers to unknown {kind} '{name}'")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        name: String,
    },

    /// Two definitions share a name.
    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },

    /// A required animation clip is absent.
    #[error("{owner} has no clip for {state}")]
    MissingClip { owner: String, state: String },

    /// A clip is malformed (no frames, or a hitbox window outside the clip).
    #[error("{owner} clip {state}: {details}")]
    InvalidClip {
        owner: String,
        state: String,
        details: String,
    },

    /// A level's depth band is empty or inverted.
    #[error("Level '{level}' has an invalid depth band ({min}..{max})")]
    InvalidDepthBand { level: String, min: f32, max: f32 },

    /// An encounter zone with nothing to spawn.
    #[error("Level '{level}' encounter {index} has no spawns")]
    EmptyEncounter { level: String, index: usize },

    /// Structural problem that doesn't fit the other variants.
    #[error("Invalid data in {owner}: {details}")]
    Invalid { owner: String, details: String },
}
