//! # Scene Description Module
//!
//! Reads the line-oriented room format into typed [`SceneCommand`]s.
//!
//! ## Format
//!
//! ```text
//! begin room
//! cameraposx=0
//! cameraposy=1.6
//! cameraposz=4
//! cameraroty=0
//! end room
//! begin roomobject
//! file=models/crate.obj
//! locationx=1
//! scalex=1
//! scaley=1
//! scalez=1
//! end roomobject
//! ```
//!
//! ## Key Components
//!
//! - [`read_properties`] - Reads one block body into a [`PropertyMap`]
//! - [`parse_scene`] - State machine turning a whole description into a [`ParsedScene`]
//! - [`Diagnostic`] - What was skipped or defaulted; parsing itself never fails
//!
//! ## Usage
//!
//! ```
//! use roomview::scene::{parse_scene, SceneCommand};
//!
//! let scene = parse_scene("begin room\ncameraposx=1.5\nend room".lines());
//! assert!(matches!(scene.commands[0], SceneCommand::Room(_)));
//! ```

pub mod command;
pub mod diagnostics;
pub mod parser;
pub mod properties;

// Re-export main types
pub use command::{RoomCommand, RoomObjectCommand, SceneCommand};
pub use diagnostics::{Decoded, Diagnostic};
pub use parser::{load_scene, parse_scene, parse_scene_reader, ParsedScene, ParserState};
pub use properties::{numbered, read_properties, NumberedLines, PropertyMap};
