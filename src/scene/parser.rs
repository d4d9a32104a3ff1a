use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use cgmath::Vector3;
use log::{debug, warn};

use super::command::{RoomCommand, RoomObjectCommand, SceneCommand};
use super::diagnostics::{Decoded, Diagnostic};
use super::properties::{numbered, read_properties, PropertyMap};
use crate::error::SceneError;

/// States of the scene parser. Blocks never nest: every block returns to
/// [`ParserState::Scanning`] once its properties are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Scanning,
    InRoomBlock,
    InRoomObjectBlock,
}

/// Lines that open a block while scanning. They are compared against the raw,
/// untrimmed line.
const TRANSITIONS: &[(&str, ParserState)] = &[
    ("begin room", ParserState::InRoomBlock),
    ("begin roomobject", ParserState::InRoomObjectBlock),
];

impl ParserState {
    /// Next state after seeing `line` while scanning.
    pub fn after_scanning(line: &str) -> Self {
        TRANSITIONS
            .iter()
            .find(|(marker, _)| *marker == line)
            .map(|(_, state)| *state)
            .unwrap_or(ParserState::Scanning)
    }
}

/// Closes a `room` block. Exact match on the trimmed line.
fn is_room_end(line: &str) -> bool {
    line == "end room"
}

/// Closes a `roomobject` block. Any trimmed line starting with `end` does,
/// including `end roomobject` and a bare `end`.
fn is_room_object_end(line: &str) -> bool {
    line.starts_with("end")
}

/// Commands read from a scene description plus everything that was skipped or
/// defaulted along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedScene {
    pub commands: Vec<SceneCommand>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedScene {
    fn push<T: Into<SceneCommand>>(&mut self, decoded: Decoded<T>) {
        self.commands.push(decoded.value.into());
        self.diagnostics.extend(decoded.diagnostics);
    }

    pub fn room_commands(&self) -> impl Iterator<Item = &RoomCommand> {
        self.commands.iter().filter_map(SceneCommand::as_room)
    }

    pub fn room_object_commands(&self) -> impl Iterator<Item = &RoomObjectCommand> {
        self.commands.iter().filter_map(SceneCommand::as_room_object)
    }
}

/// Parses a scene description in a single pass.
///
/// Lines outside of blocks are ignored. Missing or unparsable numbers become
/// zero, and objects with an empty `file` are kept: deciding what to load is up
/// to the consumer.
pub fn parse_scene<I, S>(lines: I) -> ParsedScene
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines = numbered(lines);
    let mut scene = ParsedScene::default();
    let mut state = ParserState::Scanning;

    loop {
        state = match state {
            ParserState::Scanning => match lines.next() {
                Some((_, line)) => ParserState::after_scanning(line.as_ref()),
                None => break,
            },
            ParserState::InRoomBlock => {
                let begin = lines.current_line();
                let props = read_properties(&mut lines, is_room_end);
                scene.push(decode_room(props, begin));
                ParserState::Scanning
            }
            ParserState::InRoomObjectBlock => {
                let begin = lines.current_line();
                let props = read_properties(&mut lines, is_room_object_end);
                scene.push(decode_room_object(props, begin));
                ParserState::Scanning
            }
        };
    }

    for diagnostic in &scene.diagnostics {
        warn!("{}", diagnostic);
    }
    scene
}

/// Reads every line from `reader` and parses it.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, and a
/// trailing `\r` is dropped from each line.
pub fn parse_scene_reader<R: BufRead>(mut reader: R) -> std::io::Result<ParsedScene> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        lines.push(String::from_utf8_lossy(line).into_owned());
    }

    Ok(parse_scene(lines))
}

/// Opens and parses the scene description at `path`.
pub fn load_scene(path: impl AsRef<Path>) -> Result<ParsedScene, SceneError> {
    let path = path.as_ref();
    let to_error = |source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_error)?;
    let scene = parse_scene_reader(BufReader::new(file)).map_err(to_error)?;
    debug!(
        "parsed {} command(s) from '{}'",
        scene.commands.len(),
        path.display()
    );
    Ok(scene)
}

fn decode_room(props: Decoded<PropertyMap>, begin: usize) -> Decoded<RoomCommand> {
    dump_properties("room", &props.value);
    let mut fields = Fields::new(props, begin);

    let position = fields.vector("cameraposx", "cameraposy", "cameraposz");
    let rotation_y = fields.number("cameraroty");
    fields.finish(|_| RoomCommand {
        position,
        rotation_y,
    })
}

fn decode_room_object(props: Decoded<PropertyMap>, begin: usize) -> Decoded<RoomObjectCommand> {
    dump_properties("room object", &props.value);
    let mut fields = Fields::new(props, begin);

    let position = fields.vector("locationx", "locationy", "locationz");
    let scale = fields.vector("scalex", "scaley", "scalez");
    let rotation = fields.vector("rotationx", "rotationy", "rotationz");
    fields.finish(|props| RoomObjectCommand {
        file: props.get("file").cloned().unwrap_or_default(),
        position,
        scale,
        rotation,
    })
}

fn dump_properties(kind: &str, props: &PropertyMap) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let mut entries: Vec<_> = props.iter().collect();
    entries.sort();
    debug!("{} properties:", kind);
    for (key, value) in entries {
        debug!("  {}: {}", key, value);
    }
}

/// Pulls typed fields out of a property map, recording parse failures.
struct Fields {
    props: Decoded<PropertyMap>,
    begin: usize,
}

impl Fields {
    fn new(props: Decoded<PropertyMap>, begin: usize) -> Self {
        Self { props, begin }
    }

    /// Absent reads as zero silently. Present but unparsable reads as zero and
    /// leaves a diagnostic.
    fn number(&mut self, key: &str) -> f32 {
        let Some(raw) = self.props.value.get(key) else {
            return 0.0;
        };
        match raw.parse::<f32>() {
            Ok(value) => value,
            Err(_) => {
                let diagnostic = Diagnostic::InvalidNumber {
                    line: self.begin,
                    key: key.to_string(),
                    value: raw.clone(),
                };
                self.props.push(diagnostic);
                0.0
            }
        }
    }

    fn vector(&mut self, x: &str, y: &str, z: &str) -> Vector3<f32> {
        Vector3::new(self.number(x), self.number(y), self.number(z))
    }

    fn finish<T>(self, build: impl FnOnce(&PropertyMap) -> T) -> Decoded<T> {
        let value = build(&self.props.value);
        Decoded {
            value,
            diagnostics: self.props.diagnostics,
        }
    }
}
