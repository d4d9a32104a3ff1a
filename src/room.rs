//! Room assembly
//!
//! Consumes parsed [`SceneCommand`]s: the room command places the camera, and
//! every object that names a model gets its file preprocessed, decoded and
//! placed. Objects are loaded independently, so one broken asset only costs
//! that object.

use std::path::PathBuf;

use cgmath::{Matrix4, Rad, Vector3};
use log::{info, warn};

use crate::assets::{ModelCache, ModelDecoder, ModelGroup};
use crate::config::AssetsConfig;
use crate::error::{AssetError, SceneError};
use crate::scene::{load_scene, ParsedScene, RoomCommand, RoomObjectCommand, SceneCommand};

/// Room camera. Rotation is in radians, one angle per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl Camera {
    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Vector3<f32>) {
        self.rotation = rotation;
    }
}

/// A decoded model with its placement in the room.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedModel {
    /// Model path as written in the scene description.
    pub file: String,
    pub model: ModelGroup,
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    /// Radians, applied X then Y then Z in object space.
    pub rotation: Vector3<f32>,
}

impl PlacedModel {
    /// Model-to-room matrix: translation, then rotation, then scale.
    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Camera plus placed models, independent of any renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Room {
    pub camera: Camera,
    pub objects: Vec<PlacedModel>,
}

impl Room {
    pub fn apply_room_command(&mut self, command: &RoomCommand) {
        self.camera.set_position(command.position);
        self.camera.set_rotation(Vector3::new(0.0, command.rotation_y, 0.0));
    }
}

/// An object that could not be placed, and why.
#[derive(Debug)]
pub struct AssetFailure {
    pub file: String,
    pub error: AssetError,
}

/// Result of assembling a room: whatever loaded, plus what did not.
#[derive(Debug, Default)]
pub struct LoadedRoom {
    pub room: Room,
    pub failures: Vec<AssetFailure>,
}

/// Object commands worth loading: those naming a model file.
///
/// Kept apart from the parser, which reports every block it sees.
pub fn renderable_objects<'a>(
    commands: impl IntoIterator<Item = &'a SceneCommand>,
) -> impl Iterator<Item = &'a RoomObjectCommand> {
    commands
        .into_iter()
        .filter_map(SceneCommand::as_room_object)
        .filter(|object| object.has_model())
}

/// Builds [`Room`]s from parsed scenes using the configured assets root,
/// a preprocessing cache and a model decoder.
pub struct RoomLoader<D> {
    config: AssetsConfig,
    cache: ModelCache,
    decoder: D,
}

impl<D: ModelDecoder> RoomLoader<D> {
    pub fn new(config: AssetsConfig, decoder: D) -> Self {
        let cache = ModelCache::new(config.cache_policy);
        Self {
            config,
            cache,
            decoder,
        }
    }

    /// Configuration the loader resolves model paths against.
    pub fn config(&self) -> &AssetsConfig {
        &self.config
    }

    /// Applies every room command and loads every renderable object, in order.
    pub fn load(&self, scene: &ParsedScene) -> LoadedRoom {
        let mut loaded = LoadedRoom::default();

        for room in scene.room_commands() {
            loaded.room.apply_room_command(room);
        }

        for object in renderable_objects(&scene.commands) {
            match self.load_object(object) {
                Ok(placed) => {
                    info!("placed '{}'", object.file);
                    loaded.room.objects.push(placed);
                }
                Err(error) => {
                    warn!("skipping '{}': {}", object.file, error);
                    loaded.failures.push(AssetFailure {
                        file: object.file.clone(),
                        error,
                    });
                }
            }
        }

        loaded
    }

    /// Preprocesses, decodes and places one object.
    pub fn load_object(&self, object: &RoomObjectCommand) -> Result<PlacedModel, AssetError> {
        let source: PathBuf = self.config.model_path(&object.file);
        let resolved = self.cache.resolve(&source)?;
        let model = self.decoder.decode(&resolved)?;

        Ok(PlacedModel {
            file: object.file.clone(),
            model,
            position: object.position,
            scale: object.scale,
            rotation: object.rotation,
        })
    }
}

/// Reads the configured scene description and assembles its room.
pub fn load_room<D: ModelDecoder>(config: AssetsConfig, decoder: D) -> Result<LoadedRoom, SceneError> {
    let scene = load_scene(config.scene_path())?;
    Ok(RoomLoader::new(config, decoder).load(&scene))
}
