use cgmath::Vector3;

/// Camera placement from a `room` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomCommand {
    pub position: Vector3<f32>,
    /// Rotation about the vertical axis.
    pub rotation_y: f32,
}

/// Object placement from a `roomobject` block.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomObjectCommand {
    /// Model path relative to the assets root. Empty means "nothing to load".
    pub file: String,
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    /// Per-axis rotation.
    pub rotation: Vector3<f32>,
}

impl RoomObjectCommand {
    /// Whether this object references a model at all.
    pub fn has_model(&self) -> bool {
        !self.file.is_empty()
    }
}

/// One directive of a scene description, in the order its block was closed.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    Room(RoomCommand),
    RoomObject(RoomObjectCommand),
}

impl SceneCommand {
    pub fn as_room(&self) -> Option<&RoomCommand> {
        match self {
            Self::Room(room) => Some(room),
            Self::RoomObject(_) => None,
        }
    }

    pub fn as_room_object(&self) -> Option<&RoomObjectCommand> {
        match self {
            Self::RoomObject(object) => Some(object),
            Self::Room(_) => None,
        }
    }
}

impl From<RoomCommand> for SceneCommand {
    fn from(command: RoomCommand) -> Self {
        Self::Room(command)
    }
}

impl From<RoomObjectCommand> for SceneCommand {
    fn from(command: RoomObjectCommand) -> Self {
        Self::RoomObject(command)
    }
}
