// src/lib.rs
//! Roomview
//!
//! Loads room scene descriptions and the OBJ models they reference into an
//! engine-agnostic [`Room`], ready to be handed to a renderer.
//!
//! ```no_run
//! use roomview::{assets::ObjDecoder, AssetsConfig};
//!
//! let config = AssetsConfig::new("./assets");
//! let loaded = roomview::load_room(config, ObjDecoder).unwrap();
//! println!("{} object(s) placed", loaded.room.objects.len());
//! ```

pub mod assets;
pub mod config;
pub mod error;
pub mod room;
pub mod scene;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use config::{AssetsConfig, CachePolicy};
pub use error::{AssetError, DecodeError, ModelCacheError, SceneError};
pub use room::{load_room, LoadedRoom, Room, RoomLoader};
