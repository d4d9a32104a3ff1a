//! # Model Assets Module
//!
//! Getting model files from disk into memory:
//!
//! - [`cache`] - One-time preprocessing of OBJ files into `<model>.pr` copies
//! - [`decoder`] - The [`ModelDecoder`] seam and its `tobj`-backed [`ObjDecoder`]

pub mod cache;
pub mod decoder;

// Re-export main types
pub use cache::{cache_path_for, resolve_model_path, ModelCache, CACHE_SUFFIX};
pub use decoder::{MeshData, ModelDecoder, ModelGroup, ObjDecoder};
