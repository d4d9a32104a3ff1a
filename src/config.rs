//! Startup configuration, passed explicitly to everything that touches assets.

use std::path::{Path, PathBuf};

/// Default scene description looked up under the assets root.
pub const DEFAULT_SCENE_FILE: &str = "cassandra_airlock.txt";

/// When a preprocessed model on disk is considered usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Any existing cache file is used as is, however old.
    #[default]
    ExistenceOnly,
    /// The cache file is rebuilt when its source was modified after it.
    RebuildWhenStale,
}

/// Where scene and model files live and how they are cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetsConfig {
    pub assets_root: PathBuf,
    pub scene_file: PathBuf,
    pub cache_policy: CachePolicy,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("./"),
            scene_file: PathBuf::from(DEFAULT_SCENE_FILE),
            cache_policy: CachePolicy::default(),
        }
    }
}

impl AssetsConfig {
    /// Creates a configuration rooted at `assets_root` with default settings
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            ..Default::default()
        }
    }

    pub fn with_scene_file(mut self, scene_file: impl Into<PathBuf>) -> Self {
        self.scene_file = scene_file.into();
        self
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    /// Full path of the scene description.
    pub fn scene_path(&self) -> PathBuf {
        self.assets_root.join(&self.scene_file)
    }

    /// Full path of a model referenced by a room object.
    pub fn model_path(&self, file: impl AsRef<Path>) -> PathBuf {
        self.assets_root.join(file)
    }
}
