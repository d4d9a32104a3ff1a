//! Model preprocessing cache
//!
//! The OBJ loader chokes on smoothing-group directives (`s 1`, `s off`), so each
//! model is copied once to `<model>.pr` with those lines removed, and the copy is
//! loaded from then on. The cache file's existence is the only state: under
//! [`CachePolicy::ExistenceOnly`] it is never checked against its source again.

use std::collections::HashMap;
use std::fs::{self, File, Metadata};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};

use crate::config::CachePolicy;
use crate::error::ModelCacheError;

/// Appended to a model path to name its preprocessed copy.
pub const CACHE_SUFFIX: &str = ".pr";

/// Line counts of one preprocessing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: usize,
    pub removed: usize,
}

/// Path of the preprocessed copy of `source`.
pub fn cache_path_for(source: impl AsRef<Path>) -> PathBuf {
    let mut name = source.as_ref().as_os_str().to_os_string();
    name.push(CACHE_SUFFIX);
    PathBuf::from(name)
}

/// `s`, then one whitespace character, then at least one more character.
pub fn is_smoothing_directive(line: &[u8]) -> bool {
    matches!(line, [b's', ws, _, ..] if ws.is_ascii_whitespace())
}

/// Copies `reader` to `writer` line by line, leaving out smoothing-group
/// directives. Retained lines are written unchanged, each followed by `\n`.
pub fn strip_smoothing_groups<R: BufRead, W: Write>(
    mut reader: R,
    writer: &mut W,
) -> io::Result<FilterStats> {
    let mut stats = FilterStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = trim_line_ending(&buf);
        if is_smoothing_directive(line) {
            stats.removed += 1;
            continue;
        }
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
        stats.kept += 1;
    }

    Ok(stats)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Returns the path to load for `source`, creating the preprocessed copy if it
/// does not exist yet. An existing copy is returned without looking at it.
pub fn resolve_model_path(source: impl AsRef<Path>) -> Result<PathBuf, ModelCacheError> {
    resolve_with_policy(source.as_ref(), CachePolicy::ExistenceOnly)
}

fn resolve_with_policy(source: &Path, policy: CachePolicy) -> Result<PathBuf, ModelCacheError> {
    let cache = cache_path_for(source);
    debug!("looking for '{}'", cache.display());

    match fs::metadata(&cache) {
        Ok(cache_meta) => {
            if policy == CachePolicy::RebuildWhenStale && is_stale(source, &cache_meta) {
                info!("'{}' is older than its source, rebuilding", cache.display());
                build(source, &cache)?;
            } else {
                debug!("preprocessed model exists, reusing '{}'", cache.display());
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!("preprocessing '{}'", source.display());
            build(source, &cache)?;
        }
        Err(err) => return Err(ModelCacheError::probe(cache, err)),
    }

    Ok(cache)
}

fn is_stale(source: &Path, cache_meta: &Metadata) -> bool {
    let source_modified = match fs::metadata(source).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(err) => {
            warn!(
                "cannot check '{}' for changes, keeping its cache: {}",
                source.display(),
                err
            );
            return false;
        }
    };
    match cache_meta.modified() {
        Ok(cache_modified) => source_modified > cache_modified,
        Err(_) => false,
    }
}

/// Writes the filtered copy next to `cache` and moves it into place, so an
/// interrupted run never leaves a truncated cache file behind.
fn build(source: &Path, cache: &Path) -> Result<FilterStats, ModelCacheError> {
    let input = File::open(source).map_err(|err| ModelCacheError::open_source(source, err))?;

    let partial = partial_path_for(cache);
    let result = write_filtered(BufReader::new(input), &partial)
        .and_then(|stats| commit(&partial, cache).map(|()| stats));

    match result {
        Ok(stats) => {
            debug!(
                "wrote '{}': {} line(s) kept, {} smoothing directive(s) removed",
                cache.display(),
                stats.kept,
                stats.removed
            );
            Ok(stats)
        }
        Err(err) => {
            let _ = fs::remove_file(&partial);
            Err(ModelCacheError::write_cache(cache, err))
        }
    }
}

/// A scratch name next to `cache`, unique to this writer.
fn partial_path_for(cache: &Path) -> PathBuf {
    let mut partial = cache.as_os_str().to_os_string();
    partial.push(format!(
        ".{}-{:08x}.tmp",
        std::process::id(),
        rand::random::<u32>()
    ));
    PathBuf::from(partial)
}

/// Moves the finished copy into place. Losing the race to another writer that
/// already produced the cache file counts as success.
fn commit(partial: &Path, cache: &Path) -> io::Result<()> {
    match fs::rename(partial, cache) {
        Ok(()) => Ok(()),
        Err(err) if cache.exists() => {
            debug!(
                "'{}' appeared while writing it ({}), using it",
                cache.display(),
                err
            );
            let _ = fs::remove_file(partial);
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn write_filtered<R: BufRead>(reader: R, path: &Path) -> io::Result<FilterStats> {
    let mut writer = BufWriter::new(File::create(path)?);
    let stats = strip_smoothing_groups(reader, &mut writer)?;
    writer.flush()?;
    Ok(stats)
}

/// Preprocessing cache that is safe to share between threads.
///
/// Calls for the same source path are serialized, so two first-time requests
/// never race to write the same cache file. Different paths proceed in
/// parallel.
#[derive(Debug, Default)]
pub struct ModelCache {
    policy: CachePolicy,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ModelCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Same as [`resolve_model_path`], honoring this cache's policy.
    pub fn resolve(&self, source: impl AsRef<Path>) -> Result<PathBuf, ModelCacheError> {
        let source = source.as_ref();
        let lock = self.lock_for(source);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        resolve_with_policy(source, self.policy)
    }

    /// Lock shared by every spelling of `source` that names the same cache
    /// file, e.g. `assets/./m.obj` and `assets/m.obj`.
    fn lock_for(&self, source: &Path) -> Arc<Mutex<()>> {
        let key: PathBuf = source.components().collect();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_smoothing_directive_pattern() {
        assert!(is_smoothing_directive(b"s 1"));
        assert!(is_smoothing_directive(b"s off"));
        assert!(is_smoothing_directive(b"s\t2"));
        assert!(is_smoothing_directive(b"s  "));

        assert!(!is_smoothing_directive(b"s"));
        assert!(!is_smoothing_directive(b"s "));
        assert!(!is_smoothing_directive(b"s1"));
        assert!(!is_smoothing_directive(b" s 1"));
        assert!(!is_smoothing_directive(b"sx 1"));
        assert!(!is_smoothing_directive(b"v 0 0 0"));
        assert!(!is_smoothing_directive(b""));
    }

    #[test]
    fn test_cache_path_appends_suffix() {
        assert_eq!(
            cache_path_for("assets/models/ceres.obj"),
            Path::new("assets/models/ceres.obj.pr")
        );
    }

    #[test]
    fn test_strip_keeps_other_lines_in_order() {
        let input = b"# comment\r\nv 1 2 3\ns 1\nvn 0 1 0\r\n\ns off\nf 1 2 3";
        let mut out = Vec::new();
        let stats = strip_smoothing_groups(&input[..], &mut out).unwrap();

        assert_eq!(out, b"# comment\nv 1 2 3\nvn 0 1 0\n\nf 1 2 3\n".to_vec());
        assert_eq!(stats, FilterStats { kept: 5, removed: 2 });
    }

    #[test]
    fn test_strip_preserves_non_utf8_bytes() {
        let input = b"o caf\xe9\ns 1\n";
        let mut out = Vec::new();
        strip_smoothing_groups(&input[..], &mut out).unwrap();

        assert_eq!(out, b"o caf\xe9\n".to_vec());
    }

    #[test]
    fn test_resolve_creates_filtered_copy() {
        let dir = TempDir::new("cache-create");
        let source = dir.write("model.obj", "s 1\nv 0 0 0\ns off\n");

        let resolved = resolve_model_path(&source).unwrap();

        assert_eq!(resolved, dir.path().join("model.obj.pr"));
        assert_eq!(fs::read_to_string(&resolved).unwrap(), "v 0 0 0\n");
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                entry.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_existence_check_failure_is_an_error() {
        let dir = TempDir::new("cache-notdir");
        dir.write("plain_file", "not a directory\n");
        let source = dir.path().join("plain_file").join("model.obj");

        let err = resolve_model_path(&source).unwrap_err();

        assert!(matches!(err, ModelCacheError::Probe { .. }));
        assert!(!cache_path_for(&source).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_partial_paths_are_unique_per_writer() {
        let cache = Path::new("models/crate.obj.pr");
        let first = partial_path_for(cache);
        let second = partial_path_for(cache);

        assert_ne!(first, second);
        assert!(first.to_string_lossy().starts_with("models/crate.obj.pr."));
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[test]
    fn test_commit_accepts_cache_written_by_another_writer() {
        let dir = TempDir::new("cache-commit");
        let partial = dir.path().join("model.obj.pr.lost.tmp");
        let cache = dir.path().join("model.obj.pr");

        // Nothing to move and no cache yet: a real failure.
        assert!(commit(&partial, &cache).is_err());

        // Someone else finished first.
        fs::write(&cache, "v 0 0 0\n").unwrap();
        commit(&partial, &cache).unwrap();
        assert_eq!(fs::read_to_string(&cache).unwrap(), "v 0 0 0\n");
    }

    #[test]
    fn test_aliased_paths_share_a_lock() {
        let cache_model = ModelCache::default();
        let plain = cache_model.lock_for(Path::new("assets/m.obj"));
        let dotted = cache_model.lock_for(Path::new("assets/./m.obj"));
        let other = cache_model.lock_for(Path::new("assets/n.obj"));

        assert!(Arc::ptr_eq(&plain, &dotted));
        assert!(!Arc::ptr_eq(&plain, &other));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let dir = TempDir::new("cache-idempotent");
        let source = dir.write("model.obj", "v 0 0 0\ns 1\n");

        let first = resolve_model_path(&source).unwrap();
        // Mark the cache so a rewrite would be visible.
        fs::write(&first, "marker\n").unwrap();
        let second = resolve_model_path(&source).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "marker\n");
    }

    #[test]
    fn test_missing_source_creates_nothing() {
        let dir = TempDir::new("cache-missing");
        let source = dir.path().join("absent.obj");

        let err = resolve_model_path(&source).unwrap_err();

        assert!(matches!(err, ModelCacheError::OpenSource { .. }));
        assert!(!cache_path_for(&source).exists());
    }

    #[test]
    fn test_existence_only_ignores_newer_source() {
        let dir = TempDir::new("cache-existence");
        let source = dir.write("model.obj", "v 1 1 1\n");
        let cache = dir.write("model.obj.pr", "old\n");
        set_modified(&cache, SystemTime::now() - Duration::from_secs(3600));

        let cache_model = ModelCache::new(CachePolicy::ExistenceOnly);
        let resolved = cache_model.resolve(&source).unwrap();

        assert_eq!(fs::read_to_string(resolved).unwrap(), "old\n");
    }

    #[test]
    fn test_rebuild_when_stale() {
        let dir = TempDir::new("cache-stale");
        let source = dir.write("model.obj", "v 1 1 1\ns 4\n");
        let cache = dir.write("model.obj.pr", "old\n");
        set_modified(&cache, SystemTime::now() - Duration::from_secs(3600));

        let cache_model = ModelCache::new(CachePolicy::RebuildWhenStale);
        let resolved = cache_model.resolve(&source).unwrap();

        assert_eq!(fs::read_to_string(&resolved).unwrap(), "v 1 1 1\n");

        // Fresh now, so a second call leaves it alone.
        fs::write(&resolved, "fresh\n").unwrap();
        set_modified(&resolved, SystemTime::now() + Duration::from_secs(3600));
        cache_model.resolve(&source).unwrap();
        assert_eq!(fs::read_to_string(&resolved).unwrap(), "fresh\n");
    }

    #[test]
    fn test_concurrent_first_calls_share_one_cache() {
        let dir = TempDir::new("cache-threads");
        let body: String = (0..2000).map(|i| format!("v {i} 0 0\ns {i}\n")).collect();
        let source = dir.write("big.obj", &body);
        let cache_model = ModelCache::default();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache_model.resolve(&source)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in results {
            assert_eq!(result.unwrap(), cache_path_for(&source));
        }
        let cached = fs::read_to_string(cache_path_for(&source)).unwrap();
        assert_eq!(cached.lines().count(), 2000);
        assert!(cached.lines().all(|line| line.starts_with("v ")));
    }

    fn set_modified(path: &Path, time: SystemTime) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }
}
