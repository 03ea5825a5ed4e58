//! [`PresetStore`] backed by a flat record file.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use ptz_if::{Preset, PresetEntry};
use std::{
    collections::BTreeMap,
    ffi::OsString,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{next_free_token, record, Mutation, PresetStore, PresetStoreError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Permissions of the preset directory when it has to be created.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Preset store whose source of truth is a file on disk.
///
/// The in-memory cache is refreshed from the file before every read or mutation, and every
/// mutation rewrites the whole file before returning. This tolerates edits by other processes at
/// the cost of a full file rewrite per call. The cache lock is held across the file I/O, so all
/// operations on one store are serialised.
#[derive(Debug)]
pub struct FilePresetStore {
    path: PathBuf,

    cache: Mutex<BTreeMap<String, Preset>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FilePresetStore {
    /// Create a store backed by the file at `path`.
    ///
    /// Nothing is read until the first operation.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    /// Path of the backing preset file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the cache with the contents of the file, returning the number of presets read.
    ///
    /// A missing file is an empty store. If a malformed line is found the presets before it are
    /// kept, the rest of the file is ignored and `Malformed` is returned. If the file cannot be
    /// read the cache is left as it was.
    pub fn load(&self) -> Result<usize, PresetStoreError> {
        let mut cache = self.lock();
        Self::read_into(&self.path, &mut cache)
    }

    /// Write the cache to the file.
    pub fn save(&self) -> Result<(), PresetStoreError> {
        let cache = self.lock();
        self.write(&cache)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Preset>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh the cache from disk, logging any problem instead of returning it.
    ///
    /// Returns `false` if the file exists but could not be read. The cache then still holds the
    /// last known contents and must not be written back over the file.
    fn refresh(&self, cache: &mut BTreeMap<String, Preset>) -> bool {
        match Self::read_into(&self.path, cache) {
            Ok(_) => true,
            Err(e @ PresetStoreError::Read(..)) => {
                warn!("Preset file unreadable, using the cached presets: {}", e);
                false
            }
            Err(e) => {
                warn!("Preset cache refresh incomplete: {}", e);
                true
            }
        }
    }

    fn read_into(
        path: &Path,
        cache: &mut BTreeMap<String, Preset>,
    ) -> Result<usize, PresetStoreError> {
        let contents = match fs::read(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No preset file at {:?}, starting empty", path);
                cache.clear();
                return Ok(0);
            }
            Err(e) => return Err(PresetStoreError::Read(path.to_path_buf(), e)),
        };

        let parsed = record::parse(&contents);
        *cache = parsed.presets;

        match parsed.stopped_at {
            Some((line, err)) => Err(PresetStoreError::Malformed { line, err }),
            None => Ok(cache.len()),
        }
    }

    /// Persist the cache, logging a failure. Returns `true` if the file was written.
    ///
    /// Nothing is written if the last refresh could not read the file.
    fn persist(&self, cache: &BTreeMap<String, Preset>, readable: bool) -> bool {
        if !readable {
            warn!("Preset change kept in memory only, {:?} was not read", self.path);
            return false;
        }

        match self.write(cache) {
            Ok(_) => true,
            Err(e) => {
                warn!("Preset change kept in memory only: {}", e);
                false
            }
        }
    }

    /// Write the full snapshot to a sibling temporary file and rename it over the preset file.
    fn write(&self, cache: &BTreeMap<String, Preset>) -> Result<(), PresetStoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                create_dir(dir).map_err(|e| PresetStoreError::CreateDir(dir.to_path_buf(), e))?;
                debug!("Created preset directory {:?}", dir);
            }
        }

        let mut tmp_path = OsString::from(self.path.as_os_str());
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let written =
            write_records(&tmp_path, cache).and_then(|_| fs::rename(&tmp_path, &self.path));

        if let Err(e) = written {
            // Best effort, the temporary file may not exist
            let _ = fs::remove_file(&tmp_path);
            return Err(PresetStoreError::Write(self.path.clone(), e));
        }

        debug!("Wrote {} presets to {:?}", cache.len(), self.path);
        Ok(())
    }
}

impl PresetStore for FilePresetStore {
    fn get(&self, token: &str) -> Option<Preset> {
        let mut cache = self.lock();
        self.refresh(&mut cache);

        cache.get(&lookup_key(&cache, token)).cloned()
    }

    fn list(&self) -> Vec<Preset> {
        let mut cache = self.lock();
        self.refresh(&mut cache);

        cache.values().cloned().collect()
    }

    fn put(&self, token: Option<&str>, entry: PresetEntry) -> Mutation {
        let mut cache = self.lock();
        let readable = self.refresh(&mut cache);

        let token = match token.map(record::sanitise_token) {
            Some(t) if !t.is_empty() => t,
            _ => next_free_token(&cache),
        };

        let mut preset = entry.into_preset(&token);
        preset.name = record::sanitise(&preset.name);
        if preset.name.is_empty() {
            preset.name = token.clone();
        }

        let existed = cache.insert(token.clone(), preset).is_some();
        let persisted = self.persist(&cache, readable);

        Mutation {
            token,
            existed,
            persisted,
        }
    }

    fn remove(&self, token: &str) -> Mutation {
        let mut cache = self.lock();
        let readable = self.refresh(&mut cache);

        let token = lookup_key(&cache, token);
        let existed = cache.remove(&token).is_some();
        let persisted = self.persist(&cache, readable);

        Mutation {
            token,
            existed,
            persisted,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Key of `token` in the cache. Tokens edited into the file by hand may hold characters that
/// supplied tokens cannot, so an exact match wins over the sanitised form.
fn lookup_key(cache: &BTreeMap<String, Preset>, token: &str) -> String {
    let token = token.trim();

    if cache.contains_key(token) {
        token.to_string()
    } else {
        record::sanitise_token(token)
    }
}

fn write_records(path: &Path, cache: &BTreeMap<String, Preset>) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    for preset in cache.values() {
        writeln!(out, "{}", record::format_record(preset))?;
    }

    out.into_inner().map_err(|e| e.into_error())?.sync_all()
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(DIR_MODE).create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::preset_store::RecordError;
    use approx::assert_relative_eq;
    use ptz_if::Pose;
    use std::sync::Arc;
    use std::thread;

    fn entry(pan: f64, tilt: f64, name: Option<&str>) -> PresetEntry {
        PresetEntry::at(Pose::new(pan, tilt), name)
    }

    #[test]
    fn test_auto_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path().join("presets.txt"));

        assert_eq!(store.put(None, entry(1.0, 2.0, None)).token, "1");
        assert_eq!(store.put(Some(""), entry(3.0, 4.0, None)).token, "2");

        let removed = store.remove("1");
        assert!(removed.existed);
        assert!(removed.persisted);

        assert_eq!(store.put(None, entry(5.0, 6.0, None)).token, "1");
        assert_eq!(store.get("1").unwrap().pose, Pose::new(5.0, 6.0));
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.txt");
        let store = FilePresetStore::new(&path);

        store.put(Some("A"), entry(10.0, 20.0, Some("Home")));
        store.put(Some("B"), entry(1.0 / 3.0, 179.999, None));
        let m = store.put(Some("C"), entry(0.1, 0.2, Some("Front door")));
        assert!(!m.existed);
        assert!(m.persisted);

        let before = store.list();

        // A second store over the same file sees the same mapping
        let other = FilePresetStore::new(&path);
        assert_eq!(other.load().unwrap(), 3);
        let after = other.list();

        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.token, a.token);
            assert_eq!(b.name, a.name);
            assert_relative_eq!(b.pose.pan_deg, a.pose.pan_deg, epsilon = 1e-9);
            assert_relative_eq!(b.pose.tilt_deg, a.pose.tilt_deg, epsilon = 1e-9);
            assert_relative_eq!(b.zoom, a.zoom, epsilon = 1e-9);
        }

        assert_eq!(after[0].name, "Home");
        assert_eq!(after[1].name, "B");
        assert_eq!(after[2].name, "Front_door");
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.txt");
        let store = FilePresetStore::new(&path);

        store.put(Some("2"), entry(30.0, 40.0, Some("two")));
        store.put(Some("1"), entry(10.5, 20.0, None));

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1 10.5 20 1 1\n2 30 40 1 two\n"
        );
    }

    #[test]
    fn test_external_edits_are_seen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.txt");
        let store = FilePresetStore::new(&path);

        store.put(Some("A"), entry(10.0, 20.0, None));
        fs::write(&path, "Z 90 45 1 Zed\n").unwrap();

        assert!(store.get("A").is_none());
        assert_eq!(store.get("Z").unwrap().name, "Zed");
        assert_eq!(store.put(None, entry(0.0, 0.0, None)).token, "1");
        assert_eq!(fs::read_to_string(&path).unwrap(), "1 0 0 1 1\nZ 90 45 1 Zed\n");
    }

    #[test]
    fn test_malformed_line_drops_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.txt");
        fs::write(&path, "1 10 20 1 one\n2 oops\n3 30 40 1 three\n").unwrap();

        let store = FilePresetStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(PresetStoreError::Malformed { line: 2, .. })
        ));

        let tokens: Vec<_> = store.list().into_iter().map(|p| p.token).collect();
        assert_eq!(tokens, vec!["1".to_string()]);
        assert!(store.get("3").is_none());
    }

    #[test]
    fn test_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("var").join("lib").join("ptz_exec");
        let store = FilePresetStore::new(nested.join("presets.txt"));

        assert!(store.put(None, entry(1.0, 1.0, None)).persisted);
        assert!(nested.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&nested).unwrap().permissions().mode() & 0o777;
            // The process umask can only remove bits
            assert_eq!(mode & !DIR_MODE, 0);
        }
    }

    #[test]
    fn test_unwritable_keeps_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the directory should be makes the write fail
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = FilePresetStore::new(blocker.join("presets.txt"));

        let m = store.put(Some("A"), entry(1.0, 2.0, None));
        assert_eq!(m.token, "A");
        assert!(!m.persisted);
        assert!(store.save().is_err());

        // The file cannot be read either, so the cache keeps the preset
        assert_eq!(store.get("A").unwrap().pose, Pose::new(1.0, 2.0));
    }

    #[test]
    fn test_invalid_utf8_keeps_earlier_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.txt");
        fs::write(&path, b"1 10 20 1 one\n2 30 40 1 caf\xE9\n3 50 60 1 three\n").unwrap();

        let store = FilePresetStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(PresetStoreError::Malformed {
                line: 2,
                err: RecordError::NotUtf8
            })
        ));

        let m = store.put(Some("9"), entry(1.0, 1.0, None));
        assert!(m.persisted);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1 10 20 1 one\n9 1 1 1 9\n"
        );
    }

    #[test]
    fn test_unreadable_file_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.txt");
        let store = FilePresetStore::new(&path);

        assert!(store.put(Some("A"), entry(10.0, 20.0, None)).persisted);

        // Replace the file with something which exists but cannot be read as a file
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "").unwrap();

        let m = store.put(Some("B"), entry(30.0, 40.0, None));
        assert!(!m.persisted);
        assert!(!store.remove("A").persisted);
        assert!(path.join("keep").is_file());

        // The last known presets are still served
        assert_eq!(store.get("B").unwrap().pose, Pose::new(30.0, 40.0));
    }

    #[test]
    fn test_tokens_limited_to_rig_safe_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.txt");
        let store = FilePresetStore::new(&path);

        let m = store.put(Some("door#2"), entry(1.0, 2.0, Some("Door #2")));
        assert_eq!(m.token, "door_2");
        assert_eq!(store.get("door#2").unwrap().token, "door_2");
        assert_eq!(fs::read_to_string(&path).unwrap(), "door_2 1 2 1 Door_#2\n");
        assert!(store.remove("door#2").existed);

        // Tokens edited into the file by hand are still reachable
        fs::write(&path, "cam#1 5 6 1 Cam\n").unwrap();
        assert_eq!(store.get("cam#1").unwrap().name, "Cam");
        assert!(store.remove("cam#1").existed);
    }

    #[test]
    fn test_whitespace_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePresetStore::new(dir.path().join("presets.txt"));

        let m = store.put(Some("front door"), entry(1.0, 2.0, None));
        assert_eq!(m.token, "front_door");
        assert_eq!(store.get("front door").unwrap().token, "front_door");
        assert!(store.remove("front door").existed);
        assert!(!store.remove("front door").existed);
    }

    #[test]
    fn test_concurrent_auto_tokens_unique() {
        const NUM_THREADS: usize = 8;

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FilePresetStore::new(dir.path().join("presets.txt")));

        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || store.put(None, entry(i as f64, 0.0, None)).token)
            })
            .collect();

        let mut tokens: Vec<u32> = handles
            .into_iter()
            .map(|h| h.join().unwrap().parse().unwrap())
            .collect();
        tokens.sort_unstable();

        assert_eq!(tokens, (1..=NUM_THREADS as u32).collect::<Vec<_>>());
        assert_eq!(store.list().len(), NUM_THREADS);
    }
}
