//! Persistence for the bearer credential.

use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Credential;

/// Where the session keeps its credential across restarts.
///
/// `clear` must succeed when nothing is stored.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> io::Result<Option<Credential>>;
    fn save(&self, credential: &Credential) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Stores the credential in a single file, readable only by its owner.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> io::Result<Option<Credential>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Credential::new(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, credential: &Credential) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // The mode only applies on creation; tighten a file written earlier.
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(credential.as_str().as_bytes())
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    slot: Arc<Mutex<Option<Credential>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(credential))),
        }
    }

    pub fn current(&self) -> Option<Credential> {
        self.slot.lock().clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> io::Result<Option<Credential>> {
        Ok(self.current())
    }

    fn save(&self, credential: &Credential) -> io::Result<()> {
        *self.slot.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("token"));

        assert_eq!(store.load().unwrap(), None);

        store.save(&Credential::new("t1").unwrap()).unwrap();
        assert_eq!(store.load().unwrap(), Credential::new("t1"));

        store.save(&Credential::new("t2").unwrap()).unwrap();
        assert_eq!(store.load().unwrap(), Credential::new("t2"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token"));
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_blank_file_is_no_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(FileCredentialStore::new(path).load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token"));
        store.save(&Credential::new("t1").unwrap()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_file_tightened_and_replaced() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "a-much-longer-stale-token").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::new(&path);
        store.save(&Credential::new("t2").unwrap()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), Credential::new("t2"));
    }

    #[test]
    fn test_memory_store_clones_share_slot() {
        let store = MemoryCredentialStore::new();
        let observer = store.clone();

        store.save(&Credential::new("t1").unwrap()).unwrap();
        assert_eq!(observer.current(), Credential::new("t1"));

        store.clear().unwrap();
        assert_eq!(observer.current(), None);
    }
}
