use std::fs;
use std::path::Path;

use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;

/// Local working directory for one build attempt.
///
/// Removed when dropped, so every exit path (success, error, panic unwind)
/// cleans up. Safe because nothing in it is visible to readers until the
/// manifest is rewritten.
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    /// Create a fresh, uniquely named directory under `root`.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix("wikidict-build-")
            .tempdir_in(root)?;
        debug!(path = %dir.path().display(), "created staging directory");
        Ok(Staging { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        debug!(path = %self.dir.path().display(), "removing staging directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn removed_on_drop() {
        let root = tempdir().unwrap();
        let staging = Staging::create(root.path()).unwrap();
        let path = staging.path().to_path_buf();
        fs::write(path.join("data.tbl"), b"x").unwrap();
        assert!(path.exists());

        drop(staging);
        assert!(!path.exists());
    }
}
