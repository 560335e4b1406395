use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::{validate_path, ObjectStore};

/// Object store rooted at a local (or network-mounted) directory.
///
/// Writes are crash-safe: data goes to `<object>.tmp`, is fsynced, then
/// atomically renamed over the final name, and the parent directory is
/// fsynced. A crash mid-write leaves only the temp file behind.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(LocalStore {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }

    /// Write through a temp file, fsync, rename into place.
    fn write_atomic(
        &self,
        op: &'static str,
        path: &str,
        fill: impl FnOnce(&mut File) -> io::Result<()>,
    ) -> Result<()> {
        let target = self.resolve(path)?;
        let wrap = |e| Error::storage(op, path, e);

        let parent = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(wrap)?;

        let tmp = target.with_extension(tmp_extension(&target));
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(wrap)?;
        fill(&mut file).map_err(wrap)?;
        file.flush().map_err(wrap)?;
        file.sync_all().map_err(wrap)?;
        drop(file);

        fs::rename(&tmp, &target).map_err(wrap)?;
        sync_dir(parent).map_err(wrap)?;
        Ok(())
    }
}

fn tmp_extension(target: &Path) -> String {
    match target.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl ObjectStore for LocalStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.write_atomic("put", path, |file| file.write_all(bytes))
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| Error::storage("get", path, e))
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        full.try_exists().map_err(|e| Error::storage("exists", path, e))
    }

    fn size(&self, path: &str) -> Result<Option<u64>> {
        let full = self.resolve(path)?;
        match fs::metadata(&full) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage("size", path, e)),
        }
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage("delete", path, e)),
        }
    }

    fn get_range(&self, path: &str, offset: u64, len: u64) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        let wrap = |e| Error::storage("get_range", path, e);

        let mut file = File::open(&full).map_err(wrap)?;
        file.seek(SeekFrom::Start(offset)).map_err(wrap)?;
        let mut buf = vec![0u8; len as usize];
        file.read_exact(&mut buf).map_err(wrap)?;
        Ok(buf)
    }

    fn put_file(&self, path: &str, local: &Path) -> Result<()> {
        let mut source = File::open(local)?;
        self.write_atomic("put_file", path, |file| {
            io::copy(&mut source, file).map(|_| ())
        })
    }

    fn fetch_file(&self, path: &str, local: &Path) -> Result<u64> {
        let full = self.resolve(path)?;
        fs::copy(&full, local).map_err(|e| Error::storage("fetch_file", path, e))
    }
}
