use crate::{
    document::{empty_document, Document},
    error::InternalError,
    json_store::{parse_document, read_document, JsonStore, Result},
};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    fs::{create_dir_all, remove_file, rename, File, OpenOptions},
    io::{self, prelude::*, ErrorKind},
    path::{Path, PathBuf},
};
use uuid::Uuid;

/// A sibling of the store file that is deleted on drop unless it was
/// renamed over the store.
struct TmpFile {
    path: PathBuf,
    file: File,
    persisted: bool,
}

impl TmpFile {
    fn create(next_to: &Path) -> io::Result<TmpFile> {
        let mut path = next_to.to_path_buf();
        path.set_file_name(Uuid::new_v4().to_string());
        path.set_extension("tmp");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(TmpFile {
            path,
            file,
            persisted: false,
        })
    }

    fn persist(mut self, target: &Path) -> io::Result<()> {
        rename(&self.path, target)?;
        self.persisted = true;
        self.file.unlock()
    }
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = remove_file(&self.path);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub pretty: bool,
    pub indent: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            indent: 2,
            pretty: false,
        }
    }
}

/// A document persisted in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    cfg: Config,
}

impl JsonStore for FileStore {
    fn load(&self) -> Result<Document> {
        match FileStore::get_string_from_file(&self.path) {
            Ok(content) => parse_document(&content),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(empty_document()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, doc: &Document) -> Result<()> {
        self.save_object_to_file(doc, &self.path)
    }
}

impl FileStore {
    fn to_writer_pretty<W: Write, T: Serialize>(&self, writer: &mut W, value: &T) -> Result<()> {
        let indent = vec![b' '; self.cfg.indent];
        let mut s = Serializer::with_formatter(writer, PrettyFormatter::with_indent(&indent));
        value.serialize(&mut s)?;
        Ok(())
    }

    fn object_to_bytes<T: Serialize>(&self, obj: &T) -> Result<Vec<u8>> {
        if self.cfg.pretty {
            let mut writer: Vec<u8> = vec![];
            self.to_writer_pretty(&mut writer, obj)?;
            Ok(writer)
        } else {
            Ok(serde_json::to_vec(obj)?)
        }
    }

    fn save_object_to_file<T: Serialize>(&self, obj: &T, file_name: &Path) -> Result<()> {
        let bytes = self.object_to_bytes(obj)?;
        let mut tmp = TmpFile::create(file_name)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(file_name)?;
        file.lock_exclusive()?;
        tmp.file.lock_exclusive()?;
        tmp.file.write_all(&bytes)?;
        tmp.file.sync_all()?;
        tmp.persist(file_name)?;
        file.unlock()?;
        debug!("Wrote {} bytes to {}", bytes.len(), file_name.display());
        Ok(())
    }

    fn get_string_from_file(file_name: &Path) -> io::Result<String> {
        let mut f = OpenOptions::new()
            .read(true)
            .write(false)
            .create(false)
            .open(file_name)?;
        let mut buffer = String::new();
        f.lock_shared()?;
        f.read_to_string(&mut buffer)?;
        f.unlock()?;
        Ok(buffer)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<FileStore> {
        FileStore::open_with_cfg(path, Config::default())
    }

    /// Opens the store file at `path`, creating it (and its parent
    /// directories) with the empty document if it does not exist yet.
    ///
    /// An existing file is validated, and rewritten once if it lacks any of
    /// the known collections.
    pub fn open_with_cfg<P: AsRef<Path>>(path: P, cfg: Config) -> Result<FileStore> {
        let s = FileStore {
            path: path.as_ref().to_path_buf(),
            cfg,
        };

        if let Some(parent) = s.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(err) = create_dir_all(parent) {
                if err.kind() != ErrorKind::AlreadyExists {
                    return Err(err.into());
                }
            }
        }

        if s.path.is_dir() {
            return Err(InternalError::InvalidDocument(format!(
                "{} is a directory",
                s.path.display()
            )));
        }
        if s.path.exists() {
            let (doc, repaired) = read_document(&FileStore::get_string_from_file(&s.path)?)?;
            if repaired {
                warn!("Store at {} was missing collections, rewriting it", s.path.display());
                s.save(&doc)?;
            }
        } else {
            info!("Creating empty store at {}", s.path.display());
            s.save(&empty_document())?;
        }
        Ok(s)
    }

    /// Returns the location of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
