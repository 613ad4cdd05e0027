use crate::error::Error;
use crate::AnonCredsResult;
use blsful::inner_types::{G1Affine, G1Projective};
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const TAILS_VERSION: [u8; 2] = [0u8, 2u8];
const TAIL_SIZE: usize = 48;

/// Persists the tails of a new registry
pub trait TailsWriter: Debug {
    /// Write every tail, returning the location and hex SHA-256 hash
    fn write(
        &mut self,
        tails: &mut dyn Iterator<Item = G1Projective>,
    ) -> AnonCredsResult<(String, String)>;
}

/// Reads the tails of a registry
pub trait TailsReader: Debug {
    /// The hex SHA-256 hash of the tails data
    fn hash(&mut self) -> AnonCredsResult<String>;

    /// Read the first `count` tails
    fn read(&mut self, count: usize) -> AnonCredsResult<Vec<G1Projective>>;
}

/// Writes tails files into a directory, named by their hash
#[derive(Debug)]
pub struct TailsFileWriter {
    root_path: PathBuf,
}

impl TailsFileWriter {
    /// `None` writes to `anoncreds-tails` in the temporary directory
    pub fn new(root_path: Option<PathBuf>) -> Self {
        Self {
            root_path: root_path.unwrap_or_else(|| std::env::temp_dir().join("anoncreds-tails")),
        }
    }
}

impl TailsWriter for TailsFileWriter {
    fn write(
        &mut self,
        tails: &mut dyn Iterator<Item = G1Projective>,
    ) -> AnonCredsResult<(String, String)> {
        struct TempFile<'a>(&'a Path);

        impl TempFile<'_> {
            fn rename(self, target: &Path) -> AnonCredsResult<()> {
                let path = std::mem::ManuallyDrop::new(self).0;
                std::fs::rename(path, target).map_err(|e| {
                    Error::IOError(format!("error moving tails temp file {:?}: {}", path, e))
                })
            }
        }

        impl Drop for TempFile<'_> {
            fn drop(&mut self) {
                if let Err(e) = std::fs::remove_file(self.0) {
                    log::error!("error removing tails temp file {:?}: {}", self.0, e);
                }
            }
        }

        std::fs::create_dir_all(&self.root_path)?;
        let temp_path = self
            .root_path
            .join(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let file = File::options()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(|e| {
                Error::IOError(format!("error creating tails temp file {:?}: {}", temp_path, e))
            })?;
        let temp_handle = TempFile(&temp_path);
        let mut buf = BufWriter::new(file);
        let mut hasher = Sha256::default();

        buf.write_all(&TAILS_VERSION)?;
        hasher.update(TAILS_VERSION);
        let mut count = 0usize;
        for tail in tails {
            let bytes = tail.to_affine().to_compressed();
            buf.write_all(&bytes)?;
            hasher.update(bytes);
            count += 1;
        }
        let file = buf
            .into_inner()
            .map_err(|e| Error::IOError(format!("error flushing tails file: {}", e)))?;
        drop(file);

        let hash = hex::encode(hasher.finalize());
        let target_path = self.root_path.join(&hash);
        temp_handle.rename(&target_path)?;
        let location = target_path.to_string_lossy().into_owned();
        log::debug!("wrote tails file with {} tails: {}", count, location);
        Ok((location, hash))
    }
}

/// Reads a tails file written by [`TailsFileWriter`]
#[derive(Debug)]
pub struct TailsFileReader {
    path: PathBuf,
    file: Option<BufReader<File>>,
    hash: Option<String>,
}

impl TailsFileReader {
    /// Open lazily on first access
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
            hash: None,
        }
    }

    fn open(&mut self) -> AnonCredsResult<&mut BufReader<File>> {
        if self.file.is_none() {
            let file = File::open(&self.path).map_err(|e| {
                Error::IOError(format!("cannot open tails file {:?}: {}", self.path, e))
            })?;
            self.file = Some(BufReader::new(file));
        }
        self.file
            .as_mut()
            .ok_or_else(|| Error::IOError("tails file is not open".into()))
    }
}

impl TailsReader for TailsFileReader {
    fn hash(&mut self) -> AnonCredsResult<String> {
        if let Some(hash) = &self.hash {
            return Ok(hash.clone());
        }
        let file = self.open()?;
        file.seek(SeekFrom::Start(0))?;
        let mut hasher = Sha256::default();
        loop {
            let buf = file.fill_buf()?;
            let len = buf.len();
            if len == 0 {
                break;
            }
            hasher.update(buf);
            file.consume(len);
        }
        let hash = hex::encode(hasher.finalize());
        self.hash = Some(hash.clone());
        Ok(hash)
    }

    fn read(&mut self, count: usize) -> AnonCredsResult<Vec<G1Projective>> {
        let file = self.open()?;
        file.seek(SeekFrom::Start(0))?;
        let mut version = [0u8; 2];
        file.read_exact(&mut version)?;
        if version != TAILS_VERSION {
            return Err(Error::IOError("unsupported tails file version".into()));
        }
        let mut tails = Vec::with_capacity(count);
        let mut bytes = [0u8; TAIL_SIZE];
        for i in 0..count {
            file.read_exact(&mut bytes)
                .map_err(|e| Error::IOError(format!("tails file is truncated at {}: {}", i, e)))?;
            let point = Option::<G1Affine>::from(G1Affine::from_compressed(&bytes))
                .ok_or_else(|| Error::IOError(format!("corrupt tail at {}", i)))?;
            tails.push(G1Projective::from(point));
        }
        Ok(tails)
    }
}
