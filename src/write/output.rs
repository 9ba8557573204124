//! Memory-mapped output file that only appears at its target path once complete.
//!
//! The image is written into a sibling temporary file, which is flushed and renamed onto the
//! target by [`Output::finalize`]. Dropping an unfinalized [`Output`] removes the temporary,
//! so a failed write never leaves a partial module behind or touches an existing target.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use memmap2::{MmapMut, MmapOptions};

use crate::{Error, Result};

/// A memory-mapped temporary file destined for `target_path`.
pub(crate) struct Output {
    mmap: Option<MmapMut>,
    temp_path: PathBuf,
    target_path: PathBuf,
    finalized: bool,
}

impl Output {
    /// Create a zero-filled output of `size` bytes for `target_path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    /// Returns [`Error::WriteFailed`] if the directory, the temporary file or the mapping
    /// cannot be created.
    pub(crate) fn create<P: AsRef<Path>>(target_path: P, size: u64) -> Result<Self> {
        let target_path = target_path.as_ref().to_path_buf();
        let Some(file_name) = target_path.file_name() else {
            return Err(Error::WriteFailed {
                message: format!("{} does not name a file", target_path.display()),
            });
        };

        let parent = target_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| Error::WriteFailed {
            message: format!("Failed to create directory {}: {e}", parent.display()),
        })?;

        let temp_path = parent.join(format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            std::process::id()
        ));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::WriteFailed {
                message: format!("Failed to create {}: {e}", temp_path.display()),
            })?;

        // From here on Drop cleans up the temporary
        let mut output = Output {
            mmap: None,
            temp_path,
            target_path,
            finalized: false,
        };

        file.set_len(size).map_err(|e| Error::WriteFailed {
            message: format!("Failed to set file size: {e}"),
        })?;

        // The temporary is private to this writer until it is renamed
        let mmap = unsafe {
            MmapOptions::new()
                .map_mut(&file)
                .map_err(|e| Error::WriteFailed {
                    message: format!("Failed to create memory mapping: {e}"),
                })?
        };
        output.mmap = Some(mmap);

        Ok(output)
    }

    /// The whole output, mutably
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        match self.mmap.as_mut() {
            Some(mmap) => &mut mmap[..],
            None => &mut [],
        }
    }

    /// Copy `data` to `offset`.
    ///
    /// # Errors
    /// Returns [`Error::WriteFailed`] if the write would run past the end of the output.
    pub(crate) fn write_at(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let size = self.size();
        let target = offset
            .checked_add(data.len())
            .filter(|end| *end <= size)
            .map(|end| offset..end);

        match target {
            Some(range) => {
                self.as_mut_slice()[range].copy_from_slice(data);
                Ok(())
            }
            None => Err(Error::WriteFailed {
                message: format!(
                    "Write would exceed file size: offset={offset}, len={}, file_size={size}",
                    data.len()
                ),
            }),
        }
    }

    /// Size of the output in bytes
    pub(crate) fn size(&self) -> usize {
        self.mmap.as_ref().map_or(0, |mmap| mmap.len())
    }

    /// Path the output is written to once finalized
    pub(crate) fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Flush the output and move it onto the target path.
    ///
    /// # Errors
    /// Returns [`Error::WriteFailed`] if flushing or renaming fails; the temporary is removed
    /// and an existing target stays untouched.
    pub(crate) fn finalize(mut self) -> Result<PathBuf> {
        if let Some(mmap) = self.mmap.take() {
            mmap.flush().map_err(|e| Error::WriteFailed {
                message: format!("Failed to flush memory mapping: {e}"),
            })?;
        }

        std::fs::rename(&self.temp_path, &self.target_path).map_err(|e| Error::WriteFailed {
            message: format!(
                "Failed to move output to {}: {e}",
                self.target_path.display()
            ),
        })?;

        self.finalized = true;
        Ok(self.target_path.clone())
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if !self.finalized {
            // release the mapping before removing the file
            self.mmap = None;
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn finalize_moves_into_place() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("nested").join("out.dll");

        let mut output = Output::create(&target, 16).unwrap();
        assert_eq!(output.size(), 16);
        output.write_at(4, &[1, 2, 3]).unwrap();
        assert!(output.write_at(15, &[1, 2]).is_err());

        let path = output.finalize().unwrap();
        assert_eq!(path, target);

        let written = std::fs::read(&target).unwrap();
        assert_eq!(written.len(), 16);
        assert_eq!(&written[4..7], &[1, 2, 3]);
        assert_eq!(std::fs::read_dir(target.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn dropped_output_leaves_nothing() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("out.dll");
        std::fs::write(&target, b"original").unwrap();

        {
            let mut output = Output::create(&target, 8).unwrap();
            output.write_at(0, b"partial!").unwrap();
        }

        assert_eq!(std::fs::read(&target).unwrap(), b"original");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn target_must_name_a_file() {
        assert!(matches!(
            Output::create("/", 8),
            Err(Error::WriteFailed { .. })
        ));
    }
}
