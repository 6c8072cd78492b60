use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Output file that only appears at its destination once committed.
///
/// Bytes go to a temporary file in the destination directory; [`commit`]
/// flushes, syncs and renames it into place. Dropping an uncommitted file
/// removes the temporary, so a failed unit never leaves partial output.
///
/// [`commit`]: AtomicFile::commit
pub struct AtomicFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    pub fn create(target: impl AsRef<Path>) -> io::Result<Self> {
        let target = target.as_ref().to_path_buf();
        let parent = parent_dir(&target);
        std::fs::create_dir_all(&parent)?;
        let tmp = NamedTempFile::new_in(&parent)?;
        Ok(Self {
            target,
            writer: BufWriter::new(tmp),
        })
    }

    /// Starts from a copy of the file currently at `target`, if any.
    pub fn append_to(target: impl AsRef<Path>) -> io::Result<Self> {
        let mut file = Self::create(target.as_ref())?;
        match File::open(target.as_ref()) {
            Ok(mut existing) => {
                io::copy(&mut existing, &mut file.writer)?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        Ok(file)
    }

    pub fn commit(self) -> io::Result<PathBuf> {
        let tmp = self.writer.into_inner().map_err(|e| e.into_error())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.target).map_err(|e| e.error)?;
        Ok(self.target)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Reads one line including its terminator; `None` at end of input.
pub fn read_line<R: io::BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = String::new();
    if reader.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn commit_moves_file_into_place() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.txt");

        let mut file = AtomicFile::create(&target).unwrap();
        write!(file, "hello").unwrap();
        assert!(!target.exists(), "nothing visible before commit");

        file.commit().unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    fn dropping_uncommitted_file_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.txt");
        {
            let mut file = AtomicFile::create(&target).unwrap();
            write!(file, "partial").unwrap();
        }
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn append_to_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.txt");
        std::fs::write(&target, "first\n").unwrap();

        let mut file = AtomicFile::append_to(&target).unwrap();
        write!(file, "second\n").unwrap();
        file.commit().unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested/deeper/out.txt");
        let file = AtomicFile::create(&target).unwrap();
        file.commit().unwrap();
        assert!(target.exists());
    }

    #[test]
    fn read_line_terminates_last_line() {
        let mut cursor = Cursor::new("a\nb");
        assert_eq!(read_line(&mut cursor).unwrap().as_deref(), Some("a\n"));
        assert_eq!(read_line(&mut cursor).unwrap().as_deref(), Some("b\n"));
        assert_eq!(read_line(&mut cursor).unwrap(), None);
    }
}
