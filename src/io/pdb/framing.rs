use crate::io::{error::Error, util};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Destination for projected frames.
///
/// The projector calls [`begin_frame`], writes the frame's records to
/// [`writer`], then calls [`end_frame`]; [`finish`] is called once after
/// the last frame.
///
/// [`begin_frame`]: FrameSink::begin_frame
/// [`writer`]: FrameSink::writer
/// [`end_frame`]: FrameSink::end_frame
/// [`finish`]: FrameSink::finish
pub trait FrameSink {
    fn begin_frame(&mut self, index: usize) -> Result<(), Error>;
    fn writer(&mut self) -> &mut dyn Write;
    fn end_frame(&mut self, index: usize) -> Result<(), Error>;
    fn finish(&mut self) -> Result<(), Error>;
}

/// All frames in one file, each followed by `END`.
pub struct FlatSink<W> {
    out: W,
}

impl<W: Write> FlatSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for FlatSink<W> {
    fn begin_frame(&mut self, _index: usize) -> Result<(), Error> {
        Ok(())
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn end_frame(&mut self, _index: usize) -> Result<(), Error> {
        writeln!(self.out, "END")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.out.flush()?;
        Ok(())
    }
}

/// All frames in one multi-model file.
///
/// A title line comes first, then every frame is wrapped in
/// `MODEL n` ... `TER`/`ENDMDL`, and the file closes with a single `END`.
pub struct EnsembleSink<W> {
    out: W,
    title: String,
    frames: usize,
}

impl<W: Write> EnsembleSink<W> {
    pub fn new(out: W, title: impl Into<String>) -> Self {
        Self {
            out,
            title: title.into(),
            frames: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for EnsembleSink<W> {
    fn begin_frame(&mut self, index: usize) -> Result<(), Error> {
        if self.frames == 0 {
            writeln!(self.out, "{}", self.title)?;
        }
        writeln!(self.out, "MODEL     {:>4}", index + 1)?;
        Ok(())
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    fn end_frame(&mut self, _index: usize) -> Result<(), Error> {
        writeln!(self.out, "TER")?;
        writeln!(self.out, "ENDMDL")?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.frames == 0 {
            writeln!(self.out, "{}", self.title)?;
        }
        writeln!(self.out, "END")?;
        self.out.flush()?;
        Ok(())
    }
}

/// One file per frame, named `<stem>_<n>.<ext>` with `n` starting at 1.
///
/// Frames are staged in a hidden directory next to the outputs and only
/// moved into place by [`finish`]; if the sink is dropped before that, the
/// staged files are removed with it.
///
/// [`finish`]: FrameSink::finish
pub struct PerFrameSink {
    dir: PathBuf,
    stem: String,
    ext: String,
    staging: TempDir,
    buffer: Vec<u8>,
    staged: Vec<String>,
    written: Vec<PathBuf>,
}

impl PerFrameSink {
    /// `pattern` names the would-be single output file; its directory, stem
    /// and extension shape the per-frame names.
    pub fn new(pattern: &Path) -> Result<Self, Error> {
        let dir = util::parent_dir(pattern);
        std::fs::create_dir_all(&dir)?;
        let stem = pattern
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        let ext = pattern
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pdb".to_string());
        let staging = tempfile::Builder::new()
            .prefix(".tstitch-frames-")
            .tempdir_in(&dir)?;

        Ok(Self {
            dir,
            stem,
            ext,
            staging,
            buffer: Vec::new(),
            staged: Vec::new(),
            written: Vec::new(),
        })
    }

    pub fn file_name(&self, index: usize) -> String {
        format!("{}_{}.{}", self.stem, index + 1, self.ext)
    }

    /// Paths moved into place by `finish`.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for PerFrameSink {
    fn begin_frame(&mut self, _index: usize) -> Result<(), Error> {
        self.buffer.clear();
        Ok(())
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.buffer
    }

    fn end_frame(&mut self, index: usize) -> Result<(), Error> {
        self.buffer.extend_from_slice(b"END\n");
        let name = self.file_name(index);
        std::fs::write(self.staging.path().join(&name), &self.buffer)?;
        self.staged.push(name);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        for name in self.staged.drain(..) {
            let target = self.dir.join(&name);
            std::fs::rename(self.staging.path().join(&name), &target)?;
            self.written.push(target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive<S: FrameSink>(sink: &mut S, frames: usize) {
        for i in 0..frames {
            sink.begin_frame(i).unwrap();
            writeln!(sink.writer(), "ATOM {i}").unwrap();
            sink.end_frame(i).unwrap();
        }
        sink.finish().unwrap();
    }

    #[test]
    fn flat_sink_terminates_every_frame() {
        let mut sink = FlatSink::new(Vec::new());
        drive(&mut sink, 2);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "ATOM 0\nEND\nATOM 1\nEND\n");
    }

    #[test]
    fn ensemble_sink_wraps_models() {
        let mut sink = EnsembleSink::new(Vec::new(), "PEPTIDE");
        drive(&mut sink, 2);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "PEPTIDE\nMODEL        1\nATOM 0\nTER\nENDMDL\n\
             MODEL        2\nATOM 1\nTER\nENDMDL\nEND\n"
        );
    }

    #[test]
    fn ensemble_sink_without_frames_has_no_models() {
        let mut sink = EnsembleSink::new(Vec::new(), "EMPTY");
        drive(&mut sink, 0);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "EMPTY\nEND\n");
    }

    #[test]
    fn per_frame_sink_names_files_by_frame() {
        let dir = TempDir::new().unwrap();
        let mut sink = PerFrameSink::new(&dir.path().join("traj.pdb")).unwrap();
        drive(&mut sink, 3);

        let written = sink.written().to_vec();
        assert_eq!(written.len(), 3);
        assert_eq!(written[2], dir.path().join("traj_3.pdb"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("traj_1.pdb")).unwrap(),
            "ATOM 0\nEND\n"
        );
    }

    #[test]
    fn per_frame_sink_dropped_before_finish_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        {
            let mut sink = PerFrameSink::new(&dir.path().join("traj.pdb")).unwrap();
            sink.begin_frame(0).unwrap();
            sink.end_frame(0).unwrap();
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
