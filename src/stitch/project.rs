use super::config::{Framing, ProjectConfig};
use super::error::Error;
use crate::io::{
    AtomicFile, EnsembleSink, FlatSink, FrameNumbering, PerFrameSink, Projector, open_template,
    xyz,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectReport {
    pub frames: usize,
    pub records: usize,
    /// Coordinate tokens shortened to fit their field.
    pub truncated: usize,
    pub outputs: Vec<PathBuf>,
}

/// Projects every frame of a coordinate file onto a structure template.
///
/// With [`Framing::PerFrame`], `output` only supplies the directory, stem
/// and extension of the per-frame files. Nothing is left on disk when a
/// frame fails to project.
pub fn project_trajectory(
    coords: &Path,
    template: &Path,
    output: &Path,
    config: &ProjectConfig,
) -> Result<ProjectReport, Error> {
    if !coords.is_file() {
        return Err(Error::missing_input(coords));
    }
    if !template.is_file() {
        return Err(Error::missing_input(template));
    }

    let template = open_template(template)?;
    let blocks = xyz::open(coords)?.numbering(FrameNumbering::Sequential);
    let mut projector = Projector::new(&template).overflow(config.overflow);

    let (projection, outputs) = match config.framing {
        Framing::Flat => {
            let mut sink = FlatSink::new(AtomicFile::create(output)?);
            let projection = projector.project(blocks, &mut sink)?;
            (projection, vec![sink.into_inner().commit()?])
        }
        Framing::MultiModel => {
            let title = config
                .title
                .clone()
                .or_else(|| template.name.clone())
                .unwrap_or_default();
            let mut sink = EnsembleSink::new(AtomicFile::create(output)?, title);
            let projection = projector.project(blocks, &mut sink)?;
            (projection, vec![sink.into_inner().commit()?])
        }
        Framing::PerFrame => {
            let mut sink = PerFrameSink::new(output)?;
            let projection = projector.project(blocks, &mut sink)?;
            (projection, sink.written().to_vec())
        }
    };

    info!(
        frames = projection.frames,
        files = outputs.len(),
        "projected coordinates onto template"
    );
    Ok(ProjectReport {
        frames: projection.frames,
        records: projection.records,
        truncated: projection.truncated,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::error::Error as IoError;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
REMARK test peptide
ATOM      1  N   GLY A   1      -0.966   0.493   1.500  1.00  0.00           N
ATOM      2  CA  GLY A   1       0.257   0.418   0.692  1.00  0.00           C
END
";

    fn setup(coords: &str) -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let xyz = dir.path().join("all_coors.xyz");
        let pdb = dir.path().join("gly.pdb");
        fs::write(&xyz, coords).unwrap();
        fs::write(&pdb, TEMPLATE).unwrap();
        (dir, xyz, pdb)
    }

    const TWO_FRAMES: &str = "2\nf 1\nN 1.0 2.0 3.0\nC 4.0 5.0 6.0\n2\nf 2\nN 1.1 2.1 3.1\nC 4.1 5.1 6.1\n";

    #[test]
    fn multi_model_output_uses_template_name() {
        let (dir, xyz, pdb) = setup(TWO_FRAMES);
        let out = dir.path().join("traj.pdb");
        let config = ProjectConfig {
            framing: Framing::MultiModel,
            ..ProjectConfig::default()
        };

        let report = project_trajectory(&xyz, &pdb, &out, &config).unwrap();
        assert_eq!(report.frames, 2);
        assert_eq!(report.records, 4);

        let text = fs::read_to_string(&out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "GLY");
        assert_eq!(lines[1], "MODEL        1");
        assert_eq!(&lines[2][30..54], "1.0     2.0     3.0     ");
        assert_eq!(lines.last(), Some(&"END"));
        assert_eq!(text.matches("ENDMDL").count(), 2);
    }

    #[test]
    fn per_frame_output_writes_one_file_per_frame() {
        let (dir, xyz, pdb) = setup(TWO_FRAMES);
        let config = ProjectConfig {
            framing: Framing::PerFrame,
            ..ProjectConfig::default()
        };
        let report = project_trajectory(&xyz, &pdb, &dir.path().join("frame.pdb"), &config).unwrap();
        assert_eq!(
            report.outputs,
            vec![dir.path().join("frame_1.pdb"), dir.path().join("frame_2.pdb")]
        );
    }

    #[test]
    fn malformed_line_leaves_no_output() {
        let (dir, xyz, pdb) = setup("2\nf 1\nN 1.0 2.0 3.0\nC 4.0 5.0\n");
        let out = dir.path().join("traj.pdb");

        let err = project_trajectory(&xyz, &pdb, &out, &ProjectConfig::default()).unwrap_err();
        match err {
            Error::Io(IoError::Parse { line, text, .. }) => {
                assert_eq!(line, 4);
                assert_eq!(text, "C 4.0 5.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!out.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
