use super::framing::FrameSink;
use crate::io::{Format, error::Error};
use crate::model::frame::{AtomCoords, Block, Frame};
use crate::model::template::Template;
use serde::Deserialize;
use std::io::Write;
use tracing::warn;

/// First byte of the coordinate columns in a template record.
pub const COORD_START: usize = 30;
/// One past the last byte of the coordinate columns.
pub const COORD_END: usize = 54;
/// Width of each of the x, y, z text fields.
pub const FIELD_WIDTH: usize = 6;

const FIELD_GAP: &[u8] = b"  ";

/// What to do with a coordinate token wider than [`FIELD_WIDTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    #[default]
    Fail,
    Truncate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    pub frames: usize,
    pub records: usize,
    pub truncated: usize,
}

/// Writes template records with their coordinate columns replaced by each
/// frame's coordinate text.
///
/// Bytes `[0, 30)` and everything from byte 54 on are copied from the
/// template record; `[30, 54)` becomes three 6-character left-justified
/// fields, each followed by two spaces. Coordinates are never reparsed as
/// numbers.
pub struct Projector<'t> {
    template: &'t Template,
    overflow: OverflowPolicy,
    report: ProjectionReport,
}

impl<'t> Projector<'t> {
    pub fn new(template: &'t Template) -> Self {
        Self {
            template,
            overflow: OverflowPolicy::default(),
            report: ProjectionReport::default(),
        }
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    pub fn report(&self) -> &ProjectionReport {
        &self.report
    }

    pub fn project<I, S>(&mut self, blocks: I, sink: &mut S) -> Result<ProjectionReport, Error>
    where
        I: IntoIterator<Item = Result<Block, Error>>,
        S: FrameSink + ?Sized,
    {
        for (index, block) in blocks.into_iter().enumerate() {
            let block = block?;
            sink.begin_frame(index)?;
            self.project_block(&block, sink.writer())?;
            sink.end_frame(index)?;
        }
        sink.finish()?;
        Ok(self.report.clone())
    }

    pub fn project_block<W: Write + ?Sized>(
        &mut self,
        block: &Block,
        out: &mut W,
    ) -> Result<(), Error> {
        let template = self.template;
        if block.atom_count() != template.atom_count() {
            return Err(Error::AtomCountMismatch {
                line: block.first_line,
                expected: template.atom_count(),
                found: block.atom_count(),
            });
        }

        let frame = parse_frame(block)?;
        let first_atom_line = block.first_line + 2;
        for (i, (atom, record)) in frame.atoms.iter().zip(&template.records).enumerate() {
            let coords = [atom.x.as_str(), atom.y.as_str(), atom.z.as_str()];
            let projected = self.project_record(record, coords, first_atom_line + i)?;
            out.write_all(&projected)?;
            out.write_all(b"\n")?;
        }

        self.report.frames += 1;
        self.report.records += frame.atom_count();
        Ok(())
    }

    pub fn project_record(
        &mut self,
        record: &str,
        coords: [&str; 3],
        line: usize,
    ) -> Result<Vec<u8>, Error> {
        let bytes = record.as_bytes();
        let mut out = Vec::with_capacity(bytes.len().max(COORD_END));

        out.extend_from_slice(&bytes[..bytes.len().min(COORD_START)]);
        out.resize(COORD_START, b' ');

        for token in coords {
            let field = self.fit_field(token, line)?;
            out.extend_from_slice(format!("{field:<FIELD_WIDTH$}").as_bytes());
            out.extend_from_slice(FIELD_GAP);
        }

        if let Some(suffix) = bytes.get(COORD_END..) {
            out.extend_from_slice(suffix);
        }
        Ok(out)
    }

    fn fit_field<'a>(&mut self, token: &'a str, line: usize) -> Result<&'a str, Error> {
        let Some((cut, _)) = token.char_indices().nth(FIELD_WIDTH) else {
            return Ok(token);
        };

        match self.overflow {
            OverflowPolicy::Fail => Err(Error::FieldOverflow {
                line,
                token: token.to_string(),
                width: FIELD_WIDTH,
            }),
            OverflowPolicy::Truncate => {
                if self.report.truncated == 0 {
                    warn!(line, token, "coordinate wider than {FIELD_WIDTH} characters truncated");
                }
                self.report.truncated += 1;
                Ok(&token[..cut])
            }
        }
    }
}

/// Splits every atom line of a block into exactly four tokens.
pub(crate) fn parse_frame(block: &Block) -> Result<Frame, Error> {
    let atoms = block
        .atom_lines()
        .map(|(line, text)| {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            match tokens.as_slice() {
                [element, x, y, z] => Ok(AtomCoords {
                    element: element.to_string(),
                    x: x.to_string(),
                    y: y.to_string(),
                    z: z.to_string(),
                }),
                _ => Err(Error::parse(
                    Format::Xyz,
                    line,
                    format!(
                        "expected 4 whitespace-separated tokens (element x y z), found {}",
                        tokens.len()
                    ),
                    text,
                )),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Frame {
        frame_number: block.frame_number,
        atoms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::pdb::FlatSink;

    const REC_N: &str =
        "ATOM      1  N   GLY A   1    -0.966  0.493   1.500   1.00  0.00           N";
    const REC_C: &str =
        "ATOM      2  CA  GLY A   1    0.257   0.418   0.692   1.00  0.00           C";

    fn template() -> Template {
        Template::new(Some("GLY".into()), vec![REC_N.into(), REC_C.into()])
    }

    fn block(first_line: usize, atoms: &[&str]) -> Block {
        let mut lines = vec![format!("{}\n", atoms.len()), "frame 0 1\n".to_string()];
        lines.extend(atoms.iter().map(|a| format!("{a}\n")));
        Block::new(1, first_line, lines)
    }

    #[test]
    fn replaces_only_coordinate_columns() {
        let tpl = template();
        let mut projector = Projector::new(&tpl);
        let out = projector
            .project_record(REC_N, ["1.25", "-2.5", "10.125"], 3)
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(&out[..COORD_START], &REC_N[..COORD_START]);
        assert_eq!(&out[COORD_START..COORD_END], "1.25    -2.5    10.125  ");
        assert_eq!(&out[COORD_END..], &REC_N[COORD_END..]);
    }

    #[test]
    fn projecting_template_coordinates_reproduces_template() {
        let tpl = template();
        let mut projector = Projector::new(&tpl);
        let blk = block(1, &["N -0.966 0.493 1.500", "C 0.257 0.418 0.692"]);

        let mut buf = Vec::new();
        projector.project_block(&blk, &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines, vec![REC_N, REC_C]);
    }

    #[test]
    fn pads_short_records_to_coordinate_columns() {
        let tpl = template();
        let mut projector = Projector::new(&tpl);
        let out = projector
            .project_record("ATOM      1", ["1.0", "2.0", "3.0"], 3)
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.len(), COORD_END);
        assert_eq!(&out[..COORD_START], format!("{:<30}", "ATOM      1"));
        assert_eq!(&out[COORD_START..COORD_START + 8], "1.0     ");
    }

    #[test]
    fn three_token_line_reports_line_number_and_text() {
        let tpl = template();
        let mut projector = Projector::new(&tpl);
        let blk = block(10, &["N -0.966 0.493 1.500", "C 0.257 0.418"]);

        let err = projector.project_block(&blk, &mut Vec::new()).unwrap_err();
        match err {
            Error::Parse { line, text, .. } => {
                assert_eq!(line, 13);
                assert_eq!(text, "C 0.257 0.418");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wide_token_fails_by_default() {
        let tpl = template();
        let mut projector = Projector::new(&tpl);
        let err = projector
            .project_record(REC_N, ["-0.9661234", "0.493", "1.5"], 7)
            .unwrap_err();
        assert!(matches!(err, Error::FieldOverflow { line: 7, .. }));
    }

    #[test]
    fn wide_token_truncates_when_allowed() {
        let tpl = template();
        let mut projector = Projector::new(&tpl).overflow(OverflowPolicy::Truncate);
        let out = projector
            .project_record(REC_N, ["-0.9661234", "0.493", "1.5"], 7)
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(&out[COORD_START..COORD_START + 6], "-0.966");
        assert_eq!(projector.report().truncated, 1);
    }

    #[test]
    fn atom_count_must_match_template() {
        let tpl = template();
        let mut projector = Projector::new(&tpl);
        let blk = block(1, &["N 0 0 0"]);
        let err = projector.project_block(&blk, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::AtomCountMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn project_streams_frames_through_sink() {
        let tpl = template();
        let mut projector = Projector::new(&tpl);
        let blocks = vec![
            Ok(block(1, &["N 1 1 1", "C 2 2 2"])),
            Ok(block(5, &["N 3 3 3", "C 4 4 4"])),
        ];
        let mut sink = FlatSink::new(Vec::new());
        let report = projector.project(blocks, &mut sink).unwrap();

        assert_eq!(report.frames, 2);
        assert_eq!(report.records, 4);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().filter(|l| *l == "END").count(), 2);
    }
}
