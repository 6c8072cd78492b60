use super::error::Error;
use super::report::Exclusion;
use crate::io::{AtomicFile, Format, error::Error as IoError, util};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub atom_count: usize,
    pub sections: usize,
    pub kept: usize,
    pub exclusions: Vec<Exclusion>,
    pub output: Option<PathBuf>,
}

impl IntegrityReport {
    pub fn incomplete(&self) -> usize {
        self.sections - self.kept
    }
}

struct Section {
    start: usize,
    lines: Vec<String>,
}

/// Copies the well-formed sections of a concatenated coordinate stream.
///
/// A line whose trimmed content equals the atom-count token opens a new
/// section. A finished section is written only when it holds exactly
/// `atom_count + 2` lines; trailing blank lines do not count. Anything before
/// the first delimiter is an incomplete section of its own. When
/// `atom_count` is `None` it is read from the first line.
pub fn filter_sections<R: BufRead, W: Write + ?Sized>(
    mut reader: R,
    out: &mut W,
    atom_count: Option<usize>,
) -> Result<IntegrityReport, Error> {
    let Some(first) = util::read_line(&mut reader)? else {
        return Ok(IntegrityReport::default());
    };

    let atom_count = match atom_count {
        Some(n) => n,
        None => first
            .trim()
            .parse::<usize>()
            .map_err(|_| IoError::parse(Format::Xyz, 1, "expected an atom count", &first))?,
    };
    let token = atom_count.to_string();
    let expected = atom_count + 2;

    let mut report = IntegrityReport {
        atom_count,
        ..IntegrityReport::default()
    };
    let mut section = Section {
        start: 1,
        lines: Vec::with_capacity(expected),
    };
    let mut line_no = 0;
    let mut next = Some(first);

    while let Some(line) = next {
        line_no += 1;
        if line.trim() == token {
            let finished = std::mem::replace(
                &mut section,
                Section {
                    start: line_no,
                    lines: Vec::with_capacity(expected),
                },
            );
            flush(finished, &token, expected, out, &mut report)?;
        }
        section.lines.push(line);
        next = util::read_line(&mut reader)?;
    }
    flush(section, &token, expected, out, &mut report)?;

    Ok(report)
}

fn flush<W: Write + ?Sized>(
    mut section: Section,
    token: &str,
    expected: usize,
    out: &mut W,
    report: &mut IntegrityReport,
) -> Result<(), Error> {
    while section.lines.last().is_some_and(|l| l.trim().is_empty()) {
        section.lines.pop();
    }
    if section.lines.is_empty() {
        return Ok(());
    }

    report.sections += 1;
    let delimited = section.lines[0].trim() == token;
    if delimited && section.lines.len() == expected {
        for line in &section.lines {
            out.write_all(line.as_bytes())?;
        }
        report.kept += 1;
    } else {
        warn!(
            line = section.start,
            expected,
            found = section.lines.len(),
            "discarding incomplete section"
        );
        report.exclusions.push(Exclusion::IncompleteSection {
            line: section.start,
            expected,
            found: section.lines.len(),
        });
    }
    Ok(())
}

/// Runs [`filter_sections`] from `input` into `output`, committing the
/// output only when the whole input was read.
pub fn clean_sections(
    input: &Path,
    output: &Path,
    atom_count: Option<usize>,
) -> Result<IntegrityReport, Error> {
    if !input.is_file() {
        return Err(Error::missing_input(input));
    }
    let reader = BufReader::new(File::open(input)?);
    let mut out = AtomicFile::create(output)?;
    let mut report = filter_sections(reader, &mut out, atom_count)?;
    report.output = Some(out.commit()?);
    info!(
        kept = report.kept,
        incomplete = report.incomplete(),
        output = %output.display(),
        "filtered sections"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn section(frame: u64) -> String {
        format!("2\nframe 0 {frame}\nC 0 0 0\nH 0 0 1\n")
    }

    fn run(input: &str, atom_count: Option<usize>) -> (IntegrityReport, String) {
        let mut out = Vec::new();
        let report = filter_sections(Cursor::new(input), &mut out, atom_count).unwrap();
        (report, String::from_utf8(out).unwrap())
    }

    #[test]
    fn keeps_complete_sections() {
        let input = format!("{}{}", section(1), section(2));
        let (report, out) = run(&input, None);
        assert_eq!(out, input);
        assert_eq!(report.kept, 2);
        assert_eq!(report.incomplete(), 0);
    }

    #[test]
    fn drops_short_section_in_the_middle() {
        let input = format!("{}2\nframe 0 2\nC 0 0 0\n{}", section(1), section(3));
        let (report, out) = run(&input, None);
        assert_eq!(out, format!("{}{}", section(1), section(3)));
        assert_eq!(report.sections, 3);
        assert!(matches!(
            report.exclusions.as_slice(),
            [Exclusion::IncompleteSection {
                line: 5,
                expected: 4,
                found: 3
            }]
        ));
    }

    #[test]
    fn checks_the_final_section() {
        let input = format!("{}2\nframe 0 2\n", section(1));
        let (report, out) = run(&input, None);
        assert_eq!(out, section(1));
        assert_eq!(report.incomplete(), 1);
    }

    #[test]
    fn trailing_blank_lines_are_ignored() {
        let input = format!("{}\n\n", section(1));
        let (report, out) = run(&input, None);
        assert_eq!(out, section(1));
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn supplied_count_overrides_first_line() {
        let input = format!("garbage\n{}", section(1));
        let (report, out) = run(&input, Some(2));
        assert_eq!(out, section(1));
        assert_eq!(report.incomplete(), 1);
    }

    #[test]
    fn clean_sections_writes_output_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("all_coors.xyz");
        let output = dir.path().join("all_coors_clean.xyz");
        std::fs::write(&input, format!("{}2\nframe 0 2\n", section(1))).unwrap();

        let report = clean_sections(&input, &output, None).unwrap();
        assert_eq!(report.output.as_deref(), Some(output.as_path()));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), section(1));
    }
}
