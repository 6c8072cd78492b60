use std::io::{self, Write};

use anyhow::Error;
use traj_stitch::StitchError;
use traj_stitch::io::{Error as IoError, Format};

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    if let Some(hints) = HintCollector::collect(err) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

/// Hints for one failed unit of a batch, for log output.
pub fn unit_hints(err: &StitchError) -> Vec<String> {
    let mut collector = HintCollector::new();
    collector.collect_stitch_hints(err);
    collector.hints
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn new() -> Self {
        Self {
            hints: Vec::new(),
            has_typed_hints: false,
        }
    }

    fn collect(err: &Error) -> Option<Vec<String>> {
        let mut collector = Self::new();

        for cause in err.chain() {
            if let Some(stitch_err) = cause.downcast_ref::<StitchError>() {
                collector.mark_typed();
                collector.collect_stitch_hints(stitch_err);
                break;
            }
            if let Some(io_err) = cause.downcast_ref::<IoError>() {
                collector.mark_typed();
                collector.collect_io_hints(io_err);
                break;
            }
        }

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        if collector.hints.is_empty() {
            None
        } else {
            Some(collector.hints)
        }
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_stitch_hints(&mut self, err: &StitchError) {
        match err {
            StitchError::Io(io_err) => self.collect_io_hints(io_err),

            StitchError::StructuralMismatch { unit, .. } => {
                self.add(format!("Coordinate and charge data of {} do not line up", unit));
                self.add("Check that every run wrote one charge row per coordinate frame");
                self.add("A run killed mid-write may need its trailing frames removed");
            }

            StitchError::MissingInput { path } => {
                self.add(format!("Nothing to process at {}", path.display()));
                self.add("Check the directory layout and the --run-prefix / file name options");
            }

            StitchError::PrunedRuns { .. } => {
                self.add("Rerun with --resume to append to the existing outputs");
                self.add("Remove the .state.toml file next to the outputs to stitch the remaining runs from scratch");
            }

            StitchError::InvalidJobRange { .. } => {
                self.add("--step must be positive and --first must be below --last");
                self.add("Job directories are visited as first, first + step, ... below last");
            }

            StitchError::InvalidConfig(_) => {
                self.add("Review the settings file and command-line options");
            }

            StitchError::Toml(_) => {
                self.add("The settings or state file has invalid TOML");
                self.add("Check for unknown keys, missing quotes or wrong value types");
                self.add("A stale state file can be removed to stitch from scratch");
            }

            StitchError::StateEncode(_) => {
                self.add("Reconciliation state could not be written");
                self.add("The outputs were committed; rerun without --resume if in doubt");
            }
        }
    }

    fn collect_io_hints(&mut self, err: &IoError) {
        match err {
            IoError::Io { source } => self.collect_std_io_hints(source),

            IoError::Parse { format, line, .. } => {
                self.add(format!(
                    "Parser encountered an issue near line {} in {} data",
                    line, format
                ));
                self.add("Inspect the file around that line for malformed entries");
                self.add_format_specific_parse_hints(*format);
            }

            IoError::IncompleteBlock { line, .. } => {
                self.add(format!("The frame starting at line {} is cut short", line));
                self.add("Run `tstitch clean` to drop incomplete frames first");
            }

            IoError::FieldOverflow { width, .. } => {
                self.add(format!(
                    "A coordinate does not fit the {}-character PDB field",
                    width
                ));
                self.add("Use --overflow truncate to cut long tokens with a warning");
            }

            IoError::AtomCountMismatch { .. } => {
                self.add("The trajectory and the template describe different systems");
                self.add("Check that the template matches the simulated structure");
            }
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }

            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }

            ErrorKind::InvalidData => {
                self.add("File contains invalid or corrupt data");
                self.add("Verify the file is plain text and not truncated");
            }

            ErrorKind::WriteZero | ErrorKind::StorageFull => {
                self.add("Failed to write data (disk full?)");
                self.add("Check available disk space");
            }

            _ => {
                self.add("I/O operation failed");
                self.add("Check file path, permissions, and disk space");
            }
        }
    }

    fn add_format_specific_parse_hints(&mut self, format: Format) {
        match format {
            Format::Xyz => {
                self.add("XYZ: each frame is an atom count, a title, then one line per atom");
                self.add("XYZ: atom lines need an element and three coordinates");
                self.add("XYZ: use --frame-field or --sequential if titles hold no frame number");
            }

            Format::Charge => {
                self.add("Charge tables are tab separated with one header row");
            }

            Format::Pdb => {
                self.add("PDB: Check ATOM/HETATM record formatting (columns 1-80)");
            }
        }
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("Check that the file path is correct");
            self.add("Verify the file exists and is readable");
            return;
        }

        if msg.contains("permission denied") {
            self.add("Check file permissions with `ls -la`");
            self.add("Ensure you have the required access rights");
            return;
        }

        if msg.contains("residue") {
            self.add("Residue lists look like 1-4,6,8-10");
        }
    }
}

fn error_chain_text(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}
