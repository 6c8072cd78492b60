use crate::io::{Format, error::Error};
use crate::model::template::Template;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Collects the `ATOM`/`HETATM` records of a fixed-width structure file.
///
/// Records are kept byte-for-byte apart from the line terminator; every other
/// line (headers, `TER`, `END`, `CONECT`) is ignored.
pub fn read_template<R: BufRead>(reader: R, name: Option<String>) -> Result<Template, Error> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.starts_with("ATOM") || line.starts_with("HETATM") {
            records.push(line.trim_end_matches('\r').to_string());
        }
    }

    if records.is_empty() {
        return Err(Error::parse(
            Format::Pdb,
            1,
            "template contains no ATOM or HETATM records",
            "",
        ));
    }

    Ok(Template::new(name, records))
}

pub fn open_template(path: &Path) -> Result<Template, Error> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase());
    read_template(BufReader::new(File::open(path)?), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEMPLATE: &str = "\
REMARK generated
ATOM      1  N   GLY A   1      -0.966   0.493   1.500  1.00  0.00           N
ATOM      2  CA  GLY A   1       0.257   0.418   0.692  1.00  0.00           C
HETATM    3  O   HOH W   2       1.000   2.000   3.000  1.00  0.00           O
TER       4      HOH W   2
END
";

    #[test]
    fn keeps_only_atom_records() {
        let tpl = read_template(Cursor::new(TEMPLATE), Some("T".into())).unwrap();
        assert_eq!(tpl.atom_count(), 3);
        assert!(tpl.records[2].starts_with("HETATM"));
        assert_eq!(tpl.name.as_deref(), Some("T"));
    }

    #[test]
    fn strips_carriage_returns() {
        let tpl = read_template(Cursor::new("ATOM      1  N   GLY A   1\r\n"), None).unwrap();
        assert_eq!(tpl.records[0], "ATOM      1  N   GLY A   1");
    }

    #[test]
    fn rejects_template_without_atoms() {
        let err = read_template(Cursor::new("REMARK only\nEND\n"), None).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
