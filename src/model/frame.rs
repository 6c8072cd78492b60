use std::io::Write;

/// Raw text of one frame in a coordinate file.
///
/// A block spans the atom-count line, the title line and one line per atom.
/// Lines are stored verbatim, each terminated by `\n`, so that writing a
/// block back out reproduces its input bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub frame_number: u64,
    /// 1-based line number of the atom-count line in the source file.
    pub first_line: usize,
    pub lines: Vec<String>,
}

impl Block {
    pub fn new(frame_number: u64, first_line: usize, lines: Vec<String>) -> Self {
        Self {
            frame_number,
            first_line,
            lines,
        }
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.lines.len().saturating_sub(2)
    }

    pub fn title(&self) -> &str {
        self.lines
            .get(1)
            .map(|l| l.trim_end_matches(['\r', '\n']))
            .unwrap_or("")
    }

    pub fn atom_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        let start = self.first_line + 2;
        self.lines
            .iter()
            .skip(2)
            .enumerate()
            .map(move |(i, l)| (start + i, l.trim_end_matches(['\r', '\n'])))
    }

    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.lines
            .first()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .is_some_and(|n| n + 2 == self.lines.len())
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        for line in &self.lines {
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }
}

/// Coordinate tokens of a single atom, kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomCoords {
    pub element: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_number: u64,
    pub atoms: Vec<AtomCoords>,
}

impl Frame {
    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block::new(
            7,
            11,
            vec![
                "2\n".into(),
                "frame 7 xyz\n".into(),
                "C 0.000 1.000 2.000\n".into(),
                "O 1.500 1.000 2.000\n".into(),
            ],
        )
    }

    #[test]
    fn reports_counts_and_title() {
        let block = sample_block();
        assert_eq!(block.line_count(), 4);
        assert_eq!(block.atom_count(), 2);
        assert_eq!(block.title(), "frame 7 xyz");
        assert!(block.is_well_formed());
    }

    #[test]
    fn atom_lines_carry_source_line_numbers() {
        let block = sample_block();
        let lines: Vec<_> = block.atom_lines().collect();
        assert_eq!(lines[0], (13, "C 0.000 1.000 2.000"));
        assert_eq!(lines[1], (14, "O 1.500 1.000 2.000"));
    }

    #[test]
    fn detects_short_block() {
        let mut block = sample_block();
        block.lines.pop();
        assert!(!block.is_well_formed());
    }

    #[test]
    fn write_to_reproduces_bytes() {
        let block = sample_block();
        let mut buf = Vec::new();
        block.write_to(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "2\nframe 7 xyz\nC 0.000 1.000 2.000\nO 1.500 1.000 2.000\n"
        );
    }
}
