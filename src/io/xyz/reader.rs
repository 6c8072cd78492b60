use crate::io::{Format, error::Error, util};
use crate::model::frame::Block;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Zero-based whitespace field of the title line that holds the frame number.
pub const DEFAULT_FRAME_FIELD: usize = 2;

/// How blocks are assigned a frame number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameNumbering {
    /// Parse the given whitespace field of the title line.
    Title { field: usize },
    /// Number blocks 1, 2, 3, ... in file order.
    Sequential,
}

impl Default for FrameNumbering {
    fn default() -> Self {
        Self::Title {
            field: DEFAULT_FRAME_FIELD,
        }
    }
}

/// Lazy, single-pass reader over the frame blocks of a coordinate stream.
///
/// Each item is one [`Block`]. The first error ends the iteration: a count
/// line or title without a usable number, an I/O failure, or a block cut
/// short by end of input.
pub struct BlockReader<R> {
    reader: R,
    numbering: FrameNumbering,
    expected_atoms: Option<usize>,
    line: usize,
    ordinal: u64,
    done: bool,
}

impl<R: BufRead> BlockReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            numbering: FrameNumbering::default(),
            expected_atoms: None,
            line: 0,
            ordinal: 0,
            done: false,
        }
    }

    pub fn numbering(mut self, numbering: FrameNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn expect_atoms(mut self, atom_count: Option<usize>) -> Self {
        self.expected_atoms = atom_count;
        self
    }

    fn next_line(&mut self) -> Result<Option<String>, Error> {
        let line = util::read_line(&mut self.reader)?;
        if line.is_some() {
            self.line += 1;
        }
        Ok(line)
    }

    fn read_block(&mut self) -> Result<Option<Block>, Error> {
        let count_line = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(l) if l.trim().is_empty() => continue,
                Some(l) => break l,
            }
        };
        let first_line = self.line;

        let atom_count = count_line.trim().parse::<usize>().map_err(|_| {
            Error::parse(Format::Xyz, first_line, "expected an atom count", &count_line)
        })?;
        if let Some(expected) = self.expected_atoms {
            if atom_count != expected {
                return Err(Error::parse(
                    Format::Xyz,
                    first_line,
                    format!("block declares {atom_count} atoms, expected {expected}"),
                    &count_line,
                ));
            }
        }

        let expected_lines = atom_count + 2;
        let mut lines = Vec::with_capacity(expected_lines);
        lines.push(count_line);
        while lines.len() < expected_lines {
            match self.next_line()? {
                Some(l) => lines.push(l),
                None => {
                    return Err(Error::incomplete(
                        Format::Xyz,
                        first_line,
                        expected_lines,
                        lines.len(),
                    ));
                }
            }
        }

        self.ordinal += 1;
        let frame_number = match self.numbering {
            FrameNumbering::Sequential => self.ordinal,
            FrameNumbering::Title { field } => {
                let parsed = lines[1]
                    .split_whitespace()
                    .nth(field)
                    .and_then(|tok| tok.parse::<u64>().ok());
                match parsed {
                    Some(n) => n,
                    None => {
                        return Err(Error::parse(
                            Format::Xyz,
                            first_line + 1,
                            format!("missing or non-numeric frame number in title field {field}"),
                            &lines[1],
                        ));
                    }
                }
            }
        };

        Ok(Some(Block::new(frame_number, first_line, lines)))
    }
}

impl<R: BufRead> Iterator for BlockReader<R> {
    type Item = Result<Block, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub fn open(path: &Path) -> Result<BlockReader<BufReader<File>>, Error> {
    Ok(BlockReader::new(BufReader::new(File::open(path)?)))
}

/// Reads the atom count from the first line of a coordinate file.
pub fn read_atom_count(path: &Path) -> Result<usize, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let line = util::read_line(&mut reader)?.unwrap_or_default();
    line.trim()
        .parse::<usize>()
        .map_err(|_| Error::parse(Format::Xyz, 1, "expected an atom count", &line))
}
