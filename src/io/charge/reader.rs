use crate::io::{Format, error::Error, util};
use crate::model::charge::ChargeRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reader over a tab-separated charge file: one header row, then one row
/// per frame.
pub struct ChargeReader<R> {
    reader: R,
    header: ChargeRecord,
    line: usize,
}

impl<R: BufRead> ChargeReader<R> {
    pub fn new(mut reader: R) -> Result<Self, Error> {
        let header = util::read_line(&mut reader)?
            .ok_or_else(|| Error::parse(Format::Charge, 1, "missing header row", ""))?;
        Ok(Self {
            reader,
            header: ChargeRecord::new(1, header),
            line: 1,
        })
    }

    pub fn header(&self) -> &ChargeRecord {
        &self.header
    }
}

impl<R: BufRead> Iterator for ChargeReader<R> {
    type Item = Result<ChargeRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match util::read_line(&mut self.reader) {
                Ok(Some(text)) => {
                    self.line += 1;
                    if text.trim().is_empty() {
                        continue;
                    }
                    Some(Ok(ChargeRecord::new(self.line, text)))
                }
                Ok(None) => None,
                Err(e) => Some(Err(e.into())),
            };
        }
    }
}

pub fn open(path: &Path) -> Result<ChargeReader<BufReader<File>>, Error> {
    ChargeReader::new(BufReader::new(File::open(path)?))
}
