use super::error::Error;
use super::watermark::RunReport;
use crate::io::error::Error as IoError;
use crate::model::charge::ChargeRecord;
use tracing::warn;

/// How a run's charge rows were split by the coordinate decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChargeSlice {
    pub skipped: usize,
    pub taken: usize,
    /// Rows past the last kept frame with no coordinate block to match.
    pub surplus: usize,
}

/// Applies a run's keep/drop decision to its charge rows.
///
/// Charge rows carry no frame numbers, so row `i` (after the header) is
/// paired with block `i` of the same run. The first `valid_start` rows are
/// skipped and the next `kept` rows are passed to `emit`. Fewer rows than
/// that is a structural mismatch; extra rows are counted and ignored.
pub fn align_charges<I, F>(
    rows: I,
    run: &RunReport,
    unit: &str,
    mut emit: F,
) -> Result<ChargeSlice, Error>
where
    I: IntoIterator<Item = Result<ChargeRecord, IoError>>,
    F: FnMut(&ChargeRecord) -> Result<(), Error>,
{
    let skip = run.valid_start.unwrap_or(run.total);
    let end = skip + run.kept;
    let mut slice = ChargeSlice::default();

    for (index, row) in rows.into_iter().enumerate() {
        let row = row?;
        if index < skip {
            slice.skipped += 1;
        } else if index < end {
            emit(&row)?;
            slice.taken += 1;
        } else {
            slice.surplus += 1;
        }
    }

    if slice.taken < run.kept {
        return Err(Error::structural_mismatch(
            unit,
            format!(
                "{} coordinate frames kept from index {skip} but only {} charge rows available",
                run.kept,
                slice.skipped + slice.taken
            ),
        ));
    }
    if slice.surplus > 0 {
        warn!(
            unit,
            surplus = slice.surplus,
            "ignoring charge rows without a matching coordinate frame"
        );
    }
    Ok(slice)
}

/// Lets the first charge header through and swallows the rest.
#[derive(Debug, Clone, Default)]
pub struct HeaderGuard {
    header: Option<String>,
}

impl HeaderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a header that is already in the output.
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: Some(header.into()),
        }
    }

    /// Returns `true` when `header` is the first seen and must be written.
    pub fn admit(&mut self, header: &ChargeRecord, unit: &str) -> bool {
        match &self.header {
            None => {
                self.header = Some(header.content().to_string());
                true
            }
            Some(existing) => {
                if existing != header.content() {
                    warn!(unit, "charge header differs from the first one; keeping the first");
                }
                false
            }
        }
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Result<ChargeRecord, IoError>> {
        (0..n)
            .map(|i| Ok(ChargeRecord::new(i + 2, format!("0.{i}\t-0.{i}"))))
            .collect()
    }

    fn report(total: usize, valid_start: Option<usize>, kept: usize) -> RunReport {
        RunReport {
            total,
            valid_start,
            kept,
            ..RunReport::default()
        }
    }

    #[test]
    fn reuses_valid_start_as_row_offset() {
        let mut taken = Vec::new();
        let slice = align_charges(rows(5), &report(5, Some(3), 2), "scr.2", |row| {
            taken.push(row.line);
            Ok(())
        })
        .unwrap();

        assert_eq!(taken, vec![5, 6]);
        assert_eq!(
            slice,
            ChargeSlice {
                skipped: 3,
                taken: 2,
                surplus: 0
            }
        );
    }

    #[test]
    fn short_charge_file_is_structural_mismatch() {
        let err = align_charges(rows(4), &report(5, Some(3), 2), "scr.2", |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch { .. }));
    }

    #[test]
    fn surplus_rows_are_ignored() {
        let mut count = 0;
        let slice = align_charges(rows(6), &report(4, Some(0), 4), "scr.1", |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 4);
        assert_eq!(slice.surplus, 2);
    }

    #[test]
    fn dropped_run_takes_nothing() {
        let slice = align_charges(rows(3), &report(3, None, 0), "scr.3", |_| {
            panic!("no row should be emitted")
        })
        .unwrap();
        assert_eq!(slice.taken, 0);
        assert_eq!(slice.skipped, 3);
    }

    #[test]
    fn header_guard_admits_first_header_only() {
        let mut guard = HeaderGuard::new();
        let header = ChargeRecord::new(1, "0 N\t1 H");
        assert!(guard.admit(&header, "scr.1"));
        assert!(!guard.admit(&header, "scr.2"));
        assert!(!guard.admit(&ChargeRecord::new(1, "other"), "scr.3"));
        assert_eq!(guard.header(), Some("0 N\t1 H"));

        let mut resumed = HeaderGuard::with_header("0 N\t1 H");
        assert!(!resumed.admit(&header, "scr.4"));
    }
}
