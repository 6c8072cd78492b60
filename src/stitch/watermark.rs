use crate::io::{Format, error::Error as IoError};
use crate::model::frame::Block;
use tracing::{debug, warn};

/// What happened to one run's blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Complete blocks read from the run.
    pub total: usize,
    /// Index of the first block beyond the watermark, if any.
    pub valid_start: Option<usize>,
    pub kept: usize,
    pub first_kept: Option<u64>,
    pub last_kept: Option<u64>,
    /// A trailing block cut short by end of input was discarded.
    pub truncated: bool,
}

impl RunReport {
    pub fn dropped(&self) -> usize {
        self.total - self.kept
    }
}

/// Drops frames a restarted run repeats from earlier runs.
///
/// The watermark is the frame number of the last block kept so far. Each
/// run keeps its blocks from the first one numbered above the watermark;
/// since numbers strictly increase within a run, everything after that block
/// is kept too.
#[derive(Debug, Clone, Default)]
pub struct Stitcher {
    watermark: u64,
}

impl Stitcher {
    pub fn new(watermark: u64) -> Self {
        Self { watermark }
    }

    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// Streams one run's blocks, handing every retained block to `keep` in
    /// order.
    ///
    /// A block whose frame number does not increase on its predecessor is a
    /// parse error at its title line. A truncated trailing block is
    /// discarded with a warning. When nothing in the run clears the
    /// watermark, the watermark stays where it was.
    pub fn stitch_run<I, F, E>(&mut self, blocks: I, mut keep: F) -> Result<RunReport, E>
    where
        I: IntoIterator<Item = Result<Block, IoError>>,
        F: FnMut(&Block) -> Result<(), E>,
        E: From<IoError>,
    {
        let mut report = RunReport::default();
        let mut previous: Option<u64> = None;

        for item in blocks {
            let block = match item {
                Ok(block) => block,
                Err(IoError::IncompleteBlock {
                    line,
                    expected,
                    found,
                    ..
                }) => {
                    warn!(line, expected, found, "discarding truncated trailing block");
                    report.truncated = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(prev) = previous {
                if block.frame_number <= prev {
                    return Err(IoError::parse(
                        Format::Xyz,
                        block.first_line + 1,
                        format!(
                            "frame number {} does not increase on previous frame {prev}",
                            block.frame_number
                        ),
                        block.title(),
                    )
                    .into());
                }
            }
            previous = Some(block.frame_number);

            let index = report.total;
            report.total += 1;

            if report.valid_start.is_none() {
                if block.frame_number <= self.watermark {
                    continue;
                }
                debug!(index, frame = block.frame_number, "run resumes past watermark");
                report.valid_start = Some(index);
                report.first_kept = Some(block.frame_number);
            }

            keep(&block)?;
            report.kept += 1;
            report.last_kept = Some(block.frame_number);
        }

        if let Some(last) = report.last_kept {
            self.watermark = last;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(frames: &[u64]) -> Vec<Result<Block, IoError>> {
        frames
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                Ok(Block::new(
                    f,
                    i * 3 + 1,
                    vec![
                        "1\n".to_string(),
                        format!("frame 0 {f}\n"),
                        format!("C 0 0 {f}\n"),
                    ],
                ))
            })
            .collect()
    }

    fn stitch(stitcher: &mut Stitcher, frames: &[u64]) -> (RunReport, Vec<u64>) {
        let mut kept = Vec::new();
        let report = stitcher
            .stitch_run(run(frames), |b| {
                kept.push(b.frame_number);
                Ok::<_, IoError>(())
            })
            .unwrap();
        (report, kept)
    }

    #[test]
    fn overlapping_restart_keeps_only_new_frames() {
        let mut stitcher = Stitcher::default();
        let (a, kept_a) = stitch(&mut stitcher, &[1, 2, 3, 4, 5]);
        assert_eq!(a.valid_start, Some(0));
        assert_eq!(stitcher.watermark(), 5);

        let (b, kept_b) = stitch(&mut stitcher, &[3, 4, 5, 6, 7]);
        assert_eq!(b.valid_start, Some(3));
        assert_eq!(b.kept, 2);
        assert_eq!(b.dropped(), 3);
        assert_eq!(b.first_kept, Some(6));
        assert_eq!(stitcher.watermark(), 7);

        let all: Vec<_> = kept_a.into_iter().chain(kept_b).collect();
        assert_eq!(all, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn restitching_stitched_output_is_a_no_op() {
        let frames = [1, 2, 3, 4, 5, 6, 7];
        let (report, kept) = stitch(&mut Stitcher::default(), &frames);
        assert_eq!(report.kept, frames.len());
        assert_eq!(kept, frames);
    }

    #[test]
    fn run_entirely_below_watermark_is_dropped() {
        let mut stitcher = Stitcher::new(10);
        let (report, kept) = stitch(&mut stitcher, &[4, 5, 6]);
        assert!(kept.is_empty());
        assert_eq!(report.valid_start, None);
        assert_eq!(report.total, 3);
        assert_eq!(stitcher.watermark(), 10);
    }

    #[test]
    fn non_increasing_frame_is_parse_error_at_title() {
        let mut stitcher = Stitcher::default();
        let err = stitcher
            .stitch_run(run(&[1, 3, 2]), |_| Ok::<_, IoError>(()))
            .unwrap_err();
        match err {
            IoError::Parse { line, text, .. } => {
                assert_eq!(line, 8);
                assert_eq!(text, "frame 0 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncated_tail_is_discarded() {
        let mut blocks = run(&[1, 2]);
        blocks.push(Err(IoError::incomplete(Format::Xyz, 7, 3, 2)));
        let mut stitcher = Stitcher::default();
        let report = stitcher
            .stitch_run(blocks, |_| Ok::<_, IoError>(()))
            .unwrap();
        assert!(report.truncated);
        assert_eq!(report.kept, 2);
        assert_eq!(stitcher.watermark(), 2);
    }
}
