use super::align::{ChargeSlice, HeaderGuard, align_charges};
use super::config::StitchConfig;
use super::discover::{discover_replicates, discover_runs, unit_name};
use super::error::Error;
use super::report::{Exclusion, UnitResult};
use super::state::ReconcileState;
use super::watermark::{RunReport, Stitcher};
use crate::io::{AtomicFile, charge, read_atom_count, xyz};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Run directory relative to the replicate.
    pub name: String,
    pub coords: RunReport,
    pub charges: ChargeSlice,
}

#[derive(Debug, Clone)]
pub struct ReplicateReport {
    pub name: String,
    pub runs: Vec<RunOutcome>,
    /// Frames written by this pass.
    pub frames: usize,
    /// Frames in the committed outputs, including earlier passes.
    pub total_frames: usize,
    pub watermark: u64,
    pub coords_path: PathBuf,
    pub charges_path: PathBuf,
    pub exclusions: Vec<Exclusion>,
    /// Scratch directories removed by the retention policy.
    pub removed: Vec<PathBuf>,
}

/// Stitches every run of one replicate into a reconciled coordinate file and
/// a frame-aligned charge file inside `root`.
///
/// Outputs are committed only when every run was read without a fatal
/// error. Runs missing either file, empty runs and runs with nothing past
/// the watermark are excluded and reported.
///
/// A fatal error leaves earlier outputs in place but marks them failed in the
/// state file, so [`merge_replicates`](super::merge_replicates) leaves the
/// unit out. Without `resume`, a pass is refused when runs an earlier pass
/// consumed have since been removed.
pub fn reconcile_replicate(root: &Path, config: &StitchConfig) -> Result<ReplicateReport, Error> {
    let name = unit_name(root);
    let _span = info_span!("replicate", name = %name).entered();

    let runs = discover_runs(root, &config.run_prefix, config.run_order)?;
    let coords_path = root.join(&config.output_coords);
    let state_path = ReconcileState::path_for(&coords_path);
    let saved = ReconcileState::load(&state_path)?;

    if !config.resume {
        if let Some(state) = &saved {
            let found: Vec<String> = runs.iter().map(|dir| run_name(root, dir)).collect();
            let pruned: Vec<String> = state
                .runs
                .iter()
                .filter(|run| !found.contains(run))
                .cloned()
                .collect();
            if !pruned.is_empty() {
                return Err(Error::PrunedRuns { unit: name, runs: pruned });
            }
        }
    }

    let previous = if config.resume {
        match &saved {
            Some(state) if state.frames > 0 => Some(state.clone()),
            _ => {
                info!("no committed reconciliation state found; starting from scratch");
                None
            }
        }
    } else {
        None
    };

    let mut report = stitch_runs(root, &name, &runs, config, previous).inspect_err(|err| {
        if coords_path.is_file() {
            warn!(error = %err, "marking earlier outputs as failed");
            if let Err(e) = ReconcileState::mark_failed(&state_path, saved, err.to_string()) {
                warn!(error = %e, "could not mark earlier outputs as failed");
            }
        }
    })?;

    report.removed = config.retention.apply(&runs)?;
    Ok(report)
}

fn run_name(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .unwrap_or(dir)
        .to_string_lossy()
        .into_owned()
}

fn stitch_runs(
    root: &Path,
    name: &str,
    runs: &[PathBuf],
    config: &StitchConfig,
    previous: Option<ReconcileState>,
) -> Result<ReplicateReport, Error> {
    let coords_path = root.join(&config.output_coords);
    let charges_path = root.join(&config.output_charges);
    let state_path = ReconcileState::path_for(&coords_path);

    let (mut coords_out, mut charges_out, mut guard) = match &previous {
        Some(_) => {
            let header = charge::open(&charges_path)?.header().content().to_string();
            (
                AtomicFile::append_to(&coords_path)?,
                AtomicFile::append_to(&charges_path)?,
                HeaderGuard::with_header(header),
            )
        }
        None => (
            AtomicFile::create(&coords_path)?,
            AtomicFile::create(&charges_path)?,
            HeaderGuard::new(),
        ),
    };

    let atom_count = match config.atom_count {
        Some(n) => Some(n),
        None => runs
            .iter()
            .map(|dir| dir.join(&config.coords_name))
            .find(|path| path.metadata().is_ok_and(|m| m.is_file() && m.len() > 0))
            .map(|path| read_atom_count(&path))
            .transpose()?,
    };
    debug!(?atom_count, runs = runs.len(), "discovered runs");

    let mut stitcher = Stitcher::new(
        previous
            .as_ref()
            .map_or(config.initial_watermark, |s| s.watermark),
    );
    let mut outcomes = Vec::with_capacity(runs.len());
    let mut exclusions = Vec::new();
    let mut frames = 0;
    let mut rows = 0;

    for dir in runs {
        let run_name = run_name(root, dir);
        let coords = dir.join(&config.coords_name);
        let charges = dir.join(&config.charges_name);

        if let Some(missing) = [&coords, &charges].into_iter().find(|p| !p.is_file()) {
            warn!(run = %run_name, path = %missing.display(), "skipping run with missing input");
            exclusions.push(Exclusion::MissingInput {
                path: missing.clone(),
            });
            continue;
        }

        let watermark = stitcher.watermark();
        let blocks = xyz::open(&coords)?
            .numbering(config.numbering)
            .expect_atoms(atom_count);
        let report = stitcher.stitch_run(blocks, |block| -> Result<(), Error> {
            block.write_to(&mut coords_out)?;
            Ok(())
        })?;

        if report.total == 0 && !report.truncated {
            warn!(run = %run_name, "no frames in run; dropping it");
            exclusions.push(Exclusion::EmptyRun { path: coords });
            outcomes.push(RunOutcome {
                name: run_name,
                coords: report,
                charges: ChargeSlice::default(),
            });
            continue;
        }

        if report.kept == 0 {
            if previous.as_ref().is_some_and(|s| s.has_consumed(&run_name)) {
                debug!(run = %run_name, "run already consumed by an earlier pass");
            } else {
                warn!(run = %run_name, watermark, "no frame beyond watermark; dropping run");
                exclusions.push(Exclusion::OverlapResolutionFailure {
                    run: run_name.clone(),
                    watermark,
                });
            }
            outcomes.push(RunOutcome {
                name: run_name,
                coords: report,
                charges: ChargeSlice::default(),
            });
            continue;
        }

        let reader = charge::open(&charges)?;
        if guard.admit(reader.header(), &run_name) {
            reader.header().write_to(&mut charges_out)?;
        }
        let slice = align_charges(reader, &report, &run_name, |row| {
            row.write_to(&mut charges_out)?;
            Ok(())
        })?;

        info!(
            run = %run_name,
            total = report.total,
            valid_start = ?report.valid_start,
            kept = report.kept,
            "stitched run"
        );
        frames += report.kept;
        rows += slice.taken;
        outcomes.push(RunOutcome {
            name: run_name,
            coords: report,
            charges: slice,
        });
    }

    if outcomes.is_empty() {
        return Err(Error::missing_input(root.join(&config.coords_name)));
    }
    if frames != rows {
        return Err(Error::structural_mismatch(
            name,
            format!("{frames} coordinate frames but {rows} charge rows"),
        ));
    }

    let coords_path = coords_out.commit()?;
    let charges_path = charges_out.commit()?;

    let mut state = previous.unwrap_or_default();
    state.advance(
        stitcher.watermark(),
        frames,
        outcomes.iter().map(|o| o.name.clone()),
    );
    state.save(&state_path)?;
    info!(frames, watermark = state.watermark, "committed reconciled outputs");

    Ok(ReplicateReport {
        name: name.to_string(),
        runs: outcomes,
        frames,
        total_frames: state.frames,
        watermark: state.watermark,
        coords_path,
        charges_path,
        exclusions,
        removed: Vec::new(),
    })
}

/// Reconciles every replicate directory under `root` on a pool of
/// `threads` workers (0 uses every core).
///
/// Results come back in replicate name order; a failed replicate does not
/// stop the others.
pub fn reconcile_all(
    root: &Path,
    config: &StitchConfig,
    threads: usize,
) -> Result<Vec<UnitResult<ReplicateReport>>, Error> {
    let replicates = discover_replicates(root, &config.ignore)?;
    if replicates.is_empty() {
        return Err(Error::missing_input(root));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("cannot start worker pool: {e}")))?;

    Ok(pool.install(|| {
        replicates
            .par_iter()
            .map(|dir| UnitResult {
                unit: unit_name(dir),
                outcome: reconcile_replicate(dir, config),
            })
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stitch::retention::RetentionPolicy;
    use std::fs;
    use tempfile::TempDir;

    fn xyz(frames: impl IntoIterator<Item = u64>) -> String {
        frames
            .into_iter()
            .map(|f| format!("1\nframe 0 {f} fs\nC 0.0 0.0 {f}.0\n"))
            .collect()
    }

    fn charges(frames: impl IntoIterator<Item = u64>) -> String {
        let rows: String = frames
            .into_iter()
            .map(|f| format!("0.{f}\n"))
            .collect();
        format!("0 C\n{rows}")
    }

    fn write_run(root: &Path, name: &str, frames: std::ops::RangeInclusive<u64>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("coors.xyz"), xyz(frames.clone())).unwrap();
        fs::write(dir.join("charge.xls"), charges(frames)).unwrap();
    }

    #[test]
    fn overlapping_runs_stitch_into_one_series() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=5);
        write_run(rep.path(), "scr.2", 3..=7);

        let report = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();

        assert_eq!(report.frames, 7);
        assert_eq!(report.watermark, 7);
        assert_eq!(report.runs[1].coords.valid_start, Some(3));
        assert!(report.exclusions.is_empty());
        assert_eq!(fs::read_to_string(&report.coords_path).unwrap(), xyz(1..=7));
        assert_eq!(fs::read_to_string(&report.charges_path).unwrap(), charges(1..=7));
    }

    #[test]
    fn missing_charge_file_excludes_only_that_run() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=3);
        write_run(rep.path(), "scr.2", 4..=6);
        fs::remove_file(rep.path().join("scr.2/charge.xls")).unwrap();

        let report = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();
        assert_eq!(report.frames, 3);
        assert!(matches!(
            report.exclusions.as_slice(),
            [Exclusion::MissingInput { .. }]
        ));
    }

    #[test]
    fn fully_overlapped_run_is_reported() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=5);
        write_run(rep.path(), "scr.2", 2..=4);

        let report = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();
        assert_eq!(report.frames, 5);
        assert!(matches!(
            report.exclusions.as_slice(),
            [Exclusion::OverlapResolutionFailure { watermark: 5, .. }]
        ));
    }

    #[test]
    fn short_charge_file_fails_without_output() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=4);
        fs::write(rep.path().join("scr.1/charge.xls"), charges(1..=2)).unwrap();

        let err = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch { .. }));
        assert!(!rep.path().join("all_coors.xyz").exists());
        assert!(!rep.path().join("all_charges.xls").exists());
    }

    #[test]
    fn resume_appends_new_frames_only() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=5);
        reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();

        write_run(rep.path(), "scr.2", 4..=8);
        let config = StitchConfig {
            resume: true,
            ..StitchConfig::default()
        };
        let report = reconcile_replicate(rep.path(), &config).unwrap();

        assert_eq!(report.frames, 3);
        assert_eq!(report.total_frames, 8);
        assert!(report.exclusions.is_empty());
        assert_eq!(fs::read_to_string(&report.coords_path).unwrap(), xyz(1..=8));
        assert_eq!(fs::read_to_string(&report.charges_path).unwrap(), charges(1..=8));
    }

    #[test]
    fn keep_newest_prunes_older_runs_after_commit() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=2);
        write_run(rep.path(), "scr.2", 3..=4);
        let old = std::time::SystemTime::now() - std::time::Duration::from_secs(600);
        fs::File::open(rep.path().join("scr.1"))
            .unwrap()
            .set_modified(old)
            .unwrap();

        let config = StitchConfig {
            retention: RetentionPolicy::KeepNewest,
            ..StitchConfig::default()
        };
        let report = reconcile_replicate(rep.path(), &config).unwrap();
        assert_eq!(report.removed, vec![rep.path().join("scr.1")]);
        assert!(rep.path().join("scr.2").exists());
    }

    #[test]
    fn replicates_reconcile_independently_in_name_order() {
        let root = TempDir::new().unwrap();
        write_run(&root.path().join("B"), "scr.1", 1..=2);
        write_run(&root.path().join("A"), "scr.1", 1..=3);
        fs::create_dir(root.path().join("C")).unwrap();
        fs::create_dir(root.path().join("Analysis")).unwrap();

        let results = reconcile_all(root.path(), &StitchConfig::default(), 2).unwrap();
        let units: Vec<_> = results.iter().map(|r| r.unit.as_str()).collect();
        assert_eq!(units, vec!["A", "B", "C"]);
        assert_eq!(results[0].outcome.as_ref().unwrap().frames, 3);
        assert_eq!(results[1].outcome.as_ref().unwrap().frames, 2);
        assert!(matches!(
            results[2].outcome,
            Err(Error::MissingInput { .. })
        ));
    }

    #[test]
    fn empty_coordinate_file_is_reported_as_empty_run() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=3);
        write_run(rep.path(), "scr.2", 4..=5);
        fs::write(rep.path().join("scr.2/coors.xyz"), "").unwrap();

        let report = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();
        assert_eq!(report.frames, 3);
        assert_eq!(
            report.exclusions,
            vec![Exclusion::EmptyRun {
                path: rep.path().join("scr.2/coors.xyz"),
            }]
        );
    }

    #[test]
    fn failed_pass_marks_earlier_outputs() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=2);
        let first = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();
        let committed = fs::read(&first.coords_path).unwrap();

        fs::write(rep.path().join("scr.1/coors.xyz"), xyz(1..=4)).unwrap();
        let err = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch { .. }));

        assert_eq!(fs::read(&first.coords_path).unwrap(), committed);
        let state = ReconcileState::load(&ReconcileState::path_for(&first.coords_path))
            .unwrap()
            .unwrap();
        assert_eq!(state.failed, Some(err.to_string()));
        assert_eq!(state.watermark, 2);

        fs::write(rep.path().join("scr.1/charge.xls"), charges(1..=4)).unwrap();
        reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();
        let state = ReconcileState::load(&ReconcileState::path_for(&first.coords_path))
            .unwrap()
            .unwrap();
        assert_eq!(state.failed, None);
    }

    #[test]
    fn fresh_pass_refuses_when_consumed_runs_were_pruned() {
        let rep = TempDir::new().unwrap();
        write_run(rep.path(), "scr.1", 1..=3);
        write_run(rep.path(), "scr.2", 2..=5);
        let first = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap();
        let committed = fs::read(&first.coords_path).unwrap();
        fs::remove_dir_all(rep.path().join("scr.1")).unwrap();

        let err = reconcile_replicate(rep.path(), &StitchConfig::default()).unwrap_err();
        match err {
            Error::PrunedRuns { runs, .. } => assert_eq!(runs, vec!["scr.1"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fs::read(&first.coords_path).unwrap(), committed);

        let config = StitchConfig {
            resume: true,
            ..StitchConfig::default()
        };
        let report = reconcile_replicate(rep.path(), &config).unwrap();
        assert_eq!(report.frames, 0);
        assert_eq!(report.total_frames, 5);
        assert_eq!(fs::read(&report.coords_path).unwrap(), committed);
    }
}
