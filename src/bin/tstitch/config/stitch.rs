use traj_stitch::{FrameNumbering, Settings, StitchConfig};

use crate::cli::StitchArgs;

pub fn build_stitch_config(args: &StitchArgs, settings: &Settings) -> StitchConfig {
    let mut config = settings.stitch_config();
    let files = &args.files;

    if let Some(prefix) = &files.run_prefix {
        config.run_prefix = prefix.clone();
    }
    if let Some(name) = &files.coords_file {
        config.coords_name = name.clone();
    }
    if let Some(name) = &files.charges_file {
        config.charges_name = name.clone();
    }
    if let Some(name) = &files.output_coords {
        config.output_coords = name.clone();
    }
    if let Some(name) = &files.output_charges {
        config.output_charges = name.clone();
    }

    if args.frames.sequential {
        config.numbering = FrameNumbering::Sequential;
    } else if let Some(field) = args.frames.frame_field {
        config.numbering = FrameNumbering::Title { field };
    }
    if args.frames.atom_count.is_some() {
        config.atom_count = args.frames.atom_count;
    }

    if let Some(order) = args.run_order {
        config.run_order = order.into();
    }
    if let Some(retention) = args.retention {
        config.retention = retention.into();
    }
    config.resume = args.resume;
    super::override_ignore(&mut config.ignore, &args.ignore);

    config
}

/// Worker count for batch stitching; 0 lets the pool use every core.
pub fn resolve_threads(cli: Option<usize>, settings: &Settings) -> usize {
    cli.or(settings.threads).unwrap_or(0)
}
