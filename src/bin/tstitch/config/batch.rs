use traj_stitch::{GatherConfig, MergeConfig, QmChargeConfig, Settings};

use crate::cli::{GatherArgs, MergeArgs, QmChargesArgs};

pub fn build_merge_config(args: &MergeArgs, settings: &Settings) -> MergeConfig {
    let mut config = settings.merge_config();

    if let Some(name) = &args.coords_file {
        config.coords_name = name.clone();
    }
    if let Some(name) = &args.charges_file {
        config.charges_name = name.clone();
    }
    if let Some(path) = &args.output_coords {
        config.output_coords = path.clone();
    }
    if let Some(path) = &args.output_charges {
        config.output_charges = path.clone();
    }
    if let Some(policy) = args.nan_policy {
        config.nan_policy = policy.into();
    }
    super::override_ignore(&mut config.ignore, &args.ignore);

    config
}

pub fn build_gather_config(args: &GatherArgs, settings: &Settings) -> GatherConfig {
    let mut config = settings.gather_config();

    if let Some(name) = &args.output {
        config.output_name = Some(name.clone());
    }
    if let Some(dir) = &args.coordinates_dir {
        config.coordinates_dir = dir.clone();
    }
    super::override_ignore(&mut config.ignore, &args.ignore);

    config
}

pub fn build_qm_charge_config(args: &QmChargesArgs, settings: &Settings) -> QmChargeConfig {
    let mut config = settings.qm_charge_config();

    if let Some(dir) = &args.scr_dir {
        config.scr_dir = dir.clone();
    }
    if let Some(name) = &args.charge_file {
        config.charge_file = name.clone();
    }
    super::override_ignore(&mut config.ignore, &args.ignore);

    config
}
