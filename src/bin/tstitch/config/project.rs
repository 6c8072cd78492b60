use traj_stitch::{ProjectConfig, Settings};

use crate::cli::ProjectArgs;

pub fn build_project_config(args: &ProjectArgs, settings: &Settings) -> ProjectConfig {
    let mut config = settings.project_config();

    if let Some(framing) = args.framing {
        config.framing = framing.into();
    }
    if let Some(overflow) = args.overflow {
        config.overflow = overflow.into();
    }
    if args.title.is_some() {
        config.title = args.title.clone();
    }

    config
}
