use std::fs::create_dir_all;

use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use orkl_config::ConfigFile;
use tracing::info;

use crate::cli::RootArgs;

/// Initialize a connector home with a default configuration
#[derive(Debug, Parser)]
pub struct InitCommand {
    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        let home = &root_args.home;

        create_dir_all(home)
            .wrap_err_with(|| format!("failed to create connector home {home:?}"))?;

        if ConfigFile::exists(home) && !self.force {
            bail!("connector is already initialized in {:?}", home);
        }

        ConfigFile::default().save(home)?;

        info!("Initialized connector in {:?}", home);

        Ok(())
    }
}
