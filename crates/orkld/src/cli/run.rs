use clap::Parser;
use eyre::{bail, Result as EyreResult};
use orkl_client::{OrklClient, OrklClientConfig, PlatformClient, PlatformClientConfig};
use orkl_config::ConfigFile;
use orkl_stix::{MapperConfig, ReportMapper};
use orkl_store::CheckpointStore;
use orkl_sync::{SyncConfig, SyncDriver};
use tokio::signal::ctrl_c;
use tracing::info;

use crate::cli::RootArgs;

/// Run the connector
#[derive(Debug, Parser)]
pub struct RunCommand;

impl RunCommand {
    pub async fn run(self, root_args: RootArgs) -> EyreResult<()> {
        let home = &root_args.home;

        if !ConfigFile::exists(home) {
            bail!("connector is not initialized in {:?}", home);
        }

        let mut config = ConfigFile::load(home)?;
        config.apply_env_overrides()?;

        let source = OrklClient::new(OrklClientConfig {
            base_url: config.orkl.base_url.clone(),
            api_key: config.orkl.api_key.clone(),
            request_delay: config.orkl.request_delay,
        });

        let sink = PlatformClient::new(PlatformClientConfig {
            url: config.platform.url.clone(),
            token: config.platform.token.clone(),
        });

        let mapper = ReportMapper::new(MapperConfig::default());

        let checkpoint = CheckpointStore::new(home.join(&config.state.path));

        let driver = SyncDriver::new(
            SyncConfig {
                connector_name: config.connector.name.clone(),
                page_size: config.orkl.page_size,
                max_entries_per_run: config.orkl.max_entries_to_process,
                history_start_year: config.orkl.history_start_year,
                resume_from: config.orkl.sync_from_version,
                maintain_data: config.orkl.maintain_data,
                run_and_terminate: config.connector.run_and_terminate,
                update_existing_data: config.connector.update_existing_data,
                interval: config.orkl.interval,
                cooldown: config.orkl.cooldown,
            },
            source,
            sink,
            mapper,
            checkpoint,
        );

        info!(base_url = %config.orkl.base_url, "Starting synchronization loop");

        tokio::select! {
            result = driver.run() => result.map_err(Into::into),
            _ = ctrl_c() => {
                info!("Interrupt received, shutting down");

                Ok(())
            }
        }
    }
}
