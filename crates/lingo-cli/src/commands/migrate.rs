use clap::Args;
use lingo_types::config::BackendConfig;

use crate::commands::{open_database, Executor};

#[derive(Args, Debug)]
pub struct MigrateCmd {
    #[command(flatten)]
    backend: BackendConfig,
}

impl Executor for MigrateCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = open_database(&self.backend).await?;
        pool.close().await;
        Ok(())
    }
}
