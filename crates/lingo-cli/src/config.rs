use clap::{Parser, Subcommand};

use crate::commands::{
    change_password::ChangePasswordCmd, create_user::CreateUserCmd, migrate::MigrateCmd,
};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for lingo - administration of users and database of lingo server."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    CreateUser(CreateUserCmd),
    ChangePassword(ChangePasswordCmd),
    Migrate(MigrateCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::CreateUser(cmd) => cmd.run().await,
            Command::ChangePassword(cmd) => cmd.run().await,
            Command::Migrate(cmd) => cmd.run().await,
        }
    }
}
