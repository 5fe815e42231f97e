use clap::Args;
use garde::Validate as _;
use lingo_dal::user::PasswordChange;
use lingo_types::{config::BackendConfig, general::ValidEmail};
use tracing::info;

use crate::commands::{create_user_repository, Executor};

#[derive(Args, Debug)]
pub struct ChangePasswordCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User email, used as login")]
    pub email: ValidEmail,
    #[arg(short, long, help = "New user password")]
    pub password: String,
}

impl Executor for ChangePasswordCmd {
    async fn run(self) -> anyhow::Result<()> {
        let change = PasswordChange {
            email: self.email,
            password: self.password,
        };
        change.validate()?;
        let repository = create_user_repository(&self.backend).await?;
        repository
            .change_password(change.email.as_ref(), &change.password)
            .await?;
        info!("Password changed for {}", change.email.as_ref());
        Ok(())
    }
}
