use clap::{Args, Subcommand};

use crate::cli::op::Op;

pub mod issue;
pub mod ls;
pub mod revoke;

crate::command_enum! {
    (Issue, issue::Issue),
    (Ls, ls::Ls),
    (Revoke, revoke::Revoke),
}

// Rename the generated Command to TokenCommand for clarity
pub type TokenCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Token {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[async_trait::async_trait]
impl Op for Token {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
