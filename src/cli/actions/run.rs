use super::{Action, protected, session};
use anyhow::Result;

pub(super) async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => session::login(args).await,
        Action::Logout(globals) => session::logout(&globals).await,
        Action::Whoami(globals) => session::whoami(&globals).await,
        Action::Protected(args) => protected::execute(args).await,
    }
}
