use super::console::Console;
use crate::{
    cli::{globals::GlobalArgs, prompt::TerminalPrompt},
    features::auth::{self, LoginOutcome},
};
use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};

pub struct LoginArgs {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
}

impl std::fmt::Debug for LoginArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginArgs")
            .field("globals", &self.globals)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// # Errors
/// Returns an error if sign-in or the login-time MFA code fails.
pub async fn login(args: LoginArgs) -> Result<()> {
    let console = Console::open(&args.globals)?;
    let mut prompt = TerminalPrompt::stdio();

    let principal = match auth::login(&console.gateway, &args.email, args.password.expose_secret())
        .await?
    {
        LoginOutcome::SignedIn(principal) => principal,
        LoginOutcome::MfaRequired(pending) => {
            let Some(code) = prompt.ask("Authentication code: ").await? else {
                return Err(anyhow!("sign-in cancelled"));
            };
            auth::verify_login_mfa(&console.gateway, &pending, &code).await?
        }
    };

    prompt
        .say(&format!("Signed in as {}", principal.email))
        .await?;
    Ok(())
}

/// # Errors
/// Returns an error if the session store cannot be opened.
pub async fn logout(globals: &GlobalArgs) -> Result<()> {
    let console = Console::open(globals)?;
    auth::logout(&console.gateway).await?;
    TerminalPrompt::stdio().say("Signed out.").await?;
    Ok(())
}

/// # Errors
/// Returns an error if the session store cannot be opened or nobody is signed in.
pub async fn whoami(globals: &GlobalArgs) -> Result<()> {
    let console = Console::open(globals)?;
    let principal = console
        .gateway
        .credentials()
        .principal()
        .ok_or_else(|| anyhow!("not signed in"))?;

    let mut prompt = TerminalPrompt::stdio();
    prompt.say(&format!("id:    {}", principal.id)).await?;
    prompt.say(&format!("email: {}", principal.email)).await?;
    if let Some(name) = &principal.name {
        prompt.say(&format!("name:  {name}")).await?;
    }
    if let Some(role) = &principal.role {
        prompt.say(&format!("role:  {role}")).await?;
    }
    Ok(())
}
