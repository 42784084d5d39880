//! Maps validated CLI matches to an [`Action`].

use crate::cli::{
    actions::{
        Action,
        protected::{self, ProtectedCommand},
        session::LoginArgs,
    },
    commands::{
        self, ARG_EMAIL, ARG_ID, ARG_PASSWORD, ARG_REASON, ARG_ROLE_ID, CMD_BACKUP_CODES, CMD_KYC,
        CMD_LOGIN, CMD_LOGOUT, CMD_MERCHANT, CMD_TEAM, CMD_WHOAMI,
    },
    globals::GlobalArgs,
};
use crate::features::merchants::MerchantDecision;
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: {id}"))
}

fn protected_command(name: &str, matches: &ArgMatches) -> Result<ProtectedCommand> {
    let (action, sub) = matches
        .subcommand()
        .with_context(|| format!("missing {name} subcommand"))?;

    let command = match (name, action) {
        (CMD_KYC, "approve") => ProtectedCommand::ApproveKyc {
            user_id: required(sub, ARG_ID)?,
        },
        (CMD_KYC, "reject") => ProtectedCommand::RejectKyc {
            user_id: required(sub, ARG_ID)?,
            reason: required(sub, ARG_REASON)?,
        },
        (CMD_MERCHANT, decision) => ProtectedCommand::Merchant {
            merchant_id: required(sub, ARG_ID)?,
            decision: match decision {
                "approve" => MerchantDecision::Approve,
                "reject" => MerchantDecision::Reject,
                "suspend" => MerchantDecision::Suspend,
                other => return Err(anyhow!("unknown merchant action: {other}")),
            },
            reason: sub.get_one::<String>(ARG_REASON).cloned(),
        },
        (CMD_TEAM, "set-role") => ProtectedCommand::ChangeRole {
            member_id: required(sub, ARG_ID)?,
            role_id: required(sub, ARG_ROLE_ID)?,
        },
        (CMD_BACKUP_CODES, "rotate") => ProtectedCommand::RotateBackupCodes,
        (name, action) => return Err(anyhow!("unknown command: {name} {action}")),
    };
    Ok(command)
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or the API configuration
/// is invalid.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let options = commands::api::Options::parse(matches)?;
    let globals = GlobalArgs::new(options.config, options.token_file);

    let (name, sub) = matches.subcommand().context("missing command")?;
    let action = match name {
        CMD_LOGIN => Action::Login(LoginArgs {
            globals,
            email: required(sub, ARG_EMAIL)?,
            password: SecretString::from(required(sub, ARG_PASSWORD)?),
        }),
        CMD_LOGOUT => Action::Logout(globals),
        CMD_WHOAMI => Action::Whoami(globals),
        CMD_KYC | CMD_MERCHANT | CMD_TEAM | CMD_BACKUP_CODES => Action::Protected(protected::Args {
            globals,
            command: protected_command(name, sub)?,
        }),
        other => return Err(anyhow!("unknown command: {other}")),
    };
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch(args: &[&str]) -> Result<Action> {
        let mut matches = None;
        temp_env::with_vars(
            [
                ("STEPUP_API_BASE_URL", Some("https://api.example.com/api")),
                ("STEPUP_ENV", None),
                ("STEPUP_TOKEN_FILE", Some("/tmp/stepup-test-session.json")),
                ("STEPUP_TIMEOUT", None),
                ("STEPUP_LOG_LEVEL", None),
            ],
            || {
                matches = Some(commands::new().try_get_matches_from(args.iter().copied()));
            },
        );
        let matches = matches.context("matches not produced")??;
        handler(&matches)
    }

    #[test]
    fn merchant_suspend_maps_to_protected_command() -> Result<()> {
        let action = dispatch(&["stepup", "merchant", "suspend", "m-42", "-r", "chargebacks"])?;
        let Action::Protected(args) = action else {
            return Err(anyhow!("expected protected action"));
        };
        assert_eq!(
            args.command,
            ProtectedCommand::Merchant {
                merchant_id: "m-42".to_string(),
                decision: MerchantDecision::Suspend,
                reason: Some("chargebacks".to_string()),
            }
        );
        assert_eq!(args.globals.api.base_url.as_str(), "https://api.example.com/api");
        Ok(())
    }

    #[test]
    fn team_and_backup_codes_dispatch() -> Result<()> {
        let Action::Protected(args) = dispatch(&["stepup", "team", "set-role", "mem-1", "role-2"])? else {
            return Err(anyhow!("expected protected action"));
        };
        assert_eq!(
            args.command,
            ProtectedCommand::ChangeRole {
                member_id: "mem-1".to_string(),
                role_id: "role-2".to_string(),
            }
        );

        let Action::Protected(args) = dispatch(&["stepup", "backup-codes", "rotate"])? else {
            return Err(anyhow!("expected protected action"));
        };
        assert_eq!(args.command, ProtectedCommand::RotateBackupCodes);
        Ok(())
    }

    #[test]
    fn login_keeps_password_secret() -> Result<()> {
        let action = dispatch(&["stepup", "login", "-e", "ops@example.com", "-p", "hunter2"])?;
        let rendered = format!("{action:?}");
        assert!(rendered.contains("ops@example.com"));
        assert!(!rendered.contains("hunter2"));
        Ok(())
    }

    #[test]
    fn missing_base_url_in_production_fails() {
        temp_env::with_vars(
            [
                ("STEPUP_API_BASE_URL", None::<&str>),
                ("STEPUP_ENV", Some("production")),
            ],
            || {
                let matches = commands::new().try_get_matches_from(["stepup", "whoami"]);
                assert!(matches.is_ok_and(|matches| handler(&matches).is_err()));
            },
        );
    }
}
