pub mod api;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_KYC: &str = "kyc";
pub const CMD_MERCHANT: &str = "merchant";
pub const CMD_TEAM: &str = "team";
pub const CMD_BACKUP_CODES: &str = "backup-codes";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_ID: &str = "id";
pub const ARG_ROLE_ID: &str = "role-id";
pub const ARG_REASON: &str = "reason";

fn id_arg(help: &'static str) -> Arg {
    Arg::new(ARG_ID).help(help).required(true)
}

fn reason_arg(required: bool) -> Arg {
    Arg::new(ARG_REASON)
        .short('r')
        .long(ARG_REASON)
        .help("Reason shown to the affected party")
        .required(required)
}

fn login() -> Command {
    Command::new(CMD_LOGIN)
        .about("Sign in with email and password")
        .arg(
            Arg::new(ARG_EMAIL)
                .short('e')
                .long(ARG_EMAIL)
                .help("Admin email")
                .env("STEPUP_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .short('p')
                .long(ARG_PASSWORD)
                .help("Admin password")
                .env("STEPUP_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

fn kyc() -> Command {
    Command::new(CMD_KYC)
        .about("Review KYC submissions (requires a verification code)")
        .subcommand_required(true)
        .subcommand(
            Command::new("approve")
                .about("Approve a KYC submission")
                .arg(id_arg("User id")),
        )
        .subcommand(
            Command::new("reject")
                .about("Reject a KYC submission")
                .arg(id_arg("User id"))
                .arg(reason_arg(true)),
        )
}

fn merchant() -> Command {
    Command::new(CMD_MERCHANT)
        .about("Moderate merchants (requires a verification code)")
        .subcommand_required(true)
        .subcommand(
            Command::new("approve")
                .about("Approve a merchant application")
                .arg(id_arg("Merchant id")),
        )
        .subcommand(
            Command::new("reject")
                .about("Reject a merchant application")
                .arg(id_arg("Merchant id"))
                .arg(reason_arg(true)),
        )
        .subcommand(
            Command::new("suspend")
                .about("Suspend a merchant")
                .arg(id_arg("Merchant id"))
                .arg(reason_arg(true)),
        )
}

fn team() -> Command {
    Command::new(CMD_TEAM)
        .about("Manage team members (requires a verification code)")
        .subcommand_required(true)
        .subcommand(
            Command::new("set-role")
                .about("Change a team member's role")
                .arg(id_arg("Team member id"))
                .arg(Arg::new(ARG_ROLE_ID).help("Role id").required(true)),
        )
}

fn backup_codes() -> Command {
    Command::new(CMD_BACKUP_CODES)
        .about("Manage MFA backup codes (requires a verification code)")
        .subcommand_required(true)
        .subcommand(Command::new("rotate").about("Invalidate and regenerate backup codes"))
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("stepup")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(login())
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and forget the stored session"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the signed-in admin"))
        .subcommand(kyc())
        .subcommand(merchant())
        .subcommand(team())
        .subcommand(backup_codes());

    let command = api::with_args(command);
    logging::with_args(command)
}
