//! Runs one protected mutation from the terminal: the operation is spawned, the
//! challenge it opens is rendered with [`TerminalPrompt`], and the result is
//! printed once the operation settles.

use super::console::Console;
use crate::{
    cli::{globals::GlobalArgs, prompt::TerminalPrompt},
    error::ApiError,
    features::{
        ActionReceipt, kyc::KycReview, merchants::MerchantDecision,
        merchants::MerchantModeration, security::BackupCodes, team::TeamAdmin,
    },
    step_up::{StepUpCoordinator, StepUpOutcome},
};
use anyhow::{Result, anyhow};
use tokio::{io::{AsyncBufRead, AsyncWrite}, task::JoinHandle};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedCommand {
    ApproveKyc {
        user_id: String,
    },
    RejectKyc {
        user_id: String,
        reason: String,
    },
    Merchant {
        merchant_id: String,
        decision: MerchantDecision,
        reason: Option<String>,
    },
    ChangeRole {
        member_id: String,
        role_id: String,
    },
    RotateBackupCodes,
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: ProtectedCommand,
}

#[derive(Debug)]
pub enum Report {
    Receipt(ActionReceipt),
    BackupCodes(Vec<String>),
}

type Operation = JoinHandle<Result<StepUpOutcome<Report>, ApiError>>;

/// # Errors
/// Returns an error if nobody is signed in, the terminal fails, or the
/// protected operation fails.
pub async fn execute(args: Args) -> Result<()> {
    let console = Console::open(&args.globals)?;
    if !console.gateway.credentials().is_authenticated() {
        return Err(anyhow!("not signed in, run `stepup login` first"));
    }

    let mut prompt = TerminalPrompt::stdio();
    let operation = spawn_operation(&console, args.command);
    drive(&console, operation, &mut prompt).await
}

pub(crate) async fn drive<R, W>(
    console: &Console,
    mut operation: Operation,
    prompt: &mut TerminalPrompt<R, W>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut views = console.coordinator.desk().subscribe();
    let opened = tokio::select! {
        changed = views.wait_for(Option::is_some) => changed.is_ok(),
        finished = &mut operation => return report(prompt, finished??).await,
    };

    if opened {
        let mut presenter = console.presenter();
        let outcome = prompt.run(&mut presenter).await?;
        debug!(?outcome, "challenge finished");
    }

    let outcome = operation.await??;
    report(prompt, outcome).await
}

fn spawn_operation(console: &Console, command: ProtectedCommand) -> Operation {
    let gateway = console.gateway.clone();
    let coordinator: StepUpCoordinator = console.coordinator.clone();

    tokio::spawn(async move {
        let receipt = |outcome: StepUpOutcome<ActionReceipt>| outcome.map(Report::Receipt);
        match command {
            ProtectedCommand::ApproveKyc { user_id } => KycReview::new(gateway, &coordinator)
                .approve(&user_id)
                .await
                .map(receipt),
            ProtectedCommand::RejectKyc { user_id, reason } => {
                KycReview::new(gateway, &coordinator)
                    .reject(&user_id, &reason)
                    .await
                    .map(receipt)
            }
            ProtectedCommand::Merchant {
                merchant_id,
                decision,
                reason,
            } => MerchantModeration::new(gateway, &coordinator)
                .decide(&merchant_id, decision, reason.as_deref())
                .await
                .map(receipt),
            ProtectedCommand::ChangeRole { member_id, role_id } => {
                TeamAdmin::new(gateway, &coordinator)
                    .change_role(&member_id, &role_id)
                    .await
                    .map(receipt)
            }
            ProtectedCommand::RotateBackupCodes => BackupCodes::new(gateway, &coordinator)
                .rotate()
                .await
                .map(|outcome| outcome.map(Report::BackupCodes)),
        }
    })
}

async fn report<R, W>(prompt: &mut TerminalPrompt<R, W>, outcome: StepUpOutcome<Report>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match outcome {
        StepUpOutcome::Cancelled => prompt.say("Cancelled, nothing was changed.").await?,
        StepUpOutcome::Completed(Report::Receipt(receipt)) => {
            let status = receipt.status.as_deref().unwrap_or("done");
            match receipt.message {
                Some(message) => prompt.say(&format!("{status}: {message}")).await?,
                None => prompt.say(&format!("{status}.")).await?,
            }
        }
        StepUpOutcome::Completed(Report::BackupCodes(codes)) => {
            prompt
                .say("New backup codes (store them now, they will not be shown again):")
                .await?;
            for code in codes {
                prompt.say(&format!("  {code}")).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{Gateway, STEP_UP_HEADER},
        config::{ApiConfig, Environment},
        session::{CredentialStore, Principal, RouteTracker, SessionCredential},
        step_up::{ChallengeDesk, StepUpSlot},
    };
    use secrecy::SecretString;
    use serde_json::json;
    use std::{sync::Arc, time::Duration};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn can_bind_localhost() -> bool {
        std::net::TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn console(server: &MockServer) -> Result<Console> {
        let config = ApiConfig::resolve(Some(&server.uri()), Environment::Staging, Duration::from_secs(5))?;
        let credentials = CredentialStore::in_memory();
        credentials.replace(SessionCredential::new(
            Principal {
                id: "admin-1".to_string(),
                email: "ops@example.com".to_string(),
                name: None,
                role: None,
            },
            Vec::new(),
            SecretString::from("session-1"),
            None,
        ));
        let slot = StepUpSlot::default();
        let navigator = Arc::new(RouteTracker::default());
        Ok(Console {
            gateway: Gateway::new(config, credentials, slot.clone(), navigator.clone())?,
            coordinator: StepUpCoordinator::new(ChallengeDesk::new(), slot),
            navigator,
        })
    }

    async fn run(console: &Console, command: ProtectedCommand, input: &str) -> Result<String> {
        let mut output = Vec::new();
        {
            let mut prompt = TerminalPrompt::new(input.as_bytes(), &mut output);
            let operation = spawn_operation(console, command);
            drive(console, operation, &mut prompt).await?;
        }
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    #[tokio::test]
    async fn suspend_merchant_after_code() -> Result<()> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/admin/verify-action-mfa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "actionToken": "tok_abc",
                "expiresIn": 300
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/admin/merchants/m-1/suspend"))
            .and(header(STEP_UP_HEADER, "tok_abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "suspended", "message": "Merchant suspended"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let console = console(&server)?;
        let output = run(
            &console,
            ProtectedCommand::Merchant {
                merchant_id: "m-1".to_string(),
                decision: MerchantDecision::Suspend,
                reason: Some("chargebacks".to_string()),
            },
            "123456\n",
        )
        .await?;
        assert!(output.contains("Verified."));
        assert!(output.contains("suspended: Merchant suspended"));
        Ok(())
    }

    #[tokio::test]
    async fn cancel_reports_nothing_changed() -> Result<()> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/admin/kyc/u1/approve"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let console = console(&server)?;
        let output = run(
            &console,
            ProtectedCommand::ApproveKyc {
                user_id: "u1".to_string(),
            },
            "cancel\n",
        )
        .await?;
        assert!(output.contains("Cancelled, nothing was changed."));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_id_fails_without_prompting() -> Result<()> {
        if !can_bind_localhost() {
            return Ok(());
        }
        let server = MockServer::start().await;
        let console = console(&server)?;
        let result = run(
            &console,
            ProtectedCommand::ApproveKyc {
                user_id: "../admin".to_string(),
            },
            "123456\n",
        )
        .await;
        assert!(result.is_err());
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
        Ok(())
    }
}
