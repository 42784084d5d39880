//! Terminal rendering of the challenge presenter. Each input line is treated as
//! a paste; `cancel` or end of input cancels the challenge.

use crate::step_up::{ActionVerifier, CODE_LENGTH, ChallengePresenter, PresenterEvent};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptOutcome {
    Verified,
    Cancelled,
    /// The challenge was closed elsewhere.
    Closed,
}

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<BufReader<Stdin>, Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> TerminalPrompt<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// # Errors
    /// Returns an error if stdout cannot be written.
    pub async fn say(&mut self, message: &str) -> io::Result<()> {
        self.output.write_all(message.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Asks a question and returns the trimmed answer, or `None` at end of input.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be read or written.
    pub async fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        self.output.write_all(question.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Drives the open challenge until it is verified, cancelled or closed.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be read or written.
    pub async fn run<V: ActionVerifier>(
        &mut self,
        presenter: &mut ChallengePresenter<V>,
    ) -> io::Result<PromptOutcome> {
        let Some(view) = presenter.sync().cloned() else {
            return Ok(PromptOutcome::Closed);
        };
        self.say(&format!(
            "{}\n{}",
            view.config.action_name, view.config.action_description
        ))
        .await?;

        let question = format!("Enter the {CODE_LENGTH}-digit code from your authenticator (or 'cancel'): ");
        loop {
            let Some(line) = self.ask(&question).await? else {
                presenter.cancel();
                self.say("").await?;
                return Ok(PromptOutcome::Cancelled);
            };
            if line.eq_ignore_ascii_case("cancel") {
                presenter.cancel();
                self.say("Cancelled.").await?;
                return Ok(PromptOutcome::Cancelled);
            }

            let event = match presenter.paste(&line).await {
                // A line is a complete attempt; a short one is submitted as-is.
                PresenterEvent::Editing { .. } => presenter.submit().await,
                event => event,
            };

            match event {
                PresenterEvent::Verified => {
                    self.say("Verified.").await?;
                    return Ok(PromptOutcome::Verified);
                }
                PresenterEvent::Invalid(message) | PresenterEvent::Rejected(message) => {
                    self.say(&message).await?;
                }
                PresenterEvent::Closed | PresenterEvent::Idle => return Ok(PromptOutcome::Closed),
                PresenterEvent::Editing { .. } => {}
            }
        }
    }
}
