//! Conversation driver: the interactive read/respond loop.
//!
//! Reads one utterance per line, checks it for an exit request, hands it to
//! the [`TurnProcessor`], prints the reply, and checks the reply for a
//! closing phrase. Generic over the reader and writer so the same loop runs
//! against stdin/stdout or in-memory buffers.

use std::io;
use std::sync::Arc;

use chrono::Utc;
use parley_core::event::DomainEvent;
use parley_core::message::SessionKey;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::exit::{ExitDetector, ExitReason};
use crate::persona::Persona;
use crate::turn::TurnProcessor;

/// How an interactive conversation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEnd {
    Exit(ExitReason),
    /// The input stream closed.
    EndOfInput,
}

pub struct ConversationDriver {
    processor: Arc<TurnProcessor>,
    persona: Persona,
    detector: ExitDetector,
    session: SessionKey,
}

impl ConversationDriver {
    pub fn new(processor: Arc<TurnProcessor>, persona: Persona, session: SessionKey) -> Self {
        let detector = persona.exit_detector();
        Self {
            processor,
            persona,
            detector,
            session,
        }
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    /// Run until an exit is detected or input ends.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> io::Result<ConversationEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_line(output, self.persona.greeting).await?;
        write_line(output, self.persona.quit_hint()).await?;
        write_line(output, "").await?;

        let mut lines = input.lines();

        loop {
            output.write_all(b"You: ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                write_line(output, "").await?;
                self.finish(None).await;
                return Ok(ConversationEnd::EndOfInput);
            };

            let utterance = line.trim();
            if utterance.is_empty() {
                continue;
            }

            if let Some(reason) = self.detector.check_input(utterance) {
                write_line(output, &self.persona.farewell(&reason)).await?;
                self.finish(Some(&reason)).await;
                return Ok(ConversationEnd::Exit(reason));
            }

            match self.processor.process(&self.session, utterance).await {
                Ok(outcome) => {
                    write_line(output, &self.persona.reply_line(&outcome.reply)).await?;

                    if let Some(reason) = self.detector.check_reply(&outcome.reply) {
                        write_line(output, &self.persona.farewell(&reason)).await?;
                        self.finish(Some(&reason)).await;
                        return Ok(ConversationEnd::Exit(reason));
                    }
                }
                Err(e) => {
                    warn!(session = %self.session, error = %e, "Turn failed");
                    write_line(output, &self.persona.error_line(&e)).await?;
                }
            }
        }
    }

    /// Answer a single message without the interactive loop.
    ///
    /// Returns `false` when the turn failed (the error line was printed).
    pub async fn single_turn<W>(&self, message: &str, output: &mut W) -> io::Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        let ok = match self.processor.process(&self.session, message.trim()).await {
            Ok(outcome) => {
                write_line(output, &self.persona.reply_line(&outcome.reply)).await?;
                true
            }
            Err(e) => {
                write_line(output, &self.persona.error_line(&e)).await?;
                false
            }
        };
        self.finish(None).await;
        Ok(ok)
    }

    async fn finish(&self, reason: Option<&ExitReason>) {
        let turns = self
            .processor
            .sessions()
            .end(&self.session)
            .await
            .map_or(0, |s| s.turns.len());

        info!(session = %self.session, turns, ?reason, "Conversation ended");

        self.processor.event_bus().publish(DomainEvent::SessionEnded {
            session: self.session.to_string(),
            turns,
            timestamp: Utc::now(),
        });
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
