//! Console channel: reads questions from stdin and prints answers to stdout.
//!
//! The terminal rendition of the question page. Each line is one submission;
//! an empty line makes no remote call. Runs until the `shutdown` token is
//! cancelled (Ctrl-C) or stdin is closed.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;

use super::state::{AskState, Display};
use super::{Channel, ChannelFuture};

pub struct ConsoleChannel {
    channel_id: String,
    state: Arc<AskState>,
}

impl ConsoleChannel {
    pub fn new(channel_id: impl Into<String>, state: Arc<AskState>) -> Self {
        Self { channel_id: channel_id.into(), state }
    }
}

impl Channel for ConsoleChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ChannelFuture {
        Box::pin(async move {
            info!(channel_id = %self.channel_id, "console channel started, Ctrl-C to quit");
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            drive(&self.state, stdin, &mut stdout, shutdown).await
        })
    }
}

/// Read-answer loop over any line source. Returns on EOF or shutdown.
pub async fn drive<R, W>(
    state: &AskState,
    input: R,
    out: &mut W,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let rule = "─".repeat(state.title().chars().count().max(8) + 2);
    writeln!(out, "{rule}")?;
    writeln!(out, " {}", state.title())?;
    writeln!(out, "{rule}")?;

    let mut lines = input.lines();
    loop {
        write!(out, "{}: ", state.input_label())?;
        out.flush()?;

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                writeln!(out)?;
                info!("console channel shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        writeln!(out)?;
                        info!("console stdin closed");
                        break;
                    }
                    Ok(Some(question)) => {
                        debug!(len = question.len(), "console received line");
                        match state.handle_input(&question).await {
                            Display::Empty => {}
                            Display::Answer(text) => writeln!(out, "{text}")?,
                            Display::Error { message, .. } => writeln!(out, "error: {message}")?,
                        }
                    }
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}
