use std::io;

use colored::Colorize;
use roster_agent::{AgentRuntime, LlmClient};
use roster_core::config::SessionConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: usize,
    pub failed_turns: usize,
}

/// Reads one utterance per line until the exit sentinel or end of input.
///
/// The session opens with a banner naming the sentinel and says goodbye when the sentinel
/// is entered; end of input ends it silently. A failed turn is reported on `output` and the
/// loop keeps prompting.
pub async fn run_session<C, R, W>(
    runtime: &AgentRuntime<C>,
    settings: &SessionConfig,
    input: R,
    mut output: W,
) -> io::Result<SessionSummary>
where
    C: LlmClient,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let sentinel = settings.exit_sentinel.trim().to_lowercase();
    let mut lines = input.lines();
    let mut summary = SessionSummary::default();

    info!(event_name = "cli.session.started", exit_sentinel = settings.exit_sentinel.as_str());
    output.write_all(banner(&settings.exit_sentinel).as_bytes()).await?;

    loop {
        output.write_all(settings.prompt.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let utterance = line.trim();
        if utterance.to_lowercase() == sentinel {
            output.write_all(b"Goodbye!\n").await?;
            break;
        }
        if utterance.is_empty() {
            continue;
        }

        match runtime.handle_utterance(utterance).await {
            Ok(outcome) => {
                summary.turns += 1;
                output.write_all(format!("{}\n", outcome.reply.green()).as_bytes()).await?;
            }
            Err(error) => {
                summary.failed_turns += 1;
                warn!(event_name = "cli.session.turn_failed", error = %error, "turn failed");
                output.write_all(format!("{}\n", format!("error: {error}").red()).as_bytes()).await?;
            }
        }
    }

    output.flush().await?;
    info!(
        event_name = "cli.session.ended",
        turns = summary.turns,
        failed_turns = summary.failed_turns,
        "session ended"
    );
    Ok(summary)
}

fn banner(exit_sentinel: &str) -> String {
    format!(
        "Ask a question about the dataset, e.g. 'Tell me three names that include the letter a'.\n\n\
         Type '{exit_sentinel}' to quit.\n\n"
    )
}
