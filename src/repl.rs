use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::context::EvaluationContext;


async fn query<R, W>(output: &mut W, lines: &mut io::Lines<R>, prompt: &str) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(prompt.as_bytes()).await?;
    output.flush().await?;
    lines.next_line().await
}

/// Prompts, reads a line, evaluates it and prints the result until `input`
/// runs out. Blank lines are skipped and errors are printed without ending
/// the loop.
pub async fn run<R, W>(context: &mut EvaluationContext, input: R, output: &mut W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let prompt = context.config().prompt.clone();
    let mut lines = input.lines();

    while let Some(line) = query(output, &mut lines, &prompt).await? {
        if line.trim().is_empty() { continue; }

        let result = context.evaluate_str(&line);
        output.write_all(context.take_output().as_bytes()).await?;

        let printed = match result {
            Ok(value) => format!("{}\n", value),
            Err(err) => {
                debug!(kind = err.kind(), "evaluation failed");
                format!("Error: {}\n", err)
            }
        };
        output.write_all(printed.as_bytes()).await?;
    }

    output.flush().await
}
