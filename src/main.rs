use tokio::io::{self, BufReader};
use yuso::EvaluationContext;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    yuso::init_tracing();

    let mut context = EvaluationContext::new();
    let mut stdout = io::stdout();
    yuso::repl::run(&mut context, BufReader::new(io::stdin()), &mut stdout).await?;

    Ok(())
}
