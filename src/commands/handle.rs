use anyhow::Result;
use tokio::io::BufReader;

use crate::context::Context;
use crate::handler::handle_connection;

/// Serve the single connection attached to stdin/stdout.
pub async fn run(ctx: &Context) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();

    handle_connection(ctx, input, &mut output).await?;
    Ok(())
}
