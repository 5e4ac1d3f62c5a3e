use anyhow::Result;

use crate::context::Context;

pub fn run(ctx: &Context) -> Result<()> {
    println!("{}", ctx.archive.announcements_json()?);
    Ok(())
}
