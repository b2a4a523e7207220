//! `yabt serve`: run the HTTP API.

use super::CommandContext;
use crate::api::run_server;
use crate::cli::ServeArgs;
use crate::error::Result;
use tracing::info;

/// Execute the serve command.
///
/// `--bind` is applied while loading settings; `--cors-permissive` here.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the runtime cannot be
/// built or the server fails.
pub fn execute(args: &ServeArgs, ctx: &CommandContext) -> Result<()> {
    let mut settings = ctx.settings.clone();
    settings.cors_permissive |= args.cors_permissive;

    let store = ctx.open_store()?;
    info!(db = %settings.db.display(), bind = %settings.bind, "Starting server");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_server(store, &settings))
}
