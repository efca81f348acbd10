use std::sync::Arc;

use rand::seq::IndexedRandom;

use crate::action_executor::{problem_url, Navigator};
use crate::catalog_sync::CatalogSyncService;
use crate::command_registry::{CommandError, CommandRegistry, SlashCommand};

pub const COMMAND_POTD_ID: &str = "potd";
pub const COMMAND_HELP_ID: &str = "help";
pub const COMMAND_SYNC_ID: &str = "sync";
pub const COMMAND_RANDOM_ID: &str = "random";

#[derive(Clone)]
pub struct BuiltinContext {
    pub sync: Arc<CatalogSyncService>,
    pub navigator: Arc<dyn Navigator>,
    pub problem_url_base: String,
    pub daily_problem_url: String,
}

pub fn register_builtin_commands(registry: &CommandRegistry, ctx: &BuiltinContext) {
    registry.register(potd_command(ctx));
    registry.register(help_command());
    registry.register(sync_command(ctx));
    registry.register(random_command(ctx));
}

fn potd_command(ctx: &BuiltinContext) -> SlashCommand {
    let navigator = Arc::clone(&ctx.navigator);
    let url = ctx.daily_problem_url.clone();
    SlashCommand::new(
        COMMAND_POTD_ID,
        &["potd", "today", "daily"],
        "Open today's daily problem",
        move || {
            let result = navigator
                .open(&url)
                .map_err(|e| CommandError::new(COMMAND_POTD_ID, e.to_string()));
            async move { result }
        },
    )
}

fn help_command() -> SlashCommand {
    // Help is rendered from the suggestion list; running it does nothing.
    SlashCommand::new(
        COMMAND_HELP_ID,
        &["help", "commands"],
        "Show all available commands",
        || async { Ok::<(), CommandError>(()) },
    )
}

fn sync_command(ctx: &BuiltinContext) -> SlashCommand {
    let sync = Arc::clone(&ctx.sync);
    SlashCommand::new(
        COMMAND_SYNC_ID,
        &["sync", "refresh"],
        "Re-download the problem catalog now",
        move || {
            let sync = Arc::clone(&sync);
            async move {
                sync.refresh(None)
                    .await
                    .map(|_| ())
                    .map_err(|e| CommandError::new(COMMAND_SYNC_ID, e.to_string()))
            }
        },
    )
}

fn random_command(ctx: &BuiltinContext) -> SlashCommand {
    let sync = Arc::clone(&ctx.sync);
    let navigator = Arc::clone(&ctx.navigator);
    let base = ctx.problem_url_base.clone();
    SlashCommand::new(
        COMMAND_RANDOM_ID,
        &["random", "rand"],
        "Open a random problem from the catalog",
        move || {
            let result = open_random_problem(&sync, navigator.as_ref(), &base);
            async move { result }
        },
    )
}

fn open_random_problem(
    sync: &CatalogSyncService,
    navigator: &dyn Navigator,
    base: &str,
) -> Result<(), CommandError> {
    let problems = sync
        .store()
        .get_all()
        .map_err(|e| CommandError::new(COMMAND_RANDOM_ID, e.to_string()))?;
    let Some(problem) = problems.choose(&mut rand::rng()) else {
        return Err(CommandError::new(COMMAND_RANDOM_ID, "the catalog is empty"));
    };
    navigator
        .open(&problem_url(base, &problem.slug))
        .map_err(|e| CommandError::new(COMMAND_RANDOM_ID, e.to_string()))
}
