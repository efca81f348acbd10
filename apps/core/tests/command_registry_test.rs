use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use leetjump_core::command_registry::{CommandError, CommandRegistry, SlashCommand};

async fn noop() -> Result<(), CommandError> {
    Ok(())
}

fn counting_command(id: &str, aliases: &[&str], counter: &Arc<AtomicUsize>) -> SlashCommand {
    let counter = Arc::clone(counter);
    SlashCommand::new(id, aliases, "counts invocations", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Ok::<(), CommandError>(()) }
    })
}

fn registry() -> CommandRegistry {
    let registry = CommandRegistry::new();
    registry.register(SlashCommand::new(
        "potd",
        &["potd", "today", "daily"],
        "Open today's daily problem",
        noop,
    ));
    registry.register(SlashCommand::new(
        "help",
        &["help", "commands"],
        "Show all available commands",
        noop,
    ));
    registry
}

fn matched(registry: &CommandRegistry, input: &str) -> Vec<(String, String)> {
    registry
        .get_suggestions(input)
        .into_iter()
        .map(|s| (s.command.id, s.matched_alias))
        .collect()
}

#[test]
fn prefix_matches_single_command() {
    let registry = registry();
    assert_eq!(
        matched(&registry, "/pot"),
        vec![("potd".to_string(), "potd".to_string())]
    );
}

#[test]
fn secondary_alias_matches_case_insensitively() {
    let registry = registry();
    assert_eq!(
        matched(&registry, "/DAI"),
        vec![("potd".to_string(), "daily".to_string())]
    );
}

#[test]
fn help_mode_lists_every_command_by_id() {
    let registry = registry();
    registry.register(SlashCommand::new("random", &["random", "rand"], "", noop));

    let expected = vec![
        ("help".to_string(), "help".to_string()),
        ("potd".to_string(), "potd".to_string()),
        ("random".to_string(), "random".to_string()),
    ];
    assert_eq!(matched(&registry, "/"), expected);
    assert_eq!(matched(&registry, "/help"), expected);
    assert_eq!(matched(&registry, "/COMMANDS"), expected);
}

#[test]
fn exact_alias_ranks_before_longer_prefix() {
    let registry = registry();
    registry.register(SlashCommand::new("previous", &["p", "prev"], "", noop));

    assert_eq!(
        matched(&registry, "/p"),
        vec![
            ("previous".to_string(), "p".to_string()),
            ("potd".to_string(), "potd".to_string()),
        ]
    );
}

#[test]
fn shorter_alias_wins_among_prefix_matches() {
    let registry = registry();
    registry.register(SlashCommand::new("daylight", &["daylight"], "", noop));
    registry.register(SlashCommand::new("dag", &["dag"], "", noop));

    let ids: Vec<String> = matched(&registry, "/da").into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["dag", "potd", "daylight"]);
}

#[test]
fn each_command_contributes_one_suggestion() {
    let registry = CommandRegistry::new();
    registry.register(SlashCommand::new("sync", &["sync", "synchronize"], "", noop));

    assert_eq!(
        matched(&registry, "/sync"),
        vec![("sync".to_string(), "sync".to_string())]
    );
}

#[test]
fn non_prefixed_input_yields_nothing() {
    let registry = registry();
    assert!(registry.get_suggestions("potd").is_empty());
    assert!(registry.get_suggestions("").is_empty());
    assert!(!registry.is_valid_command("potd"));
}

#[test]
fn only_exact_aliases_are_valid() {
    let registry = registry();
    assert!(registry.is_valid_command("/potd"));
    assert!(registry.is_valid_command("/Today"));
    assert!(!registry.is_valid_command("/pot"));
    assert!(!registry.is_valid_command("/"));
}

#[test]
fn re_registering_replaces_definition() {
    let registry = registry();
    registry.register(SlashCommand::new("potd", &["daily-problem"], "replaced", noop));

    assert_eq!(registry.len(), 2);
    assert!(!registry.is_valid_command("/potd"));
    assert!(registry.is_valid_command("/daily-problem"));
    assert_eq!(registry.command("potd").unwrap().description, "replaced");
}

#[test]
fn duplicate_aliases_collapse_under_unicode_case_folding() {
    let command = SlashCommand::new("umlaut", &["Äb", "äb", " ÄB ", "ab"], "folds", noop);
    assert_eq!(command.aliases, vec!["Äb", "ab"]);

    let fallback = SlashCommand::new("bare", &["", "  "], "falls back", noop);
    assert_eq!(fallback.aliases, vec!["bare"]);
}

#[tokio::test]
async fn executes_exact_alias_only() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = CommandRegistry::new();
    registry.register(counting_command("potd", &["potd", "today"], &counter));

    assert!(registry.execute_command("/today").await.unwrap());
    assert!(!registry.execute_command("/tod").await.unwrap());
    assert!(!registry.execute_command("today").await.unwrap());

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn effect_failure_propagates_to_caller() {
    let registry = CommandRegistry::new();
    registry.register(SlashCommand::new("broken", &["broken"], "", || async {
        Err::<(), _>(CommandError::new("broken", "navigation failed"))
    }));

    let error = registry.execute_command("/broken").await.unwrap_err();
    assert_eq!(error.command, "broken");
    assert_eq!(error.message, "navigation failed");
}
