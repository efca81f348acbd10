use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;

pub const COMMAND_PREFIX: char = '/';

const HELP_WORDS: [&str; 2] = ["help", "commands"];

#[derive(Debug, thiserror::Error)]
#[error("command '{command}' failed: {message}")]
pub struct CommandError {
    pub command: String,
    pub message: String,
}

impl CommandError {
    pub fn new(command: &str, message: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            message: message.into(),
        }
    }
}

pub type CommandFuture = BoxFuture<'static, Result<(), CommandError>>;

pub trait CommandHandler: Send + Sync {
    fn execute(&self) -> CommandFuture;
}

impl<F, Fut> CommandHandler for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
{
    fn execute(&self) -> CommandFuture {
        Box::pin(self())
    }
}

#[derive(Clone)]
pub struct SlashCommand {
    pub id: String,
    pub aliases: Vec<String>,
    pub description: String,
    handler: Arc<dyn CommandHandler>,
}

impl SlashCommand {
    /// Aliases are de-duplicated case-insensitively, keeping the first
    /// spelling. An empty alias list falls back to the id.
    pub fn new<H>(id: &str, aliases: &[&str], description: &str, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        let mut unique: Vec<String> = Vec::with_capacity(aliases.len());
        let mut folded: Vec<String> = Vec::with_capacity(aliases.len());
        for alias in aliases {
            let alias = alias.trim();
            let key = alias.to_lowercase();
            if alias.is_empty() || folded.contains(&key) {
                continue;
            }
            folded.push(key);
            unique.push(alias.to_string());
        }
        if unique.is_empty() {
            unique.push(id.to_string());
        }

        Self {
            id: id.to_string(),
            aliases: unique,
            description: description.to_string(),
            handler: Arc::new(handler),
        }
    }

    pub fn canonical_alias(&self) -> &str {
        // Construction guarantees at least one alias.
        self.aliases.first().map(String::as_str).unwrap_or(&self.id)
    }

    pub fn execute(&self) -> CommandFuture {
        self.handler.execute()
    }

    fn exact_alias(&self, needle: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|alias| alias.to_lowercase() == needle)
            .map(String::as_str)
    }

    fn prefix_alias(&self, needle: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|alias| alias.to_lowercase().starts_with(needle))
            .map(String::as_str)
    }
}

impl std::fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlashCommand")
            .field("id", &self.id)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct SlashCommandSuggestion {
    pub command: SlashCommand,
    pub matched_alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Command,
    Search,
}

pub fn classify_input(input: &str) -> InputMode {
    if input.starts_with(COMMAND_PREFIX) {
        InputMode::Command
    } else {
        InputMode::Search
    }
}

pub fn is_help_request(input: &str) -> bool {
    command_needle(input).is_some_and(|needle| is_help_needle(&needle))
}

fn is_help_needle(needle: &str) -> bool {
    needle.is_empty() || HELP_WORDS.contains(&needle)
}

fn command_needle(input: &str) -> Option<String> {
    input
        .strip_prefix(COMMAND_PREFIX)
        .map(|rest| rest.to_lowercase())
}

/// Registry of slash commands keyed by id. Registering an existing id
/// replaces the earlier definition.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<BTreeMap<String, SlashCommand>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, command: SlashCommand) {
        let mut commands = self
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if commands.insert(command.id.clone(), command).is_some() {
            log::debug!("replaced existing slash command registration");
        }
    }

    pub fn commands(&self) -> Vec<SlashCommand> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn command(&self, id: &str) -> Option<SlashCommand> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_suggestions(&self, input: &str) -> Vec<SlashCommandSuggestion> {
        let Some(needle) = command_needle(input) else {
            return Vec::new();
        };
        let commands = self
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        if is_help_needle(&needle) {
            return commands
                .values()
                .map(|command| SlashCommandSuggestion {
                    command: command.clone(),
                    matched_alias: command.canonical_alias().to_string(),
                })
                .collect();
        }

        let mut suggestions: Vec<SlashCommandSuggestion> = commands
            .values()
            .filter_map(|command| {
                command
                    .prefix_alias(&needle)
                    .map(|alias| SlashCommandSuggestion {
                        command: command.clone(),
                        matched_alias: alias.to_string(),
                    })
            })
            .collect();

        suggestions.sort_by(|a, b| {
            let a_exact = a.matched_alias.to_lowercase() == needle;
            let b_exact = b.matched_alias.to_lowercase() == needle;
            b_exact
                .cmp(&a_exact)
                .then_with(|| a.matched_alias.len().cmp(&b.matched_alias.len()))
        });
        suggestions
    }

    pub fn is_valid_command(&self, input: &str) -> bool {
        self.find_exact(input).is_some()
    }

    /// Runs the command whose alias equals the input exactly. Returns
    /// `Ok(false)` without side effects when nothing matches. Effect
    /// failures are returned to the caller as-is.
    pub async fn execute_command(&self, input: &str) -> Result<bool, CommandError> {
        let Some(command) = self.find_exact(input) else {
            return Ok(false);
        };
        log::info!("executing slash command '{}'", command.id);
        command.execute().await?;
        Ok(true)
    }

    fn find_exact(&self, input: &str) -> Option<SlashCommand> {
        let needle = command_needle(input)?;
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|command| command.exact_alias(&needle).is_some())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_input, CommandError, InputMode, SlashCommand};

    async fn noop() -> Result<(), CommandError> {
        Ok(())
    }

    #[test]
    fn aliases_are_deduplicated_case_insensitively() {
        let command = SlashCommand::new("potd", &["potd", "POTD", " today ", ""], "", noop);
        assert_eq!(command.aliases, vec!["potd", "today"]);
        assert_eq!(command.canonical_alias(), "potd");
    }

    #[test]
    fn empty_alias_list_falls_back_to_id() {
        let command = SlashCommand::new("sync", &[], "", noop);
        assert_eq!(command.aliases, vec!["sync"]);
    }

    #[test]
    fn classifies_prefix_as_command_mode() {
        assert_eq!(classify_input("/potd"), InputMode::Command);
        assert_eq!(classify_input("/"), InputMode::Command);
        assert_eq!(classify_input("two sum"), InputMode::Search);
        assert_eq!(classify_input(" /potd"), InputMode::Search);
    }
}
