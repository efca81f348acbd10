use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("empty launch target")]
    EmptyTarget,
    #[error("failed to launch {target}: {message}")]
    LaunchFailed { target: String, message: String },
}

pub trait Navigator: Send + Sync {
    fn open(&self, url: &str) -> Result<(), LaunchError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNavigator;

impl Navigator for SystemNavigator {
    fn open(&self, url: &str) -> Result<(), LaunchError> {
        launch_open_target(url)
    }
}

pub fn problem_url(base: &str, slug: &str) -> String {
    format!("{}/{}/", base.trim_end_matches('/'), slug)
}

pub fn launch_open_target(target: &str) -> Result<(), LaunchError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(LaunchError::EmptyTarget);
    }

    let mut command = opener_command(trimmed);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
        .spawn()
        .map(|_| {
            log::info!("opened {trimmed}");
        })
        .map_err(|e| LaunchError::LaunchFailed {
            target: trimmed.to_string(),
            message: e.to_string(),
        })
}

#[cfg(target_os = "windows")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg("start").arg("").arg(target);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(target);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(target: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(target);
    command
}

#[cfg(test)]
mod tests {
    use super::problem_url;

    #[test]
    fn problem_url_normalizes_trailing_slash() {
        assert_eq!(
            problem_url("https://leetcode.com/problems/", "two-sum"),
            "https://leetcode.com/problems/two-sum/"
        );
        assert_eq!(
            problem_url("https://leetcode.com/problems", "two-sum"),
            "https://leetcode.com/problems/two-sum/"
        );
    }
}
