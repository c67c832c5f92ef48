//! Configuration file support for gitscribe.
//!
//! Settings merge from three layers: command-line flags beat a project-level
//! `gitscribe.toml` in the working directory, which beats the global config
//! in the platform config directory.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use gitscribe_git::CommitIdentity;

/// The project config file name
pub const CONFIG_FILE_NAME: &str = "gitscribe.toml";
/// Directory under the platform config dir holding the global config
pub const GLOBAL_CONFIG_DIR: &str = "gitscribe";
/// The global config file name
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// One configuration file, project-level or global. Both use the same shape.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default generator CLI (`claude` or `codex`)
    pub agent: Option<String>,
    /// Default model (if the generator supports it)
    pub model: Option<String>,
    /// Whether auto-staging also picks up untracked files
    pub include_untracked: Option<bool>,
    /// Per-git-command timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Commit author/committer override
    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl FileConfig {
    /// Load the project config from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if the file exists and parses successfully
    /// - `Ok(None)` if the file does not exist
    /// - `Err(...)` if the file exists but fails to parse (hard error)
    pub fn load_project(working_dir: &Path) -> Result<Option<Self>> {
        Self::load_file(&working_dir.join(CONFIG_FILE_NAME))
    }

    /// Load the global config from the platform config directory.
    pub fn load_global() -> Result<Option<Self>> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_file(&config_dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
    }

    fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(config))
    }
}

/// Merged view over the project and global config files.
#[derive(Debug, Default)]
pub struct Settings {
    project: Option<FileConfig>,
    global: Option<FileConfig>,
}

impl Settings {
    pub fn load(working_dir: &Path) -> Result<Self> {
        Ok(Self {
            project: FileConfig::load_project(working_dir)?,
            global: FileConfig::load_global()?,
        })
    }

    #[cfg(test)]
    fn from_parts(project: Option<FileConfig>, global: Option<FileConfig>) -> Self {
        Self { project, global }
    }

    /// Effective generator name. Priority: project > global > None
    pub fn agent(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|c| c.agent.as_deref())
            .or_else(|| self.global.as_ref().and_then(|c| c.agent.as_deref()))
    }

    /// Effective model. Priority: project > global > None
    pub fn model(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|c| c.model.as_deref())
            .or_else(|| self.global.as_ref().and_then(|c| c.model.as_deref()))
    }

    pub fn include_untracked(&self) -> Option<bool> {
        self.project
            .as_ref()
            .and_then(|c| c.include_untracked)
            .or_else(|| self.global.as_ref().and_then(|c| c.include_untracked))
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.project
            .as_ref()
            .and_then(|c| c.timeout_secs)
            .or_else(|| self.global.as_ref().and_then(|c| c.timeout_secs))
    }

    /// Commit identity, resolved per field. Both name and email must be
    /// present somewhere for an override to apply; git needs the pair.
    pub fn identity(&self) -> Option<CommitIdentity> {
        let name = self
            .project
            .as_ref()
            .and_then(|c| c.identity.name.as_deref())
            .or_else(|| self.global.as_ref().and_then(|c| c.identity.name.as_deref()))?;
        let email = self
            .project
            .as_ref()
            .and_then(|c| c.identity.email.as_deref())
            .or_else(|| self.global.as_ref().and_then(|c| c.identity.email.as_deref()))?;
        Some(CommitIdentity {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> FileConfig {
        toml::from_str(content).expect("config should parse")
    }

    #[test]
    fn test_full_config_parses() {
        let config = parse(
            r#"
agent = "codex"
model = "gpt-5"
include_untracked = true
timeout_secs = 45

[identity]
name = "Release Bot"
email = "bot@example.com"
"#,
        );
        assert_eq!(config.agent.as_deref(), Some("codex"));
        assert_eq!(config.include_untracked, Some(true));
        assert_eq!(config.timeout_secs, Some(45));
        assert_eq!(config.identity.name.as_deref(), Some("Release Bot"));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = parse("");
        assert!(config.agent.is_none());
        assert!(config.identity.name.is_none());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("agnet = \"claude\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_project_wins_over_global() {
        let settings = Settings::from_parts(
            Some(parse("agent = \"claude\"")),
            Some(parse("agent = \"codex\"\nmodel = \"gpt-5\"")),
        );
        assert_eq!(settings.agent(), Some("claude"));
        // Fields absent in the project file fall through to the global one.
        assert_eq!(settings.model(), Some("gpt-5"));
    }

    #[test]
    fn test_identity_requires_both_fields() {
        let settings = Settings::from_parts(Some(parse("[identity]\nname = \"Only Name\"")), None);
        assert!(settings.identity().is_none());

        let settings = Settings::from_parts(
            Some(parse("[identity]\nname = \"Split\"")),
            Some(parse("[identity]\nemail = \"split@example.com\"")),
        );
        let identity = settings.identity().expect("pair resolved across layers");
        assert_eq!(identity.name, "Split");
        assert_eq!(identity.email, "split@example.com");
    }
}
