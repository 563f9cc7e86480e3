use anyhow::{bail, Context as _};
use discord_rest::{ClientOptions, DiscordPlatform, DEFAULT_API_BASE};
use purge_core::config::DEFAULT_CONFIG_FILE;
use purge_core::{CommunityId, Config, Credential};
use std::path::{Path, PathBuf};

/// Everything resolved from global flags, the environment, and the config
/// file. Flags and env always win over the file.
pub struct Context {
    config_path: PathBuf,
    token: Option<String>,
    guild: Option<String>,
    pub json: bool,
}

impl Context {
    pub fn new(
        config: Option<PathBuf>,
        token: Option<String>,
        guild: Option<String>,
        json: bool,
    ) -> Self {
        Self {
            config_path: config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
            token,
            guild,
            json,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        Config::load(&self.config_path)
            .with_context(|| format!("failed to load {}", self.config_path.display()))
    }

    /// Config that is safe to run with: error-level warnings abort.
    pub fn valid_config(&self) -> anyhow::Result<Config> {
        let config = self.load_config()?;
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn credential(&self) -> anyhow::Result<Credential> {
        let credential = Credential::new(self.token.clone().unwrap_or_default());
        if credential.is_empty() {
            bail!("no bot token: pass --token or set DISCORD_BOT_TOKEN");
        }
        Ok(credential)
    }

    pub fn community(&self, config: &Config) -> anyhow::Result<CommunityId> {
        if let Some(raw) = &self.guild {
            return Ok(raw.parse()?);
        }
        match config.community()? {
            Some(id) => Ok(id),
            None => bail!("no guild id: pass --guild, set DISCORD_GUILD_ID, or set guild_id in the config file"),
        }
    }

    pub fn platform(&self, config: &Config) -> anyhow::Result<DiscordPlatform> {
        let opts = ClientOptions {
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout: config.request_timeout(),
            ..Default::default()
        };
        DiscordPlatform::new(opts).context("failed to set up the Discord client")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir, token: Option<&str>, guild: Option<&str>) -> Context {
        Context::new(
            Some(dir.path().join("guild-purge.yaml")),
            token.map(String::from),
            guild.map(String::from),
            false,
        )
    }

    #[test]
    fn flag_guild_overrides_config() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            guild_id: Some("111".into()),
            ..Default::default()
        };
        assert_eq!(
            ctx(&dir, None, Some("222")).community(&config).unwrap(),
            CommunityId(222)
        );
        assert_eq!(
            ctx(&dir, None, None).community(&config).unwrap(),
            CommunityId(111)
        );
    }

    #[test]
    fn missing_guild_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ctx(&dir, None, None)
            .community(&Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("no guild id"));
    }

    #[test]
    fn blank_token_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(ctx(&dir, Some("   "), None).credential().is_err());
        assert!(ctx(&dir, None, None).credential().is_err());
        assert!(ctx(&dir, Some("abc"), None).credential().is_ok());
    }
}
