use std::{
    env,
    fs::{create_dir_all, read_to_string, File},
    path::Path,
    process::Command,
};

use home::home_dir;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API token for the save service. Resolved through `resolve_secret`,
    /// so it may be a literal value, `env:NAME`, or `cmd:...`. Missing token
    /// means requests go out unauthenticated.
    pub api_token: Option<String>,
}

fn default_api_url() -> String {
    "https://api.pagestash.app/api/graphql".to_string()
}

pub fn get_config() -> anyhow::Result<Config> {
    let mut config_buf = home_dir().ok_or(anyhow::anyhow!("Can't determine home dir"))?;
    config_buf.push(".config/stash/");
    let config_dir = config_buf.as_path();
    if !config_dir.exists() {
        create_dir_all(config_dir)?;
    }
    config_buf.push("config.toml");
    let config_file = config_buf.as_path();
    if !config_file.exists() {
        File::create(config_file)?;
    }
    load_config(config_file)
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config_str = read_to_string(path)?;
    let config = toml::from_str(&config_str)?;
    Ok(config)
}

/// Resolve a secret from its config representation. Values prefixed with
/// `env:` read an environment variable, `cmd:` run a shell command and use
/// its trimmed stdout, anything else is taken literally.
pub fn resolve_secret(raw: &str) -> anyhow::Result<String> {
    if let Some(var_name) = raw.strip_prefix("env:") {
        return env::var(var_name)
            .map_err(|_| anyhow::anyhow!("Environment variable '{}' is not set", var_name));
    }
    if let Some(command) = raw.strip_prefix("cmd:") {
        let output = Command::new("sh").arg("-c").arg(command).output()?;
        if !output.status.success() {
            anyhow::bail!("Secret command exited with status {}", output.status);
        }
        let secret = String::from_utf8(output.stdout)?;
        return Ok(secret.trim().to_string());
    }
    Ok(raw.to_string())
}
