//! Provider resolution — pick a working credential at start-up.
//!
//! The primary credential is probed with a one-line completion; if it is
//! unset or fails for any reason the backup gets exactly one probe. The winning handle is
//! what every agent uses for the rest of the process.

use std::fmt;

use anyhow::{Context, Result, anyhow};
use serde_json::json;

use crate::config::ProviderConfig;
use crate::constants::{BACKUP_KEY_VARS, PRIMARY_KEY_VARS, PROBE_MAX_TOKENS, PROBE_PROMPT};
use crate::openai::{OpenAiClient, has_choices};
use crate::util::{env_first, mask_key};

/// A resolved endpoint, model, and credential.
#[derive(Clone)]
pub struct ProviderHandle {
    pub base_url: String,
    pub model: String,
    /// Which credential slot won ("primary" or "backup").
    pub credential: String,
    key: String,
}

impl ProviderHandle {
    pub fn new(base_url: &str, model: &str, credential: &str, key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            credential: credential.to_string(),
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn key_hint(&self) -> String {
        mask_key(&self.key)
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("credential", &self.credential)
            .field("key", &self.key_hint())
            .finish()
    }
}

/// Primary and backup API keys.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub primary: Option<String>,
    pub backup: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            primary: env_first(PRIMARY_KEY_VARS),
            backup: env_first(BACKUP_KEY_VARS),
        }
    }
}

/// Status of one probe attempt, for display only.
#[derive(Clone, Debug)]
pub struct ProbeReport {
    pub credential: &'static str,
    pub key_hint: String,
    pub outcome: std::result::Result<(), String>,
}

impl ProbeReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(()) => write!(f, "✅ Working key ({}): {}", self.credential, self.key_hint),
            Err(err) => write!(
                f,
                "❌ API key failed ({}): {} | Error: {err}",
                self.credential, self.key_hint
            ),
        }
    }
}

/// Send the minimal liveness completion with `key`.
pub async fn probe(client: &OpenAiClient, model: &str, key: &str) -> Result<()> {
    let body = json!({
        "model": model,
        "messages": [{"role": "user", "content": PROBE_PROMPT}],
        "max_tokens": PROBE_MAX_TOKENS,
    });
    let response = client.chat_completion(key, body).await?;
    if !has_choices(&response) {
        return Err(anyhow!("probe response has no choices: {response}"));
    }
    Ok(())
}

/// Resolve the provider handle, trying the primary then the backup key.
///
/// `report` receives one [`ProbeReport`] per attempt.
pub async fn resolve_provider(
    config: &ProviderConfig,
    credentials: &Credentials,
    mut report: impl FnMut(ProbeReport),
) -> Result<ProviderHandle> {
    let client = OpenAiClient::new(&config.base_url);

    let primary_err = match credentials.primary.as_deref() {
        Some(primary) => match attempt(&client, config, "primary", primary, &mut report).await {
            Ok(handle) => return Ok(handle),
            Err(err) => err,
        },
        None => {
            let err = anyhow!(
                "no primary credential: set one of {}",
                PRIMARY_KEY_VARS.join(", ")
            );
            report(ProbeReport {
                credential: "primary",
                key_hint: "(unset)".to_string(),
                outcome: Err(err.to_string()),
            });
            err
        }
    };

    let Some(backup) = credentials.backup.as_deref() else {
        return Err(primary_err).context(format!(
            "primary credential failed and no backup is set ({})",
            BACKUP_KEY_VARS.join(", ")
        ));
    };

    attempt(&client, config, "backup", backup, &mut report)
        .await
        .context("primary and backup credentials both failed the liveness probe")
}

async fn attempt(
    client: &OpenAiClient,
    config: &ProviderConfig,
    credential: &'static str,
    key: &str,
    report: &mut impl FnMut(ProbeReport),
) -> Result<ProviderHandle> {
    let outcome = probe(client, config.probe_model(), key).await;
    report(ProbeReport {
        credential,
        key_hint: mask_key(key),
        outcome: outcome.as_ref().map(|_| ()).map_err(|err| format!("{err:#}")),
    });
    outcome?;
    Ok(ProviderHandle::new(
        &config.base_url,
        &config.model,
        credential,
        key,
    ))
}
