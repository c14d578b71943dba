use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ChalkError, Result};
use crate::secret::SecretString;

/// Environment variable holding the hosted model API key.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable holding the retrieval knowledge-store identifier.
pub const ENV_VECTOR_STORE_ID: &str = "OPENAI_VECTOR_STORE_ID";
/// Environment variable overriding the model identifier.
pub const ENV_MODEL: &str = "OPENAI_MODEL";
/// Environment variable overriding the HTTP port.
pub const ENV_PORT: &str = "CHALK_PORT";

pub const DEFAULT_MODEL: &str = "gpt-5.1";

pub const DEFAULT_SYSTEM_PROMPT: &str = "Sos un experto en derecho laboral argentino, especializado en el Convenio Colectivo de Trabajo de Perfumistas. \
Tu rol es asesorar sobre escalas salariales, categorías, licencias y normativas específicas del sector. \
Respondé en español, citando artículos del CCT o leyes laborales cuando corresponda. \
Si no hay soporte documental en el Vector Store sobre una consulta específica, indicalo. \
Responder solo en base a los documentos cargados en el VS y legislación laboral vigente.";

pub const DEFAULT_ATTACHMENT_SEPARATOR: &str = "\n\nCONSULTA LABORAL: ";
pub const DEFAULT_FALLBACK_ANSWER: &str = "(No se pudo generar una respuesta legal)";
pub const DEFAULT_REPORT_HEADING: &str = "Informe Laboral - Sector Perfumistas";
pub const DEFAULT_FILENAME_PREFIX: &str = "consulta_laboral_perfumistas";

/// Top-level configuration for the Chalk assistant.
///
/// Loaded from `~/.chalk/config.toml` by default, then overlaid with
/// environment variables. Credentials are only ever taken from the
/// environment and are never written back to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChalkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl ChalkConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ChalkConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file. The API key is skipped.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ChalkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable source.
    ///
    /// Blank values are treated as unset, matching how an empty line in a
    /// `.env` file behaves.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.openai.api_key = Some(SecretString::new(key.trim()));
        }
        if let Some(id) = get(ENV_VECTOR_STORE_ID) {
            self.openai.vector_store_id = Some(id.trim().to_string());
        }
        if let Some(model) = get(ENV_MODEL) {
            self.openai.model = model.trim().to_string();
        }
        if let Some(port) = get(ENV_PORT) {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid {}", ENV_PORT),
            }
        }
    }

    /// Check that everything needed to talk to the completion service is set.
    ///
    /// Every missing item is named in a single error so the operator can fix
    /// them all at once.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.openai.api_key.as_ref().map_or(true, |k| k.is_blank()) {
            missing.push(ENV_API_KEY);
        }
        if self
            .openai
            .vector_store_id
            .as_deref()
            .map_or(true, |id| id.trim().is_empty())
        {
            missing.push(ENV_VECTOR_STORE_ID);
        }
        if self.openai.model.trim().is_empty() {
            missing.push(ENV_MODEL);
        }
        if !missing.is_empty() {
            return Err(ChalkError::Config(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }
        if self.openai.base_url.trim().is_empty() {
            return Err(ChalkError::Config("openai.base_url must not be empty".into()));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted document upload, in bytes.
    pub max_upload_bytes: usize,
    /// Idle minutes before a session is discarded.
    pub session_timeout_minutes: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_bytes: 20 * 1024 * 1024,
            session_timeout_minutes: 60,
        }
    }
}

/// Hosted completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    /// Knowledge store the retrieval tool searches.
    pub vector_store_id: Option<String>,
    pub request_timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            vector_store_id: None,
            request_timeout_secs: 120,
            api_key: None,
        }
    }
}

/// Conversation wording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub system_prompt: String,
    /// Placed between an attached document's text and the user's question.
    pub attachment_separator: String,
    /// Answer recorded when the service returns no text.
    pub fallback_answer: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            attachment_separator: DEFAULT_ATTACHMENT_SEPARATOR.to_string(),
            fallback_answer: DEFAULT_FALLBACK_ANSWER.to_string(),
        }
    }
}

/// Word report export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub report_heading: String,
    pub filename_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            report_heading: DEFAULT_REPORT_HEADING.to_string(),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ChalkConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.server.session_timeout_minutes, 60);
        assert_eq!(config.openai.model, "gpt-5.1");
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert!(config.openai.api_key.is_none());
        assert!(config.openai.vector_store_id.is_none());
        assert_eq!(
            config.assistant.fallback_answer,
            "(No se pudo generar una respuesta legal)"
        );
        assert_eq!(
            config.export.report_heading,
            "Informe Laboral - Sector Perfumistas"
        );
    }

    #[test]
    fn test_default_system_prompt_mentions_cct() {
        let config = AssistantConfig::default();
        assert!(config.system_prompt.contains("Convenio Colectivo de Trabajo de Perfumistas"));
        assert!(config.system_prompt.contains("Vector Store"));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[server]
port = 9000

[openai]
model = "gpt-4.1"
vector_store_id = "vs_file"
"#;
        let file = create_temp_config(content);
        let config = ChalkConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.openai.model, "gpt-4.1");
        assert_eq!(config.openai.vector_store_id.as_deref(), Some("vs_file"));
        assert_eq!(config.openai.request_timeout_secs, 120);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_api_key_in_file_is_ignored() {
        let content = r#"
[openai]
api_key = "sk-should-not-load"
"#;
        let file = create_temp_config(content);
        let config = ChalkConfig::load(file.path()).unwrap();
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = ChalkConfig::load(file.path());
        assert!(matches!(result, Err(ChalkError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = ChalkConfig::load_or_default(Path::new("/nonexistent/chalk/config.toml"));
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_save_and_reload_skips_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ChalkConfig::default();
        config.openai.api_key = Some(SecretString::new("sk-secret"));
        config.openai.vector_store_id = Some("vs_123".to_string());
        config.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("sk-secret"));

        let reloaded = ChalkConfig::load(&path).unwrap();
        assert_eq!(reloaded.openai.vector_store_id.as_deref(), Some("vs_123"));
        assert!(reloaded.openai.api_key.is_none());
    }

    #[test]
    fn test_apply_env_overrides_file_values() {
        let mut config = ChalkConfig::default();
        config.openai.vector_store_id = Some("vs_file".to_string());
        config.apply_env_with(env_of(&[
            (ENV_API_KEY, "sk-env"),
            (ENV_VECTOR_STORE_ID, "vs_env"),
            (ENV_MODEL, "gpt-4o"),
            (ENV_PORT, "9100"),
        ]));

        assert_eq!(config.openai.api_key.as_ref().unwrap().expose(), "sk-env");
        assert_eq!(config.openai.vector_store_id.as_deref(), Some("vs_env"));
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.server.port, 9100);
    }

    #[test]
    fn test_apply_env_ignores_blank_and_invalid_values() {
        let mut config = ChalkConfig::default();
        config.apply_env_with(env_of(&[
            (ENV_API_KEY, "   "),
            (ENV_MODEL, ""),
            (ENV_PORT, "not-a-port"),
        ]));

        assert!(config.openai.api_key.is_none());
        assert_eq!(config.openai.model, DEFAULT_MODEL);
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_validate_reports_all_missing_credentials() {
        let config = ChalkConfig::default();
        let err = config.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(ENV_API_KEY));
        assert!(msg.contains(ENV_VECTOR_STORE_ID));
    }

    #[test]
    fn test_validate_missing_store_only() {
        let mut config = ChalkConfig::default();
        config.apply_env_with(env_of(&[(ENV_API_KEY, "sk-env")]));
        let msg = config.validate().unwrap_err().to_string();
        assert!(!msg.contains(ENV_API_KEY));
        assert!(msg.contains(ENV_VECTOR_STORE_ID));
    }

    #[test]
    fn test_validate_ok_with_credentials() {
        let mut config = ChalkConfig::default();
        config.apply_env_with(env_of(&[
            (ENV_API_KEY, "sk-env"),
            (ENV_VECTOR_STORE_ID, "vs_env"),
        ]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_debug_does_not_leak_key() {
        let mut config = ChalkConfig::default();
        config.openai.api_key = Some(SecretString::new("sk-very-secret"));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
