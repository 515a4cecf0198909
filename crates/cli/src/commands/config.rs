use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use roster_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct Field<'a> {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
    cli_flag: Option<&'a str>,
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = &options.overrides;

    let fields = [
        Field {
            key_path: "dataset.path",
            value: config.dataset.path.display().to_string(),
            env_keys: &["ROSTER_DATASET_PATH"],
            cli_flag: overrides.dataset_path.as_ref().map(|_| "--dataset"),
        },
        Field {
            key_path: "llm.provider",
            value: config.llm.provider.to_string(),
            env_keys: &["ROSTER_LLM_PROVIDER"],
            cli_flag: overrides.llm_provider.as_ref().map(|_| "--provider"),
        },
        Field {
            key_path: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["ROSTER_LLM_MODEL"],
            cli_flag: overrides.llm_model.as_ref().map(|_| "--model"),
        },
        Field {
            key_path: "llm.base_url",
            value: config
                .llm
                .base_url
                .clone()
                .unwrap_or_else(|| format!("<unset, using {}>", config.llm.effective_base_url())),
            env_keys: &["ROSTER_LLM_BASE_URL"],
            cli_flag: overrides.llm_base_url.as_ref().map(|_| "--base-url"),
        },
        Field {
            key_path: "llm.api_key",
            value: redact_secret(config.llm.api_key.is_some()),
            env_keys: &["ROSTER_LLM_API_KEY", "OPENAI_API_KEY"],
            cli_flag: None,
        },
        Field {
            key_path: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["ROSTER_LLM_TIMEOUT_SECS"],
            cli_flag: None,
        },
        Field {
            key_path: "session.exit_sentinel",
            value: config.session.exit_sentinel.clone(),
            env_keys: &["ROSTER_SESSION_EXIT_SENTINEL"],
            cli_flag: None,
        },
        Field {
            key_path: "session.prompt",
            value: format!("{:?}", config.session.prompt),
            env_keys: &[],
            cli_flag: None,
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["ROSTER_LOGGING_LEVEL", "ROSTER_LOG_LEVEL"],
            cli_flag: overrides.log_level.as_ref().map(|_| "--debug"),
        },
        Field {
            key_path: "logging.format",
            value: config.logging.format.to_string(),
            env_keys: &["ROSTER_LOGGING_FORMAT", "ROSTER_LOG_FORMAT"],
            cli_flag: None,
        },
    ];

    let mut lines =
        vec!["effective config (source precedence: cli > env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        render_line(
            field.key_path,
            &field.value,
            field_source(field, config_file_doc.as_ref(), config_file_path.as_deref()),
        )
    }));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field<'_>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(flag) = field.cli_flag {
        return format!("cli ({flag})");
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(present: bool) -> String {
    let rendered = if present { "<redacted>" } else { "<unset>" };
    rendered.to_string()
}
