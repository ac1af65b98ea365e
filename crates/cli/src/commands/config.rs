use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use mailbot_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut line = |key: &str, value: &str, env_key: Option<&str>| {
        lines.push(render_line(
            key,
            value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    line("database.url", &config.database.url, Some("MAILBOT_DATABASE_URL"));
    line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        Some("MAILBOT_DATABASE_MAX_CONNECTIONS"),
    );
    line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        Some("MAILBOT_DATABASE_TIMEOUT_SECS"),
    );

    line("mail.email_domain", &config.mail.email_domain, Some("MAILBOT_MAIL_EMAIL_DOMAIN"));
    line("mail.admin_host", &config.mail.admin_host, Some("MAILBOT_MAIL_ADMIN_HOST"));
    line("mail.admin_username", &config.mail.admin_username, Some("MAILBOT_MAIL_ADMIN_USERNAME"));
    let admin_password =
        if config.mail.admin_password.expose_secret().is_empty() { "<empty>" } else { "<redacted>" };
    line("mail.admin_password", admin_password, Some("MAILBOT_MAIL_ADMIN_PASSWORD"));
    line("mail.admin_contact", &config.mail.admin_contact, Some("MAILBOT_MAIL_ADMIN_CONTACT"));
    line(
        "mail.request_timeout_secs",
        &config.mail.request_timeout_secs.to_string(),
        Some("MAILBOT_MAIL_REQUEST_TIMEOUT_SECS"),
    );

    let app_token = redact_token(config.slack.app_token.expose_secret());
    let bot_token = redact_token(config.slack.bot_token.expose_secret());
    line("slack.app_token", &app_token, Some("MAILBOT_SLACK_APP_TOKEN"));
    line("slack.bot_token", &bot_token, Some("MAILBOT_SLACK_BOT_TOKEN"));

    line(
        "dialogue.max_reprompts",
        &config.dialogue.max_reprompts.to_string(),
        Some("MAILBOT_DIALOGUE_MAX_REPROMPTS"),
    );
    line(
        "dialogue.password_length",
        &config.dialogue.password_length.to_string(),
        Some("MAILBOT_DIALOGUE_PASSWORD_LENGTH"),
    );

    line("server.bind_address", &config.server.bind_address, Some("MAILBOT_SERVER_BIND_ADDRESS"));
    line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        Some("MAILBOT_SERVER_HEALTH_CHECK_PORT"),
    );

    line("logging.level", &config.logging.level, Some("MAILBOT_LOGGING_LEVEL"));
    line("logging.format", &format!("{:?}", config.logging.format), Some("MAILBOT_LOGGING_FORMAT"));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("mailbot.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/mailbot.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
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

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
