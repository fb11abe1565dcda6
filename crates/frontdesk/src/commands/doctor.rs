//! `frontdesk doctor`: check the server config and the clinic bundle.

use std::net::IpAddr;
use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;

use frontdesk::bundle::{BundleLoad, BundleWarning, ConfigBundle};
use frontdesk::config::{Config, ConfigError};
use frontdesk::llm::ProviderRegistry;

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Warn,
    Error,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Ok => "  OK   ",
            Status::Warn => "  WARN ",
            Status::Error => "  ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
struct Check {
    status: Status,
    message: String,
}

impl Check {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: Status::Warn,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Section {
    name: &'static str,
    checks: Vec<Check>,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    ok: usize,
    warn: usize,
    error: usize,
}

#[derive(Debug, Serialize)]
struct Report {
    status: Status,
    sections: Vec<Section>,
    summary: Summary,
}

impl Report {
    fn new(sections: Vec<Section>) -> Self {
        let checks = || sections.iter().flat_map(|s| &s.checks);

        let mut summary = Summary::default();
        for check in checks() {
            match check.status {
                Status::Ok => summary.ok += 1,
                Status::Warn => summary.warn += 1,
                Status::Error => summary.error += 1,
            }
        }
        let status = checks().map(|c| c.status).max().unwrap_or(Status::Ok);

        Self {
            status,
            sections,
            summary,
        }
    }

    fn print(&self, format: &str) -> Result<()> {
        if format == "json" {
            println!("{}", serde_json::to_string_pretty(self)?);
        } else {
            print!("{}", self.to_text());
        }
        Ok(())
    }

    fn to_text(&self) -> String {
        let mut out = format!("Frontdesk Doctor\n{}\n", "=".repeat(50));

        for section in self.sections.iter().filter(|s| !s.checks.is_empty()) {
            out.push_str(&format!(
                "\n{}\n{}\n",
                section.name,
                "-".repeat(section.name.len())
            ));
            for check in &section.checks {
                out.push_str(&format!("{} {}\n", check.status.label(), check.message));
            }
        }

        let verdict = match self.status {
            Status::Ok => "PASS",
            Status::Warn => "PASS (with warnings)",
            Status::Error => "FAIL",
        };
        out.push_str(&format!(
            "\n{verdict}: {} ok, {} warning(s), {} error(s)\n",
            self.summary.ok, self.summary.warn, self.summary.error,
        ));
        out
    }
}

// ============================================================================
// Entry Point
// ============================================================================

pub async fn run(config_path: &str, config_dir_override: Option<&Path>, format: &str) -> Result<()> {
    let mut sections = Vec::new();

    let (checks, config) = check_config(config_path).await;
    sections.push(Section {
        name: "Configuration",
        checks,
    });

    if let Some(config) = config {
        let dir = super::bundle_dir(&config, config_path, config_dir_override);
        let load = ConfigBundle::load(&dir).await;
        sections.push(Section {
            name: "Clinic Bundle",
            checks: check_bundle(&dir, &load),
        });
        sections.push(Section {
            name: "Provider",
            checks: check_provider(&load.bundle),
        });
        sections.push(Section {
            name: "Security",
            checks: check_security(&config, &load.bundle),
        });
    }

    let report = Report::new(sections);
    report.print(format)?;

    if report.summary.error > 0 {
        bail!("{} error(s) found", report.summary.error);
    }
    Ok(())
}

// ============================================================================
// Checks
// ============================================================================

async fn check_config(config_path: &str) -> (Vec<Check>, Option<Config>) {
    let mut checks = Vec::new();

    if Path::new(config_path).exists() {
        checks.push(Check::ok(format!("Config file '{config_path}' found")));
    } else {
        checks.push(Check::ok(format!(
            "Config file '{config_path}' not found, using defaults"
        )));
    }

    let config = match Config::load(config_path).await {
        Ok(c) => c,
        Err(e) => {
            checks.push(Check::error(match &e {
                ConfigError::Yaml(_) => format!("Invalid YAML: {e}"),
                ConfigError::MissingEnvVar(var) => format!("Environment variable '{var}' is not set"),
                _ => format!("Failed to load config: {e}"),
            }));
            return (checks, None);
        }
    };

    if config.server.host.parse::<IpAddr>().is_err() {
        checks.push(Check::error(format!(
            "Invalid server host '{}' (must be a valid IP address)",
            config.server.host,
        )));
    }
    if config.server.max_connections == 0 {
        checks.push(Check::error("server.max_connections must be greater than 0"));
    }

    (checks, Some(config))
}

fn check_bundle(dir: &Path, load: &BundleLoad) -> Vec<Check> {
    let mut checks = Vec::new();
    let bundle = &load.bundle;

    if dir.is_dir() {
        checks.push(Check::ok(format!("Config directory '{}'", dir.display())));
    } else {
        checks.push(Check::error(format!(
            "Config directory '{}' not found",
            dir.display()
        )));
    }

    checks.extend(load.warnings.iter().map(warning_check));

    checks.push(Check::ok(format!(
        "Clinic '{}', {} turn(s) per session",
        bundle.clinic_name(),
        bundle.settings.max_turns,
    )));

    if bundle.crisis.keywords.is_empty() {
        checks.push(Check::warn(
            "No crisis keywords configured; crisis messages will not be detected",
        ));
    }
    if bundle.domain_words.is_empty() {
        checks.push(Check::warn(
            "No domain words configured; every free-form message is off-topic",
        ));
    }
    for trigger in &bundle.faq_triggers {
        if bundle.faq_answer(&trigger.answer_key).is_none() {
            checks.push(Check::warn(format!(
                "FAQ trigger '{}' has no answer",
                trigger.answer_key
            )));
        }
    }

    checks.push(Check::ok(format!(
        "{} FAQ answer(s), {} intent pattern(s) compiled",
        bundle.faq.len(),
        bundle.patterns.compiled_count(),
    )));
    checks
}

/// Unreadable or unparseable sources are errors: the server would silently run
/// them as empty.
fn warning_check(warning: &BundleWarning) -> Check {
    match warning {
        BundleWarning::Missing { file } => Check::warn(format!("{file} missing, using empty default")),
        BundleWarning::Unreadable { file, error } => Check::error(format!("{file} unreadable: {error}")),
        BundleWarning::InvalidJson { file, error } => Check::error(format!("{file} is not valid: {error}")),
        BundleWarning::InvalidPattern { intent, error } => {
            Check::warn(format!("Pattern '{intent}' does not compile: {error}"))
        }
        BundleWarning::InvalidSetting { key, value } => {
            Check::warn(format!("settings.json '{key}' has unusable value {value}, using default"))
        }
    }
}

fn check_provider(bundle: &ConfigBundle) -> Vec<Check> {
    let providers = ProviderRegistry::from_vars(|name| std::env::var(name).ok());
    let model = bundle
        .settings
        .model
        .as_deref()
        .unwrap_or(providers.default_model());

    let check = match providers.provider() {
        Some(provider) => Check::ok(format!("Provider '{provider}' (model: {model})")),
        None => Check::warn(
            "No provider configured (set GEMINI_API_KEY or OPENAI_API_KEY); \
             generated replies are disabled",
        ),
    };
    vec![check]
}

fn check_security(config: &Config, bundle: &ConfigBundle) -> Vec<Check> {
    let mut checks = Vec::new();
    let settings = &bundle.settings;

    checks.push(match (settings.admin_enabled, settings.admin_token.len()) {
        (false, _) => Check::ok("Admin endpoints disabled"),
        (true, 0) => Check::warn(
            "Admin endpoints enabled without admin_token; every admin request is rejected",
        ),
        (true, n) if n < 16 => Check::warn("admin_token is shorter than 16 characters"),
        (true, _) => Check::ok("Admin endpoints enabled with token"),
    });

    if config.server.host == "0.0.0.0" && settings.cors_origins.iter().any(|o| o == "*") {
        checks.push(Check::warn(
            "Server binds to 0.0.0.0 and CORS allows any origin",
        ));
    }
    checks
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use frontdesk::bundle::SourceSet;

    use super::*;

    fn empty_bundle() -> BundleLoad {
        ConfigBundle::from_sources(&SourceSet::default())
    }

    #[test]
    fn worst_check_decides_status() {
        let report = Report::new(vec![Section {
            name: "Test",
            checks: vec![Check::ok("fine"), Check::warn("meh")],
        }]);
        assert_eq!(report.status, Status::Warn);
        assert_eq!(report.summary.ok, 1);
        assert_eq!(report.summary.warn, 1);

        let report = Report::new(vec![Section {
            name: "Test",
            checks: vec![Check::error("broken"), Check::ok("fine")],
        }]);
        assert_eq!(report.status, Status::Error);
        assert_eq!(report.summary.error, 1);

        assert_eq!(Report::new(Vec::new()).status, Status::Ok);
    }

    #[test]
    fn json_report_shape() {
        let report = Report::new(vec![Section {
            name: "Clinic Bundle",
            checks: vec![Check::ok("found"), Check::warn("faq.json missing")],
        }]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "warn");
        assert_eq!(json["summary"]["warn"], 1);
        assert_eq!(json["sections"][0]["name"], "Clinic Bundle");
        assert_eq!(json["sections"][0]["checks"][1]["status"], "warn");
    }

    #[test]
    fn text_report_skips_empty_sections() {
        let report = Report::new(vec![
            Section {
                name: "Empty",
                checks: Vec::new(),
            },
            Section {
                name: "Provider",
                checks: vec![Check::ok("Provider 'gemini'")],
            },
        ]);
        let text = report.to_text();
        assert!(!text.contains("Empty"));
        assert!(text.contains("Provider\n--------\n"));
        assert!(text.ends_with("PASS: 1 ok, 0 warning(s), 0 error(s)\n"));
    }

    #[test]
    fn unparseable_source_is_an_error() {
        let check = warning_check(&BundleWarning::InvalidJson {
            file: "faq.json",
            error: "expected value".to_string(),
        });
        assert_eq!(check.status, Status::Error);
        assert!(check.message.contains("faq.json"));

        let check = warning_check(&BundleWarning::Missing {
            file: "closing.txt",
        });
        assert_eq!(check.status, Status::Warn);

        let check = warning_check(&BundleWarning::InvalidSetting {
            key: "max_turns",
            value: "\"lots\"".to_string(),
        });
        assert_eq!(check.status, Status::Warn);
        assert!(check.message.contains("max_turns"));
    }

    #[test]
    fn missing_bundle_dir_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let checks = check_bundle(&tmp.path().join("absent"), &empty_bundle());
        assert_eq!(checks[0].status, Status::Error);
    }

    #[test]
    fn admin_without_token_warns() {
        let mut load = empty_bundle();
        load.bundle.settings.admin_enabled = true;

        let checks = check_security(&Config::default(), &load.bundle);
        assert_eq!(checks[0].status, Status::Warn);

        load.bundle.settings.admin_token = "a-sufficiently-long-token".to_string();
        let checks = check_security(&Config::default(), &load.bundle);
        assert_eq!(checks[0].status, Status::Ok);
    }
}
