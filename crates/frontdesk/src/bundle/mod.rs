//! Clinic configuration bundle.
//!
//! The bundle is the file-backed data the router reads on every request: settings,
//! crisis keywords, FAQ answers and triggers, domain keywords, suggestion labels,
//! closing text, system prompt and intent patterns. A loaded [`ConfigBundle`] is
//! immutable; [`BundleStore`] swaps whole snapshots when a source file changes.

mod error;
mod patterns;
mod store;
mod template;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value, json};

pub use error::{BundleError, BundleWarning, log_load_warnings};
pub use patterns::IntentPatterns;
pub use store::{BundleStore, WriteReceipt};
pub use template::render;

// ============================================================================
// Source Files
// ============================================================================

pub const SETTINGS_FILE: &str = "settings.json";
pub const CRISIS_FILE: &str = "crisis.json";
pub const FAQ_FILE: &str = "faq.json";
pub const FAQ_KEYS_FILE: &str = "faq_keys.json";
pub const DOMAIN_WORDS_FILE: &str = "psy_words.json";
pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.md";
pub const SUGGESTIONS_FILE: &str = "suggestions.json";
pub const CLOSING_FILE: &str = "closing.txt";
pub const PATTERNS_FILE: &str = "patterns.json";

/// Every file that backs the bundle. Also the admin write allow-list.
pub const SOURCE_FILES: [&str; 9] = [
    SETTINGS_FILE,
    CRISIS_FILE,
    FAQ_FILE,
    FAQ_KEYS_FILE,
    DOMAIN_WORDS_FILE,
    SYSTEM_PROMPT_FILE,
    SUGGESTIONS_FILE,
    CLOSING_FILE,
    PATTERNS_FILE,
];

/// Map a requested file name onto its allow-listed source name.
pub fn allowed_source(name: &str) -> Option<&'static str> {
    SOURCE_FILES.iter().copied().find(|f| *f == name)
}

/// Whether a source is stored as JSON (the rest are plain text).
pub fn is_json_source(name: &str) -> bool {
    name.ends_with(".json")
}

// ============================================================================
// Settings
// ============================================================================

pub const DEFAULT_CLINIC_NAME: &str = "CurhatKuy";

const DEFAULT_MAX_TURNS: u32 = 5;
const DEFAULT_CLASSIFY_CONFIDENCE: f64 = 0.4;
const DEFAULT_REPLY_FALLBACK: &str = "Baik, terima kasih sudah berbagi.";
const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://127.0.0.1:5500", "http://localhost:5500"];

/// Typed view of `settings.json`. Unknown keys stay available through
/// [`ConfigBundle::settings_raw`] for templating.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_turns: u32,
    /// Minimum classifier confidence for a specialist recommendation.
    pub classify_confidence: f64,
    /// Generative model name. Falls back to the provider default when unset.
    pub model: Option<String>,
    pub reply_fallback: String,
    pub admin_enabled: bool,
    pub admin_token: String,
    pub cors_origins: Vec<String>,
    /// Whether an FAQ answer counts against the session's turn budget.
    pub faq_consumes_turn: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            classify_confidence: DEFAULT_CLASSIFY_CONFIDENCE,
            model: None,
            reply_fallback: DEFAULT_REPLY_FALLBACK.to_string(),
            admin_enabled: false,
            admin_token: String::new(),
            cors_origins: DEFAULT_CORS_ORIGINS.map(str::to_string).to_vec(),
            faq_consumes_turn: true,
        }
    }
}

impl Settings {
    /// Read each key on its own so one bad value only resets that key.
    ///
    /// Numbers are coerced leniently: `"3"`, `3.0` and `3.9` all give 3 turns,
    /// negatives give 0. Flags follow JSON truthiness.
    pub fn from_raw(raw: &Map<String, Value>, warnings: &mut Vec<BundleWarning>) -> Self {
        let mut settings = Self::default();
        let mut read = |key: &'static str, apply: &mut dyn FnMut(&Value) -> bool| {
            if let Some(value) = raw.get(key).filter(|v| !v.is_null())
                && !apply(value)
            {
                warnings.push(BundleWarning::InvalidSetting {
                    key,
                    value: value.to_string(),
                });
            }
        };

        read("max_turns", &mut |v| {
            as_number(v)
                .map(|n| settings.max_turns = n.clamp(0.0, u32::MAX as f64) as u32)
                .is_some()
        });
        read("classify_confidence", &mut |v| {
            as_number(v)
                .map(|n| settings.classify_confidence = n)
                .is_some()
        });
        read("model", &mut |v| {
            v.as_str()
                .map(|m| settings.model = Some(m.to_string()))
                .is_some()
        });
        read("reply_fallback", &mut |v| {
            v.as_str()
                .map(|t| settings.reply_fallback = t.to_string())
                .is_some()
        });
        read("admin_enabled", &mut |v| {
            settings.admin_enabled = truthy(v);
            true
        });
        read("admin_token", &mut |v| match v {
            Value::String(_) | Value::Number(_) => {
                settings.admin_token = display(v);
                true
            }
            _ => false,
        });
        read("cors_origins", &mut |v| match v {
            Value::Array(_) | Value::String(_) => {
                settings.cors_origins = string_list(v);
                true
            }
            _ => false,
        });
        read("faq_consumes_turn", &mut |v| {
            settings.faq_consumes_turn = truthy(v);
            true
        });

        settings
    }
}

/// A finite number from a JSON number or numeric string.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

// ============================================================================
// Bundle Types
// ============================================================================

/// Crisis keywords and the (templated) safety message.
#[derive(Debug, Clone, Default)]
pub struct CrisisConfig {
    pub keywords: Vec<String>,
    pub message: String,
}

/// A keyword group that triggers one FAQ answer.
#[derive(Debug, Clone)]
pub struct FaqTrigger {
    pub answer_key: String,
    pub keywords: Vec<String>,
}

/// One immutable configuration snapshot.
#[derive(Debug, Clone, Default)]
pub struct ConfigBundle {
    pub settings: Settings,
    /// `settings.json` exactly as parsed.
    pub settings_raw: Value,
    pub clinic: Value,
    pub crisis: CrisisConfig,
    /// FAQ answer key → templated answer, in file order.
    pub faq: Vec<(String, String)>,
    /// Trigger groups, checked in file order.
    pub faq_triggers: Vec<FaqTrigger>,
    pub domain_words: Vec<String>,
    pub system_prompt: String,
    /// Suggestion category → specialist label, in file order.
    pub suggestions: Vec<(String, String)>,
    pub closing: String,
    pub patterns: IntentPatterns,
}

/// Result of loading a bundle: the snapshot plus anything that fell back to defaults.
#[derive(Debug)]
pub struct BundleLoad {
    pub bundle: ConfigBundle,
    pub warnings: Vec<BundleWarning>,
}

// ============================================================================
// Raw Sources
// ============================================================================

/// Raw contents of one source file.
#[derive(Debug, Clone)]
pub enum SourceText {
    Missing,
    Unreadable(String),
    Text(String),
}

/// Raw contents of all source files, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    texts: HashMap<&'static str, SourceText>,
}

impl SourceSet {
    /// Set the text of one source (builder style, used by tests and tooling).
    pub fn with(mut self, file: &'static str, text: impl Into<String>) -> Self {
        self.texts.insert(file, SourceText::Text(text.into()));
        self
    }

    pub fn get(&self, file: &'static str) -> &SourceText {
        self.texts.get(file).unwrap_or(&SourceText::Missing)
    }

    /// Read every source file under `dir`.
    pub async fn read_dir(dir: &Path) -> Self {
        let mut texts = HashMap::new();
        for file in SOURCE_FILES {
            let text = match tokio::fs::read_to_string(dir.join(file)).await {
                Ok(t) => SourceText::Text(t),
                Err(e) if e.kind() == ErrorKind::NotFound => SourceText::Missing,
                Err(e) => SourceText::Unreadable(e.to_string()),
            };
            texts.insert(file, text);
        }
        Self { texts }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl ConfigBundle {
    /// Load the bundle from a config directory.
    pub async fn load(dir: &Path) -> BundleLoad {
        Self::from_sources(&SourceSet::read_dir(dir).await)
    }

    /// Build a bundle from raw source texts. Pure: the same sources always give the
    /// same bundle.
    pub fn from_sources(sources: &SourceSet) -> BundleLoad {
        let mut warnings = Vec::new();

        let settings_map = read_object(sources, SETTINGS_FILE, &mut warnings);
        let settings = Settings::from_raw(&settings_map, &mut warnings);
        let settings_raw = Value::Object(settings_map);
        let clinic = match settings_raw.get("clinic") {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        };
        let ctx = json!({ "settings": settings_raw, "clinic": clinic });

        let crisis_raw = read_object(sources, CRISIS_FILE, &mut warnings);
        let crisis = CrisisConfig {
            keywords: crisis_raw.get("keywords").map(string_list).unwrap_or_default(),
            message: render(
                &crisis_raw.get("message").map(display).unwrap_or_default(),
                &ctx,
            ),
        };

        let faq = read_object(sources, FAQ_FILE, &mut warnings)
            .iter()
            .map(|(key, answer)| (key.clone(), render(&display(answer), &ctx)))
            .collect();

        let faq_triggers = read_object(sources, FAQ_KEYS_FILE, &mut warnings)
            .iter()
            .map(|(key, keywords)| FaqTrigger {
                answer_key: key.clone(),
                keywords: string_list(keywords),
            })
            .collect();

        let domain_words = match read_json(sources, DOMAIN_WORDS_FILE, &mut warnings) {
            Some(value @ Value::Array(_)) => string_list(&value),
            Some(_) => {
                warnings.push(BundleWarning::InvalidJson {
                    file: DOMAIN_WORDS_FILE,
                    error: "expected an array".to_string(),
                });
                Vec::new()
            }
            None => Vec::new(),
        };

        let system_prompt = render(
            read_text(sources, SYSTEM_PROMPT_FILE, &mut warnings).trim(),
            &ctx,
        );

        let suggestions = read_object(sources, SUGGESTIONS_FILE, &mut warnings)
            .iter()
            .map(|(category, label)| (category.clone(), display(label)))
            .collect();

        let closing = render(read_text(sources, CLOSING_FILE, &mut warnings).trim(), &ctx);

        let patterns = IntentPatterns::compile(
            read_object(sources, PATTERNS_FILE, &mut warnings),
            &mut warnings,
        );

        BundleLoad {
            bundle: ConfigBundle {
                settings,
                settings_raw,
                clinic,
                crisis,
                faq,
                faq_triggers,
                domain_words,
                system_prompt,
                suggestions,
                closing,
                patterns,
            },
            warnings,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn clinic_name(&self) -> &str {
        self.clinic
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CLINIC_NAME)
    }

    pub fn faq_answer(&self, key: &str) -> Option<&str> {
        self.faq
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, answer)| answer.as_str())
    }

    pub fn suggestion_label(&self, category: &str) -> Option<&str> {
        self.suggestions
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, label)| label.as_str())
    }

    /// Full snapshot in the shape served by `GET /admin/config`.
    pub fn snapshot(&self) -> Value {
        let faq_keys: Map<String, Value> = self
            .faq_triggers
            .iter()
            .map(|t| (t.answer_key.clone(), json!(t.keywords)))
            .collect();

        json!({
            "settings": self.settings_raw,
            "clinic": self.clinic,
            "crisis": {
                "keywords": self.crisis.keywords,
                "message": self.crisis.message,
            },
            "faq": pairs_to_object(&self.faq),
            "faq_keys": faq_keys,
            "psy_words": self.domain_words,
            "system_prompt": self.system_prompt,
            "suggestions": pairs_to_object(&self.suggestions),
            "closing": self.closing,
            "patterns": self.patterns.sources,
        })
    }
}

// ============================================================================
// Private Helpers
// ============================================================================

fn read_text(sources: &SourceSet, file: &'static str, warnings: &mut Vec<BundleWarning>) -> String {
    match sources.get(file) {
        SourceText::Text(text) => text.clone(),
        SourceText::Missing => {
            warnings.push(BundleWarning::Missing { file });
            String::new()
        }
        SourceText::Unreadable(error) => {
            warnings.push(BundleWarning::Unreadable {
                file,
                error: error.clone(),
            });
            String::new()
        }
    }
}

fn read_json(
    sources: &SourceSet,
    file: &'static str,
    warnings: &mut Vec<BundleWarning>,
) -> Option<Value> {
    let text = match sources.get(file) {
        SourceText::Text(text) => text,
        _ => {
            read_text(sources, file, warnings);
            return None;
        }
    };
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            warnings.push(BundleWarning::InvalidJson {
                file,
                error: e.to_string(),
            });
            None
        }
    }
}

fn read_object(
    sources: &SourceSet,
    file: &'static str,
    warnings: &mut Vec<BundleWarning>,
) -> Map<String, Value> {
    match read_json(sources, file, warnings) {
        Some(Value::Object(map)) => map,
        Some(_) => {
            warnings.push(BundleWarning::InvalidJson {
                file,
                error: "expected an object".to_string(),
            });
            Map::new()
        }
        None => Map::new(),
    }
}

/// Strings out of a JSON array; a bare string counts as a one-item list.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn pairs_to_object(pairs: &[(String, String)]) -> Value {
    Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================
