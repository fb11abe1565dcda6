//! Compiled intent patterns from `patterns.json`.

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use super::error::BundleWarning;

/// Intent names recognized in `patterns.json`.
pub const GREETING: &str = "greeting";
pub const THANKS: &str = "thanks";
pub const ACK: &str = "ack";
pub const WHO: &str = "who";
pub const CAN: &str = "can";
pub const ABOUT: &str = "about";

/// Case-insensitive intent regexes. An intent with an empty or invalid pattern is
/// `None` and never matches.
#[derive(Debug, Clone, Default)]
pub struct IntentPatterns {
    /// Pattern sources as configured, in file order.
    pub sources: Map<String, Value>,
    pub greeting: Option<Regex>,
    pub thanks: Option<Regex>,
    pub ack: Option<Regex>,
    pub who: Option<Regex>,
    pub can: Option<Regex>,
    pub about: Option<Regex>,
}

impl IntentPatterns {
    /// Compile the known intents out of a `patterns.json` object.
    pub fn compile(sources: Map<String, Value>, warnings: &mut Vec<BundleWarning>) -> Self {
        let mut compile = |intent: &str| -> Option<Regex> {
            let pattern = match sources.get(intent)? {
                Value::String(s) if s.is_empty() => return None,
                Value::String(s) => s,
                Value::Null => return None,
                other => {
                    warnings.push(BundleWarning::InvalidPattern {
                        intent: intent.to_string(),
                        error: format!("expected a string, got {other}"),
                    });
                    return None;
                }
            };
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    warnings.push(BundleWarning::InvalidPattern {
                        intent: intent.to_string(),
                        error: e.to_string(),
                    });
                    None
                }
            }
        };

        let greeting = compile(GREETING);
        let thanks = compile(THANKS);
        let ack = compile(ACK);
        let who = compile(WHO);
        let can = compile(CAN);
        let about = compile(ABOUT);

        Self {
            sources,
            greeting,
            thanks,
            ack,
            who,
            can,
            about,
        }
    }

    /// Number of intents that compiled.
    pub fn compiled_count(&self) -> usize {
        [
            &self.greeting,
            &self.thanks,
            &self.ack,
            &self.who,
            &self.can,
            &self.about,
        ]
        .iter()
        .filter(|p| p.is_some())
        .count()
    }
}
