//! End-of-session topic classification.

use serde_json::Value;

/// Category reported when the conversation is outside the clinic's domain, or when
/// the classifier's answer cannot be used.
pub const NON_DOMAIN_CATEGORY: &str = "non_psikologi";

/// Parsed classifier answer.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicVerdict {
    pub category: String,
    /// Finite confidence as reported; `None` when absent or not numeric.
    pub confidence: Option<f64>,
    /// A confidence number or string was given but is not a finite number
    /// (`"NaN"`, `"tinggi"`). Such a verdict never earns a recommendation.
    pub confidence_unusable: bool,
}

impl Default for TopicVerdict {
    fn default() -> Self {
        Self {
            category: NON_DOMAIN_CATEGORY.to_string(),
            confidence: None,
            confidence_unusable: false,
        }
    }
}

impl TopicVerdict {
    /// Parse the generator's raw answer, tolerating prose around the JSON object.
    ///
    /// Never fails: anything unusable yields the default verdict.
    pub fn parse(raw: &str) -> Self {
        let Some(object) = extract_object(raw)
            .and_then(|s| serde_json::from_str::<Value>(s).ok())
            .filter(Value::is_object)
        else {
            return Self::default();
        };

        let category = object
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or(NON_DOMAIN_CATEGORY)
            .to_string();
        let (confidence, confidence_unusable) = match object.get("confidence") {
            Some(Value::Number(n)) => finite(n.as_f64()),
            Some(Value::String(s)) => finite(s.trim().parse::<f64>().ok()),
            _ => (None, false),
        };

        Self {
            category,
            confidence,
            confidence_unusable,
        }
    }

    /// Whether the verdict is confident enough to recommend a specialist.
    /// An absent confidence passes; an unusable one does not.
    pub fn meets_threshold(&self, min: f64) -> bool {
        !self.confidence_unusable && self.confidence.is_none_or(|c| c >= min)
    }

    /// Confidence rounded to three decimals for reporting.
    pub fn rounded_confidence(&self) -> Option<f64> {
        self.confidence.map(|c| (c * 1000.0).round() / 1000.0)
    }
}

fn finite(value: Option<f64>) -> (Option<f64>, bool) {
    match value.filter(|c| c.is_finite()) {
        Some(c) => (Some(c), false),
        None => (None, true),
    }
}

/// The span from the first `{` to the last `}`, inclusive.
fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

/// Prompt asking the generator to label a conversation.
pub fn classification_prompt<'a>(
    labels: impl IntoIterator<Item = &'a str>,
    conversation: &str,
) -> String {
    let labels: Vec<&str> = labels
        .into_iter()
        .chain(std::iter::once(NON_DOMAIN_CATEGORY))
        .collect();
    format!(
        "Klasifikasikan topik obrolan berikut ke salah satu label:\n{}.\n\
         Balas ONLY dalam JSON: {{\"category\":\"<label>\", \"confidence\": <0..1>}}\n\n\
         OBROLAN:\n{}",
        labels.join(", "),
        conversation
    )
}
