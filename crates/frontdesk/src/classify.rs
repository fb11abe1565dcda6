//! Rule-based text classifiers over a configuration snapshot.
//!
//! Every function here is pure: the same bundle and input always give the same
//! answer. Keyword matching is case-insensitive substring search; pattern matching
//! uses the bundle's compiled, case-insensitive intent regexes.

use regex::Regex;

use crate::bundle::{ConfigBundle, DEFAULT_CLINIC_NAME};

// ============================================================================
// Meta-query Heuristic Terms
// ============================================================================

/// Words that address the assistant itself.
pub const SELF_REFERENCE_TERMS: &[&str] = &["kamu"];

/// Words that turn a self-reference into a question about the assistant.
pub const INQUIRY_TERMS: &[&str] = &[
    "siapa",
    "apa",
    "jelaskan",
    "tentang",
    "perkenalkan",
    "kenalan",
];

/// Words that mark a question about capabilities.
pub const CAPABILITY_TERMS: &[&str] = &["bisa", "fitur", "kemampuan", "fungsi"];

// ============================================================================
// Types
// ============================================================================

/// What a meta-query asks about the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaQuery {
    /// Who the assistant is.
    Who,
    /// What it can do.
    Can,
    /// What the clinic is.
    About,
}

impl MetaQuery {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaQuery::Who => "who",
            MetaQuery::Can => "can",
            MetaQuery::About => "about",
        }
    }
}

/// Classifiers bound to one configuration snapshot.
#[derive(Clone, Copy)]
pub struct Classifiers<'a> {
    bundle: &'a ConfigBundle,
}

impl ConfigBundle {
    pub fn classifiers(&self) -> Classifiers<'_> {
        Classifiers { bundle: self }
    }
}

// ============================================================================
// Classifiers
// ============================================================================

impl<'a> Classifiers<'a> {
    /// Whether the text contains any crisis keyword. Empty keywords never match.
    pub fn is_crisis(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        contains_any(&text, &self.bundle.crisis.keywords)
    }

    /// The answer of the first FAQ trigger group whose keywords appear in the text.
    ///
    /// Only the first matching group counts; if its answer is missing or empty the
    /// message is not an FAQ.
    pub fn match_faq(&self, text: &str) -> Option<&'a str> {
        let text = text.to_lowercase();
        let trigger = self
            .bundle
            .faq_triggers
            .iter()
            .find(|t| contains_any(&text, &t.keywords))?;
        self.bundle
            .faq_answer(&trigger.answer_key)
            .filter(|answer| !answer.is_empty())
    }

    /// Whether the accumulated texts mention any domain keyword.
    pub fn is_domain_relevant<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> bool {
        let joined = texts.into_iter().collect::<Vec<_>>().join(" ").to_lowercase();
        contains_any(&joined, &self.bundle.domain_words)
    }

    /// Greeting, thanks, acknowledgement, or nothing at all.
    pub fn is_small_talk(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return true;
        }
        let p = &self.bundle.patterns;
        [&p.greeting, &p.thanks, &p.ack]
            .into_iter()
            .flatten()
            .any(|re| re.is_match(text))
    }

    /// Detect a question about the assistant itself.
    ///
    /// The configured `who`, `can` and `about` patterns are tried in that order;
    /// if none matches, [`meta_heuristic`](Self::meta_heuristic) decides.
    pub fn match_meta_query(&self, text: &str) -> Option<MetaQuery> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.meta_rules()
            .into_iter()
            .find_map(|(pattern, kind)| pattern.filter(|re| re.is_match(text)).map(|_| kind))
            .or_else(|| self.meta_heuristic(text))
    }

    /// Ordered pattern rules for meta-queries; first match wins.
    fn meta_rules(&self) -> [(Option<&'a Regex>, MetaQuery); 3] {
        let p = &self.bundle.patterns;
        [
            (p.who.as_ref(), MetaQuery::Who),
            (p.can.as_ref(), MetaQuery::Can),
            (p.about.as_ref(), MetaQuery::About),
        ]
    }

    /// Keyword fallback: a self-reference (or the clinic's name) together with an
    /// inquiry word is a meta-query. Capability words make it `Can`, the clinic's
    /// name makes it `About`, otherwise `Who`.
    pub fn meta_heuristic(&self, text: &str) -> Option<MetaQuery> {
        let text = text.to_lowercase();
        let names_clinic = self.clinic_tokens().iter().any(|t| text.contains(t.as_str()));
        let addresses_assistant =
            names_clinic || SELF_REFERENCE_TERMS.iter().any(|t| text.contains(t));

        if !addresses_assistant || !INQUIRY_TERMS.iter().any(|t| text.contains(t)) {
            return None;
        }
        if CAPABILITY_TERMS.iter().any(|t| text.contains(t)) {
            Some(MetaQuery::Can)
        } else if names_clinic {
            Some(MetaQuery::About)
        } else {
            Some(MetaQuery::Who)
        }
    }

    /// Lowercase tokens that name the clinic: the default brand plus the configured name.
    fn clinic_tokens(&self) -> Vec<String> {
        let mut tokens = vec![DEFAULT_CLINIC_NAME.to_lowercase()];
        let configured = self.bundle.clinic_name().to_lowercase();
        if !tokens.contains(&configured) {
            tokens.push(configured);
        }
        tokens
    }
}

/// Case-insensitive substring test; `text` must already be lowercase.
fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| text.contains(&k.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{
        CRISIS_FILE, DOMAIN_WORDS_FILE, FAQ_FILE, FAQ_KEYS_FILE, PATTERNS_FILE, SETTINGS_FILE,
        SourceSet,
    };

    fn bundle() -> ConfigBundle {
        let sources = SourceSet::default()
            .with(SETTINGS_FILE, r#"{"clinic": {"name": "Klinik Tenang"}}"#)
            .with(
                CRISIS_FILE,
                r#"{"keywords": ["Bunuh Diri", "akhiri hidup", ""], "message": "..."}"#,
            )
            .with(
                FAQ_FILE,
                r#"{"jam": "Kami buka 08.00-20.00", "tarif": "", "lokasi": "Jl. Merdeka 1"}"#,
            )
            .with(
                FAQ_KEYS_FILE,
                r#"{"jam": ["jam buka", "jam praktik"], "tarif": ["biaya"], "lokasi": ["alamat", "biaya parkir"]}"#,
            )
            .with(DOMAIN_WORDS_FILE, r#"["cemas", "Stres", "tidur"]"#)
            .with(
                PATTERNS_FILE,
                r#"{
                    "greeting": "^(halo|hai|hi)\\b",
                    "thanks": "\\b(makasih|terima kasih)\\b",
                    "ack": "^(ok|oke|sip)\\b",
                    "who": "\\bsiapa (kamu|anda)\\b",
                    "can": "\\bbisa apa\\b",
                    "about": "\\bapa itu curhatkuy\\b"
                }"#,
            );
        ConfigBundle::from_sources(&sources).bundle
    }

    #[test]
    fn crisis_is_case_insensitive_substring() {
        let b = bundle();
        let c = b.classifiers();
        assert!(c.is_crisis("aku ingin BUNUH DIRI rasanya"));
        assert!(c.is_crisis("mau akhiri hidup"));
        assert!(!c.is_crisis("aku sedih sekali"));
    }

    #[test]
    fn empty_crisis_keyword_never_matches() {
        let b = bundle();
        assert!(!b.classifiers().is_crisis("pesan biasa"));
    }

    #[test]
    fn faq_matches_first_trigger_group() {
        let b = bundle();
        let c = b.classifiers();
        assert_eq!(c.match_faq("Jam Buka hari ini?"), Some("Kami buka 08.00-20.00"));
        assert_eq!(c.match_faq("alamatnya di mana"), Some("Jl. Merdeka 1"));
        assert_eq!(c.match_faq("aku cemas"), None);
    }

    #[test]
    fn faq_with_empty_answer_is_not_a_match_even_if_later_group_matches() {
        let b = bundle();
        // "biaya" hits "tarif" first (empty answer); "biaya parkir" in "lokasi" is not consulted.
        assert_eq!(b.classifiers().match_faq("biaya parkir berapa"), None);
    }

    #[test]
    fn domain_relevance_over_accumulated_texts() {
        let b = bundle();
        let c = b.classifiers();
        assert!(c.is_domain_relevant(["halo", "aku susah TIDUR"]));
        assert!(c.is_domain_relevant(["lagi stres kerja"]));
        assert!(!c.is_domain_relevant(["resep nasi goreng"]));
        assert!(!c.is_domain_relevant(Vec::<&str>::new()));
    }

    #[test]
    fn small_talk_patterns_and_empty() {
        let b = bundle();
        let c = b.classifiers();
        assert!(c.is_small_talk("halo"));
        assert!(c.is_small_talk("   "));
        assert!(c.is_small_talk("Terima kasih ya"));
        assert!(c.is_small_talk("oke"));
        assert!(!c.is_small_talk("aku cemas terus"));
    }

    #[test]
    fn meta_patterns_in_rule_order() {
        let b = bundle();
        let c = b.classifiers();
        assert_eq!(c.match_meta_query("siapa kamu?"), Some(MetaQuery::Who));
        assert_eq!(c.match_meta_query("kamu bisa apa"), Some(MetaQuery::Can));
        assert_eq!(c.match_meta_query("apa itu CurhatKuy"), Some(MetaQuery::About));
        assert_eq!(c.match_meta_query(""), None);
        assert_eq!(c.match_meta_query("aku cemas"), None);
    }

    #[test]
    fn meta_heuristic_fallback() {
        let b = bundle();
        let c = b.classifiers();
        assert_eq!(c.meta_heuristic("jelaskan fitur kamu"), Some(MetaQuery::Can));
        assert_eq!(c.meta_heuristic("ceritakan tentang curhatkuy dong"), Some(MetaQuery::About));
        assert_eq!(c.meta_heuristic("Klinik Tenang itu apa"), Some(MetaQuery::About));
        assert_eq!(c.meta_heuristic("perkenalkan dirimu kamu"), Some(MetaQuery::Who));
        // Self-reference without an inquiry word.
        assert_eq!(c.meta_heuristic("kamu baik"), None);
    }

    #[test]
    fn no_patterns_configured_still_uses_heuristic() {
        let b = ConfigBundle::from_sources(&SourceSet::default()).bundle;
        let c = b.classifiers();
        assert!(!c.is_small_talk("halo"));
        assert_eq!(c.match_meta_query("kamu siapa"), Some(MetaQuery::Who));
    }
}
