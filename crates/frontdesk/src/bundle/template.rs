//! `{{dotted.path}}` interpolation for bundle texts.
//!
//! Placeholders are resolved against a JSON context (`{settings, clinic}`).
//! Unresolved references are left as-is, so rendering twice yields the same text.

use serde_json::Value;

/// Replace `{{a.b.c}}` placeholders with values looked up in `ctx`.
///
/// Whitespace inside the braces is ignored. Path segments may only contain
/// ASCII letters, digits, `_` and `.`; anything else is emitted literally.
/// Strings render unquoted, other values render as compact JSON.
pub fn render(input: &str, ctx: &Value) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            result.push_str("{{");
            rest = after_open;
            continue;
        };

        let path = after_open[..end].trim();
        if !is_valid_path(path) {
            // Not a placeholder; keep scanning right after the opening braces so a
            // nested `{{x}}` further on is still picked up.
            result.push_str("{{");
            rest = after_open;
            continue;
        }

        match lookup(ctx, path) {
            Some(value) => result.push_str(&display(value)),
            None => {
                result.push_str("{{");
                result.push_str(&after_open[..end]);
                result.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn lookup<'a>(ctx: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(ctx, |value, segment| value.as_object()?.get(segment))
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
