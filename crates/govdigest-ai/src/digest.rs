//! Digest extraction from model output.
//!
//! The request asks for structured JSON, so that is tried first. Older
//! prompts produced prose with a literal `Cons` marker line, kept here as a
//! fallback. Anything else yields the fixed placeholder triple; parsing
//! never fails and never panics.

use govdigest_core::policy::PolicyDigest;
use serde::Deserialize;

#[derive(Deserialize)]
struct StructuredDigest {
    summary: String,
    pros: String,
    cons: String,
}

/// Parse model output into a digest, falling back to
/// [`PolicyDigest::unavailable`] when neither form applies.
pub fn parse_digest(text: &str) -> PolicyDigest {
    parse_structured(text)
        .or_else(|| parse_marker_lines(text))
        .unwrap_or_else(PolicyDigest::unavailable)
}

/// Structured form: a JSON object with `summary`, `pros`, and `cons`,
/// possibly wrapped in a Markdown code fence.
fn parse_structured(text: &str) -> Option<PolicyDigest> {
    let body = strip_code_fence(text.trim());
    let parsed: StructuredDigest = serde_json::from_str(body).ok()?;
    let digest = PolicyDigest {
        summary: parsed.summary.trim().to_string(),
        pros: parsed.pros.trim().to_string(),
        cons: parsed.cons.trim().to_string(),
    };
    (!digest.summary.is_empty() && !digest.pros.is_empty() && !digest.cons.is_empty())
        .then_some(digest)
}

/// Prose form: first line is the summary, then pros up to a line equal to
/// `Cons` (or `Cons:`), then cons.
fn parse_marker_lines(text: &str) -> Option<PolicyDigest> {
    let lines: Vec<&str> = text.lines().collect();
    let marker = lines
        .iter()
        .position(|line| matches!(line.trim(), "Cons" | "Cons:"))?;

    let summary = lines.first()?.trim().to_string();
    let pros = lines.get(1..marker)?.join("\n").trim().to_string();
    let cons = lines.get(marker + 1..)?.join("\n").trim().to_string();

    (!summary.is_empty() && !pros.is_empty() && !cons.is_empty()).then_some(PolicyDigest {
        summary,
        pros,
        cons,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_json_parses() {
        let digest = parse_digest(
            r#"{"summary": "A new rule.", "pros": "Cleaner air.", "cons": "Costs money."}"#,
        );
        assert_eq!(digest.summary, "A new rule.");
        assert_eq!(digest.pros, "Cleaner air.");
        assert_eq!(digest.cons, "Costs money.");
    }

    #[test]
    fn structured_json_in_code_fence_parses() {
        let text = "```json\n{\"summary\": \"S.\", \"pros\": \"P.\", \"cons\": \"C.\"}\n```";
        let digest = parse_digest(text);
        assert_eq!(digest.summary, "S.");
        assert_eq!(digest.cons, "C.");
    }

    #[test]
    fn marker_lines_fallback_parses() {
        let text = "The policy sets new air standards.\nPros\n- Healthier cities\nCons\n- Higher compliance costs";
        let digest = parse_digest(text);
        assert_eq!(digest.summary, "The policy sets new air standards.");
        assert_eq!(digest.pros, "Pros\n- Healthier cities");
        assert_eq!(digest.cons, "- Higher compliance costs");
    }

    #[test]
    fn cons_marker_with_colon_is_accepted() {
        let text = "Summary line.\nGood things.\nCons:\nBad things.";
        let digest = parse_digest(text);
        assert_eq!(digest.cons, "Bad things.");
    }

    #[test]
    fn missing_cons_marker_yields_placeholder_triple() {
        let digest = parse_digest("Summary line.\nPros line.\nNothing else of note.");
        assert_eq!(digest, PolicyDigest::unavailable());
    }

    #[test]
    fn empty_input_yields_placeholder_triple() {
        assert_eq!(parse_digest(""), PolicyDigest::unavailable());
        assert_eq!(parse_digest("   \n  "), PolicyDigest::unavailable());
    }

    #[test]
    fn json_with_empty_sections_is_rejected() {
        let digest = parse_digest(r#"{"summary": "S.", "pros": "", "cons": "C."}"#);
        assert_eq!(digest, PolicyDigest::unavailable());
    }

    #[test]
    fn marker_as_last_line_has_no_cons_text() {
        let digest = parse_digest("Summary.\nPros text.\nCons");
        assert_eq!(digest, PolicyDigest::unavailable());
    }
}
