//! Card display for stored policies.

use govdigest_core::policy::Policy;

const COLLAPSED_ABSTRACT_CHARS: usize = 200;

/// Print one policy as a card. Collapsed cards show a truncated abstract;
/// expanded cards add the digest and the detail link.
pub fn print_policy_card(policy: &Policy, expanded: bool) {
    println!("=== {} ===", policy.document_number);
    println!("{}", policy.title);
    println!(
        "{}  ·  published {}  ·  ▲ {}  ▼ {}",
        policy.doc_type,
        policy.publication_date,
        policy.counts.upvotes,
        policy.counts.downvotes
    );

    if expanded {
        println!();
        println!("{}", policy.abstract_text);
        println!();
        println!("Summary");
        println!("  {}", policy.digest.summary);
        println!("Pros");
        println!("  {}", policy.digest.pros.replace('\n', "\n  "));
        println!("Cons");
        println!("  {}", policy.digest.cons.replace('\n', "\n  "));
        println!();
        println!("Learn more: {}", policy.html_url);
    } else {
        println!("{}", truncate(&policy.abstract_text, COLLAPSED_ABSTRACT_CHARS));
    }
    println!();
}

/// Shorten to at most `max` characters on a char boundary, with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate("short abstract", 200), "short abstract");
    }

    #[test]
    fn long_text_gets_an_ellipsis() {
        let long = "x".repeat(300);
        let shown = truncate(&long, 200);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), 200);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(250);
        let shown = truncate(&text, 200);
        assert!(shown.ends_with("..."));
    }
}
