//! Small text and lookup helpers shared by the stock capabilities.

use mudlark_engine::{EntityId, Zone};

/// Upcases the first letter, leaving the rest untouched.
pub fn upper_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upcases the first letter of every whitespace-separated word.
pub fn capwords(text: &str) -> String {
    text.split_whitespace()
        .map(upper_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two-space indent for list items inside a told message block.
pub fn indent(text: &str) -> String {
    format!("  {text}")
}

/// Ensures a spoken message ends with sentence punctuation.
pub fn punctuate(message: &str) -> String {
    let message = upper_first(message.trim()).replace('"', "'");
    match message.chars().last() {
        Some('.') | Some('?') | Some('!') => message,
        _ => format!("{message}."),
    }
}

/// Resolves a descriptor against the whole zone: an exact id, or a
/// case-insensitive name substring. Results are in id order.
pub fn resolve_global(zone: &Zone, descriptor: &str) -> Vec<EntityId> {
    if let Ok(raw) = descriptor.parse::<u64>() {
        let id = EntityId(raw);
        if zone.entity(id).is_some() {
            return vec![id];
        }
    }
    let needle = descriptor.to_lowercase();
    zone.entity_ids()
        .into_iter()
        .filter(|&id| {
            zone.entity(id)
                .is_some_and(|e| e.name.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuate_adds_a_period_and_upcases() {
        assert_eq!(punctuate("hello there"), "Hello there.");
        assert_eq!(punctuate("really?"), "Really?");
        assert_eq!(punctuate(r#"say "this""#), "Say 'this'.");
    }

    #[test]
    fn capwords_title_cases_each_word() {
        assert_eq!(capwords("a dusty courtyard"), "A Dusty Courtyard");
    }
}
