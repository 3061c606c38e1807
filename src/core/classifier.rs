// File: src/core/classifier.rs
use crate::core::types::{Token, TypeDictionary};
use std::collections::hash_map::Entry;

/// Builds the literal -> category dictionary for one file in a single pass.
/// Returns the dictionary and the number of conflicting observations.
///
/// A literal seen again under a different category keeps its first category.
pub fn classify_tokens(tokens: &[Token]) -> (TypeDictionary, usize) {
    let mut dictionary = TypeDictionary::with_capacity(tokens.len());
    let mut conflicts = 0;

    for token in tokens {
        match dictionary.entry(token.value.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(token.category.clone());
            }
            Entry::Occupied(slot) => {
                if slot.get() != &token.category {
                    conflicts += 1;
                    tracing::warn!(
                        literal = %token.value,
                        first = %slot.get(),
                        second = %token.category,
                        "token literal observed with two categories; keeping the first"
                    );
                }
            }
        }
    }

    (dictionary, conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_literal_once() {
        let tokens = vec![
            Token::new("int", "BasicType"),
            Token::new("x", "Identifier"),
            Token::new("x", "Identifier"),
            Token::new("=", "Operator"),
        ];
        let (dictionary, conflicts) = classify_tokens(&tokens);
        assert_eq!(dictionary.len(), 3);
        assert_eq!(dictionary["x"], "Identifier");
        assert_eq!(conflicts, 0);
    }

    #[test]
    fn first_category_wins_on_conflict() {
        let tokens = vec![
            Token::new("<", "Operator"),
            Token::new("<", "Separator"),
            Token::new("<", "Operator"),
        ];
        let (dictionary, conflicts) = classify_tokens(&tokens);
        assert_eq!(dictionary["<"], "Operator");
        assert_eq!(conflicts, 1);
    }

    #[test]
    fn empty_stream_gives_empty_dictionary() {
        let (dictionary, conflicts) = classify_tokens(&[]);
        assert!(dictionary.is_empty());
        assert_eq!(conflicts, 0);
    }
}
