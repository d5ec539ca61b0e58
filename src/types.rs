//! Core types for eddy-dom.
//!
//! Selector tokens are the addressing scheme of the whole driver: application
//! code tags virtual nodes with a token and later asks for event streams by
//! the same token, possibly before any matching host node exists.

use std::cell::Cell;
use std::fmt;

// =============================================================================
// Opaque Token
// =============================================================================

thread_local! {
    /// Monotone counter backing opaque token identity.
    static TOKEN_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// An opaque, process-unique selector token.
///
/// Two tokens compare equal only if they came from the same [`OpaqueToken::new`]
/// call. Typically minted once and closed over by the component that owns it,
/// which guarantees its events can never be observed by an unrelated selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpaqueToken(u64);

impl OpaqueToken {
    /// Mint a fresh token, distinct from every other token in this process.
    pub fn new() -> Self {
        TOKEN_COUNTER.with(|counter| {
            let id = counter.get();
            // The counter never wraps in practice; wrapping would break the
            // identity guarantee, so catch it in debug builds.
            debug_assert!(id < u64::MAX);
            counter.set(id + 1);
            OpaqueToken(id)
        })
    }
}

impl Default for OpaqueToken {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Selector
// =============================================================================

/// A selector token attached to a virtual node.
///
/// `Str` compares by value: many independent nodes may legitimately share the
/// same string and all of them feed the same event stream. `Token` compares by
/// identity: unique per [`OpaqueToken::new`] call. Both are stored without any
/// normalization and are interchangeable everywhere a selector is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Str(String),
    Token(OpaqueToken),
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Selector::Str(value.to_string())
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Selector::Str(value)
    }
}

impl From<OpaqueToken> for Selector {
    fn from(token: OpaqueToken) -> Self {
        Selector::Token(token)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Str(value) => write!(f, "{value}"),
            Selector::Token(OpaqueToken(id)) => write!(f, "token#{id}"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_opaque_tokens_are_unique() {
        let a = OpaqueToken::new();
        let b = OpaqueToken::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_string_selectors_compare_by_value() {
        let a = Selector::from("inc");
        let b = Selector::from("inc".to_string());
        assert_eq!(a, b);
        assert_ne!(a, Selector::from("dec"));
    }

    #[test]
    fn test_token_selectors_compare_by_identity() {
        let t1 = OpaqueToken::new();
        let t2 = OpaqueToken::new();
        assert_ne!(Selector::from(t1), Selector::from(t2));
        assert_eq!(Selector::from(t1), Selector::Token(t1));
        // A string never equals a token, whatever it spells.
        assert_ne!(Selector::from("token#0"), Selector::Token(t1));
    }

    #[test]
    fn test_selector_hashing() {
        let mut set = HashSet::new();
        set.insert(Selector::from("inc"));
        set.insert(Selector::from("inc"));
        let t = OpaqueToken::new();
        set.insert(Selector::from(t));
        set.insert(Selector::from(t));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Selector::from("inc")));
        assert!(set.contains(&Selector::Token(t)));
    }
}
