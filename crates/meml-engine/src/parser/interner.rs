//! String interning for identifiers, operators and type names
//!
//! Every name the engine handles (identifiers, operator symbols, class and
//! constructor names) is interned once per session and then compared as a
//! small integer.

use rustc_hash::FxHashMap;
use std::num::NonZeroU32;

/// An interned string symbol (32-bit index).
///
/// Use `Interner::resolve()` to get the actual string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(NonZeroU32);

impl Symbol {
    #[inline]
    fn from_index(index: usize) -> Self {
        // Shifted by one because NonZeroU32 cannot be 0
        let raw = u32::try_from(index + 1).unwrap_or(u32::MAX);
        Symbol(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MAX))
    }

    #[inline]
    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// String interner shared by the lexer, parser, checker and evaluator of one session.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    map: FxHashMap<String, Symbol>,
    strings: Vec<String>,
}

impl Interner {
    /// Create a new empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new interner with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            strings: Vec::with_capacity(capacity),
        }
    }

    /// Intern a string, returning its symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }

        let sym = Symbol::from_index(self.strings.len());
        self.strings.push(s.to_string());
        self.map.insert(s.to_string(), sym);
        sym
    }

    /// Look up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    /// Resolve a symbol back to its string.
    ///
    /// # Panics
    ///
    /// Panics if the symbol came from a different interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.index()]
    }

    /// Intern `owner/member`, the global name of a constructor, eliminator or method.
    pub fn qualify(&mut self, owner: Symbol, member: &str) -> Symbol {
        let name = format!("{}/{}", self.resolve(owner), member);
        self.intern(&name)
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the interner is empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_deduplicates() {
        let mut interner = Interner::new();

        let a = interner.intern("Bool/True");
        let b = interner.intern("Bool/False");
        let c = interner.intern("Bool/True");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.resolve(b), "Bool/False");
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut interner = Interner::new();
        assert_eq!(interner.get("Int"), None);
        let int = interner.intern("Int");
        assert_eq!(interner.get("Int"), Some(int));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_qualify() {
        let mut interner = Interner::new();
        let option = interner.intern("Option");
        let elim = interner.qualify(option, "elim");
        assert_eq!(interner.resolve(elim), "Option/elim");
    }
}
