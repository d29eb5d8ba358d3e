//! Declared infix operators.
//!
//! Unlike a fixed precedence enum, meml's operator set is built by `infix`
//! declarations while the source is parsed. An entry becomes visible to every
//! expression parsed after its declaration and is never removed or replaced.
//!
//! ```text
//! infix left at 75. "+" = ".add"    # a + b  =>  a.add(b)
//! infix right at .0 ";" = "seq"     # a ; b  =>  seq(a b)
//! ```

use crate::parser::interner::Symbol;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::fmt;

/// Binding strength of an operator (higher binds tighter).
///
/// Levels are non-NaN doubles, so a new level can always be placed between
/// two existing ones without renumbering anything.
#[derive(Debug, Clone, Copy)]
pub struct Precedence(f64);

impl Precedence {
    /// Lowest level commonly used for sequencing (`.0`).
    pub const ZERO: Precedence = Precedence(0.0);

    /// Create a level, rejecting NaN.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            Some(Precedence(value))
        }
    }

    /// A level strictly between `self` and `other`, if one is representable.
    pub fn between(self, other: Precedence) -> Option<Precedence> {
        let (lo, hi) = if self <= other { (self.0, other.0) } else { (other.0, self.0) };
        let mid = lo + (hi - lo) / 2.0;
        if mid > lo && mid < hi {
            Some(Precedence(mid))
        } else {
            None
        }
    }

    /// The raw level.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Precedence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Precedence {}

impl PartialOrd for Precedence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Precedence {
    fn cmp(&self, other: &Self) -> Ordering {
        // -0.0 and 0.0 are the same level
        if self.0 == other.0 {
            Ordering::Equal
        } else {
            self.0.total_cmp(&other.0)
        }
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}.", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// How repeated uses of operators at one level group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a ~ b ~ c` is `(a ~ b) ~ c`
    Left,
    /// `a ~ b ~ c` is `a ~ (b ~ c)`
    Right,
    /// `a ~ b ~ c` is a syntax error
    None,
}

impl fmt::Display for Associativity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Associativity::Left => write!(f, "left"),
            Associativity::Right => write!(f, "right"),
            Associativity::None => write!(f, "non-associative"),
        }
    }
}

/// What `a SYM b` desugars to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorTarget {
    /// `target(a b)`
    Function(Symbol),
    /// `a.target(b)`, resolved on the class of `a`
    Method(Symbol),
}

/// A declared operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorEntry {
    /// Operator text (`+`, `<=>`, `as`)
    pub symbol: Symbol,
    /// Binding strength
    pub precedence: Precedence,
    /// Grouping at equal strength
    pub associativity: Associativity,
    /// Desugaring target
    pub target: OperatorTarget,
}

/// Errors raised while declaring an operator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperatorError {
    /// The symbol is already declared.
    #[error("operator `{symbol}' is already declared")]
    DuplicateOperator {
        /// Operator text
        symbol: String,
    },

    /// The symbol can never appear as a single token.
    #[error("`{symbol}' cannot be used as an operator symbol")]
    InvalidSymbol {
        /// Operator text
        symbol: String,
    },
}

/// Append-only operator table of one compilation session.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    entries: Vec<OperatorEntry>,
    by_symbol: FxHashMap<Symbol, usize>,
}

impl OperatorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an operator. The caller has already validated `text` as the
    /// spelling of `entry.symbol`.
    pub fn declare(&mut self, entry: OperatorEntry, text: &str) -> Result<(), OperatorError> {
        if !is_operator_spelling(text) {
            return Err(OperatorError::InvalidSymbol {
                symbol: text.to_string(),
            });
        }
        if self.by_symbol.contains_key(&entry.symbol) {
            return Err(OperatorError::DuplicateOperator {
                symbol: text.to_string(),
            });
        }
        self.by_symbol.insert(entry.symbol, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Look up a declared operator.
    pub fn lookup(&self, symbol: Symbol) -> Option<&OperatorEntry> {
        self.by_symbol.get(&symbol).map(|&index| &self.entries[index])
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &OperatorEntry> {
        self.entries.iter()
    }

    /// Number of declared operators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no operator is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget every entry declared after the first `len`. Only a failed
    /// load takes entries back.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.entries.len() {
            return;
        }
        for entry in self.entries.drain(len..) {
            self.by_symbol.remove(&entry.symbol);
        }
    }
}

const OPERATOR_CHARS: &str = "!$%&*+-/<=>?^~;,|";

/// Check whether `text` lexes as exactly one operator or identifier token
/// and is not reserved by the item grammar.
pub fn is_operator_spelling(text: &str) -> bool {
    if text.is_empty() || text == "=" || text == "|" {
        return false;
    }
    if text.chars().all(|c| OPERATOR_CHARS.contains(c)) {
        return true;
    }
    let mut chars = text.chars();
    let first = chars.next().unwrap_or(' ');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'));
    (first.is_ascii_alphabetic() || first == '_') && rest_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::interner::Interner;

    fn entry(interner: &mut Interner, text: &str, level: f64) -> OperatorEntry {
        OperatorEntry {
            symbol: interner.intern(text),
            precedence: Precedence::new(level).unwrap(),
            associativity: Associativity::Left,
            target: OperatorTarget::Function(interner.intern("f")),
        }
    }

    #[test]
    fn test_declare_and_lookup() {
        let mut interner = Interner::new();
        let mut table = OperatorTable::new();
        let plus = entry(&mut interner, "+", 75.0);
        table.declare(plus, "+").unwrap();

        assert_eq!(table.lookup(plus.symbol), Some(&plus));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_operator() {
        let mut interner = Interner::new();
        let mut table = OperatorTable::new();
        table.declare(entry(&mut interner, "~", 1.0), "~").unwrap();
        let err = table.declare(entry(&mut interner, "~", 2.0), "~").unwrap_err();
        assert_eq!(
            err,
            OperatorError::DuplicateOperator {
                symbol: "~".to_string()
            }
        );
        assert_eq!(table.lookup(interner.intern("~")).unwrap().precedence.value(), 1.0);
    }

    #[test]
    fn test_truncate_forgets_later_entries() {
        let mut interner = Interner::new();
        let mut table = OperatorTable::new();
        table.declare(entry(&mut interner, "+", 75.0), "+").unwrap();
        let mark = table.len();
        table.declare(entry(&mut interner, "~", 1.0), "~").unwrap();

        table.truncate(mark);
        assert_eq!(table.len(), 1);
        assert!(table.lookup(interner.intern("~")).is_none());
        table.declare(entry(&mut interner, "~", 2.0), "~").unwrap();
        assert_eq!(table.lookup(interner.intern("~")).unwrap().precedence.value(), 2.0);
    }

    #[test]
    fn test_reserved_symbols_rejected() {
        let mut interner = Interner::new();
        let mut table = OperatorTable::new();
        for text in ["=", "|", "", "a b", "(", "λ"] {
            let err = table.declare(entry(&mut interner, text, 1.0), text).unwrap_err();
            assert!(matches!(err, OperatorError::InvalidSymbol { .. }), "{:?}", text);
        }
        assert!(table.declare(entry(&mut interner, "as", 0.0), "as").is_ok());
        assert!(table.declare(entry(&mut interner, "==", 50.0), "==").is_ok());
    }

    #[test]
    fn test_precedence_between() {
        let lo = Precedence::new(50.0).unwrap();
        let hi = Precedence::new(60.0).unwrap();
        let mid = lo.between(hi).unwrap();
        assert!(lo < mid && mid < hi);
        assert_eq!(hi.between(lo), Some(mid));
        assert_eq!(lo.between(lo), None);
    }

    #[test]
    fn test_precedence_rejects_nan_and_merges_zeros() {
        assert!(Precedence::new(f64::NAN).is_none());
        assert_eq!(Precedence::new(-0.0).unwrap(), Precedence::ZERO);
        assert!(Precedence::new(f64::NEG_INFINITY).unwrap() < Precedence::ZERO);
    }

    #[test]
    fn test_precedence_display() {
        assert_eq!(Precedence::new(100.0).unwrap().to_string(), "100.");
        assert_eq!(Precedence::new(62.5).unwrap().to_string(), "62.5");
    }
}
