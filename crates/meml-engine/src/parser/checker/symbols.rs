//! Global symbol table
//!
//! Every global name (type constructors, constructors, eliminators, `let`
//! bindings, functions and methods under their qualified `Class/name`) maps
//! to a type scheme. Names are never shadowed or redeclared.

use crate::parser::interner::Symbol;
use crate::parser::token::Span;
use crate::parser::types::Ty;
use rustc_hash::FxHashMap;

/// What declared a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// `C` of `class C`
    TypeConstructor,
    /// `C/K`
    Constructor,
    /// `C/elim`
    Eliminator,
    /// `let`
    Value,
    /// `fun`
    Function,
    /// `fun .m`, registered as `C/m`
    Method,
}

/// A possibly generic type: `∀ generics. ty`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
    /// Quantified parameter names, rigid inside `ty`
    pub generics: Vec<Symbol>,
    /// Body
    pub ty: Ty,
}

impl Scheme {
    /// Scheme without generics
    pub fn mono(ty: Ty) -> Self {
        Self {
            generics: Vec::new(),
            ty,
        }
    }
}

/// A declared global.
#[derive(Debug, Clone)]
pub struct GlobalSymbol {
    /// Qualified name
    pub name: Symbol,
    /// Declaration kind
    pub kind: SymbolKind,
    /// Type
    pub scheme: Scheme,
    /// Declaring item
    pub span: Span,
}

/// Append-only table of globals in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<GlobalSymbol>,
    by_name: FxHashMap<Symbol, usize>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a global. On a name clash returns the existing declaration.
    pub fn insert(&mut self, symbol: GlobalSymbol) -> Result<(), &GlobalSymbol> {
        if let Some(&index) = self.by_name.get(&symbol.name) {
            return Err(&self.symbols[index]);
        }
        self.by_name.insert(symbol.name, self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    /// Remove the most recently added global named `name`.
    ///
    /// Only the last entry can be removed, which is all rolling back a
    /// failed declaration needs.
    pub fn remove_last(&mut self, name: Symbol) -> Option<GlobalSymbol> {
        match self.symbols.last() {
            Some(last) if last.name == name => {
                self.by_name.remove(&name);
                self.symbols.pop()
            }
            _ => None,
        }
    }

    /// Look up a global
    pub fn lookup(&self, name: Symbol) -> Option<&GlobalSymbol> {
        self.by_name.get(&name).map(|&index| &self.symbols[index])
    }

    /// Check whether `name` is declared
    pub fn contains(&self, name: Symbol) -> bool {
        self.by_name.contains_key(&name)
    }

    /// Globals in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &GlobalSymbol> {
        self.symbols.iter()
    }

    /// Number of globals
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
