//! Runtime values of global names
//!
//! `let` initializers are evaluated on first use and memoized. A global read
//! while its own initializer runs is a cyclic initialization.

use crate::parser::ast::Expr;
use crate::parser::interner::Symbol;
use crate::vm::value::Value;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// State of one global.
#[derive(Debug, Clone)]
pub enum GlobalSlot {
    /// Initializer not yet run
    Pending(Rc<Expr>),
    /// Initializer running
    Evaluating(Rc<Expr>),
    /// Final value
    Ready(Value),
}

/// Table of global runtime values, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    slots: FxHashMap<Symbol, GlobalSlot>,
}

impl Globals {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a value.
    pub fn define(&mut self, name: Symbol, value: Value) {
        self.slots.insert(name, GlobalSlot::Ready(value));
    }

    /// Bind `name` to an initializer evaluated on first use.
    pub fn define_lazy(&mut self, name: Symbol, init: Rc<Expr>) {
        self.slots.insert(name, GlobalSlot::Pending(init));
    }

    /// Remove a binding.
    pub fn remove(&mut self, name: Symbol) -> Option<GlobalSlot> {
        self.slots.remove(&name)
    }

    /// Current state of `name`
    pub fn slot(&self, name: Symbol) -> Option<&GlobalSlot> {
        self.slots.get(&name)
    }

    pub(crate) fn set_slot(&mut self, name: Symbol, slot: GlobalSlot) {
        self.slots.insert(name, slot);
    }

    /// Check whether `name` is bound
    pub fn contains(&self, name: Symbol) -> bool {
        self.slots.contains_key(&name)
    }

    /// Number of globals
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Method calls resolved by the checker, keyed by the address of the call
/// expression.
///
/// Keys stay valid for as long as the checked items are kept alive and
/// unmoved, which the session guarantees by holding them behind `Rc`.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    targets: FxHashMap<usize, Symbol>,
}

impl MethodTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(call: &Expr) -> usize {
        call as *const Expr as usize
    }

    /// Record that `call` invokes the global `target`.
    pub fn record(&mut self, call: &Expr, target: Symbol) {
        self.targets.insert(Self::key(call), target);
    }

    /// Global invoked by `call`
    pub fn target(&self, call: &Expr) -> Option<Symbol> {
        self.targets.get(&Self::key(call)).copied()
    }

    /// Number of resolved calls
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if no call is resolved
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
