//! Declaration state of one compilation unit.

use crate::parser::checker::SymbolTable;
use crate::parser::interner::Interner;
use crate::parser::operators::OperatorTable;
use crate::parser::types::TypeContext;
use crate::vm::{Globals, HostPrimitives, Interpreter, MethodTable, DEFAULT_MAX_CALL_DEPTH};

/// Everything declarations add to: names, operators, classes, global types
/// and values, resolved method calls, and the host that answers `native`
/// calls.
///
/// Tables only grow. The checker and the evaluator borrow disjoint parts of
/// it.
pub struct Environment {
    /// Names
    pub interner: Interner,
    /// Declared infix operators
    pub operators: OperatorTable,
    /// Declared classes
    pub types: TypeContext,
    /// Global type schemes
    pub symbols: SymbolTable,
    /// Global runtime values
    pub globals: Globals,
    /// Resolved method calls
    pub methods: MethodTable,
    /// Host primitives
    pub host: Box<dyn HostPrimitives>,
    /// Call depth limit of the evaluator
    pub max_call_depth: usize,
}

impl Environment {
    /// Create an empty environment served by `host`.
    pub fn new(host: Box<dyn HostPrimitives>) -> Self {
        let mut interner = Interner::new();
        let types = TypeContext::new(&mut interner);
        Self {
            interner,
            operators: OperatorTable::new(),
            types,
            symbols: SymbolTable::new(),
            globals: Globals::new(),
            methods: MethodTable::new(),
            host,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// An evaluator over this environment.
    pub fn interpreter(&mut self) -> Interpreter<'_> {
        Interpreter::new(
            &mut self.globals,
            self.host.as_mut(),
            &self.interner,
            &self.types,
            &self.methods,
        )
        .with_max_depth(self.max_call_depth)
    }
}
