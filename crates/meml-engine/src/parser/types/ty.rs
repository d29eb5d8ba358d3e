//! Core type representation

use crate::parser::interner::{Interner, Symbol};
use rustc_hash::FxHashMap;
use std::fmt;

/// Unification variable created when a generic scheme is instantiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExistId {
    pub(crate) index: u32,
    pub(crate) hint: Symbol,
}

impl ExistId {
    /// Slot in the existential store of the current declaration
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Generic parameter name this variable was created for
    pub fn hint(self) -> Symbol {
        self.hint
    }
}

/// A meml type.
///
/// Types are ordinary values at run time (`Value::Type`), so this one
/// representation serves the checker and the evaluator alike.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// `@any`: compatible with every type
    Any,

    /// Application of a declared class: `Int`, `Pair(A String)`
    Cons {
        /// Class name
        name: Symbol,
        /// Type arguments, one per generic parameter
        args: Vec<Ty>,
    },

    /// Function type `[A B]C`
    Arrow {
        /// Parameter types
        domain: Vec<Ty>,
        /// Result type
        codomain: Box<Ty>,
    },

    /// Generic parameter in scope of its declaration
    Rigid(Symbol),

    /// Unification variable
    Exist(ExistId),
}

impl Ty {
    /// Nullary class type such as `Int`.
    pub fn named(name: Symbol) -> Ty {
        Ty::Cons {
            name,
            args: Vec::new(),
        }
    }

    /// Class type applied to arguments.
    pub fn cons(name: Symbol, args: Vec<Ty>) -> Ty {
        Ty::Cons { name, args }
    }

    /// Function type.
    pub fn arrow(domain: Vec<Ty>, codomain: Ty) -> Ty {
        Ty::Arrow {
            domain,
            codomain: Box::new(codomain),
        }
    }

    /// Class name at the head of a `Cons`.
    pub fn head(&self) -> Option<Symbol> {
        match self {
            Ty::Cons { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Check for `@any`
    pub fn is_any(&self) -> bool {
        matches!(self, Ty::Any)
    }

    /// Check for a function type
    pub fn is_arrow(&self) -> bool {
        matches!(self, Ty::Arrow { .. })
    }

    /// Replace rigid variables named in `map`.
    pub fn substitute_rigid(&self, map: &FxHashMap<Symbol, Ty>) -> Ty {
        match self {
            Ty::Rigid(name) => map.get(name).cloned().unwrap_or(Ty::Rigid(*name)),
            Ty::Cons { name, args } => Ty::Cons {
                name: *name,
                args: args.iter().map(|arg| arg.substitute_rigid(map)).collect(),
            },
            Ty::Arrow { domain, codomain } => Ty::Arrow {
                domain: domain.iter().map(|d| d.substitute_rigid(map)).collect(),
                codomain: Box::new(codomain.substitute_rigid(map)),
            },
            Ty::Any | Ty::Exist(_) => self.clone(),
        }
    }

    /// Check whether the unification variable `id` occurs in this type.
    pub fn mentions(&self, id: ExistId) -> bool {
        match self {
            Ty::Exist(other) => *other == id,
            Ty::Cons { args, .. } => args.iter().any(|arg| arg.mentions(id)),
            Ty::Arrow { domain, codomain } => {
                domain.iter().any(|d| d.mentions(id)) || codomain.mentions(id)
            }
            Ty::Any | Ty::Rigid(_) => false,
        }
    }

    /// Render with names resolved through `interner`.
    pub fn display<'a>(&'a self, interner: &'a Interner) -> TyDisplay<'a> {
        TyDisplay { ty: self, interner }
    }
}

/// [`fmt::Display`] adapter returned by [`Ty::display`].
pub struct TyDisplay<'a> {
    ty: &'a Ty,
    interner: &'a Interner,
}

impl TyDisplay<'_> {
    fn nested<'b>(&'b self, ty: &'b Ty) -> TyDisplay<'b> {
        TyDisplay {
            ty,
            interner: self.interner,
        }
    }

    fn write_list(&self, f: &mut fmt::Formatter<'_>, types: &[Ty]) -> fmt::Result {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", self.nested(ty))?;
        }
        Ok(())
    }
}

impl fmt::Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Ty::Any => write!(f, "any"),
            Ty::Cons { name, args } => {
                write!(f, "{}", self.interner.resolve(*name))?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    self.write_list(f, args)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            Ty::Arrow { domain, codomain } => {
                write!(f, "[")?;
                self.write_list(f, domain)?;
                write!(f, "]{}", self.nested(codomain))
            }
            Ty::Rigid(name) => write!(f, "{}", self.interner.resolve(*name)),
            Ty::Exist(id) => write!(f, "?{}{}", self.interner.resolve(id.hint), id.index),
        }
    }
}
