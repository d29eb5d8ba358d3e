//! Existential variables and unification
//!
//! Each use of a generic global instantiates its scheme with fresh
//! existentials. Unification solves them; rigid variables only unify with
//! themselves, and `any` unifies with everything.

use super::symbols::Scheme;
use crate::parser::interner::Symbol;
use crate::parser::types::{ExistId, Ty};
use rustc_hash::FxHashMap;

/// Unification failed; the caller reports the two types involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch;

/// Solutions of the existentials of one declaration.
#[derive(Debug, Clone, Default)]
pub struct Existentials {
    solutions: Vec<Option<Ty>>,
}

impl Existentials {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every variable.
    pub fn clear(&mut self) {
        self.solutions.clear();
    }

    /// Number of variables created
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Check if no variable exists
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// A fresh, unsolved variable.
    pub fn fresh(&mut self, hint: Symbol) -> Ty {
        let id = ExistId {
            index: self.solutions.len() as u32,
            hint,
        };
        self.solutions.push(None);
        Ty::Exist(id)
    }

    /// Current solution of `id`
    pub fn solution(&self, id: ExistId) -> Option<&Ty> {
        self.solutions.get(id.index()).and_then(Option::as_ref)
    }

    /// Replace every solved variable, recursively.
    pub fn substitute(&self, ty: &Ty) -> Ty {
        match ty {
            Ty::Exist(id) => match self.solution(*id) {
                Some(solved) => self.substitute(solved),
                None => ty.clone(),
            },
            Ty::Cons { name, args } => Ty::Cons {
                name: *name,
                args: args.iter().map(|arg| self.substitute(arg)).collect(),
            },
            Ty::Arrow { domain, codomain } => Ty::Arrow {
                domain: domain.iter().map(|d| self.substitute(d)).collect(),
                codomain: Box::new(self.substitute(codomain)),
            },
            Ty::Any | Ty::Rigid(_) => ty.clone(),
        }
    }

    /// Solve `id := ty`, rejecting cyclic solutions.
    pub fn solve(&mut self, id: ExistId, ty: Ty) -> Result<(), Mismatch> {
        let ty = self.substitute(&ty);
        if ty == Ty::Exist(id) {
            return Ok(());
        }
        if ty.mentions(id) {
            return Err(Mismatch);
        }
        match self.solutions.get_mut(id.index()) {
            Some(slot) => {
                *slot = Some(ty);
                Ok(())
            }
            None => Err(Mismatch),
        }
    }

    /// Instantiate a scheme with fresh variables for its generics.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        if scheme.generics.is_empty() {
            return scheme.ty.clone();
        }
        let map: FxHashMap<Symbol, Ty> = scheme
            .generics
            .iter()
            .map(|g| (*g, self.fresh(*g)))
            .collect();
        scheme.ty.substitute_rigid(&map)
    }

    /// Make `a` and `b` equal.
    pub fn unify(&mut self, a: &Ty, b: &Ty) -> Result<(), Mismatch> {
        let a = self.substitute(a);
        let b = self.substitute(b);
        match (&a, &b) {
            (Ty::Any, _) | (_, Ty::Any) => Ok(()),
            (Ty::Exist(x), Ty::Exist(y)) if x == y => Ok(()),
            (Ty::Exist(x), _) => self.solve(*x, b.clone()),
            (_, Ty::Exist(y)) => self.solve(*y, a.clone()),
            (Ty::Rigid(x), Ty::Rigid(y)) if x == y => Ok(()),
            (
                Ty::Cons { name: n1, args: a1 },
                Ty::Cons { name: n2, args: a2 },
            ) if n1 == n2 && a1.len() == a2.len() => {
                for (x, y) in a1.iter().zip(a2) {
                    self.unify(x, y)?;
                }
                Ok(())
            }
            (
                Ty::Arrow { domain: d1, codomain: c1 },
                Ty::Arrow { domain: d2, codomain: c2 },
            ) if d1.len() == d2.len() => {
                for (x, y) in d1.iter().zip(d2) {
                    self.unify(x, y)?;
                }
                self.unify(c1, c2)
            }
            _ => Err(Mismatch),
        }
    }
}
