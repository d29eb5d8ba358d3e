//! Registry of declared classes

use super::error::TypeError;
use super::ty::Ty;
use crate::parser::interner::{Interner, Symbol};
use rustc_hash::FxHashMap;

/// Index of a class in its [`TypeContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantId(pub(crate) u32);

impl VariantId {
    /// Raw index
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// One alternative of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    /// Unqualified name (`True`, not `Bool/True`)
    pub name: Symbol,
    /// Normalized field types, possibly mentioning the class generics
    pub fields: Vec<Ty>,
}

/// A declared class: a named sum of constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantType {
    /// Identity
    pub id: VariantId,
    /// Class name
    pub name: Symbol,
    /// Generic parameter names
    pub params: Vec<Symbol>,
    /// Constructors in declaration order; the index is the runtime tag
    pub constructors: Vec<Constructor>,
}

impl VariantType {
    /// The class applied to its own generic parameters: `Pair(A B)`.
    pub fn self_type(&self) -> Ty {
        Ty::cons(self.name, self.params.iter().map(|p| Ty::Rigid(*p)).collect())
    }

    /// Tag of the constructor named `name`.
    pub fn constructor_index(&self, name: Symbol) -> Option<usize> {
        self.constructors.iter().position(|c| c.name == name)
    }
}

/// Names the engine itself relies on, interned once per session.
///
/// Most of these are declared by the prelude; the engine only refers to them
/// by name and reports a missing declaration when it needs one.
#[derive(Debug, Clone, Copy)]
pub struct CoreNames {
    /// `Type`
    pub type_: Symbol,
    /// `Int`
    pub int: Symbol,
    /// `String`
    pub string: Symbol,
    /// `Array`
    pub array: Symbol,
    /// `Pair`
    pub pair: Symbol,
    /// `Bool`
    pub bool: Symbol,
    /// `True`
    pub true_: Symbol,
    /// `False`
    pub false_: Symbol,
    /// `Ordering`
    pub ordering: Symbol,
    /// `Lt`
    pub lt: Symbol,
    /// `Eq`
    pub eq: Symbol,
    /// `Gt`
    pub gt: Symbol,
    /// `Unit`, the class and its only constructor
    pub unit: Symbol,
    /// `elim`, member name of eliminators
    pub elim: Symbol,
    /// `R`, result variable of eliminators
    pub result_hint: Symbol,
    /// `Arr`, element variable of empty arrays
    pub element_hint: Symbol,
    /// `H`, parameter variable of inferred lambdas
    pub param_hint: Symbol,
    /// `CH`, result variable of inferred lambdas
    pub codomain_hint: Symbol,
}

impl CoreNames {
    /// Intern every core name.
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            type_: interner.intern("Type"),
            int: interner.intern("Int"),
            string: interner.intern("String"),
            array: interner.intern("Array"),
            pair: interner.intern("Pair"),
            bool: interner.intern("Bool"),
            true_: interner.intern("True"),
            false_: interner.intern("False"),
            ordering: interner.intern("Ordering"),
            lt: interner.intern("Lt"),
            eq: interner.intern("Eq"),
            gt: interner.intern("Gt"),
            unit: interner.intern("Unit"),
            elim: interner.intern("elim"),
            result_hint: interner.intern("R"),
            element_hint: interner.intern("Arr"),
            param_hint: interner.intern("H"),
            codomain_hint: interner.intern("CH"),
        }
    }

    /// `Type`
    pub fn type_ty(&self) -> Ty {
        Ty::named(self.type_)
    }

    /// `Array(element)`
    pub fn array_of(&self, element: Ty) -> Ty {
        Ty::cons(self.array, vec![element])
    }
}

/// Registry of every class declared in a session.
#[derive(Debug, Clone)]
pub struct TypeContext {
    variants: Vec<VariantType>,
    by_name: FxHashMap<Symbol, VariantId>,
    core: CoreNames,
}

impl TypeContext {
    /// Create an empty registry.
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            variants: Vec::new(),
            by_name: FxHashMap::default(),
            core: CoreNames::new(interner),
        }
    }

    /// Core names of this session
    pub fn core(&self) -> &CoreNames {
        &self.core
    }

    /// Declare a class.
    ///
    /// Fails with `DuplicateType` if `name` is taken and with
    /// `DuplicateConstructor` if two constructors share a name. Nothing is
    /// registered on failure.
    pub fn declare_variant(
        &mut self,
        name: Symbol,
        params: Vec<Symbol>,
        constructors: Vec<Constructor>,
        interner: &Interner,
    ) -> Result<VariantId, TypeError> {
        if self.by_name.contains_key(&name) {
            return Err(TypeError::DuplicateType {
                name: interner.resolve(name).to_string(),
            });
        }
        for (i, ctor) in constructors.iter().enumerate() {
            if constructors[..i].iter().any(|c| c.name == ctor.name) {
                return Err(TypeError::DuplicateConstructor {
                    ty: interner.resolve(name).to_string(),
                    constructor: interner.resolve(ctor.name).to_string(),
                });
            }
        }

        let id = VariantId(self.variants.len() as u32);
        self.variants.push(VariantType {
            id,
            name,
            params,
            constructors,
        });
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Look up a class by name
    pub fn lookup(&self, name: Symbol) -> Option<VariantId> {
        self.by_name.get(&name).copied()
    }

    /// Check whether a class is declared
    pub fn contains(&self, name: Symbol) -> bool {
        self.by_name.contains_key(&name)
    }

    /// Get a class by id.
    ///
    /// # Panics
    ///
    /// Panics if the id came from a different context.
    pub fn variant(&self, id: VariantId) -> &VariantType {
        &self.variants[id.0 as usize]
    }

    /// Look up a class by name and return it
    pub fn variant_named(&self, name: Symbol) -> Option<&VariantType> {
        self.lookup(name).map(|id| self.variant(id))
    }

    /// Tag of constructor `ctor` of class `id`
    pub fn constructor_index(&self, id: VariantId, ctor: Symbol) -> Option<usize> {
        self.variant(id).constructor_index(ctor)
    }

    /// Number of declared classes
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Check if no class is declared
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Right-nested pair type of `members`: `[A B C]` becomes
    /// `Pair(A Pair(B C))`, and a single member is returned unchanged.
    pub fn tuple_type(&self, members: &[Ty]) -> Result<Ty, TypeError> {
        let (last, init) = members.split_last().ok_or(TypeError::EmptyTupleType)?;
        Ok(init.iter().rev().fold(last.clone(), |acc, ty| {
            Ty::cons(self.core.pair, vec![ty.clone(), acc])
        }))
    }
}

/// Display name of a type; the ordering key of type values.
pub fn type_name(ty: &Ty, interner: &Interner) -> String {
    ty.display(interner).to_string()
}

/// Sort types by display name. Equal names keep their relative order.
pub fn sort_by_name(types: &mut [Ty], interner: &Interner) {
    types.sort_by_cached_key(|ty| type_name(ty, interner));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Interner, TypeContext) {
        let mut interner = Interner::new();
        let ctx = TypeContext::new(&mut interner);
        (interner, ctx)
    }

    #[test]
    fn test_declare_and_lookup() {
        let (mut interner, mut ctx) = setup();
        let bool_ = ctx.core().bool;
        let ctors = vec![
            Constructor { name: ctx.core().false_, fields: vec![] },
            Constructor { name: ctx.core().true_, fields: vec![] },
        ];
        let id = ctx.declare_variant(bool_, vec![], ctors, &interner).unwrap();

        assert_eq!(ctx.lookup(bool_), Some(id));
        assert_eq!(ctx.constructor_index(id, ctx.core().true_), Some(1));
        assert_eq!(ctx.constructor_index(id, interner.intern("Maybe")), None);
        assert_eq!(ctx.variant(id).self_type(), Ty::named(bool_));
    }

    #[test]
    fn test_duplicate_type() {
        let (interner, mut ctx) = setup();
        let int = ctx.core().int;
        ctx.declare_variant(int, vec![], vec![], &interner).unwrap();
        let err = ctx.declare_variant(int, vec![], vec![], &interner).unwrap_err();
        assert_eq!(err, TypeError::DuplicateType { name: "Int".to_string() });
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_duplicate_constructor() {
        let (mut interner, mut ctx) = setup();
        let name = interner.intern("Color");
        let red = interner.intern("Red");
        let ctors = vec![
            Constructor { name: red, fields: vec![] },
            Constructor { name: red, fields: vec![] },
        ];
        let err = ctx.declare_variant(name, vec![], ctors, &interner).unwrap_err();
        assert_eq!(
            err.to_string(),
            "constructor `Red' is declared twice in `Color'"
        );
        assert!(!ctx.contains(name));
    }

    #[test]
    fn test_zero_constructors_allowed() {
        let (interner, mut ctx) = setup();
        let string = ctx.core().string;
        let id = ctx.declare_variant(string, vec![], vec![], &interner).unwrap();
        assert!(ctx.variant(id).constructors.is_empty());
    }

    #[test]
    fn test_tuple_type_right_nests() {
        let (interner, ctx) = setup();
        let core = *ctx.core();
        let types = [Ty::named(core.bool), Ty::named(core.int), Ty::named(core.string)];
        let tuple = ctx.tuple_type(&types).unwrap();
        assert_eq!(
            tuple.display(&interner).to_string(),
            "Pair(Bool Pair(Int String))"
        );
        assert_eq!(ctx.tuple_type(&types[..1]).unwrap(), types[0]);
        assert_eq!(ctx.tuple_type(&[]), Err(TypeError::EmptyTupleType));
    }

    #[test]
    fn test_sort_by_name_is_stable() {
        let (mut interner, ctx) = setup();
        let core = *ctx.core();
        let a = interner.intern("A");
        let mut types = vec![
            Ty::named(core.string),
            Ty::Rigid(a),
            Ty::named(core.bool),
            Ty::named(a),
            Ty::named(core.int),
        ];
        sort_by_name(&mut types, &interner);
        let names: Vec<String> = types.iter().map(|t| type_name(t, &interner)).collect();
        assert_eq!(names, ["A", "A", "Bool", "Int", "String"]);
        // Both render as `A`; the rigid one came first.
        assert_eq!(types[0], Ty::Rigid(a));
        assert_eq!(types[1], Ty::named(a));
    }
}
