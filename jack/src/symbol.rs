//! Two-level symbol table.
use std::{collections::BTreeMap, fmt};

use smol_str::SmolStr;

use crate::vm::Segment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Declared type, either a primitive or a class name.
    pub ty: SmolStr,
    pub kind: VarKind,
    /// Slot index, counted separately per kind.
    pub index: u16,
}

/// Storage class of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Shared by all instances of a class.
    Static,
    /// Per instance, relative to `this`.
    Field,
    /// Supplied by the caller.
    Argument,
    /// Private to one subroutine call.
    Local,
}

impl VarKind {
    /// VM segment that holds variables of this kind.
    pub fn segment(&self) -> Segment {
        match self {
            Self::Static => Segment::Static,
            Self::Field => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local => Segment::Local,
        }
    }

    /// Whether the variable lives in class scope, as opposed to subroutine scope.
    #[inline]
    pub fn is_class_level(&self) -> bool {
        matches!(self, Self::Static | Self::Field)
    }

    fn counter(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for VarKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Static   => write!(f, "static"),
            Self::Field    => write!(f, "field"),
            Self::Argument => write!(f, "argument"),
            Self::Local    => write!(f, "local"),
        }
    }
}

/// Outcome of looking up an identifier.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The identifier names a variable in scope.
    Variable(&'a Symbol),
    /// The identifier is not a variable, so it names a class or subroutine.
    ClassOrFunction,
}

/// Returned when a name is declared twice in the same scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redefinition {
    pub name: SmolStr,
    /// Kind of the earlier declaration.
    pub kind: VarKind,
}

#[derive(Default)]
struct Scope {
    symbols: BTreeMap<SmolStr, Symbol>,
}

impl Scope {
    #[inline]
    fn add_symbol(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol.name.clone(), symbol);
    }

    #[inline]
    fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }
}

/// Class scope holding `static` and `field` entries, and subroutine
/// scope holding `argument` and `local` entries.
///
/// Lookups consult the subroutine scope first, so a local or argument
/// shadows a class-level variable of the same name.
///
/// A name may only be declared once per scope. The first declaration
/// stays in the table and the second is rejected.
#[derive(Default)]
pub struct SymbolTable {
    class: Scope,
    subroutine: Scope,
    /// Next free slot per kind, indexed by [`VarKind`].
    counts: [u16; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new class, discarding all entries.
    pub fn open_class_scope(&mut self) {
        self.class = Scope::default();
        self.subroutine = Scope::default();
        self.counts = [0; 4];
    }

    /// Start a new subroutine, discarding arguments and locals.
    pub fn open_subroutine_scope(&mut self) {
        self.subroutine = Scope::default();
        self.counts[VarKind::Argument.counter()] = 0;
        self.counts[VarKind::Local.counter()] = 0;
    }

    /// Declare a variable in the scope implied by its kind, at the
    /// next free slot for that kind.
    ///
    /// Returns the assigned slot index.
    pub fn define(&mut self, name: impl Into<SmolStr>, ty: impl Into<SmolStr>, kind: VarKind) -> Result<u16, Redefinition> {
        let name = name.into();
        let scope = if kind.is_class_level() {
            &mut self.class
        } else {
            &mut self.subroutine
        };

        if let Some(existing) = scope.get_symbol(name.as_str()) {
            return Err(Redefinition {
                name,
                kind: existing.kind,
            });
        }

        let index = self.counts[kind.counter()];
        scope.add_symbol(Symbol {
            name,
            ty: ty.into(),
            kind,
            index,
        });
        self.counts[kind.counter()] += 1;

        Ok(index)
    }

    /// Find the entry for a name, subroutine scope first.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine
            .get_symbol(name)
            .or_else(|| self.class.get_symbol(name))
    }

    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        match self.lookup(name) {
            Some(symbol) => Resolution::Variable(symbol),
            None => Resolution::ClassOrFunction,
        }
    }

    /// Kind of the named variable, `None` when the name is not a variable.
    pub fn kind_of(&self, name: &str) -> Option<VarKind> {
        self.lookup(name).map(|symbol| symbol.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|symbol| symbol.ty.as_str())
    }

    pub fn slot_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|symbol| symbol.index)
    }

    /// Number of variables of the given kind currently defined.
    pub fn count(&self, kind: VarKind) -> u16 {
        self.counts[kind.counter()]
    }
}
