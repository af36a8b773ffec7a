use std::{collections::BTreeMap, fmt};

use log::debug;
use smol_str::SmolStr;

use super::vm_writer::Segment;

/// Declaration category of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SymbolKind {
    /// Class variable shared by all instances.
    Static = 0,
    /// Instance variable.
    Field = 1,
    /// Subroutine parameter.
    Argument = 2,
    /// Subroutine local variable.
    Local = 3,
}

impl SymbolKind {
    /// Memory segment the VM keeps variables of this kind in.
    #[rustfmt::skip]
    pub fn segment(self) -> Segment {
        match self {
            Self::Static   => Segment::Static,
            Self::Field    => Segment::This,
            Self::Argument => Segment::Argument,
            Self::Local    => Segment::Local,
        }
    }

    /// Static and field variables live as long as the class.
    #[inline]
    pub fn is_class_scope(self) -> bool {
        matches!(self, Self::Static | Self::Field)
    }

    #[inline]
    fn counter(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Field => write!(f, "field"),
            Self::Argument => write!(f, "argument"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Variable entry in the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Declared type, either a primitive like `int` or a class name.
    pub ty: SmolStr,
    pub kind: SymbolKind,
    /// Running index, unique within the kind and scope.
    pub index: u16,
}

impl Symbol {
    #[inline]
    pub fn segment(&self) -> Segment {
        self.kind.segment()
    }
}

/// Two level scoped symbol table.
///
/// The class scope holds static and field variables. The subroutine
/// scope holds arguments and locals, and is cleared at the start of
/// every subroutine. Lookups search the subroutine scope first, so
/// locals shadow class members.
#[derive(Default)]
pub struct SymbolTable {
    class_scope: BTreeMap<SmolStr, Symbol>,
    subroutine_scope: BTreeMap<SmolStr, Symbol>,
    /// Number of symbols defined per kind, indexed by [`SymbolKind`].
    counts: [u16; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, so a new class can be compiled.
    pub fn start_class(&mut self) {
        self.class_scope.clear();
        self.subroutine_scope.clear();
        self.counts = [0; 4];
    }

    /// Start a new subroutine scope.
    ///
    /// Arguments and locals of the previous subroutine are
    /// discarded, and their counters reset to zero.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.counts[SymbolKind::Argument.counter()] = 0;
        self.counts[SymbolKind::Local.counter()] = 0;
    }

    /// Define a new variable, assigning it the next index of its kind.
    ///
    /// Redefining a name in the same scope replaces the previous entry.
    ///
    /// Returns `None`, defining nothing, when every index of the kind is taken.
    pub fn define(
        &mut self,
        name: impl Into<SmolStr>,
        ty: impl Into<SmolStr>,
        kind: SymbolKind,
    ) -> Option<u16> {
        let name = name.into();
        let index = self.counts[kind.counter()];
        self.counts[kind.counter()] = index.checked_add(1)?;

        let symbol = Symbol {
            ty: ty.into(),
            kind,
            index,
        };
        debug!("define {kind} {} {name} -> {} {index}", symbol.ty, kind.segment());

        if kind.is_class_scope() {
            self.class_scope.insert(name, symbol);
        } else {
            self.subroutine_scope.insert(name, symbol);
        }

        Some(index)
    }

    /// Lookup the given name according to the scope rules.
    ///
    /// Returns `None` when the name is not a variable, in which
    /// case it presumably names a class or subroutine.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    #[inline]
    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.lookup(name).map(|symbol| symbol.kind)
    }

    #[inline]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|symbol| symbol.ty.as_str())
    }

    #[inline]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|symbol| symbol.index)
    }

    /// Number of variables of the given kind defined in the current scope.
    #[inline]
    pub fn var_count(&self, kind: SymbolKind) -> u16 {
        self.counts[kind.counter()]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_indices_per_kind() {
        let mut table = SymbolTable::new();

        assert_eq!(table.define("x", "int", SymbolKind::Field), Some(0));
        assert_eq!(table.define("count", "int", SymbolKind::Static), Some(0));
        assert_eq!(table.define("y", "int", SymbolKind::Field), Some(1));
        assert_eq!(table.define("a", "Array", SymbolKind::Argument), Some(0));
        assert_eq!(table.define("i", "int", SymbolKind::Local), Some(0));
        assert_eq!(table.define("j", "int", SymbolKind::Local), Some(1));
        assert_eq!(table.define("b", "boolean", SymbolKind::Argument), Some(1));

        assert_eq!(table.var_count(SymbolKind::Field), 2);
        assert_eq!(table.var_count(SymbolKind::Static), 1);
        assert_eq!(table.var_count(SymbolKind::Argument), 2);
        assert_eq!(table.var_count(SymbolKind::Local), 2);

        assert_eq!(table.kind_of("j"), Some(SymbolKind::Local));
        assert_eq!(table.type_of("a"), Some("Array"));
        assert_eq!(table.index_of("y"), Some(1));
    }

    #[test]
    fn test_start_subroutine_keeps_class_scope() {
        let mut table = SymbolTable::new();
        table.define("size", "int", SymbolKind::Field);
        table.define("instances", "int", SymbolKind::Static);
        table.define("n", "int", SymbolKind::Argument);
        table.define("tmp", "char", SymbolKind::Local);

        table.start_subroutine();

        assert_eq!(table.kind_of("size"), Some(SymbolKind::Field));
        assert_eq!(table.kind_of("instances"), Some(SymbolKind::Static));
        assert_eq!(table.lookup("n"), None);
        assert_eq!(table.lookup("tmp"), None);
        assert_eq!(table.var_count(SymbolKind::Argument), 0);
        assert_eq!(table.var_count(SymbolKind::Local), 0);
        assert_eq!(table.var_count(SymbolKind::Field), 1);

        // Counting restarts from zero.
        assert_eq!(table.define("m", "int", SymbolKind::Argument), Some(0));
    }

    #[test]
    fn test_subroutine_scope_shadows_class_scope() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field);
        table.define("x", "Point", SymbolKind::Local);

        let symbol = table.lookup("x").unwrap();
        assert_eq!(symbol.kind, SymbolKind::Local);
        assert_eq!(symbol.ty, "Point");

        table.start_subroutine();
        assert_eq!(table.kind_of("x"), Some(SymbolKind::Field));
    }

    #[test]
    fn test_unknown_name() {
        let table = SymbolTable::new();
        assert_eq!(table.kind_of("Output"), None);
        assert_eq!(table.type_of("Output"), None);
        assert_eq!(table.index_of("Output"), None);
    }

    #[test]
    fn test_start_class_clears_everything() {
        let mut table = SymbolTable::new();
        table.define("x", "int", SymbolKind::Field);
        table.start_class();

        assert_eq!(table.lookup("x"), None);
        assert_eq!(table.var_count(SymbolKind::Field), 0);
    }

    #[test]
    fn test_index_exhausted() {
        let mut table = SymbolTable::new();
        table.counts[SymbolKind::Local.counter()] = u16::MAX;

        assert_eq!(table.define("last", "int", SymbolKind::Local), None);
        assert_eq!(table.lookup("last"), None);
        assert_eq!(table.var_count(SymbolKind::Local), u16::MAX);

        // Other kinds are unaffected.
        assert_eq!(table.define("x", "int", SymbolKind::Argument), Some(0));
    }

    #[test]
    fn test_segment_mapping() {
        assert_eq!(SymbolKind::Static.segment(), Segment::Static);
        assert_eq!(SymbolKind::Field.segment(), Segment::This);
        assert_eq!(SymbolKind::Argument.segment(), Segment::Argument);
        assert_eq!(SymbolKind::Local.segment(), Segment::Local);
    }
}
