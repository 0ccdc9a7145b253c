//! The raw structures of a parsed VCD trace.

use error::*;
use intern::{Interner, Symbol};
use reader::Reader;
use values::Values;

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::ops::Index;
use std::path::Path;

//----------------------------------------------------------------------------------------------------------------------
//{{{ ScopeIndex & Scope

/// Index to a scope in the scope arena.
///
/// The parent back-reference of a [`Scope`] is stored as a `ScopeIndex`, so
/// the arena remains the single owner of every scope.
///
/// [`Scope`]: ./struct.Scope.html
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeIndex(pub usize);

impl fmt::Debug for ScopeIndex {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "SI({})", self.0)
    }
}

impl From<ScopeIndex> for usize {
    fn from(i: ScopeIndex) -> usize {
        i.0
    }
}

/// One node of the trace's naming hierarchy.
#[derive(Clone, Debug)]
pub struct Scope {
    /// Name of the scope.
    pub name: Symbol,
    /// The enclosing scope, if any.
    pub parent: Option<ScopeIndex>,
    /// Scopes declared inside this one.
    pub children: Vec<ScopeIndex>,
    /// Names of the variables declared directly in this scope.
    pub vars: Vec<Symbol>,
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ ScopeTree

/// Arena of [`Scope`]s forming the naming hierarchy of one trace.
///
/// [`Scope`]: ./struct.Scope.html
#[derive(Clone, Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    root: Option<ScopeIndex>,
}

impl ScopeTree {
    /// The top-level scope, absent until the first scope declaration.
    pub fn root(&self) -> Option<ScopeIndex> {
        self.root
    }

    /// Appends a new scope under `parent`. Without a parent the new scope
    /// becomes the tree root.
    pub fn push_child(&mut self, parent: Option<ScopeIndex>, name: Symbol) -> ScopeIndex {
        let index = ScopeIndex(self.scopes.len());
        self.scopes.push(Scope {
            name,
            parent,
            children: Vec::new(),
            vars: Vec::new(),
        });
        match parent {
            Some(p) => self.scopes[p.0].children.push(index),
            None => self.root = Some(index),
        }
        index
    }

    /// Records a variable name as declared directly in `scope`.
    pub fn add_var(&mut self, scope: ScopeIndex, name: Symbol) {
        self.scopes[scope.0].vars.push(name);
    }

    /// Returns the fully-qualified name of a scope: the parent chain joined
    /// by `/`.
    pub fn full_name(&self, index: ScopeIndex, interner: &Interner) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            parts.push(&interner[self[i].name]);
            cursor = self[i].parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Returns the fully-qualified names of all variables declared directly
    /// in a scope.
    pub fn all_signals(&self, index: ScopeIndex, interner: &Interner) -> Vec<String> {
        let prefix = self.full_name(index, interner);
        self[index].vars.iter().map(|v| format!("{}/{}", prefix, &interner[*v])).collect()
    }

    /// Number of scopes in the arena.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether the arena holds no scope at all.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Index<ScopeIndex> for ScopeTree {
    type Output = Scope;
    fn index(&self, index: ScopeIndex) -> &Scope {
        &self.scopes[index.0]
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Vcd

/// A parsed VCD trace: the scope hierarchy, the declared-name table and the
/// observed value history.
#[derive(Clone, Debug, Default)]
pub struct Vcd {
    /// The naming hierarchy.
    pub scopes: ScopeTree,
    /// The observed value history.
    pub values: Values,
    names: HashMap<Symbol, Symbol>,
}

impl Vcd {
    /// Parses the trace file at `p`.
    ///
    /// # Errors
    ///
    /// * Returns [`Io`] if the file cannot be opened or read.
    /// * Returns [`UndeclaredAlias`] if a value change refers to an alias
    ///   that was never declared.
    ///
    /// [`Io`]: ../error/enum.ErrorKind.html#variant.Io
    /// [`UndeclaredAlias`]: ../error/enum.ErrorKind.html#variant.UndeclaredAlias
    pub fn open<P: AsRef<Path>>(p: P, interner: &mut Interner) -> Result<Vcd> {
        let path = p.as_ref();
        debug!("open trace file {:?}", path);
        Location::File(path.to_owned()).wrap(|| -> Result<Vcd> {
            Reader::new(BufReader::new(File::open(path)?), interner).parse()
        })
    }

    pub(crate) fn new(scopes: ScopeTree, names: HashMap<Symbol, Symbol>, values: Values) -> Vcd {
        Vcd {
            scopes,
            values,
            names,
        }
    }

    /// Looks up the trace-local alias of a fully-qualified signal name.
    ///
    /// Returns `None` when the signal does not exist in this trace; callers
    /// treat this as "signal not recorded", not as an error.
    pub fn signal_alias(&self, full_name: Symbol) -> Option<Symbol> {
        self.names.get(&full_name).cloned()
    }

    /// The declared (fully-qualified name, alias) pairs of this trace.
    pub fn names(&self) -> &HashMap<Symbol, Symbol> {
        &self.names
    }
}

//}}}
