//! String interning.
//!
//! Scope names, signal names and alias tokens recur on almost every line of a
//! trace, so they are stored once in an [`Interner`] and passed around as
//! copyable [`Symbol`]s. Serialization resolves symbols back to strings via
//! [`SerializeWithInterner`].
//!
//! [`Interner`]: ./struct.Interner.html
//! [`Symbol`]: ./struct.Symbol.html
//! [`SerializeWithInterner`]: ./trait.SerializeWithInterner.html

use num_traits::{Bounded, FromPrimitive, ToPrimitive};
use serde::{Serialize, Serializer};
use shawshank::{self, ArenaSet};

use std::fmt;
use std::ops::Index;

/// An interned string.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Symbol(usize);

impl fmt::Debug for Symbol {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Symbol({})", self.0)
    }
}

impl Bounded for Symbol {
    fn min_value() -> Self {
        Symbol(usize::min_value())
    }
    fn max_value() -> Self {
        Symbol(usize::max_value())
    }
}

impl FromPrimitive for Symbol {
    fn from_i64(n: i64) -> Option<Self> {
        usize::from_i64(n).map(Symbol)
    }
    fn from_u64(n: u64) -> Option<Self> {
        usize::from_u64(n).map(Symbol)
    }
    fn from_usize(n: usize) -> Option<Self> {
        Some(Symbol(n))
    }
}

impl ToPrimitive for Symbol {
    fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }
    fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }
    fn to_usize(&self) -> Option<usize> {
        Some(self.0)
    }
}

impl From<usize> for Symbol {
    fn from(v: usize) -> Symbol {
        Symbol(v)
    }
}
impl From<Symbol> for usize {
    fn from(s: Symbol) -> usize {
        s.0
    }
}

/// The symbol representing the string `"<unknown>"`.
pub const UNKNOWN_SYMBOL: Symbol = Symbol(0);

/// The string interner.
pub struct Interner(ArenaSet<Box<str>, Symbol>);

impl Interner {
    /// Creates a new interner, with `"<unknown>"` pre-interned as
    /// [`UNKNOWN_SYMBOL`].
    ///
    /// [`UNKNOWN_SYMBOL`]: ./constant.UNKNOWN_SYMBOL.html
    pub fn new() -> Interner {
        let mut si = shawshank::Builder::<Box<str>, Symbol>::new().hash().unwrap();
        let symbol = si.intern("<unknown>".to_owned().into_boxed_str()).unwrap();
        debug_assert_eq!(symbol, UNKNOWN_SYMBOL);
        Interner(si)
    }

    /// Interns a string, returning the symbol representing it. Interning the
    /// same string twice returns the same symbol.
    pub fn intern<S: Into<Box<str>>>(&mut self, s: S) -> Symbol {
        self.0.intern(s.into()).unwrap()
    }

    /// Wraps a value so that it serializes with the strings behind its
    /// symbols resolved through this interner.
    pub fn with<'si, 'a, T: 'a + SerializeWithInterner>(&'si self, value: &'a T) -> WithInterner<'si, 'a, T> {
        WithInterner {
            interner: self,
            value,
        }
    }
}

impl Default for Interner {
    fn default() -> Interner {
        Interner::new()
    }
}

impl Index<Symbol> for Interner {
    type Output = str;
    fn index(&self, index: Symbol) -> &str {
        self.0.resolve(index).expect("valid symbol")
    }
}

/// A value paired with the interner that owns its symbols.
pub struct WithInterner<'si, 'a, T: 'a + SerializeWithInterner> {
    pub interner: &'si Interner,
    pub value: &'a T,
}

/// Serialization that resolves [`Symbol`]s to strings.
///
/// [`Symbol`]: ./struct.Symbol.html
pub trait SerializeWithInterner: Serialize {
    fn serialize_with_interner<S: Serializer>(&self, serializer: S, interner: &Interner) -> Result<S::Ok, S::Error>;
}

impl<'si, 'a, T: 'a + SerializeWithInterner> Serialize for WithInterner<'si, 'a, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize_with_interner(serializer, self.interner)
    }
}

impl SerializeWithInterner for Symbol {
    fn serialize_with_interner<S: Serializer>(&self, serializer: S, interner: &Interner) -> Result<S::Ok, S::Error> {
        interner[*self].serialize(serializer)
    }
}

impl<T: SerializeWithInterner> SerializeWithInterner for Vec<T> {
    fn serialize_with_interner<S: Serializer>(&self, serializer: S, interner: &Interner) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|value| interner.with(value)))
    }
}

impl<T: SerializeWithInterner> SerializeWithInterner for Option<T> {
    fn serialize_with_interner<S: Serializer>(&self, serializer: S, interner: &Interner) -> Result<S::Ok, S::Error> {
        match *self {
            None => serializer.serialize_none(),
            Some(ref value) => serializer.serialize_some(&interner.with(value)),
        }
    }
}

macro_rules! count_fields {
    () => { 0 };
    ($a:ident $($tail:ident)*) => { count_fields!($($tail)*) + 1 };
}

// poor man's workaround for `#[derive(SerializeWithInterner)]`
// to avoid needing to depend on an internal crate.
macro_rules! derive_serialize_with_interner {
    // derive for struct
    (
        $(#[$struct_attr:meta])*
        pub struct $struct_name:ident {
            $(
                $(#[$field_attr:meta])*
                pub $field_name:ident: $field_ty:ty,
            )+
        }
    ) => {
        $(#[$struct_attr])*
        pub struct $struct_name {
            $(
                $(#[$field_attr])*
                pub $field_name: $field_ty,
            )+
        }

        impl $crate::intern::SerializeWithInterner for $struct_name {
            fn serialize_with_interner<S: ::serde::Serializer>(&self, serializer: S, interner: &$crate::intern::Interner) -> ::std::result::Result<S::Ok, S::Error> {
                use serde::ser::SerializeStruct;
                let mut state = serializer.serialize_struct(stringify!($struct_name), count_fields!($($field_name)*))?;
                $(
                    state.serialize_field(stringify!($field_name), &interner.with(&self.$field_name))?;
                )*
                state.end()
            }
        }
    };

    // directly forward to Serialize
    (direct: $($ty:ty),*) => {
        $(
            impl $crate::intern::SerializeWithInterner for $ty {
                fn serialize_with_interner<S: ::serde::Serializer>(&self, serializer: S, _: &$crate::intern::Interner) -> ::std::result::Result<S::Ok, S::Error> {
                    self.serialize(serializer)
                }
            }
        )*
    }
}

derive_serialize_with_interner! {
    direct: u32, u64, usize, f64, String
}

#[test]
fn test_intern_round_trip() {
    let mut interner = Interner::new();
    let clk = interner.intern("top/clk");
    let rst = interner.intern("top/rst");
    assert_ne!(clk, rst);
    assert_eq!(interner.intern("top/clk"), clk);
    assert_eq!(&interner[clk], "top/clk");
    assert_eq!(&interner[UNKNOWN_SYMBOL], "<unknown>");
}
