//! Time-indexed storage of observed signal values.
//!
//! The store is sparse: only value changes are recorded, and a signal keeps
//! its most recent value across later sample times. Values are indexed both
//! by time and by alias so either axis is a direct lookup.

use error::*;
use intern::Symbol;
use utils::normalize_bits;

use std::collections::{BTreeMap, HashMap};

/// Key-value storage relating aliases, simulation times and observed values.
#[derive(Clone, Debug, Default)]
pub struct Values {
    times: Vec<u64>,
    by_time: BTreeMap<u64, HashMap<Symbol, Box<str>>>,
    by_alias: HashMap<Symbol, BTreeMap<u64, Box<str>>>,
    widths: HashMap<Symbol, u32>,
}

impl Values {
    /// Registers a declared alias and its bit width.
    pub fn add_alias(&mut self, alias: Symbol, width: u32) {
        self.by_alias.entry(alias).or_insert_with(BTreeMap::new);
        self.widths.insert(alias, width);
    }

    /// The declared bit width of an alias, or `None` if it was never
    /// declared.
    pub fn width(&self, alias: Symbol) -> Option<u32> {
        self.widths.get(&alias).cloned()
    }

    /// Registers a new simulation time.
    pub fn add_time(&mut self, time: u64) {
        self.by_time.entry(time).or_insert_with(HashMap::new);
        if !self.times.contains(&time) {
            self.times.push(time);
        }
    }

    /// All registered simulation times, in observation order.
    pub fn times(&self) -> &[u64] {
        &self.times
    }

    /// Records a value change of `alias` at `time`.
    ///
    /// The stored value is always exactly the declared width of the alias:
    /// short values are left-zero-padded, long values keep their rightmost
    /// bits.
    ///
    /// # Errors
    ///
    /// Returns [`UndeclaredAlias`] if the alias was never registered with
    /// [`add_alias()`].
    ///
    /// [`UndeclaredAlias`]: ../error/enum.ErrorKind.html#variant.UndeclaredAlias
    /// [`add_alias()`]: #method.add_alias
    pub fn add_value(&mut self, time: u64, alias: Symbol, value: &str) -> Result<()> {
        let width = match self.widths.get(&alias) {
            Some(w) => *w,
            None => bail!(ErrorKind::UndeclaredAlias(format!("symbol #{}", usize::from(alias)))),
        };
        let v: Box<str> = normalize_bits(value, width).into_owned().into_boxed_str();
        self.by_time.entry(time).or_insert_with(HashMap::new).insert(alias, v.clone());
        self.by_alias.entry(alias).or_insert_with(BTreeMap::new).insert(time, v);
        Ok(())
    }

    /// The full observed history of an alias, keyed by time.
    pub fn values_by_time(&self, alias: Symbol) -> Option<&BTreeMap<u64, Box<str>>> {
        self.by_alias.get(&alias)
    }

    /// All value changes observed at one simulation time.
    pub fn values_at_time(&self, time: u64) -> Option<&HashMap<Symbol, Box<str>>> {
        self.by_time.get(&time)
    }

    /// Half-open time intervals `[start, end)` during which `alias` held
    /// exactly `value`.
    ///
    /// Each sample equal to `value` contributes the interval from its own
    /// time to the next sample's time. The final sample has no successor and
    /// never contributes an interval, even when it matches.
    pub fn intervals_where_equal(&self, alias: Symbol, value: &str) -> Vec<(u64, u64)> {
        let mut tr = Vec::new();
        if let Some(vt) = self.by_alias.get(&alias) {
            let mut samples = vt.iter().peekable();
            while let Some((&time, observed)) = samples.next() {
                if let Some(&(&next_time, _)) = samples.peek() {
                    if &**observed == value {
                        tr.push((time, next_time));
                    }
                }
            }
        }
        tr
    }
}

//----------------------------------------------------------------------------------------------------------------------
