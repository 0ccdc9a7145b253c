//! The coverage model.
//!
//! A [`CoverDb`] is loaded once from a JSON coverage specification, mutated
//! in place by the evaluators in [`eval`], and finally serialized for the
//! external report renderer. Serialization resolves interned names through
//! [`Interner::with()`].
//!
//! [`CoverDb`]: ./struct.CoverDb.html
//! [`eval`]: ../eval/index.html
//! [`Interner::with()`]: ../struct.Interner.html#method.with

use error::*;
use intern::{Interner, SerializeWithInterner, Symbol};

use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::result::Result as StdResult;

//----------------------------------------------------------------------------------------------------------------------
//{{{ Coverbin

/// A single coverage bin: an inclusive value range `[low, high]` (a single
/// value when `low == high`) with its accumulated hit statistics.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(try_from = "BinRepr")]
pub struct Coverbin {
    low: i64,
    high: i64,
    hits: u64,
    hit_times: BTreeSet<(u64, u64)>,
}

impl Coverbin {
    /// Creates a bin matching the inclusive range `[low, high]`.
    pub fn new(low: i64, high: i64) -> Coverbin {
        Coverbin {
            low,
            high,
            hits: 0,
            hit_times: BTreeSet::new(),
        }
    }

    /// Lower bound of the bin, inclusive.
    pub fn low(&self) -> i64 {
        self.low
    }

    /// Upper bound of the bin, inclusive.
    pub fn high(&self) -> i64 {
        self.high
    }

    /// Number of distinct hit intervals recorded so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Whether the bin has been hit at least once.
    pub fn covered(&self) -> bool {
        self.hits > 0
    }

    /// Coverage fraction of the bin: 1.0 once hit, otherwise 0.0. There is
    /// no partial credit.
    pub fn cov(&self) -> f64 {
        if self.hits > 0 {
            1.0
        } else {
            0.0
        }
    }

    /// The distinct half-open time intervals during which the bin was hit.
    pub fn hit_times(&self) -> &BTreeSet<(u64, u64)> {
        &self.hit_times
    }

    /// Whether `value` falls inside the bin.
    pub fn matches(&self, value: i64) -> bool {
        self.low <= value && value <= self.high
    }

    /// Records a hit interval. The interval set is a union, so re-observing
    /// a known interval changes nothing; the hit count grows only when the
    /// interval is new. Returns whether it was.
    pub fn add_hit(&mut self, interval: (u64, u64)) -> bool {
        let newly_recorded = self.hit_times.insert(interval);
        if newly_recorded {
            self.hits += 1;
        }
        newly_recorded
    }
}

impl Serialize for Coverbin {
    fn serialize<S: Serializer>(&self, serializer: S) -> StdResult<S::Ok, S::Error> {
        let single = self.low == self.high;
        let mut state = serializer.serialize_struct("Coverbin", if single { 3 } else { 4 })?;
        if single {
            state.serialize_field("value", &self.high)?;
        } else {
            state.serialize_field("high", &self.high)?;
            state.serialize_field("low", &self.low)?;
        }
        state.serialize_field("hits", &self.hits)?;
        state.serialize_field("cov", &self.cov())?;
        state.end()
    }
}

/// The serialized shape of a [`Coverbin`]: either `value` or `high`/`low`,
/// with optional statistics.
///
/// [`Coverbin`]: ./struct.Coverbin.html
#[derive(Deserialize)]
struct BinRepr {
    value: Option<i64>,
    low: Option<i64>,
    high: Option<i64>,
    #[serde(default)]
    hits: u64,
}

impl TryFrom<BinRepr> for Coverbin {
    type Error = String;
    fn try_from(repr: BinRepr) -> StdResult<Coverbin, String> {
        let (low, high) = match (repr.value, repr.low, repr.high) {
            (Some(value), _, _) => (value, value),
            (None, Some(low), Some(high)) => (low, high),
            _ => return Err("bin needs either \"value\" or both \"low\" and \"high\"".to_owned()),
        };
        Ok(Coverbin {
            low,
            high,
            hits: repr.hits,
            hit_times: BTreeSet::new(),
        })
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ Coverpoint & Covergroup

derive_serialize_with_interner! {
    /// A named observation target bound to one signal, partitioned into
    /// bins.
    #[derive(Clone, Debug, Serialize)]
    pub struct Coverpoint {
        /// Name of the coverpoint.
        pub name: Symbol,
        /// Declared bit width of the bound signal.
        pub width: u32,
        /// Fully-qualified name of the bound signal.
        pub signal: Symbol,
        /// The bins of this coverpoint.
        pub bins: Vec<Coverbin>,
    }
}

derive_serialize_with_interner! {
    /// A named collection of coverpoints.
    #[derive(Clone, Debug, Serialize)]
    pub struct Covergroup {
        /// Name of the covergroup.
        pub name: Symbol,
        /// The coverpoints of this group.
        pub points: Vec<Coverpoint>,
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ CrossCoveragePoint

/// Non-owning reference to a bin: the positions of its group, point and bin
/// in the model.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct BinRef {
    /// Position of the covergroup in the model.
    pub group: usize,
    /// Position of the coverpoint in its group.
    pub point: usize,
    /// Position of the bin in its coverpoint.
    pub bin: usize,
}

/// One pairing of two bins derived from a cross-coverage definition.
#[derive(Clone, Debug, Serialize)]
pub struct CrossCoveragePoint {
    /// Name of the cross point, derived from the two parent coverpoints.
    pub name: Symbol,
    /// The two set specifications this pairing was derived from.
    pub sets: Vec<String>,
    #[serde(skip_serializing)]
    pub(crate) bins: Vec<BinRef>,
    pub(crate) hits: u64,
}

impl CrossCoveragePoint {
    /// The bins contributing to this cross point.
    pub fn bins(&self) -> &[BinRef] {
        &self.bins
    }

    /// The computed hit count.
    pub fn hits(&self) -> u64 {
        self.hits
    }
}

impl SerializeWithInterner for CrossCoveragePoint {
    fn serialize_with_interner<S: Serializer>(&self, serializer: S, interner: &Interner) -> StdResult<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CrossCoveragePoint", 3)?;
        state.serialize_field("name", &interner.with(&self.name))?;
        state.serialize_field("sets", &self.sets)?;
        state.serialize_field("hits", &self.hits)?;
        state.end()
    }
}

//}}}
//----------------------------------------------------------------------------------------------------------------------
//{{{ CoverDb & loading

derive_serialize_with_interner! {
    /// The full coverage model of one run.
    #[derive(Clone, Debug, Default, Serialize)]
    pub struct CoverDb {
        /// The covergroups, in name order.
        pub covergroups: Vec<Covergroup>,
        /// The cross-coverage pairings, in specification order.
        pub crosscoverage: Vec<CrossCoveragePoint>,
    }
}

/// The JSON schema of a coverage specification file.
#[derive(Deserialize)]
struct SpecDb {
    covergroups: BTreeMap<String, BTreeMap<String, PointSpec>>,
    crosscoverage: Vec<CrossSpec>,
}

#[derive(Deserialize)]
struct PointSpec {
    signal: String,
    width: u32,
    bins: Option<Vec<BinSpec>>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum BinSpec {
    Value { value: i64 },
    Range { low: i64, high: i64 },
}

#[derive(Deserialize)]
struct CrossSpec {
    name: String,
    sets: Vec<String>,
}

impl CoverDb {
    /// Loads a coverage specification file.
    ///
    /// Covergroups and their coverpoints are kept in name order, not in the
    /// order the specification file declares them; the serialized report
    /// lists them the same way. Cross-coverage entries stay in declaration
    /// order.
    ///
    /// # Errors
    ///
    /// * Returns [`Io`] if the file cannot be opened or read.
    /// * Returns [`Json`] if the specification is not valid JSON or misses
    ///   required keys.
    /// * Returns [`CrossSetCount`] / [`InvalidSetSpec`] /
    ///   [`WidthTooLarge`] on structurally invalid specifications.
    ///
    /// [`Io`]: ../error/enum.ErrorKind.html#variant.Io
    /// [`Json`]: ../error/enum.ErrorKind.html#variant.Json
    /// [`CrossSetCount`]: ../error/enum.ErrorKind.html#variant.CrossSetCount
    /// [`InvalidSetSpec`]: ../error/enum.ErrorKind.html#variant.InvalidSetSpec
    /// [`WidthTooLarge`]: ../error/enum.ErrorKind.html#variant.WidthTooLarge
    pub fn load<P: AsRef<Path>>(p: P, interner: &mut Interner) -> Result<CoverDb> {
        let path = p.as_ref();
        debug!("load coverage specification {:?}", path);
        Location::File(path.to_owned()).wrap(|| -> Result<CoverDb> {
            CoverDb::from_reader(BufReader::new(File::open(path)?), interner)
        })
    }

    /// Loads a coverage specification from a reader. See [`load()`].
    ///
    /// [`load()`]: #method.load
    pub fn from_reader<R: Read>(reader: R, interner: &mut Interner) -> Result<CoverDb> {
        let spec: SpecDb = ::serde_json::from_reader(reader)?;
        CoverDb::from_spec(spec, interner)
    }

    fn from_spec(spec: SpecDb, interner: &mut Interner) -> Result<CoverDb> {
        let mut covergroups = Vec::with_capacity(spec.covergroups.len());
        for (group_name, points) in spec.covergroups {
            let mut group = Covergroup {
                name: interner.intern(group_name),
                points: Vec::with_capacity(points.len()),
            };
            for (point_name, point) in points {
                group.points.push(make_point(point_name, point, interner)?);
            }
            covergroups.push(group);
        }

        let mut crosscoverage = Vec::new();
        for cross in spec.crosscoverage {
            ensure!(cross.sets.len() == 2, ErrorKind::CrossSetCount(cross.name, cross.sets.len()));
            let bins_a = resolve_set_spec(&cross.sets[0], &covergroups, interner)?;
            let bins_b = resolve_set_spec(&cross.sets[1], &covergroups, interner)?;
            debug!("cross product of {} x {} bins", bins_a.len(), bins_b.len());
            for a in &bins_a {
                for b in &bins_b {
                    let name = {
                        let point_a = &interner[covergroups[a.group].points[a.point].name];
                        let point_b = &interner[covergroups[b.group].points[b.point].name];
                        format!("{} and {}", point_a, point_b)
                    };
                    crosscoverage.push(CrossCoveragePoint {
                        name: interner.intern(name),
                        sets: cross.sets.clone(),
                        bins: vec![*a, *b],
                        hits: 0,
                    });
                }
            }
        }

        Ok(CoverDb {
            covergroups,
            crosscoverage,
        })
    }
}

fn make_point(name: String, spec: PointSpec, interner: &mut Interner) -> Result<Coverpoint> {
    let mut point = Coverpoint {
        name: interner.intern(name),
        width: spec.width,
        signal: interner.intern(spec.signal),
        bins: Vec::new(),
    };
    match spec.bins {
        Some(bins) => {
            for bin in bins {
                match bin {
                    BinSpec::Value { value } => point.bins.push(Coverbin::new(value, value)),
                    BinSpec::Range { .. } => {
                        // range bins are recognized but not supported yet.
                        debug!("skipping range bin on coverpoint {}", &interner[point.name]);
                    },
                }
            }
        },
        None => {
            ensure!(spec.width < 63, ErrorKind::WidthTooLarge(spec.width));
            // one bin per representable value, except the top value.
            let top = (1i64 << spec.width) - 1;
            for value in 0..top {
                point.bins.push(Coverbin::new(value, value));
            }
        },
    }
    Ok(point)
}

/// Resolves a `<group>.<point>` set specification (either segment may be the
/// wildcard `*`) to every bin of every matching coverpoint.
fn resolve_set_spec(spec: &str, groups: &[Covergroup], interner: &Interner) -> Result<Vec<BinRef>> {
    let segments = spec.split('.').collect::<Vec<_>>();
    ensure!(segments.len() >= 2, ErrorKind::InvalidSetSpec(spec.to_owned()));

    let mut tr = Vec::new();
    for (gi, group) in groups.iter().enumerate() {
        if segments[0] != "*" && &interner[group.name] != segments[0] {
            continue;
        }
        for (pi, point) in group.points.iter().enumerate() {
            if segments[1] != "*" && &interner[point.name] != segments[1] {
                continue;
            }
            for bi in 0..point.bins.len() {
                tr.push(BinRef {
                    group: gi,
                    point: pi,
                    bin: bi,
                });
            }
        }
    }
    Ok(tr)
}

derive_serialize_with_interner! {
    direct: Coverbin
}

//}}}
//----------------------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::{CoverDb, Coverbin};
    use error::ErrorKind;
    use intern::Interner;

    fn load(json: &str, interner: &mut Interner) -> ::error::Result<CoverDb> {
        CoverDb::from_reader(json.as_bytes(), interner)
    }

    #[test]
    fn default_bins_exclude_the_top_value() {
        let mut interner = Interner::new();
        let db = load(r#"{"covergroups": {"g": {"p": {"signal": "top/sig", "width": 2}}}, "crosscoverage": []}"#, &mut interner).unwrap();
        let bins = &db.covergroups[0].points[0].bins;
        let values = bins.iter().map(Coverbin::high).collect::<Vec<_>>();
        assert_eq!(values, vec![0, 1, 2]);
        assert!(bins.iter().all(|b| b.low() == b.high()));
    }

    #[test]
    fn explicit_range_bins_are_skipped() {
        let mut interner = Interner::new();
        let db = load(
            r#"{"covergroups": {"g": {"p": {"signal": "top/sig", "width": 4,
                "bins": [{"value": 3}, {"low": 4, "high": 7}, {"value": 9}]}}},
                "crosscoverage": []}"#,
            &mut interner,
        ).unwrap();
        let bins = &db.covergroups[0].points[0].bins;
        let values = bins.iter().map(Coverbin::high).collect::<Vec<_>>();
        assert_eq!(values, vec![3, 9]);
    }

    #[test]
    fn missing_required_keys_fail() {
        let mut interner = Interner::new();
        assert!(load(r#"{"covergroups": {}}"#, &mut interner).is_err());
        assert!(load(r#"{"crosscoverage": []}"#, &mut interner).is_err());
        assert!(load(r#"{"covergroups": {"g": {"p": {"width": 2}}}, "crosscoverage": []}"#, &mut interner).is_err());
    }

    #[test]
    fn cross_product_pairs_every_bin() {
        let mut interner = Interner::new();
        let db = load(
            r#"{"covergroups": {"g": {
                "a": {"signal": "top/a", "width": 2, "bins": [{"value": 0}, {"value": 1}]},
                "b": {"signal": "top/b", "width": 2, "bins": [{"value": 2}, {"value": 3}, {"value": 1}]}}},
                "crosscoverage": [{"name": "axb", "sets": ["g.a", "g.b"]}]}"#,
            &mut interner,
        ).unwrap();
        assert_eq!(db.crosscoverage.len(), 6);
        assert!(db.crosscoverage.iter().all(|c| &interner[c.name] == "a and b"));
        assert!(db.crosscoverage.iter().all(|c| c.sets == ["g.a", "g.b"]));
        assert!(db.crosscoverage.iter().all(|c| c.bins().len() == 2));
    }

    #[test]
    fn wildcard_segments_match_everything() {
        let mut interner = Interner::new();
        let db = load(
            r#"{"covergroups": {
                "g1": {"p": {"signal": "top/a", "width": 1, "bins": [{"value": 0}]}},
                "g2": {"p": {"signal": "top/b", "width": 1, "bins": [{"value": 0}]}}},
                "crosscoverage": [{"name": "x", "sets": ["*.p", "g1.*"]}]}"#,
            &mut interner,
        ).unwrap();
        // first set resolves to both groups' bins, second to g1's only.
        assert_eq!(db.crosscoverage.len(), 2);
    }

    #[test]
    fn malformed_cross_entries_fail() {
        let mut interner = Interner::new();
        let err = load(
            r#"{"covergroups": {}, "crosscoverage": [{"name": "x", "sets": ["g.p"]}]}"#,
            &mut interner,
        ).unwrap_err();
        match *err.kind() {
            ErrorKind::CrossSetCount(ref name, 1) => assert_eq!(name, "x"),
            ref kind => panic!("unexpected error: {:?}", kind),
        }

        let err = load(
            r#"{"covergroups": {}, "crosscoverage": [{"name": "x", "sets": ["nodot", "g.p"]}]}"#,
            &mut interner,
        ).unwrap_err();
        match *err.kind() {
            ErrorKind::InvalidSetSpec(ref spec) => assert_eq!(spec, "nodot"),
            ref kind => panic!("unexpected error: {:?}", kind),
        }
    }

    #[test]
    fn bin_statistics_round_trip() {
        let mut bin = Coverbin::new(2, 2);
        assert!(bin.add_hit((2, 3)));
        assert!(bin.add_hit((3, 4)));
        assert!(!bin.add_hit((2, 3)));

        let json = ::serde_json::to_value(&bin).unwrap();
        assert_eq!(json, json!({"value": 2, "hits": 2, "cov": 1.0}));

        let back: Coverbin = ::serde_json::from_value(json).unwrap();
        assert_eq!(back.hits(), 2);
        assert_eq!(back.cov(), 1.0);
        assert_eq!(back.low(), 2);
        assert_eq!(back.high(), 2);

        let empty = ::serde_json::to_value(&Coverbin::new(1, 4)).unwrap();
        assert_eq!(empty, json!({"high": 4, "low": 1, "hits": 0, "cov": 0.0}));
        let back: Coverbin = ::serde_json::from_value(empty).unwrap();
        assert_eq!(back.hits(), 0);
        assert_eq!(back.cov(), 0.0);
    }
}
