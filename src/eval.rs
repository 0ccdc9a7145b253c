//! Coverage evaluation.
//!
//! Two passes populate a loaded [`CoverDb`]: [`evaluate()`] scans the
//! recorded value histories and attributes hit intervals to the bins, then
//! [`evaluate_cross()`] derives the cross-coverage hit counts from those
//! intervals. Cross evaluation must run after bin evaluation or every cross
//! point reports zero hits.
//!
//! [`CoverDb`]: ../model/struct.CoverDb.html
//! [`evaluate()`]: ../model/struct.CoverDb.html#method.evaluate
//! [`evaluate_cross()`]: ../model/struct.CoverDb.html#method.evaluate_cross

use intern::Interner;
use model::{CoverDb, Covergroup, CrossCoveragePoint};
use vcd::Vcd;

use std::collections::BTreeSet;

impl CoverDb {
    /// Evaluates every bin of every coverpoint against the trace.
    ///
    /// Each sample of a signal's history except the last defines a half-open
    /// interval from its own timestamp to the next one. A bin records the
    /// interval when the sample's value, read as binary, falls inside the
    /// bin's range. Values containing `x` or `z` are not numerals and never
    /// match any bin.
    ///
    /// A coverpoint whose signal does not appear in the trace is reported
    /// with a warning and left untouched; evaluation continues with the
    /// remaining points.
    pub fn evaluate(&mut self, vcd: &Vcd, interner: &Interner) {
        for group in &mut self.covergroups {
            debug!("evaluating covergroup {}", &interner[group.name]);
            for point in &mut group.points {
                let alias = match vcd.signal_alias(point.signal) {
                    Some(alias) => alias,
                    None => {
                        warn!("signal {} not found in trace, skipping coverpoint {}", &interner[point.signal], &interner[point.name]);
                        continue;
                    },
                };
                let history = match vcd.values.values_by_time(alias) {
                    Some(history) => history,
                    None => continue,
                };
                let samples = history.iter().map(|(time, value)| (*time, &**value)).collect::<Vec<_>>();
                for bin in &mut point.bins {
                    for window in samples.windows(2) {
                        let (time, value) = window[0];
                        let (next_time, _) = window[1];
                        let value = match i64::from_str_radix(value, 2) {
                            Ok(value) => value,
                            Err(_) => continue,
                        };
                        if bin.matches(value) {
                            bin.add_hit((time, next_time));
                        }
                    }
                }
            }
        }
    }

    /// Evaluates every cross-coverage point from the already-populated bin
    /// hit intervals.
    ///
    /// Each interval is expanded into its individual time steps, so the cost
    /// grows with the total length of the hit intervals, not with their
    /// count.
    pub fn evaluate_cross(&mut self) {
        let groups = &self.covergroups;
        for cross in &mut self.crosscoverage {
            cross.evaluate(groups);
        }
    }
}

impl CrossCoveragePoint {
    /// The hit count is the size of a union of expanded time-step sets. The
    /// union starts from the first contributing bin's intervals, and every
    /// further contributing bin unions in the expansion of the first bin's
    /// intervals again, so the result is the total length of the first bin's
    /// intervals.
    fn evaluate(&mut self, groups: &[Covergroup]) {
        let first = match self.bins.first() {
            Some(first) => *first,
            None => return,
        };
        let first = &groups[first.group].points[first.point].bins[first.bin];

        let mut hit_times = BTreeSet::new();
        for &(start, end) in first.hit_times() {
            hit_times.extend(start..end);
        }
        for _ in &self.bins[1..] {
            let mut other = BTreeSet::new();
            for &(start, end) in first.hit_times() {
                other.extend(start..end);
            }
            hit_times.append(&mut other);
        }

        self.hits = hit_times.len() as u64;
        trace!("cross point evaluated to {} hits", self.hits);
    }
}

#[cfg(test)]
mod tests {
    use intern::Interner;
    use model::CoverDb;
    use reader::Reader;
    use vcd::Vcd;

    fn parse(trace: &str, interner: &mut Interner) -> Vcd {
        Reader::new(trace.as_bytes(), interner).parse().unwrap()
    }

    fn load(json: &str, interner: &mut Interner) -> CoverDb {
        CoverDb::from_reader(json.as_bytes(), interner).unwrap()
    }

    static TRACE: &str = "\
        $scope module top $end\n\
        $var wire 2 ! sig $end\n\
        $upscope $end\n\
        $dumpvars\n\
        b00 !\n\
        $end\n\
        #1\n\
        b01 !\n\
        #2\n\
        b10 !\n\
        #3\n\
        b10 !\n\
        #4\n\
        b11 !\n\
    ";

    #[test]
    fn repeated_values_accumulate_distinct_intervals() {
        let mut interner = Interner::new();
        let vcd = parse(TRACE, &mut interner);
        let mut db = load(
            r#"{"covergroups": {"g": {"p": {"signal": "top/sig", "width": 2, "bins": [{"value": 2}]}}},
                "crosscoverage": []}"#,
            &mut interner,
        );
        db.evaluate(&vcd, &interner);

        let bin = &db.covergroups[0].points[0].bins[0];
        assert_eq!(bin.hits(), 2);
        let intervals = bin.hit_times().iter().cloned().collect::<Vec<_>>();
        assert_eq!(intervals, vec![(2, 3), (3, 4)]);
    }

    #[test]
    fn final_sample_is_not_an_interval() {
        let mut interner = Interner::new();
        let vcd = parse(TRACE, &mut interner);
        let mut db = load(
            r#"{"covergroups": {"g": {"p": {"signal": "top/sig", "width": 2}}},
                "crosscoverage": []}"#,
            &mut interner,
        );
        db.evaluate(&vcd, &interner);

        // `b11` is only the last sample, so its bin would stay empty even if
        // the default bins reached it.
        let hits = db.covergroups[0].points[0]
            .bins
            .iter()
            .map(|b| (b.high(), b.hits()))
            .collect::<Vec<_>>();
        assert_eq!(hits, vec![(0, 1), (1, 1), (2, 2)]);
    }

    #[test]
    fn missing_signals_are_skipped() {
        let mut interner = Interner::new();
        let vcd = parse(TRACE, &mut interner);
        let mut db = load(
            r#"{"covergroups": {"g": {
                "absent": {"signal": "top/nosuch", "width": 2, "bins": [{"value": 0}]},
                "present": {"signal": "top/sig", "width": 2, "bins": [{"value": 0}]}}},
                "crosscoverage": []}"#,
            &mut interner,
        );
        db.evaluate(&vcd, &interner);

        // points are kept in name order.
        assert_eq!(db.covergroups[0].points[0].bins[0].hits(), 0);
        assert_eq!(db.covergroups[0].points[1].bins[0].hits(), 1);
    }

    #[test]
    fn non_binary_values_never_match() {
        let mut interner = Interner::new();
        let vcd = parse(
            "\
                $scope module top $end\n\
                $var wire 1 ! sig $end\n\
                $upscope $end\n\
                $dumpvars\n\
                x!\n\
                $end\n\
                #1\n\
                1!\n\
                #2\n\
                0!\n\
            ",
            &mut interner,
        );
        let mut db = load(
            r#"{"covergroups": {"g": {"p": {"signal": "top/sig", "width": 1, "bins": [{"value": 0}, {"value": 1}]}}},
                "crosscoverage": []}"#,
            &mut interner,
        );
        db.evaluate(&vcd, &interner);

        let bins = &db.covergroups[0].points[0].bins;
        assert_eq!(bins[0].hits(), 0); // the `x` at time 0 counts for nothing
        assert_eq!(bins[1].hits(), 1);
    }

    #[test]
    fn cross_hits_follow_the_first_set_only() {
        let mut interner = Interner::new();
        let vcd = parse(
            "\
                $scope module top $end\n\
                $var wire 1 ! a $end\n\
                $var wire 1 \" b $end\n\
                $upscope $end\n\
                $dumpvars\n\
                1!\n\
                $end\n\
                #2\n\
                1\"\n\
                #3\n\
                0\"\n\
                #5\n\
                0!\n\
                #10\n\
                1!\n\
                #15\n\
                0!\n\
            ",
            &mut interner,
        );
        let mut db = load(
            r#"{"covergroups": {"g": {
                "a": {"signal": "top/a", "width": 1, "bins": [{"value": 1}]},
                "b": {"signal": "top/b", "width": 1, "bins": [{"value": 1}]}}},
                "crosscoverage": [{"name": "x", "sets": ["g.a", "g.b"]}]}"#,
            &mut interner,
        );
        db.evaluate(&vcd, &interner);
        db.evaluate_cross();

        // a's bin was hit during [0, 5) and [10, 15), b's during [2, 3). The
        // union is driven by the first set alone: 10 time steps.
        assert_eq!(db.covergroups[0].points[0].bins[0].hits(), 2);
        assert_eq!(db.covergroups[0].points[1].bins[0].hits(), 1);
        assert_eq!(db.crosscoverage.len(), 1);
        assert_eq!(db.crosscoverage[0].hits(), 10);
    }
}
