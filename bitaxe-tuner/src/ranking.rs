//! Top-K views over benchmark results.

use crate::types::{BenchmarkEntry, BenchmarkResults};

/// Derived rankings; rank is position + 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rankings {
    /// Highest hashrate first.
    pub top_hashrate: Vec<BenchmarkEntry>,
    /// Lowest J/TH first.
    pub most_efficient: Vec<BenchmarkEntry>,
}

/// Rank `results` by hashrate and by efficiency, keeping `k` of each.
///
/// Sorting is stable, so equal values keep discovery order.
pub fn rank(results: &BenchmarkResults, k: usize) -> Rankings {
    let mut by_hashrate = results.entries().to_vec();
    by_hashrate.sort_by(|a, b| {
        b.measurement
            .average_hashrate_ghs
            .total_cmp(&a.measurement.average_hashrate_ghs)
    });
    by_hashrate.truncate(k);

    let mut by_efficiency = results.entries().to_vec();
    by_efficiency.sort_by(|a, b| {
        a.measurement
            .efficiency_jth
            .total_cmp(&b.measurement.efficiency_jth)
    });
    by_efficiency.truncate(k);

    Rankings {
        top_hashrate: by_hashrate,
        most_efficient: by_efficiency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::measurement;
    use crate::types::SweepPoint;

    fn points(entries: &[BenchmarkEntry]) -> Vec<SweepPoint> {
        entries.iter().map(|e| e.point).collect()
    }

    #[test]
    fn second_entry_wins_both_rankings() {
        let mut results = BenchmarkResults::new();
        results.push(SweepPoint::new(1150, 500), measurement(550.0, 0.1));
        results.push(SweepPoint::new(1200, 525), measurement(600.0, 0.09));

        let rankings = rank(&results, 1);

        assert_eq!(points(&rankings.top_hashrate), vec![SweepPoint::new(1200, 525)]);
        assert_eq!(points(&rankings.most_efficient), vec![SweepPoint::new(1200, 525)]);
    }

    #[test]
    fn rankings_are_independent() {
        let mut results = BenchmarkResults::new();
        results.push(SweepPoint::new(1150, 500), measurement(500.0, 15.0));
        results.push(SweepPoint::new(1150, 525), measurement(525.0, 16.0));
        results.push(SweepPoint::new(1170, 550), measurement(545.0, 17.5));

        let rankings = rank(&results, 5);

        assert_eq!(
            points(&rankings.top_hashrate),
            vec![
                SweepPoint::new(1170, 550),
                SweepPoint::new(1150, 525),
                SweepPoint::new(1150, 500)
            ]
        );
        assert_eq!(
            points(&rankings.most_efficient),
            vec![
                SweepPoint::new(1150, 500),
                SweepPoint::new(1150, 525),
                SweepPoint::new(1170, 550)
            ]
        );
    }

    #[test]
    fn ties_keep_discovery_order() {
        let mut results = BenchmarkResults::new();
        results.push(SweepPoint::new(1150, 500), measurement(600.0, 15.0));
        results.push(SweepPoint::new(1170, 500), measurement(600.0, 15.0));
        results.push(SweepPoint::new(1190, 500), measurement(600.0, 15.0));

        let rankings = rank(&results, 2);

        let expected = vec![SweepPoint::new(1150, 500), SweepPoint::new(1170, 500)];
        assert_eq!(points(&rankings.top_hashrate), expected);
        assert_eq!(points(&rankings.most_efficient), expected);
    }

    #[test]
    fn truncates_to_k() {
        let mut results = BenchmarkResults::new();
        for i in 0..8 {
            results.push(
                SweepPoint::new(1150, 500 + 25 * i),
                measurement(500.0 + i as f64, 15.0),
            );
        }

        let rankings = rank(&results, 5);

        assert_eq!(rankings.top_hashrate.len(), 5);
        assert_eq!(rankings.most_efficient.len(), 5);
        assert_eq!(rankings.top_hashrate[0].point, SweepPoint::new(1150, 675));
        // Source is untouched
        assert_eq!(results.entries()[0].point, SweepPoint::new(1150, 500));
    }

    #[test]
    fn empty_results_give_empty_rankings() {
        assert_eq!(rank(&BenchmarkResults::new(), 5), Rankings::default());
    }
}
