use tracing::debug;

use super::numeric::non_negative;
use super::rng::RandomSource;
use super::types::{
    Distribution, DistributionStats, Heatmap, Histogram, HistogramBin, PortfolioMix,
    TRADING_DAYS_PER_YEAR, WindowReturn,
};

/// Longest horizon still rendered as concrete rolling-window paths.
pub const ROLLING_WINDOW_MAX_HORIZON: u32 = 5;
pub const DEFAULT_BUCKETS: usize = 20;
pub const DEFAULT_SIMULATIONS: u32 = 500;

/// Picks rolling-window paths for short horizons and a Gaussian histogram otherwise.
pub fn sample_distribution<R: RandomSource + ?Sized>(
    mix: &PortfolioMix,
    horizon_days: u32,
    rng: &mut R,
) -> Distribution {
    sample_distribution_with(
        mix,
        horizon_days,
        DEFAULT_BUCKETS,
        DEFAULT_SIMULATIONS,
        rng,
    )
}

/// [`sample_distribution`] with explicit histogram sizing. `buckets` and
/// `simulations` are ignored in rolling-window mode.
pub fn sample_distribution_with<R: RandomSource + ?Sized>(
    mix: &PortfolioMix,
    horizon_days: u32,
    buckets: usize,
    simulations: u32,
    rng: &mut R,
) -> Distribution {
    if horizon_days <= ROLLING_WINDOW_MAX_HORIZON {
        Distribution::RollingWindow(generate_heatmap(mix, horizon_days, rng))
    } else {
        Distribution::Histogram(generate_histogram(
            mix.horizon_sigma(horizon_days),
            buckets,
            simulations,
            rng,
        ))
    }
}

/// Simulates one trading year as `252 / horizon_days` non-overlapping windows.
///
/// Every day draws an independent shock per asset; the weighted daily returns
/// are summed across the window and recorded in percent.
pub fn generate_heatmap<R: RandomSource + ?Sized>(
    mix: &PortfolioMix,
    horizon_days: u32,
    rng: &mut R,
) -> Heatmap {
    if horizon_days == 0 {
        debug!("zero horizon, no rolling windows to sample");
        return Heatmap {
            samples: Vec::new(),
            stats: DistributionStats::default(),
        };
    }

    let windows = (TRADING_DAYS_PER_YEAR as u32) / horizon_days;
    let day_scale = TRADING_DAYS_PER_YEAR.sqrt();
    let daily_loadings: Vec<f64> = mix
        .assets
        .iter()
        .map(|a| a.weight_fraction() * a.annual_sigma() / day_scale)
        .collect();

    let mut samples = Vec::with_capacity(windows as usize);
    for window in 1..=windows {
        let mut cumulative = 0.0;
        for _ in 0..horizon_days {
            let daily: f64 = daily_loadings
                .iter()
                .map(|loading| loading * rng.standard_normal())
                .sum();
            cumulative += daily;
        }
        samples.push(WindowReturn {
            window,
            return_pct: cumulative * 100.0,
        });
    }

    let returns: Vec<f64> = samples.iter().map(|s| s.return_pct).collect();
    Heatmap {
        stats: summarize(&returns),
        samples,
    }
}

/// Draws `simulations` returns from `N(0, sigma_horizon)` and bins them.
///
/// Bins are equal-width over the sample range and keyed by their left edge in
/// percent. A zero-width range puts every draw in the first bin.
pub fn generate_histogram<R: RandomSource + ?Sized>(
    sigma_horizon: f64,
    buckets: usize,
    simulations: u32,
    rng: &mut R,
) -> Histogram {
    if buckets == 0 || simulations == 0 {
        debug!(buckets, simulations, "empty histogram requested");
        return Histogram {
            bins: Vec::new(),
            stats: DistributionStats::default(),
        };
    }

    let sigma = non_negative(sigma_horizon);
    let returns: Vec<f64> = (0..simulations)
        .map(|_| rng.standard_normal() * sigma * 100.0)
        .collect();
    let stats = summarize(&returns);

    let width = (stats.max - stats.min) / buckets as f64;
    let mut bins: Vec<HistogramBin> = (0..buckets)
        .map(|i| HistogramBin {
            bucket: stats.min + i as f64 * width,
            count: 0,
        })
        .collect();

    for r in &returns {
        let idx = if width > 0.0 {
            (((r - stats.min) / width).floor() as usize).min(buckets - 1)
        } else {
            0
        };
        bins[idx].count += 1;
    }

    Histogram { bins, stats }
}

fn summarize(values: &[f64]) -> DistributionStats {
    if values.is_empty() {
        return DistributionStats::default();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    DistributionStats {
        min,
        max,
        mean,
        simulations: values.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::SeededRng;
    use crate::core::types::AssetWeight;
    use proptest::prelude::{any, prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    /// Every normal draw is exactly one standard deviation.
    struct UnitShock;

    impl RandomSource for UnitShock {
        fn next_f64(&mut self) -> f64 {
            0.5
        }

        fn standard_normal(&mut self) -> f64 {
            1.0
        }
    }

    fn sample_mix() -> PortfolioMix {
        PortfolioMix::new(vec![
            AssetWeight::named("equity", 60.0, 0.18),
            AssetWeight::named("bonds", 40.0, 0.06),
        ])
    }

    fn std_dev(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
    }

    #[test]
    fn window_count_follows_trading_year() {
        let mix = sample_mix();
        let mut rng = SeededRng::new(1);
        assert_eq!(generate_heatmap(&mix, 1, &mut rng).samples.len(), 252);
        assert_eq!(generate_heatmap(&mix, 3, &mut rng).samples.len(), 84);
        assert_eq!(generate_heatmap(&mix, 5, &mut rng).samples.len(), 50);

        let heatmap = generate_heatmap(&mix, 5, &mut rng);
        assert_eq!(heatmap.samples[0].window, 1);
        assert_eq!(heatmap.samples[49].window, 50);
        assert_eq!(heatmap.stats.simulations, 50);
    }

    #[test]
    fn oracle_unit_shock_window_return_matches_hand_calculation() {
        // Each day: (0.6 * 0.18 + 0.4 * 0.06) / sqrt(252); three days per window.
        let mix = sample_mix();
        let heatmap = generate_heatmap(&mix, 3, &mut UnitShock);
        let expected = 3.0 * (0.6 * 0.18 + 0.4 * 0.06) / 252.0_f64.sqrt() * 100.0;
        for sample in &heatmap.samples {
            assert_approx(sample.return_pct, expected);
        }
        assert_approx(heatmap.stats.min, expected);
        assert_approx(heatmap.stats.max, expected);
        assert_approx(heatmap.stats.mean, expected);
    }

    #[test]
    fn zero_horizon_yields_no_windows() {
        let heatmap = generate_heatmap(&sample_mix(), 0, &mut SeededRng::new(3));
        assert!(heatmap.samples.is_empty());
        assert_eq!(heatmap.stats, DistributionStats::default());
    }

    #[test]
    fn zero_volatility_mix_has_flat_paths() {
        let mix = PortfolioMix::new(vec![AssetWeight::new(100.0, 0.0)]);
        let heatmap = generate_heatmap(&mix, 2, &mut SeededRng::new(9));
        assert!(heatmap.samples.iter().all(|s| s.return_pct == 0.0));
        assert_eq!(heatmap.stats.min, 0.0);
        assert_eq!(heatmap.stats.max, 0.0);
    }

    #[test]
    fn heatmap_spread_tracks_portfolio_sigma() {
        let mix = PortfolioMix::new(vec![AssetWeight::new(100.0, 0.20)]);
        let heatmap = generate_heatmap(&mix, 1, &mut SeededRng::new(77));
        let returns: Vec<f64> = heatmap.samples.iter().map(|s| s.return_pct).collect();
        let expected = 0.20 / 252.0_f64.sqrt() * 100.0;
        let observed = std_dev(&returns);
        assert!(
            (observed - expected).abs() / expected < 0.25,
            "expected sd near {expected}, got {observed}"
        );
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mix = sample_mix();
        let a = generate_heatmap(&mix, 4, &mut SeededRng::new(123));
        let b = generate_heatmap(&mix, 4, &mut SeededRng::new(123));
        assert_eq!(a, b);

        let h1 = generate_histogram(0.05, 20, 500, &mut SeededRng::new(5));
        let h2 = generate_histogram(0.05, 20, 500, &mut SeededRng::new(5));
        assert_eq!(h1, h2);
    }

    #[test]
    fn histogram_bins_cover_sample_range() {
        let histogram = generate_histogram(0.08, 20, 500, &mut SeededRng::new(11));
        assert_eq!(histogram.bins.len(), 20);
        assert_eq!(histogram.stats.simulations, 500);
        assert_eq!(histogram.bins.iter().map(|b| b.count).sum::<u32>(), 500);
        assert_approx(histogram.bins[0].bucket, histogram.stats.min);
        assert!(histogram.bins.windows(2).all(|w| w[0].bucket < w[1].bucket));
        assert!(histogram.bins[19].bucket < histogram.stats.max);
        // the max sample lands in the last bin rather than overflowing
        assert!(histogram.bins[19].count >= 1);
    }

    #[test]
    fn histogram_moments_match_requested_sigma() {
        let sigma = 0.04;
        let histogram = generate_histogram(sigma, 20, 20_000, &mut SeededRng::new(2));
        assert!(histogram.stats.mean.abs() < 0.1, "mean {}", histogram.stats.mean);
        assert!(histogram.stats.min < -2.0 * sigma * 100.0);
        assert!(histogram.stats.max > 2.0 * sigma * 100.0);
    }

    #[test]
    fn zero_sigma_histogram_puts_everything_in_first_bin() {
        let histogram = generate_histogram(0.0, 10, 50, &mut SeededRng::new(4));
        assert_eq!(histogram.bins.len(), 10);
        assert_eq!(histogram.bins[0].count, 50);
        assert!(histogram.bins[1..].iter().all(|b| b.count == 0));
    }

    #[test]
    fn degenerate_histogram_requests_are_empty() {
        let mut rng = SeededRng::new(4);
        assert!(generate_histogram(0.1, 0, 50, &mut rng).bins.is_empty());
        let no_sims = generate_histogram(0.1, 20, 0, &mut rng);
        assert!(no_sims.bins.is_empty());
        assert_eq!(no_sims.stats.simulations, 0);
    }

    #[test]
    fn mode_switches_after_five_days() {
        let mix = sample_mix();
        let mut rng = SeededRng::new(8);
        match sample_distribution(&mix, 5, &mut rng) {
            Distribution::RollingWindow(h) => assert_eq!(h.samples.len(), 50),
            other => panic!("expected rolling windows, got {other:?}"),
        }
        match sample_distribution(&mix, 6, &mut rng) {
            Distribution::Histogram(h) => {
                assert_eq!(h.bins.len(), DEFAULT_BUCKETS);
                assert_eq!(h.stats.simulations, DEFAULT_SIMULATIONS);
            }
            other => panic!("expected histogram, got {other:?}"),
        }
    }

    #[test]
    fn explicit_sizing_only_applies_to_histograms() {
        let mix = sample_mix();
        let sized = sample_distribution_with(&mix, 30, 7, 90, &mut SeededRng::new(3));
        assert_eq!(sized.stats().simulations, 90);
        match sized {
            Distribution::Histogram(h) => assert_eq!(h.bins.len(), 7),
            other => panic!("expected histogram, got {other:?}"),
        }

        // rolling windows ignore the sizing and match the default sampler
        let windows = sample_distribution_with(&mix, 2, 7, 90, &mut SeededRng::new(3));
        assert_eq!(windows.stats().simulations, 126);
        assert_eq!(windows, sample_distribution(&mix, 2, &mut SeededRng::new(3)));
    }

    #[test]
    fn distribution_serializes_with_mode_tag() {
        let dist = sample_distribution(&sample_mix(), 1, &mut SeededRng::new(1));
        let json = serde_json::to_string(&dist).expect("distribution should serialize");
        assert!(json.contains("\"mode\":\"rolling-window\""));
        assert!(json.contains("\"return\""));
        assert!(json.contains("\"simulations\":252"));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_histogram_counts_sum_to_simulations(
            seed in any::<u64>(),
            sigma_bp in 0u32..5000,
            buckets in 1usize..40,
            simulations in 1u32..800,
        ) {
            let h = generate_histogram(sigma_bp as f64 / 10_000.0, buckets, simulations, &mut SeededRng::new(seed));
            prop_assert_eq!(h.bins.len(), buckets);
            prop_assert_eq!(h.bins.iter().map(|b| b.count).sum::<u32>(), simulations);
            prop_assert!(h.stats.min <= h.stats.mean && h.stats.mean <= h.stats.max);
        }

        #[test]
        fn prop_heatmap_stats_bound_samples(seed in any::<u64>(), horizon in 1u32..6) {
            let h = generate_heatmap(&sample_mix(), horizon, &mut SeededRng::new(seed));
            for s in &h.samples {
                prop_assert!(s.return_pct.is_finite());
                prop_assert!(h.stats.min <= s.return_pct && s.return_pct <= h.stats.max);
            }
        }
    }
}
