use crate::models::AdMetricsWithImages;
use std::cmp::Ordering;

/// Default fraction of ads treated as top or bottom performers
pub const DEFAULT_PERCENTILE: f64 = 0.2;

/// Default cap on the ranked subset
pub const DEFAULT_LIMIT: usize = 30;

/// Highest-revenue ads, best first
///
/// Takes `floor(percentile * ads.len())` ads and then at most `limit` of
/// them. Ads with equal revenue keep their input order.
pub fn top_performing_by_revenue(
    ads: &[AdMetricsWithImages],
    percentile: f64,
    limit: usize,
) -> Vec<AdMetricsWithImages> {
    ranked(ads, percentile, limit, |a, b| b.revenue().total_cmp(&a.revenue()))
}

/// Lowest-revenue ads, worst first
pub fn bottom_performing_by_revenue(
    ads: &[AdMetricsWithImages],
    percentile: f64,
    limit: usize,
) -> Vec<AdMetricsWithImages> {
    ranked(ads, percentile, limit, |a, b| a.revenue().total_cmp(&b.revenue()))
}

fn ranked<F>(
    ads: &[AdMetricsWithImages],
    percentile: f64,
    limit: usize,
    compare: F,
) -> Vec<AdMetricsWithImages>
where
    F: Fn(&AdMetricsWithImages, &AdMetricsWithImages) -> Ordering,
{
    let count = subset_size(ads.len(), percentile).min(limit);
    let mut sorted: Vec<&AdMetricsWithImages> = ads.iter().collect();
    // sort_by is stable
    sorted.sort_by(|a, b| compare(a, b));
    sorted.into_iter().take(count).cloned().collect()
}

fn subset_size(total: usize, percentile: f64) -> usize {
    if !percentile.is_finite() || percentile <= 0.0 {
        return 0;
    }
    let size = (percentile * total as f64).floor() as usize;
    size.min(total)
}
