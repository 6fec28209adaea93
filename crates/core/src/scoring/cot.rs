use crate::domain::currency::Currency;
use crate::domain::positioning::{
    CotIntensity, CotMomentum, CotPositioning, CotStatus, CotWeek, FlowDirection,
};

/// Weeks the index range and the delta quartiles are taken over.
pub const LOOKBACK_WEEKS: usize = 52;

/// Weekly changes averaged for the momentum baseline.
pub const MOMENTUM_MA_WEEKS: usize = 4;

/// Fewer weeks than this and no positioning is derived.
pub const MIN_WEEKS: usize = 5;

fn last_n(values: &[i64], n: usize) -> &[i64] {
    &values[values.len().saturating_sub(n)..]
}

/// Latest net position inside its 52-week range, 0..=100 with one decimal. A flat or
/// too-short history reads as 50.
pub fn cot_index(nets: &[i64]) -> f64 {
    let Some(&current) = nets.last() else {
        return 50.0;
    };
    if nets.len() < 2 {
        return 50.0;
    }
    let window = last_n(nets, LOOKBACK_WEEKS);
    let (min, max) = min_max(window);
    if max == min {
        return 50.0;
    }
    let index = (current - min) as f64 / (max - min) as f64 * 100.0;
    (index * 10.0).round() / 10.0
}

fn min_max(values: &[i64]) -> (i64, i64) {
    values
        .iter()
        .fold((i64::MAX, i64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

/// Linear-interpolated percentile, `p` in 0..=100.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

pub fn momentum(nets: &[i64]) -> CotMomentum {
    if nets.len() < MOMENTUM_MA_WEEKS + 2 {
        return CotMomentum::insufficient();
    }
    let deltas: Vec<f64> = nets.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let Some((&current, before)) = deltas.split_last() else {
        return CotMomentum::insufficient();
    };
    let baseline = &before[before.len().saturating_sub(MOMENTUM_MA_WEEKS)..];
    let ma4 = baseline.iter().sum::<f64>() / baseline.len().max(1) as f64;

    let window = &deltas[deltas.len().saturating_sub(LOOKBACK_WEEKS)..];
    CotMomentum {
        status: CotStatus::Ok,
        delta_current: current as i64,
        ma4_delta: ma4 as i64,
        deviation: (current - ma4) as i64,
        percentile_25: percentile(window, 25.0) as i64,
        percentile_75: percentile(window, 75.0) as i64,
    }
}

/// -2..=+2 from which side speculators are on, how stretched they are, and where this week's
/// flow is heading.
pub fn cot_score(net: i64, intensity: CotIntensity, direction: FlowDirection) -> i32 {
    use CotIntensity::*;
    use FlowDirection::*;

    if net > 0 {
        match (intensity, direction) {
            (High, Positive) => 2,
            (High, Stable) => 1,
            (High, Negative) => 0,
            (Medium | Low, Positive) => 1,
            (Medium | Low, Stable) => 0,
            (Medium | Low, Negative) => -1,
        }
    } else {
        match (intensity, direction) {
            (Low, Negative) => -2,
            (Low, Stable) => -1,
            (Low, Positive) => 0,
            (Medium | High, Negative) => -1,
            (Medium | High, Stable) => 0,
            (Medium | High, Positive) => 1,
        }
    }
}

/// `weeks` oldest first.
pub fn positioning(currency: Currency, weeks: &[CotWeek]) -> CotPositioning {
    if weeks.len() < MIN_WEEKS {
        return CotPositioning {
            currency,
            status: CotStatus::InsufficientData,
            weeks_available: weeks.len(),
            report_date: None,
            net_position: 0,
            net_position_prev: None,
            cot_index: 50.0,
            min_52w: None,
            max_52w: None,
            momentum: CotMomentum::insufficient(),
            intensity: CotIntensity::from_index(50.0),
            direction: FlowDirection::Stable,
            score: 0,
        };
    }

    let nets: Vec<i64> = weeks.iter().map(CotWeek::net).collect();
    let current = nets[nets.len() - 1];
    let index = cot_index(&nets);
    let momentum = momentum(&nets);
    let intensity = CotIntensity::from_index(index);
    let direction = momentum.direction();
    let (min, max) = min_max(last_n(&nets, LOOKBACK_WEEKS));

    CotPositioning {
        currency,
        status: CotStatus::Ok,
        weeks_available: weeks.len(),
        report_date: weeks.last().map(|w| w.report_date.clone()),
        net_position: current,
        net_position_prev: nets.len().checked_sub(2).map(|i| nets[i]),
        cot_index: index,
        min_52w: Some(min),
        max_52w: Some(max),
        momentum,
        intensity,
        direction,
        score: cot_score(current, intensity, direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weeks(nets: &[i64]) -> Vec<CotWeek> {
        nets.iter()
            .enumerate()
            .map(|(i, n)| CotWeek {
                report_date: format!("2025-{:02}-01", i + 1),
                noncomm_long: 100_000 + n,
                noncomm_short: 100_000,
                open_interest: None,
            })
            .collect()
    }

    #[test]
    fn index_sits_inside_the_range() {
        assert_eq!(cot_index(&[10, 20, 30]), 100.0);
        assert_eq!(cot_index(&[10, 30, 20]), 50.0);
        assert_eq!(cot_index(&[0, 30, 10]), 33.3);
        assert_eq!(cot_index(&[5]), 50.0);
        assert_eq!(cot_index(&[7, 7, 7]), 50.0);
    }

    #[test]
    fn index_range_only_covers_the_last_52_weeks() {
        let mut nets = vec![1_000_000];
        nets.extend((0..52).map(|i| i * 10));
        // The old spike is out of the window: the latest value is the window high.
        assert_eq!(cot_index(&nets), 100.0);
    }

    #[test]
    fn percentile_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 25.0), 1.75);
        assert_eq!(percentile(&[4.0, 3.0, 2.0, 1.0], 75.0), 3.25);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn momentum_needs_six_weeks() {
        assert_eq!(momentum(&[1, 2, 3, 4, 5]).status, CotStatus::InsufficientData);

        let m = momentum(&[0, 10, 20, 30, 40, 50, 150]);
        assert_eq!(m.status, CotStatus::Ok);
        assert_eq!(m.delta_current, 100);
        assert_eq!(m.ma4_delta, 10);
        assert_eq!(m.deviation, 90);
        assert_eq!(m.percentile_75, 10);
        assert_eq!(m.direction(), FlowDirection::Positive);
    }

    #[test]
    fn score_table() {
        use CotIntensity::*;
        use FlowDirection::*;

        assert_eq!(cot_score(1, High, Positive), 2);
        assert_eq!(cot_score(1, High, Stable), 1);
        assert_eq!(cot_score(1, High, Negative), 0);
        assert_eq!(cot_score(1, Medium, Negative), -1);
        assert_eq!(cot_score(1, Low, Positive), 1);

        assert_eq!(cot_score(-1, Low, Negative), -2);
        assert_eq!(cot_score(-1, Low, Stable), -1);
        assert_eq!(cot_score(-1, Low, Positive), 0);
        assert_eq!(cot_score(-1, High, Positive), 1);
        // Flat net counts as the short side.
        assert_eq!(cot_score(0, Medium, Stable), 0);
        assert_eq!(cot_score(0, Low, Negative), -2);
    }

    #[test]
    fn accelerating_longs_score_plus_two() {
        let p = positioning(Currency::Eur, &weeks(&[0, 10, 20, 30, 40, 50, 150]));
        assert_eq!(p.status, CotStatus::Ok);
        assert_eq!(p.net_position, 150);
        assert_eq!(p.net_position_prev, Some(50));
        assert_eq!(p.cot_index, 100.0);
        assert_eq!((p.min_52w, p.max_52w), (Some(0), Some(150)));
        assert_eq!(p.report_date.as_deref(), Some("2025-07-01"));
        assert_eq!(p.intensity, CotIntensity::High);
        assert_eq!(p.score, 2);
    }

    #[test]
    fn accelerating_shorts_score_minus_two() {
        let p = positioning(Currency::Jpy, &weeks(&[-10, -20, -30, -40, -50, -60, -200]));
        assert_eq!(p.cot_index, 0.0);
        assert_eq!(p.direction, FlowDirection::Negative);
        assert_eq!(p.score, -2);
    }

    #[test]
    fn short_history_is_insufficient() {
        let p = positioning(Currency::Cad, &weeks(&[1, 2, 3, 4]));
        assert_eq!(p.status, CotStatus::InsufficientData);
        assert_eq!(p.weeks_available, 4);
        assert_eq!(p.cot_index, 50.0);
        assert_eq!(p.score, 0);

        // Five weeks give an index but no momentum yet.
        let p = positioning(Currency::Cad, &weeks(&[1, 2, 3, 4, 5]));
        assert_eq!(p.status, CotStatus::Ok);
        assert_eq!(p.momentum.status, CotStatus::InsufficientData);
        assert_eq!(p.direction, FlowDirection::Stable);
        assert_eq!(p.score, 1);
    }
}
