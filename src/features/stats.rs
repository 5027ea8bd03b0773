/// Summary statistics over a sequence of samples.
///
/// An empty sequence summarizes to all zeros so that flows with a single
/// packet still produce a full feature vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatSummary {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    /// Population standard deviation.
    pub std: f64,
    pub total: f64,
}

impl StatSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let n = samples.len() as f64;
        let total: f64 = samples.iter().sum();
        let mean = total / n;
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));

        Self {
            mean,
            max,
            min,
            std: population_variance(samples, mean).sqrt(),
            total,
        }
    }
}

/// Population variance (divides by n). Zero for an empty slice.
pub fn variance(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    population_variance(samples, mean)
}

fn population_variance(samples: &[f64], mean: f64) -> f64 {
    samples
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_is_all_zero() {
        let s = StatSummary::from_samples(&[]);
        assert_eq!(s, StatSummary { mean: 0.0, max: 0.0, min: 0.0, std: 0.0, total: 0.0 });
        assert_eq!(variance(&[]), 0.0);
    }

    #[test]
    fn uses_population_std() {
        let s = StatSummary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.std, 2.0);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert_eq!(s.total, 40.0);
    }

    #[test]
    fn single_sample() {
        let s = StatSummary::from_samples(&[3.5]);
        assert_eq!(s.mean, 3.5);
        assert_eq!(s.std, 0.0);
        assert_eq!(s.min, 3.5);
        assert_eq!(s.max, 3.5);
    }
}
