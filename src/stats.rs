/// Running mean and variance (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_two_pass_estimates() {
        let vals = [105.0, 110.25, 99.75, 120.0, 87.5];
        let mut acc = Accumulator::new();
        for val in vals {
            acc.add(val);
        }

        let mean = vals.iter().sum::<f64>() / vals.len() as f64;
        let var = vals.iter().map(|val| (val - mean).powi(2)).sum::<f64>() / 4.0;

        let report = acc.report();
        assert_eq!(report.n_vals, 5);
        assert!((report.mean - mean).abs() < 1e-9);
        assert!((report.std_dev - var.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn too_few_values_give_nan() {
        let mut acc = Accumulator::new();
        assert!(acc.report().mean.is_nan());
        acc.add(3.0);
        assert_eq!(acc.report().mean, 3.0);
        assert!(acc.report().std_dev.is_nan());
    }
}
