//! Utility functions for the crate.

use core::ops::Range;

use distances::Number;
use ftlog::{
    appender::{FileAppender, Period},
    LevelFilter, LoggerGuard,
};

use crate::HubnessError;

/// Return the index and value of the maximum value in the given slice of values.
///
/// NAN values are ordered as smaller than all other values. Among equal
/// maxima the first one wins.
///
/// This will return `None` if the given slice is empty.
pub fn arg_max<T: PartialOrd + Copy>(values: &[T]) -> Option<(usize, T)> {
    values.iter().copied().enumerate().fold(None, |best, (i, v)| match best {
        Some((_, b)) if !(v > b || (is_nan(b) && !is_nan(v))) => best,
        _ => Some((i, v)),
    })
}

/// Whether a value is incomparable with itself.
fn is_nan<T: PartialOrd>(x: T) -> bool {
    x.partial_cmp(&x).is_none()
}

/// Return the ratio of two counts as an `f64`.
#[must_use]
pub fn ratio<T: Number, U: Number>(a: T, b: U) -> f64 {
    a.as_f64() / b.as_f64()
}

/// Calculate the mean and standard deviation of the given values.
///
/// Uses a single pass over the values. The standard deviation is the
/// population standard deviation. Both are zero for an empty slice.
pub fn mean_std<T: Number>(values: &[T]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len().as_f64();
    let (sum, sum_squares) = values
        .iter()
        .map(|&x| x.as_f64())
        .fold((0.0, 0.0), |(sum, sum_squares), x| (sum + x, x.mul_add(x, sum_squares)));

    let mean = sum / n;
    let variance = (sum_squares / n - mean * mean).max(0.0);

    (mean, variance.sqrt())
}

/// Calculate the standardized third and fourth moments (skewness and excess
/// kurtosis) of the given values.
///
/// Both are zero when the values have no spread.
pub fn skewness_kurtosis<T: Number>(values: &[T]) -> (f64, f64) {
    let (mean, std) = mean_std(values);
    if std <= 0.0 {
        return (0.0, 0.0);
    }
    let n = values.len().as_f64();
    let (m3, m4) = values
        .iter()
        .map(|&x| (x.as_f64() - mean) / std)
        .fold((0.0, 0.0), |(m3, m4), z| (m3 + z.powi(3), m4 + z.powi(4)));
    (m3 / n, m4 / n - 3.0)
}

/// The logistic function `1 / (1 + e^-x)`.
#[must_use]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Shannon entropy, in bits, of a histogram of counts.
///
/// Empty bins are skipped; an empty histogram has zero entropy.
#[must_use]
pub fn entropy_of_counts(counts: &[usize]) -> f64 {
    let total = counts.iter().sum::<usize>();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| ratio(c, total))
        .map(|p| -p * p.log2())
        .sum()
}

/// Splits `0..n` into at most `num_parts` contiguous ranges of nearly equal
/// length, in order.
#[must_use]
pub fn partitions(n: usize, num_parts: usize) -> Vec<Range<usize>> {
    if n == 0 || num_parts == 0 {
        return Vec::new();
    }
    let size = n.div_ceil(num_parts);
    (0..n).step_by(size).map(|start| start..(start + size).min(n)).collect()
}

/// Builds a thread pool with exactly `num_threads` workers.
///
/// # Errors
///
/// * If `num_threads` is zero.
/// * If the pool cannot be built.
pub fn thread_pool(num_threads: usize) -> Result<rayon::ThreadPool, HubnessError> {
    if num_threads == 0 {
        return Err(HubnessError::config("The number of threads must be positive."));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| HubnessError::config(format!("Could not build a pool of {num_threads} threads: {e}")))
}

/// Installs an `ftlog` logger that writes every message at or above `level`
/// to `./logs/<file_name>.log`, rotated daily.
///
/// The library only logs; binaries, tests and benches call this once to see
/// the messages. Returns the guard that flushes the logger when dropped and
/// the path of the log file.
///
/// # Errors
///
/// - If the logs directory could not be located or created.
/// - If a logger has already been installed.
pub fn configure_logger(file_name: &str, level: LevelFilter) -> Result<(LoggerGuard, std::path::PathBuf), String> {
    let logs_dir = std::path::PathBuf::from(".")
        .canonicalize()
        .map_err(|e| e.to_string())?
        .join("logs");
    std::fs::create_dir_all(&logs_dir).map_err(|e| format!("Could not create {logs_dir:?}: {e}"))?;
    let log_path = logs_dir.join(format!("{file_name}.log"));

    let guard = ftlog::Builder::new()
        .max_log_level(level)
        .root(FileAppender::builder().path(&log_path).rotate(Period::Day).build())
        .try_init()
        .map_err(|e| format!("Could not install the logger: {e}"))?;

    Ok((guard, log_path))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_arg_max() {
        assert_eq!(arg_max::<f32>(&[]), None);
        assert_eq!(arg_max(&[1, 5, 3, 5]), Some((1, 5)));
        assert_eq!(arg_max(&[f64::NAN, 2.0, 1.0]), Some((1, 2.0)));
    }

    #[test]
    fn test_mean_std() {
        let data = [2_u32, 4, 4, 4, 5, 5, 7, 9];
        let (mean, std) = mean_std(&data);
        assert!(float_cmp::approx_eq!(f64, mean, 5.0, ulps = 2));
        assert!(float_cmp::approx_eq!(f64, std, 2.0, epsilon = 1e-12));

        assert_eq!(mean_std::<f32>(&[]), (0.0, 0.0));
        assert_eq!(mean_std(&[3_usize]), (3.0, 0.0));
    }

    #[test]
    fn test_moments() {
        let (skew, kurt) = skewness_kurtosis(&[1_usize, 1, 1, 1]);
        assert_eq!((skew, kurt), (0.0, 0.0));

        // a single large value skews to the right
        let (skew, _) = skewness_kurtosis(&[0_usize, 0, 0, 0, 0, 0, 0, 10]);
        assert!(skew > 2.0);

        let (skew, _) = skewness_kurtosis(&[1_i32, 2, 3, 4, 5]);
        assert!(skew.abs() < 1e-12);
    }

    #[test_case(&[4], 0.0 ; "single bin")]
    #[test_case(&[2, 2], 1.0 ; "two equal bins")]
    #[test_case(&[1, 1, 1, 1], 2.0 ; "four equal bins")]
    #[test_case(&[0, 3, 0, 3], 1.0 ; "empty bins skipped")]
    #[test_case(&[], 0.0 ; "empty")]
    fn test_entropy(counts: &[usize], expected: f64) {
        assert!(float_cmp::approx_eq!(f64, entropy_of_counts(counts), expected, ulps = 4));
    }

    #[test]
    fn test_logistic() {
        assert!(float_cmp::approx_eq!(f64, logistic(0.0), 0.5, ulps = 2));
        assert!(logistic(10.0) > 0.99);
        assert!(logistic(-10.0) < 0.01);
    }

    #[test_case(10, 3, &[0..4, 4..8, 8..10] ; "uneven")]
    #[test_case(4, 4, &[0..1, 1..2, 2..3, 3..4] ; "one each")]
    #[test_case(2, 8, &[0..1, 1..2] ; "more parts than items")]
    #[test_case(0, 3, &[] ; "nothing")]
    fn test_partitions(n: usize, parts: usize, expected: &[Range<usize>]) {
        assert_eq!(partitions(n, parts), expected);
    }
}
