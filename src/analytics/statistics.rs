//! Statistical functions for analytics

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

/// Statistical percentiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Percentiles {
    /// Calculate percentiles from a dataset
    pub fn from_data(mut data: Vec<f64>) -> Self {
        if data.is_empty() {
            return Self {
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
            };
        }

        data.sort_by(|a, b| a.total_cmp(b));

        Self {
            p50: percentile(&data, 50.0),
            p95: percentile(&data, 95.0),
            p99: percentile(&data, 99.0),
        }
    }
}

/// Distribution statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, 0 for a single value
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Distribution {
    /// Calculate distribution from a dataset
    pub fn from_data(data: &[f64]) -> AnalyticsResult<Self> {
        if data.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let count = data.len();
        let mean = mean(data)?;

        let mut sorted = data.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        let std_dev = if count > 1 { sample_std_dev(data)? } else { 0.0 };

        Ok(Self {
            mean,
            median,
            std_dev,
            min: sorted[0],
            max: sorted[count - 1],
            count,
        })
    }
}

/// Arithmetic mean
pub fn mean(data: &[f64]) -> AnalyticsResult<f64> {
    if data.is_empty() {
        return Err(AnalyticsError::EmptyDataset);
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Bessel-corrected (n - 1) standard deviation
pub fn sample_std_dev(data: &[f64]) -> AnalyticsResult<f64> {
    if data.len() < 2 {
        return Err(AnalyticsError::InsufficientSample {
            required: 2,
            available: data.len(),
        });
    }

    if data.iter().all(|x| *x == data[0]) {
        return Ok(0.0);
    }

    let mean = mean(data)?;
    let variance =
        data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    Ok(variance.sqrt())
}

/// Percentile of sorted data by linear interpolation at `p / 100 * (n - 1)`
pub fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

/// Mean and sample standard deviation fitted to a sample, scoring values by distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreModel {
    pub mean: f64,
    pub std_dev: f64,
}

impl ZScoreModel {
    /// Fit to a sample of at least two values with nonzero spread
    pub fn fit(data: &[f64]) -> AnalyticsResult<Self> {
        let std_dev = sample_std_dev(data)?;
        if std_dev == 0.0 || !std_dev.is_finite() {
            return Err(AnalyticsError::ZeroVariance);
        }

        Ok(Self {
            mean: mean(data)?,
            std_dev,
        })
    }

    /// Absolute z-score of a value
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean).abs() / self.std_dev
    }
}
