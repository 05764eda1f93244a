//! # Price History Window
//!
//! Time-bounded sliding window of price samples. Unlike a fixed-size ring the
//! number of samples varies with sampling frequency: everything older than the
//! lookback is evicted on each append.

use std::collections::VecDeque;

use crate::errors::{CoreError, CoreResult};
use crate::types::{MarketRegime, Timestamp};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Price observation at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PriceSample {
    pub timestamp: Timestamp,
    pub price: f64,
}

/// Ordered price samples bounded by a lookback duration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct PriceWindow {
    samples: VecDeque<PriceSample>,
}

impl PriceWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample and evict everything older than `lookback_secs` before it
    pub fn observe(&mut self, timestamp: Timestamp, price: f64, lookback_secs: f64) -> CoreResult<()> {
        if !price.is_finite() || price <= 0.0 {
            return Err(CoreError::InvalidPrice(price.to_string()));
        }

        if let Some(last) = self.samples.back() {
            if timestamp <= last.timestamp {
                return Err(CoreError::StaleData);
            }
        }

        self.samples.push_back(PriceSample { timestamp, price });
        self.evict(timestamp, lookback_secs);
        Ok(())
    }

    /// Drop samples older than `now - lookback_secs`
    pub fn evict(&mut self, now: Timestamp, lookback_secs: f64) {
        let cutoff = now as f64 - lookback_secs;
        while let Some(front) = self.samples.front() {
            if (front.timestamp as f64) < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn earliest(&self) -> Option<&PriceSample> {
        self.samples.front()
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn samples(&self) -> impl Iterator<Item = &PriceSample> {
        self.samples.iter()
    }

    /// Fractional change from the earliest to the latest sample
    pub fn momentum(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let first = self.earliest()?.price;
        let last = self.latest()?.price;
        Some((last - first) / first)
    }

    /// Fractional change from the earliest sample to the window minimum (<= 0)
    pub fn drawdown(&self) -> Option<f64> {
        let first = self.earliest()?.price;
        let min = self
            .samples
            .iter()
            .map(|s| s.price)
            .fold(f64::INFINITY, f64::min);
        Some((min - first) / first)
    }

    /// Sample standard deviation of log returns between consecutive samples
    pub fn realized_volatility(&self) -> Option<f64> {
        if self.samples.len() < 3 {
            return None;
        }

        let returns: Vec<f64> = self
            .samples
            .iter()
            .zip(self.samples.iter().skip(1))
            .map(|(a, b)| (b.price / a.price).ln())
            .collect();

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(variance.sqrt())
    }

    /// Classify the recent move against the down and bounce thresholds
    ///
    /// A drawdown at or below `down_threshold` is a downtrend unless the latest
    /// price has recovered to at least `bounce_threshold` relative to the start.
    pub fn regime(&self, down_threshold: f64, bounce_threshold: f64) -> MarketRegime {
        let (Some(momentum), Some(drawdown)) = (self.momentum(), self.drawdown()) else {
            return MarketRegime::Neutral;
        };

        if drawdown > down_threshold {
            MarketRegime::Neutral
        } else if momentum >= bounce_threshold {
            MarketRegime::Bounce
        } else {
            MarketRegime::Downtrend
        }
    }
}
