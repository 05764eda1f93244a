//! Per-profile hedge ratio coefficients.
//!
//! Each dynamic profile maps a [`MarketRegime`] to a base ratio. Volatility
//! aware profiles add a bounded boost proportional to realized volatility.
//! Every ratio is capped by `max_ratio`, which stays below a full hedge.

use crate::errors::{CoreError, CoreResult};
use crate::types::{DynamicProfile, MarketRegime};

#[cfg(feature = "client")]
use serde::{Deserialize, Serialize};

/// Hedge ratio shape for one profile
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
pub struct ProfileCoefficients {
    pub neutral_ratio: f64,
    pub downtrend_ratio: f64,
    pub bounce_ratio: f64,
    /// Ratio added per unit of realized volatility
    pub vol_sensitivity: f64,
    /// Upper bound on the volatility boost
    pub max_vol_boost: f64,
    /// Ceiling on the final ratio; below 1.0
    pub max_ratio: f64,
}

impl ProfileCoefficients {
    pub fn new(neutral_ratio: f64, downtrend_ratio: f64, bounce_ratio: f64) -> Self {
        Self {
            neutral_ratio,
            downtrend_ratio,
            bounce_ratio,
            vol_sensitivity: 0.0,
            max_vol_boost: 0.15,
            max_ratio: 0.95,
        }
    }

    pub fn with_vol_sensitivity(mut self, vol_sensitivity: f64) -> Self {
        self.vol_sensitivity = vol_sensitivity;
        self
    }

    pub fn base_ratio(&self, regime: MarketRegime) -> f64 {
        match regime {
            MarketRegime::Neutral => self.neutral_ratio,
            MarketRegime::Downtrend => self.downtrend_ratio,
            MarketRegime::Bounce => self.bounce_ratio,
        }
    }

    /// Base ratio plus the capped volatility boost, clamped to [0, max_ratio]
    pub fn ratio(&self, regime: MarketRegime, realized_vol: f64) -> f64 {
        let boost = if realized_vol.is_finite() && realized_vol > 0.0 {
            (self.vol_sensitivity * realized_vol).min(self.max_vol_boost)
        } else {
            0.0
        };
        (self.base_ratio(regime) + boost).clamp(0.0, self.max_ratio)
    }

    pub fn validate(&self, profile: DynamicProfile) -> CoreResult<()> {
        let field = |name: &str| format!("{:?}.{}", profile, name);

        if !(self.max_ratio > 0.0 && self.max_ratio < 1.0) {
            return Err(CoreError::invalid_config(&field("max_ratio"), self.max_ratio, "within (0, 1)"));
        }

        for (name, value) in [
            ("neutral_ratio", self.neutral_ratio),
            ("downtrend_ratio", self.downtrend_ratio),
            ("bounce_ratio", self.bounce_ratio),
        ] {
            if !(0.0..=self.max_ratio).contains(&value) {
                return Err(CoreError::invalid_config(&field(name), value, "within [0, max_ratio]"));
            }
        }

        for (name, value) in [
            ("vol_sensitivity", self.vol_sensitivity),
            ("max_vol_boost", self.max_vol_boost),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(CoreError::invalid_config(&field(name), value, "non-negative"));
            }
        }

        Ok(())
    }
}

/// Coefficients for every dynamic profile
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "client", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "client", serde(default))]
pub struct ProfileTable {
    pub balanced: ProfileCoefficients,
    pub whisper_dynamic: ProfileCoefficients,
    pub aggressive_upside: ProfileCoefficients,
    pub aggressive_downside: ProfileCoefficients,
    pub volatility_adaptive: ProfileCoefficients,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            balanced: ProfileCoefficients::new(0.50, 0.75, 0.35),
            whisper_dynamic: ProfileCoefficients::new(0.40, 0.70, 0.25).with_vol_sensitivity(2.0),
            aggressive_upside: ProfileCoefficients::new(0.30, 0.60, 0.15),
            aggressive_downside: ProfileCoefficients::new(0.60, 0.85, 0.45),
            volatility_adaptive: ProfileCoefficients::new(0.45, 0.80, 0.30).with_vol_sensitivity(4.0),
        }
    }
}

impl ProfileTable {
    pub fn get(&self, profile: DynamicProfile) -> &ProfileCoefficients {
        match profile {
            DynamicProfile::Balanced => &self.balanced,
            DynamicProfile::WhisperDynamic => &self.whisper_dynamic,
            DynamicProfile::AggressiveUpside => &self.aggressive_upside,
            DynamicProfile::AggressiveDownside => &self.aggressive_downside,
            DynamicProfile::VolatilityAdaptive => &self.volatility_adaptive,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        for profile in DynamicProfile::ALL {
            self.get(profile).validate(profile)?;
        }
        Ok(())
    }
}
