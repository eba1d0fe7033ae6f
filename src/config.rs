use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

// 8 decimals for both the native asset and the token
pub const COIN_DECIMALS: u8 = 8;
// 100 000 000 raw units per whole coin
pub const COIN_VALUE: u64 = 10u64.pow(COIN_DECIMALS as u32);

pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("token price must be non-zero")]
    ZeroPrice,
    #[error("presale minimum must be non-zero")]
    ZeroMinimum,
    #[error("presale ceiling {presale} exceeds sale ceiling {sale}")]
    PresaleCeilingAboveSale { presale: u64, sale: u64 },
    #[error("sale ceiling {sale} exceeds total supply {supply}")]
    SaleCeilingAboveSupply { sale: u64, supply: u64 },
    #[error("blocks per day must be non-zero")]
    ZeroBlocksPerDay,
    #[error("sale must span at least two capped days of blocks")]
    SaleShorterThanCappedDays,
    #[error("timestamp thresholds must be strictly increasing")]
    UnorderedTimestamps,
    #[error("vesting schedule has no steps")]
    EmptyVestingSchedule,
    #[error("vesting steps must have increasing elapsed times")]
    UnorderedVestingSteps,
    #[error("vesting percentages must be non-decreasing and at most 100")]
    InvalidVestingPercent,
    #[error("vesting schedule must end at 100%")]
    IncompleteVesting,
}

/// Pricing and limit parameters of the presale round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleConfig {
    /// Token raw units issued per whole native unit.
    pub tokens_per_native: u64,
    /// Per-address contribution cap in raw native units. `None` = uncapped.
    pub individual_limit: Option<u64>,
    /// Minimum contribution in raw native units.
    pub minimum: u64,
    /// Circulation ceiling while the presale runs, in token raw units.
    pub ceiling: u64,
}

/// Pricing and limit parameters of one capped public-sale day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub tokens_per_native: u64,
    pub individual_limit: Option<u64>,
}

/// How phase boundaries are measured.
///
/// Height deltas from owner-set markers are the primary shape; fixed
/// wall-clock thresholds reproduce earlier contract generations for
/// environments without reliable height markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PhaseClock {
    Heights {
        blocks_per_day: u64,
        /// Sale duration in blocks, measured from the public-sale start
        /// marker.
        total_sale_blocks: u64,
    },
    Timestamps {
        presale_end: u64,
        day1_start: u64,
        day2_start: u64,
        day2_end: u64,
        sale_end: u64,
    },
}

/// One step of a vesting schedule: from `elapsed` seconds after the pool
/// start, `cumulative_percent` of the pool maximum may have been distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingStep {
    pub elapsed: u64,
    pub cumulative_percent: u8,
}

/// Time-indexed distribution schedule for a non-public-sale token pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingSchedule {
    /// Unix timestamp (seconds) at which the pool becomes eligible.
    pub start: u64,
    /// Steps ordered by elapsed time; the last one must reach 100%.
    pub steps: Vec<VestingStep>,
    /// Pool maximum in token raw units.
    pub max_total: u64,
}

impl VestingSchedule {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::EmptyVestingSchedule);
        }
        let mut prev_elapsed = None;
        let mut prev_percent = 0u8;
        for step in &self.steps {
            if let Some(prev) = prev_elapsed {
                if step.elapsed <= prev {
                    return Err(ConfigError::UnorderedVestingSteps);
                }
            }
            if step.cumulative_percent < prev_percent || step.cumulative_percent > 100 {
                return Err(ConfigError::InvalidVestingPercent);
            }
            prev_elapsed = Some(step.elapsed);
            prev_percent = step.cumulative_percent;
        }
        if prev_percent != 100 {
            return Err(ConfigError::IncompleteVesting);
        }
        Ok(())
    }
}

/// Full deployment profile of one sale: price table, caps, supply ceilings,
/// phase clock and vesting schedules. Historical contract generations
/// hard-coded these per deployment; here they are data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Identity allowed to run `deploy` and seeded as the first owner.
    pub original_owner: Address,
    /// Total supply ceiling across all pools, in token raw units.
    pub total_supply: u64,
    /// Circulation ceiling shared by all public phases.
    pub sale_ceiling: u64,
    pub presale: PresaleConfig,
    pub day1: TierConfig,
    pub day2: TierConfig,
    /// Price of the uncapped open phase after day 2.
    pub open_tokens_per_native: u64,
    pub clock: PhaseClock,
    /// Whether self-service contributions are accepted during the presale.
    /// Deployments that distribute the presale manually set this to false.
    pub presale_self_service: bool,
    pub team: VestingSchedule,
    pub company: VestingSchedule,
    pub rewards: VestingSchedule,
}

impl SaleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.presale.tokens_per_native == 0
            || self.day1.tokens_per_native == 0
            || self.day2.tokens_per_native == 0
            || self.open_tokens_per_native == 0
        {
            return Err(ConfigError::ZeroPrice);
        }
        if self.presale.minimum == 0 {
            return Err(ConfigError::ZeroMinimum);
        }
        if self.presale.ceiling > self.sale_ceiling {
            return Err(ConfigError::PresaleCeilingAboveSale {
                presale: self.presale.ceiling,
                sale: self.sale_ceiling,
            });
        }
        if self.sale_ceiling > self.total_supply {
            return Err(ConfigError::SaleCeilingAboveSupply {
                sale: self.sale_ceiling,
                supply: self.total_supply,
            });
        }
        match self.clock {
            PhaseClock::Heights {
                blocks_per_day,
                total_sale_blocks,
            } => {
                if blocks_per_day == 0 {
                    return Err(ConfigError::ZeroBlocksPerDay);
                }
                if total_sale_blocks <= 2 * blocks_per_day {
                    return Err(ConfigError::SaleShorterThanCappedDays);
                }
            }
            PhaseClock::Timestamps {
                presale_end,
                day1_start,
                day2_start,
                day2_end,
                sale_end,
            } => {
                if !(presale_end < day1_start
                    && day1_start < day2_start
                    && day2_start < day2_end
                    && day2_end < sale_end)
                {
                    return Err(ConfigError::UnorderedTimestamps);
                }
            }
        }
        self.team.validate()?;
        self.company.validate()?;
        self.rewards.validate()?;
        Ok(())
    }

    /// The profile of the original Narrative mainnet deployment.
    pub fn narrative_mainnet() -> Self {
        // March 22, 2018 @ 5:00:00 pm UTC
        const SALE_END: u64 = 1_521_738_000;
        // January 1, 2019 00:00 UTC
        const TEAM_VEST_START: u64 = 1_546_300_800;

        Self {
            original_owner: Address::new([
                0xde, 0xf3, 0x5a, 0x2d, 0x0c, 0x69, 0xfe, 0xb9, 0xc4, 0xcc, 0x96, 0x70, 0x1f,
                0xd4, 0xdb, 0x8f, 0x5a, 0x04, 0x34, 0x00,
            ]),
            total_supply: 197_500_000 * COIN_VALUE,
            sale_ceiling: 50_000_000 * COIN_VALUE,
            presale: PresaleConfig {
                tokens_per_native: 400 * COIN_VALUE,
                individual_limit: Some(10_000 * COIN_VALUE),
                minimum: 800 * COIN_VALUE,
                ceiling: 25_000_000 * COIN_VALUE,
            },
            day1: TierConfig {
                tokens_per_native: 333 * COIN_VALUE,
                individual_limit: Some(300 * COIN_VALUE),
            },
            day2: TierConfig {
                tokens_per_native: 315 * COIN_VALUE,
                individual_limit: Some(1_000 * COIN_VALUE),
            },
            open_tokens_per_native: 300 * COIN_VALUE,
            clock: PhaseClock::Heights {
                // 15-second blocks
                blocks_per_day: 5_760,
                // 35 days of public sale
                total_sale_blocks: 35 * 5_760,
            },
            presale_self_service: true,
            team: VestingSchedule {
                start: TEAM_VEST_START,
                steps: vec![
                    VestingStep {
                        elapsed: 0,
                        cumulative_percent: 30,
                    },
                    VestingStep {
                        elapsed: SECONDS_PER_YEAR,
                        cumulative_percent: 60,
                    },
                    VestingStep {
                        elapsed: 2 * SECONDS_PER_YEAR,
                        cumulative_percent: 80,
                    },
                    VestingStep {
                        elapsed: 3 * SECONDS_PER_YEAR,
                        cumulative_percent: 100,
                    },
                ],
                max_total: 20_000_000 * COIN_VALUE,
            },
            company: VestingSchedule {
                start: SALE_END,
                steps: vec![
                    VestingStep {
                        elapsed: 0,
                        cumulative_percent: 50,
                    },
                    VestingStep {
                        elapsed: SECONDS_PER_YEAR,
                        cumulative_percent: 75,
                    },
                    VestingStep {
                        elapsed: 2 * SECONDS_PER_YEAR,
                        cumulative_percent: 100,
                    },
                ],
                max_total: 30_000_000 * COIN_VALUE,
            },
            rewards: VestingSchedule {
                start: SALE_END,
                steps: vec![VestingStep {
                    elapsed: 0,
                    cumulative_percent: 100,
                }],
                max_total: 97_500_000 * COIN_VALUE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_profile_is_valid() {
        SaleConfig::narrative_mainnet().validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_price() {
        let mut cfg = SaleConfig::narrative_mainnet();
        cfg.day2.tokens_per_native = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPrice));
    }

    #[test]
    fn test_rejects_presale_ceiling_above_sale() {
        let mut cfg = SaleConfig::narrative_mainnet();
        cfg.presale.ceiling = cfg.sale_ceiling + 1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::PresaleCeilingAboveSale { .. })
        ));
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        let mut cfg = SaleConfig::narrative_mainnet();
        cfg.clock = PhaseClock::Timestamps {
            presale_end: 100,
            day1_start: 90,
            day2_start: 200,
            day2_end: 300,
            sale_end: 400,
        };
        assert_eq!(cfg.validate(), Err(ConfigError::UnorderedTimestamps));
    }

    #[test]
    fn test_rejects_incomplete_vesting() {
        let mut cfg = SaleConfig::narrative_mainnet();
        cfg.team.steps.pop();
        assert_eq!(cfg.validate(), Err(ConfigError::IncompleteVesting));
    }

    #[test]
    fn test_rejects_short_sale_window() {
        let mut cfg = SaleConfig::narrative_mainnet();
        cfg.clock = PhaseClock::Heights {
            blocks_per_day: 100,
            total_sale_blocks: 200,
        };
        assert_eq!(cfg.validate(), Err(ConfigError::SaleShorterThanCappedDays));
    }

    #[test]
    fn test_profile_survives_json() {
        let cfg = SaleConfig::narrative_mainnet();
        let encoded = serde_json::to_string(&cfg).unwrap();
        let decoded: SaleConfig = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, cfg);
    }
}
