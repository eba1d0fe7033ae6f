use log::debug;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::{
    address::Address,
    config::{SaleConfig, VestingSchedule},
    event::Event,
    ledger::SaleLedger,
    storage::{keys, LedgerStore},
};

/// Non-public-sale token pools released on a schedule.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    Team,
    Company,
    Rewards,
}

impl Pool {
    pub fn schedule<'a>(&self, config: &'a SaleConfig) -> &'a VestingSchedule {
        match self {
            Pool::Team => &config.team,
            Pool::Company => &config.company,
            Pool::Rewards => &config.rewards,
        }
    }

    /// Key of the pool's running distribution counter.
    pub fn distributed_key(&self) -> &'static [u8] {
        match self {
            Pool::Team => keys::TEAM_DISTRIBUTED,
            Pool::Company => keys::COMPANY_DISTRIBUTED,
            Pool::Rewards => keys::REWARDS_DISTRIBUTED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VestingError {
    #[error("distribution of zero tokens")]
    ZeroAmount,
    #[error("requested {requested} exceeds available {available} in {pool} pool")]
    ExceedsAvailable {
        pool: Pool,
        requested: u64,
        available: u64,
    },
}

/// Cumulative amount the schedule has released at `now`, in token raw units.
/// Zero before the pool start; the full maximum once the last step has
/// elapsed.
pub fn vested_limit(schedule: &VestingSchedule, now: u64) -> u64 {
    if now < schedule.start {
        return 0;
    }
    let elapsed = now - schedule.start;
    let mut percent = 0u64;
    for step in &schedule.steps {
        if elapsed >= step.elapsed {
            percent = step.cumulative_percent as u64;
        }
    }
    // max_total is bounded well below u64::MAX / 100
    schedule.max_total / 100 * percent + schedule.max_total % 100 * percent / 100
}

/// Tokens still distributable from the pool at `now`, clamped at zero if the
/// counter ever overshoots the currently vested limit.
pub fn available<S: LedgerStore>(
    pool: Pool,
    config: &SaleConfig,
    ledger: &SaleLedger<S>,
    now: u64,
) -> u64 {
    let limit = vested_limit(pool.schedule(config), now);
    let distributed = ledger.get_u64(pool.distributed_key());
    limit.saturating_sub(distributed)
}

/// Mint `amount` pool tokens to `to` and advance the pool counter. The caller
/// has already checked ownership; the schedule check happens here.
pub fn distribute<S: LedgerStore>(
    pool: Pool,
    config: &SaleConfig,
    ledger: &mut SaleLedger<S>,
    events: &mut Vec<Event>,
    from: Address,
    to: Address,
    amount: u64,
    now: u64,
) -> Result<(), VestingError> {
    if amount == 0 {
        return Err(VestingError::ZeroAmount);
    }
    let free = available(pool, config, ledger, now);
    if amount > free {
        debug!(
            "rejecting {} pool distribution of {}: only {} vested",
            pool, amount, free
        );
        return Err(VestingError::ExceedsAvailable {
            pool,
            requested: amount,
            available: free,
        });
    }

    let distributed = ledger.get_u64(pool.distributed_key());
    ledger.put_u64(pool.distributed_key(), distributed + amount);
    ledger.mint(events, from, to, amount);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::COIN_VALUE, storage::MemoryStore};
    use std::str::FromStr;

    const OWNER: Address = Address::new([1u8; 20]);
    const TEAM_MEMBER: Address = Address::new([2u8; 20]);

    #[test]
    fn test_pool_names_roundtrip() {
        assert_eq!(Pool::Team.to_string(), "team");
        assert_eq!(Pool::from_str("rewards"), Ok(Pool::Rewards));
        assert!(Pool::from_str("escrow").is_err());
    }

    #[test]
    fn test_team_schedule_steps() {
        let cfg = SaleConfig::narrative_mainnet();
        let schedule = &cfg.team;
        let max = schedule.max_total;

        assert_eq!(vested_limit(schedule, schedule.start - 1), 0);
        assert_eq!(vested_limit(schedule, schedule.start), max / 100 * 30);
        let year = crate::config::SECONDS_PER_YEAR;
        assert_eq!(
            vested_limit(schedule, schedule.start + year),
            max / 100 * 60
        );
        assert_eq!(
            vested_limit(schedule, schedule.start + 2 * year),
            max / 100 * 80
        );
        assert_eq!(vested_limit(schedule, schedule.start + 3 * year), max);
        assert_eq!(vested_limit(schedule, u64::MAX), max);
    }

    #[test]
    fn test_rewards_fully_vested_at_start() {
        let cfg = SaleConfig::narrative_mainnet();
        assert_eq!(
            vested_limit(&cfg.rewards, cfg.rewards.start),
            cfg.rewards.max_total
        );
    }

    #[test]
    fn test_distribute_within_limit() {
        let cfg = SaleConfig::narrative_mainnet();
        let mut store = MemoryStore::new();
        let mut ledger = SaleLedger::new(&mut store);
        let mut events = Vec::new();
        let now = cfg.team.start;

        let amount = 1_000_000 * COIN_VALUE;
        distribute(
            Pool::Team,
            &cfg,
            &mut ledger,
            &mut events,
            OWNER,
            TEAM_MEMBER,
            amount,
            now,
        )
        .unwrap();

        assert_eq!(ledger.balance_of(&TEAM_MEMBER), amount);
        assert_eq!(ledger.get_u64(keys::TEAM_DISTRIBUTED), amount);
        assert_eq!(ledger.in_circulation(), amount);
        assert_eq!(
            events,
            vec![Event::Transfer {
                from: OWNER,
                to: TEAM_MEMBER,
                amount
            }]
        );
    }

    #[test]
    fn test_distribute_rejects_past_vested_limit() {
        let cfg = SaleConfig::narrative_mainnet();
        let mut store = MemoryStore::new();
        let mut ledger = SaleLedger::new(&mut store);
        let mut events = Vec::new();
        let now = cfg.team.start;
        let limit = vested_limit(&cfg.team, now);

        distribute(
            Pool::Team,
            &cfg,
            &mut ledger,
            &mut events,
            OWNER,
            TEAM_MEMBER,
            limit,
            now,
        )
        .unwrap();

        let result = distribute(
            Pool::Team,
            &cfg,
            &mut ledger,
            &mut events,
            OWNER,
            TEAM_MEMBER,
            1,
            now,
        );
        assert_eq!(
            result,
            Err(VestingError::ExceedsAvailable {
                pool: Pool::Team,
                requested: 1,
                available: 0,
            })
        );
        // counter and events untouched by the rejection
        assert_eq!(ledger.get_u64(keys::TEAM_DISTRIBUTED), limit);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_distribute_rejects_zero() {
        let cfg = SaleConfig::narrative_mainnet();
        let mut store = MemoryStore::new();
        let mut ledger = SaleLedger::new(&mut store);
        let mut events = Vec::new();
        assert_eq!(
            distribute(
                Pool::Rewards,
                &cfg,
                &mut ledger,
                &mut events,
                OWNER,
                TEAM_MEMBER,
                0,
                cfg.rewards.start,
            ),
            Err(VestingError::ZeroAmount)
        );
    }

    #[test]
    fn test_available_unlocks_over_years() {
        let cfg = SaleConfig::narrative_mainnet();
        let mut store = MemoryStore::new();
        let mut ledger = SaleLedger::new(&mut store);
        let mut events = Vec::new();
        let year = crate::config::SECONDS_PER_YEAR;
        let max = cfg.team.max_total;

        // drain the first tranche, then check the next year frees more
        let first = available(Pool::Team, &cfg, &ledger, cfg.team.start);
        distribute(
            Pool::Team,
            &cfg,
            &mut ledger,
            &mut events,
            OWNER,
            TEAM_MEMBER,
            first,
            cfg.team.start,
        )
        .unwrap();
        assert_eq!(available(Pool::Team, &cfg, &ledger, cfg.team.start), 0);
        assert_eq!(
            available(Pool::Team, &cfg, &ledger, cfg.team.start + year),
            max / 100 * 30
        );
    }
}
