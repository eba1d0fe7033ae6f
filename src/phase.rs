use log::debug;

use crate::{
    config::{PhaseClock, SaleConfig},
    ledger::SaleLedger,
    storage::{keys, LedgerStore},
};

/// The pricing-and-limit regime the sale is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseId {
    Presale,
    PublicDay1,
    PublicDay2,
    PublicOpen,
}

impl PhaseId {
    /// Storage prefix of the per-address contribution counter for this
    /// phase. The open phase has no per-address cap and tracks nothing.
    pub fn key_prefix(&self) -> Option<&'static [u8]> {
        match self {
            PhaseId::Presale => Some(b"r1"),
            PhaseId::PublicDay1 => Some(b"r2"),
            PhaseId::PublicDay2 => Some(b"r3"),
            PhaseId::PublicOpen => None,
        }
    }
}

/// Parameters the admission calculation needs for the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseParams {
    pub phase: PhaseId,
    /// Token raw units per whole native unit.
    pub tokens_per_native: u64,
    /// Per-address cap in raw native units; `None` = uncapped.
    pub individual_limit: Option<u64>,
    /// Minimum contribution in raw native units (presale only).
    pub minimum: Option<u64>,
    /// Circulation ceiling applying to this phase, in token raw units.
    pub ceiling: u64,
}

/// Outcome of phase resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Active(PhaseParams),
    /// Presale is over (or closed to self-service) and the public sale has
    /// not started.
    NotStarted,
    Ended,
}

/// Determine the active sale phase from the persisted milestone markers and
/// the current chain point.
///
/// Under the height clock the owner-set presale-end and public-sale-start
/// markers drive the schedule; under the timestamp clock the fixed
/// per-deployment thresholds do, as in early contract generations.
pub fn resolve<S: LedgerStore>(
    config: &SaleConfig,
    ledger: &SaleLedger<S>,
    height: u64,
    timestamp: u64,
) -> Resolution {
    match config.clock {
        PhaseClock::Heights {
            blocks_per_day,
            total_sale_blocks,
        } => {
            if ledger.get_marker(keys::PRESALE_END).is_none() {
                return presale(config);
            }
            let start = match ledger.get_marker(keys::PUBLIC_SALE_START) {
                Some(start) => start,
                None => {
                    debug!("presale over, main sale not started");
                    return Resolution::NotStarted;
                }
            };
            let elapsed = height.saturating_sub(start);
            if elapsed > total_sale_blocks {
                Resolution::Ended
            } else if elapsed > 2 * blocks_per_day {
                Resolution::Active(open(config))
            } else if elapsed > blocks_per_day {
                Resolution::Active(day2(config))
            } else {
                Resolution::Active(day1(config))
            }
        }
        PhaseClock::Timestamps {
            presale_end,
            day1_start,
            day2_start,
            day2_end,
            sale_end,
        } => {
            if timestamp > sale_end {
                Resolution::Ended
            } else if timestamp > day2_end {
                Resolution::Active(open(config))
            } else if timestamp >= day2_start {
                Resolution::Active(day2(config))
            } else if timestamp >= day1_start {
                Resolution::Active(day1(config))
            } else if timestamp > presale_end {
                debug!("presale over, main sale not started");
                Resolution::NotStarted
            } else {
                presale(config)
            }
        }
    }
}

fn presale(config: &SaleConfig) -> Resolution {
    if !config.presale_self_service {
        debug!("presale contributions are distributed manually");
        return Resolution::NotStarted;
    }
    Resolution::Active(PhaseParams {
        phase: PhaseId::Presale,
        tokens_per_native: config.presale.tokens_per_native,
        individual_limit: config.presale.individual_limit,
        minimum: Some(config.presale.minimum),
        ceiling: config.presale.ceiling,
    })
}

fn day1(config: &SaleConfig) -> PhaseParams {
    PhaseParams {
        phase: PhaseId::PublicDay1,
        tokens_per_native: config.day1.tokens_per_native,
        individual_limit: config.day1.individual_limit,
        minimum: None,
        ceiling: config.sale_ceiling,
    }
}

fn day2(config: &SaleConfig) -> PhaseParams {
    PhaseParams {
        phase: PhaseId::PublicDay2,
        tokens_per_native: config.day2.tokens_per_native,
        individual_limit: config.day2.individual_limit,
        minimum: None,
        ceiling: config.sale_ceiling,
    }
}

fn open(config: &SaleConfig) -> PhaseParams {
    PhaseParams {
        phase: PhaseId::PublicOpen,
        tokens_per_native: config.open_tokens_per_native,
        individual_limit: None,
        minimum: None,
        ceiling: config.sale_ceiling,
    }
}
