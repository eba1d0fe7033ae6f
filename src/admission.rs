use log::debug;
use thiserror::Error;

use crate::{
    address::Address,
    config::COIN_VALUE,
    phase::{PhaseParams, Resolution},
};

/// Why a contribution was not authorized. Surfaced through the log output
/// only; the dispatch result stays a bare boolean/amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("sale is paused")]
    SalePaused,
    #[error("no native asset attached")]
    NothingAttached,
    #[error("address is not registered for KYC")]
    NotAllowlisted,
    #[error("main sale not started")]
    SaleNotStarted,
    #[error("crowdsale ended")]
    SaleEnded,
    #[error("insufficient presale contribution")]
    BelowMinimum,
    #[error("amount greater than token sale limit")]
    CirculationCeiling,
    #[error("contribution limit exceeded in round")]
    IndividualLimit,
    #[error("token amount overflows")]
    AmountOverflow,
}

/// Snapshot of everything the admission decision depends on. All state is
/// passed in explicitly so the decision is a pure function of its arguments
/// and both triggers reach it the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionContext {
    pub sender: Address,
    /// Attached native-asset amount in raw units.
    pub native_attached: u64,
    pub paused: bool,
    pub allowlisted: bool,
    pub in_circulation: u64,
    /// Running per-address total for the active phase, in raw native units.
    pub prior_phase_contribution: u64,
}

/// The admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Authorized {
        /// Token raw units to issue.
        tokens: u64,
        /// Updated per-address phase counter to persist on commit; `None` in
        /// uncapped phases, which track nothing.
        new_phase_contribution: Option<u64>,
    },
    Rejected(RejectReason),
}

impl Admission {
    pub fn authorized_tokens(&self) -> u64 {
        match self {
            Admission::Authorized { tokens, .. } => *tokens,
            Admission::Rejected(_) => 0,
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, Admission::Authorized { .. })
    }
}

/// Decide whether a contribution is admitted and how many tokens it buys.
///
/// Pure function: identical inputs produce identical decisions whether the
/// caller is the read-only admission trigger or the state-committing
/// execution path. Committing the returned phase counter is the caller's
/// explicit, separate step.
pub fn evaluate(resolution: &Resolution, ctx: &ContributionContext) -> Admission {
    if ctx.paused {
        return reject(ctx, RejectReason::SalePaused);
    }
    if ctx.native_attached == 0 {
        return reject(ctx, RejectReason::NothingAttached);
    }
    if !ctx.allowlisted {
        return reject(ctx, RejectReason::NotAllowlisted);
    }
    let params = match resolution {
        Resolution::Active(params) => params,
        Resolution::NotStarted => return reject(ctx, RejectReason::SaleNotStarted),
        Resolution::Ended => return reject(ctx, RejectReason::SaleEnded),
    };

    if let Some(minimum) = params.minimum {
        if ctx.native_attached < minimum && !headroom_below_minimum(params, ctx, minimum) {
            return reject(ctx, RejectReason::BelowMinimum);
        }
    }

    // Integer arithmetic in the shared 8-decimal fixed point: partial native
    // units buy nothing, the division truncates toward zero.
    let whole_units = ctx.native_attached / COIN_VALUE;
    let tokens = match whole_units.checked_mul(params.tokens_per_native) {
        Some(tokens) => tokens,
        None => return reject(ctx, RejectReason::AmountOverflow),
    };

    match ctx.in_circulation.checked_add(tokens) {
        Some(total) if total <= params.ceiling => {}
        _ => return reject(ctx, RejectReason::CirculationCeiling),
    }

    let limit = match params.individual_limit {
        Some(limit) => limit,
        // no per-address cap: nothing to track
        None => {
            return Admission::Authorized {
                tokens,
                new_phase_contribution: None,
            }
        }
    };

    if ctx.native_attached > limit {
        return reject(ctx, RejectReason::IndividualLimit);
    }
    let new_total = match ctx.prior_phase_contribution.checked_add(ctx.native_attached) {
        Some(total) => total,
        None => return reject(ctx, RejectReason::AmountOverflow),
    };
    if new_total > limit {
        return reject(ctx, RejectReason::IndividualLimit);
    }

    Admission::Authorized {
        tokens,
        new_phase_contribution: Some(new_total),
    }
}

/// The presale minimum is waived once the remaining headroom under the
/// presale ceiling cannot fit a minimum-sized contribution anymore, so the
/// tail of the allocation stays sellable.
fn headroom_below_minimum(params: &PhaseParams, ctx: &ContributionContext, minimum: u64) -> bool {
    let remaining_tokens = params.ceiling.saturating_sub(ctx.in_circulation);
    let remaining_units = remaining_tokens / params.tokens_per_native;
    remaining_units < minimum / COIN_VALUE
}

fn reject(ctx: &ContributionContext, reason: RejectReason) -> Admission {
    debug!(
        "rejecting contribution of {} from {}: {}",
        ctx.native_attached, ctx.sender, reason
    );
    Admission::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseId;
    use proptest::prelude::*;

    const ALICE: Address = Address::new([10u8; 20]);

    fn presale_params() -> PhaseParams {
        // a mainnet-shaped presale: 400 tokens per unit, 800 unit minimum,
        // 10 000 unit cap, 20m token ceiling
        PhaseParams {
            phase: PhaseId::Presale,
            tokens_per_native: 400 * COIN_VALUE,
            individual_limit: Some(10_000 * COIN_VALUE),
            minimum: Some(800 * COIN_VALUE),
            ceiling: 20_000_000 * COIN_VALUE,
        }
    }

    fn ctx(native_attached: u64) -> ContributionContext {
        ContributionContext {
            sender: ALICE,
            native_attached,
            paused: false,
            allowlisted: true,
            in_circulation: 0,
            prior_phase_contribution: 0,
        }
    }

    #[test]
    fn test_presale_scenario_authorized() {
        let resolution = Resolution::Active(presale_params());
        let admission = evaluate(&resolution, &ctx(1_000 * COIN_VALUE));
        assert_eq!(
            admission,
            Admission::Authorized {
                tokens: 400_000 * COIN_VALUE,
                new_phase_contribution: Some(1_000 * COIN_VALUE),
            }
        );
    }

    #[test]
    fn test_cumulative_cap_rejected_whole() {
        let resolution = Resolution::Active(presale_params());
        let mut context = ctx(9_500 * COIN_VALUE);
        context.prior_phase_contribution = 1_000 * COIN_VALUE;
        assert_eq!(
            evaluate(&resolution, &context),
            Admission::Rejected(RejectReason::IndividualLimit)
        );
    }

    #[test]
    fn test_single_contribution_above_cap() {
        let resolution = Resolution::Active(presale_params());
        assert_eq!(
            evaluate(&resolution, &ctx(10_001 * COIN_VALUE)),
            Admission::Rejected(RejectReason::IndividualLimit)
        );
    }

    #[test]
    fn test_not_allowlisted_rejected_before_math() {
        let resolution = Resolution::Active(presale_params());
        let mut context = ctx(1_000 * COIN_VALUE);
        context.allowlisted = false;
        assert_eq!(
            evaluate(&resolution, &context),
            Admission::Rejected(RejectReason::NotAllowlisted)
        );
    }

    #[test]
    fn test_paused_rejected() {
        let resolution = Resolution::Active(presale_params());
        let mut context = ctx(1_000 * COIN_VALUE);
        context.paused = true;
        assert_eq!(
            evaluate(&resolution, &context),
            Admission::Rejected(RejectReason::SalePaused)
        );
    }

    #[test]
    fn test_zero_attached_rejected() {
        let resolution = Resolution::Active(presale_params());
        assert_eq!(
            evaluate(&resolution, &ctx(0)),
            Admission::Rejected(RejectReason::NothingAttached)
        );
    }

    #[test]
    fn test_inactive_phases_rejected() {
        assert_eq!(
            evaluate(&Resolution::NotStarted, &ctx(1_000 * COIN_VALUE)),
            Admission::Rejected(RejectReason::SaleNotStarted)
        );
        assert_eq!(
            evaluate(&Resolution::Ended, &ctx(1_000 * COIN_VALUE)),
            Admission::Rejected(RejectReason::SaleEnded)
        );
    }

    #[test]
    fn test_below_minimum_rejected() {
        let resolution = Resolution::Active(presale_params());
        assert_eq!(
            evaluate(&resolution, &ctx(799 * COIN_VALUE)),
            Admission::Rejected(RejectReason::BelowMinimum)
        );
    }

    #[test]
    fn test_minimum_waived_when_headroom_below_minimum() {
        let params = presale_params();
        let resolution = Resolution::Active(params);
        // 500 whole units of headroom left, less than the 800 unit minimum
        let mut context = ctx(100 * COIN_VALUE);
        context.in_circulation = params.ceiling - 500 * params.tokens_per_native;
        assert_eq!(
            evaluate(&resolution, &context).authorized_tokens(),
            100 * params.tokens_per_native
        );
    }

    #[test]
    fn test_ceiling_rejected() {
        let params = presale_params();
        let resolution = Resolution::Active(params);
        let mut context = ctx(1_000 * COIN_VALUE);
        // one token short of fitting this purchase
        context.in_circulation = params.ceiling - 400_000 * COIN_VALUE + 1;
        assert_eq!(
            evaluate(&resolution, &context),
            Admission::Rejected(RejectReason::CirculationCeiling)
        );
    }

    #[test]
    fn test_partial_native_units_truncate() {
        let resolution = Resolution::Active(presale_params());
        let admission = evaluate(&resolution, &ctx(1_000 * COIN_VALUE + COIN_VALUE / 2));
        // the half unit buys nothing but still counts against the cap
        assert_eq!(
            admission,
            Admission::Authorized {
                tokens: 400_000 * COIN_VALUE,
                new_phase_contribution: Some(1_000 * COIN_VALUE + COIN_VALUE / 2),
            }
        );
    }

    #[test]
    fn test_uncapped_phase_tracks_nothing() {
        let params = PhaseParams {
            phase: PhaseId::PublicOpen,
            tokens_per_native: 300 * COIN_VALUE,
            individual_limit: None,
            minimum: None,
            ceiling: 50_000_000 * COIN_VALUE,
        };
        let admission = evaluate(&Resolution::Active(params), &ctx(123 * COIN_VALUE));
        assert_eq!(
            admission,
            Admission::Authorized {
                tokens: 123 * 300 * COIN_VALUE,
                new_phase_contribution: None,
            }
        );
    }

    proptest! {
        /// The decision is a pure function: re-evaluating the same snapshot
        /// (as the admission and execution triggers do back to back) yields
        /// the same admission.
        #[test]
        fn prop_evaluation_is_deterministic(
            attached in 0u64..20_000 * COIN_VALUE,
            in_circulation in 0u64..21_000_000 * COIN_VALUE,
            prior in 0u64..11_000 * COIN_VALUE,
            allowlisted: bool,
            paused: bool,
        ) {
            let resolution = Resolution::Active(presale_params());
            let context = ContributionContext {
                sender: ALICE,
                native_attached: attached,
                paused,
                allowlisted,
                in_circulation,
                prior_phase_contribution: prior,
            };
            prop_assert_eq!(
                evaluate(&resolution, &context),
                evaluate(&resolution, &context)
            );
        }

        /// An authorized contribution never pushes the per-address counter
        /// past the cap and never pushes circulation past the ceiling.
        #[test]
        fn prop_authorization_respects_limits(
            attached in 0u64..20_000 * COIN_VALUE,
            in_circulation in 0u64..21_000_000 * COIN_VALUE,
            prior in 0u64..11_000 * COIN_VALUE,
        ) {
            let params = presale_params();
            let context = ContributionContext {
                sender: ALICE,
                native_attached: attached,
                paused: false,
                allowlisted: true,
                in_circulation,
                prior_phase_contribution: prior,
            };
            if let Admission::Authorized { tokens, new_phase_contribution } =
                evaluate(&Resolution::Active(params), &context)
            {
                prop_assert!(in_circulation + tokens <= params.ceiling);
                let new_total = new_phase_contribution.unwrap();
                prop_assert!(new_total <= params.individual_limit.unwrap());
                prop_assert_eq!(new_total, prior + attached);
            }
        }

        /// Rejections never authorize tokens.
        #[test]
        fn prop_rejected_means_zero_tokens(
            attached in 0u64..20_000 * COIN_VALUE,
            prior in 0u64..11_000 * COIN_VALUE,
        ) {
            let context = ContributionContext {
                sender: ALICE,
                native_attached: attached,
                paused: false,
                allowlisted: true,
                in_circulation: 0,
                prior_phase_contribution: prior,
            };
            let admission = evaluate(&Resolution::Active(presale_params()), &context);
            if !admission.is_authorized() {
                prop_assert_eq!(admission.authorized_tokens(), 0);
            }
        }
    }
}
