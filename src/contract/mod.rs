use log::debug;
use strum::{AsRefStr, EnumString};

use crate::{
    address::Address,
    admission::{self, Admission, ContributionContext, RejectReason},
    config::SaleConfig,
    event::Event,
    host::{HostContext, Trigger},
    kyc,
    ledger::SaleLedger,
    ownership,
    phase::{self, Resolution},
    storage::{keys, LedgerStore},
    vesting::{self, Pool},
};


/// Operations reachable under the execution trigger, by their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
pub enum Operation {
    #[strum(serialize = "deploy")]
    Deploy,
    #[strum(serialize = "change_owner")]
    ChangeOwner,
    #[strum(serialize = "accept_owner")]
    AcceptOwner,
    #[strum(serialize = "cancel_change_owner")]
    CancelChangeOwner,
    #[strum(serialize = "pause_sale")]
    PauseSale,
    #[strum(serialize = "resume_sale")]
    ResumeSale,
    #[strum(serialize = "end_presale")]
    EndPresale,
    #[strum(serialize = "start_public_sale")]
    StartPublicSale,
    #[strum(serialize = "crowdsale_register")]
    CrowdsaleRegister,
    #[strum(serialize = "crowdsale_deregister")]
    CrowdsaleDeregister,
    #[strum(serialize = "crowdsale_status")]
    CrowdsaleStatus,
    #[strum(serialize = "crowdsale_available")]
    CrowdsaleAvailable,
    /// `exchange` is the historical alias of the same contribution path.
    #[strum(serialize = "mintTokens", serialize = "exchange")]
    MintTokens,
    #[strum(serialize = "transfer_team_tokens")]
    TransferTeamTokens,
    #[strum(serialize = "transfer_company_tokens")]
    TransferCompanyTokens,
    #[strum(serialize = "mint_rewards_tokens")]
    MintRewardsTokens,
    #[strum(serialize = "circulation")]
    Circulation,
}

/// Dispatch result. Zero or false always means "rejected, no state change";
/// the cause is in the log output only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Bool(bool),
    Count(u64),
    Amount(u64),
    UnknownOperation,
}

/// One invocation of the sale contract over an injected store.
///
/// The host constructs this per transaction, calls [`handle`] once, then
/// drains the emitted events. Nothing is cached between invocations; all
/// state lives in the store.
///
/// [`handle`]: Crowdsale::handle
pub struct Crowdsale<'a, S: LedgerStore> {
    config: &'a SaleConfig,
    ledger: SaleLedger<'a, S>,
    events: Vec<Event>,
}

impl<'a, S: LedgerStore> Crowdsale<'a, S> {
    pub fn new(config: &'a SaleConfig, store: &'a mut S) -> Self {
        Self {
            config,
            ledger: SaleLedger::new(store),
            events: Vec::new(),
        }
    }

    /// Events emitted so far by this invocation, in order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Entry point for both triggers.
    ///
    /// Under the admission trigger the operation and arguments are ignored
    /// and no state is written; the execution trigger dispatches by
    /// operation name.
    pub fn handle<H: HostContext>(
        &mut self,
        trigger: Trigger,
        host: &H,
        operation: &str,
        args: &[Vec<u8>],
    ) -> Response {
        match trigger {
            Trigger::Admission => Response::Bool(self.admit(host)),
            Trigger::Execution => self.invoke(host, operation, args),
        }
    }

    /// Read-only admission decision for a pending native-asset transfer.
    ///
    /// Owner-witnessed transfers are admitted without the contribution math
    /// so the owner can move funds out of the contract; everyone else goes
    /// through the same calculation the execution path commits with.
    pub fn admit<H: HostContext>(&self, host: &H) -> bool {
        if self.ledger.get_flag(keys::SALE_PAUSED) {
            debug!("admission denied: sale is paused");
            return false;
        }
        if let Some(owner) = ownership::current_owner(&self.ledger) {
            if host.is_witness(&owner) {
                return true;
            }
        }
        self.evaluate_contribution(host).is_authorized()
    }

    /// Execution-trigger dispatch.
    pub fn invoke<H: HostContext>(
        &mut self,
        host: &H,
        operation: &str,
        args: &[Vec<u8>],
    ) -> Response {
        let operation = match operation.parse::<Operation>() {
            Ok(operation) => operation,
            Err(_) => {
                debug!("unknown operation {:?}", operation);
                return Response::UnknownOperation;
            }
        };
        match operation {
            Operation::Deploy => Response::Bool(self.deploy(host)),
            Operation::ChangeOwner => Response::Bool(self.change_owner(host, args)),
            Operation::AcceptOwner => Response::Bool(self.accept_owner(host)),
            Operation::CancelChangeOwner => Response::Bool(self.cancel_change_owner(host)),
            Operation::PauseSale => Response::Bool(self.set_paused(host, true)),
            Operation::ResumeSale => Response::Bool(self.set_paused(host, false)),
            Operation::EndPresale => Response::Bool(self.end_presale(host)),
            Operation::StartPublicSale => Response::Bool(self.start_public_sale(host)),
            Operation::CrowdsaleRegister => Response::Count(self.allowlist(host, args, true)),
            Operation::CrowdsaleDeregister => Response::Count(self.allowlist(host, args, false)),
            Operation::CrowdsaleStatus => Response::Bool(self.status(args)),
            Operation::CrowdsaleAvailable => Response::Amount(self.available()),
            Operation::MintTokens => Response::Bool(self.mint_tokens(host)),
            Operation::TransferTeamTokens => {
                Response::Bool(self.vesting_mint(host, args, Pool::Team))
            }
            Operation::TransferCompanyTokens => {
                Response::Bool(self.vesting_mint(host, args, Pool::Company))
            }
            Operation::MintRewardsTokens => {
                Response::Bool(self.vesting_mint(host, args, Pool::Rewards))
            }
            Operation::Circulation => Response::Amount(self.ledger.in_circulation()),
        }
    }

    fn deploy<H: HostContext>(&mut self, host: &H) -> bool {
        if !host.is_witness(&self.config.original_owner) {
            debug!("deploy attempted without the deployer witness");
            return false;
        }
        if self.ledger.get_address(keys::OWNER).is_some() {
            debug!("already deployed");
            return false;
        }
        self.ledger
            .put_address(keys::OWNER, &self.config.original_owner);
        true
    }

    fn change_owner<H: HostContext>(&mut self, host: &H, args: &[Vec<u8>]) -> bool {
        let successor = match parse_address(args, 0) {
            Some(address) => address,
            None => return false,
        };
        let owner = match self.witnessed_owner(host) {
            Some(owner) => owner,
            None => return false,
        };
        ownership::initiate_transfer(&mut self.ledger, &owner, &successor).is_ok()
    }

    fn accept_owner<H: HostContext>(&mut self, host: &H) -> bool {
        let pending = match ownership::pending_owner(&self.ledger) {
            Some(address) => address,
            None => {
                debug!("accept_owner with no pending transfer");
                return false;
            }
        };
        if !host.is_witness(&pending) {
            debug!("accept_owner attempted without the successor witness");
            return false;
        }
        ownership::accept_transfer(&mut self.ledger, &pending).is_ok()
    }

    fn cancel_change_owner<H: HostContext>(&mut self, host: &H) -> bool {
        let owner = match self.witnessed_owner(host) {
            Some(owner) => owner,
            None => return false,
        };
        ownership::cancel_transfer(&mut self.ledger, &owner).is_ok()
    }

    /// Pause and resume are idempotent; repeating either leaves the flag
    /// where it is.
    fn set_paused<H: HostContext>(&mut self, host: &H, paused: bool) -> bool {
        if !self.witnesses_owner(host) {
            return false;
        }
        if paused {
            self.ledger.set_flag(keys::SALE_PAUSED);
        } else {
            self.ledger.clear_flag(keys::SALE_PAUSED);
        }
        true
    }

    fn end_presale<H: HostContext>(&mut self, host: &H) -> bool {
        if !self.witnesses_owner(host) {
            return false;
        }
        if self.ledger.get_marker(keys::PRESALE_END).is_some() {
            debug!("presale already ended");
            return false;
        }
        self.ledger.put_u64(keys::PRESALE_END, host.block_height());
        true
    }

    /// The public-sale marker is only settable once the presale marker
    /// exists, keeping the two milestones monotonic.
    fn start_public_sale<H: HostContext>(&mut self, host: &H) -> bool {
        if !self.witnesses_owner(host) {
            return false;
        }
        if self.ledger.get_marker(keys::PRESALE_END).is_none() {
            debug!("cannot start the public sale before ending the presale");
            return false;
        }
        if self.ledger.get_marker(keys::PUBLIC_SALE_START).is_some() {
            debug!("public sale already started");
            return false;
        }
        self.ledger
            .put_u64(keys::PUBLIC_SALE_START, host.block_height());
        true
    }

    /// Batch allowlist mutation. Entries that are not 20 bytes are skipped
    /// and not counted; the rest of the batch proceeds.
    fn allowlist<H: HostContext>(&mut self, host: &H, args: &[Vec<u8>], add: bool) -> u64 {
        if !self.witnesses_owner(host) {
            return 0;
        }
        let addresses: Vec<Address> = args
            .iter()
            .filter_map(|raw| {
                let parsed = Address::from_bytes(raw);
                if parsed.is_none() {
                    debug!("skipping malformed allowlist entry of {} bytes", raw.len());
                }
                parsed
            })
            .collect();
        let count = if add {
            kyc::register(&mut self.ledger, &mut self.events, &addresses)
        } else {
            kyc::deregister(&mut self.ledger, &mut self.events, &addresses)
        };
        count as u64
    }

    fn status(&self, args: &[Vec<u8>]) -> bool {
        match parse_address(args, 0) {
            Some(address) => kyc::status(&self.ledger, &address),
            None => false,
        }
    }

    /// Remaining public-sale headroom in token raw units, clamped at zero.
    fn available(&self) -> u64 {
        self.config
            .sale_ceiling
            .saturating_sub(self.ledger.in_circulation())
    }

    /// Self-service contribution: re-runs the same calculation the admission
    /// trigger saw and, if authorized, commits the phase counter and mints.
    /// A rejected but funded contribution emits `Refund` so off-chain
    /// tooling can return the attached asset; a paused sale emits nothing.
    fn mint_tokens<H: HostContext>(&mut self, host: &H) -> bool {
        let attachments = host.attachments();
        let resolution = self.resolve_phase(host);
        let context = self.contribution_context(host, &resolution);

        match admission::evaluate(&resolution, &context) {
            Admission::Authorized {
                tokens,
                new_phase_contribution,
            } => {
                if let (Some(total), Resolution::Active(params)) =
                    (new_phase_contribution, &resolution)
                {
                    if let Some(prefix) = params.phase.key_prefix() {
                        self.ledger
                            .put_u64(&keys::phase_contribution(prefix, &context.sender), total);
                    }
                }
                self.ledger.mint(
                    &mut self.events,
                    attachments.receiver,
                    context.sender,
                    tokens,
                );
                self.events.push(Event::Contribution {
                    from: context.sender,
                    native_amount: context.native_attached,
                    tokens,
                });
                true
            }
            Admission::Rejected(reason) => {
                // every non-paused rejection promises an off-chain refund,
                // even a vacuous one for an unfunded invocation
                if reason != RejectReason::SalePaused {
                    self.events.push(Event::Refund {
                        to: context.sender,
                        native_amount: context.native_attached,
                    });
                }
                false
            }
        }
    }

    fn vesting_mint<H: HostContext>(&mut self, host: &H, args: &[Vec<u8>], pool: Pool) -> bool {
        let owner = match self.witnessed_owner(host) {
            Some(owner) => owner,
            None => {
                debug!("{} distribution rejected", pool);
                return false;
            }
        };
        if args.len() != 2 {
            debug!("{} distribution takes exactly two arguments", pool);
            return false;
        }
        let to = match parse_address(args, 0) {
            Some(address) => address,
            None => return false,
        };
        let amount = match parse_amount(args, 1) {
            Some(amount) => amount,
            None => return false,
        };
        vesting::distribute(
            pool,
            self.config,
            &mut self.ledger,
            &mut self.events,
            owner,
            to,
            amount,
            host.block_timestamp(),
        )
        .is_ok()
    }

    fn witnesses_owner<H: HostContext>(&self, host: &H) -> bool {
        self.witnessed_owner(host).is_some()
    }

    /// The current owner, if the contract is deployed and the invoking party
    /// witnesses them. Owner-gated operations reject in the undeployed state.
    fn witnessed_owner<H: HostContext>(&self, host: &H) -> Option<Address> {
        let owner = match ownership::current_owner(&self.ledger) {
            Some(owner) => owner,
            None => {
                debug!("owner operation before deploy");
                return None;
            }
        };
        if !host.is_witness(&owner) {
            debug!("caller failed the owner witness check");
            return None;
        }
        Some(owner)
    }

    fn resolve_phase<H: HostContext>(&self, host: &H) -> Resolution {
        phase::resolve(
            self.config,
            &self.ledger,
            host.block_height(),
            host.block_timestamp(),
        )
    }

    fn contribution_context<H: HostContext>(
        &self,
        host: &H,
        resolution: &Resolution,
    ) -> ContributionContext {
        let attachments = host.attachments();
        let sender = attachments.sender;
        let prior = match resolution {
            Resolution::Active(params) => match params.phase.key_prefix() {
                Some(prefix) => self.ledger.get_u64(&keys::phase_contribution(prefix, &sender)),
                None => 0,
            },
            _ => 0,
        };
        ContributionContext {
            sender,
            native_attached: attachments.native_attached,
            paused: self.ledger.get_flag(keys::SALE_PAUSED),
            allowlisted: kyc::status(&self.ledger, &sender),
            in_circulation: self.ledger.in_circulation(),
            prior_phase_contribution: prior,
        }
    }

    fn evaluate_contribution<H: HostContext>(&self, host: &H) -> Admission {
        let resolution = self.resolve_phase(host);
        let context = self.contribution_context(host, &resolution);
        admission::evaluate(&resolution, &context)
    }
}

fn parse_address(args: &[Vec<u8>], index: usize) -> Option<Address> {
    let raw = args.get(index)?;
    let parsed = Address::from_bytes(raw);
    if parsed.is_none() {
        debug!("argument {} is not a 20-byte address", index);
    }
    parsed
}

/// Amount arguments arrive as variable-width little-endian integers, at
/// most 8 bytes.
fn parse_amount(args: &[Vec<u8>], index: usize) -> Option<u64> {
    let raw = args.get(index)?;
    if raw.len() > 8 {
        debug!("argument {} is too wide for an amount", index);
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes[..raw.len()].copy_from_slice(raw);
    Some(u64::from_le_bytes(bytes))
}
