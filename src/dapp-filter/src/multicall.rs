//! Atomic multicall executor.
//!
//! A batch is first validated call by call (decode, resolve the spender's filter,
//! authorise) and only when every call passes is it executed, in order, inside a
//! backend checkpoint. The first rejection or revert ends the batch and nothing
//! it did is kept.

use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;
use tracing::{debug, info, warn};

use dapp_filter_types::{AuthorizationVerdict, ListId, DEFAULT_LIST};

use crate::{
    abi::{
        constants::{CALL_FAILED, NOT_AUTHORISED},
        Call,
    },
    decoder::{decode_call, CallDescriptor},
    errors::MultiCallError,
    registry::{DappRegistry, RegistrySnapshot},
};

/// Per-batch execution parameters forwarded to the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Overrides the backend's gas price (zero for fee-free execution).
    pub gas_price: Option<U256>,
}

/// A target reverted. An empty reason means the target gave none.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Revert {
    pub reason: String,
}

impl Revert {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Revert without a reason string.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Where authorised calls actually run.
pub trait ExecutionBackend {
    type Checkpoint;

    fn checkpoint(&mut self) -> Self::Checkpoint;

    /// Run `call` from `wallet`, forwarding value and payload unchanged.
    fn call(&mut self, wallet: Address, call: &Call, options: &ExecutionOptions) -> Result<Bytes, Revert>;

    /// Discard every change made since `checkpoint`.
    fn revert_to(&mut self, checkpoint: Self::Checkpoint);

    fn commit(&mut self, checkpoint: Self::Checkpoint);
}

/// Outcome reported to the batch submitter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub success: bool,
    pub error: Option<String>,
}

impl BatchResult {
    pub fn committed() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(error: &MultiCallError) -> Self {
        let message = match error {
            MultiCallError::Unauthorised { .. } => NOT_AUTHORISED.to_string(),
            MultiCallError::Execution { reason, .. } => reason.clone(),
        };
        Self {
            success: false,
            error: Some(message),
        }
    }
}

impl From<&Result<Vec<Bytes>, MultiCallError>> for BatchResult {
    fn from(result: &Result<Vec<Bytes>, MultiCallError>) -> Self {
        match result {
            Ok(_) => Self::committed(),
            Err(e) => Self::rejected(e),
        }
    }
}

/// Authorisation detail for one call, for tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallReport {
    pub index: usize,
    pub target: Address,
    pub spender: Address,
    /// Name of the deciding filter, if one was found.
    pub filter: Option<&'static str>,
    pub verdict: AuthorizationVerdict,
}

/// Validates and executes batches against a shared registry.
#[derive(Clone, Debug)]
pub struct MultiCall<'r> {
    registry: &'r DappRegistry,
    lists: Vec<ListId>,
}

impl<'r> MultiCall<'r> {
    /// Executor consulting only [`DEFAULT_LIST`].
    pub fn new(registry: &'r DappRegistry) -> Self {
        Self::with_lists(registry, vec![DEFAULT_LIST])
    }

    /// Executor consulting `lists` in order; any enabled list allowing a call authorises it.
    pub fn with_lists(registry: &'r DappRegistry, lists: Vec<ListId>) -> Self {
        Self { registry, lists }
    }

    pub fn lists(&self) -> &[ListId] {
        &self.lists
    }

    /// Validate then execute; every failure is folded into the result.
    pub fn execute<B: ExecutionBackend>(
        &self,
        backend: &mut B,
        wallet: Address,
        calls: &[Call],
        options: &ExecutionOptions,
    ) -> BatchResult {
        BatchResult::from(&self.try_execute(backend, wallet, calls, options))
    }

    /// Like [`MultiCall::execute`], but keeps the failing index, the filter detail
    /// and the return data of each call.
    pub fn try_execute<B: ExecutionBackend>(
        &self,
        backend: &mut B,
        wallet: Address,
        calls: &[Call],
        options: &ExecutionOptions,
    ) -> Result<Vec<Bytes>, MultiCallError> {
        self.check(wallet, calls)?;

        let checkpoint = backend.checkpoint();
        let mut outputs = Vec::with_capacity(calls.len());
        for (index, call) in calls.iter().enumerate() {
            match backend.call(wallet, call, options) {
                Ok(out) => outputs.push(out),
                Err(revert) => {
                    backend.revert_to(checkpoint);
                    let reason = if revert.reason.is_empty() {
                        CALL_FAILED.to_string()
                    } else {
                        revert.reason
                    };
                    warn!(%wallet, index, target = %call.to, %reason, "batch reverted during execution");
                    return Err(MultiCallError::Execution { index, reason });
                },
            }
        }
        backend.commit(checkpoint);
        info!(%wallet, calls = calls.len(), "batch committed");
        Ok(outputs)
    }

    /// Validation phase only. Stops at the first call that is not authorised.
    pub fn check(&self, wallet: Address, calls: &[Call]) -> Result<(), MultiCallError> {
        let snapshot = self.registry.snapshot();
        for (index, call) in calls.iter().enumerate() {
            let descriptor = decode_call(call.to, call.value, call.data.clone());
            let (filter, verdict) = self.authorise(&snapshot, &descriptor);
            debug!(
                index,
                target = %descriptor.target,
                spender = %descriptor.spender,
                filter,
                allowed = verdict.allowed,
                "call verdict"
            );
            if !verdict.allowed {
                let detail = verdict.reason.unwrap_or_else(|| NOT_AUTHORISED.to_string());
                warn!(%wallet, index, target = %call.to, %detail, "batch rejected during validation");
                return Err(MultiCallError::Unauthorised { index, detail });
            }
        }
        Ok(())
    }

    /// Verdict of every call, without short-circuiting. Does not execute anything.
    pub fn validate(&self, calls: &[Call]) -> Vec<CallReport> {
        let snapshot = self.registry.snapshot();
        calls
            .iter()
            .enumerate()
            .map(|(index, call)| {
                let descriptor = decode_call(call.to, call.value, call.data.clone());
                let (filter, verdict) = self.authorise(&snapshot, &descriptor);
                CallReport {
                    index,
                    target: descriptor.target,
                    spender: descriptor.spender,
                    filter,
                    verdict,
                }
            })
            .collect()
    }

    fn authorise(
        &self,
        snapshot: &RegistrySnapshot,
        call: &CallDescriptor,
    ) -> (Option<&'static str>, AuthorizationVerdict) {
        if let Some(defect) = call.defect() {
            return (None, AuthorizationVerdict::deny(format!("malformed call: {defect}")));
        }
        if call.is_token_call() && !call.value.is_zero() {
            return (None, AuthorizationVerdict::deny("value attached to a token call"));
        }

        let mut rejected = None;
        for list in &self.lists {
            let Some(filter) = snapshot.lookup(*list, call.spender) else {
                continue;
            };
            let verdict = filter.authorize(call);
            if verdict.allowed {
                return (Some(filter.name()), verdict);
            }
            rejected.get_or_insert((filter.name(), verdict));
        }
        match rejected {
            Some((name, verdict)) => (Some(name), verdict),
            None => (
                None,
                AuthorizationVerdict::deny(format!("no filter registered for {}", call.spender)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::filters::{LidoFilter, PotFilter, SelectorFilter};
    use alloy_primitives::address;
    use alloy_sol_types::SolCall;
    use dapp_filter_types::selector;

    const WALLET: Address = address!("00000000000000000000000000000000000000a1");
    const POOL: Address = address!("00000000000000000000000000000000000000b1");
    const POT: Address = address!("00000000000000000000000000000000000000b2");
    const UNKNOWN: Address = address!("00000000000000000000000000000000000000b3");

    /// Records executed calls; fails the call at `fail_at`.
    #[derive(Default)]
    struct Recorder {
        executed: Vec<Address>,
        committed: Vec<Address>,
        fail_at: Option<(usize, &'static str)>,
        gas_prices: Vec<Option<U256>>,
    }

    impl ExecutionBackend for Recorder {
        type Checkpoint = ();

        fn checkpoint(&mut self) {}

        fn call(&mut self, _wallet: Address, call: &Call, options: &ExecutionOptions) -> Result<Bytes, Revert> {
            self.gas_prices.push(options.gas_price);
            if let Some((index, reason)) = self.fail_at {
                if index == self.executed.len() {
                    return Err(Revert::new(reason));
                }
            }
            self.executed.push(call.to);
            Ok(Bytes::new())
        }

        fn revert_to(&mut self, _checkpoint: ()) {
            self.executed.clear();
        }

        fn commit(&mut self, _checkpoint: ()) {
            self.committed = std::mem::take(&mut self.executed);
        }
    }

    fn registry() -> DappRegistry {
        let registry = DappRegistry::new();
        registry.add_entry(DEFAULT_LIST, POOL, Arc::new(LidoFilter));
        registry.add_entry(DEFAULT_LIST, POT, Arc::new(PotFilter));
        registry
    }

    fn stake(value: u64) -> Call {
        Call {
            to: POOL,
            value: U256::from(value),
            data: Bytes::new(),
        }
    }

    fn drip() -> Call {
        Call {
            to: POT,
            value: U256::ZERO,
            data: crate::abi::IPot::dripCall {}.abi_encode().into(),
        }
    }

    fn cage() -> Call {
        Call {
            to: POT,
            value: U256::ZERO,
            data: crate::abi::IPot::cageCall {}.abi_encode().into(),
        }
    }

    #[test]
    fn authorised_batch_commits_in_order() {
        let registry = registry();
        let mut backend = Recorder::default();
        let result = MultiCall::new(&registry).execute(
            &mut backend,
            WALLET,
            &[stake(100), drip()],
            &ExecutionOptions::default(),
        );
        assert_eq!(result, BatchResult::committed());
        assert_eq!(backend.committed, vec![POOL, POT]);
    }

    #[test]
    fn unregistered_target_is_rejected_and_nothing_runs() {
        let registry = registry();
        let mut backend = Recorder::default();
        let call = Call {
            to: UNKNOWN,
            value: U256::from(1u64),
            data: Bytes::new(),
        };
        let err = MultiCall::new(&registry)
            .try_execute(&mut backend, WALLET, &[stake(1), call], &ExecutionOptions::default())
            .unwrap_err();
        assert_eq!(err.index(), 1);
        assert!(backend.executed.is_empty() && backend.committed.is_empty());
        assert_eq!(
            BatchResult::rejected(&err).error.as_deref(),
            Some(NOT_AUTHORISED)
        );
    }

    #[test]
    fn earliest_rejection_is_reported() {
        let registry = registry();
        let mut backend = Recorder::default();
        let unknown = Call {
            to: UNKNOWN,
            value: U256::ZERO,
            data: Bytes::new(),
        };
        let err = MultiCall::new(&registry)
            .try_execute(
                &mut backend,
                WALLET,
                &[drip(), cage(), unknown],
                &ExecutionOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, MultiCallError::Unauthorised { index: 1, .. }));
    }

    #[test]
    fn malformed_payload_is_rejected_before_filters() {
        let registry = registry();
        let short = Call {
            to: POT,
            value: U256::ZERO,
            data: Bytes::from(vec![0x01, 0x02]),
        };
        let err = MultiCall::new(&registry).check(WALLET, &[short]).unwrap_err();
        assert_eq!(
            err,
            MultiCallError::Unauthorised {
                index: 0,
                detail: "malformed call: payload too short to hold a selector (2 bytes)".to_string()
            }
        );
    }

    #[test]
    fn value_on_token_call_is_rejected() {
        let registry = DappRegistry::new();
        registry.add_entry(
            DEFAULT_LIST,
            POOL,
            Arc::new(SelectorFilter::default().with_approvals(true)),
        );
        let approve = crate::abi::IERC20::approveCall {
            spender: POOL,
            amount: U256::from(1u64),
        }
        .abi_encode();
        let mut call = Call {
            to: UNKNOWN,
            value: U256::ZERO,
            data: approve.into(),
        };
        let executor = MultiCall::new(&registry);
        assert!(executor.check(WALLET, std::slice::from_ref(&call)).is_ok());
        call.value = U256::from(1u64);
        assert!(executor.check(WALLET, &[call]).is_err());
    }

    #[test]
    fn execution_failure_rolls_back_and_reports_reason() {
        let registry = registry();
        let mut backend = Recorder {
            fail_at: Some((1, "Pot/not-allowed")),
            ..Recorder::default()
        };
        let result = MultiCall::new(&registry).execute(
            &mut backend,
            WALLET,
            &[stake(1), drip(), stake(2)],
            &ExecutionOptions::default(),
        );
        assert_eq!(result.error.as_deref(), Some("Pot/not-allowed"));
        assert!(!result.success);
        assert!(backend.executed.is_empty() && backend.committed.is_empty());
    }

    #[test]
    fn revert_without_reason_uses_generic_message() {
        let registry = registry();
        let mut backend = Recorder {
            fail_at: Some((0, "")),
            ..Recorder::default()
        };
        let result =
            MultiCall::new(&registry).execute(&mut backend, WALLET, &[drip()], &ExecutionOptions::default());
        assert_eq!(result.error.as_deref(), Some(CALL_FAILED));
    }

    #[test]
    fn gas_price_override_reaches_backend() {
        let registry = registry();
        let mut backend = Recorder::default();
        let options = ExecutionOptions {
            gas_price: Some(U256::ZERO),
        };
        MultiCall::new(&registry).execute(&mut backend, WALLET, &[drip()], &options);
        assert_eq!(backend.gas_prices, vec![Some(U256::ZERO)]);
    }

    #[test]
    fn any_enabled_list_may_authorise() {
        let registry = DappRegistry::new();
        registry.add_entry(ListId(0), POT, Arc::new(SelectorFilter::new([selector("cage()")])));
        registry.add_entry(ListId(1), POT, Arc::new(PotFilter));
        let both = MultiCall::with_lists(&registry, vec![ListId(0), ListId(1)]);
        assert!(both.check(WALLET, &[drip(), cage()]).is_ok());

        registry.set_list_enabled(ListId(1), false);
        assert!(both.check(WALLET, &[drip()]).is_err());
        assert!(both.check(WALLET, &[cage()]).is_ok());
    }

    #[test]
    fn validate_reports_every_call() {
        let registry = registry();
        let reports = MultiCall::new(&registry).validate(&[cage(), drip(), stake(3)]);
        assert_eq!(reports.len(), 3);
        assert!(!reports[0].verdict.allowed);
        assert_eq!(reports[0].filter, Some("pot"));
        assert!(reports[1].verdict.allowed);
        assert_eq!(reports[2].filter, Some("lido"));
    }

    #[test]
    fn empty_batch_commits() {
        let registry = registry();
        let mut backend = Recorder::default();
        let result = MultiCall::new(&registry).execute(&mut backend, WALLET, &[], &ExecutionOptions::default());
        assert!(result.success);
    }
}
