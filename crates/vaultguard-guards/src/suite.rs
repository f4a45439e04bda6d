//! All guards for one policy, built from a single configuration.

use vaultguard_types::{AllowList, GuardConfig, Result};

use crate::{
    commitment::OrderGuard,
    delegation::DelegationGuard,
    init::InitGuard,
    policy::{Policy, Secure},
    replay::ReplayGuard,
    rewards::Rewards,
    vault::Vault,
    verifier::{Ed25519Verifier, SignatureVerifier},
};

/// One instance of every guard, sharing a policy.
///
/// Guards hold configuration only; the [`AccountStore`](vaultguard_store::AccountStore)
/// is passed to each call.
#[derive(Debug, Clone)]
pub struct GuardSuite<P: Policy = Secure, V: SignatureVerifier = Ed25519Verifier> {
    pub init: InitGuard<P>,
    pub vault: Vault<P>,
    pub rewards: Rewards<P>,
    pub orders: OrderGuard<P>,
    pub delegation: DelegationGuard<P>,
    pub replay: ReplayGuard<P, V>,
    /// Delegated-call targets from `trusted_programs`.
    pub allow_list: AllowList,
}

impl<P: Policy, V: SignatureVerifier> GuardSuite<P, V> {
    /// Validate `config` and build every guard from it.
    ///
    /// # Errors
    /// Returns [`GuardError::Configuration`](vaultguard_types::GuardError::Configuration)
    /// if `config` fails validation.
    pub fn from_config(config: &GuardConfig, verifier: V) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            init: InitGuard::new(),
            vault: Vault::new(),
            rewards: Rewards::new(config.reward_rate_per_sec),
            orders: OrderGuard::new(),
            delegation: DelegationGuard::from_config(config),
            replay: ReplayGuard::from_config(config, verifier),
            allow_list: AllowList::from_config(config),
        })
    }
}

impl<P: Policy> GuardSuite<P, Ed25519Verifier> {
    /// Guards with default configuration and ed25519 verification.
    #[must_use]
    pub fn with_defaults() -> Self {
        let config = GuardConfig::default();
        Self {
            init: InitGuard::new(),
            vault: Vault::new(),
            rewards: Rewards::new(config.reward_rate_per_sec),
            orders: OrderGuard::new(),
            delegation: DelegationGuard::from_config(&config),
            replay: ReplayGuard::from_config(&config, Ed25519Verifier),
            allow_list: AllowList::from_config(&config),
        }
    }
}

#[cfg(test)]
mod tests {
    use vaultguard_types::{GuardError, NonceMode, ProgramId};

    use super::*;

    #[test]
    fn built_from_config() {
        let oracle = ProgramId::from_name("oracle");
        let config = GuardConfig {
            reward_rate_per_sec: 7,
            nonce_mode: NonceMode::Monotonic,
            trusted_programs: vec![oracle],
            ..GuardConfig::default()
        };
        let suite = GuardSuite::<Secure>::from_config(&config, Ed25519Verifier).unwrap();
        assert_eq!(suite.rewards.rate_per_sec(), 7);
        assert_eq!(suite.replay.nonce_mode(), NonceMode::Monotonic);
        assert!(suite.allow_list.contains(&oracle));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = GuardConfig {
            reward_rate_per_sec: 0,
            ..GuardConfig::default()
        };
        assert!(matches!(
            GuardSuite::<Secure>::from_config(&config, Ed25519Verifier),
            Err(GuardError::Configuration(_))
        ));
    }

    #[test]
    fn defaults_are_valid() {
        let suite = GuardSuite::<Secure>::with_defaults();
        assert!(suite.allow_list.is_empty());
        assert_eq!(suite.replay.nonce_mode(), NonceMode::Unique);
    }
}
