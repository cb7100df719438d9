// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Concrete conditions used by the client.

use std::collections::BTreeMap;
use std::net::IpAddr;

use super::{Condition, Evaluation};
use crate::types::{AddressFamily, DesiredAddresses, PowerState};

/// Holds once the backup reports `target`.
///
/// Reporting one of `failure_states` ends the wait early. The default set is
/// empty: anything but the target is pending until the deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerStateCondition {
    pub target: PowerState,
    pub failure_states: Vec<PowerState>,
}

impl PowerStateCondition {
    pub fn new(target: PowerState) -> Self {
        Self {
            target,
            failure_states: Vec::new(),
        }
    }

    pub fn with_failure_states(mut self, states: impl IntoIterator<Item = PowerState>) -> Self {
        self.failure_states = states.into_iter().collect();
        self
    }
}

impl Condition<PowerState> for PowerStateCondition {
    fn evaluate(&self, value: &PowerState) -> Evaluation {
        if *value == self.target {
            Evaluation::Target
        } else if self.failure_states.contains(value) {
            Evaluation::Failed(value.to_string())
        } else {
            Evaluation::Pending
        }
    }
}

/// Holds once every desired slot reports an acceptable address.
///
/// Observed keys look like `<slot>/<family>[/<index>]`. Slots nobody asked
/// for are ignored and missing slots keep the wait pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressCondition {
    pub desired: DesiredAddresses,
}

impl AddressCondition {
    pub fn new(desired: DesiredAddresses) -> Self {
        Self { desired }
    }
}

impl Condition<BTreeMap<String, String>> for AddressCondition {
    fn evaluate(&self, observed: &BTreeMap<String, String>) -> Evaluation {
        let satisfied = self.desired.iter().all(|(slot, requirement)| {
            observed.iter().any(|(key, value)| {
                let mut parts = key.split('/');
                if parts.next() != Some(slot.as_str()) {
                    return false;
                }
                let family = parts
                    .next()
                    .and_then(|f| f.parse::<AddressFamily>().ok())
                    .or_else(|| value.parse::<IpAddr>().ok().map(|a| AddressFamily::of(&a)));
                requirement.accepts(family, value)
            })
        });

        if satisfied {
            Evaluation::Target
        } else {
            Evaluation::Pending
        }
    }
}

/// Holds once the generation counter moves past `after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationAdvanced {
    pub after: u64,
}

impl GenerationAdvanced {
    pub fn new(after: u64) -> Self {
        Self { after }
    }
}

impl Condition<Option<u64>> for GenerationAdvanced {
    fn evaluate(&self, value: &Option<u64>) -> Evaluation {
        match value {
            Some(generation) if *generation > self.after => Evaluation::Target,
            _ => Evaluation::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressRequirement;

    fn observed(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn desired(pairs: &[(&str, &str)]) -> DesiredAddresses {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.parse::<AddressRequirement>().unwrap()))
            .collect()
    }

    #[test]
    fn test_power_state_target() {
        let condition = PowerStateCondition::new(PowerState::Enabled);
        assert_eq!(condition.evaluate(&PowerState::Enabled), Evaluation::Target);
        assert_eq!(condition.evaluate(&PowerState::Disabled), Evaluation::Pending);
        assert_eq!(condition.evaluate(&PowerState::Unknown), Evaluation::Pending);
    }

    #[test]
    fn test_power_state_failure_states() {
        let condition = PowerStateCondition::new(PowerState::Enabled)
            .with_failure_states([PowerState::Unknown]);
        assert_eq!(
            condition.evaluate(&PowerState::Unknown),
            Evaluation::Failed("Unknown".to_string())
        );
    }

    #[test]
    fn test_ipv4_slot_satisfied() {
        let condition = AddressCondition::new(desired(&[("0", "ipv4")]));
        assert_eq!(
            condition.evaluate(&observed(&[("0/ipv4", "10.0.0.5")])),
            Evaluation::Target
        );
    }

    #[test]
    fn test_ipv6_only_is_pending_for_ipv4() {
        let condition = AddressCondition::new(desired(&[("0", "ipv4")]));
        assert_eq!(
            condition.evaluate(&observed(&[("0/ipv6", "fe80::1")])),
            Evaluation::Pending
        );
    }

    #[test]
    fn test_extra_slots_ignored_missing_pending() {
        let condition = AddressCondition::new(desired(&[("0", "any"), ("1", "any")]));

        assert_eq!(
            condition.evaluate(&observed(&[("0/ipv4/0", "10.0.0.5")])),
            Evaluation::Pending
        );
        assert_eq!(
            condition.evaluate(&observed(&[
                ("0/ipv4/0", "10.0.0.5"),
                ("1/ipv6/0", "fe80::2"),
                ("2/ipv4/0", "10.0.0.9"),
            ])),
            Evaluation::Target
        );
    }

    #[test]
    fn test_empty_value_never_counts() {
        let condition = AddressCondition::new(desired(&[("0", "")]));
        assert_eq!(
            condition.evaluate(&observed(&[("0/ipv4", "")])),
            Evaluation::Pending
        );
    }

    #[test]
    fn test_slot_prefix_is_exact() {
        let condition = AddressCondition::new(desired(&[("1", "any")]));
        assert_eq!(
            condition.evaluate(&observed(&[("10/ipv4", "10.0.0.5")])),
            Evaluation::Pending
        );
    }

    #[test]
    fn test_cidr_and_family_from_value() {
        let condition = AddressCondition::new(desired(&[("0", "192.168.1.0/24")]));
        assert_eq!(
            condition.evaluate(&observed(&[("0", "192.168.1.20")])),
            Evaluation::Target
        );

        let condition = AddressCondition::new(desired(&[("0", "ipv6")]));
        assert_eq!(
            condition.evaluate(&observed(&[("0", "fe80::1")])),
            Evaluation::Target
        );
    }

    #[test]
    fn test_empty_desired_set_is_target() {
        let condition = AddressCondition::new(DesiredAddresses::new());
        assert_eq!(condition.evaluate(&BTreeMap::new()), Evaluation::Target);
    }

    #[test]
    fn test_generation_advanced() {
        let condition = GenerationAdvanced::new(4);
        assert_eq!(condition.evaluate(&None), Evaluation::Pending);
        assert_eq!(condition.evaluate(&Some(4)), Evaluation::Pending);
        assert_eq!(condition.evaluate(&Some(5)), Evaluation::Target);
    }
}
