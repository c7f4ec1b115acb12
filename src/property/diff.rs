use std::collections::{BTreeMap, BTreeSet};

use super::{base_command_for, is_pool_property, DeclaredProperty, PropertyMap};
use crate::{exec::{BaseCommand, Remote},
            utils::{quote, quote_assignment},
            Error, Result};

/// One step of moving observed properties towards declared ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAction {
    /// `zfs inherit -S <name>`: back to received or default value.
    Inherit(String),
    /// `zfs set <name>=none`: quotas can't be inherited.
    ClearQuota(String),
    /// Pool property that is no longer declared. There is no inherit for pools, so it stays as is.
    Untouchable(String),
    /// `<base> set <name>=<value>`.
    Set { base: BaseCommand, name: String, value: String },
}

impl PropertyAction {
    fn reset(name: &str) -> PropertyAction {
        if is_pool_property(name) {
            PropertyAction::Untouchable(name.to_string())
        } else if name.contains("quota@") {
            PropertyAction::ClearQuota(name.to_string())
        } else {
            PropertyAction::Inherit(name.to_string())
        }
    }
}

/// Work out what has to happen to go from `prior` to `desired`, given what is `observed`.
///
/// `overrides` are values managed through dedicated attributes (`mountpoint`, `volsize`). They
/// take part in the diff, but declaring one of them as a plain property is an error.
///
/// All resets come before any set. A property is only set if its declared value matches neither
/// the formatted nor the parsable observed value. Matching the parsable value alone counts as in
/// sync, so `recordsize=131072` against an observed `128K` is left alone even though the
/// formatted values differ.
pub fn plan_property_diff(
    observed: &PropertyMap,
    prior: &[DeclaredProperty],
    desired: &[DeclaredProperty],
    overrides: &[DeclaredProperty],
) -> Result<Vec<PropertyAction>> {
    if let Some(conflict) = overrides.iter().find(|o| desired.iter().any(|d| d.name == o.name)) {
        return Err(Error::PropertyOverrideConflict(conflict.name.clone()));
    }

    let wanted: BTreeMap<&str, &str> = desired
        .iter()
        .chain(overrides.iter())
        .map(|p| (p.name.as_str(), p.value.as_str()))
        .collect();

    let removed: BTreeSet<&str> =
        prior.iter().map(|p| p.name.as_str()).filter(|name| !wanted.contains_key(name)).collect();

    let mut actions: Vec<PropertyAction> = removed.into_iter().map(PropertyAction::reset).collect();

    for (name, value) in wanted {
        let in_sync = observed
            .get(name)
            .map(|p| p.value == value || p.raw_value.as_ref().map(String::as_str) == Some(value))
            .unwrap_or(false);
        if !in_sync {
            actions.push(PropertyAction::Set {
                base:  base_command_for(name),
                name:  name.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(actions)
}

impl Remote {
    /// Plan and run the property diff against `target`.
    pub fn apply_property_diff(
        &self,
        target: &str,
        observed: &PropertyMap,
        prior: &[DeclaredProperty],
        desired: &[DeclaredProperty],
        overrides: &[DeclaredProperty],
    ) -> Result<()> {
        let actions = plan_property_diff(observed, prior, desired, overrides)?;
        debug!(self.logger(), "property diff"; "target" => target, "actions" => ?actions);
        let target = quote(target)?;
        for action in actions {
            match action {
                PropertyAction::Inherit(name) => {
                    self.execute(format_args!("zfs inherit -S {} {}", quote(&name)?, target))?;
                },
                PropertyAction::ClearQuota(name) => {
                    self.execute(format_args!("zfs set {} {}", quote_assignment(&name, "none")?, target))?;
                },
                PropertyAction::Untouchable(name) => {
                    info!(self.logger(), "zpool properties cannot be reset back to a default value, leaving it at whatever value it's currently at"; "property" => name);
                },
                PropertyAction::Set { base, name, value } => {
                    self.execute(format_args!("{} set {} {}", base, quote_assignment(&name, &value)?, target))?;
                },
            }
        }
        Ok(())
    }
}
