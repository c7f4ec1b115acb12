//! Property model shared by pools, filesystems and volumes.
//!
//! Properties are read fresh on every describe and never cached. Two fetches make up one
//! [`Property`](struct.Property.html): formatted (`zfs get -H`) decides which properties exist and
//! carries the source, parsable (`zfs get -Hp`) fills in `raw_value`.
use std::{collections::{BTreeMap, HashSet},
          str::FromStr};

use strum_macros::{AsRefStr, Display, EnumString};

use crate::{exec::BaseCommand, Error, Result};

mod diff;
mod read;
mod sync;

pub use diff::{plan_property_diff, PropertyAction};
pub use sync::synthesize_declared;

lazy_static! {
    static ref POOL_PROPERTIES: HashSet<&'static str> = [
        "allocated",
        "altroot",
        "ashift",
        "autoexpand",
        "autoreplace",
        "autotrim",
        "bootfs",
        "cachefile",
        "capacity",
        "checkpoint",
        "comment",
        "compatibility",
        "dedupratio",
        "delegation",
        "expandsize",
        "failmode",
        "fragmentation",
        "free",
        "freeing",
        "guid",
        "health",
        "leaked",
        "listsnapshots",
        "load_guid",
        "multihost",
        "readonly",
        "size",
        "version",
    ]
    .iter()
    .cloned()
    .collect();
}

/// True if the property belongs to `zpool` rather than `zfs`. Pool properties can't be inherited,
/// so there is no way to reset them.
pub fn is_pool_property(name: &str) -> bool {
    POOL_PROPERTIES.contains(name) || name.starts_with("feature@")
}

/// CLI that reads and sets given property.
pub fn base_command_for(name: &str) -> BaseCommand {
    if is_pool_property(name) {
        BaseCommand::Zpool
    } else {
        BaseCommand::Zfs
    }
}

/// Where current value of the property came from.
#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    #[strum(serialize = "local")]
    Local,
    #[strum(serialize = "default")]
    Default,
    /// `inherited from <parent>`, the parent is not kept.
    #[strum(serialize = "inherited")]
    Inherited,
    #[strum(serialize = "temporary")]
    Temporary,
    #[strum(serialize = "received")]
    Received,
    /// Read-only and statistics properties, printed as `-`.
    #[strum(to_string = "none", serialize = "-")]
    None,
}

impl Source {
    /// Parse source column. Only the first word counts.
    pub fn parse(input: &str) -> Result<Source> {
        let word = input.split(' ').next().unwrap_or_default();
        Source::from_str(word).map_err(|_| Error::Parse(format!("unrecognized source {}", input)))
    }

    /// Explicitly set on this very resource.
    pub fn is_override(self) -> bool { self == Source::Local || self == Source::Temporary }
}

/// One property as observed on the remote host.
#[derive(Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct Property {
    name:      String,
    source:    Source,
    /// Formatted value, e.g. `4K`.
    value:     String,
    /// Parsable value, e.g. `4096`. Missing if parsable fetch didn't return this property.
    raw_value: Option<String>,
}

impl Property {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, source: Source, value: V) -> Self {
        Property { name: name.into(), source, value: value.into(), raw_value: None }
    }

    pub fn with_raw_value<V: Into<String>>(mut self, raw_value: V) -> Self {
        self.raw_value = Some(raw_value.into());
        self
    }

    pub(crate) fn set_raw_value(&mut self, raw_value: String) { self.raw_value = Some(raw_value); }
}

/// Properties by name.
pub type PropertyMap = BTreeMap<String, Property>;

/// Formatted value of every property.
pub fn formatted_values(properties: &PropertyMap) -> BTreeMap<String, String> {
    properties.iter().map(|(name, p)| (name.clone(), p.value.clone())).collect()
}

/// Parsable value of every property, empty if it wasn't fetched.
pub fn raw_values(properties: &PropertyMap) -> BTreeMap<String, String> {
    properties
        .iter()
        .map(|(name, p)| (name.clone(), p.raw_value.clone().unwrap_or_default()))
        .collect()
}

/// `name=value` as somebody declared it. No source, no raw value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Getters)]
#[get = "pub"]
pub struct DeclaredProperty {
    name:  String,
    value: String,
}

impl DeclaredProperty {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        DeclaredProperty { name: name.into(), value: value.into() }
    }
}

/// Which observed properties get written back into declared state.
#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyMode {
    /// Only what was declared.
    #[strum(serialize = "defined")]
    Defined,
    /// Plus native properties overridden on the resource.
    #[strum(serialize = "native")]
    Native,
    /// Plus user (`module:property`) properties overridden on the resource.
    #[strum(serialize = "all")]
    All,
}

impl Default for PropertyMode {
    fn default() -> Self { PropertyMode::Defined }
}

impl PropertyMode {
    pub fn parse(mode: &str) -> Result<PropertyMode> {
        PropertyMode::from_str(mode).map_err(|_| Error::PropertyModeInvalid(mode.to_string()))
    }
}

/// Declared properties of one resource plus the policy for discovering new ones.
#[derive(Debug, Clone, Default, PartialEq, Builder, Getters)]
#[builder(setter(into))]
#[get = "pub"]
pub struct PropertySettings {
    #[builder(default)]
    declared: Vec<DeclaredProperty>,
    #[builder(default)]
    mode:     PropertyMode,
}

impl PropertySettings {
    pub fn new(declared: Vec<DeclaredProperty>, mode: PropertyMode) -> Self {
        PropertySettings { declared, mode }
    }

    pub fn builder() -> PropertySettingsBuilder { PropertySettingsBuilder::default() }

    /// Declared names, in declaration order.
    pub fn names(&self) -> Vec<String> { self.declared.iter().map(|p| p.name.clone()).collect() }

    /// Declared value for `name`. Last declaration wins.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.declared.iter().rev().find(|p| p.name == name).map(|p| p.value.as_str())
    }

    pub(crate) fn set_declared(&mut self, declared: Vec<DeclaredProperty>) { self.declared = declared; }
}
