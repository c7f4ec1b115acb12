//! Everything you need to work with zpools on the remote host. All of it goes through `zpool(8)`,
//! except the properties of pool's root dataset, which go through `zfs(8)`.
//!
//! Pool and its root dataset share one property namespace here: [`Pool`](struct.Pool.html) holds
//! both, and pool properties win on collision (`guid` for example).

use crate::{exec::{BaseCommand, Remote},
            parsers::parse_table,
            property::{is_pool_property, DeclaredProperty, PropertyMap},
            utils::{quote, quote_assignment},
            CreateFailure, CreateResult, Error, Result};

pub mod topology;
pub mod vdev;

pub use topology::{Mirror, PoolLayout};
pub use vdev::Vdev;

/// Structure representing zpool as it was at the moment of describe.
#[derive(Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct Pool {
    name:       String,
    guid:       String,
    properties: PropertyMap,
    layout:     PoolLayout,
}

/// Request for `zpool create`.
///
/// ### Examples
///
/// ```rust
/// use zetta_agent::zpool::{CreatePoolRequest, Vdev};
///
/// let request = CreatePoolRequest::builder()
///     .name("tank")
///     .vdev(Vdev::mirror(vec!["/dev/sda", "/dev/sdb"]))
///     .vdev(Vdev::disk("/dev/sdc"))
///     .build()
///     .unwrap();
/// assert!(request.validate().is_ok());
/// ```
#[derive(Default, Builder, Debug, Clone, Getters, PartialEq)]
#[builder(setter(into))]
#[get = "pub"]
pub struct CreatePoolRequest {
    name:       String,
    #[builder(default)]
    vdevs:      Vec<Vdev>,
    /// Pool properties go to `-o`, everything else to `-O` (root dataset).
    #[builder(default)]
    properties: Vec<DeclaredProperty>,
}

impl CreatePoolRequestBuilder {
    /// Add vdev to request.
    pub fn vdev(&mut self, vdev: Vdev) -> &mut CreatePoolRequestBuilder {
        match self.vdevs {
            Some(ref mut vec) => vec.push(vdev),
            None => {
                self.vdevs = Some(Vec::new());
                return self.vdev(vdev);
            },
        }
        self
    }
}

impl CreatePoolRequest {
    pub fn builder() -> CreatePoolRequestBuilder { CreatePoolRequestBuilder::default() }

    /// At least one vdev and every one of them has to be valid.
    pub fn validate(&self) -> Result<()> {
        if self.vdevs.is_empty() {
            return Err(Error::InvalidInput(format!("pool {} needs at least one vdev", self.name)));
        }
        if let Some(bad) = self.vdevs.iter().find(|vdev| !vdev.is_valid()) {
            return Err(Error::InvalidInput(format!("invalid vdev in pool {}: {:?}", self.name, bad)));
        }
        Ok(())
    }

    /// Everything between `zpool create` and the vdevs, pool name included.
    pub(crate) fn args(&self) -> Result<Vec<String>> {
        self.validate()?;
        let mut args = Vec::new();
        for property in &self.properties {
            let flag = if is_pool_property(property.name()) { "-o" } else { "-O" };
            args.push(String::from(flag));
            args.push(quote_assignment(property.name(), property.value())?);
        }
        args.push(quote(&self.name)?);
        for vdev in &self.vdevs {
            args.extend(vdev.to_args()?);
        }
        Ok(args)
    }

    pub(crate) fn required_properties(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name().clone()).collect()
    }
}

/// Generic interface to manage zpools.
pub trait ZpoolEngine {
    /// Layout first, then properties of the root dataset, then pool properties.
    fn describe_pool(&self, name: &str, required: &[String]) -> Result<Pool>;

    /// Read vdev layout. Empty output is an error, not an empty layout.
    fn read_pool_layout(&self, name: &str) -> Result<PoolLayout>;

    /// Create a pool. Like with datasets, a failed `zpool create` is followed by describe and
    /// whatever was found is returned along with the original error.
    fn create_pool(&self, request: &CreatePoolRequest) -> CreateResult<Pool>;

    /// `zpool export` followed by `zpool import`. This is not atomic: if import fails the pool
    /// stays exported and has to be imported by hand.
    fn rename_pool(&self, old_name: &str, new_name: &str) -> Result<()>;

    fn destroy_pool(&self, name: &str) -> Result<()>;

    /// Current name of the pool with `guid`.
    fn pool_name_by_guid(&self, guid: &str) -> Result<String>;
}

impl ZpoolEngine for Remote {
    fn describe_pool(&self, name: &str, required: &[String]) -> Result<Pool> {
        let layout = self.read_pool_layout(name)?;
        let mut properties = PropertyMap::new();
        self.read_dataset_properties(name, required, &mut properties)?;
        self.read_pool_properties(name, required, &mut properties)?;
        let guid = properties.get("guid").map(|p| p.value().clone()).unwrap_or_default();
        Ok(Pool { name: name.to_string(), guid, properties, layout })
    }

    fn read_pool_layout(&self, name: &str) -> Result<PoolLayout> {
        debug!(self.logger(), "reading zpool layout"; "pool" => name);
        let stdout = self.execute(format_args!("zpool list -HPv {}", quote(name)?))?;
        let rows = parse_table(&stdout)?;
        let (pool_row, vdev_rows) =
            rows.split_first().ok_or_else(|| Error::PoolLayoutUnavailable(name.to_string()))?;
        debug!(self.logger(), "parsing zpool layout"; "pool" => pool_row.join(" "));
        if let Some(short) = vdev_rows.iter().find(|row| row.len() < 2) {
            return Err(Error::Parse(format!("unexpected zpool list row: {:?}", short.join("\t"))));
        }
        let layout = PoolLayout::from_vdev_names(vdev_rows.iter().map(|row| row[1]));
        debug!(self.logger(), "pool layout"; "pool" => name, "layout" => ?layout);
        Ok(layout)
    }

    fn create_pool(&self, request: &CreatePoolRequest) -> CreateResult<Pool> {
        let args = request.args()?;
        let required = request.required_properties();
        if let Err(error) = self.execute(format_args!("zpool create {}", args.join(" "))) {
            // Pool might be there even though something failed.
            let existing = self.describe_pool(request.name(), &required).ok();
            warn!(self.logger(), "zpool create failed"; "name" => request.name(), "error" => %error, "exists" => existing.is_some());
            return Err(CreateFailure::new(error, existing));
        }
        Ok(self.describe_pool(request.name(), &required)?)
    }

    fn rename_pool(&self, old_name: &str, new_name: &str) -> Result<()> {
        let old = quote(old_name)?;
        let new = quote(new_name)?;
        self.execute(format_args!("zpool export {}", old))?;
        self.execute(format_args!("zpool import {} {}", old, new)).map_err(|e| {
            error!(self.logger(), "pool left exported"; "pool" => old_name, "new_name" => new_name, "error" => %e);
            e.context(format!("pool {} was exported, but importing it as {} failed", old_name, new_name))
        })?;
        Ok(())
    }

    fn destroy_pool(&self, name: &str) -> Result<()> {
        self.execute(format_args!("zpool destroy {}", quote(name)?))?;
        Ok(())
    }

    fn pool_name_by_guid(&self, guid: &str) -> Result<String> {
        self.name_by_guid(BaseCommand::Zpool, guid)
    }
}
