use std::collections::BTreeMap;

use slog::Logger;

use super::{computed_properties, current_name, probe, required_id, Resource, ResourceKind};
use crate::{exec::Remote,
            property::{synthesize_declared, PropertySettings},
            zpool::{CreatePoolRequest, Mirror, Pool, PoolLayout, ZpoolEngine},
            CreateFailure, CreateResult, Error, Result};

/// Desired or observed state of a zpool.
///
/// Layout is create-only: `devices` are striped top level disks, `mirrors` are mirror vdevs.
/// Update never touches either of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolState {
    pub id:             Option<String>,
    pub name:           String,
    pub devices:        Vec<String>,
    pub mirrors:        Vec<Mirror>,
    pub property:       PropertySettings,
    pub properties:     BTreeMap<String, String>,
    pub raw_properties: BTreeMap<String, String>,
}

impl PoolState {
    pub fn new<N: Into<String>>(name: N) -> Self { PoolState { name: name.into(), ..Default::default() } }

    fn layout(&self) -> PoolLayout { PoolLayout::new(self.devices.clone(), self.mirrors.clone()) }

    fn reflect(&self, pool: &Pool) -> PoolState {
        let (properties, raw_properties) = computed_properties(pool.properties());
        let mut property = self.property.clone();
        property.set_declared(synthesize_declared(pool.properties(), self.property.declared(), &[], *self.property.mode()));
        PoolState {
            id: Some(pool.guid().clone()),
            name: pool.name().clone(),
            devices: pool.layout().striped().clone(),
            mirrors: pool.layout().mirrors().clone(),
            property,
            properties,
            raw_properties,
        }
    }
}

/// Zpools on the remote host.
pub struct PoolResource<'a> {
    remote: &'a Remote,
    logger: Logger,
}

impl<'a> PoolResource<'a> {
    pub fn new(remote: &'a Remote) -> Self {
        PoolResource { remote, logger: remote.logger().new(o!("resource" => "zpool")) }
    }

    fn create_inner(&self, desired: &PoolState) -> CreateResult<PoolState> {
        let names = desired.property.names();
        if probe(ResourceKind::Pool, self.remote.describe_pool(&desired.name, &names))?.is_some() {
            warn!(self.logger, "zpool already exists"; "name" => &desired.name);
        }
        let request = CreatePoolRequest::builder()
            .name(desired.name.as_str())
            .vdevs(desired.layout().to_vdevs())
            .properties(desired.property.declared().clone())
            .build()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let pool = self.remote.create_pool(&request).map_err(|f| f.map(|pool| desired.reflect(&pool)))?;
        let created = desired.reflect(&pool);
        info!(self.logger, "zpool created"; "name" => &created.name, "guid" => ?created.id);
        self.read(&created).map_err(|e| CreateFailure::new(e, Some(created.clone())))
    }

    fn read_inner(&self, state: &PoolState) -> Result<PoolState> {
        let name = current_name(self.remote, ResourceKind::Pool, &state.name, state.id.as_deref())?;
        let pool = self.remote.describe_pool(&name, &state.property.names())?;
        Ok(state.reflect(&pool))
    }

    fn update_inner(&self, prior: &PoolState, desired: &PoolState) -> Result<PoolState> {
        let guid = required_id(ResourceKind::Pool, &prior.name, prior.id.as_deref())?;
        let old_name = current_name(self.remote, ResourceKind::Pool, &prior.name, Some(guid.as_str()))?;
        if old_name != desired.name {
            info!(self.logger, "renaming zpool"; "from" => &old_name, "to" => &desired.name);
            self.remote.rename_pool(&old_name, &desired.name)?;
        }

        let pool = self.remote.describe_pool(&desired.name, &desired.property.names())?;
        if pool.layout() != &desired.layout() {
            warn!(self.logger, "zpool layout differs, leaving it as is"; "name" => &desired.name, "layout" => ?pool.layout());
        }
        self.remote.apply_property_diff(
            &desired.name,
            pool.properties(),
            prior.property.declared(),
            desired.property.declared(),
            &[],
        )?;
        self.read_inner(&PoolState { id: Some(guid), ..desired.clone() })
    }
}

impl<'a> Resource for PoolResource<'a> {
    type State = PoolState;

    fn create(&self, desired: &PoolState) -> CreateResult<PoolState> {
        self.create_inner(desired).map_err(|f| {
            let (error, existing) = f.into_parts();
            CreateFailure::new(error.context(format!("creating zpool {}", desired.name)), existing)
        })
    }

    fn read(&self, state: &PoolState) -> Result<PoolState> {
        self.read_inner(state).map_err(|e| e.context(format!("reading zpool {}", state.name)))
    }

    fn update(&self, prior: &PoolState, desired: &PoolState) -> Result<PoolState> {
        self.update_inner(prior, desired).map_err(|e| e.context(format!("updating zpool {}", desired.name)))
    }

    fn delete(&self, state: &PoolState) -> Result<()> {
        info!(self.logger, "destroying zpool"; "name" => &state.name);
        self.remote.destroy_pool(&state.name).map_err(|e| e.context(format!("deleting zpool {}", state.name)))
    }
}
