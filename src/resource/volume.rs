use std::collections::BTreeMap;

use slog::Logger;

use super::{computed_properties, current_name, probe, required_id, Resource, ResourceKind};
use crate::{exec::Remote,
            property::{synthesize_declared, DeclaredProperty, PropertySettings},
            zfs::{CreateDatasetRequest, Dataset, DatasetKind, ZfsEngine},
            CreateFailure, CreateResult, Error, Result};

const IGNORED: [&str; 1] = ["volsize"];

/// Desired or observed state of a volume. `sparse` only matters at create time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeState {
    pub id:             Option<String>,
    pub name:           String,
    /// Observed as the parsable value, in bytes.
    pub volsize:        String,
    pub sparse:         bool,
    pub property:       PropertySettings,
    pub properties:     BTreeMap<String, String>,
    pub raw_properties: BTreeMap<String, String>,
}

impl VolumeState {
    pub fn new<N: Into<String>, S: Into<String>>(name: N, volsize: S) -> Self {
        VolumeState { name: name.into(), volsize: volsize.into(), ..Default::default() }
    }

    fn reflect(&self, dataset: &Dataset) -> VolumeState {
        let (properties, raw_properties) = computed_properties(dataset.properties());
        let mut property = self.property.clone();
        property.set_declared(synthesize_declared(
            dataset.properties(),
            self.property.declared(),
            &IGNORED,
            *self.property.mode(),
        ));
        VolumeState {
            id: Some(dataset.guid().clone()),
            name: dataset.name().clone(),
            volsize: dataset.volsize().clone().unwrap_or_default(),
            property,
            properties,
            raw_properties,
            ..self.clone()
        }
    }
}

/// Volumes on the remote host.
pub struct VolumeResource<'a> {
    remote: &'a Remote,
    logger: Logger,
}

impl<'a> VolumeResource<'a> {
    pub fn new(remote: &'a Remote) -> Self {
        VolumeResource { remote, logger: remote.logger().new(o!("resource" => "volume")) }
    }

    fn describe(&self, name: &str, state: &VolumeState) -> Result<Dataset> {
        let dataset = self.remote.describe_dataset(name, &state.property.names())?;
        if dataset.kind() != &DatasetKind::Volume {
            let kind = dataset.kind().to_string();
            return Err(Error::UnsupportedDatasetType { kind, guid: dataset.guid().clone() });
        }
        Ok(dataset)
    }

    fn create_inner(&self, desired: &VolumeState) -> CreateResult<VolumeState> {
        if probe(ResourceKind::Volume, self.describe(&desired.name, desired))?.is_some() {
            warn!(self.logger, "volume already exists"; "name" => &desired.name);
        }
        let request = CreateDatasetRequest::builder()
            .name(desired.name.as_str())
            .kind(DatasetKind::Volume)
            .volume_size(Some(desired.volsize.clone()))
            .sparse(desired.sparse)
            .properties(desired.property.declared().clone())
            .build()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let dataset = self.remote.create_dataset(&request).map_err(|f| f.map(|ds| desired.reflect(&ds)))?;
        let created = desired.reflect(&dataset);
        info!(self.logger, "volume created"; "name" => &created.name, "guid" => ?created.id);
        self.read(&created).map_err(|e| CreateFailure::new(e, Some(created.clone())))
    }

    fn read_inner(&self, state: &VolumeState) -> Result<VolumeState> {
        let name = current_name(self.remote, ResourceKind::Volume, &state.name, state.id.as_deref())?;
        let dataset = self.describe(&name, state)?;
        Ok(state.reflect(&dataset))
    }

    fn update_inner(&self, prior: &VolumeState, desired: &VolumeState) -> Result<VolumeState> {
        let guid = required_id(ResourceKind::Volume, &prior.name, prior.id.as_deref())?;
        let old_name = current_name(self.remote, ResourceKind::Volume, &prior.name, Some(guid.as_str()))?;
        if old_name != desired.name {
            info!(self.logger, "renaming volume"; "from" => &old_name, "to" => &desired.name);
            self.remote.rename_dataset(&old_name, &desired.name)?;
        }

        let dataset = self.describe(&desired.name, desired)?;
        let overrides = [DeclaredProperty::new("volsize", desired.volsize.as_str())];
        self.remote.apply_property_diff(
            &desired.name,
            dataset.properties(),
            prior.property.declared(),
            desired.property.declared(),
            &overrides,
        )?;
        self.read_inner(&VolumeState { id: Some(guid), ..desired.clone() })
    }
}

impl<'a> Resource for VolumeResource<'a> {
    type State = VolumeState;

    fn create(&self, desired: &VolumeState) -> CreateResult<VolumeState> {
        self.create_inner(desired).map_err(|f| {
            let (error, existing) = f.into_parts();
            CreateFailure::new(error.context(format!("creating volume {}", desired.name)), existing)
        })
    }

    fn read(&self, state: &VolumeState) -> Result<VolumeState> {
        self.read_inner(state).map_err(|e| e.context(format!("reading volume {}", state.name)))
    }

    fn update(&self, prior: &VolumeState, desired: &VolumeState) -> Result<VolumeState> {
        self.update_inner(prior, desired).map_err(|e| e.context(format!("updating volume {}", desired.name)))
    }

    fn delete(&self, state: &VolumeState) -> Result<()> {
        info!(self.logger, "destroying volume"; "name" => &state.name);
        self.remote.destroy_dataset(&state.name).map_err(|e| e.context(format!("deleting volume {}", state.name)))
    }
}
