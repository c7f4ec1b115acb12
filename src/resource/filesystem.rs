use std::collections::BTreeMap;

use slog::Logger;

use super::{computed_properties, current_name, probe, required_id, Resource, ResourceKind};
use crate::{exec::Remote,
            ownership::{is_real_mountpoint, DesiredOwnership},
            property::{synthesize_declared, DeclaredProperty, PropertySettings},
            zfs::{CreateDatasetRequest, Dataset, DatasetKind, ZfsEngine},
            CreateFailure, CreateResult, Error, Result};

/// `mountpoint` is its own attribute, never a declared property.
const IGNORED: [&str; 1] = ["mountpoint"];

/// Desired or observed state of a filesystem.
///
/// `owner`, `group`, `uid` and `gid` are only tracked when set. They apply to the mountpoint
/// directory and are left alone when the mountpoint is `none` or `legacy`, or when the
/// filesystem isn't mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct FilesystemState {
    pub id:             Option<String>,
    pub name:           String,
    pub mountpoint:     String,
    pub owner:          Option<String>,
    pub group:          Option<String>,
    pub uid:            Option<u32>,
    pub gid:            Option<u32>,
    pub property:       PropertySettings,
    /// Every observed property, formatted.
    pub properties:     BTreeMap<String, String>,
    /// Every observed property, parsable.
    pub raw_properties: BTreeMap<String, String>,
}

impl Default for FilesystemState {
    fn default() -> Self {
        FilesystemState {
            id:             None,
            name:           String::new(),
            mountpoint:     String::from("none"),
            owner:          None,
            group:          None,
            uid:            None,
            gid:            None,
            property:       PropertySettings::default(),
            properties:     BTreeMap::new(),
            raw_properties: BTreeMap::new(),
        }
    }
}

impl FilesystemState {
    pub fn new<N: Into<String>>(name: N) -> Self { FilesystemState { name: name.into(), ..Default::default() } }

    fn desired_ownership(&self) -> DesiredOwnership {
        DesiredOwnership { owner: self.owner.clone(), group: self.group.clone(), uid: self.uid, gid: self.gid }
    }

    /// Only the ownership fields that differ from `prior`.
    fn changed_ownership(&self, prior: &FilesystemState) -> DesiredOwnership {
        fn changed<T: Clone + PartialEq>(desired: &Option<T>, prior: &Option<T>) -> Option<T> {
            desired.as_ref().filter(|_| desired != prior).cloned()
        }
        DesiredOwnership {
            owner: changed(&self.owner, &prior.owner),
            group: changed(&self.group, &prior.group),
            uid:   changed(&self.uid, &prior.uid),
            gid:   changed(&self.gid, &prior.gid),
        }
    }

    /// Copy what `dataset` says into a state based on `self`. Ownership is not touched.
    fn reflect(&self, dataset: &Dataset) -> FilesystemState {
        let (properties, raw_properties) = computed_properties(dataset.properties());
        let mut property = self.property.clone();
        property.set_declared(synthesize_declared(
            dataset.properties(),
            self.property.declared(),
            &IGNORED,
            *self.property.mode(),
        ));
        FilesystemState {
            id: Some(dataset.guid().clone()),
            name: dataset.name().clone(),
            mountpoint: dataset.mountpoint().clone(),
            property,
            properties,
            raw_properties,
            ..self.clone()
        }
    }
}

/// Filesystems on the remote host.
pub struct FilesystemResource<'a> {
    remote: &'a Remote,
    logger: Logger,
}

impl<'a> FilesystemResource<'a> {
    pub fn new(remote: &'a Remote) -> Self {
        let logger = remote.logger().new(o!("resource" => "filesystem"));
        FilesystemResource { remote, logger }
    }

    fn describe(&self, name: &str, state: &FilesystemState) -> Result<Dataset> {
        let dataset = self.remote.describe_dataset(name, &state.property.names())?;
        if dataset.kind() != &DatasetKind::Filesystem {
            return Err(Error::UnsupportedDatasetType {
                kind: dataset.kind().to_string(),
                guid: dataset.guid().clone(),
            });
        }
        Ok(dataset)
    }

    fn create_inner(&self, desired: &FilesystemState) -> CreateResult<FilesystemState> {
        if probe(ResourceKind::Filesystem, self.describe(&desired.name, desired))?.is_some() {
            warn!(self.logger, "filesystem already exists"; "name" => &desired.name);
        }
        let request = CreateDatasetRequest::builder()
            .name(desired.name.as_str())
            .kind(DatasetKind::Filesystem)
            .mountpoint(Some(desired.mountpoint.clone()))
            .properties(desired.property.declared().clone())
            .build()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let dataset = self.remote.create_dataset(&request).map_err(|f| f.map(|ds| desired.reflect(&ds)))?;
        let created = desired.reflect(&dataset);
        info!(self.logger, "filesystem created"; "name" => &created.name, "guid" => ?created.id);

        if let Some(path) = dataset.mounted_path() {
            if let Err(e) = self.remote.apply_ownership(path, &desired.desired_ownership()) {
                return Err(CreateFailure::new(e, Some(created)));
            }
        }
        match self.read(&created) {
            Ok(state) => Ok(state),
            Err(e) => Err(CreateFailure::new(e, Some(created))),
        }
    }

    fn read_inner(&self, state: &FilesystemState) -> Result<FilesystemState> {
        let name = current_name(self.remote, ResourceKind::Filesystem, &state.name, state.id.as_deref())?;
        let dataset = self.describe(&name, state)?;
        let mut observed = state.reflect(&dataset);
        match self.remote.mountpoint_ownership(&dataset)? {
            Some(ownership) => {
                // only what is tracked gets refreshed
                if observed.owner.is_some() {
                    observed.owner = Some(ownership.user_name().clone());
                }
                if observed.group.is_some() {
                    observed.group = Some(ownership.group_name().clone());
                }
                if observed.uid.is_some() {
                    observed.uid = Some(*ownership.uid());
                }
                if observed.gid.is_some() {
                    observed.gid = Some(*ownership.gid());
                }
            },
            None => {
                observed.owner = None;
                observed.group = None;
                observed.uid = None;
                observed.gid = None;
            },
        }
        Ok(observed)
    }

    fn update_inner(&self, prior: &FilesystemState, desired: &FilesystemState) -> Result<FilesystemState> {
        let guid = required_id(ResourceKind::Filesystem, &prior.name, prior.id.as_deref())?;
        let old_name = current_name(self.remote, ResourceKind::Filesystem, &prior.name, Some(guid.as_str()))?;
        if old_name != desired.name {
            info!(self.logger, "renaming filesystem"; "from" => &old_name, "to" => &desired.name);
            self.remote.rename_dataset(&old_name, &desired.name)?;
        }

        let dataset = self.describe(&desired.name, desired)?;
        let overrides = [DeclaredProperty::new("mountpoint", desired.mountpoint.as_str())];
        self.remote.apply_property_diff(
            &desired.name,
            dataset.properties(),
            prior.property.declared(),
            desired.property.declared(),
            &overrides,
        )?;

        if is_real_mountpoint(&desired.mountpoint) {
            // a new directory needs everything, not just what changed
            let ownership = if desired.mountpoint != prior.mountpoint {
                desired.desired_ownership()
            } else {
                desired.changed_ownership(prior)
            };
            self.remote.apply_ownership(&desired.mountpoint, &ownership)?;
        }

        let updated = FilesystemState { id: Some(guid), ..desired.clone() };
        self.read_inner(&updated)
    }
}

impl<'a> Resource for FilesystemResource<'a> {
    type State = FilesystemState;

    fn create(&self, desired: &FilesystemState) -> CreateResult<FilesystemState> {
        self.create_inner(desired).map_err(|f| {
            let (error, existing) = f.into_parts();
            CreateFailure::new(error.context(format!("creating filesystem {}", desired.name)), existing)
        })
    }

    fn read(&self, state: &FilesystemState) -> Result<FilesystemState> {
        self.read_inner(state).map_err(|e| e.context(format!("reading filesystem {}", state.name)))
    }

    fn update(&self, prior: &FilesystemState, desired: &FilesystemState) -> Result<FilesystemState> {
        self.update_inner(prior, desired).map_err(|e| e.context(format!("updating filesystem {}", desired.name)))
    }

    fn delete(&self, state: &FilesystemState) -> Result<()> {
        info!(self.logger, "destroying filesystem"; "name" => &state.name);
        self.remote
            .destroy_dataset(&state.name)
            .map_err(|e| e.context(format!("deleting filesystem {}", state.name)))
    }
}
