//! Filesystems and volumes.
//!
//! Everything goes through `zfs(8)` on the remote host via [`Remote`](../exec/struct.Remote.html).
//! Datasets are looked up by name, but the `guid` is what identifies them across renames.
use std::str::FromStr;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::{exec::{BaseCommand, Remote},
            ownership::is_real_mountpoint,
            property::{DeclaredProperty, PropertyMap},
            utils::{quote, quote_assignment},
            CreateFailure, CreateResult, Error, Result};

/// Dataset types this crate manages. Snapshots and bookmarks are not.
#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    #[strum(serialize = "filesystem")]
    Filesystem,
    #[strum(serialize = "volume")]
    Volume,
}

/// Snapshot of one filesystem or volume.
#[derive(Debug, Clone, PartialEq, Getters)]
#[get = "pub"]
pub struct Dataset {
    name:       String,
    kind:       DatasetKind,
    guid:       String,
    creation:   String,
    used:       String,
    available:  String,
    referenced: String,
    mounted:    String,
    mountpoint: String,
    /// Parsable `volsize`, volumes only.
    volsize:    Option<String>,
    properties: PropertyMap,
}

impl Dataset {
    /// Build from freshly read properties. `type` has to be `filesystem` or `volume`.
    pub fn from_properties<N: Into<String>>(name: N, properties: PropertyMap) -> Result<Dataset> {
        let value = |key: &str| properties.get(key).map(|p| p.value().clone()).unwrap_or_default();
        let guid = value("guid");
        let kind_value = value("type");
        let kind = DatasetKind::from_str(&kind_value)
            .map_err(|_| Error::UnsupportedDatasetType { kind: kind_value.clone(), guid: guid.clone() })?;
        let volsize = match kind {
            DatasetKind::Volume => properties.get("volsize").and_then(|p| p.raw_value().clone()),
            DatasetKind::Filesystem => None,
        };
        let creation = value("creation");
        let used = value("used");
        let available = value("available");
        let referenced = value("referenced");
        let mounted = value("mounted");
        let mountpoint = value("mountpoint");
        Ok(Dataset {
            name: name.into(),
            kind,
            guid,
            creation,
            used,
            available,
            referenced,
            mounted,
            mountpoint,
            volsize,
            properties,
        })
    }

    /// Mountpoint, if the dataset is mounted on a real path right now.
    pub fn mounted_path(&self) -> Option<&str> {
        if self.mounted == "yes" && is_real_mountpoint(&self.mountpoint) {
            Some(&self.mountpoint)
        } else {
            None
        }
    }
}

/// What to pass to `zfs create`.
#[derive(Default, Builder, Debug, Clone, Getters)]
#[builder(setter(into))]
#[get = "pub"]
pub struct CreateDatasetRequest {
    /// Full name, first component is the pool.
    name:        String,
    kind:        DatasetKind,
    /// Filesystems only.
    #[builder(default)]
    mountpoint:  Option<String>,
    /// Volumes only, required for them.
    #[builder(default)]
    volume_size: Option<String>,
    /// Volumes only, `-s`.
    #[builder(default)]
    sparse:      bool,
    #[builder(default)]
    properties:  Vec<DeclaredProperty>,
}

impl Default for DatasetKind {
    fn default() -> Self { DatasetKind::Filesystem }
}

impl CreateDatasetRequest {
    pub fn builder() -> CreateDatasetRequestBuilder { CreateDatasetRequestBuilder::default() }

    /// Every `-o name=value` pair, mountpoint included.
    fn options(&self) -> Result<Vec<DeclaredProperty>> {
        let mut options = self.properties.clone();
        match (self.kind, &self.mountpoint) {
            (DatasetKind::Filesystem, Some(mountpoint)) if !mountpoint.is_empty() => {
                if options.iter().any(|p| p.name() == "mountpoint") {
                    return Err(Error::PropertyOverrideConflict(String::from("mountpoint")));
                }
                options.push(DeclaredProperty::new("mountpoint", mountpoint.as_str()));
            },
            (DatasetKind::Volume, _) if options.iter().any(|p| p.name() == "volsize") => {
                return Err(Error::PropertyOverrideConflict(String::from("volsize")));
            },
            _ => {},
        }
        Ok(options)
    }

    /// Render argument string that goes between `zfs create` and the name.
    pub(crate) fn args(&self) -> Result<String> {
        let mut args = Vec::new();
        for option in self.options()? {
            args.push(String::from("-o"));
            args.push(quote_assignment(option.name(), option.value())?);
        }
        if self.kind == DatasetKind::Volume {
            let size = self
                .volume_size
                .as_ref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::InvalidInput(format!("volume {} needs a size", self.name)))?;
            args.push(String::from("-V"));
            args.push(quote(size)?);
            if self.sparse {
                args.push(String::from("-s"));
            }
        }
        Ok(args.join(" "))
    }

    /// Names that must be read back after create.
    pub(crate) fn required_properties(&self) -> Vec<String> {
        self.options().map(|o| o.iter().map(|p| p.name().clone()).collect()).unwrap_or_default()
    }
}

pub trait ZfsEngine {
    /// Read all properties of the dataset and build a [`Dataset`](struct.Dataset.html).
    /// `required` are names that `zfs get all` might skip, such as `userquota@user`.
    fn describe_dataset(&self, name: &str, required: &[String]) -> Result<Dataset>;

    /// Create a dataset. If `zfs create` fails, but the dataset can be described anyway, the
    /// failure carries it along with the original error.
    fn create_dataset(&self, request: &CreateDatasetRequest) -> CreateResult<Dataset>;

    fn rename_dataset(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Destroy the dataset and everything under it.
    fn destroy_dataset(&self, name: &str) -> Result<()>;

    /// Current name of the dataset with `guid`.
    fn dataset_name_by_guid(&self, guid: &str) -> Result<String>;
}

impl ZfsEngine for Remote {
    fn describe_dataset(&self, name: &str, required: &[String]) -> Result<Dataset> {
        let mut properties = PropertyMap::new();
        self.read_dataset_properties(name, required, &mut properties)?;
        Dataset::from_properties(name, properties)
    }

    fn create_dataset(&self, request: &CreateDatasetRequest) -> CreateResult<Dataset> {
        let args = request.args()?;
        let name = quote(request.name())?;
        let required = request.required_properties();
        let created = if args.is_empty() {
            self.execute(format_args!("zfs create {}", name))
        } else {
            self.execute(format_args!("zfs create {} {}", args, name))
        };
        if let Err(error) = created {
            // zfs create can leave the dataset behind when setting a property fails.
            let existing = self.describe_dataset(request.name(), &required).ok();
            warn!(self.logger(), "zfs create failed"; "name" => request.name(), "error" => %error, "exists" => existing.is_some());
            return Err(CreateFailure::new(error, existing));
        }
        Ok(self.describe_dataset(request.name(), &required)?)
    }

    fn rename_dataset(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.execute(format_args!("zfs rename {} {}", quote(old_name)?, quote(new_name)?))?;
        Ok(())
    }

    fn destroy_dataset(&self, name: &str) -> Result<()> {
        self.execute(format_args!("zfs destroy -r {}", quote(name)?))?;
        Ok(())
    }

    fn dataset_name_by_guid(&self, guid: &str) -> Result<String> {
        self.name_by_guid(BaseCommand::Zfs, guid)
    }
}
