//! CRUD entry points for whatever keeps the desired state around.
//!
//! Every resource kind takes and returns a plain state record. `id` is the guid and is what
//! survives renames. Reads resolve the current name from it before anything else.
//!
//! ```rust,no_run
//! use zetta_agent::{config::SshConfig, exec::Remote,
//!                   resource::{FilesystemResource, FilesystemState, Resource}};
//!
//! let remote = Remote::from_config(SshConfig::from_env().unwrap());
//! let desired = FilesystemState::new("tank/home");
//! let created = FilesystemResource::new(&remote).create(&desired).unwrap();
//! println!("tank/home is {:?}", created.id);
//! ```
use strum_macros::{AsRefStr, Display};

use crate::{exec::{BaseCommand, Remote},
            property::{formatted_values, raw_values, PropertyMap},
            CreateResult, Error, ErrorKind, Result};

mod filesystem;
mod pool;
mod volume;

pub use filesystem::{FilesystemResource, FilesystemState};
pub use pool::{PoolResource, PoolState};
pub use volume::{VolumeResource, VolumeState};

/// Create, read, update and delete one kind of resource.
pub trait Resource {
    type State;

    /// Create whatever `desired` describes. A failure may still carry the state of what got
    /// created on the remote host.
    fn create(&self, desired: &Self::State) -> CreateResult<Self::State>;

    /// Re-read everything about the resource `state` points at.
    fn read(&self, state: &Self::State) -> Result<Self::State>;

    /// Move the resource from `prior` to `desired`. `prior` must have an id.
    fn update(&self, prior: &Self::State, desired: &Self::State) -> Result<Self::State>;

    fn delete(&self, state: &Self::State) -> Result<()>;
}

#[derive(AsRefStr, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    #[strum(serialize = "filesystem")]
    Filesystem,
    #[strum(serialize = "volume")]
    Volume,
    #[strum(serialize = "zpool")]
    Pool,
}

impl ResourceKind {
    pub fn base_command(self) -> BaseCommand {
        match self {
            ResourceKind::Filesystem | ResourceKind::Volume => BaseCommand::Zfs,
            ResourceKind::Pool => BaseCommand::Zpool,
        }
    }

    fn not_found(self) -> ErrorKind {
        match self {
            ResourceKind::Filesystem | ResourceKind::Volume => ErrorKind::DatasetNotFound,
            ResourceKind::Pool => ErrorKind::PoolNotFound,
        }
    }
}

/// Current name of the resource with given guid.
pub fn lookup_name(remote: &Remote, kind: ResourceKind, guid: &str) -> Result<String> {
    remote.name_by_guid(kind.base_command(), guid)
}

/// Name to operate on: resolved from `id` if there is one, `name` as is otherwise.
fn current_name(remote: &Remote, kind: ResourceKind, name: &str, id: Option<&str>) -> Result<String> {
    match id.filter(|id| !id.is_empty()) {
        Some(guid) => lookup_name(remote, kind, guid).map_err(|e| {
            e.context(format!(
                "the {} {} identified by guid {} could not be found, it was likely deleted on the server",
                kind, name, guid
            ))
        }),
        None => Ok(name.to_string()),
    }
}

/// Guid of the prior state, needed by every update.
fn required_id(kind: ResourceKind, name: &str, id: Option<&str>) -> Result<String> {
    id.filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("{} {} has no id", kind, name)))
}

/// Existence probe before create. Only "not found" of the right kind is tolerated.
fn probe<T>(kind: ResourceKind, described: Result<T>) -> Result<Option<T>> {
    match described {
        Ok(found) => Ok(Some(found)),
        Err(ref e) if e.kind() == kind.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Formatted and parsable values of every observed property.
fn computed_properties(
    properties: &PropertyMap,
) -> (std::collections::BTreeMap<String, String>, std::collections::BTreeMap<String, String>) {
    (formatted_values(properties), raw_values(properties))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::exec::scripted::ScriptedExecutor;

    #[test]
    fn test_lookup_name() {
        let exec = ScriptedExecutor::default();
        exec.respond("zpool list -H -o name,guid", "tank\t42\n");
        let remote = exec.remote();
        assert_eq!("tank", lookup_name(&remote, ResourceKind::Pool, "42").unwrap());
        assert_eq!(vec!["zpool list -H -o name,guid"], exec.issued());
    }

    #[test]
    fn test_current_name_failure_message() {
        let exec = ScriptedExecutor::default();
        exec.respond("zfs list -H -o name,guid", "tank\t1\n");
        let remote = exec.remote();
        let err = current_name(&remote, ResourceKind::Filesystem, "tank/old", Some("42")).unwrap_err();
        assert_eq!(ErrorKind::ResourceNotFound, err.kind());
        assert!(err.to_string().starts_with("the filesystem tank/old identified by guid 42 could not be found"));
    }

    #[test]
    fn test_current_name_without_id() {
        let exec = ScriptedExecutor::default();
        let remote = exec.remote();
        assert_eq!("tank/a", current_name(&remote, ResourceKind::Volume, "tank/a", None).unwrap());
        assert_eq!("tank/a", current_name(&remote, ResourceKind::Volume, "tank/a", Some("")).unwrap());
        assert!(exec.issued().is_empty());
    }

    #[test]
    fn test_probe() {
        let missing: Result<()> = Err(Error::DatasetNotFound("gone".into()));
        assert_eq!(None, probe(ResourceKind::Filesystem, missing).unwrap());

        let wrong_kind: Result<()> = Err(Error::DatasetNotFound("gone".into()));
        assert!(probe(ResourceKind::Pool, wrong_kind).is_err());

        let broken: Result<()> = Err(Error::RemoteCommand("permission denied".into()));
        assert!(probe(ResourceKind::Volume, broken).is_err());
    }
}
