//! Owner and group of a filesystem's mountpoint.
use pest::Parser;

use crate::{exec::Remote,
            parsers::{Rule, StdoutParser},
            utils::quote,
            zfs::Dataset,
            Error, Result};

/// Mountpoint values that don't point at a directory.
pub const SENTINEL_MOUNTPOINTS: [&str; 3] = ["", "none", "legacy"];

/// `false` for `""`, `none` and `legacy`.
pub fn is_real_mountpoint(mountpoint: &str) -> bool { !SENTINEL_MOUNTPOINTS.contains(&mountpoint) }

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[get = "pub"]
pub struct Ownership {
    user_name:  String,
    group_name: String,
    uid:        u32,
    gid:        u32,
}

impl Ownership {
    /// Parse `stat -c '%U,%G,%u,%g'` output.
    pub fn from_stat(stdout: &str) -> Result<Ownership> {
        let pairs = StdoutParser::parse(Rule::ownership, stdout)?;
        let fields: Vec<&str> = pairs
            .flatten()
            .filter(|p| p.as_rule() == Rule::name_field || p.as_rule() == Rule::numeric_id)
            .map(|p| p.as_str())
            .collect();
        if let [user_name, group_name, uid, gid] = fields.as_slice() {
            Ok(Ownership {
                user_name:  user_name.to_string(),
                group_name: group_name.to_string(),
                uid:        parse_id(uid)?,
                gid:        parse_id(gid)?,
            })
        } else {
            Err(Error::Parse(format!("unexpected stat output: {:?}", stdout)))
        }
    }
}

fn parse_id(input: &str) -> Result<u32> {
    input.parse().map_err(|e| Error::Parse(format!("bad numeric id {}: {}", input, e)))
}

/// What ownership a filesystem's mountpoint should end up with. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredOwnership {
    pub owner: Option<String>,
    pub group: Option<String>,
    pub uid:   Option<u32>,
    pub gid:   Option<u32>,
}

impl Remote {
    /// `stat` the path on the remote host.
    pub fn file_ownership(&self, path: &str) -> Result<Ownership> {
        let stdout = self.execute(format_args!("stat -c '%U,%G,%u,%g' {}", quote(path)?))?;
        Ownership::from_stat(&stdout)
    }

    /// Ownership of the dataset's mountpoint. `None` without touching the remote host unless the
    /// dataset is mounted on a real path.
    pub fn mountpoint_ownership(&self, dataset: &Dataset) -> Result<Option<Ownership>> {
        match dataset.mounted_path() {
            Some(path) => self.file_ownership(path).map(Some),
            None => {
                debug!(self.logger(), "skipping ownership lookup";
                       "mountpoint" => dataset.mountpoint(), "mounted" => dataset.mounted());
                Ok(None)
            },
        }
    }

    /// Apply whatever is set in `desired` to `path`: numeric ids first, then names.
    pub fn apply_ownership(&self, path: &str, desired: &DesiredOwnership) -> Result<()> {
        if !is_real_mountpoint(path) {
            return Ok(());
        }
        let path = quote(path)?;
        if let Some(uid) = desired.uid {
            self.execute(format_args!("chown {} {}", uid, path))?;
        }
        if let Some(gid) = desired.gid {
            self.execute(format_args!("chgrp {} {}", gid, path))?;
        }
        if let Some(owner) = &desired.owner {
            self.execute(format_args!("chown {} {}", quote(owner)?, path))?;
        }
        if let Some(group) = &desired.group {
            self.execute(format_args!("chgrp {} {}", quote(group)?, path))?;
        }
        Ok(())
    }
}
