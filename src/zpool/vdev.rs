//! Vdev data types

use crate::{utils::quote, Result};

/// Basic building block of
/// [Zpool](https://www.freebsd.org/doc/handbook/zfs-term.html).
/// Devices are full paths on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vdev {
    /// Just a single disk or file. Striped with the rest of top level vdevs.
    Naked(String),
    /// A mirror of multiple devices.
    Mirror(Vec<String>),
}

impl Vdev {
    /// Check if given Vdev makes sense. Nothing is checked on the remote host.
    ///
    /// Naked needs a non-empty path, Mirror needs at least two of them.
    pub fn is_valid(&self) -> bool {
        match self {
            Vdev::Naked(device) => !device.is_empty(),
            Vdev::Mirror(devices) => devices.len() >= 2 && devices.iter().all(|d| !d.is_empty()),
        }
    }

    /// Turn Vdev into `zpool create` arguments.
    pub fn to_args(&self) -> Result<Vec<String>> {
        match self {
            Vdev::Naked(device) => Ok(vec![quote(device)?]),
            Vdev::Mirror(devices) => {
                let mut ret = Vec::with_capacity(devices.len() + 1);
                ret.push(String::from("mirror"));
                for device in devices {
                    ret.push(quote(device)?);
                }
                Ok(ret)
            },
        }
    }

    /// Short-cut to Vdev::Naked(device)
    pub fn disk<O: Into<String>>(value: O) -> Vdev { Vdev::Naked(value.into()) }

    /// Short-cut to Vdev::Mirror(devices)
    pub fn mirror<I, O>(devices: I) -> Vdev
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        Vdev::Mirror(devices.into_iter().map(Into::into).collect())
    }
}
