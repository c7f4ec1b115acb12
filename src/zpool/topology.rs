//! Pool layout as reported by `zpool list -HPv`.

use super::vdev::Vdev;

/// Devices of one mirror vdev, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
#[get = "pub"]
pub struct Mirror {
    devices: Vec<String>,
}

impl Mirror {
    pub fn new(devices: Vec<String>) -> Self { Mirror { devices } }
}

/// Structure representing what zpool consist of: striped devices and mirrors.
///
/// ### Examples
///
/// ```rust
/// use zetta_agent::zpool::PoolLayout;
///
/// let layout = PoolLayout::from_vdev_names(vec!["/dev/sda", "mirror-0", "/dev/sdb", "/dev/sdc"]);
/// assert_eq!(&vec![String::from("/dev/sda")], layout.striped());
/// assert_eq!(1, layout.mirrors().len());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
#[get = "pub"]
pub struct PoolLayout {
    striped: Vec<String>,
    mirrors: Vec<Mirror>,
}

impl PoolLayout {
    pub fn new(striped: Vec<String>, mirrors: Vec<Mirror>) -> Self { PoolLayout { striped, mirrors } }

    /// Fold vdev names in listing order. `mirror*` opens a new mirror, every following device
    /// belongs to the last opened mirror. Devices before the first mirror are striped. Order is
    /// kept as is, nothing is sorted or deduplicated.
    pub fn from_vdev_names<I, S>(names: I) -> PoolLayout
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().fold(PoolLayout::default(), |layout, name| layout.push(name.as_ref()))
    }

    fn push(mut self, name: &str) -> PoolLayout {
        if name.starts_with("mirror") {
            self.mirrors.push(Mirror::default());
        } else if let Some(mirror) = self.mirrors.last_mut() {
            mirror.devices.push(name.to_string());
        } else {
            self.striped.push(name.to_string());
        }
        self
    }

    /// Same layout as a list of vdevs, striped devices first.
    pub fn to_vdevs(&self) -> Vec<Vdev> {
        self.striped
            .iter()
            .map(|device| Vdev::Naked(device.clone()))
            .chain(self.mirrors.iter().map(|mirror| Vdev::Mirror(mirror.devices.clone())))
            .collect()
    }
}
