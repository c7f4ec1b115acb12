use super::{is_pool_property, Property, PropertyMap, Source};
use crate::{exec::{BaseCommand, Remote},
            parsers::parse_rows,
            utils::quote,
            Result};

impl Remote {
    /// Two-pass read of `selector` (`all` or comma separated names) into `properties`.
    ///
    /// Formatted pass decides membership. Parsable pass only fills `raw_value` of properties the
    /// formatted pass returned.
    pub fn read_some_properties(
        &self,
        base: BaseCommand,
        target: &str,
        selector: &str,
        properties: &mut PropertyMap,
    ) -> Result<()> {
        let target = quote(target)?;
        let stdout =
            self.execute(format_args!("{} get -H -o property,source,value {} {}", base, selector, target))?;
        for row in parse_rows(&stdout, 3)? {
            let source = Source::parse(row[1]).map_err(|e| e.context(format!("property {}", row[0])))?;
            properties.insert(row[0].to_string(), Property::new(row[0], source, row[2]));
        }

        let stdout = self.execute(format_args!("{} get -Hp -o property,value {} {}", base, selector, target))?;
        for row in parse_rows(&stdout, 2)? {
            if let Some(property) = properties.get_mut(row[0]) {
                property.set_raw_value(row[1].to_string());
            }
        }
        Ok(())
    }

    /// Read `all`, then explicitly ask for whatever `required` names `all` didn't return (such as
    /// `userquota@user`).
    pub fn read_all_properties(
        &self,
        base: BaseCommand,
        target: &str,
        required: &[String],
        properties: &mut PropertyMap,
    ) -> Result<()> {
        self.read_some_properties(base, target, "all", properties)?;
        let missing = required
            .iter()
            .filter(|name| !properties.contains_key(name.as_str()))
            .map(|name| quote(name))
            .collect::<Result<Vec<_>>>()?;
        if !missing.is_empty() {
            debug!(self.logger(), "fetching properties missing from 'all'"; "target" => target, "missing" => missing.join(","));
            self.read_some_properties(base, target, &missing.join(","), properties)?;
        }
        Ok(())
    }

    /// Dataset side: only the non-pool names out of `required` are asked for.
    pub fn read_dataset_properties(
        &self,
        name: &str,
        required: &[String],
        properties: &mut PropertyMap,
    ) -> Result<()> {
        let required: Vec<String> = required.iter().filter(|p| !is_pool_property(p)).cloned().collect();
        self.read_all_properties(BaseCommand::Zfs, name, &required, properties)
    }

    /// Pool side: only the pool names out of `required` are asked for.
    pub fn read_pool_properties(
        &self,
        name: &str,
        required: &[String],
        properties: &mut PropertyMap,
    ) -> Result<()> {
        let required: Vec<String> = required.iter().filter(|p| is_pool_property(p)).cloned().collect();
        self.read_all_properties(BaseCommand::Zpool, name, &required, properties)
    }
}
