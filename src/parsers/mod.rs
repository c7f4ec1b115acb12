use pest::Parser;
use pest_derive::Parser;

use crate::{Error, Result};

#[derive(Parser)]
#[grammar = "parsers/stdout.pest"] // relative to src
pub struct StdoutParser;

/// Split scripted output into rows of tab separated columns. Blank rows (including the one after
/// a trailing newline) are dropped, nothing else is touched.
pub fn parse_table(stdout: &str) -> Result<Vec<Vec<&str>>> {
    let pairs = StdoutParser::parse(Rule::table, stdout)?;
    let rows = pairs
        .flatten()
        .filter(|pair| pair.as_rule() == Rule::record)
        .map(|record| record.into_inner().map(|field| field.as_str()).collect::<Vec<_>>())
        .filter(|row| !(row.len() == 1 && row[0].is_empty()))
        .collect();
    Ok(rows)
}

/// Same as [`parse_table`](fn.parse_table.html), but every row must have exactly `columns`
/// columns.
pub fn parse_rows(stdout: &str, columns: usize) -> Result<Vec<Vec<&str>>> {
    let rows = parse_table(stdout)?;
    if let Some(bad) = rows.iter().find(|row| row.len() != columns) {
        return Err(Error::Parse(format!(
            "expected {} tab separated columns, got {}: {:?}",
            columns,
            bad.len(),
            bad.join("\t")
        )));
    }
    Ok(rows)
}
