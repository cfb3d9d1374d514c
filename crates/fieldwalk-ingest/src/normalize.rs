//! Record normalization.
//!
//! Maps a table with crew-chosen headers ("주소", "Address (road)",
//! "METER_ID", ...) onto [`RawRecord`]s. A header matches an alias when the
//! alias is a substring of the trimmed, lowercased header.

use fieldwalk_core::config::IngestConfig;
use fieldwalk_core::{Error, RawRecord, Result};

use crate::table::{Rows, Table};

/// Header aliases for the address and equipment-id columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    address: Vec<String>,
    meter: Vec<String>,
}

impl ColumnAliases {
    /// Creates an alias set. Aliases are case-folded; blank ones are dropped.
    pub fn new<A, M>(address: A, meter: M) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        Self {
            address: fold_aliases(address),
            meter: fold_aliases(meter),
        }
    }

    /// Alias set from ingest configuration.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(&config.address_aliases, &config.meter_aliases)
    }
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

fn fold_aliases<I>(aliases: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    aliases
        .into_iter()
        .map(|a| a.as_ref().trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Positions of the recognized columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    /// Index of the address column
    pub address: usize,
    /// Index of the equipment-id column, if one was found
    pub meter: Option<usize>,
}

impl ColumnMap {
    /// Locates the columns in a header row.
    ///
    /// Earlier aliases win over later ones. Fails with a schema error if no
    /// header matches an address alias.
    pub fn locate(headers: &[String], aliases: &ColumnAliases) -> Result<Self> {
        let folded: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let address = find_column(&folded, &aliases.address, None).ok_or_else(|| {
            Error::schema("no address column could be located", headers.to_vec())
        })?;
        let meter = find_column(&folded, &aliases.meter, Some(address));
        if meter.is_none() {
            tracing::warn!(headers = ?headers, "No equipment-id column; every row will be dropped");
        }

        Ok(Self { address, meter })
    }
}

fn find_column(folded: &[String], aliases: &[String], skip: Option<usize>) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        folded
            .iter()
            .enumerate()
            .find(|(idx, header)| Some(*idx) != skip && header.contains(alias.as_str()))
            .map(|(idx, _)| idx)
    })
}

/// Lazy sequence of normalized records.
///
/// Rows with a blank address or equipment id are skipped and counted.
pub struct Records<I> {
    rows: I,
    columns: ColumnMap,
    dropped: usize,
}

impl<I> Records<I> {
    /// Rows skipped so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// The column mapping in use.
    pub fn columns(&self) -> ColumnMap {
        self.columns
    }
}

impl<I> Iterator for Records<I>
where
    I: Iterator<Item = Vec<String>>,
{
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        for row in self.rows.by_ref() {
            let address = cell(&row, Some(self.columns.address));
            let meter_id = cell(&row, self.columns.meter);
            if address.is_empty() || meter_id.is_empty() {
                self.dropped += 1;
                continue;
            }
            return Some(RawRecord::new(address, meter_id));
        }
        None
    }
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(|s| s.trim()).unwrap_or("")
}

/// Normalizes rows under the given header row.
pub fn normalize<R>(
    headers: &[String],
    rows: R,
    aliases: &ColumnAliases,
) -> Result<Records<R::IntoIter>>
where
    R: IntoIterator<Item = Vec<String>>,
{
    let columns = ColumnMap::locate(headers, aliases)?;
    tracing::debug!(
        address = %headers[columns.address],
        meter = ?columns.meter.map(|i| headers[i].as_str()),
        "Located columns"
    );
    Ok(Records {
        rows: rows.into_iter(),
        columns,
        dropped: 0,
    })
}

/// Normalizes a parsed table.
pub fn normalize_table(table: Table, aliases: &ColumnAliases) -> Result<Records<Rows>> {
    normalize(&table.headers, table.rows, aliases)
}
