//! Country prefix resolution from geo CSV tables.
//!
//! Two tables are joined on a numeric location id:
//!
//! ```text
//! locations.csv   id,...,...,...,CC,...        (col 0 = id, col 4 = country code)
//! blocks.csv      cidr,...,id,...              (col 0 = network, col 2 = id)
//! ```
//!
//! Neither table is expected to carry a header row; a header, like any other
//! malformed row, fails the numeric id check and is skipped.
//!
//! # Design Decisions
//! - Rows are streamed, never collected in full
//! - Malformed rows are skipped; only unreadable files are fatal
//! - Country codes match exactly after trim + uppercase, no region matching

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use ipnet::IpNet;
use thiserror::Error;

use crate::ipset::path::{resolve_path, PathError};
use crate::ipset::prefix_set::{PrefixSet, PrefixSetBuilder};

const LOCATION_ID_COL: usize = 0;
const LOCATION_CODE_COL: usize = 4;
const BLOCK_NETWORK_COL: usize = 0;
const BLOCK_ID_COL: usize = 2;

/// Fatal errors from geo table loading.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: csv::Error },
}

/// Produces the prefix set for a list of country codes.
///
/// Implemented by [`GeoResolver`] for CSV tables; binary geo database
/// decoders plug in behind the same trait.
pub trait CountrySource {
    fn resolve(&self, codes: &[String]) -> Result<PrefixSet, GeoError>;
}

/// Normalized country code to location ids, built from a locations table.
#[derive(Debug, Clone, Default)]
pub struct CountryIndex {
    by_code: HashMap<String, HashSet<u64>>,
    ids: HashSet<u64>,
}

impl CountryIndex {
    fn insert(&mut self, code: &str, id: u64) {
        self.by_code.entry(code.to_string()).or_default().insert(id);
        self.ids.insert(id);
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Location ids selected for one code, if any row matched it.
    pub fn ids_for(&self, code: &str) -> Option<&HashSet<u64>> {
        self.by_code.get(&normalize_code(code))
    }

    /// Total distinct location ids across all codes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(source)
}

/// Stream a locations table and keep the ids whose country code is requested.
///
/// Only reader-level I/O failures are returned; malformed rows are skipped.
pub fn select_location_ids<R: Read>(source: R, codes: &[String]) -> Result<CountryIndex, csv::Error> {
    let wanted: HashSet<String> = codes.iter().map(|c| normalize_code(c)).collect();
    let mut index = CountryIndex::default();
    let mut skipped = 0usize;

    for record in csv_reader(source).records() {
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(e),
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        if record.len() <= LOCATION_CODE_COL {
            skipped += 1;
            continue;
        }

        let Ok(id) = record[LOCATION_ID_COL].parse::<u64>() else {
            skipped += 1;
            continue;
        };

        let code = &record[LOCATION_CODE_COL];
        if wanted.contains(code) {
            index.insert(code, id);
        }
    }

    tracing::debug!(
        requested = wanted.len(),
        location_ids = index.len(),
        skipped_rows = skipped,
        "Locations table scanned"
    );

    Ok(index)
}

/// Stream one or more blocks tables and collect the networks of the indexed ids.
pub fn select_prefixes<I, R>(sources: I, index: &CountryIndex) -> Result<PrefixSet, csv::Error>
where
    I: IntoIterator<Item = R>,
    R: Read,
{
    let mut builder = PrefixSetBuilder::new();
    for source in sources {
        collect_blocks(source, index, &mut builder)?;
    }

    let pending = builder.pending();
    let set = builder.build();
    tracing::debug!(matched_rows = pending, prefixes = set.len(), "Blocks tables scanned");
    Ok(set)
}

fn collect_blocks<R: Read>(
    source: R,
    index: &CountryIndex,
    builder: &mut PrefixSetBuilder,
) -> Result<(), csv::Error> {
    let mut skipped = 0usize;

    for record in csv_reader(source).records() {
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(e),
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        if record.len() <= BLOCK_ID_COL {
            skipped += 1;
            continue;
        }

        let Ok(id) = record[BLOCK_ID_COL].parse::<u64>() else {
            skipped += 1;
            continue;
        };

        if !index.contains_id(id) {
            continue;
        }

        match record[BLOCK_NETWORK_COL].parse::<IpNet>() {
            Ok(net) => {
                builder.add_prefix(net);
            }
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped_rows = skipped, "Skipped malformed block rows");
    }
    Ok(())
}

/// Country resolver over a locations table and one or more blocks tables.
#[derive(Debug, Clone)]
pub struct GeoResolver {
    locations: PathBuf,
    blocks: Vec<PathBuf>,
}

impl GeoResolver {
    /// Resolve the table paths. Every file must exist.
    pub fn from_paths<S: AsRef<str>>(locations: &str, blocks: &[S]) -> Result<Self, GeoError> {
        let locations = resolve_path(locations, true)?;
        let blocks = blocks
            .iter()
            .map(|p| resolve_path(p.as_ref(), true))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { locations, blocks })
    }
}

fn open(path: &Path) -> Result<File, GeoError> {
    File::open(path).map_err(|source| GeoError::Open {
        path: path.to_path_buf(),
        source,
    })
}

impl CountrySource for GeoResolver {
    fn resolve(&self, codes: &[String]) -> Result<PrefixSet, GeoError> {
        let index = select_location_ids(open(&self.locations)?, codes).map_err(|source| {
            GeoError::Read {
                path: self.locations.clone(),
                source,
            }
        })?;

        if index.is_empty() {
            tracing::warn!(codes = ?codes, "No location ids matched the requested country codes");
        }

        let files = self.blocks.iter().map(|p| open(p)).collect::<Result<Vec<_>, _>>()?;

        // Sources are consumed one after another; `current` names the one being read.
        let current = Cell::new(0usize);
        let sources = files.into_iter().enumerate().map(|(i, file)| {
            current.set(i);
            file
        });
        let set = select_prefixes(sources, &index).map_err(|source| GeoError::Read {
            path: self.blocks[current.get()].clone(),
            source,
        })?;

        tracing::info!(
            codes = ?codes,
            location_ids = index.len(),
            prefixes = set.len(),
            "Country prefixes resolved"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LOCATIONS: &str = "\
geoname_id,locale_code,continent_code,continent_name,country_iso_code,country_name
1,en,EU,Europe,RU,Russia
2,en,NA,North America,US,United States
3,en,EU,Europe,ru,lowercase row
x,en,EU,Europe,RU,bad id
4,en,EU
5,en,EU,Europe,DE,Germany
";

    const BLOCKS: &str = "\
network,geoname_id,registered_country_geoname_id
10.0.0.0/24,1,1
10.0.1.0/24,2,2
not-a-cidr,1,1
10.0.3.0/24,1
10.0.4.0/24,1,abc
2001:db8::/48,1,1
";

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn ip(s: &str) -> std::net::IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn selects_ids_for_normalized_codes() {
        let index = select_location_ids(LOCATIONS.as_bytes(), &codes(&[" ru ", "de"])).unwrap();

        assert_eq!(index.len(), 2);
        assert!(index.contains_id(1));
        assert!(index.contains_id(5));
        // the table value is compared as-is, lowercase rows never match
        assert!(!index.contains_id(3));
        assert!(!index.contains_id(2));
        assert_eq!(index.ids_for("ru").map(|ids| ids.len()), Some(1));
    }

    #[test]
    fn unknown_code_selects_nothing() {
        let index = select_location_ids(LOCATIONS.as_bytes(), &codes(&["ZZ"])).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn selects_prefixes_for_indexed_ids() {
        let index = select_location_ids(LOCATIONS.as_bytes(), &codes(&["RU"])).unwrap();
        let set = select_prefixes([BLOCKS.as_bytes()], &index).unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.contains(ip("10.0.0.5")));
        assert!(!set.contains(ip("10.0.1.5")));
        assert!(!set.contains(ip("10.0.3.5")));
        assert!(!set.contains(ip("10.0.4.5")));
        assert!(set.contains(ip("2001:db8::1")));
    }

    #[test]
    fn accumulates_across_block_sources() {
        let index = select_location_ids(LOCATIONS.as_bytes(), &codes(&["US"])).unwrap();
        let extra = "192.0.2.0/24,2,2\n";
        let set = select_prefixes([BLOCKS.as_bytes(), extra.as_bytes()], &index).unwrap();

        assert!(set.contains(ip("10.0.1.1")));
        assert!(set.contains(ip("192.0.2.10")));
        assert!(!set.contains(ip("10.0.0.1")));
    }

    fn write_table(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn resolver_reads_tables_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let locations = write_table(&dir, "locations.csv", LOCATIONS);
        let blocks = write_table(&dir, "blocks.csv", BLOCKS);

        let resolver = GeoResolver::from_paths(&locations, &[blocks]).unwrap();
        let set = resolver.resolve(&codes(&["RU"])).unwrap();

        assert!(set.contains(ip("10.0.0.5")));
        assert!(!set.contains(ip("10.0.1.5")));
    }

    /// Yields `data` once, then fails every read.
    struct FailingRead {
        data: &'static [u8],
        served: bool,
    }

    impl Read for FailingRead {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::other("device gone"));
            }
            self.served = true;
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            Ok(n)
        }
    }

    #[test]
    fn io_failure_mid_stream_is_fatal() {
        let locations = FailingRead {
            data: b"1,en,EU,Europe,RU,Russia\n2,en,NA,North America,US,United States\n",
            served: false,
        };
        let err = select_location_ids(locations, &codes(&["RU"])).unwrap_err();
        assert!(err.is_io_error());

        let index = select_location_ids(LOCATIONS.as_bytes(), &codes(&["RU"])).unwrap();
        let blocks = FailingRead {
            data: b"10.0.0.0/24,1,1\n",
            served: false,
        };
        let err = select_prefixes([blocks], &index).unwrap_err();
        assert!(err.is_io_error());
    }

    #[test]
    fn invalid_utf8_row_is_skipped() {
        let locations: &[u8] = b"1,en,EU,Europe,RU,Russia\n\xff\xfe,en,EU,Europe,RU,\xff\n7,en,EU,Europe,RU,Russia\n";
        let index = select_location_ids(locations, &codes(&["RU"])).unwrap();
        assert!(index.contains_id(1));
        assert!(index.contains_id(7));
        assert_eq!(index.len(), 2);

        let blocks: &[u8] = b"10.0.0.0/24,1,1\n\xff/8,1,1\n10.0.9.0/24,7,7\n";
        let set = select_prefixes([blocks], &index).unwrap();
        assert!(set.contains(ip("10.0.0.1")));
        assert!(set.contains(ip("10.0.9.1")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn read_error_names_failing_table() {
        let dir = tempfile::tempdir().unwrap();
        let locations = write_table(&dir, "locations.csv", LOCATIONS);
        let good = write_table(&dir, "good.csv", BLOCKS);
        // A directory opens on unix but fails on the first read.
        let bad = dir.path().join("bad.csv");
        std::fs::create_dir(&bad).unwrap();

        let resolver = GeoResolver::from_paths(&locations, &[good, bad.to_str().unwrap().to_string()]).unwrap();
        match resolver.resolve(&codes(&["RU"])) {
            Err(GeoError::Read { path, source }) => {
                assert!(path.ends_with("bad.csv"));
                assert!(source.is_io_error());
            }
            // Platforms that refuse to open a directory report it at open time.
            Err(GeoError::Open { path, .. }) => assert!(path.ends_with("bad.csv")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_table_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let locations = write_table(&dir, "locations.csv", LOCATIONS);
        let missing = dir.path().join("missing.csv");

        let err = GeoResolver::from_paths(&locations, &[missing.to_str().unwrap()]).unwrap_err();
        assert!(matches!(err, GeoError::Path(PathError::NotFound(_))));
    }
}
