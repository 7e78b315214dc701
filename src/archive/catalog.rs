//! File-backed metadata catalog: products with their lineage, processing
//! codes with their inputs, and the registered archive files.
//!
//! Everything is validated once at load so the rest of the crate can rely on
//! typed, consistent records.

use crate::archive::dates::DateRange;
use crate::archive::select::{Candidate, LatestSet};
use crate::archive::template::{Lineage, LineageLookup, TemplateContext, VersionField};
use crate::archive::version::Version;
use crate::error::ArchiveError;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub name: String,
    pub instrument: String,
    pub satellite: String,
    pub mission: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeRecord {
    pub name: String,
    pub input_products: Vec<String>,
    pub output_product: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    pub filename: String,
    pub product: String,
    pub utc_file_date: NaiveDate,
    #[serde(default)]
    pub utc_start_time: Option<NaiveTime>,
    pub version: Version,
}

impl FileRecord {
    pub fn start_time(&self) -> NaiveTime {
        self.utc_start_time.unwrap_or(NaiveTime::MIN)
    }

    pub fn template_context(&self) -> TemplateContext {
        TemplateContext {
            file_id: self.filename.clone(),
            file_date: self.utc_file_date,
            start_time: self.start_time(),
            version: VersionField::Parsed(self.version),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    products: Vec<ProductRecord>,
    #[serde(default)]
    codes: Vec<CodeRecord>,
    #[serde(default)]
    files: Vec<FileRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<String, ProductRecord>,
    codes: BTreeMap<String, CodeRecord>,
    files: BTreeMap<String, FileRecord>,
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    kind: &str,
    name: &str,
    value: T,
) -> Result<(), ArchiveError> {
    if name.trim().is_empty() {
        return Err(ArchiveError::Catalog(format!("{kind} with empty name")));
    }
    if map.insert(name.to_string(), value).is_some() {
        return Err(ArchiveError::Catalog(format!("duplicate {kind} `{name}`")));
    }
    Ok(())
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: RawCatalog = serde_json::from_str(raw)?;
        Ok(Self::validate(parsed)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to load catalog {}", path.display()))
    }

    fn validate(raw: RawCatalog) -> Result<Self, ArchiveError> {
        let mut catalog = Self::default();
        for product in raw.products {
            let name = product.name.clone();
            insert_unique(&mut catalog.products, "product", &name, product)?;
        }
        for code in raw.codes {
            for product in code.input_products.iter().chain([&code.output_product]) {
                if !catalog.products.contains_key(product) {
                    return Err(ArchiveError::Catalog(format!(
                        "code `{}` references unknown product `{product}`",
                        code.name
                    )));
                }
            }
            let name = code.name.clone();
            insert_unique(&mut catalog.codes, "code", &name, code)?;
        }
        for file in raw.files {
            if !catalog.products.contains_key(&file.product) {
                return Err(ArchiveError::Catalog(format!(
                    "file `{}` references unknown product `{}`",
                    file.filename, file.product
                )));
            }
            let name = file.filename.clone();
            insert_unique(&mut catalog.files, "file", &name, file)?;
        }
        Ok(catalog)
    }

    pub fn file(&self, filename: &str) -> Option<&FileRecord> {
        self.files.get(filename)
    }

    pub fn product(&self, name: &str) -> Option<&ProductRecord> {
        self.products.get(name)
    }

    pub fn code(&self, name: &str) -> Option<&CodeRecord> {
        self.codes.get(name)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Files of any of `products` whose date falls in `range`, ordered by
    /// filename. With `newest_only`, each (product, date) keeps only its
    /// highest version.
    pub fn files_for_products(
        &self,
        products: &BTreeSet<&str>,
        range: &DateRange,
        newest_only: bool,
    ) -> Vec<&FileRecord> {
        let matching: Vec<&FileRecord> = self
            .files
            .values()
            .filter(|f| products.contains(f.product.as_str()) && range.contains(f.utc_file_date))
            .collect();
        if !newest_only {
            return matching;
        }

        let mut by_product: BTreeMap<&str, Vec<Candidate>> = BTreeMap::new();
        for f in &matching {
            by_product.entry(f.product.as_str()).or_default().push(Candidate {
                path: PathBuf::from(&f.filename),
                date: f.utc_file_date,
                version: f.version,
            });
        }
        let mut out: Vec<&FileRecord> = by_product
            .into_values()
            .flat_map(|candidates| candidates.into_iter().collect::<LatestSet>().paths())
            .filter_map(|path| self.files.get(&*path.to_string_lossy()))
            .collect();
        out.sort_by(|a, b| a.filename.cmp(&b.filename));
        out
    }
}

impl LineageLookup for Catalog {
    fn lineage(&self, file_id: &str) -> Result<Lineage, ArchiveError> {
        let unknown = |reason: &str| ArchiveError::LineageLookup {
            file: file_id.to_string(),
            reason: reason.to_string(),
        };
        let file = self.files.get(file_id).ok_or_else(|| unknown("file not in catalog"))?;
        let product = self
            .products
            .get(&file.product)
            .ok_or_else(|| unknown("product not in catalog"))?;
        Ok(Lineage {
            mission: product.mission.clone(),
            satellite: product.satellite.clone(),
            instrument: product.instrument.clone(),
            product: product.name.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_CATALOG: &str = r#"{
  "products": [
    {"name": "mag_l1", "instrument": "emfisis", "satellite": "rbspa", "mission": "rbsp"},
    {"name": "mag", "instrument": "emfisis", "satellite": "rbspa", "mission": "rbsp"}
  ],
  "codes": [
    {"name": "l2_mag", "input_products": ["mag_l1"], "output_product": "mag"}
  ],
  "files": [
    {"filename": "rbspa_mag_l1_20210703_v1.0.0.cdf", "product": "mag_l1", "utc_file_date": "2021-07-03", "version": "1.0.0"},
    {"filename": "rbspa_mag_l1_20210704_v1.0.0.cdf", "product": "mag_l1", "utc_file_date": "2021-07-04", "version": "1.0.0"},
    {"filename": "rbspa_mag_l1_20210704_v1.1.0.cdf", "product": "mag_l1", "utc_file_date": "2021-07-04", "version": "1.1.0"},
    {"filename": "rbspa_mag_20210704_v3.2.1.cdf", "product": "mag", "utc_file_date": "2021-07-04", "utc_start_time": "12:30:05", "version": "3.2.1"}
  ]
}"#;
