//! Column storage-type resolution from configuration.

use crate::app::models::StorageType;
use crate::config::DateStorageMode;
use crate::error::EtlError;
use crate::Result;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Build a case-insensitive column-name to storage-type lookup from the
/// `column_types` config section.
///
/// Logical type names are validated here; an unknown name is a
/// configuration error, not a per-file data problem.
pub fn build_column_type_map(
    column_types: &BTreeMap<String, Vec<String>>,
    mode: DateStorageMode,
) -> Result<HashMap<String, StorageType>> {
    let mut map = HashMap::new();
    for (logical, columns) in column_types {
        let storage = StorageType::from_logical(logical, mode).ok_or_else(|| {
            EtlError::configuration(format!("unknown logical column type '{}'", logical))
        })?;
        for column in columns {
            map.insert(column.to_lowercase(), storage);
        }
    }
    Ok(map)
}

/// Assign a physical storage type to every final column name.
///
/// Lookup is case-insensitive; columns absent from the map receive the
/// fallback type.
pub fn resolve_storage_types(
    columns: &[String],
    type_map: &HashMap<String, StorageType>,
    fallback: StorageType,
) -> Vec<(String, StorageType)> {
    columns
        .iter()
        .map(|column| {
            let storage = type_map
                .get(&column.to_lowercase())
                .copied()
                .unwrap_or(fallback);
            (column.clone(), storage)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_section() -> BTreeMap<String, Vec<String>> {
        let mut section = BTreeMap::new();
        section.insert("REAL".to_string(), vec!["hodnota".into(), "nejistota".into()]);
        section.insert("INTEGER".to_string(), vec!["id_om".into()]);
        section.insert("DATETIME".to_string(), vec!["datum_mereni".into()]);
        section
    }

    #[test]
    fn test_datetime_physical_type_follows_mode() {
        let iso = build_column_type_map(&config_section(), DateStorageMode::IsoText).unwrap();
        assert_eq!(iso["datum_mereni"], StorageType::Text);

        let ms = build_column_type_map(&config_section(), DateStorageMode::UnixMs).unwrap();
        assert_eq!(ms["datum_mereni"], StorageType::Integer);
    }

    #[test]
    fn test_unknown_logical_type_is_configuration_error() {
        let mut section = BTreeMap::new();
        section.insert("DECIMAL".to_string(), vec!["hodnota".into()]);
        let err = build_column_type_map(&section, DateStorageMode::IsoText).unwrap_err();
        assert!(err.is_run_abort());
    }

    #[test]
    fn test_resolution_is_case_insensitive_with_fallback() {
        let map = build_column_type_map(&config_section(), DateStorageMode::IsoText).unwrap();
        let columns = vec![
            "Hodnota".to_string(),
            "id_om".to_string(),
            "poznamka".to_string(),
        ];
        let resolved = resolve_storage_types(&columns, &map, StorageType::Text);
        assert_eq!(
            resolved,
            vec![
                ("Hodnota".to_string(), StorageType::Real),
                ("id_om".to_string(), StorageType::Integer),
                ("poznamka".to_string(), StorageType::Text),
            ]
        );
    }
}
