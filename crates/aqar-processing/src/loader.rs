//! Loading listings files into raw tables.
//!
//! Every column is read as text. Type conversion is the job of the field
//! parsers, so nothing here guesses at numbers.

use crate::error::LoadError;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Load a delimited listings file with a header row.
///
/// A leading byte-order mark is removed before parsing. A file with a
/// header but no rows loads as a zero-row table.
pub fn load_listings(path: impl AsRef<Path>) -> Result<DataFrame, LoadError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|e| LoadError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let content = String::from_utf8(bytes).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8 text: {}", e),
    })?;

    parse_listings(&content).map_err(|reason| LoadError::Malformed {
        path: path.to_path_buf(),
        reason,
    })
}

/// Parse listings from in-memory CSV text.
fn parse_listings(content: &str) -> Result<DataFrame, String> {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
    if content.trim().is_empty() {
        return Err("file is empty".to_string());
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(Cursor::new(content.as_bytes().to_vec()))
        .finish()
        .map_err(|e| e.to_string())?;
    name_blank_headers(&mut df).map_err(|e| e.to_string())?;

    debug!("Parsed {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Give blank header cells the positional `Unnamed: {i}` name, so a trailing
/// delimiter yields an ordinary index-artifact column.
fn name_blank_headers(df: &mut DataFrame) -> PolarsResult<()> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    if !names.iter().any(|name| is_blank_header(name)) {
        return Ok(());
    }

    let renamed: Vec<String> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if is_blank_header(&name) {
                debug!("Naming blank header at position {} 'Unnamed: {}'", i, i);
                format!("Unnamed: {}", i)
            } else {
                name
            }
        })
        .collect();
    df.set_column_names(renamed)
}

/// Blank or whitespace-only, including the `_duplicated_<n>` names polars
/// gives to repeated blank headers.
fn is_blank_header(name: &str) -> bool {
    match name.rsplit_once("_duplicated_") {
        Some((base, n)) if n.chars().all(|c| c.is_ascii_digit()) && !n.is_empty() => {
            base.trim().is_empty()
        }
        _ => name.trim().is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listings_strips_bom() {
        let df = parse_listings("\u{feff}Title,Price\nFlat,\"1,000 EGP\"\n").unwrap();

        assert_eq!(df.get_column_names()[0].as_str(), "Title");
        assert_eq!(
            df.column("Price").unwrap().str().unwrap().get(0),
            Some("1,000 EGP")
        );
    }

    #[test]
    fn test_parse_listings_keeps_numbers_as_text() {
        let df = parse_listings("Bedrooms\n3\n2\n").unwrap();
        assert_eq!(df.column("Bedrooms").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_parse_listings_header_only() {
        let df = parse_listings("Title,Price\n").unwrap();
        assert_eq!(df.shape(), (0, 2));
    }

    #[test]
    fn test_parse_listings_names_blank_headers() {
        let df = parse_listings("Title,Price,\nFlat,1,\n").unwrap();
        assert_eq!(
            df.get_column_names()
                .into_iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>(),
            vec!["Title", "Price", "Unnamed: 2"]
        );
    }

    #[test]
    fn test_parse_listings_names_repeated_blank_headers() {
        let df = parse_listings(",Title, \n0,Flat,\n").unwrap();
        assert_eq!(
            df.get_column_names()
                .into_iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>(),
            vec!["Unnamed: 0", "Title", "Unnamed: 2"]
        );
    }

    #[test]
    fn test_is_blank_header() {
        assert!(is_blank_header(""));
        assert!(is_blank_header("  "));
        assert!(is_blank_header("_duplicated_0"));
        assert!(!is_blank_header("Title"));
        assert!(!is_blank_header("Title_duplicated_0"));
    }

    #[test]
    fn test_parse_listings_empty_is_malformed() {
        assert!(parse_listings("").is_err());
        assert!(parse_listings("\u{feff}").is_err());
    }

    #[test]
    fn test_load_listings_missing_file() {
        let err = load_listings("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}
