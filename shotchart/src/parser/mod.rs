//! Tabular file reader and writer.
//!
//! Reads raw and cleaned shot files into a [`Table`], detecting the text
//! encoding and delimiter first. Empty cells become `Null`; everything else
//! stays a string until a transform stage coerces it.

use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::table::{Row, Table};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: Table,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoder = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => {
            return String::from_utf8(bytes.to_vec())
                .or_else(|_| Ok(String::from_utf8_lossy(bytes).into_owned()));
        }
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252,
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252,
        other => encoding_rs::Encoding::for_label(other.as_bytes())
            .ok_or_else(|| CsvError::Encoding(other.to_string()))?,
    };

    let (decoded, _, had_errors) = decoder.decode(bytes);
    if had_errors {
        return Err(CsvError::Encoding(encoding.to_string()));
    }
    Ok(decoded.into_owned())
}

/// Detect the delimiter by counting candidates in the header line
pub fn detect_delimiter(content: &str) -> char {
    let header = content.lines().next().unwrap_or("");

    [',', ';', '\t', '|']
        .into_iter()
        .map(|sep| (sep, header.matches(sep).count()))
        .fold((',', 0), |best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .0
}

/// Parse CSV text with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut table = Table::new(headers.clone());

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let cell = match record.get(i) {
                    Some(field) if !field.is_empty() => Value::String(field.to_string()),
                    _ => Value::Null,
                };
                (header.clone(), cell)
            })
            .collect();

        table.push(row);
    }

    Ok(table)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParseResult { table, encoding, delimiter })
}

/// Read a tabular file with auto-detection.
pub fn read_table<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Render a cell for CSV output. `Null` is an empty field.
fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write a table as comma-separated CSV with a header row.
pub fn write_table<W: Write>(table: &Table, writer: W) -> CsvResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.columns())?;

    for row in table.rows() {
        out.write_record(table.columns().iter().map(|c| render_cell(row.get(c))))?;
    }

    out.flush()?;
    Ok(())
}

/// Write a table to a file, creating the parent directory if needed.
pub fn write_table_file<P: AsRef<Path>>(table: &Table, path: P) -> CsvResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_table(table, File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("GAME_ID,LOC_X\n1,10\n2,-5", ',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), ["GAME_ID", "LOC_X"]);
        assert_eq!(table.rows()[1]["LOC_X"], "-5");
    }

    #[test]
    fn test_empty_cells_are_null() {
        let table = parse_str("a,b,c\n1,,3", ',').unwrap();
        assert_eq!(table.rows()[0]["b"], Value::Null);
        assert_eq!(table.rows()[0]["c"], "3");
    }

    #[test]
    fn test_short_rows_pad_with_null() {
        let table = parse_str("a,b,c\n1,2", ',').unwrap();
        assert_eq!(table.rows()[0]["c"], Value::Null);
    }

    #[test]
    fn test_quoted_values() {
        let table = parse_str("ACTION_TYPE,SHOT_ZONE_AREA\n\"Jump Shot\",\"Left Side(L)\"", ',').unwrap();
        assert_eq!(table.rows()[0]["ACTION_TYPE"], "Jump Shot");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a;b\n1;2\n\n3;4\n", ';').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"GAME_ID;SHOT_TYPE\n1;2PT Field Goal").unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.rows()[0]["SHOT_TYPE"], "2PT Field Goal");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_write_then_read_keeps_nulls_and_numbers() {
        let rows = vec![json!({ "GAME_ID": 1, "SHOT_TYPE_STD": null, "IS_POSTSEASON": true })]
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
        let table = Table::from_rows(
            vec!["GAME_ID".into(), "SHOT_TYPE_STD".into(), "IS_POSTSEASON".into()],
            rows,
        );

        let mut buf = Vec::new();
        write_table(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "GAME_ID,SHOT_TYPE_STD,IS_POSTSEASON\n1,,true\n");

        let back = parse_str(&text, ',').unwrap();
        assert_eq!(back.rows()[0]["SHOT_TYPE_STD"], Value::Null);
        assert_eq!(back.rows()[0]["IS_POSTSEASON"], "true");
    }

    #[test]
    fn test_write_table_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed").join("shots.csv");
        let table = parse_str("a,b\n1,2", ',').unwrap();

        write_table_file(&table, &path).unwrap();
        let back = read_table(&path).unwrap();
        assert_eq!(back.table, table);
    }
}
