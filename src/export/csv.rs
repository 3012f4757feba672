//! Records CSV
//!
//! Schema `value,x,y,rect,row,col`. `x`/`y` are the record center, `rect`
//! is always quoted as `"(x, y, w, h)"` with components truncated to
//! integers. Values containing a comma, quote or newline are quoted with
//! embedded quotes doubled. Rows are separated by `\n`. Reading goes through
//! the `csv` crate.

use std::io::Write;

use csv::StringRecord;

use crate::error::CsvError;
use crate::models::{Point, Rect, VialRecord};

/// Header row
pub const CSV_HEADER: &str = "value,x,y,rect,row,col";

const MIN_FIELDS: usize = 6;

/// Render records as CSV text (no trailing newline)
pub fn to_csv(records: &[VialRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(records.iter().map(format_row));
    lines.join("\n")
}

/// Write records as CSV
pub fn write_csv<W: Write>(records: &[VialRecord], mut writer: W) -> std::io::Result<()> {
    writer.write_all(to_csv(records).as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn format_row(record: &VialRecord) -> String {
    let r = &record.bounding_rect;
    format!(
        "{},{:?},{:?},\"({}, {}, {}, {})\",{},{}",
        escape(&record.value),
        record.center.x,
        record.center.y,
        r.x as i64,
        r.y as i64,
        r.width as i64,
        r.height as i64,
        record.row,
        record.col
    )
}

fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Parse a records CSV produced by [`to_csv`].
///
/// The header and blank lines are skipped. A row with fewer than six
/// fields or an unparsable center, row or column is an error; a malformed
/// `rect` falls back to a zero rect.
pub fn parse_csv(input: &str) -> Result<Vec<VialRecord>, CsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = result.map_err(|err| CsvError {
            line: err.position().map_or(0, |p| p.line() as usize),
            message: err.to_string(),
        })?;
        if index == 0 && row.get(0) == Some("value") {
            continue;
        }
        records.push(parse_row(&row)?);
    }
    Ok(records)
}

fn parse_row(row: &StringRecord) -> Result<VialRecord, CsvError> {
    let line = row.position().map_or(0, |p| p.line() as usize);
    let error = |message: String| CsvError { line, message };

    if row.len() < MIN_FIELDS {
        return Err(error(format!(
            "expected {MIN_FIELDS} fields, found {}",
            row.len()
        )));
    }

    let x: f32 = row[1]
        .trim()
        .parse()
        .map_err(|_| error(format!("invalid x '{}'", &row[1])))?;
    let y: f32 = row[2]
        .trim()
        .parse()
        .map_err(|_| error(format!("invalid y '{}'", &row[2])))?;
    let r: usize = row[4]
        .trim()
        .parse()
        .map_err(|_| error(format!("invalid row '{}'", &row[4])))?;
    let c: usize = row[5]
        .trim()
        .parse()
        .map_err(|_| error(format!("invalid col '{}'", &row[5])))?;

    Ok(VialRecord {
        value: row[0].to_string(),
        row: r,
        col: c,
        center: Point::new(x, y),
        bounding_rect: parse_rect(&row[3]).unwrap_or_default(),
    })
}

/// Parse `(x, y, w, h)`
fn parse_rect(field: &str) -> Option<Rect> {
    let inner = field.trim().strip_prefix('(')?.strip_suffix(')')?;
    let parts = inner
        .split(',')
        .map(|p| p.trim().parse::<f32>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts[..] {
        [x, y, w, h] => Some(Rect::new(x, y, w, h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &str, row: usize, col: usize, x: f32, y: f32) -> VialRecord {
        VialRecord {
            value: value.to_string(),
            row,
            col,
            center: Point::new(x, y),
            bounding_rect: Rect::new(x - 10.4, y - 10.4, 20.8, 20.8),
        }
    }

    #[test]
    fn test_header_only() {
        let csv = to_csv(&[]);
        assert_eq!(csv, "value,x,y,rect,row,col");
        assert_eq!(csv.lines().next(), Some(CSV_HEADER));
    }

    #[test]
    fn test_row_format() {
        let r = VialRecord {
            value: "V1".to_string(),
            row: 0,
            col: 1,
            center: Point::new(110.5, 220.0),
            bounding_rect: Rect::new(100.7, 200.2, 20.9, 40.0),
        };
        let csv = to_csv(&[r]);
        assert_eq!(csv.lines().nth(1), Some("V1,110.5,220.0,\"(100, 200, 20, 40)\",0,1"));
    }

    #[test]
    fn test_comma_value_is_quoted() {
        let csv = to_csv(&[record("A,B", 0, 0, 1.0, 2.0)]);
        assert!(csv.contains("\"A,B\""));
    }

    #[test]
    fn test_embedded_quotes_doubled() {
        let csv = to_csv(&[record("say \"hi\"", 0, 0, 1.0, 2.0)]);
        assert!(csv.contains("\"say \"\"hi\"\"\""));
    }

    #[test]
    fn test_round_trip_keeps_identity_fields() {
        let original = vec![
            record("A,B", 0, 0, 100.0, 100.0),
            record("plain", 0, 1, 200.25, 101.5),
            record("q\"x", 1, 0, 98.0, 240.0),
            record("multi\nline", 1, 1, 205.0, 238.75),
        ];
        let parsed = parse_csv(&to_csv(&original)).unwrap();
        assert_eq!(parsed.len(), original.len());
        for (a, b) in original.iter().zip(&parsed) {
            assert_eq!(a.value, b.value);
            assert_eq!(a.slot(), b.slot());
            assert_eq!(a.center, b.center);
            assert_eq!(b.bounding_rect.x, a.bounding_rect.x.trunc());
            assert_eq!(b.bounding_rect.width, a.bounding_rect.width.trunc());
        }
    }

    #[test]
    fn test_parse_skips_blank_lines_and_crlf() {
        let input = concat!(
            "value,x,y,rect,row,col\r\n\r\n",
            "A,1.0,2.0,\"(0, 0, 4, 4)\",0,0\r\n\n",
            "B,3,4,\"(1, 1, 2, 2)\",0,1\n",
        );
        let parsed = parse_csv(input).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].value, "B");
        assert_eq!(parsed[1].bounding_rect, Rect::new(1.0, 1.0, 2.0, 2.0));
    }

    #[test]
    fn test_parse_without_header() {
        let parsed = parse_csv("A,1.0,2.0,\"(0, 0, 4, 4)\",3,4").unwrap();
        assert_eq!(parsed[0].slot(), (3, 4));
    }

    #[test]
    fn test_malformed_rect_falls_back_to_zero() {
        let parsed = parse_csv("value,x,y,rect,row,col\nA,1,2,garbage,0,0").unwrap();
        assert_eq!(parsed[0].bounding_rect, Rect::zero());
    }

    #[test]
    fn test_short_row_reports_line() {
        let err = parse_csv("value,x,y,rect,row,col\n\nA,1.0,2.0").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("6 fields"));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = parse_csv("value,x,y,rect,row,col\nA,abc,2.0,\"(0, 0, 1, 1)\",0,0").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "csv line 2: invalid x 'abc'");
    }

    #[test]
    fn test_write_csv_appends_newline() {
        let mut out = Vec::new();
        write_csv(&[record("A", 0, 0, 1.0, 2.0)], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 2);
    }
}
