//! Extraction of facility readings from the occupancy listing.
//!
//! The listing is an HTML table whose rows hold a facility label in the
//! first cell ("WOF 3") and its occupancy in the second ("42%"). Parsing is
//! pure: no I/O, no logging, first matching row wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::models::{FacilityId, OccupancyReading};
use crate::utils::{parse_leading_int, strip_html};

static ROW_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr[\s>].*?</tr>").expect("Invalid row regex"));

static CELL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<td[\s>].*?</td>").expect("Invalid cell regex"));

/// Extracts a facility's reading from a raw listing document.
///
/// Implementations must be side-effect free so the refresh cycle can call
/// them once per facility against the same shared document.
pub trait ReadingParser: Send + Sync {
    fn parse(&self, document: &str, facility: FacilityId) -> Result<OccupancyReading, ParseError>;
}

/// Pattern-based parser for `<table>` listings.
#[derive(Debug, Clone)]
pub struct TableParser {
    label: Regex,
}

impl TableParser {
    /// Build a parser matching names like `"<label> <number>"`, case-insensitively.
    pub fn new(label: &str) -> Result<Self, regex::Error> {
        let label = Regex::new(&format!(r"(?i){}\s*(\d+)", regex::escape(label.trim())))?;
        Ok(Self { label })
    }

    /// Facility number embedded in a cell's text, if it names a facility.
    fn facility_in(&self, name: &str) -> Option<FacilityId> {
        let caps = self.label.captures(name)?;
        caps.get(1)?
            .as_str()
            .parse::<u32>()
            .ok()
            .and_then(FacilityId::new)
    }
}

impl ReadingParser for TableParser {
    fn parse(&self, document: &str, facility: FacilityId) -> Result<OccupancyReading, ParseError> {
        let lower = document.to_ascii_lowercase();
        if !lower.contains("<table") || !lower.contains("</table>") {
            return Err(ParseError::MalformedDocument);
        }

        let mut available = Vec::new();

        for row in ROW_PATTERN.find_iter(document) {
            let mut cells = CELL_PATTERN.find_iter(row.as_str());
            let (Some(name_cell), Some(value_cell)) = (cells.next(), cells.next()) else {
                continue;
            };

            let name = strip_html(name_cell.as_str());
            let Some(found) = self.facility_in(&name) else {
                continue;
            };
            available.push(found);

            if found == facility {
                return parse_value(name, value_cell.as_str());
            }
        }

        available.sort_unstable();
        available.dedup();
        Err(ParseError::FacilityNotFound {
            requested: facility,
            available,
        })
    }
}

fn parse_value(name: String, cell: &str) -> Result<OccupancyReading, ParseError> {
    let raw = strip_html(cell).replace('%', "");
    let percentage = parse_leading_int(&raw)
        .filter(|p| (0..=100).contains(p))
        .and_then(|p| u8::try_from(p).ok());

    match percentage {
        Some(percentage) => Ok(OccupancyReading { name, percentage }),
        None => Err(ParseError::InvalidOccupancyValue {
            name,
            value: raw.trim().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> FacilityId {
        FacilityId::new(n).unwrap()
    }

    fn parser() -> TableParser {
        TableParser::new("WOF").unwrap()
    }

    fn document(rows: &[(&str, &str)]) -> String {
        let body: String = rows
            .iter()
            .map(|(name, value)| format!("<tr>\n  <td><b>{}</b></td>\n  <td>{}</td>\n</tr>\n", name, value))
            .collect();
        format!("<html><body><table>\n<tr><th>Studio</th><th>Belegung</th></tr>\n{}</table></body></html>", body)
    }

    #[test]
    fn test_parse_finds_requested_facility() {
        let doc = document(&[("WOF 1", "45%"), ("WOF 2", "20%")]);
        let reading = parser().parse(&doc, id(2)).unwrap();
        assert_eq!(reading.name, "WOF 2");
        assert_eq!(reading.percentage, 20);
    }

    #[test]
    fn test_parse_accepts_boundaries() {
        let doc = document(&[("WOF 1", "0%"), ("WOF 2", "100 %")]);
        assert_eq!(parser().parse(&doc, id(1)).unwrap().percentage, 0);
        assert_eq!(parser().parse(&doc, id(2)).unwrap().percentage, 100);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        let doc = document(&[("WOF 1", "101%"), ("WOF 2", "-1%"), ("WOF 3", "n/a")]);
        for n in 1..=3 {
            let err = parser().parse(&doc, id(n)).unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidOccupancyValue { .. }),
                "facility {} gave {:?}",
                n,
                err
            );
        }
    }

    #[test]
    fn test_parse_invalid_value_carries_name() {
        let doc = document(&[("WOF 3", "<span>voll</span>")]);
        assert_eq!(
            parser().parse(&doc, id(3)),
            Err(ParseError::InvalidOccupancyValue {
                name: "WOF 3".to_string(),
                value: "voll".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_not_found_lists_sorted_ids() {
        let doc = document(&[("WOF 9", "10%"), ("WOF 2", "20%"), ("Sauna", "5%"), ("WOF 2", "30%")]);
        assert_eq!(
            parser().parse(&doc, id(5)),
            Err(ParseError::FacilityNotFound {
                requested: id(5),
                available: vec![id(2), id(9)],
            })
        );
    }

    #[test]
    fn test_parse_not_found_after_invalid_row_for_other_facility() {
        // Rows for other facilities are never validated
        let doc = document(&[("WOF 1", "oops"), ("WOF 4", "40%")]);
        assert_eq!(parser().parse(&doc, id(4)).unwrap().percentage, 40);
    }

    #[test]
    fn test_parse_first_match_wins() {
        let doc = document(&[("WOF 1", "45%"), ("WOF 1", "90%")]);
        assert_eq!(parser().parse(&doc, id(1)).unwrap().percentage, 45);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let doc = "<TABLE><TR><TD>wof7</TD><TD>12%</TD></TR></TABLE>";
        let reading = parser().parse(doc, id(7)).unwrap();
        assert_eq!(reading.name, "wof7");
        assert_eq!(reading.percentage, 12);
    }

    #[test]
    fn test_parse_label_with_suffix_text() {
        let doc = document(&[("WOF 12 Innenstadt", "33%")]);
        let reading = parser().parse(&doc, id(12)).unwrap();
        assert_eq!(reading.name, "WOF 12 Innenstadt");
        // "WOF 1" must not match "WOF 12"
        assert!(matches!(
            parser().parse(&doc, id(1)),
            Err(ParseError::FacilityNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_skips_rows_with_single_cell() {
        let doc = "<table><tr><td>WOF 1</td></tr><tr><td>WOF 1</td><td>15%</td></tr></table>";
        assert_eq!(parser().parse(doc, id(1)).unwrap().percentage, 15);
    }

    #[test]
    fn test_parse_malformed_document() {
        assert_eq!(parser().parse("", id(1)), Err(ParseError::MalformedDocument));
        assert_eq!(
            parser().parse("<tr><td>WOF 1</td><td>5%</td></tr>", id(1)),
            Err(ParseError::MalformedDocument)
        );
        assert_eq!(parser().parse("<table><tr>", id(1)), Err(ParseError::MalformedDocument));
    }

    #[test]
    fn test_parse_table_without_rows() {
        assert_eq!(
            parser().parse("<table></table>", id(1)),
            Err(ParseError::FacilityNotFound {
                requested: id(1),
                available: vec![],
            })
        );
    }

    #[test]
    fn test_custom_label() {
        let parser = TableParser::new("Studio").unwrap();
        let doc = document(&[("Studio 3", "61%")]);
        assert_eq!(parser.parse(&doc, id(3)).unwrap().percentage, 61);
    }
}
