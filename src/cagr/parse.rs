//! Result table parsing.
//!
//! Every result row of the search page is a `<tr>` with 14 `<td>` cells:
//!
//! | # | content                                   |
//! |---|-------------------------------------------|
//! | 3 | course id                                 |
//! | 4 | class id                                  |
//! | 5 | course name, then one `[label]` per line  |
//! | 6 | class hours                               |
//! | 7 | capacity                                  |
//! | 8 | enrolled                                  |
//! | 9 | special students                          |
//! | 11| waiting list                              |
//! | 12| schedule, one entry per line              |
//! | 13| professors, one per line                  |
//!
//! Cells 0-2 and 10 carry nothing the crawler keeps.

use html_scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::cagr::errors::{ParseError, PipelineError, ProtocolError, RowError};
use crate::cagr::models::{Class, CourseFields, Offering, Page};
use crate::cagr::schedule::parse_schedule;

/// Number of cells in a result row.
pub const ROW_CELLS: usize = 14;

const RESULTS_TBODY_ID: &str = "formBusca:dataTable:tb";

static RESULTS_TBODY: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!(r#"tbody[id="{RESULTS_TBODY_ID}"]"#)).unwrap()
});

/// What to do with a row that does not fit the row schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowPolicy {
    /// The page, and with it the pipeline, fails.
    #[default]
    Strict,
    /// The row is logged and skipped.
    Lenient,
}

/// Parse every result row of a page.
pub fn parse_page(page: &Page, policy: RowPolicy) -> Result<Vec<Offering>, PipelineError> {
    let document = Html::parse_document(&page.body);
    let tbody = document
        .select(&RESULTS_TBODY)
        .next()
        .ok_or(ProtocolError::MissingElement(RESULTS_TBODY_ID))?;

    let mut offerings = Vec::new();
    for (row, tr) in child_elements(tbody, "tr").enumerate() {
        let cells: Vec<String> = child_elements(tr, "td").map(cell_text).collect();

        match parse_row(&cells) {
            Ok(offering) => offerings.push(offering),
            Err(source) => {
                let err = RowError { row, source };
                match policy {
                    RowPolicy::Strict => {
                        return Err(PipelineError::Parse {
                            page: page.index,
                            source: err,
                        });
                    }
                    RowPolicy::Lenient => {
                        warn!(page = page.index, error = %err, "Skipping malformed row");
                    }
                }
            }
        }
    }

    debug!(
        page = page.index,
        rows = offerings.len(),
        "Parsed page contents"
    );
    Ok(offerings)
}

/// Map the text of one row's cells onto an [`Offering`].
pub fn parse_row(cells: &[String]) -> Result<Offering, ParseError> {
    let [
        _,
        _,
        _,
        course_id,
        class_id,
        name_and_labels,
        class_hours,
        capacity,
        enrolled,
        special,
        _,
        waiting,
        schedule,
        professors,
    ] = cells
    else {
        return Err(ParseError::Arity {
            expected: ROW_CELLS,
            found: cells.len(),
        });
    };

    let course_id = required("course_id", course_id)?;
    let class_id = required("class_id", class_id)?;

    let mut lines = name_and_labels.lines();
    let name = required("course_name", lines.next().unwrap_or_default())?;
    let labels = lines
        .map(|label| label.trim().trim_matches(['[', ']']).to_string())
        .filter(|label| !label.is_empty())
        .collect();

    Ok(Offering {
        course_id,
        course: CourseFields {
            name,
            class_hours: parse_count("class_hours", class_hours)?,
        },
        class_id,
        class: Class {
            labels,
            capacity: parse_count("capacity", capacity)?,
            enrolled: parse_count("enrolled", enrolled)?,
            special: parse_count("special", special)?,
            waiting: parse_count("waiting", waiting)?,
            schedule: parse_schedule(schedule),
            professors: professors.lines().map(str::to_string).collect(),
        },
    })
}

fn required(field: &'static str, value: &str) -> Result<String, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Empty cells mean "no value", which is not the same as zero.
fn parse_count(field: &'static str, value: &str) -> Result<Option<u32>, ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Text nodes of a cell, trimmed, without blanks, one per line.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (course_id, class_id, name_cell, hours, capacity, enrolled, special, waiting, schedule, professors)
    type RowCells<'a> = (
        &'a str,
        &'a str,
        &'a str,
        &'a str,
        &'a str,
        &'a str,
        &'a str,
        &'a str,
        &'a str,
        &'a str,
    );

    fn build_row(cells: RowCells<'_>) -> String {
        let (course, class, name, hours, cap, enr, spe, wait, sched, prof) = cells;
        format!(
            "<tr><td>1</td><td><input type=\"checkbox\"/></td><td>x</td>\
             <td>{course}</td><td>{class}</td><td>{name}</td><td>{hours}</td>\
             <td>{cap}</td><td>{enr}</td><td>{spe}</td><td>0</td><td>{wait}</td>\
             <td>{sched}</td><td>{prof}</td></tr>"
        )
    }

    fn build_page(rows: &[String]) -> Page {
        Page {
            index: 1,
            body: format!(
                "<html><body><table><tbody id=\"formBusca:dataTable:tb\">{}</tbody></table></body></html>",
                rows.concat()
            ),
        }
    }

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_page_full_row() {
        let page = build_page(&[build_row((
            "INE5401",
            "01208A",
            "Introdução à Computação<br/>[PRESENCIAL]<br/>[Ênfase]",
            "36",
            "40",
            "38",
            "1",
            "",
            "2.0730-2 / CTC-CTC107<br/>4.0730-2 / CTC-CTC107",
            "Fulano de Tal<br/>Beltrana Silva",
        ))]);

        let offerings = parse_page(&page, RowPolicy::Strict).unwrap();
        assert_eq!(offerings.len(), 1);
        let offering = &offerings[0];
        assert_eq!(offering.course_id, "INE5401");
        assert_eq!(offering.class_id, "01208A");
        assert_eq!(offering.course.name, "Introdução à Computação");
        assert_eq!(offering.course.class_hours, Some(36));
        assert_eq!(offering.class.labels, vec!["PRESENCIAL", "Ênfase"]);
        assert_eq!(offering.class.capacity, Some(40));
        assert_eq!(offering.class.enrolled, Some(38));
        assert_eq!(offering.class.special, Some(1));
        assert_eq!(offering.class.waiting, None);
        assert_eq!(offering.class.schedule.len(), 2);
        assert_eq!(offering.class.schedule[1].weekday, 2);
        assert_eq!(
            offering.class.professors,
            vec!["Fulano de Tal", "Beltrana Silva"]
        );
    }

    #[test]
    fn test_parse_page_nested_markup_in_cells() {
        let page = build_page(&[build_row((
            "<a href=\"#\">MTM3101</a>",
            " 01101 ",
            "<span>Cálculo 1</span>",
            "72",
            "50",
            "0",
            "0",
            "0",
            "",
            "",
        ))]);

        let offerings = parse_page(&page, RowPolicy::Strict).unwrap();
        assert_eq!(offerings[0].course_id, "MTM3101");
        assert_eq!(offerings[0].class_id, "01101");
        assert_eq!(offerings[0].class.enrolled, Some(0));
        assert!(offerings[0].class.labels.is_empty());
        assert!(offerings[0].class.schedule.is_empty());
        assert!(offerings[0].class.professors.is_empty());
    }

    #[test]
    fn test_parse_page_missing_tbody() {
        let page = Page {
            index: 2,
            body: "<html><body><p>Sessão expirada</p></body></html>".to_string(),
        };
        let err = parse_page(&page, RowPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Protocol(ProtocolError::MissingElement(RESULTS_TBODY_ID))
        ));
    }

    #[test]
    fn test_parse_page_empty_table() {
        let page = build_page(&[]);
        assert!(parse_page(&page, RowPolicy::Strict).unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_strict_fails_on_bad_row() {
        let good = build_row((
            "INE5401", "01208A", "Intro", "36", "40", "38", "", "", "", "",
        ));
        let bad = build_row((
            "INE5402", "01208B", "POO", "72", "quarenta", "", "", "", "", "",
        ));
        let mut page = build_page(&[good, bad]);
        page.index = 4;

        let err = parse_page(&page, RowPolicy::Strict).unwrap_err();
        match err {
            PipelineError::Parse { page, source } => {
                assert_eq!(page, 4);
                assert_eq!(source.row, 1);
                assert_eq!(
                    source.source,
                    ParseError::InvalidNumber {
                        field: "capacity",
                        value: "quarenta".to_string()
                    }
                );
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_page_lenient_skips_bad_row() {
        let good = build_row((
            "INE5401", "01208A", "Intro", "36", "40", "38", "", "", "", "",
        ));
        let short = "<tr><td>only</td><td>three</td><td>cells</td></tr>".to_string();
        let page = build_page(&[short, good]);

        let offerings = parse_page(&page, RowPolicy::Lenient).unwrap();
        assert_eq!(offerings.len(), 1);
        assert_eq!(offerings[0].class_id, "01208A");
    }

    #[test]
    fn test_parse_row_arity() {
        let err = parse_row(&cells(&["a", "b"])).unwrap_err();
        assert_eq!(
            err,
            ParseError::Arity {
                expected: 14,
                found: 2
            }
        );

        let mut too_many = cells(&["x"; 14]);
        too_many.push("extra".to_string());
        assert!(matches!(
            parse_row(&too_many),
            Err(ParseError::Arity { found: 15, .. })
        ));
    }

    #[test]
    fn test_parse_row_empty_numeric_cells_are_absent() {
        let row = cells(&[
            "", "", "", "EEL7011", "01", "Circuitos", "", "", "", "", "", "", "", "",
        ]);
        let offering = parse_row(&row).unwrap();
        assert_eq!(offering.course.class_hours, None);
        assert_eq!(offering.class.capacity, None);
        assert_eq!(offering.class.enrolled, None);
        assert_eq!(offering.class.special, None);
        assert_eq!(offering.class.waiting, None);
    }

    #[test]
    fn test_parse_row_zero_is_kept() {
        let row = cells(&[
            "", "", "", "EEL7011", "01", "Circuitos", "0", "0", "0", "0", "", "0", "", "",
        ]);
        let offering = parse_row(&row).unwrap();
        assert_eq!(offering.class.capacity, Some(0));
        assert_eq!(offering.class.waiting, Some(0));
    }

    #[test]
    fn test_parse_row_missing_ids() {
        let row = cells(&[
            "", "", "", "", "01", "Circuitos", "", "", "", "", "", "", "", "",
        ]);
        assert_eq!(
            parse_row(&row).unwrap_err(),
            ParseError::MissingField("course_id")
        );

        let row = cells(&[
            "", "", "", "EEL7011", "01", "", "", "", "", "", "", "", "", "",
        ]);
        assert_eq!(
            parse_row(&row).unwrap_err(),
            ParseError::MissingField("course_name")
        );
    }

    #[test]
    fn test_parse_row_negative_number_rejected() {
        let row = cells(&[
            "", "", "", "EEL7011", "01", "Circuitos", "-4", "", "", "", "", "", "", "",
        ]);
        assert!(matches!(
            parse_row(&row),
            Err(ParseError::InvalidNumber {
                field: "class_hours",
                ..
            })
        ));
    }
}
