use log::debug;
use scraper::{ElementRef, Html, Selector};

use crate::config::Portal;
use crate::errors::{FetchFailure, ParseFailure};
use crate::models::{Course, GradeItem, SessionToken, NO_MAX};
use crate::utils::http::HttpClient;

/// Text the portal only shows on the grader (instructor/TA) variant of the report.
const GRADER_REPORT_MARKER: &str = "Grader report";

// The portal renders ranges as "0&ndash;10"; an ASCII '-' is never a separator.
const RANGE_SEPARATORS: [char; 2] = ['\u{2013}', '\u{2014}'];

#[derive(Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    Graded(Course),
    InstructorView,
}

fn cell_text(row: &ElementRef, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(|cell| cell.text().collect::<String>().trim().to_string())
}

/// Maximum score from a range cell, or `"NA"` when there is none.
pub fn max_from_range(range: &str) -> String {
    range
        .trim()
        .split(RANGE_SEPARATORS)
        .last()
        .map(str::trim)
        .filter(|max| !max.is_empty())
        .unwrap_or(NO_MAX)
        .to_string()
}

/// Turns a grade report page into a `Course`.
///
/// Rows with a blank item name are dropped before the first remaining row is taken as the
/// course name, so stray empty rows never shift the classification.
pub fn parse_grade_report(document: &Html, id: &str) -> Result<ReportOutcome, ParseFailure> {
    let full_text: String = document.root_element().text().collect();
    if full_text.contains(GRADER_REPORT_MARKER) {
        return Ok(ReportOutcome::InstructorView);
    }

    let row_selector = Selector::parse("table.user-grade tbody tr").expect("static selector");
    let name_selector = Selector::parse(".column-itemname").expect("static selector");
    let grade_selector = Selector::parse("td.column-grade").expect("static selector");
    let range_selector = Selector::parse("td.column-range").expect("static selector");

    let mut rows = document.select(&row_selector).filter_map(|row| {
        let name = cell_text(&row, &name_selector).filter(|name| !name.is_empty())?;
        Some((row, name))
    });

    let (_, course_name) = rows
        .next()
        .ok_or(ParseFailure::MissingExpectedElement("course name row"))?;

    let items: Vec<GradeItem> = rows
        .map(|(row, name)| {
            let grade = cell_text(&row, &grade_selector).unwrap_or_default();
            let range = cell_text(&row, &range_selector).unwrap_or_default();
            GradeItem { name, grade, max: max_from_range(&range) }
        })
        .collect();

    debug!("Course {} ({}) has {} grade items", course_name, id, items.len());
    Ok(ReportOutcome::Graded(Course { id: id.to_string(), name: course_name, items }))
}

/// Downloads the grade report page of one course.
pub async fn fetch_grade_report<C: HttpClient + ?Sized>(
    client: &C,
    portal: &Portal,
    token: &SessionToken,
    id: &str,
) -> Result<Html, FetchFailure> {
    let response = client
        .get(
            &portal.grade_report_url,
            &[(portal.session_cookie.as_str(), token.as_str())],
            &[("id", id)],
        )
        .await?;
    if !response.is_success() {
        return Err(FetchFailure::HttpError { status: response.status, body: response.body });
    }
    Ok(Html::parse_document(&response.body))
}
