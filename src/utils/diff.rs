use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::models::{GradeDiff, ScrapeResult};
use crate::utils::output::load_result;

/// Loads a previous export; a missing or empty file means there is nothing to compare against.
pub fn load_previous(path: &Path) -> Result<Option<ScrapeResult>> {
    let non_empty = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    if !non_empty {
        return Ok(None);
    }
    load_result(path).map(Some)
}

// Items match on course id + item name. The same name twice in one course pairs up in order.
pub fn diff_grades(previous: &ScrapeResult, current: &ScrapeResult) -> Vec<GradeDiff> {
    let mut diffs = Vec::new();

    for course in &current.courses {
        let old_course = previous.courses.iter().find(|c| c.id == course.id);
        let mut used = vec![false; old_course.map_or(0, |c| c.items.len())];

        for item in &course.items {
            let old_item = old_course.and_then(|old| {
                let index = old
                    .items
                    .iter()
                    .enumerate()
                    .position(|(i, g)| !used[i] && g.name == item.name)?;
                used[index] = true;
                Some(&old.items[index])
            });

            match old_item {
                Some(old) if old.grade == item.grade => {}
                Some(old) => diffs.push(GradeDiff {
                    course: course.name.clone(),
                    name: item.name.clone(),
                    previous: Some(old.grade.clone()),
                    grade: item.grade.clone(),
                }),
                None => diffs.push(GradeDiff {
                    course: course.name.clone(),
                    name: item.name.clone(),
                    previous: None,
                    grade: item.grade.clone(),
                }),
            }
        }
    }

    diffs
}

pub fn format_diff(diff: &GradeDiff) -> String {
    match &diff.previous {
        Some(previous) => format!("{} / {}: {} -> {}", diff.course, diff.name, previous, diff.grade),
        None => format!("{} / {}: new grade {}", diff.course, diff.name, diff.grade),
    }
}
