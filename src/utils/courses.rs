use std::collections::HashSet;

use log::{info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::config::Portal;
use crate::errors::FetchFailure;
use crate::models::{CourseId, SessionToken};
use crate::utils::http::HttpClient;

/// Course ids linked from the enrolled-course boxes of the landing page, in page order.
///
/// Boxes without a usable `id` and repeated ids are logged and left out.
pub fn parse_course_ids(html: &str, page_url: &str) -> Vec<CourseId> {
    let document = Html::parse_document(html);
    let container_selector = Selector::parse(".coursebox").expect("static selector");
    let anchor_selector = Selector::parse("a[href]").expect("static selector");
    let base = Url::parse(page_url).ok();

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for (index, container) in document.select(&container_selector).enumerate() {
        let Some(href) = container
            .select(&anchor_selector)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
        else {
            warn!("Course box #{} has no link, skipping it", index);
            continue;
        };

        let resolved = match &base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        let id = resolved.ok().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
        });

        match id {
            Some(id) if seen.insert(id.clone()) => ids.push(id),
            Some(id) => warn!("Course {} is listed more than once, keeping the first", id),
            None => warn!("Course box #{} links to {:?} which has no course id, skipping it", index, href),
        }
    }
    ids
}

/// Fetches the landing page and lists the enrolled courses.
pub async fn list_courses<C: HttpClient + ?Sized>(
    client: &C,
    portal: &Portal,
    token: &SessionToken,
) -> Result<Vec<CourseId>, FetchFailure> {
    let response = client
        .get(&portal.courses_url, &[(portal.session_cookie.as_str(), token.as_str())], &[])
        .await?;
    if !response.is_success() {
        return Err(FetchFailure::HttpError { status: response.status, body: response.body });
    }

    let page_url = if response.final_url.is_empty() { &portal.courses_url } else { &response.final_url };
    let ids = parse_course_ids(&response.body, page_url);
    info!("Found {} enrolled courses", ids.len());
    Ok(ids)
}
