use std::time::Duration;

use log::{error, info};

use crate::config::{Config, FailurePolicy, Portal};
use crate::errors::{AuthFailure, CourseFailure, ScrapeError};
use crate::models::{CourseId, ScrapeResult, SessionToken};
use crate::utils::auth::authenticate;
use crate::utils::courses::list_courses;
use crate::utils::grades::{fetch_grade_report, parse_grade_report, ReportOutcome};
use crate::utils::http::HttpClient;
use crate::utils::output::ResultSink;
use crate::utils::prompt::CredentialSource;

#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub result: ScrapeResult,
    /// Courses shown with the grader report, i.e. taught rather than taken.
    pub instructor_views: Vec<CourseId>,
    pub failures: Vec<(CourseId, CourseFailure)>,
}

/// Runs the whole login, listing and grade collection sequence, one request at a time.
pub struct Scraper<'a, C: HttpClient + ?Sized> {
    client: &'a C,
    portal: &'a Portal,
    login_timeout: Duration,
    policy: FailurePolicy,
}

impl<'a, C: HttpClient + ?Sized> Scraper<'a, C> {
    pub fn new(client: &'a C, config: &'a Config) -> Self {
        Scraper {
            client,
            portal: &config.portal,
            login_timeout: config.login_timeout,
            policy: config.on_course_error,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn course(&self, token: &SessionToken, id: &str) -> Result<ReportOutcome, CourseFailure> {
        let document = fetch_grade_report(self.client, self.portal, token, id).await?;
        Ok(parse_grade_report(&document, id)?)
    }

    /// Fetches and parses every listed course in order.
    pub async fn collect(&self, token: &SessionToken) -> Result<ScrapeReport, ScrapeError> {
        let ids = list_courses(self.client, self.portal, token)
            .await
            .map_err(ScrapeError::Listing)?;

        let mut report = ScrapeReport::default();
        for id in ids {
            match self.course(token, &id).await {
                Ok(ReportOutcome::Graded(course)) => {
                    info!("Grade report fetched for {} ({})", course.name, id);
                    report.result.courses.push(course);
                }
                Ok(ReportOutcome::InstructorView) => {
                    info!("Course {} shows the grader report, skipping it", id);
                    report.instructor_views.push(id);
                }
                Err(e) if self.policy == FailurePolicy::Abort => {
                    return Err(ScrapeError::Course { id, source: e });
                }
                Err(e) => {
                    error!("Course {} failed: {}", id, e);
                    report.failures.push((id, e));
                }
            }
        }
        Ok(report)
    }

    /// Logs in through `source`, collects all courses and hands the result to every sink.
    ///
    /// Without a fixed `verbose` choice, `source` is asked once the login has succeeded.
    pub async fn run<S: CredentialSource + ?Sized>(
        &self,
        source: &mut S,
        verbose: Option<bool>,
        sinks: &mut [&mut dyn ResultSink],
    ) -> Result<ScrapeReport, ScrapeError> {
        let token = authenticate(self.client, source, self.portal, self.login_timeout).await?;
        let verbose = match verbose {
            Some(verbose) => verbose,
            None => source.verbose().map_err(AuthFailure::Prompt)?,
        };
        let report = self.collect(&token).await?;
        for sink in sinks.iter_mut() {
            sink.emit(&report.result, verbose).map_err(ScrapeError::Sink)?;
        }
        Ok(report)
    }
}
