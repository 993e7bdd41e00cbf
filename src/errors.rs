//! Error types for the portal client and the grade scraping pipeline.

use crate::models::CourseId;

#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },
    #[error("request timed out")]
    Timeout,
    #[error("network error")]
    Network(#[source] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("login request timed out")]
    Timeout,
    #[error("malformed login response: {0}")]
    MalformedResponse(String),
    #[error("login response carried no session cookie")]
    NoSessionCookie,
    #[error("credentials were rejected and no further attempts are available")]
    InvalidCredentials,
    #[error("login request failed")]
    Network(#[source] FetchFailure),
    #[error("could not read credentials")]
    Prompt(#[source] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("grade report is missing {0}")]
    MissingExpectedElement(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum CourseFailure {
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    #[error(transparent)]
    Parse(#[from] ParseFailure),
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),
    #[error("failed to list enrolled courses")]
    Listing(#[source] FetchFailure),
    #[error("course {id} failed")]
    Course {
        id: CourseId,
        #[source]
        source: CourseFailure,
    },
    #[error("failed to deliver results")]
    Sink(#[source] anyhow::Error),
}
