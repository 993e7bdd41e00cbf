pub mod auth;
pub mod courses;
pub mod diff;
pub mod grades;
pub mod http;
pub mod output;
pub mod prompt;
pub mod scrape;
