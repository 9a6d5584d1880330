// Testing Tools Library
//
// Smoke-test harness for the task-management backend: signs in, creates tasks
// through the REST API and the AI chat endpoint, and compares the project's
// task list before and after.

pub mod api_client;
pub mod auth;
pub mod error;
pub mod models;
pub mod output;
pub mod scenarios;
pub mod snapshot;

pub use error::{Error, ErrorKind};
