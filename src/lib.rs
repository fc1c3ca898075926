//! Turns a live web page into a Playwright page object, a Gherkin feature and
//! a runnable test file, with a local LLM doing the reading and writing.
//!
//! Stages run in order per page: navigation, locator extraction, accessor
//! generation, scenario generation, test generation and, optionally,
//! execution. See [`pipeline::orchestrator::Pipeline`].

pub mod browser;
pub mod cli;
pub mod codegen;
pub mod locator;
pub mod naming;
pub mod oracle;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod testgen;
pub mod trace;
