//! Test Module
//!
//! Cross-module test suite for the Sehhamate core.
//!
//! ## Test Categories
//! - `engine_tests`: classifier and composer properties across modules
//! - `responder_tests`: remote model, local rules and fallback composition
//! - `document_tests`: validation verdicts and the upload pipeline
//! - `concurrency_tests`: many callers hitting the shared tables at once

mod document_tests;
mod engine_tests;
mod responder_tests;
