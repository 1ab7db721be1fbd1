// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Progress reporting capability passed into each flow.
//!
//! Flows never print directly; they emit phase transitions and outcomes
//! through a [`Reporter`] so terminal rendering stays replaceable and tests
//! can run silently.

/// Sink accepting phase-transition and outcome messages.
pub trait Reporter: Send + Sync {
    /// A new phase of the flow has started.
    fn phase(&self, message: &str);

    /// Informational output for the user.
    fn info(&self, message: &str);

    /// A step completed successfully.
    fn success(&self, message: &str);

    /// A non-fatal condition worth surfacing.
    fn warn(&self, message: &str);

    /// A step failed.
    fn error(&self, message: &str);
}

/// Reporter printing plain prefixed lines to stdout/stderr.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn phase(&self, message: &str) {
        println!("  ...  {message}");
    }

    fn info(&self, message: &str) {
        println!("  INFO  {message}");
    }

    fn success(&self, message: &str) {
        println!("  OK  {message}");
    }

    fn warn(&self, message: &str) {
        println!("  WARN  {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("  ERROR  {message}");
    }
}

/// Reporter discarding all messages.
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn phase(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
    fn error(&self, _: &str) {}
}
