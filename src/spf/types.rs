use std::fmt;

use super::{
    budget::{LOOKUP_LIMIT, LookupFailure},
    mechanism::{Mechanism, render_record},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOptions {
    lookup_limit: usize,
}

impl FlattenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup_limit(mut self, limit: usize) -> Self {
        self.lookup_limit = limit;
        self
    }

    pub fn lookup_limit(&self) -> usize {
        self.lookup_limit
    }
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            lookup_limit: LOOKUP_LIMIT,
        }
    }
}

/// Outcome of one top-level flatten call.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenResult {
    mechanisms: Vec<Mechanism>,
    lookups: usize,
    skipped_lookups: usize,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Vec::is_empty"))]
    failures: Vec<LookupFailure>,
}

impl FlattenResult {
    pub(crate) fn new(
        mechanisms: Vec<Mechanism>,
        lookups: usize,
        skipped_lookups: usize,
        failures: Vec<LookupFailure>,
    ) -> Self {
        Self {
            mechanisms,
            lookups,
            skipped_lookups,
            failures,
        }
    }

    pub fn mechanisms(&self) -> &[Mechanism] {
        &self.mechanisms
    }

    pub fn into_mechanisms(self) -> Vec<Mechanism> {
        self.mechanisms
    }

    /// TXT queries issued while flattening.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    /// Queries refused because the lookup limit had been reached.
    pub fn skipped_lookups(&self) -> usize {
        self.skipped_lookups
    }

    /// True when part of the include graph was left unresolved.
    pub fn limit_exceeded(&self) -> bool {
        self.skipped_lookups > 0
    }

    pub fn failures(&self) -> &[LookupFailure] {
        &self.failures
    }

    /// Terms of the flattened record that still cost a DNS query at
    /// evaluation time (`a`, `mx`, `ptr`, `exists`, `include`, `redirect`).
    pub fn residual_lookups(&self) -> usize {
        self.mechanisms
            .iter()
            .filter(|mechanism| mechanism.kind().requires_lookup())
            .count()
    }
}

impl fmt::Display for FlattenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_record(&self.mechanisms))
    }
}

/// Verification summary for one domain.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub domain: String,
    pub record_found: bool,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub record: Option<String>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub flattened: Option<String>,
    pub lookups: usize,
    pub lookup_limit: usize,
    pub limit_exceeded: bool,
    pub residual_lookups: usize,
    pub syntax_errors: Vec<String>,
    pub dns_errors: Vec<String>,
}

impl VerifyReport {
    pub(crate) fn missing(domain: String, lookup_limit: usize) -> Self {
        Self {
            domain,
            record_found: false,
            record: None,
            flattened: None,
            lookups: 0,
            lookup_limit,
            limit_exceeded: false,
            residual_lookups: 0,
            syntax_errors: Vec::new(),
            dns_errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.record_found
            && !self.limit_exceeded
            && self.syntax_errors.is_empty()
            && self.dns_errors.is_empty()
    }
}
