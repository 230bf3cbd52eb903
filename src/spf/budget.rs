/// DNS lookups allowed while evaluating one SPF record tree (RFC 7208 §4.6.4).
pub const LOOKUP_LIMIT: usize = 10;

/// A TXT lookup that failed during flattening and was treated as empty.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub name: String,
    pub reason: String,
}

/// Lookup counter shared by one top-level flatten call and all of its
/// recursive steps.
///
/// `used` only grows. Once it reaches `limit`, every further lookup is
/// refused and counted in `skipped` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupBudget {
    used: usize,
    limit: usize,
    skipped: usize,
    failures: Vec<LookupFailure>,
}

impl LookupBudget {
    pub fn new() -> Self {
        Self::with_limit(LOOKUP_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            used: 0,
            limit,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn failures(&self) -> &[LookupFailure] {
        &self.failures
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    /// Reserves one lookup. Returns `false`, without consuming anything, when
    /// the ceiling has already been reached.
    pub(crate) fn try_consume(&mut self) -> bool {
        if self.is_exhausted() {
            self.skipped += 1;
            return false;
        }
        self.used += 1;
        true
    }

    pub(crate) fn note_failure(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(LookupFailure {
            name: name.into(),
            reason: reason.into(),
        });
    }

    pub(crate) fn into_parts(self) -> (usize, usize, Vec<LookupFailure>) {
        (self.used, self.skipped, self.failures)
    }
}

impl Default for LookupBudget {
    fn default() -> Self {
        Self::new()
    }
}
