use std::collections::HashSet;

use trust_dns_resolver::Resolver;

use super::{
    SpfError,
    budget::LookupBudget,
    mechanism::{Mechanism, MechanismKind},
    parser::parse,
    resolver::{LookupTxt, ResolverChoice, normalize_domain, spf_records},
    types::{FlattenOptions, FlattenResult, VerifyReport},
    validate::validate_mechanisms,
};

/// Inlines `include` / `redirect` targets of SPF records.
///
/// The resolver is injected so that callers (and tests) decide which DNS
/// servers are queried. Every top-level call gets its own [`LookupBudget`];
/// two calls never share a counter.
#[derive(Debug)]
pub struct Flattener<R = Resolver> {
    resolver: R,
    options: FlattenOptions,
}

impl Flattener<Resolver> {
    /// Flattener backed by the public Google resolvers and default options.
    pub fn new() -> Result<Self, SpfError> {
        Self::from_choice(ResolverChoice::default(), FlattenOptions::default())
    }

    pub fn from_choice(choice: ResolverChoice, options: FlattenOptions) -> Result<Self, SpfError> {
        Ok(Self::with_resolver(choice.build()?).with_options(options))
    }
}

impl<R> Flattener<R>
where
    R: LookupTxt,
{
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            options: FlattenOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FlattenOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FlattenOptions {
        &self.options
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Installs another resolver and hands back the previous one.
    pub fn set_resolver(&mut self, resolver: R) -> R {
        std::mem::replace(&mut self.resolver, resolver)
    }

    /// SPF records published at `domain`, charged to `budget` like any
    /// other lookup of the record tree. A resolver failure reads as "no
    /// records" and is noted in the budget.
    pub fn lookup_spf(
        &self,
        domain: &str,
        budget: &mut LookupBudget,
    ) -> Result<Vec<String>, SpfError> {
        let ascii = normalize_domain(domain)?;
        Ok(spf_records(&self.resolver, &ascii, budget))
    }

    /// Flattens an already parsed record with a fresh lookup budget.
    pub fn flatten(&self, parsed: &[Mechanism], domain: &str) -> FlattenResult {
        let mut budget = self.budget();
        let mechanisms = self.flatten_with_budget(parsed, domain, &mut budget);
        finish(mechanisms, budget)
    }

    /// Flattens `parsed`, charging lookups to a caller-owned budget.
    ///
    /// The first `v` term of `parsed` leads the result and at most one `all`
    /// closes it.
    pub fn flatten_with_budget(
        &self,
        parsed: &[Mechanism],
        domain: &str,
        budget: &mut LookupBudget,
    ) -> Vec<Mechanism> {
        let version = parsed.iter().find(|mechanism| mechanism.is_version());
        let flattened = settle_all(self.flatten_at(parsed, domain, budget));

        let mut out = Vec::with_capacity(flattened.len() + 1);
        out.extend(version.cloned());
        out.extend(flattened);
        out
    }

    /// Looks up, parses and flattens the SPF record of `domain`. The
    /// subject's own TXT query counts toward the lookup limit.
    pub fn flatten_domain(&self, domain: &str) -> Result<FlattenResult, SpfError> {
        let ascii = normalize_domain(domain)?;
        let mut budget = self.budget();
        let records = self.lookup_spf(&ascii, &mut budget)?;
        let record = first_record(&ascii, records).ok_or_else(|| SpfError::missing_record(&ascii))?;
        let parsed = parse(&record)?;
        let mechanisms = self.flatten_with_budget(&parsed, &ascii, &mut budget);
        Ok(finish(mechanisms, budget))
    }

    /// Flattens the record of `domain` and collects syntax, lookup-limit and
    /// DNS findings. A missing or unresolvable record is reported, not
    /// returned as an error.
    pub fn verify(&self, domain: &str) -> Result<VerifyReport, SpfError> {
        let ascii = normalize_domain(domain)?;
        let lookup_limit = self.options.lookup_limit();
        let mut budget = self.budget();
        let records = self.lookup_spf(&ascii, &mut budget)?;
        let count = records.len();
        let Some(record) = first_record(&ascii, records) else {
            let mut report = VerifyReport::missing(ascii, lookup_limit);
            report.lookups = budget.used();
            report.dns_errors = describe_failures(&finish(Vec::new(), budget));
            return Ok(report);
        };

        let parsed = parse(&record)?;
        let mut syntax_errors = Vec::new();
        if count > 1 {
            syntax_errors.push(format!("multiple SPF records found ({count})"));
        }
        syntax_errors.extend(validate_mechanisms(&record, &parsed));

        let mechanisms = self.flatten_with_budget(&parsed, &ascii, &mut budget);
        let result = finish(mechanisms, budget);

        Ok(VerifyReport {
            domain: ascii,
            record_found: true,
            flattened: Some(result.to_string()),
            record: Some(record),
            lookups: result.lookups(),
            lookup_limit,
            limit_exceeded: result.limit_exceeded(),
            residual_lookups: result.residual_lookups(),
            syntax_errors,
            dns_errors: describe_failures(&result),
        })
    }

    fn budget(&self) -> LookupBudget {
        LookupBudget::with_limit(self.options.lookup_limit())
    }

    fn flatten_at(
        &self,
        parsed: &[Mechanism],
        domain: &str,
        budget: &mut LookupBudget,
    ) -> Vec<Mechanism> {
        let mut merged = Vec::new();
        let mut own_all = None;

        for mechanism in parsed {
            match mechanism.kind() {
                MechanismKind::Version => {}
                MechanismKind::Redirect => {
                    let target = mechanism.value();
                    let records = spf_records(&self.resolver, target, budget);
                    let Some(record) = records.first() else {
                        tracing::debug!(domain, to = %target, "redirect target unresolved");
                        return Vec::new();
                    };
                    tracing::debug!(domain, to = %target, "following redirect");
                    return self.descend(record, target, budget);
                }
                MechanismKind::Include => {
                    let target = mechanism.value();
                    for record in spf_records(&self.resolver, target, budget) {
                        tracing::debug!(domain, to = %target, "inlining include");
                        merged.extend(
                            self.descend(&record, target, budget)
                                .into_iter()
                                .filter(|inner| !inner.is_version()),
                        );
                    }
                }
                MechanismKind::All => own_all = Some(mechanism.clone()),
                _ => merged.push(mechanism.clone()),
            }
        }

        let mut merged = dedup(merged);
        if let Some(all) = own_all {
            merged.retain(|mechanism| !mechanism.is_all());
            merged.push(all);
        }
        merged
    }

    fn descend(&self, record: &str, domain: &str, budget: &mut LookupBudget) -> Vec<Mechanism> {
        match parse(record) {
            Ok(parsed) => self.flatten_at(&parsed, domain, budget),
            Err(err) => {
                tracing::warn!(domain, error = %err, "unparsable SPF record");
                Vec::new()
            }
        }
    }
}

fn finish(mechanisms: Vec<Mechanism>, budget: LookupBudget) -> FlattenResult {
    let (used, skipped, failures) = budget.into_parts();
    FlattenResult::new(mechanisms, used, skipped, failures)
}

fn describe_failures(result: &FlattenResult) -> Vec<String> {
    result
        .failures()
        .iter()
        .map(|failure| format!("{}: {}", failure.name, failure.reason))
        .collect()
}

fn first_record(domain: &str, records: Vec<String>) -> Option<String> {
    if records.len() > 1 {
        tracing::warn!(
            domain,
            count = records.len(),
            "multiple SPF records published, using the first"
        );
    }
    records.into_iter().next()
}

fn dedup(mechanisms: Vec<Mechanism>) -> Vec<Mechanism> {
    let mut seen = HashSet::new();
    mechanisms
        .into_iter()
        .filter(|mechanism| seen.insert(mechanism.clone()))
        .collect()
}

// Sibling includes may each contribute an `all`. Only the first one can ever
// match, so it is kept and moved to the end.
fn settle_all(mut mechanisms: Vec<Mechanism>) -> Vec<Mechanism> {
    let Some(position) = mechanisms.iter().position(Mechanism::is_all) else {
        return mechanisms;
    };
    let all = mechanisms.remove(position);
    mechanisms.retain(|mechanism| !mechanism.is_all());
    mechanisms.push(all);
    mechanisms
}
