use std::str::FromStr;

use trust_dns_resolver::{
    Resolver,
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    lookup::TxtLookup,
};

use super::{SpfError, budget::LookupBudget};

pub(crate) fn normalize_domain(domain: &str) -> Result<String, SpfError> {
    let trimmed = domain.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(SpfError::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(SpfError::idna)
}

/// DNS TXT capability used by the flattener.
///
/// Each returned string is one TXT record with its character strings joined.
/// A name without TXT data should yield an empty list rather than an error.
pub trait LookupTxt {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, SpfError>;
}

impl<T: LookupTxt + ?Sized> LookupTxt for &T {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, SpfError> {
        (**self).lookup_txt(name)
    }
}

impl LookupTxt for Resolver {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, SpfError> {
        let lookup = match Resolver::txt_lookup(self, name) {
            Ok(lookup) => lookup,
            Err(err) => {
                if should_treat_as_empty(&err) {
                    return Ok(Vec::new());
                }
                return Err(SpfError::txt_lookup(name, err));
            }
        };
        collect_txt_records(name, &lookup)
    }
}

fn collect_txt_records(name: &str, lookup: &TxtLookup) -> Result<Vec<String>, SpfError> {
    let mut records = Vec::new();
    for txt in lookup.iter() {
        let mut record = String::new();
        for piece in txt.txt_data().iter() {
            let segment = std::str::from_utf8(piece.as_ref())
                .map_err(|err| SpfError::txt_data_utf8(name, err))?;
            record.push_str(segment);
        }
        records.push(record);
    }
    Ok(records)
}

/// NXDOMAIN and NODATA answers mean "nothing published here". The caller
/// decides what a missing record means; only transport and server failures
/// surface as errors.
fn should_treat_as_empty(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

/// Upstream servers used by [`ResolverChoice::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverChoice {
    /// `/etc/resolv.conf` (or the platform equivalent).
    System,
    /// 8.8.8.8 and 8.8.4.4.
    #[default]
    Google,
    Cloudflare,
    Quad9,
}

impl ResolverChoice {
    pub fn build(self) -> Result<Resolver, SpfError> {
        let config = match self {
            Self::System => return Resolver::from_system_conf().map_err(SpfError::resolver_init),
            Self::Google => ResolverConfig::google(),
            Self::Cloudflare => ResolverConfig::cloudflare(),
            Self::Quad9 => ResolverConfig::quad9(),
        };
        Resolver::new(config, ResolverOpts::default()).map_err(SpfError::resolver_init)
    }
}

impl FromStr for ResolverChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "google" => Ok(Self::Google),
            "cloudflare" => Ok(Self::Cloudflare),
            "quad9" => Ok(Self::Quad9),
            other => Err(format!(
                "unknown resolver '{other}', use: google|cloudflare|quad9|system"
            )),
        }
    }
}

/// True for TXT strings carrying an SPF version tag (`v=spf1` followed by a
/// space or the end of the string).
pub(crate) fn is_spf_record(record: &str) -> bool {
    const VERSION: &str = "v=spf1";
    let trimmed = record.trim_start();
    let Some(head) = trimmed.get(..VERSION.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(VERSION)
        && trimmed[VERSION.len()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
}

fn filter_spf_records(records: Vec<String>) -> Vec<String> {
    records
        .into_iter()
        .filter(|record| is_spf_record(record))
        .map(|record| record.trim().to_string())
        .collect()
}

/// Budget-guarded SPF lookup used while flattening.
///
/// Refuses to query once the budget is spent. Any successful query costs one
/// lookup however many records come back; a failed query costs one lookup
/// too, is noted in the budget and reads as "no records".
pub(crate) fn spf_records<R>(resolver: &R, name: &str, budget: &mut LookupBudget) -> Vec<String>
where
    R: LookupTxt + ?Sized,
{
    if !budget.try_consume() {
        tracing::debug!(
            host = %name,
            limit = budget.limit(),
            "lookup limit reached, skipping TXT query"
        );
        return Vec::new();
    }

    match resolver.lookup_txt(name) {
        Ok(records) => {
            let records = filter_spf_records(records);
            tracing::debug!(
                host = %name,
                found = records.len(),
                used = budget.used(),
                "TXT lookup"
            );
            records
        }
        Err(err) => {
            tracing::warn!(host = %name, error = %err, "TXT lookup failed, treating as empty");
            budget.note_failure(name, err.to_string());
            Vec::new()
        }
    }
}
