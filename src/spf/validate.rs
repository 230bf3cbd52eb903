use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

use super::{
    mechanism::{Mechanism, MechanismKind},
    parser::parse,
    resolver::is_spf_record,
};

// SPF text is restricted to visible ASCII and spaces.
static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\x20-\x7e]").expect("static pattern compiles"));

/// Syntax checks on a raw record. Returns human readable errors, empty when
/// the record passes.
pub fn validate(record: &str) -> Vec<String> {
    match parse(record) {
        Ok(parsed) => validate_mechanisms(record, &parsed),
        Err(err) => vec![err.to_string()],
    }
}

/// Same as [`validate`] for a record that has already been parsed.
pub fn validate_mechanisms(record: &str, parsed: &[Mechanism]) -> Vec<String> {
    let mut errors = Vec::new();

    if !is_spf_record(record) {
        errors.push("record must start with 'v=spf1'".to_string());
    }

    let forbidden: BTreeSet<char> = FORBIDDEN_CHARS
        .find_iter(record)
        .filter_map(|m| m.as_str().chars().next())
        .collect();
    if !forbidden.is_empty() {
        let listed = forbidden
            .iter()
            .map(|c| format!("{c:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        errors.push(format!("record contains invalid characters: {listed}"));
    }

    let redirects = count_kind(parsed, &MechanismKind::Redirect);
    if redirects > 1 {
        errors.push(format!("at most one 'redirect' allowed, found {redirects}"));
    }

    let alls = count_kind(parsed, &MechanismKind::All);
    if alls > 1 {
        errors.push(format!("at most one 'all' allowed, found {alls}"));
    }

    if alls > 0 && parsed.last().is_some_and(|last| !last.is_all()) {
        errors.push("'all' must be the last mechanism".to_string());
    }

    if redirects > 0 {
        let others = parsed
            .iter()
            .filter(|mechanism| !mechanism.kind().is_modifier())
            .count();
        if others > 0 {
            errors.push("'redirect' cannot be combined with other mechanisms".to_string());
        }
    }

    errors
}

fn count_kind(parsed: &[Mechanism], kind: &MechanismKind) -> usize {
    parsed
        .iter()
        .filter(|mechanism| mechanism.kind() == kind)
        .count()
}
