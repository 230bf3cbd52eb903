use super::{
    SpfError,
    mechanism::{Mechanism, MechanismKind, Qualifier},
};

/// Splits a raw SPF record into its mechanisms, in source order.
///
/// This is a purely lexical pass: unknown terms are kept as
/// [`MechanismKind::Unknown`] / [`MechanismKind::UnknownModifier`] and nothing
/// is rejected on semantic grounds. Only an empty record is an error.
pub fn parse(record: &str) -> Result<Vec<Mechanism>, SpfError> {
    if record.trim().is_empty() {
        return Err(SpfError::InvalidInput);
    }
    Ok(record.split_whitespace().map(parse_term).collect())
}

fn parse_term(token: &str) -> Mechanism {
    let mut chars = token.chars();
    let (qualifier, rest) = match chars.next().and_then(Qualifier::from_char) {
        Some(qualifier) if !chars.as_str().is_empty() => (qualifier, chars.as_str()),
        // a lone qualifier is kept whole as an opaque term
        _ => (Qualifier::Pass, token),
    };

    if let Some((name, value)) = rest.split_once(':') {
        return Mechanism::new(qualifier, MechanismKind::from_name(name, false), value);
    }
    if let Some((name, value)) = rest.split_once('=') {
        return Mechanism::new(qualifier, MechanismKind::from_name(name, true), value);
    }

    let kind = MechanismKind::from_name(rest, false);
    let value = if kind == MechanismKind::All { "all" } else { "" };
    Mechanism::new(qualifier, kind, value)
}
