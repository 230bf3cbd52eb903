use anyhow::{Context, Result, bail};

use crate::args::Cli;
use spf_flatten::{FlattenResult, VerifyReport};

pub fn write_flattened(result: &FlattenResult, path: Option<&str>, cli: &Cli) -> Result<()> {
    let rendered = match cli.format.as_str() {
        "human" => format!("{result}\n"),
        "json" => flattened_json(result)?,
        "csv" => flattened_csv(result)?,
        other => bail!("unknown --format '{other}', use: human|json|csv"),
    };

    match path {
        Some(path) => {
            write_all_atomically(path, rendered.as_bytes())?;
            tracing::info!(path, lookups = result.lookups(), "flattened record written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

pub fn write_report(report: &VerifyReport, cli: &Cli) -> Result<()> {
    match cli.format.as_str() {
        "human" => {
            for line in human_lines(report) {
                println!("{line}");
            }
            Ok(())
        }
        "json" => {
            print!("{}", report_json(report)?);
            Ok(())
        }
        "csv" => bail!("format=csv ne s'applique qu'à la sous-commande flatten"),
        other => bail!("unknown --format '{other}', use: human|json|csv"),
    }
}

/// Turns a report without record into an error so the process exits with 1.
pub fn ensure_record_found(report: &VerifyReport) -> Result<()> {
    if !report.record_found {
        bail!("no SPF record found for {}", report.domain);
    }
    Ok(())
}

fn human_lines(report: &VerifyReport) -> Vec<String> {
    let mut lines = vec![
        format!("domain={}", report.domain),
        format!("record_found={}", report.record_found),
    ];
    if let Some(record) = &report.record {
        lines.push(format!("record={record}"));
    }
    if let Some(flattened) = &report.flattened {
        lines.push(format!("flattened={flattened}"));
    }
    lines.push(format!("lookups={}/{}", report.lookups, report.lookup_limit));
    lines.push(format!("limit_exceeded={}", report.limit_exceeded));
    lines.push(format!("residual_lookups={}", report.residual_lookups));
    push_list(&mut lines, "syntax_errors", &report.syntax_errors);
    push_list(&mut lines, "dns_errors", &report.dns_errors);
    lines
}

fn push_list(lines: &mut Vec<String>, label: &str, items: &[String]) {
    if items.is_empty() {
        lines.push(format!("{label}=none"));
    } else {
        lines.push(format!("{label}:"));
        for item in items {
            lines.push(format!("  - {item}"));
        }
    }
}

#[cfg(feature = "with-serde")]
fn flattened_json(result: &FlattenResult) -> Result<String> {
    let mut s = serde_json::to_string_pretty(result)?;
    s.push('\n');
    Ok(s)
}

#[cfg(not(feature = "with-serde"))]
fn flattened_json(_: &FlattenResult) -> Result<String> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn report_json(report: &VerifyReport) -> Result<String> {
    let mut s = serde_json::to_string_pretty(report)?;
    s.push('\n');
    Ok(s)
}

#[cfg(not(feature = "with-serde"))]
fn report_json(_: &VerifyReport) -> Result<String> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn flattened_csv(result: &FlattenResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["qualifier", "type", "value"])?;
    for mechanism in result.mechanisms() {
        wtr.write_record([
            mechanism.qualifier().to_string().as_str(),
            mechanism.kind().as_str(),
            mechanism.value(),
        ])?;
    }
    let data = wtr.into_inner()?;
    Ok(String::from_utf8(data)?)
}

#[cfg(not(feature = "with-csv"))]
fn flattened_csv(_: &FlattenResult) -> Result<String> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp).with_context(|| format!("create {tmp}"))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(record_found: bool) -> VerifyReport {
        VerifyReport {
            domain: "example.com".to_string(),
            record_found,
            record: record_found.then(|| "v=spf1 include:_spf.example.net -all".to_string()),
            flattened: record_found.then(|| "v=spf1 ip4:192.0.2.1 -all".to_string()),
            lookups: 2,
            lookup_limit: 10,
            limit_exceeded: false,
            residual_lookups: 0,
            syntax_errors: Vec::new(),
            dns_errors: vec!["_spf.example.org: SERVFAIL".to_string()],
        }
    }

    #[test]
    fn human_lines_list_report_fields() {
        let lines = human_lines(&report(true));
        assert_eq!(
            lines,
            vec![
                "domain=example.com",
                "record_found=true",
                "record=v=spf1 include:_spf.example.net -all",
                "flattened=v=spf1 ip4:192.0.2.1 -all",
                "lookups=2/10",
                "limit_exceeded=false",
                "residual_lookups=0",
                "syntax_errors=none",
                "dns_errors:",
                "  - _spf.example.org: SERVFAIL",
            ]
        );
    }

    #[test]
    fn missing_record_is_an_error() {
        assert!(ensure_record_found(&report(true)).is_ok());
        let err = ensure_record_found(&report(false)).expect_err("missing record");
        assert_eq!(err.to_string(), "no SPF record found for example.com");
        assert!(!human_lines(&report(false)).iter().any(|line| line.starts_with("record=")));
    }

    #[test]
    fn write_all_atomically_replaces_target() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("flattened.txt");
        let path = path.to_str().expect("utf-8 temp path");

        write_all_atomically(path, b"v=spf1 -all\n").expect("first write");
        write_all_atomically(path, b"v=spf1 ip4:192.0.2.1 ~all\n").expect("second write");

        let written = std::fs::read_to_string(path).expect("read back");
        assert_eq!(written, "v=spf1 ip4:192.0.2.1 ~all\n");
        assert!(!std::path::Path::new(&format!("{path}.tmp")).exists());
    }
}
