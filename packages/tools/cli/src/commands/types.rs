//! 타입 문자열 확인 명령어

use anyhow::Context as _;
use dct_core::types::{parser, TypeNode};
use serde::Serialize;

use super::{print_json, OutputFormat};

#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub input: String,
    pub recognized: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

pub fn parse_report(text: &str) -> ParseReport {
    let node = TypeNode::parse(text);
    ParseReport {
        input: text.to_string(),
        recognized: node.is_some(),
        canonical: node.as_ref().map(ToString::to_string),
        canonical_key: node.as_ref().map(TypeNode::canonical_key),
        rule: parser::matched_rule(text).map(|tag| format!("{:?}", tag)),
    }
}

/// `dct types parse`
///
/// 하나라도 인식하지 못하면 에러로 종료합니다.
pub fn parse(texts: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let reports: Vec<ParseReport> = texts.iter().map(|t| parse_report(t)).collect();

    match format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Text => {
            for r in &reports {
                match (&r.canonical, &r.rule) {
                    (Some(canonical), Some(rule)) => println!("{} -> {}  [{}]", r.input, canonical, rule),
                    _ => println!("{} -> (not recognized)", r.input),
                }
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.recognized).count();
    if failed > 0 {
        anyhow::bail!("{} type(s) not recognized", failed);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct EqReport {
    pub left: String,
    pub right: String,
    pub equal: bool,
    pub left_key: String,
    pub right_key: String,
}

pub fn eq_report(left: &str, right: &str) -> anyhow::Result<EqReport> {
    let l: TypeNode = left.parse().context("left type")?;
    let r: TypeNode = right.parse().context("right type")?;
    Ok(EqReport {
        left: l.to_string(),
        right: r.to_string(),
        equal: l == r,
        left_key: l.canonical_key(),
        right_key: r.canonical_key(),
    })
}

/// `dct types eq`
pub fn eq(left: &str, right: &str, format: OutputFormat) -> anyhow::Result<()> {
    let report = eq_report(left, right)?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            let verdict = if report.equal { "equal" } else { "not equal" };
            println!("{} / {}: {}", report.left, report.right, verdict);
        }
    }
    Ok(())
}
