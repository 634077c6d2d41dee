//! 타입 문자열 파서
//!
//! 정해진 우선순위의 규칙 테이블을 차례로 시도하고, 처음으로 문자열 전체와
//! 일치하는 규칙의 결과를 반환합니다. 일부만 일치하는 경우는 실패입니다.
//!
//! 대소문자를 구분합니다 (`string`은 `STRING`이 아닙니다).

use super::node::{TypeNode, DEFAULT_PRECISION, DEFAULT_SCALE};

/// 파싱 규칙 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    NotNull,
    Char,
    Varchar,
    String,
    Binary,
    Varbinary,
    Bytes,
    Decimal,
    Dec,
    Numeric,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Date,
    Time,
    Timestamp,
    TimestampLtz,
    Array,
    TArray,
    Map,
    Row,
    Boolean,
    Interval,
    Multiset,
    PrimaryKey,
}

/// 규칙 함수 (두 번째 인자는 현재 중첩 깊이)
type Matcher = fn(&str, usize) -> Option<TypeNode>;

/// 최대 중첩 깊이
///
/// 이보다 깊게 중첩된 타입은 인식하지 않습니다.
pub const MAX_NESTING_DEPTH: usize = 64;

/// 규칙 테이블 (우선순위 순)
///
/// 계열 순서: NOT NULL → 문자열 → 바이너리 → 숫자 → 날짜/시간 → 컨테이너
/// → BOOLEAN → INTERVAL → MULTISET → PRIMARY KEY
const RULES: &[(TypeTag, Matcher)] = &[
    (TypeTag::NotNull, match_not_null),
    // string
    (TypeTag::Char, match_char),
    (TypeTag::Varchar, match_varchar),
    (TypeTag::String, match_string),
    // binary
    (TypeTag::Binary, match_binary),
    (TypeTag::Varbinary, match_varbinary),
    (TypeTag::Bytes, match_bytes),
    // numeric
    (TypeTag::Decimal, match_decimal),
    (TypeTag::Dec, match_dec),
    (TypeTag::Numeric, match_numeric),
    (TypeTag::TinyInt, match_tinyint),
    (TypeTag::SmallInt, match_smallint),
    (TypeTag::Int, match_int),
    (TypeTag::BigInt, match_bigint),
    (TypeTag::Float, match_float),
    (TypeTag::Double, match_double),
    // datetime
    (TypeTag::Date, match_date),
    (TypeTag::Time, match_time),
    (TypeTag::Timestamp, match_timestamp),
    (TypeTag::TimestampLtz, match_timestamp_ltz),
    // compound
    (TypeTag::Array, match_array),
    (TypeTag::TArray, match_postfix_array),
    (TypeTag::Map, match_map),
    (TypeTag::Row, match_row),
    // misc
    (TypeTag::Boolean, match_boolean),
    (TypeTag::Interval, match_interval),
    (TypeTag::Multiset, match_multiset),
    (TypeTag::PrimaryKey, match_primary_key),
];

/// 타입 문자열 파싱
///
/// 어떤 규칙과도 일치하지 않으면 `None`을 반환합니다. 패닉하지 않습니다.
pub fn parse(text: &str) -> Option<TypeNode> {
    parse_at(text, 0)
}

fn parse_at(text: &str, depth: usize) -> Option<TypeNode> {
    if depth > MAX_NESTING_DEPTH {
        return None;
    }
    RULES.iter().find_map(|(_, matcher)| matcher(text, depth))
}

/// 특정 규칙 하나만 시도
///
/// 내부 타입(배열 요소 등)은 전체 규칙 테이블로 파싱합니다.
pub fn parse_as(tag: TypeTag, text: &str) -> Option<TypeNode> {
    RULES
        .iter()
        .find(|(rule, _)| *rule == tag)
        .and_then(|(_, matcher)| matcher(text, 0))
}

/// 일치한 규칙 식별자
pub fn matched_rule(text: &str) -> Option<TypeTag> {
    RULES
        .iter()
        .find(|(_, matcher)| matcher(text, 0).is_some())
        .map(|(tag, _)| *tag)
}

// ─────────────────────────────────────────────────────────────────────────────
// Lexical helpers
// ─────────────────────────────────────────────────────────────────────────────

/// ASCII 숫자열 → u32 (범위를 넘으면 실패)
fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `KEYWORD(<body>)`의 body
fn parenthesized<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    text.strip_prefix(keyword)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

/// `KEYWORD(<digits>)`
fn single_param(text: &str, keyword: &str) -> Option<u32> {
    digits(parenthesized(text, keyword)?)
}

/// `KEYWORD`, `KEYWORD(<p>)`, `KEYWORD(<p>, <s>)`
fn precision_scale(text: &str, keyword: &str) -> Option<(u32, u32)> {
    if text == keyword {
        return Some((DEFAULT_PRECISION, DEFAULT_SCALE));
    }

    let body = parenthesized(text, keyword)?;
    match body.split_once(", ") {
        Some((precision, scale)) => Some((digits(precision)?, digits(scale)?)),
        None => Some((digits(body)?, DEFAULT_SCALE)),
    }
}

fn keyword(text: &str, keyword: &str, node: TypeNode) -> Option<TypeNode> {
    (text == keyword).then_some(node)
}

/// 꺾쇠/괄호 깊이가 0인 위치의 `", "` 후보들
fn top_level_separators(body: &str) -> Vec<usize> {
    let bytes = body.as_bytes();
    let mut depth: i32 = 0;
    let mut positions = Vec::new();

    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'<' | b'(' => depth += 1,
            b'>' | b')' => depth -= 1,
            b',' if depth == 0 && bytes.get(i + 1) == Some(&b' ') => positions.push(i),
            _ => {}
        }
    }

    positions
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

fn match_not_null(text: &str, depth: usize) -> Option<TypeNode> {
    let inner = text.strip_suffix(" NOT NULL")?;
    parse_at(inner, depth + 1).map(TypeNode::not_null)
}

fn match_char(text: &str, _depth: usize) -> Option<TypeNode> {
    single_param(text, "CHAR").map(|length| TypeNode::Char { length })
}

fn match_varchar(text: &str, _depth: usize) -> Option<TypeNode> {
    single_param(text, "VARCHAR").map(|length| TypeNode::Varchar { length })
}

fn match_string(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "STRING", TypeNode::String)
}

fn match_binary(text: &str, _depth: usize) -> Option<TypeNode> {
    single_param(text, "BINARY").map(|length| TypeNode::Binary { length })
}

fn match_varbinary(text: &str, _depth: usize) -> Option<TypeNode> {
    single_param(text, "VARBINARY").map(|length| TypeNode::Varbinary { length })
}

fn match_bytes(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "BYTES", TypeNode::Bytes)
}

fn match_decimal(text: &str, _depth: usize) -> Option<TypeNode> {
    precision_scale(text, "DECIMAL").map(|(precision, scale)| TypeNode::Decimal { precision, scale })
}

fn match_dec(text: &str, _depth: usize) -> Option<TypeNode> {
    precision_scale(text, "DEC").map(|(precision, scale)| TypeNode::Dec { precision, scale })
}

fn match_numeric(text: &str, _depth: usize) -> Option<TypeNode> {
    precision_scale(text, "NUMERIC").map(|(precision, scale)| TypeNode::Numeric { precision, scale })
}

fn match_tinyint(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "TINYINT", TypeNode::TinyInt)
}

fn match_smallint(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "SMALLINT", TypeNode::SmallInt)
}

fn match_int(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "INT", TypeNode::Int)
}

fn match_bigint(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "BIGINT", TypeNode::BigInt)
}

fn match_float(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "FLOAT", TypeNode::Float)
}

fn match_double(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "DOUBLE", TypeNode::Double)
}

fn match_date(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "DATE", TypeNode::Date)
}

fn match_time(text: &str, _depth: usize) -> Option<TypeNode> {
    single_param(text, "TIME").map(|precision| TypeNode::Time { precision })
}

/// `TIMESTAMP(p)` + 선택적 ` WITH TIME ZONE` / ` WITHOUT TIME ZONE`
///
/// 절이 없으면 WITHOUT입니다.
fn match_timestamp(text: &str, _depth: usize) -> Option<TypeNode> {
    let (precision, clause) = text.strip_prefix("TIMESTAMP(")?.split_once(')')?;
    let precision = digits(precision)?;

    let with_time_zone = match clause {
        "" | " WITHOUT TIME ZONE" => false,
        " WITH TIME ZONE" => true,
        _ => return None,
    };

    Some(TypeNode::Timestamp {
        precision,
        with_time_zone,
    })
}

/// `TIMESTAMP_LTZ(p)` 또는 `TIMESTAMP(p) WITH LOCAL TIME ZONE`
fn match_timestamp_ltz(text: &str, _depth: usize) -> Option<TypeNode> {
    if let Some(precision) = single_param(text, "TIMESTAMP_LTZ") {
        return Some(TypeNode::TimestampLtz { precision });
    }

    let body = text
        .strip_prefix("TIMESTAMP(")?
        .strip_suffix(") WITH LOCAL TIME ZONE")?;
    digits(body).map(|precision| TypeNode::TimestampLtz { precision })
}

fn match_array(text: &str, depth: usize) -> Option<TypeNode> {
    let inner = text.strip_prefix("ARRAY<")?.strip_suffix('>')?;
    parse_at(inner, depth + 1).map(TypeNode::array)
}

fn match_postfix_array(text: &str, depth: usize) -> Option<TypeNode> {
    let inner = text.strip_suffix(" ARRAY")?;
    parse_at(inner, depth + 1).map(TypeNode::postfix_array)
}

fn match_map(text: &str, depth: usize) -> Option<TypeNode> {
    let body = text.strip_prefix("MAP<")?.strip_suffix('>')?;

    top_level_separators(body).into_iter().find_map(|at| {
        let key = parse_at(&body[..at], depth + 1)?;
        let value = parse_at(&body[at + 2..], depth + 1)?;
        Some(TypeNode::map(key, value))
    })
}

/// ROW 타입은 지원하지 않습니다.
fn match_row(_text: &str, _depth: usize) -> Option<TypeNode> {
    None
}

fn match_boolean(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "BOOLEAN", TypeNode::Boolean)
}

fn match_interval(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "INTERVAL", TypeNode::Interval)
}

fn match_multiset(text: &str, _depth: usize) -> Option<TypeNode> {
    keyword(text, "MULTISET", TypeNode::Multiset)
}

fn match_primary_key(text: &str, depth: usize) -> Option<TypeNode> {
    let inner = text.strip_suffix(" PRIMARY KEY")?;
    parse_at(inner, depth + 1).map(TypeNode::primary_key)
}
