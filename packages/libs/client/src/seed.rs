//! 시드(CSV) 적재
//!
//! CSV 컬럼의 값 종류를 추론해 REST 소스 연결과 같은 이름의 스트림을 만들고,
//! 각 행을 문자열 값 이벤트로 전송합니다.
//!
//! ```text
//! create_seed_table   → create_connection → activate_connection
//! send_seed_as_events → send_events → deactivate_connection
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dct_core::schema::SchemaField;
use dct_core::types::{seed_column_type, SeedColumn};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::ControlPlane;
use crate::error::{ApiError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const TIME_FORMAT: &str = "%H:%M:%S%.f";

fn is_boolean(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

fn is_number(value: &str) -> bool {
    value.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

fn is_datetime(value: &str) -> bool {
    DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
}

fn is_time(value: &str) -> bool {
    NaiveTime::parse_from_str(value, TIME_FORMAT).is_ok()
}

/// 컬럼 값 종류 추론
///
/// 빈 값은 건너뛰고, 나머지 값이 모두 만족하는 첫 번째 종류를 고릅니다.
/// 값이 없거나 어떤 종류에도 맞지 않으면 `Text`입니다.
pub fn infer_column_kind<'a>(values: impl IntoIterator<Item = &'a str>) -> SeedColumn {
    let values: Vec<&str> = values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return SeedColumn::Text;
    }

    let candidates: [(SeedColumn, fn(&str) -> bool); 5] = [
        (SeedColumn::Boolean, is_boolean),
        (SeedColumn::Number, is_number),
        (SeedColumn::Date, is_date),
        (SeedColumn::DateTime, is_datetime),
        (SeedColumn::Time, is_time),
    ];
    candidates
        .iter()
        .find(|(_, matches)| values.iter().all(|v| matches(v)))
        .map(|(kind, _)| *kind)
        .unwrap_or(SeedColumn::Text)
}

/// 헤더가 있는 CSV 테이블
#[derive(Debug, Clone)]
pub struct SeedTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SeedTable {
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(ApiError::seed(format!("seed `{}` has no columns", name)));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { name, columns, rows })
    }

    /// 파일에서 로드 (이름이 없으면 파일 이름에서 확장자를 뺀 값)
    pub fn load(path: &Path, name: Option<&str>) -> Result<Self> {
        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    ApiError::seed(format!("cannot derive a seed name from {}", path.display()))
                })?,
        };
        let file = std::fs::File::open(path)?;
        Self::from_reader(name, file)
    }

    pub fn column_kinds(&self) -> Vec<SeedColumn> {
        (0..self.columns.len())
            .map(|ix| {
                infer_column_kind(
                    self.rows
                        .iter()
                        .map(|row| row.get(ix).map(String::as_str).unwrap_or("")),
                )
            })
            .collect()
    }

    /// 연결 스키마 (override는 컬럼 이름 → 타입 문자열)
    pub fn schema_fields(&self, overrides: &HashMap<String, String>) -> Vec<SchemaField> {
        self.columns
            .iter()
            .zip(self.column_kinds())
            .map(|(column, kind)| {
                let resolved = seed_column_type(kind, overrides.get(column).map(String::as_str));
                if let Some(rejected) = &resolved.rejected_override {
                    warn!(
                        "Type override `{}` for column `{}` in seed `{}` is not a known type; using the inferred type",
                        rejected, column, self.name
                    );
                }
                SchemaField::Physical {
                    name: column.clone(),
                    field_type: resolved.field_type,
                }
            })
            .collect()
    }

    /// 행마다 하나의 이벤트 (모든 값은 문자열)
    pub fn events(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(ix, column)| {
                        let value = row.get(ix).cloned().unwrap_or_default();
                        (column.clone(), Value::String(value))
                    })
                    .collect()
            })
            .collect()
    }
}

/// 이벤트 전송 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub connection_id: String,
    pub sent: usize,
    pub received: u64,
}

/// 시드용 연결과 스트림을 만들고 활성화 (연결 ID 반환)
pub async fn create_seed_table<C: ControlPlane + ?Sized>(
    control: &C,
    table: &SeedTable,
    overrides: &HashMap<String, String>,
) -> Result<String> {
    let fields = table.schema_fields(overrides);

    debug!("Creating connection and stream for seed `{}`", table.name);
    let created = control.create_connection(&table.name, &fields).await?;

    debug!("Activating connection `{}`", table.name);
    control.activate_connection(&created.id).await?;
    Ok(created.id)
}

/// 행을 이벤트로 전송한 뒤 연결을 비활성화
pub async fn send_seed_as_events<C: ControlPlane + ?Sized>(
    control: &C,
    table: &SeedTable,
) -> Result<SeedReport> {
    let connection_id = control.get_connection_id(&table.name).await?.ok_or_else(|| {
        ApiError::seed(format!(
            "cannot send seed events to a non-existing connection `{}`",
            table.name
        ))
    })?;

    let events = table.events();
    let received = control.send_events(&connection_id, &events).await?;
    if received != events.len() as u64 {
        warn!(
            "While seeding `{}`: sent {} events but the connection reported {} received",
            table.name,
            events.len(),
            received
        );
    }

    control.deactivate_connection(&connection_id).await?;
    Ok(SeedReport {
        connection_id,
        sent: events.len(),
        received,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::testing::MemoryControlPlane;

    const COLORS: &str = "\
id,label,active,created,day,at
1,red,true,2024-01-01 10:00:00,2024-01-01,10:00:00
2,green,FALSE,2024-01-02T11:30:00.250,2024-01-02,11:30:00.5
3,,true,2024-01-03 12:00:00,2024-01-03,12:00:00
";

    fn table() -> SeedTable {
        SeedTable::from_reader("colors", COLORS.as_bytes()).unwrap()
    }

    #[test]
    fn test_infer_column_kind() {
        assert_eq!(infer_column_kind(["1", "2.5", "-3e2"]), SeedColumn::Number);
        assert_eq!(infer_column_kind(["true", "False"]), SeedColumn::Boolean);
        assert_eq!(infer_column_kind(["2024-02-29"]), SeedColumn::Date);
        assert_eq!(infer_column_kind(["2024-02-29 08:00:00"]), SeedColumn::DateTime);
        assert_eq!(infer_column_kind(["08:00:00"]), SeedColumn::Time);
        assert_eq!(infer_column_kind(["1", "two"]), SeedColumn::Text);
        assert_eq!(infer_column_kind(["NaN", "inf"]), SeedColumn::Text);
        assert_eq!(infer_column_kind(["2024-02-30"]), SeedColumn::Text);
    }

    #[test]
    fn test_empty_values_are_skipped() {
        assert_eq!(infer_column_kind(["", " ", "4"]), SeedColumn::Number);
        assert_eq!(infer_column_kind(["", ""]), SeedColumn::Text);
        assert_eq!(infer_column_kind(std::iter::empty::<&str>()), SeedColumn::Text);
    }

    #[test]
    fn test_column_kinds() {
        assert_eq!(
            table().column_kinds(),
            vec![
                SeedColumn::Number,
                SeedColumn::Text,
                SeedColumn::Boolean,
                SeedColumn::DateTime,
                SeedColumn::Date,
                SeedColumn::Time,
            ]
        );
    }

    #[test]
    fn test_schema_fields_with_overrides() {
        let overrides = HashMap::from([
            ("id".to_string(), "BIGINT NOT NULL".to_string()),
            ("label".to_string(), "text".to_string()),
        ]);
        let rendered: Vec<String> = table()
            .schema_fields(&overrides)
            .iter()
            .map(|f| format!("{} {}", f.name(), f.field_type().unwrap()))
            .collect();

        assert_eq!(rendered[0], "id BIGINT NOT NULL");
        // 인식할 수 없는 override는 추론된 타입 유지
        assert_eq!(rendered[1], "label STRING");
        assert_eq!(rendered[2], "active BOOLEAN");
        assert_eq!(rendered[3], "created TIMESTAMP_LTZ(3)");
    }

    #[test]
    fn test_events_are_strings() {
        let events = table().events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["id"], Value::String("1".to_string()));
        assert_eq!(events[1]["active"], Value::String("FALSE".to_string()));
        assert_eq!(events[2]["label"], Value::String(String::new()));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(COLORS.as_bytes()).unwrap();

        let named = SeedTable::load(file.path(), Some("palette")).unwrap();
        assert_eq!(named.name, "palette");
        assert_eq!(named.rows.len(), 3);

        let derived = SeedTable::load(file.path(), None).unwrap();
        assert!(!derived.name.ends_with(".csv"));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = SeedTable::from_reader("bad", "a,b\n1\n".as_bytes()).unwrap_err();
        assert_eq!(err.category(), "SeedError");
    }

    #[tokio::test]
    async fn test_create_then_send() {
        let control = MemoryControlPlane::default();
        let table = table();

        let id = create_seed_table(&control, &table, &HashMap::new()).await.unwrap();
        assert_eq!(id, "conn-1");
        assert_eq!(control.created_fields.lock().unwrap().len(), 6);

        let report = send_seed_as_events(&control, &table).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                connection_id: "conn-1".to_string(),
                sent: 3,
                received: 3,
            }
        );
        assert_eq!(
            control.calls(),
            vec![
                "create_connection colors",
                "activate_connection conn-1",
                "send_events conn-1",
                "deactivate_connection conn-1",
            ]
        );
        assert_eq!(control.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_partial_receipt_still_deactivates() {
        let control = MemoryControlPlane {
            received_override: Some(1),
            ..Default::default()
        };
        let table = table();
        create_seed_table(&control, &table, &HashMap::new()).await.unwrap();

        let report = send_seed_as_events(&control, &table).await.unwrap();
        assert_eq!(report.sent, 3);
        assert_eq!(report.received, 1);
        assert_eq!(control.calls().last().unwrap(), "deactivate_connection conn-1");
    }

    #[tokio::test]
    async fn test_send_without_connection() {
        let control = MemoryControlPlane::default();
        let err = send_seed_as_events(&control, &table()).await.unwrap_err();
        assert_eq!(err.category(), "SeedError");
        assert!(err.to_string().contains("colors"));
        assert!(control.calls().is_empty());
    }
}
