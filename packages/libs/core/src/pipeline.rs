//! 파이프라인 SQL 보조 함수
//!
//! 모델 SQL은 `SELECT ...` 형태로 작성되고, 원격 파이프라인은
//! `INSERT INTO <sink> SELECT ...` 형태로 저장됩니다.

/// 모델 SQL을 파이프라인 SQL로 변환
pub fn wrap_as_pipeline(sink: &str, sql: &str) -> String {
    format!("INSERT INTO {} {}", sink, sql)
}

/// 파이프라인의 sink 교체 (첫 번째 `INSERT INTO`만)
pub fn replace_sink(old_sink: &str, new_sink: &str, sql: &str) -> String {
    sql.replacen(
        &format!("INSERT INTO {}", old_sink),
        &format!("INSERT INTO {}", new_sink),
        1,
    )
}

/// 소스 스트림 이름 교체 (`from`, `FROM` 모두)
pub fn replace_source(old_source: &str, new_source: &str, sql: &str) -> String {
    sql.replace(
        &format!("from {}", old_source),
        &format!("from {}", new_source),
    )
    .replace(
        &format!("FROM {}", old_source),
        &format!("FROM {}", new_source),
    )
}

pub fn pipeline_description(model: &str) -> String {
    format!("Pipeline for the '{}' dbt model", model)
}

/// 원격 서비스가 허용하지 않는 연산자 치환
pub fn replace_disallowed_operations(sql: &str) -> String {
    sql.replace("!=", "<>")
}
