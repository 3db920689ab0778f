//! Input normalizer: raw JSON body -> typed, defaulted report payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::conf::{C_CURRENCY_DEFAULT, C_TITLE_DEFAULT, N_TIMEZONE_OFFSET_DEFAULT};
use crate::error::ReportError;
use crate::spec::{
    EnumCellValue, EnumChartKind, EnumDocumentKind, SpecModelRecord, SpecNormalizedPayload,
    SpecReportPayload, SpecSheet, SpecSummaryMetrics,
};

/// Offsets beyond this many hours are treated as malformed.
const N_TIMEZONE_OFFSET_ABS_MAX: f64 = 14.0;

////////////////////////////////////////////////////////////////////////////////
// #region Parse

/// Parse a raw request body and normalize it.
///
/// Fails only when the body is not JSON or its top level is not an object.
pub fn parse_payload(v_body: &[u8]) -> Result<SpecNormalizedPayload, ReportError> {
    let value: Value = serde_json::from_slice(v_body)?;
    if !value.is_object() {
        return Err(ReportError::Payload(format!(
            "top-level JSON must be an object, got {}",
            derive_json_type_name(&value)
        )));
    }
    Ok(normalize_payload(&value))
}

/// Build the typed payload, applying every default once.
///
/// Wrongly typed optional fields fall back to their default and leave a warning.
pub fn normalize_payload(value: &Value) -> SpecNormalizedPayload {
    let mut l_warnings: Vec<String> = Vec::new();
    let empty = Map::new();
    let dict_root = match value.as_object() {
        Some(obj) => obj,
        None => {
            l_warnings.push("payload is not an object; using defaults".to_string());
            &empty
        }
    };

    let title = derive_string_field(dict_root, &["title", "reportTitle"], &mut l_warnings)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| C_TITLE_DEFAULT.to_string());
    let subtitle = derive_string_field(dict_root, &["subtitle"], &mut l_warnings);
    let currency_symbol =
        derive_string_field(dict_root, &["currencySymbol", "currency"], &mut l_warnings)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| C_CURRENCY_DEFAULT.to_string());
    let filename = derive_string_field(dict_root, &["filename"], &mut l_warnings)
        .filter(|s| !s.trim().is_empty());

    let timezone_offset_hours = match dict_root.get("timezoneOffset") {
        None | Some(Value::Null) => N_TIMEZONE_OFFSET_DEFAULT,
        Some(val) => match derive_f64_from_json(val) {
            Some(n) if n.abs() <= N_TIMEZONE_OFFSET_ABS_MAX => n,
            _ => {
                l_warnings.push(format!(
                    "timezoneOffset {val} is invalid; using {N_TIMEZONE_OFFSET_DEFAULT}"
                ));
                N_TIMEZONE_OFFSET_DEFAULT
            }
        },
    };

    let filters = match dict_root.get("filters") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(obj)) => derive_filter_entries(obj, "filters", &mut l_warnings),
        Some(other) => {
            l_warnings.push(format!(
                "filters must be an object, got {}",
                derive_json_type_name(other)
            ));
            Vec::new()
        }
    };

    let summary = match dict_root.get("summary") {
        None | Some(Value::Null) => None,
        Some(Value::Object(obj)) if obj.is_empty() => None,
        Some(Value::Object(obj)) => Some(derive_summary_metrics(obj, &mut l_warnings)),
        Some(other) => {
            l_warnings.push(format!(
                "summary must be an object, got {}",
                derive_json_type_name(other)
            ));
            None
        }
    };

    let models = match dict_root.get("models") {
        None | Some(Value::Null) => None,
        Some(Value::Array(arr)) => Some(
            arr.iter()
                .enumerate()
                .filter_map(|(n_idx, item)| match item {
                    Value::Object(obj) => Some(derive_model_record(obj)),
                    other => {
                        l_warnings.push(format!(
                            "models[{n_idx}] must be an object, got {}; skipped",
                            derive_json_type_name(other)
                        ));
                        None
                    }
                })
                .collect::<Vec<_>>(),
        ),
        Some(other) => {
            l_warnings.push(format!(
                "models must be an array, got {}",
                derive_json_type_name(other)
            ));
            None
        }
    };

    let sheets = match dict_root.get("sheets") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(arr)) => arr
            .iter()
            .enumerate()
            .filter_map(|(n_idx, item)| match item {
                Value::Object(obj) => Some(derive_sheet(obj, n_idx, &mut l_warnings)),
                other => {
                    l_warnings.push(format!(
                        "sheets[{n_idx}] must be an object, got {}; skipped",
                        derive_json_type_name(other)
                    ));
                    None
                }
            })
            .collect(),
        Some(other) => {
            l_warnings.push(format!(
                "sheets must be an array, got {}",
                derive_json_type_name(other)
            ));
            Vec::new()
        }
    };

    debug!(
        n_sheets = sheets.len(),
        if_summary = summary.is_some(),
        n_models = models.as_ref().map_or(0, Vec::len),
        n_warnings = l_warnings.len(),
        "payload normalized"
    );

    SpecNormalizedPayload {
        payload: SpecReportPayload {
            title,
            subtitle,
            currency_symbol,
            timezone_offset_hours,
            filters,
            summary,
            models,
            sheets,
            filename,
        },
        warnings: l_warnings,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sections

fn derive_sheet(obj: &Map<String, Value>, n_idx: usize, l_warnings: &mut Vec<String>) -> SpecSheet {
    let name = derive_string_field(obj, &["name"], l_warnings)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Sheet".to_string());
    let chart_title = derive_string_field(obj, &["chart_title"], l_warnings)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| name.clone());

    let chart_kind = match obj.get("chart_type") {
        None | Some(Value::Null) => EnumChartKind::default(),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "bar" => EnumChartKind::Bar,
            "line" => EnumChartKind::Line,
            "stacked" => EnumChartKind::Stacked,
            "scatter" => EnumChartKind::Scatter,
            other => {
                l_warnings.push(format!(
                    "sheet '{name}': unknown chart_type '{other}'; using bar"
                ));
                EnumChartKind::default()
            }
        },
        Some(other) => {
            l_warnings.push(format!(
                "sheet '{name}': chart_type must be a string, got {}",
                derive_json_type_name(other)
            ));
            EnumChartKind::default()
        }
    };

    let l_rows_raw: Vec<&Map<String, Value>> = match obj.get("data") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(arr)) => arr
            .iter()
            .enumerate()
            .filter_map(|(n_row, item)| match item {
                Value::Object(row) => Some(row),
                other => {
                    l_warnings.push(format!(
                        "sheets[{n_idx}].data[{n_row}] must be an object, got {}; skipped",
                        derive_json_type_name(other)
                    ));
                    None
                }
            })
            .collect(),
        Some(other) => {
            l_warnings.push(format!(
                "sheet '{name}': data must be an array, got {}",
                derive_json_type_name(other)
            ));
            Vec::new()
        }
    };

    let headers: Vec<String> = l_rows_raw
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    let mut n_dropped_keys = 0usize;
    let rows: Vec<Vec<EnumCellValue>> = l_rows_raw
        .iter()
        .map(|row| {
            n_dropped_keys += row.keys().filter(|key| !headers.contains(key)).count();
            headers
                .iter()
                .map(|header| row.get(header).map_or(EnumCellValue::None, derive_cell_value))
                .collect()
        })
        .collect();
    if n_dropped_keys > 0 {
        l_warnings.push(format!(
            "sheet '{name}': {n_dropped_keys} value(s) under keys absent from the first row were dropped"
        ));
    }

    SpecSheet {
        name,
        chart_kind,
        chart_title,
        headers,
        rows,
    }
}

fn derive_summary_metrics(obj: &Map<String, Value>, l_warnings: &mut Vec<String>) -> SpecSummaryMetrics {
    let get = |key: &str| obj.get(key).and_then(derive_f64_from_json).unwrap_or(0.0);
    let filters = match obj.get("filters") {
        Some(Value::Object(dict_filters)) => {
            derive_filter_entries(dict_filters, "summary.filters", l_warnings)
                .into_iter()
                .collect::<BTreeMap<_, _>>()
        }
        _ => BTreeMap::new(),
    };

    SpecSummaryMetrics {
        total_models: get("total_models"),
        total_brands: get("total_brands"),
        avg_price: get("avg_price"),
        median_price: get("median_price"),
        min_price: get("min_price"),
        max_price: get("max_price"),
        price_std_dev: get("price_std_dev"),
        variation_coefficient: get("variation_coefficient"),
        avg_discount_pct: get("avg_discount_pct"),
        filters,
    }
}

fn derive_model_record(obj: &Map<String, Value>) -> SpecModelRecord {
    let text = |key: &str, default: &str| match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    };
    let number = |key: &str| obj.get(key).and_then(derive_f64_from_json).unwrap_or(0.0);

    SpecModelRecord {
        brand: text("brand", ""),
        model: text("model", ""),
        submodel: text("submodel", "-"),
        estado: text("estado", "N/A"),
        tipo_vehiculo: text("tipo_vehiculo", "N/A"),
        precio_con_bono: number("precio_con_bono"),
        precio_lista: number("precio_lista"),
        bono: number("bono"),
    }
}

fn derive_filter_entries(
    obj: &Map<String, Value>,
    c_field: &str,
    l_warnings: &mut Vec<String>,
) -> Vec<(String, Vec<String>)> {
    obj.iter()
        .filter_map(|(key, val)| match val {
            Value::Array(arr) => Some((
                key.clone(),
                arr.iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
            )),
            Value::String(s) => Some((key.clone(), vec![s.clone()])),
            Value::Null => None,
            other => {
                l_warnings.push(format!(
                    "{c_field}.{key} must be a list of strings, got {}",
                    derive_json_type_name(other)
                ));
                None
            }
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Scalars

/// JSON scalar -> cell value. Booleans and nested values keep their text.
pub fn derive_cell_value(value: &Value) -> EnumCellValue {
    match value {
        Value::Null => EnumCellValue::None,
        Value::Number(n) => n.as_f64().map_or(EnumCellValue::None, EnumCellValue::Number),
        Value::String(s) => EnumCellValue::String(s.clone()),
        Value::Bool(b) => EnumCellValue::String(b.to_string()),
        other => EnumCellValue::String(other.to_string()),
    }
}

fn derive_f64_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

fn derive_string_field(
    obj: &Map<String, Value>,
    l_keys: &[&str],
    l_warnings: &mut Vec<String>,
) -> Option<String> {
    for key in l_keys {
        match obj.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(other) => {
                l_warnings.push(format!(
                    "{key} must be a string, got {}; ignored",
                    derive_json_type_name(other)
                ));
            }
        }
    }
    None
}

fn derive_json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TimeAndNames

/// Local display timestamp: UTC plus a possibly fractional hour offset.
pub fn derive_local_timestamp(offset_hours: f64, now_utc: DateTime<Utc>) -> String {
    let n_offset_secs = (offset_hours * 3600.0).round() as i64;
    let local = now_utc
        .checked_add_signed(Duration::seconds(n_offset_secs))
        .unwrap_or(now_utc);
    local.format("%d/%m/%Y %H:%M").to_string()
}

/// Attachment filename for a document kind.
///
/// Uses the payload filename when given, else `Report_YYYY-MM-DD.xlsx`; the
/// deck target swaps `.xlsx` for `.pptx`.
pub fn derive_attachment_filename(
    payload: &SpecReportPayload,
    kind: EnumDocumentKind,
    today: NaiveDate,
) -> String {
    let c_requested = payload
        .filename
        .clone()
        .unwrap_or_else(|| format!("Report_{}.xlsx", today.format("%Y-%m-%d")));
    let mut c_name: String = c_requested
        .chars()
        .filter(|chr| !matches!(chr, '"' | '\r' | '\n' | '/' | '\\'))
        .collect();
    if c_name.trim().is_empty() {
        c_name = format!("Report_{}.xlsx", today.format("%Y-%m-%d"));
    }

    if kind == EnumDocumentKind::Deck {
        c_name = c_name.replace(".xlsx", ".pptx");
    }
    if !c_name.to_ascii_lowercase().ends_with(kind.extension()) {
        c_name.push_str(kind.extension());
    }
    c_name
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
