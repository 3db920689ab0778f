//! Stateless helper utilities shared by the engine and both back-ends.

use std::collections::BTreeSet;

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL, TUP_EXCEL_RESERVED_SHEET_NAMES,
};
use crate::spec::{EnumCellValue, EnumFormatTag};

////////////////////////////////////////////////////////////////////////////////
// #region KeywordMatching

/// Lowercase `text` for keyword matching (Unicode aware, keeps accents).
pub fn normalize_keyword_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Whether lowercase `haystack` contains any keyword as a substring.
pub fn contains_any_keyword(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw))
}

/// Split a header into lowercase alphanumeric tokens.
pub fn tokenize_header(header: &str) -> Vec<String> {
    header
        .split(|chr: char| !chr.is_alphanumeric())
        .filter(|tok| !tok.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether any header token equals one of `tokens`.
pub fn header_has_token(header: &str, tokens: &[&str]) -> bool {
    tokenize_header(header)
        .iter()
        .any(|tok| tokens.contains(&tok.as_str()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Read a finite number from a cell; numeric strings are accepted.
pub fn derive_f64_from_cell_value(value: &EnumCellValue) -> Option<f64> {
    match value {
        EnumCellValue::Number(n) if n.is_finite() => Some(*n),
        EnumCellValue::Number(_) => None,
        EnumCellValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        EnumCellValue::None => None,
    }
}

/// Plain display text of a cell, used for labels and headers.
pub fn derive_cell_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Number(n) => format_plain_number(*n),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NumberFormatting

/// Group integer digits with `.` and use `,` as decimal separator.
pub fn format_grouped_number(x: f64, n_decimals: usize) -> String {
    let c_raw = format!("{:.*}", n_decimals, x.abs());
    let (c_int, c_frac) = match c_raw.split_once('.') {
        Some((c_int, c_frac)) => (c_int.to_string(), Some(c_frac.to_string())),
        None => (c_raw.clone(), None),
    };

    let n_len_int = c_int.len();
    let mut c_grouped = String::with_capacity(n_len_int + n_len_int / 3);
    for (n_idx, chr) in c_int.chars().enumerate() {
        if n_idx > 0 && (n_len_int - n_idx) % 3 == 0 {
            c_grouped.push('.');
        }
        c_grouped.push(chr);
    }

    let if_is_zero = c_raw.chars().all(|chr| chr == '0' || chr == '.');
    let c_sign = if x < 0.0 && !if_is_zero { "-" } else { "" };
    match c_frac {
        Some(c_frac) => format!("{c_sign}{c_grouped},{c_frac}"),
        None => format!("{c_sign}{c_grouped}"),
    }
}

/// Integers verbatim, fractions with two decimals.
pub fn format_plain_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x:.2}")
    }
}

/// Render a numeric value for a format tag.
pub fn format_number(x: f64, tag: EnumFormatTag, currency_symbol: &str) -> String {
    match tag {
        EnumFormatTag::Currency => {
            if currency_symbol == "UF" {
                format!("UF {}", format_grouped_number(x, 2))
            } else {
                format!("{currency_symbol} {}", format_grouped_number(x, 0))
            }
        }
        EnumFormatTag::Percent => format!("{:.1}%", x * 100.0),
        EnumFormatTag::Integer => format_grouped_number(x, 0),
        EnumFormatTag::Plain => format_plain_number(x),
    }
}

/// Render a cell for a format tag; `None` becomes `"-"`.
///
/// Numeric strings are formatted like numbers when the tag is numeric.
pub fn format_value(value: &EnumCellValue, tag: EnumFormatTag, currency_symbol: &str) -> String {
    match value {
        EnumCellValue::None => "-".to_string(),
        EnumCellValue::Number(n) if n.is_finite() => format_number(*n, tag, currency_symbol),
        EnumCellValue::Number(_) => "-".to_string(),
        EnumCellValue::String(s) => {
            if tag.is_numeric()
                && let Some(n) = derive_f64_from_cell_value(value)
            {
                return format_number(n, tag, currency_symbol);
            }
            s.clone()
        }
    }
}

/// Workbook number-format code for a tag.
pub fn derive_xlsx_num_format(tag: EnumFormatTag, currency_symbol: &str) -> Option<String> {
    match tag {
        EnumFormatTag::Currency => {
            let c_symbol = currency_symbol.replace('"', "");
            if c_symbol == "UF" {
                Some("\"UF\" #,##0.00".to_string())
            } else {
                Some(format!("\"{c_symbol}\" #,##0"))
            }
        }
        EnumFormatTag::Percent => Some("0.00%".to_string()),
        EnumFormatTag::Integer => Some("#,##0".to_string()),
        EnumFormatTag::Plain => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
///
/// Edge apostrophes are trimmed after truncation as well, and reserved names
/// get a `_` suffix.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name: String = name.chars().filter(|chr| !chr.is_control()).collect();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }

    let trim_edges = |c_raw: &str| c_raw.trim().trim_matches('\'').trim().to_string();
    let c_truncated: String = trim_edges(&c_name)
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect();
    let c_name = trim_edges(&c_truncated);

    if c_name.is_empty() {
        return "Sheet".to_string();
    }
    if TUP_EXCEL_RESERVED_SHEET_NAMES
        .iter()
        .any(|c_reserved| c_name.eq_ignore_ascii_case(c_reserved))
    {
        return format!("{c_name}_");
    }
    c_name
}

/// Create disambiguated name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, n_idx: usize) -> String {
    let c_suffix = format!("__{n_idx}");
    let n_len_base_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.chars().count());

    let c_base: String = base_name.chars().take(usize::max(1, n_len_base_max)).collect();

    format!("{c_base}{c_suffix}")
}

/// Sanitize `name` and make it unique within `set_existing`, case-insensitively.
pub fn derive_unique_page_label(set_existing: &mut BTreeSet<String>, name: &str) -> String {
    let c_name = sanitize_sheet_name(name, "_");
    if set_existing.insert(c_name.to_lowercase()) {
        return c_name;
    }

    let mut n_idx = 2usize;
    loop {
        let candidate = create_sheet_identifier(&c_name, n_idx);
        if set_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

/// Drop characters XML 1.0 cannot carry (C0 controls other than tab, LF, CR).
pub fn sanitize_xml_text(text: &str) -> String {
    text.chars()
        .filter(|chr| {
            !matches!(
                chr,
                '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
            )
        })
        .collect()
}

/// Estimate displayed width units for text (non-ASCII counts wider).
pub fn estimate_text_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_grouped_number_uses_dot_thousands() {
        assert_eq!(format_grouped_number(25_000_000.0, 0), "25.000.000");
        assert_eq!(format_grouped_number(999.0, 0), "999");
        assert_eq!(format_grouped_number(1234.567, 2), "1.234,57");
        assert_eq!(format_grouped_number(-1500.0, 0), "-1.500");
        assert_eq!(format_grouped_number(-0.2, 0), "0");
    }

    #[test]
    fn test_format_value_per_tag() {
        let v = EnumCellValue::Number(25_000_000.0);
        assert_eq!(format_value(&v, EnumFormatTag::Currency, "$"), "$ 25.000.000");
        assert_eq!(
            format_value(&EnumCellValue::Number(1234.5), EnumFormatTag::Currency, "UF"),
            "UF 1.234,50"
        );
        assert_eq!(
            format_value(&EnumCellValue::Number(0.053), EnumFormatTag::Percent, "$"),
            "5.3%"
        );
        assert_eq!(
            format_value(&EnumCellValue::Number(12345.0), EnumFormatTag::Integer, "$"),
            "12.345"
        );
        assert_eq!(
            format_value(&EnumCellValue::Number(2024.0), EnumFormatTag::Plain, "$"),
            "2024"
        );
        assert_eq!(format_value(&EnumCellValue::None, EnumFormatTag::Plain, "$"), "-");
        assert_eq!(
            format_value(&EnumCellValue::String("1500".into()), EnumFormatTag::Integer, "$"),
            "1.500"
        );
        assert_eq!(
            format_value(&EnumCellValue::String("n/d".into()), EnumFormatTag::Currency, "$"),
            "n/d"
        );
    }

    #[test]
    fn test_tokenize_header_splits_on_punctuation() {
        assert_eq!(tokenize_header("Marca - Modelo"), vec!["marca", "modelo"]);
        assert!(header_has_token("Versión", &["versión"]));
        assert!(!header_has_token("Total Modelos", &["modelo"]));
    }

    #[test]
    fn test_sanitize_and_identifier_respect_length_cap() {
        assert_eq!(sanitize_sheet_name("Precios [2024]/Marca", "_"), "Precios _2024__Marca");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Sheet");

        let c_long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&c_long, "_").chars().count(), 31);

        let c_ident = create_sheet_identifier(&c_long, 12);
        assert_eq!(c_ident.chars().count(), 31);
        assert!(c_ident.ends_with("__12"));
    }

    #[test]
    fn test_sanitize_trims_apostrophe_exposed_by_truncation() {
        let c_name = format!("{}'xyz", "A".repeat(30));
        let c_sanitized = sanitize_sheet_name(&c_name, "_");
        assert_eq!(c_sanitized, "A".repeat(30));
        assert_eq!(sanitize_sheet_name("'Precios'", "_"), "Precios");
        assert_eq!(sanitize_sheet_name("''", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name("Mes\u{7}Ene", "_"), "MesEne");
    }

    #[test]
    fn test_sanitize_suffixes_reserved_names() {
        assert_eq!(sanitize_sheet_name("History", "_"), "History_");
        assert_eq!(sanitize_sheet_name(" history ", "_"), "history_");
        assert_eq!(sanitize_sheet_name("Historia", "_"), "Historia");
    }

    #[test]
    fn test_unique_labels_collide_after_truncation() {
        let mut set_existing = BTreeSet::new();
        let c_base = "Gráfico Evolución de Precios por Marca";
        let c_first = derive_unique_page_label(&mut set_existing, &format!("{c_base} 2023"));
        let c_second = derive_unique_page_label(&mut set_existing, &format!("{c_base} 2024"));
        assert_eq!(c_first.chars().count(), 31);
        assert_eq!(c_second.chars().count(), 31);
        assert!(c_second.ends_with("__2"));
        assert_ne!(c_first.to_lowercase(), c_second.to_lowercase());
    }

    #[test]
    fn test_sanitize_xml_text_keeps_whitespace_controls() {
        assert_eq!(sanitize_xml_text("Reporte\u{7}X"), "ReporteX");
        assert_eq!(sanitize_xml_text("a\tb\nc\rd"), "a\tb\nc\rd");
        assert_eq!(sanitize_xml_text("Kia\u{1}\u{0}"), "Kia");
        assert_eq!(sanitize_xml_text("Año ñ €"), "Año ñ €");
    }
}
