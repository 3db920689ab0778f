//! Field classifier: (column header, section title, sample value) -> format tag.
//!
//! Rules are evaluated in table order and the first match wins. The year/date
//! override runs last and can unset any numeric tag.

use crate::spec::{EnumCellValue, EnumFormatTag};
use crate::util::{contains_any_keyword, normalize_keyword_text};

////////////////////////////////////////////////////////////////////////////////
// #region RuleTable

/// How a rule combines header and title keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRuleMatch {
    /// Header keyword or title keyword.
    HeaderOrTitle,
    /// Title keyword, numeric sample, and a header outside the excluded set.
    TitleWithNumericSample,
}

/// One classifier rule.
#[derive(Debug, Clone, Copy)]
pub struct SpecClassifyRule {
    pub name: &'static str,
    pub mode: EnumRuleMatch,
    pub header_keywords: &'static [&'static str],
    pub title_keywords: &'static [&'static str],
    pub header_excluded: &'static [&'static str],
    pub tag: EnumFormatTag,
}

impl SpecClassifyRule {
    fn is_match(&self, header: &str, title: &str, if_sample_numeric: bool) -> bool {
        match self.mode {
            EnumRuleMatch::HeaderOrTitle => {
                contains_any_keyword(header, self.header_keywords)
                    || contains_any_keyword(title, self.title_keywords)
            }
            EnumRuleMatch::TitleWithNumericSample => {
                if_sample_numeric
                    && contains_any_keyword(title, self.title_keywords)
                    && !contains_any_keyword(header, self.header_excluded)
            }
        }
    }
}

const TUP_HEADER_DATE_LIKE: [&str; 5] = ["fecha", "date", "year", "año", "mes"];

/// Ordered rule table.
pub const TUP_CLASSIFY_RULES: [SpecClassifyRule; 5] = [
    SpecClassifyRule {
        name: "percent_keyword",
        mode: EnumRuleMatch::HeaderOrTitle,
        header_keywords: &[
            "%",
            "percent",
            "variación",
            "variacion",
            "variation",
            "coef",
            "descuento",
            "volatilidad",
        ],
        title_keywords: &["volatilidad", "tendencia"],
        header_excluded: &[],
        tag: EnumFormatTag::Percent,
    },
    SpecClassifyRule {
        name: "integer_keyword",
        mode: EnumRuleMatch::HeaderOrTitle,
        header_keywords: &[
            "cantidad",
            "cant.",
            "volumen",
            "versiones",
            "total",
            "numero",
            "número",
            "count",
        ],
        title_keywords: &["composición", "composicion", "composition"],
        header_excluded: &[],
        tag: EnumFormatTag::Integer,
    },
    SpecClassifyRule {
        name: "currency_keyword",
        mode: EnumRuleMatch::HeaderOrTitle,
        header_keywords: &[
            "precio", "price", "monto", "valor", "bono", "lista", "costo", "avg", "min", "max",
            "promedio",
        ],
        title_keywords: &[],
        header_excluded: &[],
        tag: EnumFormatTag::Currency,
    },
    SpecClassifyRule {
        name: "percent_topic",
        mode: EnumRuleMatch::TitleWithNumericSample,
        header_keywords: &[],
        title_keywords: &[
            "volatilidad",
            "volatility",
            "tendencia",
            "trend",
            "variación",
            "variacion",
            "variation",
            "share",
            "participación",
            "discount",
            "descuento",
        ],
        header_excluded: &TUP_HEADER_DATE_LIKE,
        tag: EnumFormatTag::Percent,
    },
    SpecClassifyRule {
        name: "currency_topic",
        mode: EnumRuleMatch::TitleWithNumericSample,
        header_keywords: &[],
        title_keywords: &["precio", "price"],
        header_excluded: &[],
        tag: EnumFormatTag::Currency,
    },
];

/// Header keywords that force plain formatting after every other rule.
pub const TUP_HEADER_PLAIN_OVERRIDE: [&str; 4] = ["año", "year", "fecha", "date"];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Classify

/// Resolve the format tag for one column.
///
/// Total and pure; matching is case-insensitive substring matching.
pub fn classify(header: &str, section_title: &str, sample_value: &EnumCellValue) -> EnumFormatTag {
    let c_header = normalize_keyword_text(header);
    let c_title = normalize_keyword_text(section_title);
    let if_sample_numeric = matches!(sample_value, EnumCellValue::Number(n) if n.is_finite());

    let tag = TUP_CLASSIFY_RULES
        .iter()
        .find(|rule| rule.is_match(&c_header, &c_title, if_sample_numeric))
        .map(|rule| rule.tag)
        .unwrap_or(EnumFormatTag::Plain);

    if contains_any_keyword(&c_header, &TUP_HEADER_PLAIN_OVERRIDE) {
        return EnumFormatTag::Plain;
    }
    tag
}

/// First non-null value of a column, used as the classifier sample.
pub fn derive_column_sample(rows: &[Vec<EnumCellValue>], n_col: usize) -> EnumCellValue {
    rows.iter()
        .filter_map(|row| row.get(n_col))
        .find(|value| !matches!(value, EnumCellValue::None))
        .cloned()
        .unwrap_or(EnumCellValue::None)
}

/// Classify every column of a sheet once, using per-column samples.
pub fn classify_columns(
    headers: &[String],
    rows: &[Vec<EnumCellValue>],
    section_title: &str,
) -> Vec<EnumFormatTag> {
    headers
        .iter()
        .enumerate()
        .map(|(n_col, header)| classify(header, section_title, &derive_column_sample(rows, n_col)))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn num(x: f64) -> EnumCellValue {
        EnumCellValue::Number(x)
    }

    #[test]
    fn test_year_override_beats_currency_keyword() {
        assert_eq!(classify("Año Precio", "Evolución", &num(2024.0)), EnumFormatTag::Plain);
        assert_eq!(classify("Fecha", "Tendencia de Precios", &num(1.0)), EnumFormatTag::Plain);
    }

    #[test]
    fn test_coef_variacion_is_percent() {
        assert_eq!(
            classify("Coef. Variación", "Resumen Ejecutivo", &num(0.12)),
            EnumFormatTag::Percent
        );
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // percent keyword beats currency keyword
        assert_eq!(classify("% Descuento Bono", "", &num(0.1)), EnumFormatTag::Percent);
        // integer keyword beats currency keyword
        assert_eq!(classify("Total Precio", "", &num(10.0)), EnumFormatTag::Integer);
        assert_eq!(classify("Precio Lista", "Otro", &num(10.0)), EnumFormatTag::Currency);
        assert_eq!(classify("Unidades", "Composición por Marca", &num(3.0)), EnumFormatTag::Integer);
    }

    #[test]
    fn test_title_topics_require_numeric_sample() {
        assert_eq!(classify("Toyota", "Market Share", &num(0.4)), EnumFormatTag::Percent);
        assert_eq!(
            classify("Toyota", "Market Share", &EnumCellValue::String("40".into())),
            EnumFormatTag::Plain
        );
        assert_eq!(classify("Mes", "Market Share", &num(3.0)), EnumFormatTag::Plain);
        assert_eq!(classify("Kia", "Evolución Price", &num(9.0)), EnumFormatTag::Currency);
        assert_eq!(classify("Kia", "Evolución Price", &EnumCellValue::None), EnumFormatTag::Plain);
    }

    #[test]
    fn test_classify_is_case_insensitive_and_total() {
        assert_eq!(classify("PRECIO", "", &EnumCellValue::None), EnumFormatTag::Currency);
        assert_eq!(classify("", "", &EnumCellValue::None), EnumFormatTag::Plain);
        assert_eq!(classify("Marca", "Ranking", &num(1.0)), EnumFormatTag::Plain);
    }

    #[test]
    fn test_classify_columns_skips_leading_nulls_for_sample() {
        let headers = vec!["Marca".to_string(), "Toyota".to_string()];
        let rows = vec![
            vec![EnumCellValue::String("a".into()), EnumCellValue::None],
            vec![EnumCellValue::String("b".into()), num(0.2)],
        ];
        let l_tags = classify_columns(&headers, &rows, "Tendencia");
        assert_eq!(l_tags, vec![EnumFormatTag::Percent, EnumFormatTag::Percent]);
    }
}
