//! Document assembler: runs the fixed page sequence against one canvas.
//!
//! Page order: cover, intro, summary (or filters-only info page), one chart
//! page plus paginated table pages per sheet in input order, the paginated
//! raw-records table and a closing cover. Every stage reports an explicit
//! [`EnumStageOutcome`]; a failed stage leaves an error page and the run
//! continues. Panics are caught at the outer boundary and routed to
//! [`render_error_document`].

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::canvas::{ReportCanvas, create_canvas};
use crate::chart::build_chart_model;
use crate::conf::{
    C_FILENAME_STEM_PARSE_ERROR, C_MODELS_PAGE_LABEL, C_MODELS_TABLE_TITLE, TUP_MODELS_WIDTHS,
};
use crate::error::ReportError;
use crate::fallback::render_error_document;
use crate::layout::{
    build_models_sheet, build_summary_grid, build_table_grid, derive_payload_filter_lines,
    derive_summary_filter_lines, plan_table_pages,
};
use crate::normalize::{derive_attachment_filename, derive_local_timestamp, parse_payload};
use crate::spec::{
    EnumChartKind, EnumDocumentKind, EnumStageOutcome, SpecBrandAssets, SpecRenderReport,
    SpecRenderedDocument, SpecReportContext, SpecReportPayload, SpecSheet, SpecStageResult,
};

/// Clock inputs for one render; injected so output is reproducible in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecRenderOptions {
    pub now_utc: DateTime<Utc>,
    /// Date used for the default attachment name.
    pub today: NaiveDate,
}

impl SpecRenderOptions {
    pub fn now() -> Self {
        let now_utc = Utc::now();
        Self {
            now_utc,
            today: now_utc.date_naive(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region Entry

/// Parse a raw body and render it. Never fails: unparseable bodies produce an
/// `Error_Report` document.
pub fn render_document(
    v_body: &[u8],
    kind: EnumDocumentKind,
    assets: &SpecBrandAssets,
    options: &SpecRenderOptions,
) -> SpecRenderedDocument {
    match parse_payload(v_body) {
        Ok(normalized) => render_report_with_warnings(&normalized.payload, normalized.warnings, kind, assets, options),
        Err(err) => {
            warn!(error = %err, kind = ?kind, "payload rejected; rendering error document");
            let mut doc = render_error_document(kind, &format!("JSON Decode Error: {err}"), &[]);
            if doc.content_type == kind.content_type() {
                doc.filename = format!("{C_FILENAME_STEM_PARSE_ERROR}{}", kind.extension());
            }
            doc
        }
    }
}

/// Render a normalized payload into a document of `kind`.
pub fn render_report(
    payload: &SpecReportPayload,
    kind: EnumDocumentKind,
    assets: &SpecBrandAssets,
    options: &SpecRenderOptions,
) -> SpecRenderedDocument {
    render_report_with_warnings(payload, Vec::new(), kind, assets, options)
}

fn render_report_with_warnings(
    payload: &SpecReportPayload,
    l_warnings: Vec<String>,
    kind: EnumDocumentKind,
    assets: &SpecBrandAssets,
    options: &SpecRenderOptions,
) -> SpecRenderedDocument {
    let c_filename = derive_attachment_filename(payload, kind, options.today);
    let context = SpecReportContext {
        title: payload.title.clone(),
        subtitle: payload.subtitle.clone(),
        generated_at: derive_local_timestamp(payload.timezone_offset_hours, options.now_utc),
        currency_symbol: payload.currency_symbol.clone(),
    };

    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut assembler = ReportAssembler::new(create_canvas(kind, context, assets), payload, l_warnings);
        assembler.run();
        assembler.finish()
    }));

    match result {
        Ok(Ok((v_bytes, report))) => {
            info!(
                kind = ?kind,
                filename = %c_filename,
                pages = report.pages.len(),
                warnings = report.warnings.len(),
                placeholders = report.placeholder_count(),
                "report rendered"
            );
            SpecRenderedDocument {
                bytes: v_bytes,
                content_type: kind.content_type().to_string(),
                filename: c_filename,
                report,
            }
        }
        Ok(Err((err, l_trace))) => {
            error!(error = %err, kind = ?kind, "report assembly failed");
            render_error_document(kind, &format!("Global Error: {err}"), &l_trace)
        }
        Err(panic) => {
            let c_message = derive_panic_message(panic.as_ref());
            error!(panic = %c_message, kind = ?kind, "report assembly panicked");
            render_error_document(kind, &format!("Global Error: {c_message}"), &[])
        }
    }
}

fn derive_panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|c| c.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Assembler

struct ReportAssembler<'a> {
    canvas: Box<dyn ReportCanvas>,
    payload: &'a SpecReportPayload,
    report: SpecRenderReport,
}

impl<'a> ReportAssembler<'a> {
    fn new(canvas: Box<dyn ReportCanvas>, payload: &'a SpecReportPayload, l_warnings: Vec<String>) -> Self {
        Self {
            canvas,
            payload,
            report: SpecRenderReport {
                warnings: l_warnings,
                ..Default::default()
            },
        }
    }

    fn run(&mut self) {
        self.run_stage("cover", "Portada (Error)", "Portada (Error)", |canvas| canvas.add_cover());
        self.run_stage("intro", "Introducción (Error)", "Introducción (Error)", |canvas| {
            canvas.add_intro()
        });

        let payload = self.payload;
        let c_currency = payload.currency_symbol.as_str();
        match &payload.summary {
            Some(summary) => {
                let grid = build_summary_grid(summary, c_currency);
                let l_filter_lines = derive_summary_filter_lines(summary);
                self.run_stage("summary", "Resumen (Error)", "Resumen Ejecutivo (Error)", |canvas| {
                    canvas.add_summary(&grid, &l_filter_lines)
                });
            }
            None => {
                let l_filter_lines = derive_payload_filter_lines(&payload.filters);
                self.run_stage("info", "Información (Error)", "Información (Error)", |canvas| {
                    canvas.add_info(&l_filter_lines)
                });
            }
        }

        for sheet in &payload.sheets {
            self.run_sheet(sheet);
        }

        match payload.models.as_deref() {
            Some(l_models) if !l_models.is_empty() => {
                let sheet = build_models_sheet(C_MODELS_TABLE_TITLE, l_models);
                self.run_stage("models", "Modelos (Error)", "Detalle de Modelos (Error)", |canvas| {
                    render_table_pages(canvas, &sheet, c_currency, Some(C_MODELS_PAGE_LABEL))
                });
            }
            _ => self.skip_stage("models", "no model records"),
        }

        self.run_stage("closing", "Cierre (Error)", "Cierre (Error)", |canvas| canvas.add_cover());
    }

    fn run_sheet(&mut self, sheet: &SpecSheet) {
        let payload = self.payload;
        let c_currency = payload.currency_symbol.as_str();
        let c_chart_stage = format!("chart:{}", sheet.name);
        let c_table_stage = format!("table:{}", sheet.name);
        if sheet.rows.is_empty() {
            self.skip_stage(&c_chart_stage, "empty sheet");
            self.skip_stage(&c_table_stage, "empty sheet");
            return;
        }

        let model = build_chart_model(sheet, c_currency);
        let if_plottable = match model.kind {
            EnumChartKind::Scatter => !model.points.is_empty(),
            _ => !model.series.is_empty(),
        };
        if if_plottable {
            self.run_stage(
                &c_chart_stage,
                &format!("{} (Error)", sheet.name),
                &format!("{} (Data Error)", sheet.chart_title),
                |canvas| canvas.add_chart_page(&sheet.name, &model),
            );
        } else {
            self.skip_stage(&c_chart_stage, "no plottable values");
        }

        self.run_stage(
            &c_table_stage,
            &format!("{} (Error)", sheet.name),
            &format!("{} (Table Error)", sheet.name),
            |canvas| render_table_pages(canvas, sheet, c_currency, None),
        );
    }

    /// Run one stage; on failure emit an error page in its place. A panic
    /// inside the stage counts as a failure of that stage only.
    fn run_stage<F>(&mut self, stage: &str, error_label: &str, error_heading: &str, f: F)
    where
        F: FnOnce(&mut dyn ReportCanvas) -> Result<Vec<String>, ReportError>,
    {
        let result = catch_unwind(AssertUnwindSafe(|| f(self.canvas.as_mut()))).unwrap_or_else(|panic| {
            let c_message = derive_panic_message(panic.as_ref());
            error!(stage, panic = %c_message, "stage panicked");
            Err(ReportError::Render(format!("stage panicked: {c_message}")))
        });
        let outcome = match result {
            Ok(l_pages) if l_pages.is_empty() => EnumStageOutcome::Skipped {
                reason: "not applicable to this document kind".to_string(),
            },
            Ok(l_pages) => {
                debug!(stage, pages = l_pages.len(), "stage rendered");
                let n_pages = l_pages.len();
                self.report.pages.extend(l_pages);
                EnumStageOutcome::Rendered { pages: n_pages }
            }
            Err(err) => {
                warn!(stage, error = %err, "stage failed; emitting error page");
                let mut c_diagnostic = err.to_string();
                match self.canvas.add_error_page(error_label, error_heading, &c_diagnostic) {
                    Ok(l_pages) => self.report.pages.extend(l_pages),
                    Err(err_page) => {
                        c_diagnostic = format!("{c_diagnostic}; error page failed: {err_page}");
                    }
                }
                EnumStageOutcome::Placeholder {
                    diagnostic: c_diagnostic,
                }
            }
        };

        self.report.warnings.extend(self.canvas.drain_warnings());
        self.report.stages.push(SpecStageResult {
            stage: stage.to_string(),
            outcome,
        });
    }

    fn skip_stage(&mut self, stage: &str, reason: &str) {
        debug!(stage, reason, "stage skipped");
        self.report.stages.push(SpecStageResult {
            stage: stage.to_string(),
            outcome: EnumStageOutcome::Skipped {
                reason: reason.to_string(),
            },
        });
    }

    /// Debug log, then serialize. Errors carry the log lines as trace.
    fn finish(mut self) -> Result<(Vec<u8>, SpecRenderReport), (ReportError, Vec<String>)> {
        let l_lines = derive_debug_lines(&self.report);
        if let Err(err) = self.canvas.add_debug_log(&l_lines) {
            warn!(error = %err, "debug log could not be written");
            self.report.warn(format!("debug log could not be written: {err}"));
        }
        match self.canvas.finish() {
            Ok(v_bytes) => Ok((v_bytes, self.report)),
            Err(err) => Err((err, l_lines)),
        }
    }
}

/// Plan and emit every table page of a sheet. `label` replaces the sheet
/// name in page labels while grid titles keep the sheet name.
fn render_table_pages(
    canvas: &mut dyn ReportCanvas,
    sheet: &SpecSheet,
    currency_symbol: &str,
    label: Option<&str>,
) -> Result<Vec<String>, ReportError> {
    let policy = canvas.pagination_policy();
    let l_pages = plan_table_pages(&sheet.name, sheet.height(), sheet.width(), &policy)?;

    let mut l_labels = Vec::new();
    for page in &l_pages {
        let mut grid = build_table_grid(sheet, page, currency_symbol);
        let c_label = match label {
            Some(c_label) => page.title.replacen(&sheet.name, c_label, 1),
            None => page.title.clone(),
        };
        if label == Some(C_MODELS_PAGE_LABEL) {
            grid.widths = page
                .cols
                .iter()
                .map(|n_col| TUP_MODELS_WIDTHS.get(*n_col).copied().unwrap_or(15.0))
                .collect();
        }
        l_labels.extend(canvas.add_table_page(&c_label, &grid)?);
    }
    Ok(l_labels)
}

fn derive_debug_lines(report: &SpecRenderReport) -> Vec<String> {
    let mut l_lines: Vec<String> = report
        .warnings
        .iter()
        .map(|c_warning| format!("WARN {c_warning}"))
        .collect();
    for stage in &report.stages {
        let c_outcome = match &stage.outcome {
            EnumStageOutcome::Rendered { pages } => format!("rendered ({pages} pages)"),
            EnumStageOutcome::Skipped { reason } => format!("skipped: {reason}"),
            EnumStageOutcome::Placeholder { diagnostic } => format!("placeholder: {diagnostic}"),
        };
        l_lines.push(format!("STAGE {}: {c_outcome}", stage.stage));
    }
    l_lines
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnumCellValue, SpecModelRecord};

    fn options() -> SpecRenderOptions {
        SpecRenderOptions {
            now_utc: DateTime::from_timestamp(1_704_103_200, 0).unwrap_or_default(),
            today: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }

    fn payload() -> SpecReportPayload {
        SpecReportPayload {
            title: "Reporte".to_string(),
            subtitle: None,
            currency_symbol: "$".to_string(),
            timezone_offset_hours: -3.0,
            filters: vec![("brand".to_string(), vec!["Kia".to_string()])],
            summary: None,
            models: None,
            sheets: Vec::new(),
            filename: None,
        }
    }

    fn model_record(n_idx: usize) -> SpecModelRecord {
        SpecModelRecord {
            brand: "Kia".to_string(),
            model: format!("Modelo {n_idx}"),
            submodel: "-".to_string(),
            estado: "N/A".to_string(),
            tipo_vehiculo: "SUV".to_string(),
            precio_con_bono: 10_000.0,
            precio_lista: 11_000.0,
            bono: 1_000.0,
        }
    }

    #[test]
    fn test_deck_models_paginate_into_three_pages() {
        let mut p = payload();
        p.models = Some((0..25).map(model_record).collect());
        let doc = render_report(&p, EnumDocumentKind::Deck, &SpecBrandAssets::default(), &options());
        let models = doc
            .report
            .stages
            .iter()
            .find(|s| s.stage == "models")
            .map(|s| s.outcome.clone());
        assert_eq!(models, Some(EnumStageOutcome::Rendered { pages: 3 }));
        assert_eq!(
            doc.report.pages,
            vec!["Portada", "Introducción", "Información", "Modelos", "Modelos (Cont.)", "Modelos (Cont.)__2", "Cierre"]
        );
    }

    #[test]
    fn test_empty_sheet_is_skipped_without_error() {
        let mut p = payload();
        p.sheets.push(SpecSheet {
            name: "Vacía".to_string(),
            chart_title: "Vacía".to_string(),
            headers: Vec::new(),
            rows: Vec::new(),
            ..Default::default()
        });
        let doc = render_report(&p, EnumDocumentKind::Workbook, &SpecBrandAssets::default(), &options());
        assert_eq!(doc.report.placeholder_count(), 0);
        assert!(doc.report.stages.iter().any(|s| s.stage == "chart:Vacía"
            && matches!(s.outcome, EnumStageOutcome::Skipped { .. })));
        assert_eq!(doc.report.pages, vec!["Información"]);
        assert_eq!(doc.filename, "Report_2024-01-01.xlsx");
    }

    #[test]
    fn test_workbook_sheet_renders_chart_and_table() {
        let mut p = payload();
        p.sheets.push(SpecSheet {
            name: "Precios".to_string(),
            chart_title: "Precios por Marca".to_string(),
            headers: vec!["Marca".to_string(), "Precio Promedio".to_string()],
            rows: vec![
                vec![EnumCellValue::String("Kia".to_string()), EnumCellValue::Number(15_000_000.0)],
                vec![EnumCellValue::String("Mazda".to_string()), EnumCellValue::Number(18_000_000.0)],
            ],
            ..Default::default()
        });
        let doc = render_report(&p, EnumDocumentKind::Workbook, &SpecBrandAssets::default(), &options());
        assert_eq!(doc.report.pages, vec!["Información", "Gráfico Precios", "Precios"]);
        assert_eq!(doc.report.placeholder_count(), 0);
        assert!(doc.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_unparseable_body_yields_error_report() {
        let doc = render_document(b"{not json", EnumDocumentKind::Workbook, &SpecBrandAssets::default(), &options());
        assert_eq!(doc.filename, "Error_Report.xlsx");
        assert!(doc.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_panicking_stage_becomes_placeholder_and_later_stages_run() {
        let p = payload();
        let context = SpecReportContext {
            title: p.title.clone(),
            subtitle: None,
            generated_at: "01/01/2024 10:00".to_string(),
            currency_symbol: "$".to_string(),
        };
        let canvas = create_canvas(EnumDocumentKind::Workbook, context, &SpecBrandAssets::default());
        let mut assembler = ReportAssembler::new(canvas, &p, Vec::new());
        assembler.run_stage("chart:Precios", "Precios (Error)", "Precios (Data Error)", |_| {
            panic!("bad chart")
        });
        assembler.run_stage("info", "Información (Error)", "Información (Error)", |canvas| {
            canvas.add_info(&[])
        });

        let (v_bytes, report) = assembler.finish().expect("workbook still serializes");
        assert!(v_bytes.starts_with(b"PK"));
        assert_eq!(report.pages, vec!["Precios (Error)", "Información"]);
        assert_eq!(report.placeholder_count(), 1);
        assert!(matches!(
            &report.stages[0].outcome,
            EnumStageOutcome::Placeholder { diagnostic } if diagnostic.contains("bad chart")
        ));
        assert_eq!(report.stages[1].outcome, EnumStageOutcome::Rendered { pages: 1 });
    }

    #[test]
    fn test_panic_message_is_extracted() {
        let panic = catch_unwind(|| panic!("kaboom")).err();
        let c_message = panic.as_deref().map(derive_panic_message).unwrap_or_default();
        assert_eq!(c_message, "kaboom");
    }
}
