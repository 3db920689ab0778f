//! Document canvas seam shared by the workbook and deck back-ends.
//!
//! Every `add_*` call returns the labels of the pages it emitted. An empty
//! list means the page kind does not apply to this back-end.

use crate::error::ReportError;
use crate::spec::{
    EnumDocumentKind, SpecChartModel, SpecPaginationPolicy, SpecReportContext, SpecTableGrid,
};

pub trait ReportCanvas {
    /// Output container produced by [`Self::finish`].
    fn kind(&self) -> EnumDocumentKind;

    /// Table pagination bounds for this back-end.
    fn pagination_policy(&self) -> SpecPaginationPolicy;

    /// Opening or closing brand page.
    fn add_cover(&mut self) -> Result<Vec<String>, ReportError>;

    /// Title page with the generation timestamp.
    fn add_intro(&mut self) -> Result<Vec<String>, ReportError>;

    /// Executive summary grid plus applied-filter lines.
    fn add_summary(
        &mut self,
        grid: &SpecTableGrid,
        filter_lines: &[(String, String)],
    ) -> Result<Vec<String>, ReportError>;

    /// Filters-only information page, used when the payload has no summary.
    fn add_info(&mut self, filter_lines: &[(String, String)]) -> Result<Vec<String>, ReportError>;

    /// Native chart page for one sheet.
    fn add_chart_page(
        &mut self,
        label: &str,
        model: &SpecChartModel,
    ) -> Result<Vec<String>, ReportError>;

    /// One planned table page.
    fn add_table_page(
        &mut self,
        label: &str,
        grid: &SpecTableGrid,
    ) -> Result<Vec<String>, ReportError>;

    /// Titled error page standing in for a failed stage or a failed document.
    fn add_error_page(
        &mut self,
        label: &str,
        heading: &str,
        message: &str,
    ) -> Result<Vec<String>, ReportError>;

    /// Diagnostics kept inside the document, if the container supports it.
    fn add_debug_log(&mut self, lines: &[String]) -> Result<(), ReportError>;

    /// Non-fatal warnings collected since the last call.
    fn drain_warnings(&mut self) -> Vec<String>;

    /// Serialize the document. Calling twice fails with [`ReportError::Finished`].
    fn finish(&mut self) -> Result<Vec<u8>, ReportError>;
}

/// Build the canvas for a document kind.
pub fn create_canvas(
    kind: EnumDocumentKind,
    context: SpecReportContext,
    assets: &crate::spec::SpecBrandAssets,
) -> Box<dyn ReportCanvas> {
    match kind {
        EnumDocumentKind::Workbook => Box::new(crate::writer_xlsx::XlsxCanvas::new(context)),
        EnumDocumentKind::Deck => Box::new(crate::writer_pptx::PptxCanvas::new(context, assets)),
    }
}
