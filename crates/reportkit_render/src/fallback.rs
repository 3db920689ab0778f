//! Minimal error documents for failures the assembler cannot absorb.

use chrono::Utc;
use tracing::{error, warn};

use crate::canvas::create_canvas;
use crate::conf::{
    C_ERROR_PAGE_LABEL, C_FILENAME_STEM_CRITICAL, C_MIME_TEXT, N_LEN_ERROR_MESSAGE_SHORT,
};
use crate::error::ReportError;
use crate::spec::{
    EnumDocumentKind, EnumStageOutcome, SpecBrandAssets, SpecRenderReport, SpecRenderedDocument,
    SpecReportContext, SpecStageResult,
};

/// Build a single-page error document.
///
/// `trace` lines are appended below the message. When the full document
/// cannot be built, a retry with a shortened message and no trace is made;
/// if that fails too the message is returned as `text/plain`.
pub fn render_error_document(
    kind: EnumDocumentKind,
    message: &str,
    trace: &[String],
) -> SpecRenderedDocument {
    let c_full = if trace.is_empty() {
        message.to_string()
    } else {
        format!("{message}\n\n{}", trace.join("\n"))
    };

    let (v_bytes, l_pages) = match create_error_bytes(kind, &c_full, trace) {
        Ok(out) => out,
        Err(err) => {
            warn!(error = %err, "error document failed; retrying with a short message");
            let c_short: String = message.chars().take(N_LEN_ERROR_MESSAGE_SHORT).collect();
            match create_error_bytes(kind, &c_short, &[]) {
                Ok(out) => out,
                Err(err) => {
                    error!(error = %err, "short error document failed; returning plain text");
                    return create_text_document(&c_full, &err);
                }
            }
        }
    };

    SpecRenderedDocument {
        bytes: v_bytes,
        content_type: kind.content_type().to_string(),
        filename: format!("{C_FILENAME_STEM_CRITICAL}{}", kind.extension()),
        report: SpecRenderReport {
            pages: l_pages,
            warnings: Vec::new(),
            stages: vec![SpecStageResult {
                stage: "fallback".to_string(),
                outcome: EnumStageOutcome::Placeholder {
                    diagnostic: message.to_string(),
                },
            }],
        },
    }
}

fn create_error_bytes(
    kind: EnumDocumentKind,
    message: &str,
    trace: &[String],
) -> Result<(Vec<u8>, Vec<String>), ReportError> {
    let context = SpecReportContext {
        title: "Critical Error".to_string(),
        subtitle: None,
        generated_at: Utc::now().format("%d/%m/%Y %H:%M").to_string(),
        currency_symbol: String::new(),
    };
    let c_heading = match kind {
        EnumDocumentKind::Workbook => "Critical Error generating Excel",
        EnumDocumentKind::Deck => "Critical Error generating Presentation",
    };

    let mut canvas = create_canvas(kind, context, &SpecBrandAssets::default());
    let l_pages = canvas.add_error_page(C_ERROR_PAGE_LABEL, c_heading, message)?;
    if !trace.is_empty() {
        canvas.add_debug_log(trace)?;
    }
    Ok((canvas.finish()?, l_pages))
}

fn create_text_document(message: &str, err: &ReportError) -> SpecRenderedDocument {
    let mut report = SpecRenderReport::default();
    report.warn(format!("error document unavailable: {err}"));
    SpecRenderedDocument {
        bytes: message.as_bytes().to_vec(),
        content_type: C_MIME_TEXT.to_string(),
        filename: format!("{C_FILENAME_STEM_CRITICAL}.txt"),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_workbook_is_a_valid_package() {
        let doc = render_error_document(EnumDocumentKind::Workbook, "boom", &["stage x".to_string()]);
        assert_eq!(doc.content_type, EnumDocumentKind::Workbook.content_type());
        assert_eq!(doc.filename, "Critical_Error.xlsx");
        assert_eq!(doc.report.pages, vec![C_ERROR_PAGE_LABEL.to_string()]);
        assert_eq!(doc.report.placeholder_count(), 1);
        assert!(doc.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_error_deck_is_a_valid_package() {
        let doc = render_error_document(EnumDocumentKind::Deck, "boom", &[]);
        assert_eq!(doc.filename, "Critical_Error.pptx");
        assert!(doc.bytes.starts_with(b"PK"));
    }
}
