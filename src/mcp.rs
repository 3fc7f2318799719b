use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};

use crate::page_range::{parse_page_list, parse_page_ranges};
use crate::pdf::{Rotation, SourceDocument};
use crate::select::SplitMode;
use crate::service::Toolkit;
use crate::store::FileStore;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MergeInput {
    #[schemars(description = "Path to a PDF file")]
    pub path: String,
    #[schemars(description = "Rotation applied to every page of this file: 0, 90, 180 or 270 (default: 0)")]
    #[serde(default)]
    pub rotation: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "Files to merge, in output order")]
    pub inputs: Vec<MergeInput>,
    #[schemars(description = "Directory the merged PDF is written to")]
    pub output_dir: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Either 'range' or 'extract'")]
    pub mode: String,
    #[schemars(description = "Range mode: page ranges (e.g., '1-5,8-10'); each range is one output")]
    #[serde(default)]
    pub ranges: Option<String>,
    #[schemars(description = "Extract mode: page numbers (e.g., '3,1,7'); each page is one output")]
    #[serde(default)]
    pub pages: Option<String>,
    #[schemars(description = "Combine all selected pages into a single output (default: false)")]
    #[serde(default)]
    pub merge: bool,
    #[schemars(description = "Directory the output PDFs are written to")]
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn toolkit_for(output_dir: &str) -> Toolkit<FileStore> {
    Toolkit::new(FileStore::new(output_dir, output_dir))
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get the page count of a PDF")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match SourceDocument::open(&path) {
            Ok(doc) => {
                let result = PdfInfoResult {
                    path,
                    page_count: doc.page_count(),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Merge PDFs into one, in the given order, optionally rotating each file's pages")]
    async fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        let mut files = Vec::with_capacity(req.inputs.len());
        for input in req.inputs {
            let rotation = match Rotation::try_from(input.rotation) {
                Ok(r) => r,
                Err(e) => return format!("Error: {}", e),
            };
            match tokio::fs::read(&input.path).await {
                Ok(bytes) => files.push((bytes, rotation)),
                Err(e) => return format!("Error: Failed to read {}: {}", input.path, e),
            }
        }
        if files.is_empty() {
            return "Error: No input files specified".to_string();
        }

        match toolkit_for(&req.output_dir).merge_files(files).await {
            Ok(output) => {
                let result = OutputsResult {
                    outputs: output.into_iter().collect(),
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Split a PDF by page ranges or extract single pages. Pages outside the document are skipped.")]
    async fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        let mode = match req.mode.as_str() {
            "range" => match req.ranges.as_deref().map(parse_page_ranges) {
                Some(Ok(ranges)) => SplitMode::Range {
                    ranges,
                    merge: req.merge,
                },
                Some(Err(e)) => return format!("Error: {}", e),
                None => return "Error: 'ranges' is required in range mode".to_string(),
            },
            "extract" => match req.pages.as_deref().map(parse_page_list) {
                Some(Ok(pages)) => SplitMode::Extract {
                    pages,
                    merge: req.merge,
                },
                Some(Err(e)) => return format!("Error: {}", e),
                None => return "Error: 'pages' is required in extract mode".to_string(),
            },
            other => return format!("Error: Unknown split mode: {}", other),
        };

        let bytes = match tokio::fs::read(&req.path).await {
            Ok(b) => b,
            Err(e) => return format!("Error: Failed to read {}: {}", req.path, e),
        };

        match toolkit_for(&req.output_dir)
            .split_file(bytes, req.path.clone(), mode)
            .await
        {
            Ok(outputs) => serde_json::to_string_pretty(&OutputsResult { outputs })
                .unwrap_or_else(|e| format!("Error: {}", e)),
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: usize,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OutputsResult {
    pub outputs: Vec<String>,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page assembly tools. Use pdf_info to get the page count, pdf_merge to \
                 combine PDFs (with per-file rotation), and pdf_split to cut a PDF into page \
                 ranges or single pages."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{labelled_pdf, labels, page_labels};

    #[tokio::test]
    async fn test_split_tool_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.pdf");
        std::fs::write(&input, labelled_pdf(4, "S")).unwrap();
        let out = dir.path().join("out");

        let server = PdfServer::new();
        let response = server
            .pdf_split(Parameters(PdfSplitRequest {
                path: input.display().to_string(),
                mode: "range".into(),
                ranges: Some("3-4,1".into()),
                pages: None,
                merge: false,
                output_dir: out.display().to_string(),
            }))
            .await;

        let result: OutputsResult = serde_json::from_str(&response).unwrap();
        assert_eq!(result.outputs.len(), 2);
        let first = std::fs::read(&result.outputs[0]).unwrap();
        assert_eq!(page_labels(&first), labels("S", &[3, 4]));
    }

    #[tokio::test]
    async fn test_split_tool_reports_errors_as_text() {
        let server = PdfServer::new();
        let response = server
            .pdf_split(Parameters(PdfSplitRequest {
                path: "missing.pdf".into(),
                mode: "extract".into(),
                ranges: None,
                pages: None,
                merge: false,
                output_dir: "unused".into(),
            }))
            .await;
        assert!(response.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_merge_tool_rejects_bad_rotation() {
        let server = PdfServer::new();
        let response = server
            .pdf_merge(Parameters(PdfMergeRequest {
                inputs: vec![MergeInput {
                    path: "a.pdf".into(),
                    rotation: 45,
                }],
                output_dir: "unused".into(),
            }))
            .await;
        assert!(response.contains("multiple of 90"));
    }

    #[test]
    fn test_info_tool() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.pdf");
        std::fs::write(&input, labelled_pdf(3, "A")).unwrap();
        let response = PdfServer::new().pdf_info(Parameters(PathRequest {
            path: input.display().to_string(),
        }));
        let result: PdfInfoResult = serde_json::from_str(&response).unwrap();
        assert_eq!(result.page_count, 3);
    }
}
