//! Request handling shared by the HTTP API, the MCP server and the CLI.
//!
//! A request is all-or-nothing: every source is loaded and every output
//! assembled before anything is written to the store.

use crate::error::SpliceError;
use crate::fanout::{merge_sources, split_source, OutputDocument};
use crate::page_range::PageRange;
use crate::pdf::{Rotation, SourceDocument};
use crate::select::SplitMode;
use crate::store::{object_key, BlobStore};
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Standard alphabet; trailing `=` padding is optional on input.
const PAYLOAD_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    #[serde(default)]
    pub files: Option<Vec<MergeFile>>,
}

#[derive(Debug, Deserialize)]
pub struct MergeFile {
    #[serde(alias = "pdfBytesBase64")]
    pub pdf: String,
    #[serde(default)]
    pub rotation: Rotation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MergeResponse {
    pub message: String,
    /// Absent when no source had any pages.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    #[serde(default, alias = "pdfBytesBase64")]
    pub pdf_base64: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub options: Option<SplitOptions>,
}

#[derive(Debug, Deserialize)]
pub struct SplitOptions {
    #[serde(default)]
    pub merge: bool,
    #[serde(default)]
    pub ranges: Option<Vec<PageRange>>,
    #[serde(default)]
    pub pages: Option<Vec<i64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SplitResponse {
    pub message: String,
    pub urls: Vec<String>,
}

impl SplitRequest {
    /// Validate the payload and decode the document bytes.
    pub fn into_parts(self) -> Result<(Vec<u8>, String, SplitMode), SpliceError> {
        // Blank strings count as missing
        let pdf_base64 = self.pdf_base64.filter(|s| !s.trim().is_empty());
        let mode = self.mode.filter(|s| !s.trim().is_empty());
        let (Some(pdf_base64), Some(mode), Some(options)) = (pdf_base64, mode, self.options) else {
            return Err(SpliceError::InvalidPayload(
                "pdfBase64, mode and options are required".into(),
            ));
        };

        let mode = match mode.as_str() {
            "range" => SplitMode::Range {
                ranges: options.ranges.ok_or_else(|| {
                    SpliceError::InvalidPayload("options.ranges is required in range mode".into())
                })?,
                merge: options.merge,
            },
            "extract" => SplitMode::Extract {
                pages: options.pages.ok_or_else(|| {
                    SpliceError::InvalidPayload("options.pages is required in extract mode".into())
                })?,
                merge: options.merge,
            },
            other => {
                return Err(SpliceError::InvalidPayload(format!(
                    "Unknown split mode: {}",
                    other
                )))
            }
        };

        let bytes = decode_pdf(&pdf_base64)?;
        let name = self
            .original_name
            .unwrap_or_else(|| "document.pdf".to_string());
        Ok((bytes, name, mode))
    }
}

impl MergeRequest {
    pub fn into_sources(self) -> Result<Vec<(Vec<u8>, Rotation)>, SpliceError> {
        let files = self
            .files
            .filter(|files| !files.is_empty())
            .ok_or_else(|| SpliceError::InvalidPayload("No PDF files provided".into()))?;

        files
            .into_iter()
            .map(|file| Ok((decode_pdf(&file.pdf)?, file.rotation)))
            .collect()
    }
}

fn decode_pdf(encoded: &str) -> Result<Vec<u8>, SpliceError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(SpliceError::InvalidPayload("PDF data is empty".into()));
    }
    PAYLOAD_BASE64
        .decode(encoded)
        .map_err(|e| SpliceError::InvalidPayload(format!("Invalid PDF base64: {}", e)))
}

/// Runs the page-assembly pipeline and persists its outputs.
#[derive(Debug, Clone)]
pub struct Toolkit<S> {
    store: S,
}

impl<S: BlobStore> Toolkit<S> {
    pub fn new(store: S) -> Self {
        Toolkit { store }
    }

    pub async fn merge(&self, request: MergeRequest) -> Result<MergeResponse, SpliceError> {
        let url = self.merge_files(request.into_sources()?).await?;
        Ok(MergeResponse {
            message: "PDFs merged successfully".to_string(),
            url,
        })
    }

    pub async fn split(&self, request: SplitRequest) -> Result<SplitResponse, SpliceError> {
        let (bytes, name, mode) = request.into_parts()?;
        let urls = self.split_file(bytes, name, mode).await?;
        Ok(SplitResponse {
            message: "PDF split successfully".to_string(),
            urls,
        })
    }

    /// Merge every page of `files`, in order, rotating each file's pages.
    pub async fn merge_files(
        &self,
        files: Vec<(Vec<u8>, Rotation)>,
    ) -> Result<Option<String>, SpliceError> {
        let file_count = files.len();
        let output = run_blocking(move || {
            let sources = files
                .iter()
                .enumerate()
                .map(|(i, (bytes, rotation))| {
                    SourceDocument::load(bytes)
                        .map(|doc| (doc, *rotation))
                        .map_err(|e| match e {
                            SpliceError::Codec(msg) => {
                                SpliceError::Codec(format!("document {}: {}", i + 1, msg))
                            }
                            other => other,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            merge_sources(&sources)
        })
        .await?;

        info!(
            files = file_count,
            pages = output.as_ref().map_or(0, |o| o.page_count),
            "Merged documents"
        );
        let mut urls = self.persist(None, output.into_iter().collect()).await?;
        Ok(urls.pop())
    }

    /// Split one document according to `mode`. Returns one URL per output,
    /// in unit order; an empty list when nothing was selected.
    pub async fn split_file(
        &self,
        bytes: Vec<u8>,
        original_name: String,
        mode: SplitMode,
    ) -> Result<Vec<String>, SpliceError> {
        let outputs = run_blocking(move || {
            let source = SourceDocument::load(&bytes)?;
            split_source(&source, &mode)
        })
        .await?;

        info!(
            name = %original_name,
            outputs = outputs.len(),
            "Split document"
        );
        self.persist(Some(original_name), outputs).await
    }

    /// Write outputs concurrently; URLs come back in output order.
    async fn persist(
        &self,
        original_name: Option<String>,
        outputs: Vec<OutputDocument>,
    ) -> Result<Vec<String>, SpliceError> {
        let handles: Vec<_> = outputs
            .into_iter()
            .map(|output| {
                let store = self.store.clone();
                let key = object_key(original_name.as_deref(), &output.label);
                tokio::spawn(async move { store.put(key, output.bytes).await })
            })
            .collect();

        let mut urls = Vec::with_capacity(handles.len());
        for handle in handles {
            let url = handle
                .await
                .map_err(|e| SpliceError::Persistence(format!("Store task failed: {}", e)))??;
            urls.push(url);
        }
        Ok(urls)
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, SpliceError>
where
    F: FnOnce() -> Result<T, SpliceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SpliceError::Assembly(format!("Worker task failed: {}", e)))?
}
