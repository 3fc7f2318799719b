use crate::cli::StoreArgs;
use crate::page_range::{parse_page_list, parse_page_ranges};
use crate::select::SplitMode;
use crate::service::Toolkit;
use anyhow::{Context, Result};
use std::path::Path;

pub async fn run<P: AsRef<Path>>(
    input: P,
    ranges: Option<&str>,
    pages: Option<&str>,
    merge: bool,
    store: &StoreArgs,
) -> Result<()> {
    let input = input.as_ref();

    let mode = match (ranges, pages) {
        (Some(ranges), _) => SplitMode::Range {
            ranges: parse_page_ranges(ranges)?,
            merge,
        },
        (None, Some(pages)) => SplitMode::Extract {
            pages: parse_page_list(pages)?,
            merge,
        },
        (None, None) => anyhow::bail!("No pages specified"),
    };

    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read PDF: {}", input.display()))?;

    let toolkit = Toolkit::new(store.file_store());
    let urls = toolkit
        .split_file(bytes, input.display().to_string(), mode)
        .await
        .with_context(|| format!("Failed to split {}", input.display()))?;

    if urls.is_empty() {
        println!("No pages selected; nothing written");
    }
    for url in &urls {
        println!("{}", url);
    }

    Ok(())
}
