use crate::cli::StoreArgs;
use crate::pdf::Rotation;
use crate::service::Toolkit;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

pub async fn run(inputs: &[String], store: &StoreArgs) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (path, rotation) = parse_input(input)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        files.push((bytes, rotation));
    }

    let toolkit = Toolkit::new(store.file_store());
    match toolkit.merge_files(files).await? {
        Some(url) => println!("Merged {} files into {}", inputs.len(), url),
        None => println!("Inputs have no pages; nothing written"),
    }

    Ok(())
}

/// Split "scan.pdf:90" into a path and a rotation. A suffix that is not a
/// number is treated as part of the path.
fn parse_input(input: &str) -> Result<(PathBuf, Rotation)> {
    if let Some((path, suffix)) = input.rsplit_once(':') {
        if let Ok(degrees) = suffix.trim().parse::<i64>() {
            let rotation = Rotation::try_from(degrees).map_err(|e| anyhow!("{}: {}", input, e))?;
            return Ok((PathBuf::from(path), rotation));
        }
    }
    Ok((PathBuf::from(input), Rotation::None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let (path, rotation) = parse_input("a.pdf").unwrap();
        assert_eq!(path, PathBuf::from("a.pdf"));
        assert_eq!(rotation, Rotation::None);
    }

    #[test]
    fn test_path_with_rotation() {
        let (path, rotation) = parse_input("dir/a.pdf:270").unwrap();
        assert_eq!(path, PathBuf::from("dir/a.pdf"));
        assert_eq!(rotation, Rotation::Left);
    }

    #[test]
    fn test_non_numeric_suffix_is_path() {
        let (path, _) = parse_input(r"C:\scans\a.pdf").unwrap();
        assert_eq!(path, PathBuf::from(r"C:\scans\a.pdf"));
    }

    #[test]
    fn test_bad_rotation() {
        assert!(parse_input("a.pdf:45").is_err());
    }
}
