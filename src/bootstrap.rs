use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialise the global `tracing` subscriber, writing to stderr so stdout
/// stays clean for the report. Falls back to `info` for an unusable level.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    tracing_subscriber::registry().with(filter).with(layer).try_init()?;
    Ok(())
}

/// Expands glob patterns into paths; plain paths are kept as given, so a
/// missing file still reaches the pipeline and is reported there.
pub fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::<PathBuf>::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(input));
            continue;
        }
        let matches = glob::glob(input)
            .with_context(|| format!("invalid input pattern '{input}'"))?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("cannot expand '{input}'"))?;
        if matches.is_empty() {
            tracing::warn!(pattern = %input, "no file matches input pattern");
        }
        paths.extend(matches);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_sheets::ingest::UploadedFile;
    use tempfile::TempDir;

    #[test]
    fn expands_patterns_and_keeps_plain_paths() {
        let directory = TempDir::new().unwrap();
        for name in ["b.xlsx", "a.xlsx", "notas.txt"] {
            std::fs::write(directory.path().join(name), b"").unwrap();
        }
        let pattern = directory.path().join("*.xlsx").to_string_lossy().into_owned();
        let inputs = vec![pattern, "falta.ods".to_owned()];

        let paths = expand_inputs(&inputs).unwrap();
        let names: Vec<String> = paths.iter().map(|path| UploadedFile::display_name(path)).collect();
        assert_eq!(names, vec!["a.xlsx", "b.xlsx", "falta.ods"]);
    }

    #[test]
    fn pattern_without_matches_is_empty() {
        let directory = TempDir::new().unwrap();
        let pattern = directory.path().join("*.ods").to_string_lossy().into_owned();
        assert!(expand_inputs(&[pattern]).unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(expand_inputs(&["[".to_owned()]).is_err());
    }
}
