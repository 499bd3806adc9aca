//! Batch CLI command

use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::Value;

use super::output::{exit_code, Output};
use crate::batch::{parse_requests, BatchEngine, BatchError, BatchItemRequest, BatchResponse};
use crate::storage::Workspace;

/// Syntax of a batch source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// YAML for `.yaml` / `.yml` files, JSON otherwise
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => InputFormat::Yaml,
            _ => InputFormat::Json,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            InputFormat::Json => "JSON",
            InputFormat::Yaml => "YAML",
        }
    }
}

/// Reads the raw batch text from a file, or from stdin for `-` (always JSON)
pub fn read_source(input: &str) -> Result<(String, InputFormat)> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read batch from stdin")?;
        return Ok((content, InputFormat::Json));
    }

    let path = Path::new(input);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    Ok((content, InputFormat::for_path(path)))
}

/// Parses batch text; syntax errors reject the batch like any other bad input
pub fn parse_source(content: &str, format: InputFormat) -> Result<Value, BatchError> {
    let parsed = match format {
        InputFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        InputFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| BatchError::Unparseable {
        format: format.label(),
        message,
    })
}

pub fn run(output: &Output, input: &str, dry_run: bool) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let (content, format) = read_source(input)?;

    let requests = match parse_source(&content, format).and_then(|raw| parse_requests(&raw)) {
        Ok(requests) => requests,
        Err(err) => {
            let response = BatchResponse::rejected(&err);
            print_response(output, &[], &response);
            return Ok(ExitCode::FAILURE);
        }
    };

    output.verbose_ctx("batch", &format!("Loaded {} request(s) from {}", requests.len(), input));

    let response = if dry_run {
        output.verbose_ctx("batch", "Dry run: using an in-memory copy of the workspace items");
        let mut backend = workspace.dry_run_backend()?;
        let response = BatchEngine::new(&mut backend).run(&requests);
        output.verbose_ctx("batch", &format!("{} call(s) would be made", backend.calls().len()));
        response
    } else {
        let mut backend = workspace.backend()?;
        output.verbose_ctx("batch", &format!("Using backend: {}", backend.name()));
        BatchEngine::new(backend.as_mut()).run(&requests)
    };

    print_response(output, &requests, &response);

    Ok(exit_code(response.success))
}

fn print_response(output: &Output, requests: &[BatchItemRequest], response: &BatchResponse) {
    if output.is_json() {
        output.json(response);
        return;
    }

    if let Some(error) = &response.error {
        println!("Batch rejected: {}", error);
        return;
    }

    for result in &response.results {
        let name = requests
            .get(result.index)
            .map(|r| r.name.as_str())
            .unwrap_or_default();
        let index = format!("[{}]", result.index);

        match (&result.id, &result.error) {
            (Some(id), _) => output.row(&[index.as_str(), "created", id.as_str(), name]),
            (None, error) => {
                let kind = result.error_kind.map(|k| k.as_str()).unwrap_or("error");
                output.row(&[index.as_str(), "failed", kind, name, error.as_deref().unwrap_or_default()])
            }
        }
    }

    println!();
    println!(
        "Created {} of {} item(s)",
        response.created_count(),
        response.results.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_yaml_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batch.yaml");
        fs::write(
            &path,
            "- type: project\n  name: Launch\n  tempId: p\n- type: task\n  name: Plan\n  parentTempId: p\n",
        )
        .unwrap();

        let (content, format) = read_source(path.to_str().unwrap()).unwrap();
        assert_eq!(format, InputFormat::Yaml);

        let requests = parse_requests(&parse_source(&content, format).unwrap()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].parent_temp_id.as_ref().unwrap().as_str(), "p");
    }

    #[test]
    fn reads_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(&path, r#"[{"type":"task","name":"One"}]"#).unwrap();

        let (content, format) = read_source(path.to_str().unwrap()).unwrap();
        assert_eq!(format, InputFormat::Json);
        assert!(parse_source(&content, format).unwrap().is_array());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");

        let err = read_source(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.json"));
    }

    #[test]
    fn invalid_json_rejects_the_batch() {
        let err = parse_source("[{", InputFormat::Json).unwrap_err();
        assert!(matches!(err, BatchError::Unparseable { format: "JSON", .. }));

        let response = BatchResponse::rejected(&err);
        assert!(!response.success);
        assert!(response.results.is_empty());
        assert!(response.error.unwrap().starts_with("batch input is not valid JSON"));
    }

    #[test]
    fn invalid_yaml_rejects_the_batch() {
        let err = parse_source("- name: [unclosed", InputFormat::Yaml).unwrap_err();
        assert!(err.to_string().starts_with("batch input is not valid YAML"));
    }
}
