use crate::error::ToolError;
use crate::pdf::PdfBackend;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::process::Command;

static PAGES_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").unwrap());

/// Backend that shells out to `pdfinfo` (poppler) and `pdfjam`.
#[derive(Debug, Clone)]
pub struct PopplerBackend {
    pub pdfinfo: String,
    pub pdfjam: String,
}

impl Default for PopplerBackend {
    fn default() -> Self {
        PopplerBackend {
            pdfinfo: "pdfinfo".to_string(),
            pdfjam: "pdfjam".to_string(),
        }
    }
}

struct Captured {
    stdout: String,
}

fn run(tool: &str, args: &[String]) -> Result<Captured, ToolError> {
    tracing::debug!("Running {} {:?}", tool, args);
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|source| ToolError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        return Err(ToolError::CommandFailed {
            tool: tool.to_string(),
            args: args.to_vec(),
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(Captured { stdout })
}

/// Pull the page count out of `pdfinfo` output
fn parse_page_count(info: &str) -> Option<u32> {
    PAGES_LINE
        .captures(info)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl PdfBackend for PopplerBackend {
    fn page_count(&self, document: &Path) -> Result<u32, ToolError> {
        let args = vec![document.display().to_string()];
        let captured = run(&self.pdfinfo, &args)?;
        parse_page_count(&captured.stdout).ok_or_else(|| ToolError::NoPageCount {
            tool: self.pdfinfo.clone(),
            path: document.to_path_buf(),
        })
    }

    fn extract(
        &self,
        document: &Path,
        first: u32,
        last: u32,
        output: &Path,
    ) -> Result<(), ToolError> {
        let args = vec![
            document.display().to_string(),
            format!("{}-{}", first, last),
            "-o".to_string(),
            output.display().to_string(),
        ];
        run(&self.pdfjam, &args)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDFINFO_OUTPUT: &str = "Title:          Field Guide\n\
                                  Producer:       pdfTeX-1.40.21\n\
                                  Pages:          212\n\
                                  Encrypted:      no\n";

    #[test]
    fn test_parse_page_count() {
        assert_eq!(parse_page_count(PDFINFO_OUTPUT), Some(212));
    }

    #[test]
    fn test_parse_page_count_missing() {
        assert_eq!(parse_page_count("Title: x\nEncrypted: no\n"), None);
        assert_eq!(parse_page_count("Pages: many\n"), None);
    }

    #[test]
    fn test_missing_tool_is_spawn_error() {
        let backend = PopplerBackend {
            pdfinfo: "pdfexplode-no-such-tool".to_string(),
            ..Default::default()
        };
        let err = backend.page_count(Path::new("book.pdf")).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
