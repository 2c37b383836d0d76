// ============================================================
// Layer 6 - Inference Script Exporter
// ============================================================
// Writes a standalone POSIX shell script that scores one customer
// with the persisted artifacts. The script takes one positional
// argument per schema column, in schema order, and forwards them
// to `predict` together with the artifact directory and the schema
// fingerprint it was generated against.
//
// Everything column-related is derived from FEATURE_COLUMNS, so a
// schema change regenerates the script instead of silently
// diverging from it.

use std::{fs, path::Path};

use crate::domain::customer::FEATURE_COLUMNS;
use crate::domain::error::{ChurnError, ChurnResult};

pub const DEFAULT_SCRIPT_NAME: &str = "predict_churn.sh";

/// "MonthlyCharges" → "monthly-charges"
pub fn cli_flag(column: &str) -> String {
    let mut flag = String::with_capacity(column.len() + 4);
    for (i, ch) in column.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                flag.push('-');
            }
            flag.push(ch.to_ascii_lowercase());
        } else {
            flag.push(ch);
        }
    }
    flag
}

/// "MonthlyCharges" → "MONTHLY_CHARGES"
fn placeholder(column: &str) -> String {
    cli_flag(column).replace('-', "_").to_ascii_uppercase()
}

/// Single-quote for sh
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn render_inference_script(binary: &str, artifacts_dir: &str, fingerprint: &str) -> String {
    let usage: Vec<String> = FEATURE_COLUMNS.iter().map(|c| placeholder(c)).collect();
    let usage = usage.join(" ");

    let mut script = String::new();
    script.push_str("#!/bin/sh\n");
    script.push_str("# Churn inference script generated by churn-predict.\n");
    script.push_str(&format!("# Schema fingerprint: {fingerprint}\n"));
    script.push_str(&format!("# Columns: {}\n", FEATURE_COLUMNS.join(", ")));
    script.push_str("set -eu\n\n");
    script.push_str(&format!("if [ \"$#\" -ne {} ]; then\n", FEATURE_COLUMNS.len()));
    script.push_str(&format!("    echo \"usage: $0 {usage}\" >&2\n"));
    script.push_str("    exit 2\nfi\n\n");
    script.push_str(&format!(
        "exec {} predict \\\n    --artifacts-dir {} \\\n    --schema-fingerprint {}",
        shell_quote(binary),
        shell_quote(artifacts_dir),
        shell_quote(fingerprint),
    ));
    for (i, column) in FEATURE_COLUMNS.iter().enumerate() {
        script.push_str(&format!(" \\\n    --{} \"${{{}}}\"", cli_flag(column), i + 1));
    }
    script.push('\n');
    script
}

/// Write the script and mark it executable on Unix.
pub fn write_script(path: &Path, contents: &str) -> ChurnResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ChurnError::persistence("export", e))?;
    }
    fs::write(path, contents)
        .map_err(|e| ChurnError::persistence("export", format!("'{}': {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| ChurnError::persistence("export", e))?;
    }

    tracing::debug!("Wrote inference script '{}'", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flag_names() {
        assert_eq!(cli_flag("tenure"), "tenure");
        assert_eq!(cli_flag("MonthlyCharges"), "monthly-charges");
        assert_eq!(cli_flag("PaperlessBilling"), "paperless-billing");
    }

    #[test]
    fn test_script_lists_every_column_in_order() {
        let script = render_inference_script("churn-predict", "artifacts", "abc123");
        let mut last = 0;
        for (i, column) in FEATURE_COLUMNS.iter().enumerate() {
            let arg = format!("--{} \"${{{}}}\"", cli_flag(column), i + 1);
            let at  = script.find(&arg).unwrap_or_else(|| panic!("missing {arg}"));
            assert!(at > last);
            last = at;
        }
        assert!(script.contains("--schema-fingerprint 'abc123'"));
        assert!(script.contains("-ne 10"));
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        let script = render_inference_script("/opt/my bin/churn", "a'b", "f");
        assert!(script.contains("exec '/opt/my bin/churn' predict"));
        assert!(script.contains(r"--artifacts-dir 'a'\''b'"));
    }

    #[cfg(unix)]
    #[test]
    fn test_written_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SCRIPT_NAME);
        write_script(&path, "#!/bin/sh\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
