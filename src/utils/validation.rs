use crate::utils::error::{Result, UiError};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(UiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(UiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        if let Some(extension) = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            if !allowed_set.contains(extension) {
                return Err(UiError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        } else {
            return Err(UiError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.clone(),
                reason: "File has no extension or invalid filename".to_string(),
            });
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| UiError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UiError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 解析節點路徑，例如 "0/2/1" 代表 root 的第 0 個子節點的第 2 個子節點...
/// 空字串代表 root 本身
pub fn parse_node_path(field_name: &str, path: &str) -> Result<Vec<usize>> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split('/')
        .map(|segment| {
            segment
                .trim()
                .parse::<usize>()
                .map_err(|e| UiError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: path.to_string(),
                    reason: format!("Invalid child index '{}': {}", segment, e),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output", "./out.html").is_ok());
        assert!(validate_path("output", "").is_err());
        assert!(validate_path("output", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["models.toml".to_string()];
        assert!(validate_file_extensions("config", &files, &["toml"]).is_ok());

        let invalid_files = vec!["models.json".to_string()];
        assert!(validate_file_extensions("config", &invalid_files, &["toml"]).is_err());

        let no_extension = vec!["models".to_string()];
        assert!(validate_file_extensions("config", &no_extension, &["toml"]).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("models.name", "card").is_ok());
        assert!(validate_non_empty_string("models.name", "   ").is_err());
    }

    #[test]
    fn test_parse_node_path() {
        assert_eq!(parse_node_path("steps.target", "").unwrap(), Vec::<usize>::new());
        assert_eq!(parse_node_path("steps.target", "/").unwrap(), Vec::<usize>::new());
        assert_eq!(parse_node_path("steps.target", "0/2/1").unwrap(), vec![0, 2, 1]);
        assert!(parse_node_path("steps.target", "0/x").is_err());
    }
}
