//! Centralized validation for uploads and record limits.

/// Maximum number of parts allowed in a single position file (DOS protection)
pub const MAX_PARTS: usize = 100_000;

/// Maximum number of stations allowed in a single catalog (DOS protection)
pub const MAX_STATIONS: usize = 100_000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;
pub const MIN_FILE_CONTENT_SIZE: usize = 1;

/// What an uploaded file is expected to contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Part position file (CSV)
    Positions,
    /// Station catalog (CSV or JSON)
    Stations,
    /// Alias/ignore configuration (JSON)
    Config,
}

impl UploadKind {
    /// Multipart field name carrying this kind of upload
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Positions => "positions",
            Self::Stations => "stations",
            Self::Config => "config",
        }
    }
}

/// Check if adding another record would exceed `max`.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize, max: usize) -> Option<String> {
    if count >= max {
        Some(format!(
            "Too many records: adding another would exceed maximum of {max}"
        ))
    } else {
        None
    }
}

/// Security validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
    #[error("File content appears malformed or invalid")]
    InvalidFileContent,
    #[error("File format validation failed")]
    FormatValidationFailed,
}

/// Secure filename validation to prevent directory traversal and other attacks
///
/// Rejects empty or overlong names, path separators, `..` and control
/// characters, then strips everything but ASCII alphanumerics and `.-_ `.
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the filename is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    if filename.contains('\0') || filename.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidFilename);
    }

    let sanitized = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_' || *c == ' ')
        .collect::<String>();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    // Hidden files only when the extension is one we read
    if sanitized.starts_with('.') && !has_known_extension(&sanitized) {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}

/// Check if filename has a known safe extension
fn has_known_extension(filename: &str) -> bool {
    let safe_extensions = [".csv", ".pos", ".json", ".txt", ".dpv"];

    safe_extensions
        .iter()
        .any(|ext| filename.to_lowercase().ends_with(ext))
}

/// Validate that file content is plain text and not obviously malformed
///
/// # Errors
///
/// Returns `ValidationError::InvalidFileContent` if the content is empty,
/// mostly non-printable, or not UTF-8.
pub fn validate_file_content(content: &[u8]) -> Result<(), ValidationError> {
    if content.len() < MIN_FILE_CONTENT_SIZE {
        return Err(ValidationError::InvalidFileContent);
    }

    let non_printable_count = content
        .iter()
        .filter(|&&b| b < 9 || (b > 13 && b < 32))
        .count();

    // Allow up to 5% control characters
    if content.len() > 100 && non_printable_count > content.len() / 20 {
        return Err(ValidationError::InvalidFileContent);
    }

    if std::str::from_utf8(content).is_err() {
        return Err(ValidationError::InvalidFileContent);
    }

    Ok(())
}

/// Check that text content plausibly holds the expected kind of data
#[must_use]
pub fn validate_file_format(content: &str, kind: UploadKind) -> bool {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let first_line = trimmed.lines().next().unwrap_or("").to_lowercase();

    match kind {
        UploadKind::Positions => first_line.contains("ref") && first_line.contains("val"),
        UploadKind::Stations => {
            trimmed.starts_with('[') || (first_line.contains("id") && first_line.contains("note"))
        }
        UploadKind::Config => trimmed.starts_with('{'),
    }
}

/// Comprehensive input validation combining filename and content checks
///
/// # Errors
///
/// Returns a `ValidationError` if filename validation fails, the content is
/// not text, or it does not look like `kind`.
pub fn validate_upload(
    filename: Option<&str>,
    content: &[u8],
    kind: UploadKind,
) -> Result<Option<String>, ValidationError> {
    let validated_filename = if let Some(name) = filename {
        Some(validate_filename(name)?)
    } else {
        None
    };

    validate_file_content(content)?;

    let text = std::str::from_utf8(content).map_err(|_| ValidationError::InvalidFileContent)?;
    if !validate_file_format(text, kind) {
        return Err(ValidationError::FormatValidationFailed);
    }

    Ok(validated_filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_record_limit() {
        assert!(check_record_limit(100, MAX_PARTS).is_none());
        assert!(check_record_limit(MAX_PARTS - 1, MAX_PARTS).is_none());
        assert!(check_record_limit(MAX_PARTS, MAX_PARTS).is_some());
        assert!(check_record_limit(3, 3).is_some());
    }

    #[test]
    fn test_validate_filename_safe() {
        assert!(validate_filename("board-top.csv").is_ok());
        assert!(validate_filename("feeders.json").is_ok());
        assert!(validate_filename("my board 2.pos").is_ok());
    }

    #[test]
    fn test_validate_filename_dangerous() {
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("..\\windows\\system32").is_err());
        assert!(validate_filename("a/b.csv").is_err());
        assert!(validate_filename("test\0.csv").is_err());
        assert!(validate_filename("test\x01.csv").is_err());
        assert!(validate_filename(&"a".repeat(300)).is_err());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("   ").is_err());
        assert!(validate_filename(".hidden").is_err());
    }

    #[test]
    fn test_validate_filename_sanitization() {
        assert_eq!(validate_filename("pos@#$%file.csv").unwrap(), "posfile.csv");
        assert_eq!(validate_filename(".dpv").unwrap(), ".dpv");
    }

    #[test]
    fn test_validate_file_content() {
        assert!(validate_file_content(b"Ref,Val\nR1,10k\n").is_ok());
        assert!(validate_file_content("Désignateur,Val\n".as_bytes()).is_ok());
        assert!(validate_file_content(&[0u8; 1000]).is_err());
        assert!(validate_file_content(&[0xFF, 0xFE, 0x41]).is_err());
        assert!(validate_file_content(b"").is_err());
    }

    #[test]
    fn test_validate_file_format() {
        assert!(validate_file_format(
            "Ref,Val,Package,PosX,PosY,Rot,Side\n",
            UploadKind::Positions
        ));
        assert!(!validate_file_format("ID,Note\n", UploadKind::Positions));

        assert!(validate_file_format("ID,Note,DeltX\n", UploadKind::Stations));
        assert!(validate_file_format("  [{\"ID\": \"1\"}]", UploadKind::Stations));
        assert!(!validate_file_format("Ref,Val\n", UploadKind::Stations));

        assert!(validate_file_format("{\"aliases\": {}}", UploadKind::Config));
        assert!(!validate_file_format("[]", UploadKind::Config));
    }

    #[test]
    fn test_validate_upload() {
        let positions = b"Ref,Val,Package,PosX,PosY,Rot,Side\nR1,10k,0603,1,2,0,top\n";

        let result = validate_upload(Some("board.csv"), positions, UploadKind::Positions);
        assert_eq!(result.unwrap().as_deref(), Some("board.csv"));

        assert!(validate_upload(None, positions, UploadKind::Positions)
            .unwrap()
            .is_none());

        assert!(validate_upload(Some("../board.csv"), positions, UploadKind::Positions).is_err());
        assert!(matches!(
            validate_upload(Some("board.csv"), positions, UploadKind::Config),
            Err(ValidationError::FormatValidationFailed)
        ));
    }

    #[test]
    fn test_has_known_extension() {
        assert!(has_known_extension(".csv"));
        assert!(has_known_extension("x.JSON"));
        assert!(has_known_extension(".dpv"));
        assert!(!has_known_extension(".exe"));
        assert!(!has_known_extension(".hidden"));
    }
}
