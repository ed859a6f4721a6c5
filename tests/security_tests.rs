//! Security Test Suite
//!
//! Validates the hardening of the upload path: filename sanitization,
//! content checks, format sniffing and error message sanitization.

use feeder_solver::utils::validation::{
    validate_file_content, validate_file_format, validate_filename, validate_upload, UploadKind,
    ValidationError,
};

const POSITIONS: &[u8] = b"Ref,Val,PosX,PosY,Rot\nR1,10k,0,0,0\n";
const STATIONS: &[u8] = b"ID,Note\n1,10k\n";

/// Test secure temporary file creation
#[tokio::test]
async fn test_temp_file_security() {
    use tempfile::NamedTempFile;

    let mut temp_files = Vec::new();
    for _ in 0..10 {
        let temp_file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
        let path = temp_file.path().to_string_lossy();

        assert!(!path.contains("feeder_solver_temp"));
        assert!(!path.contains(std::process::id().to_string().as_str()));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(temp_file.path()).expect("Failed to get metadata");
            assert_eq!(
                metadata.permissions().mode() & 0o777,
                0o600,
                "Temp file should have owner-only permissions"
            );
        }

        temp_files.push(temp_file);
    }

    let unique_paths: std::collections::HashSet<_> =
        temp_files.iter().map(|f| f.path().to_path_buf()).collect();
    assert_eq!(temp_files.len(), unique_paths.len());
}

/// Test filename validation and sanitization
#[test]
fn test_filename_validation_security() {
    let traversal_attempts = vec![
        "../etc/passwd",
        "..\\windows\\system32",
        "boards/../../secret.csv",
        "feeders/../../../etc/passwd",
        "..\\..\\..\\windows\\system.ini",
    ];

    for attempt in traversal_attempts {
        match validate_filename(attempt) {
            Err(ValidationError::InvalidFilename) => {}
            Ok(_) => panic!("Directory traversal attempt '{attempt}' should have been blocked"),
            Err(e) => panic!("Unexpected error for '{attempt}': {e:?}"),
        }
    }

    for attempt in ["board\0.csv", "board.csv\0", "file\x00name.csv"] {
        assert!(
            validate_filename(attempt).is_err(),
            "Null byte injection '{attempt}' should be blocked"
        );
    }

    for attempt in ["board\x01.csv", "file\x1f.csv", "name\x0b.csv"] {
        assert!(
            validate_filename(attempt).is_err(),
            "Control character injection '{attempt}' should be blocked"
        );
    }

    let valid_tests = vec![
        ("board.csv", "board.csv"),
        ("my-board_rev2.pos", "my-board_rev2.pos"),
        ("feeders@#$%.json", "feeders.json"),
        ("main board.csv", "main board.csv"),
        (".feeders.json", ".feeders.json"),
    ];

    for (input, expected) in valid_tests {
        match validate_filename(input) {
            Ok(sanitized) => assert_eq!(sanitized, expected, "Sanitization failed for '{input}'"),
            Err(e) => panic!("Valid filename '{input}' should be accepted: {e:?}"),
        }
    }

    assert!(validate_filename(".bashrc").is_err());
}

/// Test format sniffing of uploaded text
#[test]
fn test_file_format_validation() {
    assert!(validate_file_format("Ref,Val,PosX,PosY,Rot\n", UploadKind::Positions));
    assert!(validate_file_format("\u{feff}REF,VAL,PosX\n", UploadKind::Positions));
    assert!(!validate_file_format("ID,Note\n1,10k\n", UploadKind::Positions));

    assert!(validate_file_format("ID,Note\n1,10k\n", UploadKind::Stations));
    assert!(validate_file_format("  [{\"ID\": \"1\"}]", UploadKind::Stations));
    assert!(!validate_file_format("Ref,Val\n", UploadKind::Stations));

    assert!(validate_file_format("{\"version\": \"1.0.0\"}", UploadKind::Config));
    assert!(!validate_file_format("[]", UploadKind::Config));

    assert!(!validate_file_format("", UploadKind::Positions));
    assert!(!validate_file_format("", UploadKind::Stations));
    assert!(!validate_file_format("", UploadKind::Config));
}

/// Test content integrity validation
#[test]
fn test_content_integrity_validation() {
    assert!(validate_file_content(POSITIONS).is_ok());
    assert!(validate_file_content("Ref,Val\nR1,10µ\n".as_bytes()).is_ok());

    assert!(validate_file_content(b"").is_err());
    assert!(validate_file_content(&[0u8; 1000]).is_err());
    assert!(validate_file_content(&[0xC3, 0x28, 0x41, 0x42]).is_err());

    let mut mostly_binary = vec![1u8; 500];
    mostly_binary.extend_from_slice(b"Ref,Val");
    assert!(validate_file_content(&mostly_binary).is_err());
}

/// Test comprehensive upload validation
#[test]
fn test_comprehensive_upload_validation() {
    let result = validate_upload(Some("board.csv"), POSITIONS, UploadKind::Positions);
    assert_eq!(result.unwrap().as_deref(), Some("board.csv"));

    let result = validate_upload(None, STATIONS, UploadKind::Stations);
    assert!(result.unwrap().is_none());

    assert!(matches!(
        validate_upload(Some("../etc/passwd"), POSITIONS, UploadKind::Positions),
        Err(ValidationError::InvalidFilename)
    ));

    assert!(matches!(
        validate_upload(Some("board.csv"), STATIONS, UploadKind::Positions),
        Err(ValidationError::FormatValidationFailed)
    ));

    assert!(matches!(
        validate_upload(Some("config.json"), b"", UploadKind::Config),
        Err(ValidationError::InvalidFileContent)
    ));
}

/// Test error message sanitization
#[test]
fn test_error_sanitization() {
    use feeder_solver::web::server::create_safe_error_response;

    let error_response = create_safe_error_response(
        "test_error",
        "User-friendly message",
        Some("/internal/path/file.rs:123 - Station file unreadable"),
    );

    assert_eq!(error_response.error, "User-friendly message");
    assert_eq!(error_response.error_type, "test_error");
    assert!(
        error_response.details.is_none(),
        "Internal details should never be exposed"
    );

    let error_response = create_safe_error_response("test_error", "User message", None);
    assert!(error_response.details.is_none());
}

/// Test validation error handling
#[test]
fn test_validation_error_handling() {
    let long_filename = "a".repeat(300);
    let test_cases = vec![
        ("", ValidationError::EmptyFilename),
        ("   ", ValidationError::EmptyFilename),
        (long_filename.as_str(), ValidationError::FilenameTooLong),
        ("../etc/passwd", ValidationError::InvalidFilename),
        ("board\0.csv", ValidationError::InvalidFilename),
        ("@#$%", ValidationError::InvalidFilename),
    ];

    for (input, expected_error_type) in test_cases {
        let error = validate_filename(input).unwrap_err();
        match (&error, &expected_error_type) {
            (ValidationError::EmptyFilename, ValidationError::EmptyFilename)
            | (ValidationError::FilenameTooLong, ValidationError::FilenameTooLong)
            | (ValidationError::InvalidFilename, ValidationError::InvalidFilename) => {}
            _ => panic!(
                "Expected error type {expected_error_type:?} but got {error:?} for input '{input}'"
            ),
        }
    }
}
