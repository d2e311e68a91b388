    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "server.port"));
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = Config::default();
        config.server.host = String::new();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "server.host"));
    }

    #[test]
    fn test_validate_zero_debounce() {
        let mut config = Config::default();
        config.events.debounce_ms = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "events.debounce_ms"));
    }

    #[test]
    fn test_validate_high_debounce_warning() {
        let mut config = Config::default();
        config.events.debounce_ms = 10_000;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "events.debounce_ms"));
    }

    #[test]
    fn test_validate_unknown_event_type() {
        let mut config = Config::default();
        config.events.captured.push("teleport".to_string());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        let error = result
            .errors
            .iter()
            .find(|e| e.path == "events.captured")
            .unwrap();
        assert!(error.message.contains("teleport"));
    }

    #[test]
    fn test_validate_event_in_both_lists() {
        let mut config = Config::default();
        config.events.debounced.push("click".to_string());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "events"));
    }

    #[test]
    fn test_validate_empty_document() {
        let mut config = Config::default();
        config.document.html = "   ".to_string();

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "document.html"));
    }

    #[test]
    fn test_validate_missing_html_path_warning() {
        let mut config = Config::default();
        config.document.html = String::new();
        config.document.html_path = Some("/nonexistent/page.html".into());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "document.html_path"));
    }

    #[test]
    fn test_validate_existing_html_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.document.html_path = Some(file.path().to_path_buf());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_sandbox() {
        let mut config = Config::default();
        config.sandbox.channel_capacity = 0;
        config.sandbox.preload.push(" ".to_string());

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.errors.iter().any(|e| e.path == "sandbox.channel_capacity"));
        assert!(result.errors.iter().any(|e| e.path == "sandbox.preload"));
    }

    #[test]
    fn test_validate_multiple_errors() {
        let mut config = Config::default();
        config.server.port = 0;
        config.server.host = String::new();
        config.events.debounce_ms = 0;

        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(result.errors.len() >= 3);
    }

    #[test]
    fn test_validation_result_add_error() {
        let mut result = ValidationResult::default();
        result.add_error(ValidationError::new("test", "error"));
        assert!(!result.is_valid());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_validation_result_add_warning() {
        let mut result = ValidationResult::default();
        result.add_warning(ValidationWarning::new("test", "warning"));
        assert!(result.is_valid()); // Warnings don't make it invalid
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_into_result() {
        let mut result = ValidationResult::default();
        result.add_warning(ValidationWarning::new("a", "w"));
        assert_eq!(result.into_result().unwrap().len(), 1);

        let mut result = ValidationResult::default();
        result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        let err = result.into_result().unwrap_err();
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_display() {
        let err = ValidationError::new("server.port", "Port cannot be 0");
        assert_eq!(err.to_string(), "server.port: Port cannot be 0");
        let warn = ValidationWarning::new("events.debounce_ms", "high");
        assert_eq!(warn.to_string(), "events.debounce_ms: high");
    }
