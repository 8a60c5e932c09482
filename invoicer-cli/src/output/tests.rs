//! CLI output formatting tests.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use chrono::DateTime;
    use invoicer_core::{InvoiceRecord, ProviderKind, TokenRecord};
    use serde_json::Map;
    use std::path::Path;

    fn invoice(id: i64, contact_id: Option<i64>) -> InvoiceRecord {
        InvoiceRecord {
            id,
            created_at: DateTime::parse_from_rfc3339("2025-03-01T09:00:00+09:00").unwrap(),
            contact_id,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_invoice_table() {
        let text = TextFormatter::new(false).format_invoices(&[invoice(42, Some(7)), invoice(41, None)]);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("42 "));
        assert!(lines[1].contains("2025-03-01T09:00:00+09:00"));
        assert!(lines[1].ends_with(" 7"));
        assert!(lines[2].ends_with(" -"));
    }

    #[test]
    fn test_empty_invoice_list() {
        assert_eq!(TextFormatter::new(false).format_invoices(&[]), "No invoices\n");
    }

    #[test]
    fn test_colors_toggle() {
        let plain = TextFormatter::new(false).format_path(Path::new("/tmp/202502.pdf"));
        let colored = TextFormatter::new(true).format_path(Path::new("/tmp/202502.pdf"));

        assert_eq!(plain, "Saved /tmp/202502.pdf");
        assert!(colored.contains("\x1b[32m"));
    }

    #[test]
    fn test_token_without_refresh_token() {
        let record = TokenRecord::new("access").with_expiry(1_700_000_000, 3600);
        let text = TextFormatter::new(false).format_token(ProviderKind::Gmail, &record);

        assert!(text.starts_with("Gmail token stored"));
        assert!(text.ends_with("(no refresh token)"));
        assert!(!text.contains("access"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use invoicer_core::{ProviderKind, TokenRecord};
    use serde_json::Value;

    #[test]
    fn test_token_summary_hides_secrets() {
        let record = TokenRecord::new("secret-access")
            .with_refresh_token("secret-refresh")
            .with_expiry(1_700_000_000, 3600);
        let out = JsonFormatter::new(false)
            .format_token(ProviderKind::Misoca, &record)
            .unwrap();

        assert!(!out.contains("secret"));
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["provider"], "misoca");
        assert_eq!(value["hasRefreshToken"], true);
        assert_eq!(value["expiresAt"], "2023-11-14T23:13:20Z");
    }

    #[test]
    fn test_missing_expiry_is_omitted() {
        let out = JsonFormatter::new(false)
            .format_token(ProviderKind::Gmail, &TokenRecord::new("a"))
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        assert!(value.get("expiresAt").is_none());
        assert_eq!(value["hasRefreshToken"], false);
    }

    #[test]
    fn test_pretty_output() {
        let out = JsonFormatter::new(true).format(&serde_json::json!({ "a": 1 })).unwrap();
        assert!(out.contains('\n'));
    }
}
