//! Invoice records and mail attachments.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

// ============================================================================
// Invoice Record
// ============================================================================

/// Invoice as listed by the invoicing service.
///
/// Only `id`, `created_at` and `contact_id` are interpreted; everything else
/// is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Invoice id.
    pub id: i64,
    /// Creation time (RFC 3339).
    pub created_at: DateTime<FixedOffset>,
    /// Recipient contact id.
    #[serde(default)]
    pub contact_id: Option<i64>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoiceRecord {
    /// Sorts invoices newest first. Ties keep their original order.
    pub fn sort_newest_first(invoices: &mut [InvoiceRecord]) {
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

// ============================================================================
// Attachments
// ============================================================================

/// Files to attach to a mail draft.
///
/// Accepts a single path or any collection of paths, so callers holding one
/// PDF and callers holding many go through the same draft call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments(Vec<PathBuf>);

impl Attachments {
    /// No attachments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Attached paths, in order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    /// Number of attachments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attachments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<PathBuf> for Attachments {
    fn from(path: PathBuf) -> Self {
        Self(vec![path])
    }
}

impl From<&Path> for Attachments {
    fn from(path: &Path) -> Self {
        Self(vec![path.to_path_buf()])
    }
}

impl From<&str> for Attachments {
    fn from(path: &str) -> Self {
        Self(vec![PathBuf::from(path)])
    }
}

impl From<Option<PathBuf>> for Attachments {
    fn from(path: Option<PathBuf>) -> Self {
        Self(path.into_iter().collect())
    }
}

impl<P: Into<PathBuf>> From<Vec<P>> for Attachments {
    fn from(paths: Vec<P>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for Attachments {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Attachments {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice(id: i64, created_at: &str) -> InvoiceRecord {
        InvoiceRecord {
            id,
            created_at: DateTime::parse_from_rfc3339(created_at).unwrap(),
            contact_id: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut invoices = vec![
            invoice(1, "2024-01-31T10:00:00+09:00"),
            invoice(3, "2024-03-31T10:00:00+09:00"),
            invoice(2, "2024-02-29T10:00:00+09:00"),
        ];
        InvoiceRecord::sort_newest_first(&mut invoices);
        let ids: Vec<i64> = invoices.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_compares_instants_across_offsets() {
        // 10:00+09:00 is 01:00Z, earlier than 02:00Z
        let mut invoices = vec![
            invoice(1, "2024-01-01T10:00:00+09:00"),
            invoice(2, "2024-01-01T02:00:00+00:00"),
        ];
        InvoiceRecord::sort_newest_first(&mut invoices);
        assert_eq!(invoices[0].id, 2);
    }

    #[test]
    fn test_sort_is_non_increasing() {
        let stamps = [
            "2024-05-01T00:00:00Z",
            "2023-12-01T00:00:00Z",
            "2024-05-01T00:00:00Z",
            "2025-01-01T00:00:00Z",
            "2022-07-15T12:30:00+02:00",
        ];
        let mut invoices: Vec<_> = stamps
            .iter()
            .enumerate()
            .map(|(i, s)| invoice(i64::try_from(i).unwrap(), s))
            .collect();
        InvoiceRecord::sort_newest_first(&mut invoices);
        assert!(invoices.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn test_single_path_equals_one_element_list() {
        assert_eq!(
            Attachments::from("invoice.pdf"),
            Attachments::from(vec!["invoice.pdf"])
        );
    }

    #[test]
    fn test_none_attachments() {
        assert!(Attachments::none().is_empty());
        assert!(Attachments::from(None::<PathBuf>).is_empty());
        assert_eq!(Attachments::from(Vec::<PathBuf>::new()).len(), 0);
    }
}
