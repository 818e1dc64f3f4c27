use crate::types::ContactRecord;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total: usize,
    pub failed: usize,
    pub with_email: usize,
    pub with_phone: usize,
    pub with_whatsapp: usize,
    pub with_city: usize,
}

impl CollectionStats {
    pub fn from_records(records: &[ContactRecord]) -> CollectionStats {
        let count = |f: fn(&ContactRecord) -> bool| records.iter().filter(|r| f(r)).count();
        CollectionStats {
            total: records.len(),
            failed: count(ContactRecord::is_failed),
            with_email: count(|r| !r.emails.is_empty()),
            with_phone: count(|r| !r.phones.is_empty()),
            with_whatsapp: count(|r| !r.whatsapp.is_empty()),
            with_city: count(|r| !r.city.is_empty()),
        }
    }
}

impl std::fmt::Display for CollectionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Subsections:   {}", self.total)?;
        writeln!(f, "  Failed:        {}", self.failed)?;
        writeln!(f, "  With e-mail:   {}", self.with_email)?;
        writeln!(f, "  With phone:    {}", self.with_phone)?;
        writeln!(f, "  With WhatsApp: {}", self.with_whatsapp)?;
        writeln!(f, "  With city:     {}", self.with_city)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_populated_fields() {
        let records = vec![
            ContactRecord {
                city: "Santos".to_string(),
                phones: vec!["(13) 3222-1111".to_string()],
                emails: vec!["santos@oabsp.org.br".to_string()],
                url: "a".to_string(),
                ..Default::default()
            },
            ContactRecord {
                phones: vec!["(13) 99999-0000".to_string()],
                whatsapp: vec!["(13) 99999-0000".to_string()],
                url: "b".to_string(),
                ..Default::default()
            },
            ContactRecord::failed("c", "timeout"),
        ];

        let stats = CollectionStats::from_records(&records);

        assert_eq!(
            stats,
            CollectionStats {
                total: 3,
                failed: 1,
                with_email: 1,
                with_phone: 2,
                with_whatsapp: 1,
                with_city: 1,
            }
        );
    }

    #[test]
    fn test_stats_display() {
        let stats = CollectionStats::from_records(&[]);
        let text = stats.to_string();
        assert!(text.contains("Subsections:   0"));
        assert!(text.contains("Failed:        0"));
    }
}
