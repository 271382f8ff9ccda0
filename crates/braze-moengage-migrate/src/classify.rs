//! Campaign classification and deduplication.
//!
//! Pure preprocessing of a batch's campaign list: non-migratable types are
//! filtered out and exact duplicates are dropped before the migration loop
//! starts. No I/O; log events are returned for the caller to record.

use crate::batch::{CampaignRef, CampaignType};
use crate::log::LogLevel;
use std::collections::HashSet;

/// Result of classifying a batch's campaign list.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Migratable campaigns in input order, duplicates removed.
    pub ordered: Vec<CampaignRef>,

    /// Duplicate entries dropped in favor of an earlier occurrence.
    pub dropped_duplicates: Vec<CampaignRef>,

    /// Campaigns excluded because their type cannot be migrated.
    pub skipped: Vec<CampaignRef>,

    /// Log events describing the classification, in emission order.
    pub events: Vec<(LogLevel, String)>,
}

/// Partition a campaign list into migratable work and dropped entries.
///
/// Duplicates are detected by the composite key `(id, name, type)`; the
/// first occurrence wins. Output preserves input order. Per-channel counts
/// are reported as events for log clarity only.
pub fn classify(campaigns: &[CampaignRef]) -> Classification {
    let mut result = Classification::default();
    let mut seen: HashSet<(String, String, CampaignType)> = HashSet::new();

    for campaign in campaigns {
        if !campaign.campaign_type.is_migratable() {
            result.events.push((
                LogLevel::Info,
                format!(
                    "Skipping {} ({}): campaign type cannot be migrated",
                    campaign.name,
                    campaign.campaign_type.display_name()
                ),
            ));
            result.skipped.push(campaign.clone());
            continue;
        }

        let key = (
            campaign.id.clone(),
            campaign.name.clone(),
            campaign.campaign_type,
        );
        if !seen.insert(key) {
            result.events.push((
                LogLevel::Warning,
                format!(
                    "Dropping duplicate entry for {} ({})",
                    campaign.name, campaign.id
                ),
            ));
            result.dropped_duplicates.push(campaign.clone());
            continue;
        }

        result.ordered.push(campaign.clone());
    }

    let email = count_of(&result.ordered, |t| t == CampaignType::Email);
    let push = count_of(&result.ordered, |t| {
        t == CampaignType::Push || t == CampaignType::Multi
    });
    let sms = count_of(&result.ordered, |t| t == CampaignType::Sms);

    result
        .events
        .push((LogLevel::Info, format!("Email campaigns: {}", email)));
    result
        .events
        .push((LogLevel::Info, format!("Push campaigns: {}", push)));
    result
        .events
        .push((LogLevel::Info, format!("SMS campaigns: {}", sms)));

    result
}

fn count_of(campaigns: &[CampaignRef], matches: impl Fn(CampaignType) -> bool) -> usize {
    campaigns
        .iter()
        .filter(|c| matches(c.campaign_type))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(id: &str, name: &str, campaign_type: CampaignType) -> CampaignRef {
        CampaignRef {
            id: id.to_string(),
            name: name.to_string(),
            campaign_type,
            variation_count: 1,
        }
    }

    #[test]
    fn test_filters_non_migratable_types() {
        let input = vec![
            campaign("c1", "Welcome", CampaignType::Email),
            campaign("c2", "Promo", CampaignType::Banner),
            campaign("c3", "Alert", CampaignType::Webhook),
        ];

        let result = classify(&input);
        assert_eq!(result.ordered.len(), 1);
        assert_eq!(result.ordered[0].id, "c1");
        assert_eq!(result.skipped.len(), 2);
    }

    #[test]
    fn test_drops_exact_duplicates_first_wins() {
        let input = vec![
            campaign("c1", "Welcome", CampaignType::Email),
            campaign("c1", "Welcome", CampaignType::Email),
        ];

        let result = classify(&input);
        assert_eq!(result.ordered.len(), 1);
        assert_eq!(result.dropped_duplicates.len(), 1);
        assert!(result
            .events
            .iter()
            .any(|(level, msg)| *level == LogLevel::Warning && msg.contains("duplicate")));
    }

    #[test]
    fn test_same_id_different_name_is_not_a_duplicate() {
        let input = vec![
            campaign("c1", "Welcome", CampaignType::Email),
            campaign("c1", "Welcome v2", CampaignType::Email),
        ];

        let result = classify(&input);
        assert_eq!(result.ordered.len(), 2);
        assert!(result.dropped_duplicates.is_empty());
    }

    #[test]
    fn test_preserves_input_order() {
        let input = vec![
            campaign("c1", "SMS blast", CampaignType::Sms),
            campaign("c2", "Welcome", CampaignType::Email),
            campaign("c3", "Push note", CampaignType::Push),
        ];

        let result = classify(&input);
        let ids: Vec<&str> = result.ordered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_multi_counts_as_push() {
        let input = vec![
            campaign("c1", "Cross-channel", CampaignType::Multi),
            campaign("c2", "Push note", CampaignType::Push),
        ];

        let result = classify(&input);
        assert!(result
            .events
            .iter()
            .any(|(_, msg)| msg == "Push campaigns: 2"));
    }

    #[test]
    fn test_skipped_types_are_logged_as_info_not_error() {
        let input = vec![campaign("c1", "Promo", CampaignType::Banner)];

        let result = classify(&input);
        let event = result
            .events
            .iter()
            .find(|(_, msg)| msg.contains("Skipping"))
            .unwrap();
        assert_eq!(event.0, LogLevel::Info);
    }
}
