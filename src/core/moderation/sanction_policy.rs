// Sanction policy - maps a cumulative violation count to a sanction tier.
//
// Pure business logic: no state, no storage, no Discord. The orchestrator
// calls `tier_for` with the count the ledger just returned.

use super::moderation_models::SanctionTier;

/// Inclusive lower bounds, most severe first so higher tiers win.
pub const SANCTION_LADDER: [(u32, SanctionTier); 6] = [
    (30, SanctionTier::Ban),
    (20, SanctionTier::Kick),
    (15, SanctionTier::Timeout7d),
    (10, SanctionTier::Timeout1d),
    (5, SanctionTier::Timeout15m),
    (3, SanctionTier::Timeout5m),
];

/// Which tier applies to a user with `count` violations?
pub fn tier_for(count: u32) -> SanctionTier {
    SANCTION_LADDER
        .iter()
        .find(|(threshold, _)| count >= *threshold)
        .map(|(_, tier)| *tier)
        .unwrap_or(SanctionTier::None)
}

/// The count at which `tier` first applies (0 for `None`).
pub fn threshold_for(tier: SanctionTier) -> u32 {
    SANCTION_LADDER
        .iter()
        .find(|(_, candidate)| *candidate == tier)
        .map(|(threshold, _)| *threshold)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_counts() {
        assert_eq!(tier_for(0), SanctionTier::None);
        assert_eq!(tier_for(2), SanctionTier::None);
        assert_eq!(tier_for(3), SanctionTier::Timeout5m);
        assert_eq!(tier_for(4), SanctionTier::Timeout5m);
        assert_eq!(tier_for(5), SanctionTier::Timeout15m);
        assert_eq!(tier_for(10), SanctionTier::Timeout1d);
        assert_eq!(tier_for(15), SanctionTier::Timeout7d);
        assert_eq!(tier_for(20), SanctionTier::Kick);
        assert_eq!(tier_for(29), SanctionTier::Kick);
        assert_eq!(tier_for(30), SanctionTier::Ban);
        assert_eq!(tier_for(1000), SanctionTier::Ban);
        assert_eq!(tier_for(u32::MAX), SanctionTier::Ban);
    }

    #[test]
    fn test_tier_is_monotonic() {
        let mut previous = tier_for(0);
        for count in 1..=100 {
            let tier = tier_for(count);
            assert!(
                tier >= previous,
                "tier dropped from {:?} to {:?} at count {}",
                previous,
                tier,
                count
            );
            previous = tier;
        }
    }

    #[test]
    fn test_threshold_round_trip() {
        for (threshold, tier) in SANCTION_LADDER {
            assert_eq!(threshold_for(tier), threshold);
            assert_eq!(tier_for(threshold), tier);
            assert!(tier_for(threshold - 1) < tier);
        }
        assert_eq!(threshold_for(SanctionTier::None), 0);
    }

    #[test]
    fn test_timeout_durations() {
        assert_eq!(SanctionTier::None.timeout_duration(), None);
        assert_eq!(
            SanctionTier::Timeout5m.timeout_duration().map(|d| d.as_secs()),
            Some(300)
        );
        assert_eq!(
            SanctionTier::Timeout7d.timeout_duration().map(|d| d.as_secs()),
            Some(604_800)
        );
        assert!(SanctionTier::Kick.is_severe());
        assert!(SanctionTier::Ban.is_severe());
        assert!(!SanctionTier::Timeout7d.is_severe());
    }
}
