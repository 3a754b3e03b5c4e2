use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use until::{breakdown_from_seconds, compute_breakdown, Breakdown};

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn arb_offset() -> impl Strategy<Value = FixedOffset> {
    (-12i32..=14).prop_map(|hours| FixedOffset::east_opt(hours * 3_600).unwrap())
}

proptest! {
    #[test]
    fn reached_targets_are_zero(now in arb_instant(), back in 0i64..=10_000_000) {
        let target = now - TimeDelta::seconds(back);
        prop_assert_eq!(compute_breakdown(&target, &now), Breakdown::ZERO);
    }

    #[test]
    fn clock_fields_derive_from_total(
        s in 0u64..=10_000_000_000,
        now in arb_instant(),
        ahead in 0i64..=10_000_000,
    ) {
        let target = now + TimeDelta::seconds(ahead);
        let breakdown = breakdown_from_seconds(s, &target, &now);

        prop_assert_eq!(u64::from(breakdown.hours), (s / 3_600) % 24);
        prop_assert_eq!(u64::from(breakdown.minutes), (s / 60) % 60);
        prop_assert_eq!(u64::from(breakdown.seconds), s % 60);
        prop_assert_eq!(breakdown.total_seconds, s);
    }

    #[test]
    fn total_is_whole_seconds_left(now in arb_instant(), ahead_ms in 0i64..=1_000_000_000) {
        let target = now + TimeDelta::milliseconds(ahead_ms);
        prop_assert_eq!(compute_breakdown(&target, &now).total_seconds, (ahead_ms / 1_000) as u64);
    }

    #[test]
    fn days_are_whole_days_under_one_offset(
        now in arb_instant(),
        ahead in 1i64..=100_000_000,
        offset in arb_offset(),
    ) {
        let now = now.with_timezone(&offset);
        let target = now + TimeDelta::seconds(ahead);
        prop_assert_eq!(compute_breakdown(&target, &now).days, (ahead / 86_400) as u64);
    }

    #[test]
    fn tick_path_matches_initial_computation(now in arb_instant(), ahead in 0i64..=100_000_000) {
        let target = now + TimeDelta::seconds(ahead);
        let initial = compute_breakdown(&target, &now);
        prop_assert_eq!(breakdown_from_seconds(initial.total_seconds, &target, &now), initial);
    }
}
