// Promotion window classification
use crate::model::{Bucket, Classification, Offer};
use crate::utils::parse_datetime;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Offer types kept when `include_all` is off.
const ELIGIBLE_OFFER_TYPES: [&str; 3] = ["BASE_GAME", "EDITION", "OTHERS"];

pub fn is_eligible_type(offer: &Offer, include_all: bool) -> bool {
    include_all || ELIGIBLE_OFFER_TYPES.contains(&offer.offer_type.as_str())
}

/// Free right now: the applied discount brings the price to zero.
pub fn is_free(offer: &Offer) -> bool {
    offer.price.discount_amount == Some(0)
}

/// Decides which bucket an offer belongs to at `now`.
///
/// Only index 0 of each promotion list is authoritative. A window with
/// missing, unparsable or inverted dates counts as absent.
pub fn classify(offer: &Offer, now: DateTime<Utc>) -> Classification {
    if let Some(window) = offer.current_windows.first() {
        let parsed = parse_window(&offer.title, window.start.as_deref(), window.end.as_deref());
        if let Some((start, end)) = parsed {
            if is_free(offer) && start <= now && now <= end {
                return Classification {
                    bucket: Bucket::Current,
                    window_start: Some(start),
                    window_end: Some(end),
                };
            }
        }
    }

    if let Some(window) = offer.upcoming_windows.first() {
        let parsed = parse_window(&offer.title, window.start.as_deref(), window.end.as_deref());
        if let Some((start, end)) = parsed {
            // No lookahead cap: anything starting later counts.
            if window.discount_percentage == Some(0) && start > now {
                return Classification {
                    bucket: Bucket::Upcoming,
                    window_start: Some(start),
                    window_end: Some(end),
                };
            }
        }
    }

    Classification::none()
}

fn parse_window(
    title: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (Some(raw_start), Some(raw_end)) = (start, end) else {
        warn!("{} ==> promotion window without start/end, ignored", title);
        return None;
    };

    match (parse_datetime(raw_start), parse_datetime(raw_end)) {
        (Some(s), Some(e)) if s <= e => Some((s, e)),
        (Some(_), Some(_)) => {
            warn!("{} ==> inverted promotion window {} > {}, ignored", title, raw_start, raw_end);
            None
        }
        _ => {
            warn!("{} ==> unparsable promotion window {} / {}, ignored", title, raw_start, raw_end);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PriceInfo, PromotionWindow, UpcomingWindow};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 20, 12, 0, 0).unwrap()
    }

    fn iso(dt: DateTime<Utc>) -> Option<String> {
        Some(dt.to_rfc3339())
    }

    fn current_offer(start: DateTime<Utc>, end: DateTime<Utc>, discount: Option<i64>) -> Offer {
        Offer {
            title: "Current Game".into(),
            offer_type: "BASE_GAME".into(),
            price: PriceInfo {
                original_amount: Some(1999),
                discount_amount: discount,
                formatted_discount_price: Some("0".into()),
            },
            current_windows: vec![PromotionWindow { start: iso(start), end: iso(end) }],
            ..Offer::default()
        }
    }

    fn upcoming_offer(start: DateTime<Utc>, end: DateTime<Utc>, pct: Option<i64>) -> Offer {
        Offer {
            title: "Upcoming Game".into(),
            offer_type: "BASE_GAME".into(),
            upcoming_windows: vec![UpcomingWindow {
                start: iso(start),
                end: iso(end),
                discount_percentage: pct,
            }],
            ..Offer::default()
        }
    }

    #[test]
    fn free_offer_inside_window_is_current() {
        let start = now() - Duration::days(1);
        let end = now() + Duration::days(1);
        let c = classify(&current_offer(start, end, Some(0)), now());
        assert_eq!(c.bucket, Bucket::Current);
        assert_eq!(c.window_start, Some(start));
        assert_eq!(c.window_end, Some(end));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let c = classify(&current_offer(now(), now() + Duration::days(7), Some(0)), now());
        assert_eq!(c.bucket, Bucket::Current);
        let c = classify(&current_offer(now() - Duration::days(7), now(), Some(0)), now());
        assert_eq!(c.bucket, Bucket::Current);
    }

    #[test]
    fn paid_or_unknown_price_is_not_current() {
        let start = now() - Duration::days(1);
        let end = now() + Duration::days(1);
        assert_eq!(classify(&current_offer(start, end, Some(499)), now()).bucket, Bucket::None);
        assert_eq!(classify(&current_offer(start, end, None), now()).bucket, Bucket::None);
    }

    #[test]
    fn expired_window_is_none() {
        let c = classify(
            &current_offer(now() - Duration::days(8), now() - Duration::days(1), Some(0)),
            now(),
        );
        assert_eq!(c, Classification::none());
    }

    #[test]
    fn future_full_discount_is_upcoming_without_lookahead_cap() {
        let start = now() + Duration::days(10);
        let c = classify(&upcoming_offer(start, start + Duration::days(7), Some(0)), now());
        assert_eq!(c.bucket, Bucket::Upcoming);
        assert_eq!(c.window_start, Some(start));
    }

    #[test]
    fn upcoming_requires_future_start() {
        let c = classify(&upcoming_offer(now(), now() + Duration::days(7), Some(0)), now());
        assert_eq!(c.bucket, Bucket::None);
        let c = classify(
            &upcoming_offer(now() - Duration::days(1), now() + Duration::days(7), Some(0)),
            now(),
        );
        assert_eq!(c.bucket, Bucket::None);
    }

    #[test]
    fn upcoming_discount_must_be_zero_percent() {
        let start = now() + Duration::days(2);
        let end = start + Duration::days(7);
        assert_eq!(classify(&upcoming_offer(start, end, Some(50)), now()).bucket, Bucket::None);
        assert_eq!(classify(&upcoming_offer(start, end, None), now()).bucket, Bucket::None);
    }

    #[test]
    fn malformed_or_inverted_windows_are_none() {
        let start = now() - Duration::days(1);
        let mut offer = current_offer(start, now() + Duration::days(1), Some(0));
        offer.current_windows[0].start = Some("not-a-date".into());
        assert_eq!(classify(&offer, now()).bucket, Bucket::None);

        offer.current_windows[0].start = None;
        assert_eq!(classify(&offer, now()).bucket, Bucket::None);

        let later = now() + Duration::days(5);
        let inverted = upcoming_offer(later, now() + Duration::days(2), Some(0));
        assert_eq!(classify(&inverted, now()).bucket, Bucket::None);
    }

    #[test]
    fn only_first_window_is_consulted() {
        let past = now() - Duration::days(3);
        let mut offer = upcoming_offer(past, now() - Duration::days(1), Some(0));
        offer.upcoming_windows.push(UpcomingWindow {
            start: iso(now() + Duration::days(1)),
            end: iso(now() + Duration::days(8)),
            discount_percentage: Some(0),
        });
        assert_eq!(classify(&offer, now()).bucket, Bucket::None);
    }

    #[test]
    fn offer_without_promotions_is_none() {
        let offer = Offer {
            title: "Plain".into(),
            ..Offer::default()
        };
        assert_eq!(classify(&offer, now()), Classification::none());
    }

    #[test]
    fn offer_type_filter() {
        let mut offer = Offer::default();
        offer.offer_type = "ADD_ON".into();
        assert!(!is_eligible_type(&offer, false));
        assert!(is_eligible_type(&offer, true));
        offer.offer_type = "EDITION".into();
        assert!(is_eligible_type(&offer, false));
    }
}
