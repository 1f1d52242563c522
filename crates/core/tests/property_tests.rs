use proptest::prelude::*;

use semadvisor_core::metrics::{derive_campaign_metrics, derive_keyword_metrics, mean};
use semadvisor_core::rules::{
    generate_recommendations, high_cpa_campaigns, low_ctr_keywords, top_campaigns_by_conversions,
    top_converting_keywords, LOW_CTR_LIMIT,
};
use semadvisor_core::types::{CampaignRow, KeywordRow};

fn campaign_rows() -> impl Strategy<Value = Vec<CampaignRow>> {
    prop::collection::vec(
        (0u64..100_000, 0u64..10_000, 0u32..500, 0u32..1_000_000),
        1..20,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (impressions, clicks, conv, cost_cents))| CampaignRow {
                campaign_id: i as i64,
                campaign_name: format!("c{i}"),
                impressions,
                clicks,
                conversions: f64::from(conv),
                cost: f64::from(cost_cents) / 100.0,
            })
            .collect()
    })
}

fn keyword_rows() -> impl Strategy<Value = Vec<KeywordRow>> {
    prop::collection::vec((1u64..100_000, 0u64..10_000, 0u32..200), 1..30).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (impressions, clicks, conv))| KeywordRow {
                campaign_id: (i % 3) as i64,
                campaign_name: format!("c{}", i % 3),
                ad_group_id: i as i64,
                keyword_text: format!("k{i}"),
                impressions,
                clicks,
                conversions: f64::from(conv),
                cost: 1.0,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn cpa_matches_formula(rows in campaign_rows()) {
        let derived = derive_campaign_metrics(rows.clone());
        for (c, r) in derived.iter().zip(&rows) {
            if r.conversions == 0.0 {
                prop_assert!(c.cpa.is_infinite() && c.cpa > 0.0);
            } else {
                prop_assert_eq!(c.cpa, r.cost / r.conversions);
            }
        }
    }

    #[test]
    fn ctr_matches_formula(rows in keyword_rows()) {
        for k in derive_keyword_metrics(rows) {
            prop_assert_eq!(k.ctr, k.row.clicks as f64 / k.row.impressions as f64);
            prop_assert!(k.ctr >= 0.0);
        }
    }

    #[test]
    fn high_cpa_selects_exactly_rows_above_mean(rows in campaign_rows()) {
        let derived = derive_campaign_metrics(rows);
        let m = mean(derived.iter().map(|c| c.cpa)).unwrap();
        let selected: Vec<i64> = high_cpa_campaigns(&derived)
            .unwrap()
            .iter()
            .map(|c| c.row.campaign_id)
            .collect();
        let expected: Vec<i64> = derived
            .iter()
            .filter(|c| c.cpa > m)
            .map(|c| c.row.campaign_id)
            .collect();
        prop_assert_eq!(selected, expected);
    }

    #[test]
    fn raising_cost_never_unflags_a_campaign(
        rows in campaign_rows(),
        pick in any::<prop::sample::Index>(),
        extra_cents in 0u32..1_000_000,
    ) {
        let idx = pick.index(rows.len());
        let before = derive_campaign_metrics(rows.clone());
        let was_flagged = high_cpa_campaigns(&before)
            .unwrap()
            .iter()
            .any(|c| c.row.campaign_id == idx as i64);

        let mut raised = rows;
        raised[idx].cost += f64::from(extra_cents) / 100.0;
        let after = derive_campaign_metrics(raised);
        let is_flagged = high_cpa_campaigns(&after)
            .unwrap()
            .iter()
            .any(|c| c.row.campaign_id == idx as i64);

        prop_assert!(!was_flagged || is_flagged);
    }

    #[test]
    fn low_ctr_is_bounded_below_mean_and_ascending(rows in keyword_rows()) {
        let derived = derive_keyword_metrics(rows);
        let m = mean(derived.iter().map(|k| k.ctr)).unwrap();
        let low = low_ctr_keywords(&derived).unwrap();
        prop_assert!(low.len() <= LOW_CTR_LIMIT);
        prop_assert!(low.iter().all(|k| k.ctr < m));
        prop_assert!(low.windows(2).all(|w| w[0].ctr <= w[1].ctr));
    }

    #[test]
    fn rankings_descend_with_ties_in_table_order(
        campaigns in campaign_rows(),
        keywords in keyword_rows(),
    ) {
        let campaigns = derive_campaign_metrics(campaigns);
        let keywords = derive_keyword_metrics(keywords);

        let top_c = top_campaigns_by_conversions(&campaigns, 3);
        prop_assert!(top_c.len() <= 3);
        prop_assert!(top_c.windows(2).all(|w| {
            w[0].row.conversions > w[1].row.conversions
                || (w[0].row.conversions == w[1].row.conversions
                    && w[0].row.campaign_id < w[1].row.campaign_id)
        }), "top campaigns not sorted by conversions desc, campaign_id asc");

        let top_k = top_converting_keywords(&keywords, 5);
        prop_assert!(top_k.len() <= 5);
        prop_assert!(top_k.windows(2).all(|w| {
            w[0].row.conversions > w[1].row.conversions
                || (w[0].row.conversions == w[1].row.conversions
                    && w[0].row.ad_group_id < w[1].row.ad_group_id)
        }), "top keywords not sorted by conversions desc, ad_group_id asc");
    }

    #[test]
    fn engine_is_idempotent(campaigns in campaign_rows(), keywords in keyword_rows()) {
        let campaigns = derive_campaign_metrics(campaigns);
        let keywords = derive_keyword_metrics(keywords);
        let first = generate_recommendations(&campaigns, &keywords).unwrap();
        let second = generate_recommendations(&campaigns, &keywords).unwrap();
        prop_assert_eq!(first, second);
    }
}
