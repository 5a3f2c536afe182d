//! Report classification.
//!
//! Partitions a stock collection into overlapping, named views:
//!
//! | View                  | Predicate                         |
//! |-----------------------|-----------------------------------|
//! | all                   | always                            |
//! | price ≤ 30            | `price <= low_price_ceiling`      |
//! | volatility ≤ 0.1      | `hv <= low`                       |
//! | 0.1 < volatility ≤ 0.5| `low < hv <= high`                |
//! | volatility > 0.5      | `hv > high`                       |
//! | `<industry>` sector   | one per distinct industry         |
//!
//! The three volatility bands are disjoint and cover every non-negative value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xstock_common::config::ViewThresholds;

use crate::stock::Stock;

/// A named partition of the stock collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "view", content = "industry")]
pub enum ReportView {
    All,
    LowPrice,
    LowVolatility,
    ModerateVolatility,
    HighVolatility,
    Industry(String),
}

/// View -> member stocks, each in caller order.
pub type ReportViews<'a> = BTreeMap<ReportView, Vec<&'a Stock>>;

/// Volatility band of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityBand {
    Low,
    Moderate,
    High,
}

/// Assigns stocks to report views.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportClassifier {
    thresholds: ViewThresholds,
}

impl ReportClassifier {
    pub fn new(thresholds: ViewThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ViewThresholds {
        &self.thresholds
    }

    /// Band of a volatility value. Boundaries belong to the lower band.
    pub fn volatility_band(&self, volatility: f64) -> VolatilityBand {
        if volatility <= self.thresholds.low_volatility_ceiling {
            VolatilityBand::Low
        } else if volatility <= self.thresholds.high_volatility_floor {
            VolatilityBand::Moderate
        } else {
            VolatilityBand::High
        }
    }

    /// Views a single stock belongs to, `All` first.
    pub fn views_of(&self, stock: &Stock) -> Vec<ReportView> {
        let mut views = vec![ReportView::All];
        if stock.price() <= self.thresholds.low_price_ceiling {
            views.push(ReportView::LowPrice);
        }
        views.push(match self.volatility_band(stock.volatility) {
            VolatilityBand::Low => ReportView::LowVolatility,
            VolatilityBand::Moderate => ReportView::ModerateVolatility,
            VolatilityBand::High => ReportView::HighVolatility,
        });
        views.push(ReportView::Industry(stock.industry().to_string()));
        views
    }

    /// Group `stocks` into every view.
    ///
    /// The five fixed views are always present, possibly empty. Industry
    /// views exist only for industries that occur.
    pub fn classify<'a>(&self, stocks: &'a [Stock]) -> ReportViews<'a> {
        let mut views: ReportViews<'a> = [
            ReportView::All,
            ReportView::LowPrice,
            ReportView::LowVolatility,
            ReportView::ModerateVolatility,
            ReportView::HighVolatility,
        ]
        .into_iter()
        .map(|view| (view, Vec::new()))
        .collect();

        for stock in stocks {
            for view in self.views_of(stock) {
                views.entry(view).or_default().push(stock);
            }
        }
        views
    }

    /// Human-readable name of a view.
    pub fn label(&self, view: &ReportView) -> String {
        let t = &self.thresholds;
        match view {
            ReportView::All => "all".to_string(),
            ReportView::LowPrice => format!("price ≤ {}", t.low_price_ceiling),
            ReportView::LowVolatility => format!("volatility ≤ {}", t.low_volatility_ceiling),
            ReportView::ModerateVolatility => format!(
                "{} < volatility ≤ {}",
                t.low_volatility_ceiling, t.high_volatility_floor
            ),
            ReportView::HighVolatility => format!("volatility > {}", t.high_volatility_floor),
            ReportView::Industry(industry) => format!("{} sector", industry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stock;

    fn codes(stocks: &[&Stock]) -> Vec<String> {
        stocks.iter().map(|s| s.secucode().to_string()).collect()
    }

    #[test]
    fn test_volatility_band_boundaries() {
        let stocks = vec![
            stock("A", "Bank", 10.0, 0.05, 0.0),
            stock("B", "Bank", 10.0, 0.1, 0.0),
            stock("C", "Bank", 10.0, 0.3, 0.0),
            stock("D", "Bank", 10.0, 0.5, 0.0),
            stock("E", "Bank", 10.0, 0.9, 0.0),
        ];
        let views = ReportClassifier::default().classify(&stocks);

        assert_eq!(codes(&views[&ReportView::LowVolatility]), vec!["A", "B"]);
        assert_eq!(codes(&views[&ReportView::ModerateVolatility]), vec!["C", "D"]);
        assert_eq!(codes(&views[&ReportView::HighVolatility]), vec!["E"]);
    }

    #[test]
    fn test_low_price_includes_ceiling() {
        let stocks = vec![
            stock("A", "Bank", 29.99, 0.2, 0.0),
            stock("B", "Bank", 30.0, 0.2, 0.0),
            stock("C", "Bank", 30.01, 0.2, 0.0),
        ];
        let views = ReportClassifier::default().classify(&stocks);
        assert_eq!(codes(&views[&ReportView::LowPrice]), vec!["A", "B"]);
    }

    #[test]
    fn test_one_view_per_industry() {
        let stocks = vec![
            stock("A", "Liquor", 10.0, 0.2, 0.0),
            stock("B", "Bank", 50.0, 0.2, 0.0),
            stock("C", "Liquor", 40.0, 0.7, 0.0),
        ];
        let views = ReportClassifier::default().classify(&stocks);

        let industries: Vec<&ReportView> = views
            .keys()
            .filter(|v| matches!(v, ReportView::Industry(_)))
            .collect();
        assert_eq!(industries.len(), 2);
        assert_eq!(
            codes(&views[&ReportView::Industry("Liquor".into())]),
            vec!["A", "C"]
        );
        assert_eq!(codes(&views[&ReportView::Industry("Bank".into())]), vec!["B"]);

        // Every stock is in `all` and exactly one industry view.
        assert_eq!(codes(&views[&ReportView::All]), vec!["A", "B", "C"]);
        for s in &stocks {
            let count = views
                .iter()
                .filter(|(v, members)| {
                    matches!(v, ReportView::Industry(_))
                        && members.iter().any(|m| m.secucode() == s.secucode())
                })
                .count();
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_empty_input_has_fixed_views() {
        let views = ReportClassifier::default().classify(&[]);
        assert_eq!(views.len(), 5);
        assert!(views.values().all(|v| v.is_empty()));
    }

    #[test]
    fn test_classification_preserves_caller_order() {
        let stocks = vec![
            stock("Z", "Bank", 10.0, 0.05, 1.0),
            stock("M", "Bank", 10.0, 0.05, 9.0),
            stock("A", "Bank", 10.0, 0.05, 5.0),
        ];
        let views = ReportClassifier::default().classify(&stocks);
        assert_eq!(codes(&views[&ReportView::LowVolatility]), vec!["Z", "M", "A"]);
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = ReportClassifier::new(ViewThresholds {
            low_price_ceiling: 10.0,
            low_volatility_ceiling: 0.2,
            high_volatility_floor: 0.3,
        });
        assert_eq!(classifier.volatility_band(0.2), VolatilityBand::Low);
        assert_eq!(classifier.volatility_band(0.25), VolatilityBand::Moderate);
        assert_eq!(classifier.volatility_band(0.31), VolatilityBand::High);

        let views = classifier.views_of(&stock("A", "Bank", 10.0, 0.5, 0.0));
        assert!(views.contains(&ReportView::LowPrice));
        assert!(views.contains(&ReportView::HighVolatility));
    }

    #[test]
    fn test_labels() {
        let classifier = ReportClassifier::default();
        assert_eq!(classifier.label(&ReportView::LowPrice), "price ≤ 30");
        assert_eq!(
            classifier.label(&ReportView::ModerateVolatility),
            "0.1 < volatility ≤ 0.5"
        );
        assert_eq!(
            classifier.label(&ReportView::Industry("Bank".into())),
            "Bank sector"
        );
    }
}
