//! Ordered collection of built stocks.

use serde::{Deserialize, Serialize};

use super::Stock;

/// Stocks in caller order. Sorting is an explicit step, separate from
/// classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockList(Vec<Stock>);

impl StockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by weighted ROE, highest first. Ties keep their order.
    pub fn sort_by_roe(&mut self) {
        self.0
            .sort_by(|a, b| b.roe_weight().total_cmp(&a.roe_weight()));
    }

    /// Distinct industries in first-seen order.
    pub fn industries(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for stock in &self.0 {
            if !seen.contains(&stock.industry()) {
                seen.push(stock.industry());
            }
        }
        seen
    }

    pub fn push(&mut self, stock: Stock) {
        self.0.push(stock);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stock> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Stock] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Stock> {
        self.0
    }
}

impl From<Vec<Stock>> for StockList {
    fn from(stocks: Vec<Stock>) -> Self {
        Self(stocks)
    }
}

impl FromIterator<Stock> for StockList {
    fn from_iter<I: IntoIterator<Item = Stock>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a StockList {
    type Item = &'a Stock;
    type IntoIter = std::slice::Iter<'a, Stock>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for StockList {
    type Item = Stock;
    type IntoIter = std::vec::IntoIter<Stock>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stock;

    #[test]
    fn test_sort_by_roe_descending_and_stable() {
        let mut list: StockList = vec![
            stock("A", "Bank", 10.0, 0.2, 5.0),
            stock("B", "Bank", 10.0, 0.2, 20.0),
            stock("C", "Liquor", 10.0, 0.2, 5.0),
            stock("D", "Liquor", 10.0, 0.2, 12.0),
        ]
        .into();
        list.sort_by_roe();

        let order: Vec<&str> = list.iter().map(|s| s.secucode()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);
    }

    #[test]
    fn test_industries_first_seen_order() {
        let list: StockList = vec![
            stock("A", "Liquor", 10.0, 0.2, 1.0),
            stock("B", "Bank", 10.0, 0.2, 1.0),
            stock("C", "Liquor", 10.0, 0.2, 1.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(list.industries(), vec!["Liquor", "Bank"]);
    }

    #[test]
    fn test_empty_list() {
        let list = StockList::new();
        assert!(list.is_empty());
        assert!(list.industries().is_empty());
    }
}
