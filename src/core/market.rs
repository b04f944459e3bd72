//! Top-down market sizing from epidemiology and pricing comparables.

use std::collections::BTreeSet;
use crate::core::resolver::{resolve, Resolution};
use crate::core::scoring::{mean, median};
use crate::corpus::ReferenceCorpus;
use crate::models::{
    EntityKind, IndicationRecord, MarketSizingRequest, MarketSizingResult, PriceSource,
    PricingComparable,
};

/// Years the TAM is projected forward
pub const PROJECTION_YEARS: i32 = 5;

/// Annual price and the comparables it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBenchmark {
    pub annual_price_usd: f64,
    pub source: PriceSource,
    pub comparables: Vec<PricingComparable>,
}

fn median_of(comparables: &[&PricingComparable]) -> Option<f64> {
    let prices: Vec<f64> = comparables.iter().map(|c| c.annual_price_usd).collect();
    median(&prices)
}

fn benchmark(price: f64, source: PriceSource, comparables: Vec<&PricingComparable>) -> PriceBenchmark {
    let mut comparables: Vec<PricingComparable> = comparables.into_iter().cloned().collect();
    comparables.sort_by(|a, b| {
        a.indication
            .cmp(&b.indication)
            .then_with(|| a.product.cmp(&b.product))
    });
    PriceBenchmark {
        annual_price_usd: price,
        source,
        comparables,
    }
}

/// Price fallback chain: explicit input, indication comparables,
/// therapy-area comparables, then the whole pricing table.
pub fn benchmark_price(
    corpus: &ReferenceCorpus,
    records: &[&IndicationRecord],
    input_price: Option<f64>,
) -> PriceBenchmark {
    if let Some(price) = input_price {
        return benchmark(price, PriceSource::Input, vec![]);
    }

    let table = corpus.pricing_comparables();
    let names: BTreeSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
    let areas: BTreeSet<&str> = records.iter().map(|r| r.therapy_area.as_str()).collect();

    let by_indication: Vec<&PricingComparable> = table
        .iter()
        .filter(|c| names.contains(c.indication.as_str()))
        .collect();
    if let Some(price) = median_of(&by_indication) {
        return benchmark(price, PriceSource::IndicationComparables, by_indication);
    }

    let by_area: Vec<&PricingComparable> = table
        .iter()
        .filter(|c| {
            corpus
                .indication(&c.indication)
                .is_some_and(|r| areas.contains(r.therapy_area.as_str()))
        })
        .collect();
    if let Some(price) = median_of(&by_area) {
        return benchmark(price, PriceSource::TherapyAreaComparables, by_area);
    }

    let everything: Vec<&PricingComparable> = table.iter().collect();
    match median_of(&everything) {
        Some(price) => benchmark(price, PriceSource::CorpusComparables, everything),
        None => benchmark(0.0, PriceSource::Unavailable, vec![]),
    }
}

/// Prevalence-weighted CAGR (percent) of the indications in a geography
pub fn weighted_cagr(records: &[&IndicationRecord], geography: &str) -> f64 {
    let weights: Vec<f64> = records.iter().map(|r| r.prevalence_in(geography)).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        let rates: Vec<f64> = records.iter().map(|r| r.cagr_5yr).collect();
        return mean(&rates);
    }
    records
        .iter()
        .zip(&weights)
        .map(|(r, w)| r.cagr_5yr * w)
        .sum::<f64>()
        / total
}

/// TAM / SAM / SOM for a free-text indication in one geography
pub fn size_market(corpus: &ReferenceCorpus, request: &MarketSizingRequest) -> MarketSizingResult {
    let resolution = resolve(corpus, &request.indication, EntityKind::Indication);
    let records: Vec<&IndicationRecord> = resolution
        .entities()
        .iter()
        .filter_map(|name| corpus.indication(name))
        .collect();
    let geography = request.geography.trim();

    let prevalent: f64 = records.iter().map(|r| r.prevalence_in(geography)).sum();
    let incident: f64 = records.iter().map(|r| r.incidence_in(geography)).sum();
    let treated: f64 = records
        .iter()
        .map(|r| r.prevalence_in(geography) * r.treated_pct / 100.0)
        .sum();

    let price = benchmark_price(corpus, &records, request.annual_price_usd);
    let cagr = weighted_cagr(&records, geography);

    let tam = prevalent * price.annual_price_usd;
    let sam = treated * price.annual_price_usd;
    let som = sam * request.peak_share_pct / 100.0;
    let projected = tam * (1.0 + cagr / 100.0).powi(PROJECTION_YEARS);

    if matches!(resolution, Resolution::NoMatch { .. }) || prevalent == 0.0 {
        tracing::debug!(
            "Market sizing for '{}' in {} has {} resolved indications and {} prevalent patients",
            request.indication,
            geography,
            records.len(),
            prevalent
        );
    }

    MarketSizingResult {
        query: request.indication.clone(),
        resolution: resolution.summary(),
        geography: geography.to_string(),
        prevalent_patients: prevalent.round(),
        incident_patients: incident.round(),
        treated_patients: treated.round(),
        annual_price_usd: price.annual_price_usd.round(),
        price_source: price.source,
        tam_usd: tam.round(),
        sam_usd: sam.round(),
        som_usd: som.round(),
        peak_share_pct: request.peak_share_pct,
        cagr_5yr: (cagr * 10.0).round() / 10.0,
        projected_tam_5yr_usd: projected.round(),
        comparables: price.comparables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchKind;

    fn corpus() -> ReferenceCorpus {
        ReferenceCorpus::embedded().unwrap()
    }

    #[test]
    fn test_input_price_wins() {
        let corpus = corpus();
        let mut request = MarketSizingRequest::new("NSCLC");
        request.annual_price_usd = Some(100_000.0);
        let result = size_market(&corpus, &request);

        assert_eq!(result.price_source, PriceSource::Input);
        assert_eq!(result.annual_price_usd, 100_000.0);
        assert_eq!(result.tam_usd, result.prevalent_patients * 100_000.0);
        assert!(result.comparables.is_empty());
    }

    #[test]
    fn test_tam_sam_som_ordering() {
        let corpus = corpus();
        let result = size_market(&corpus, &MarketSizingRequest::new("NSCLC"));

        assert_eq!(result.resolution.match_kind, MatchKind::Exact);
        assert_eq!(result.price_source, PriceSource::IndicationComparables);
        assert!(result.tam_usd >= result.sam_usd);
        assert!(result.sam_usd >= result.som_usd);
        assert!(result.som_usd > 0.0);
        assert!(result.projected_tam_5yr_usd >= result.tam_usd);
        assert!(result.comparables.iter().all(|c| c.indication == "Non-Small Cell Lung Cancer"));
    }

    #[test]
    fn test_regional_geography() {
        let corpus = corpus();
        let mut request = MarketSizingRequest::new("NSCLC");
        request.geography = "US".to_string();
        let us = size_market(&corpus, &request);
        let global = size_market(&corpus, &MarketSizingRequest::new("NSCLC"));

        assert_eq!(us.prevalent_patients, 560_000.0);
        assert!(us.tam_usd < global.tam_usd);
    }

    #[test]
    fn test_price_chain_falls_through_to_corpus() {
        let corpus = corpus();
        let price = benchmark_price(&corpus, &[], None);
        assert_eq!(price.source, PriceSource::CorpusComparables);
        assert!(price.annual_price_usd > 0.0);
        assert_eq!(price.comparables.len(), corpus.pricing_comparables().len());
    }

    #[test]
    fn test_empty_pricing_table_is_unavailable() {
        let corpus = ReferenceCorpus::from_parts(crate::corpus::CorpusParts::default()).unwrap();
        let result = size_market(&corpus, &MarketSizingRequest::new("NSCLC"));
        assert_eq!(result.price_source, PriceSource::Unavailable);
        assert_eq!(result.tam_usd, 0.0);
        assert_eq!(result.resolution.match_kind, MatchKind::NoMatch);
    }
}
