//! Load requirement resolver.
//!
//! Deliberately coarse: one package per line item (not per unit), a flat
//! per-unit volume, and per-unit weight read from the item's free-text label.

use std::sync::LazyLock;

use regex::Regex;

use crate::capacity::LoadRequirement;

/// Per-unit volume; no per-product volume data is modeled.
pub const UNIT_VOLUME_M3: f64 = 0.05;

/// Per-unit weight used when a label carries no number.
pub const DEFAULT_UNIT_WEIGHT_KG: f64 = 10.0;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?|\.\d+").expect("static regex"));

/// One order line as seen by the resolver.
#[derive(Debug, Clone, Copy)]
pub struct CargoLine<'a> {
    pub weight_label: Option<&'a str>,
    pub quantity: u32,
}

/// First numeric token in a label ("50kg bag" -> 50.0). Units are not converted.
pub fn parse_unit_weight(label: &str) -> Option<f64> {
    FIRST_NUMBER
        .find(label)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn requirement_for<'a>(lines: impl IntoIterator<Item = CargoLine<'a>>) -> LoadRequirement {
    lines
        .into_iter()
        .fold(LoadRequirement::default(), |mut acc, line| {
            let qty = f64::from(line.quantity);
            let unit_weight = line
                .weight_label
                .and_then(parse_unit_weight)
                .unwrap_or(DEFAULT_UNIT_WEIGHT_KG);

            acc.packages += 1;
            acc.weight += unit_weight * qty;
            acc.volume += UNIT_VOLUME_M3 * qty;
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_numeric_token_wins() {
        assert_eq!(parse_unit_weight("50kg"), Some(50.0));
        assert_eq!(parse_unit_weight("Cement 42.5 grade, 25 kg"), Some(42.5));
        assert_eq!(parse_unit_weight("approx .5 tonne"), Some(0.5));
        assert_eq!(parse_unit_weight("heavy"), None);
        assert_eq!(parse_unit_weight(""), None);
    }

    #[test]
    fn packages_count_lines_not_units() {
        let req = requirement_for([
            CargoLine {
                weight_label: Some("50kg"),
                quantity: 4,
            },
            CargoLine {
                weight_label: None,
                quantity: 2,
            },
        ]);

        assert_eq!(req.packages, 2);
        assert!((req.weight - (200.0 + 2.0 * DEFAULT_UNIT_WEIGHT_KG)).abs() < 1e-9);
        assert!((req.volume - 6.0 * UNIT_VOLUME_M3).abs() < 1e-9);
    }

    #[test]
    fn empty_order_needs_nothing() {
        assert_eq!(requirement_for([]), LoadRequirement::default());
    }

    proptest! {
        #[test]
        fn requirement_is_additive_over_lines(
            quantities in prop::collection::vec(1u32..500, 0..20)
        ) {
            let lines: Vec<CargoLine<'_>> = quantities
                .iter()
                .map(|q| CargoLine { weight_label: Some("2kg"), quantity: *q })
                .collect();
            let req = requirement_for(lines);
            let units: u32 = quantities.iter().sum();

            prop_assert_eq!(req.packages as usize, quantities.len());
            prop_assert!((req.weight - 2.0 * f64::from(units)).abs() < 1e-6);
            prop_assert!((req.volume - UNIT_VOLUME_M3 * f64::from(units)).abs() < 1e-6);
        }
    }
}
