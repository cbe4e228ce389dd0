use serde::{Deserialize, Serialize};

use sitecart_core::ValueObject;

/// Computed footprint of an order: cubic metres, kilograms, package count.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequirement {
    pub volume: f64,
    pub weight: f64,
    pub packages: u32,
}

impl ValueObject for LoadRequirement {}

/// What a vehicle can carry in one trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    pub max_volume: f64,
    pub max_weight: f64,
    pub max_packages: u32,
}

impl ValueObject for Capacity {}

/// Every dimension in which a requirement exceeds a capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityShortfall {
    pub volume: Option<(f64, f64)>,
    pub weight: Option<(f64, f64)>,
    pub packages: Option<(u32, u32)>,
}

impl Capacity {
    pub fn new(max_volume: f64, max_weight: f64, max_packages: u32) -> Self {
        Self {
            max_volume,
            max_weight,
            max_packages,
        }
    }

    /// Meet-or-exceed check on all three dimensions.
    pub fn accommodates(&self, req: &LoadRequirement) -> Result<(), CapacityShortfall> {
        let shortfall = CapacityShortfall {
            volume: (req.volume > self.max_volume).then_some((req.volume, self.max_volume)),
            weight: (req.weight > self.max_weight).then_some((req.weight, self.max_weight)),
            packages: (req.packages > self.max_packages)
                .then_some((req.packages, self.max_packages)),
        };

        if shortfall.volume.is_none() && shortfall.weight.is_none() && shortfall.packages.is_none()
        {
            Ok(())
        } else {
            Err(shortfall)
        }
    }

    /// Sum of the three capacity numbers; smaller means "smaller vehicle".
    pub fn size_score(&self) -> f64 {
        self.max_volume + self.max_weight + f64::from(self.max_packages)
    }
}

impl core::fmt::Display for CapacityShortfall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut parts = Vec::new();
        if let Some((need, max)) = self.volume {
            parts.push(format!("volume {need:.2} > {max:.2}"));
        }
        if let Some((need, max)) = self.weight {
            parts.push(format!("weight {need:.2} > {max:.2}"));
        }
        if let Some((need, max)) = self.packages {
            parts.push(format!("packages {need} > {max}"));
        }
        write!(f, "vehicle capacity exceeded: {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(volume: f64, weight: f64, packages: u32) -> LoadRequirement {
        LoadRequirement {
            volume,
            weight,
            packages,
        }
    }

    #[test]
    fn exact_fit_is_accepted() {
        let cap = Capacity::new(5.0, 100.0, 10);
        assert!(cap.accommodates(&req(5.0, 100.0, 10)).is_ok());
    }

    #[test]
    fn each_dimension_is_checked() {
        let cap = Capacity::new(5.0, 100.0, 10);

        let over_volume = cap.accommodates(&req(6.0, 10.0, 1)).unwrap_err();
        assert_eq!(over_volume.volume, Some((6.0, 5.0)));
        assert!(over_volume.weight.is_none());

        let over_weight = cap.accommodates(&req(1.0, 100.5, 1)).unwrap_err();
        assert!(over_weight.weight.is_some());

        let over_packages = cap.accommodates(&req(1.0, 1.0, 11)).unwrap_err();
        assert_eq!(over_packages.packages, Some((11, 10)));
        assert!(over_packages.to_string().contains("packages 11 > 10"));
    }
}
