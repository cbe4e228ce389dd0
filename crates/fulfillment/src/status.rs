//! The one closed vocabulary for "where is this order".
//!
//! Every component (aggregate, tracking view, dashboards, HTTP) uses these two
//! enums; string forms exist only at the serde boundary and in
//! [`OrderStatus::driver_label`].

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use sitecart_core::DomainError;

/// Customer/dashboard-facing lifecycle position, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    OrderConfirmed,
    PickingOrder,
    AllocatedDriver,
    ReadyToPickup,
    #[serde(rename = "allocated-dispatch-officer-2")]
    AllocatedDispatchOfficer2,
    OnRoute,
    OrderComplete,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::OrderConfirmed,
        OrderStatus::PickingOrder,
        OrderStatus::AllocatedDriver,
        OrderStatus::ReadyToPickup,
        OrderStatus::AllocatedDispatchOfficer2,
        OrderStatus::OnRoute,
        OrderStatus::OrderComplete,
    ];

    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::OrderConfirmed => "order-confirmed",
            OrderStatus::PickingOrder => "picking-order",
            OrderStatus::AllocatedDriver => "allocated-driver",
            OrderStatus::ReadyToPickup => "ready-to-pickup",
            OrderStatus::AllocatedDispatchOfficer2 => "allocated-dispatch-officer-2",
            OrderStatus::OnRoute => "on-route",
            OrderStatus::OrderComplete => "order-complete",
        }
    }

    /// Name shown on the driver dashboard.
    pub fn driver_label(self) -> &'static str {
        match self {
            OrderStatus::AllocatedDispatchOfficer2 => "ready for driver",
            OrderStatus::OnRoute => "on route",
            OrderStatus::OrderComplete => "delivered",
            other => other.as_str(),
        }
    }

    /// The single legal successor, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::OrderConfirmed => Some(OrderStatus::PickingOrder),
            OrderStatus::PickingOrder => Some(OrderStatus::AllocatedDriver),
            OrderStatus::AllocatedDriver => Some(OrderStatus::ReadyToPickup),
            OrderStatus::ReadyToPickup => Some(OrderStatus::AllocatedDispatchOfficer2),
            OrderStatus::AllocatedDispatchOfficer2 => Some(OrderStatus::OnRoute),
            OrderStatus::OnRoute => Some(OrderStatus::OrderComplete),
            OrderStatus::OrderComplete => None,
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Soft-deactivation is only possible before the goods leave the yard.
    pub fn allows_deactivation(self) -> bool {
        self < OrderStatus::OnRoute
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    /// Accepts canonical names plus the legacy spellings still sent by older
    /// dashboards ("ready to pickup", "ready for driver", "delivered", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "order-confirmed" => Ok(OrderStatus::OrderConfirmed),
            "picking-order" => Ok(OrderStatus::PickingOrder),
            "allocated-driver" => Ok(OrderStatus::AllocatedDriver),
            "ready-to-pickup" => Ok(OrderStatus::ReadyToPickup),
            "allocated-dispatch-officer-2" | "ready-for-driver" => {
                Ok(OrderStatus::AllocatedDispatchOfficer2)
            }
            "on-route" | "in-transit" => Ok(OrderStatus::OnRoute),
            "order-complete" | "delivered" => Ok(OrderStatus::OrderComplete),
            _ => Err(DomainError::validation(format!("unknown order status '{s}'"))),
        }
    }
}

/// The seven workflow checkpoints recorded in the stage log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Pending,
    Packed,
    Storage,
    Assigned,
    Loaded,
    InTransit,
    Delivered,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Pending,
        Stage::Packed,
        Stage::Storage,
        Stage::Assigned,
        Stage::Loaded,
        Stage::InTransit,
        Stage::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::Packed => "packed",
            Stage::Storage => "storage",
            Stage::Assigned => "assigned",
            Stage::Loaded => "loaded",
            Stage::InTransit => "inTransit",
            Stage::Delivered => "delivered",
        }
    }

    /// Status conventionally reached when this stage completes.
    ///
    /// `Loaded` has none: driver verification does not move the order.
    pub fn status_on_completion(self) -> Option<OrderStatus> {
        match self {
            Stage::Pending => Some(OrderStatus::OrderConfirmed),
            Stage::Packed => Some(OrderStatus::AllocatedDriver),
            Stage::Storage => Some(OrderStatus::ReadyToPickup),
            Stage::Assigned => Some(OrderStatus::AllocatedDispatchOfficer2),
            Stage::Loaded => None,
            Stage::InTransit => Some(OrderStatus::OnRoute),
            Stage::Delivered => Some(OrderStatus::OrderComplete),
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&Stage::InTransit).unwrap(),
            "\"inTransit\""
        );
    }

    #[test]
    fn legacy_spellings_parse_to_the_same_status() {
        for raw in ["ready to pickup", "ready_to_pickup", "Ready-To-Pickup"] {
            assert_eq!(raw.parse::<OrderStatus>().unwrap(), OrderStatus::ReadyToPickup);
        }
        assert_eq!(
            "ready for driver".parse::<OrderStatus>().unwrap(),
            OrderStatus::AllocatedDispatchOfficer2
        );
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn transitions_only_move_one_step_forward() {
        assert!(OrderStatus::OrderConfirmed.can_transition_to(OrderStatus::PickingOrder));
        assert!(!OrderStatus::OrderConfirmed.can_transition_to(OrderStatus::AllocatedDriver));
        assert!(!OrderStatus::OnRoute.can_transition_to(OrderStatus::PickingOrder));
        assert!(OrderStatus::OrderComplete.is_terminal());
    }

    #[test]
    fn stage_completion_statuses_follow_progression_order() {
        let statuses: Vec<_> = Stage::ALL
            .iter()
            .filter_map(|s| s.status_on_completion())
            .collect();
        let mut sorted = statuses.clone();
        sorted.sort();
        assert_eq!(statuses, sorted);
        assert_eq!(OrderStatus::AllocatedDispatchOfficer2.driver_label(), "ready for driver");
    }
}
