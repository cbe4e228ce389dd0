use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use sitecart_auth::AuthzError;
use sitecart_infra::{DispatchError, FulfillmentError};

pub fn dispatch_error_to_response(err: DispatchError) -> Response {
    match err {
        DispatchError::Concurrency(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DispatchError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DispatchError::GuardViolation(msg) => json_error(StatusCode::BAD_REQUEST, "guard_violation", msg),
        DispatchError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "unauthorized"),
        DispatchError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        DispatchError::TenantIsolation(msg) => json_error(StatusCode::FORBIDDEN, "tenant_isolation", msg),
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::Store(e) => {
            tracing::error!(error = %e, "event store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn fulfillment_error_to_response(err: FulfillmentError) -> Response {
    match err {
        FulfillmentError::Dispatch(e) => dispatch_error_to_response(e),
        FulfillmentError::Projection(e) => {
            tracing::error!(error = %e, "read model failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "projection_error", e.to_string())
        }
        e @ (FulfillmentError::VehicleNotFound(_)
        | FulfillmentError::EmployeeNotFound(_)
        | FulfillmentError::NothingToStart(_)) => {
            json_error(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        e @ FulfillmentError::NoSuitableVehicle => {
            json_error(StatusCode::BAD_REQUEST, "guard_violation", e.to_string())
        }
        FulfillmentError::RouteStartFailed(errors) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "guard_violation",
                "message": "route could not be started for any order on the vehicle",
                "errors": errors,
            })),
        )
            .into_response(),
    }
}

pub fn authz_error_to_response(err: AuthzError) -> Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecart_fleet::VehicleId;

    #[test]
    fn error_categories_map_to_status_codes() {
        let cases = [
            (
                FulfillmentError::Dispatch(DispatchError::NotFound("order".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                FulfillmentError::Dispatch(DispatchError::GuardViolation("1 items still pending packing".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                FulfillmentError::Dispatch(DispatchError::Concurrency("stale".into())),
                StatusCode::CONFLICT,
            ),
            (FulfillmentError::VehicleNotFound(VehicleId::new("VH-9")), StatusCode::NOT_FOUND),
            (FulfillmentError::RouteStartFailed(vec![]), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(fulfillment_error_to_response(err).status(), status);
        }
        assert_eq!(
            authz_error_to_response(AuthzError::Impersonation("DRV-2".into())).status(),
            StatusCode::FORBIDDEN
        );
    }
}
