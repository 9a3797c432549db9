//! Pure payload construction: domain data in, gateway request structs out.
//!
//! Monetary amounts leave this module as integer minor units (kopecks).
//! Each item price is rounded half-up to two decimal places independently
//! and the order total is the sum of the rounded items; the total is never
//! rounded separately.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::domain::{
    Application, CreateOrderRequest, OrderActionRequest, PositionCount, PositionItem,
};
use crate::error::{Result, SberQrError};

pub const CURRENCY_RUB: &str = "RUB";

/// Format a timestamp the way the gateway expects: UTC, 24-hour clock,
/// literal `Z` suffix.
pub fn format_rq_tm(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Convert a major-unit price to integer minor units, rounding half-up.
pub fn minor_units(price: Decimal) -> Result<i64> {
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let minor = (rounded * Decimal::from(100)).to_i64().ok_or_else(|| {
        SberQrError::Validation(format!("price {price} is not representable in minor units"))
    })?;

    if minor < 0 {
        return Err(SberQrError::Validation(format!(
            "price {price} is negative"
        )));
    }

    Ok(minor)
}

/// Build the order creation payload from an application aggregate.
pub fn build_create_order(
    config: &GatewayConfig,
    application: &Application,
    rq_uid: &str,
    now: DateTime<Utc>,
) -> Result<CreateOrderRequest> {
    if application.products.is_empty() {
        return Err(SberQrError::Validation(format!(
            "application {} has no line items",
            application.id
        )));
    }

    let mut items = Vec::with_capacity(application.products.len());
    let mut order_sum = 0i64;
    for product in &application.products {
        if product.quantity == 0 {
            return Err(SberQrError::Validation(format!(
                "line item '{}' has zero quantity",
                product.name
            )));
        }

        let position_sum = minor_units(product.tariff_price)? * i64::from(product.quantity);
        items.push(PositionItem {
            position_name: product.name.clone(),
            position_count: PositionCount {
                value: product.quantity,
                measure: product.unit.clone(),
            },
            position_sum,
            position_description: String::new(),
        });
        order_sum += position_sum;
    }

    let member_id = config
        .member_id
        .clone()
        .unwrap_or_else(|| application.id.to_string());

    Ok(CreateOrderRequest {
        rq_uid: rq_uid.to_string(),
        rq_tm: format_rq_tm(now),
        member_id,
        order_number: application.payment_id.clone(),
        order_create_date: format_rq_tm(application.created_at),
        order_params_type: items,
        id_qr: config.qr_id.clone(),
        order_sum,
        currency: CURRENCY_RUB.to_string(),
        description: format!("Номер заказа: {}", application.payment_id),
    })
}

/// Build the shared status/revoke/cancel payload.
pub fn build_order_action(rq_uid: &str, now: DateTime<Utc>, order_id: &str) -> OrderActionRequest {
    OrderActionRequest {
        rq_uid: rq_uid.to_string(),
        rq_tm: format_rq_tm(now),
        order_id: order_id.to_string(),
    }
}

/// Build the registry payload: opaque caller parameters merged with the
/// correlation fields. Callers own the pagination/filter contract.
pub fn build_registry_query(rq_uid: &str, now: DateTime<Utc>, params: Value) -> Result<Value> {
    let mut merged = match params {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(SberQrError::Validation(format!(
                "registry parameters must be a JSON object, got {other}"
            )))
        }
    };

    merged.insert("rq_uid".to_string(), Value::String(rq_uid.to_string()));
    merged.insert("rq_tm".to_string(), Value::String(format_rq_tm(now)));
    Ok(Value::Object(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, Credentials, Endpoints, GatewayConfig, HttpConfig};
    use crate::domain::ApplicationProduct;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn test_config(member_id: Option<&str>) -> GatewayConfig {
        GatewayConfig {
            credentials: Credentials {
                client_id: "merchant-1".to_string(),
                client_secret: "s3cret".to_string(),
            },
            qr_id: "TERMINAL-42".to_string(),
            member_id: member_id.map(str::to_string),
            endpoints: Endpoints::default(),
            http: HttpConfig::default(),
            auth: AuthConfig::default(),
        }
    }

    fn test_application(products: Vec<ApplicationProduct>) -> Application {
        Application {
            id: 77,
            payment_id: "A-2026-77".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 8, 7, 13, 15, 0).unwrap(),
            products,
        }
    }

    #[test]
    fn rq_tm_is_utc_24_hour_with_z_suffix() {
        // 14:05 UTC: a 12-hour formatter would have printed 02
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 14, 5, 9).unwrap();
        assert_eq!(format_rq_tm(at), "2026-08-07T14:05:09Z");
    }

    #[test]
    fn minor_units_rounds_half_up_per_item() {
        assert_eq!(minor_units(dec!(1000.005)).unwrap(), 100001);
        assert_eq!(minor_units(dec!(2500.00)).unwrap(), 250000);
        assert_eq!(minor_units(dec!(0.004)).unwrap(), 0);
        assert_eq!(minor_units(dec!(0.005)).unwrap(), 1);
    }

    #[test]
    fn minor_units_rejects_negative_prices() {
        let err = minor_units(dec!(-1.00)).unwrap_err();
        assert!(matches!(err, SberQrError::Validation(_)));
    }

    #[test]
    fn order_sum_is_sum_of_rounded_items() {
        let application = test_application(vec![
            ApplicationProduct::new("Тариф Базовый", dec!(1000.005)),
            ApplicationProduct::new("Тариф Плюс", dec!(2500.00)),
        ]);
        let payload =
            build_create_order(&test_config(None), &application, "rq-1", Utc::now()).unwrap();

        let item_sums: Vec<i64> = payload
            .order_params_type
            .iter()
            .map(|i| i.position_sum)
            .collect();
        assert_eq!(item_sums, vec![100001, 250000]);
        assert_eq!(payload.order_sum, 350001);
    }

    #[test]
    fn quantity_multiplies_the_rounded_unit_price() {
        let mut product = ApplicationProduct::new("Занятие", dec!(10.005));
        product.quantity = 3;
        let application = test_application(vec![product]);

        let payload =
            build_create_order(&test_config(None), &application, "rq-1", Utc::now()).unwrap();
        // 10.005 rounds to 10.01 first, then multiplies: 1001 * 3
        assert_eq!(payload.order_params_type[0].position_sum, 3003);
        assert_eq!(payload.order_sum, 3003);
        assert_eq!(payload.order_params_type[0].position_count.value, 3);
    }

    #[test]
    fn empty_application_fails_validation() {
        let application = test_application(vec![]);
        let err =
            build_create_order(&test_config(None), &application, "rq-1", Utc::now()).unwrap_err();
        assert!(matches!(err, SberQrError::Validation(_)));
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let mut product = ApplicationProduct::new("Занятие", dec!(10.00));
        product.quantity = 0;
        let application = test_application(vec![product]);

        let err =
            build_create_order(&test_config(None), &application, "rq-1", Utc::now()).unwrap_err();
        assert!(matches!(err, SberQrError::Validation(_)));
    }

    #[test]
    fn payload_carries_merchant_identifiers() {
        let application = test_application(vec![ApplicationProduct::new("Тариф", dec!(100))]);
        let payload = build_create_order(
            &test_config(Some("member-9")),
            &application,
            "rq-1",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(payload.member_id, "member-9");
        assert_eq!(payload.id_qr, "TERMINAL-42");
        assert_eq!(payload.order_number, "A-2026-77");
        assert_eq!(payload.order_create_date, "2026-08-07T13:15:00Z");
        assert_eq!(payload.currency, "RUB");
        assert_eq!(payload.description, "Номер заказа: A-2026-77");
    }

    #[test]
    fn member_id_falls_back_to_application_id() {
        let application = test_application(vec![ApplicationProduct::new("Тариф", dec!(100))]);
        let payload =
            build_create_order(&test_config(None), &application, "rq-1", Utc::now()).unwrap();
        assert_eq!(payload.member_id, "77");
    }

    #[test]
    fn order_action_payload_shape() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 16, 0, 0).unwrap();
        let action = build_order_action("rq-2", at, "ord-55");
        assert_eq!(action.rq_uid, "rq-2");
        assert_eq!(action.rq_tm, "2026-08-07T16:00:00Z");
        assert_eq!(action.order_id, "ord-55");
    }

    #[test]
    fn registry_query_merges_correlation_fields() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 16, 0, 0).unwrap();
        let query = build_registry_query(
            "rq-3",
            at,
            json!({"start_period": "2026-08-01", "count": 50}),
        )
        .unwrap();

        assert_eq!(query["rq_uid"], "rq-3");
        assert_eq!(query["rq_tm"], "2026-08-07T16:00:00Z");
        assert_eq!(query["start_period"], "2026-08-01");
        assert_eq!(query["count"], 50);
    }

    #[test]
    fn registry_query_rejects_non_object_params() {
        let err = build_registry_query("rq-3", Utc::now(), json!([1, 2])).unwrap_err();
        assert!(matches!(err, SberQrError::Validation(_)));
        assert!(build_registry_query("rq-3", Utc::now(), Value::Null).is_ok());
    }
}
