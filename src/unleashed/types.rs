use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pagination block returned by Unleashed list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Pagination {
    pub number_of_items: u64,
    pub page_size: u64,
    pub page_number: u64,
    pub number_of_pages: u64,
}

/// Standard `{ Pagination, Items }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsPage<T> {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub guid: String,
    pub product_code: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub average_land_price: Option<Decimal>,
    #[serde(default)]
    pub product_group: Option<String>,
}

/// One batch-number stock row (`/BatchNumbers`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchStock {
    pub guid: String,
    pub number: String,
    pub quantity: Decimal,
    pub warehouse_code: String,
    #[serde(default)]
    pub product_code: Option<String>,
}

/// One stock-on-hand row (`/StockOnHand`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockOnHand {
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub qty_on_hand: Option<Decimal>,
    #[serde(default)]
    pub available_qty: Option<Decimal>,
    #[serde(default)]
    pub warehouse: Option<String>,
}

/// A stock adjustment as returned by `/StockAdjustments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdjustmentInfo {
    pub adjustment_number: String,
    pub status: String,
    pub guid: String,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub last_modified_by: Option<String>,
    #[serde(default)]
    pub last_modified_on: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductRef {
    pub product_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WarehouseRef {
    pub warehouse_code: String,
}

/// One line of a stock adjustment POST. `NewQuantity` is the external
/// system's signed-quantity-as-string format (`"+10"` / `"-5"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockAdjustmentLine {
    pub product: ProductRef,
    pub new_quantity: String,
    pub new_actual_value: Decimal,
    pub comments: String,
}

/// Body of a stock adjustment POST. Always submitted in `Parked` status;
/// the downstream automation workflow completes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockAdjustmentRequest {
    pub warehouse: WarehouseRef,
    pub adjustment_date: String,
    pub adjustment_reason: String,
    pub status: String,
    pub stock_adjustment_lines: Vec<StockAdjustmentLine>,
}

/// Successful adjustment creation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostedAdjustment {
    pub adjustment_number: String,
    pub guid: String,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Source tag recorded on each posted adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentReason {
    Dispatch,
    PackApp,
}

impl AdjustmentReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::PackApp => "Masters Pack App",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn adjustment_line_serializes_to_pascal_case() {
        let line = StockAdjustmentLine {
            product: ProductRef {
                product_code: "POT".into(),
            },
            new_quantity: "-5".into(),
            new_actual_value: dec!(1.25),
            comments: "B1&B2&3$".into(),
        };

        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["Product"]["ProductCode"], "POT");
        assert_eq!(json["NewQuantity"], "-5");
        assert_eq!(json["Comments"], "B1&B2&3$");
    }

    #[test]
    fn items_page_tolerates_missing_pagination() {
        let json = r#"{"Items":[{"Guid":"g1","ProductCode":"POT"}]}"#;
        let page: ItemsPage<Product> = serde_json::from_str(json).unwrap();
        assert!(page.pagination.is_none());
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].product_code.as_deref(), Some("POT"));
    }

    #[test]
    fn reason_strings_match_external_convention() {
        assert_eq!(AdjustmentReason::Dispatch.as_str(), "Dispatch");
        assert_eq!(AdjustmentReason::PackApp.as_str(), "Masters Pack App");
    }
}
