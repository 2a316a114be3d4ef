//! Reconciliation engines: expansion of a packout bin through its BOM into
//! a merged adjustment batch, and aggregation of dispatch lines into
//! per-product shipment adjustments.
//!
//! Both engines are pure functions of their inputs. The same bin or
//! dispatch state always produces the same batch; nothing here touches the
//! database or the network. Conversion to the external wire format
//! (product resolution, signed-string quantities, comment encoding)
//! happens in [`resolve_movement_lines`] / [`shipment_wire_lines`] so the
//! internal representation stays structured.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::entities::{bin, bin_batch, bin_finished_good, dispatch_line};
use crate::services::boms::BomDetail;
use crate::unleashed::types::{Product, ProductRef, StockAdjustmentLine};

/// Kind of inventory movement a line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    /// Raw/bulk input consumed by the run
    Raw,
    /// Intermediate input consumed per unit of output
    Consumed,
    /// Finished goods produced
    Finished,
    /// Outbound shipment
    Shipment,
}

/// One movement in an adjustment batch. Quantities are signed: production
/// positive, consumption negative.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementLine {
    /// External product identifier
    pub product_id: String,
    pub batch_name: String,
    pub batch_location: String,
    pub quantity: Decimal,
    pub kind: MovementKind,
    pub comment: String,
}

impl MovementLine {
    fn key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.product_id, self.batch_name, self.batch_location
        )
    }
}

/// The computed, in-memory adjustment batch. Produced fresh on every
/// process action and never persisted.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentBatch {
    pub lines: Vec<MovementLine>,
}

impl AdjustmentBatch {
    /// Total signed quantity per (product, batch, location) key.
    pub fn totals_by_key(&self) -> HashMap<String, Decimal> {
        let mut totals = HashMap::new();
        for line in &self.lines {
            *totals.entry(line.key()).or_insert(Decimal::ZERO) += line.quantity;
        }
        totals
    }

    pub fn lines_of_kind(&self, kind: MovementKind) -> impl Iterator<Item = &MovementLine> {
        self.lines.iter().filter(move |l| l.kind == kind)
    }
}

/// Accumulator merging lines by (product, batch, location) key.
///
/// Quantities combine additively; all other fields take the most recent
/// line's values. First-insertion order is preserved so output is
/// deterministic for a fixed input order.
#[derive(Debug, Default)]
struct LineAccumulator {
    order: Vec<String>,
    lines: HashMap<String, MovementLine>,
}

impl LineAccumulator {
    fn add(&mut self, line: MovementLine) {
        let key = line.key();
        match self.lines.get_mut(&key) {
            Some(existing) => {
                let merged_quantity = existing.quantity + line.quantity;
                *existing = line;
                existing.quantity = merged_quantity;
            }
            None => {
                self.order.push(key.clone());
                self.lines.insert(key, line);
            }
        }
    }

    fn into_lines(mut self) -> Vec<MovementLine> {
        self.order
            .drain(..)
            .filter_map(|key| self.lines.remove(&key))
            .collect()
    }
}

/// Expands one packout bin into every movement implied by its BOM.
///
/// Finished lines are emitted first (one per produced finished good, in the
/// BOM's persisted order), then consumed lines (per finished good, in
/// persisted consumed-product order), all merged through the accumulator.
/// Exactly one raw line follows, outside the accumulator, with quantity
/// `-total_bins_used`.
pub fn expand_bin(
    bin: &bin::Model,
    produced: &[bin_finished_good::Model],
    bom: &BomDetail,
) -> AdjustmentBatch {
    let position: HashMap<&uuid::Uuid, usize> = bom
        .finished_goods
        .iter()
        .enumerate()
        .map(|(idx, fg)| (&fg.id, idx))
        .collect();

    let mut ordered: Vec<&bin_finished_good::Model> = produced.iter().collect();
    ordered.sort_by_key(|assoc| {
        position
            .get(&assoc.finished_good_id)
            .copied()
            .unwrap_or(usize::MAX)
    });

    let mut accumulator = LineAccumulator::default();

    for assoc in &ordered {
        accumulator.add(MovementLine {
            product_id: assoc.finished_good_product_id.clone(),
            batch_name: bin.batch_name.clone(),
            batch_location: bin.batch_location.clone(),
            quantity: assoc.quantity,
            kind: MovementKind::Finished,
            comment: bin.custom_batch.clone(),
        });
    }

    for fg in &bom.finished_goods {
        let Some(assoc) = ordered
            .iter()
            .find(|assoc| assoc.finished_good_id == fg.id)
        else {
            continue;
        };

        for consumed in &fg.consumed_products {
            accumulator.add(MovementLine {
                product_id: consumed.product_id.clone(),
                batch_name: bin.batch_name.clone(),
                batch_location: bin.batch_location.clone(),
                quantity: -(consumed.quantity * assoc.quantity),
                kind: MovementKind::Consumed,
                comment: bin.custom_batch.clone(),
            });
        }
    }

    let mut lines = accumulator.into_lines();
    lines.push(MovementLine {
        product_id: bom.raw_id.clone(),
        batch_name: bin.batch_name.clone(),
        batch_location: bin.batch_location.clone(),
        quantity: -bin.total_bins_used,
        kind: MovementKind::Raw,
        comment: bin.custom_batch.clone(),
    });

    AdjustmentBatch { lines }
}

/// Raw-line audit comment: the bin's batch breakdown as `{name}&{qty}`
/// records joined by `$`. The downstream automation step parses this back
/// out, so the delimiters are load-bearing.
pub fn batch_breakdown(batches: &[bin_batch::Model]) -> String {
    batches
        .iter()
        .map(|batch| format!("{}&{}", batch.batch_name, batch.quantity.normalize()))
        .collect::<Vec<_>>()
        .join("$")
}

/// Formats a signed quantity in the external system's explicit-sign string
/// form (`"+10"` / `"-5"`).
fn signed_quantity(quantity: Decimal) -> String {
    let normalized = quantity.normalize();
    if normalized.is_sign_negative() {
        format!("-{}", normalized.abs())
    } else {
        format!("+{}", normalized)
    }
}

/// Converts movement lines to the external wire format, resolving each
/// product by external id against the catalog.
///
/// Lines whose product cannot be resolved to a product code are dropped
/// from the batch (best-effort policy: one bad reference must not block the
/// run); the dropped product ids are returned for logging. Raw lines carry
/// the batch breakdown as comment and an inverted unit value.
pub fn resolve_movement_lines(
    batch: &AdjustmentBatch,
    products: &[Product],
    raw_comment: &str,
) -> (Vec<StockAdjustmentLine>, Vec<String>) {
    let by_guid: HashMap<&str, &Product> = products
        .iter()
        .map(|product| (product.guid.as_str(), product))
        .collect();

    let mut lines = Vec::with_capacity(batch.lines.len());
    let mut dropped = Vec::new();

    for movement in &batch.lines {
        let resolved = by_guid
            .get(movement.product_id.as_str())
            .and_then(|product| {
                product
                    .product_code
                    .clone()
                    .map(|code| (code, product.average_land_price.unwrap_or_default()))
            });

        let Some((product_code, unit_value)) = resolved else {
            dropped.push(movement.product_id.clone());
            continue;
        };

        let (value, comments) = match movement.kind {
            MovementKind::Raw => (-unit_value, raw_comment.to_string()),
            _ => (unit_value, movement.comment.clone()),
        };

        lines.push(StockAdjustmentLine {
            product: ProductRef { product_code },
            new_quantity: signed_quantity(movement.quantity),
            new_actual_value: value,
            comments,
        });
    }

    (lines, dropped)
}

/// A shipped batch portion of one product within a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPortion {
    pub batch_number: String,
    pub ship: Decimal,
}

/// Per-product aggregate of a dispatch: total negative quantity plus the
/// structured batch breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentAggregate {
    pub product_code: String,
    /// Negative sum of all shipped quantities for this product
    pub quantity: Decimal,
    pub portions: Vec<BatchPortion>,
}

/// Groups dispatch lines into one aggregate per product code, in
/// first-seen order. The total per product equals the negative sum of the
/// `ship` values across all lines for that product.
pub fn aggregate_dispatch(lines: &[dispatch_line::Model]) -> Vec<ShipmentAggregate> {
    let mut aggregates: Vec<ShipmentAggregate> = Vec::new();

    for line in lines {
        let portion = BatchPortion {
            batch_number: line.batch_number.clone(),
            ship: line.ship,
        };

        match aggregates
            .iter_mut()
            .find(|agg| agg.product_code == line.product_code)
        {
            Some(existing) => {
                existing.quantity -= line.ship;
                existing.portions.push(portion);
            }
            None => aggregates.push(ShipmentAggregate {
                product_code: line.product_code.clone(),
                quantity: -line.ship,
                portions: vec![portion],
            }),
        }
    }

    aggregates
}

/// Serializes a batch breakdown into the external comment convention: the
/// first batch number seeds the comment, every further portion appends
/// `&{batch}&{ship}$`. `["B1","B2"]` with ships `[5,3]` yields `B1&B2&3$`.
pub fn encode_batch_comment(portions: &[BatchPortion]) -> String {
    let mut comment = String::new();
    for (idx, portion) in portions.iter().enumerate() {
        if idx == 0 {
            comment.push_str(&portion.batch_number);
        } else {
            comment.push_str(&format!(
                "&{}&{}$",
                portion.batch_number,
                portion.ship.normalize()
            ));
        }
    }
    comment
}

/// Converts dispatch aggregates to wire lines: quantity sign-normalized to
/// the `-{abs}` string form, zero unit value, encoded batch comment.
pub fn shipment_wire_lines(aggregates: &[ShipmentAggregate]) -> Vec<StockAdjustmentLine> {
    aggregates
        .iter()
        .map(|agg| StockAdjustmentLine {
            product: ProductRef {
                product_code: agg.product_code.clone(),
            },
            new_quantity: format!("-{}", agg.quantity.abs().normalize()),
            new_actual_value: Decimal::ZERO,
            comments: encode_batch_comment(&agg.portions),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostingState;
    use crate::services::boms::{BomDetail, ConsumedProductView, FinishedGoodView};
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn test_bin(total_bins_used: Decimal) -> bin::Model {
        bin::Model {
            id: Uuid::new_v4(),
            bin_number: 10001,
            bom_id: Uuid::new_v4(),
            total_bins_used,
            batch_id: "batch-guid".into(),
            batch_name: "PO123".into(),
            batch_location: "W1".into(),
            custom_batch: "CUSTOM1".into(),
            staff_count: 4,
            time_start: Utc::now(),
            time_finish: Utc::now(),
            posting_state: PostingState::Draft,
            posting_attempts: 0,
            adjustment_number: None,
            adjustment_id: None,
            external_status: None,
            external_modified_by: None,
            external_modified_on: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn produced(finished_good: &FinishedGoodView, quantity: Decimal) -> bin_finished_good::Model {
        bin_finished_good::Model {
            id: Uuid::new_v4(),
            bin_id: Uuid::new_v4(),
            finished_good_id: finished_good.id,
            finished_good_product_id: finished_good.product_id.clone(),
            quantity,
            comment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn finished_good(
        product_id: &str,
        sort_order: i32,
        consumed: Vec<(&str, Decimal)>,
    ) -> FinishedGoodView {
        FinishedGoodView {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            product_code: product_id.to_lowercase(),
            quantity: Decimal::ONE,
            sort_order,
            consumed_products: consumed
                .into_iter()
                .map(|(pid, qty)| ConsumedProductView {
                    id: Uuid::new_v4(),
                    product_id: pid.into(),
                    product_code: pid.to_lowercase(),
                    quantity: qty,
                })
                .collect(),
        }
    }

    fn bom_with(finished_goods: Vec<FinishedGoodView>) -> BomDetail {
        BomDetail {
            id: Uuid::new_v4(),
            raw_id: "RAW".into(),
            product_code: "raw".into(),
            name: Some("Test BOM".into()),
            quantity: Decimal::ONE,
            finished_goods,
        }
    }

    fn dispatch_line_for(product_code: &str, batch: &str, ship: Decimal) -> dispatch_line::Model {
        dispatch_line::Model {
            id: Uuid::new_v4(),
            dispatch_id: 1,
            line: 1,
            product_code: product_code.into(),
            product_description: String::new(),
            ship,
            weight: None,
            sales_order_line_id: Uuid::new_v4(),
            batch_number: batch.into(),
            batch_location: "W1".into(),
            seal_number: None,
            container_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn end_to_end_expansion() {
        // BOM: raw R, finished F consuming 2x C per unit. Producing F x10
        // from 5 bins yields R:-5, F:+10, C:-20.
        let fg = finished_good("F", 1, vec![("C", dec!(2))]);
        let bom = bom_with(vec![fg.clone()]);
        let bin = test_bin(dec!(5));
        let assoc = produced(&fg, dec!(10));

        let batch = expand_bin(&bin, &[assoc], &bom);

        let mut by_product: Vec<(String, Decimal)> = batch
            .lines
            .iter()
            .map(|l| (l.product_id.clone(), l.quantity))
            .collect();
        by_product.sort();

        assert_eq!(
            by_product,
            vec![
                ("C".to_string(), dec!(-20)),
                ("F".to_string(), dec!(10)),
                ("RAW".to_string(), dec!(-5)),
            ]
        );
    }

    #[test]
    fn exactly_one_raw_line_regardless_of_outputs() {
        let fg_a = finished_good("A", 1, vec![("C1", dec!(1)), ("C2", dec!(3))]);
        let fg_b = finished_good("B", 2, vec![("C1", dec!(2))]);
        let bom = bom_with(vec![fg_a.clone(), fg_b.clone()]);
        let bin = test_bin(dec!(7));
        let assocs = vec![produced(&fg_a, dec!(4)), produced(&fg_b, dec!(6))];

        let batch = expand_bin(&bin, &assocs, &bom);

        let raw: Vec<_> = batch.lines_of_kind(MovementKind::Raw).collect();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].quantity, dec!(-7));
        assert_eq!(raw[0].product_id, "RAW");
    }

    #[test]
    fn conservation_of_finished_and_consumed_quantities() {
        let fg_a = finished_good("A", 1, vec![("C", dec!(2))]);
        let fg_b = finished_good("B", 2, vec![("C", dec!(0.5))]);
        let bom = bom_with(vec![fg_a.clone(), fg_b.clone()]);
        let bin = test_bin(dec!(3));
        let assocs = vec![produced(&fg_a, dec!(10)), produced(&fg_b, dec!(4))];

        let batch = expand_bin(&bin, &assocs, &bom);

        let finished_total: Decimal = batch
            .lines_of_kind(MovementKind::Finished)
            .map(|l| l.quantity)
            .sum();
        assert_eq!(finished_total, dec!(14));

        // C is consumed at 2/unit of A and 0.5/unit of B: 20 + 2 = 22
        let consumed_c: Decimal = batch
            .lines
            .iter()
            .filter(|l| l.product_id == "C")
            .map(|l| l.quantity)
            .sum();
        assert_eq!(consumed_c, dec!(-22));
    }

    #[test]
    fn colliding_keys_merge_additively() {
        // Two produced entries for the same finished-good product under the
        // same batch/location key must merge into one line.
        let fg = finished_good("F", 1, vec![("C", dec!(1))]);
        let mut fg_dup = finished_good("F", 2, vec![]);
        fg_dup.product_id = "F".into();
        let bom = bom_with(vec![fg.clone(), fg_dup.clone()]);
        let bin = test_bin(dec!(1));
        let assocs = vec![produced(&fg, dec!(3)), produced(&fg_dup, dec!(4))];

        let batch = expand_bin(&bin, &assocs, &bom);

        let f_lines: Vec<_> = batch
            .lines
            .iter()
            .filter(|l| l.product_id == "F")
            .collect();
        assert_eq!(f_lines.len(), 1);
        assert_eq!(f_lines[0].quantity, dec!(7));
    }

    #[test]
    fn consumed_merges_into_finished_line_at_same_key() {
        // A finished good that consumes its own product id: +5 produced,
        // -2 consumed, net +3 on a single line.
        let fg = finished_good("F", 1, vec![("F", dec!(2))]);
        let bom = bom_with(vec![fg.clone()]);
        let bin = test_bin(dec!(1));
        let assoc = produced(&fg, dec!(1));

        let batch = expand_bin(&bin, &[assoc], &bom);

        // produced 1, consumed 2*1 => net -1 for F
        let f_lines: Vec<_> = batch
            .lines
            .iter()
            .filter(|l| l.product_id == "F")
            .collect();
        assert_eq!(f_lines.len(), 1);
        assert_eq!(f_lines[0].quantity, dec!(-1));
    }

    #[test]
    fn emission_follows_bom_order_not_association_order() {
        let fg_a = finished_good("A", 1, vec![]);
        let fg_b = finished_good("B", 2, vec![]);
        let bom = bom_with(vec![fg_a.clone(), fg_b.clone()]);
        let bin = test_bin(dec!(1));
        // Associations arrive in reverse order
        let assocs = vec![produced(&fg_b, dec!(2)), produced(&fg_a, dec!(5))];

        let batch = expand_bin(&bin, &assocs, &bom);

        let product_order: Vec<&str> = batch
            .lines_of_kind(MovementKind::Finished)
            .map(|l| l.product_id.as_str())
            .collect();
        assert_eq!(product_order, vec!["A", "B"]);
    }

    #[test]
    fn permuted_associations_produce_identical_totals() {
        let fg_a = finished_good("A", 1, vec![("C", dec!(2))]);
        let fg_b = finished_good("B", 2, vec![("C", dec!(1)), ("D", dec!(4))]);
        let fg_c = finished_good("A", 3, vec![("D", dec!(1))]);
        let bom = bom_with(vec![fg_a.clone(), fg_b.clone(), fg_c.clone()]);
        let bin = test_bin(dec!(9));

        let assocs = vec![
            produced(&fg_a, dec!(1)),
            produced(&fg_b, dec!(2)),
            produced(&fg_c, dec!(3)),
        ];
        let mut reversed = assocs.clone();
        reversed.reverse();

        let forward = expand_bin(&bin, &assocs, &bom);
        let backward = expand_bin(&bin, &reversed, &bom);

        assert_eq!(forward.totals_by_key(), backward.totals_by_key());
    }

    proptest! {
        #[test]
        fn totals_invariant_under_input_order(quantities in proptest::collection::vec((0u8..3, 1u32..100), 1..8)) {
            let goods: Vec<FinishedGoodView> = (0..3)
                .map(|i| finished_good(&format!("P{}", i), i + 1, vec![("C", dec!(2))]))
                .collect();
            let bom = bom_with(goods.clone());
            let bin = test_bin(dec!(5));

            let assocs: Vec<bin_finished_good::Model> = quantities
                .iter()
                .map(|(idx, qty)| produced(&goods[*idx as usize], Decimal::from(*qty)))
                .collect();
            let mut reversed = assocs.clone();
            reversed.reverse();

            let forward = expand_bin(&bin, &assocs, &bom);
            let backward = expand_bin(&bin, &reversed, &bom);

            prop_assert_eq!(forward.totals_by_key(), backward.totals_by_key());
        }
    }

    #[test]
    fn resolve_drops_unresolvable_lines() {
        let fg = finished_good("F", 1, vec![("MISSING", dec!(1))]);
        let bom = bom_with(vec![fg.clone()]);
        let bin = test_bin(dec!(2));
        let batch = expand_bin(&bin, &[produced(&fg, dec!(10))], &bom);

        let products = vec![
            Product {
                guid: "F".into(),
                product_code: Some("PACK-F".into()),
                product_description: None,
                average_land_price: Some(dec!(1.5)),
                product_group: None,
            },
            Product {
                guid: "RAW".into(),
                product_code: Some("BULK-R".into()),
                product_description: None,
                average_land_price: Some(dec!(8)),
                product_group: None,
            },
        ];

        let (lines, dropped) = resolve_movement_lines(&batch, &products, "PO123&2");

        assert_eq!(dropped, vec!["MISSING".to_string()]);
        assert_eq!(lines.len(), 2);

        let finished = &lines[0];
        assert_eq!(finished.product.product_code, "PACK-F");
        assert_eq!(finished.new_quantity, "+10");
        assert_eq!(finished.new_actual_value, dec!(1.5));
        assert_eq!(finished.comments, "CUSTOM1");

        let raw = &lines[1];
        assert_eq!(raw.product.product_code, "BULK-R");
        assert_eq!(raw.new_quantity, "-2");
        assert_eq!(raw.new_actual_value, dec!(-8));
        assert_eq!(raw.comments, "PO123&2");
    }

    #[test]
    fn batch_breakdown_uses_amp_and_dollar_delimiters() {
        let mk = |name: &str, qty: Decimal| bin_batch::Model {
            id: Uuid::new_v4(),
            bin_id: Uuid::new_v4(),
            batch_id: "g".into(),
            batch_name: name.into(),
            batch_location: "W1".into(),
            quantity: qty,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let breakdown = batch_breakdown(&[mk("B1", dec!(5)), mk("B2", dec!(3))]);
        assert_eq!(breakdown, "B1&5$B2&3");
    }

    #[test]
    fn dispatch_aggregation_groups_by_product() {
        let lines = vec![
            dispatch_line_for("POT", "B1", dec!(5)),
            dispatch_line_for("ONI", "B9", dec!(2)),
            dispatch_line_for("POT", "B2", dec!(3)),
        ];

        let aggregates = aggregate_dispatch(&lines);

        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].product_code, "POT");
        assert_eq!(aggregates[0].quantity, dec!(-8));
        assert_eq!(aggregates[1].product_code, "ONI");
        assert_eq!(aggregates[1].quantity, dec!(-2));
    }

    #[test]
    fn dispatch_totals_equal_negative_ship_sums() {
        let lines = vec![
            dispatch_line_for("POT", "B1", dec!(5)),
            dispatch_line_for("POT", "B2", dec!(3)),
            dispatch_line_for("POT", "B3", dec!(1.5)),
            dispatch_line_for("LET", "B4", dec!(4)),
        ];

        let aggregates = aggregate_dispatch(&lines);
        let pot = aggregates
            .iter()
            .find(|a| a.product_code == "POT")
            .unwrap();
        assert_eq!(pot.quantity, dec!(-9.5));
        assert_eq!(pot.portions.len(), 3);
    }

    #[test]
    fn comment_encoding_matches_external_convention() {
        let portions = vec![
            BatchPortion {
                batch_number: "B1".into(),
                ship: dec!(5),
            },
            BatchPortion {
                batch_number: "B2".into(),
                ship: dec!(3),
            },
        ];

        assert_eq!(encode_batch_comment(&portions), "B1&B2&3$");
    }

    #[test]
    fn single_batch_comment_is_bare_batch_number() {
        let portions = vec![BatchPortion {
            batch_number: "B1".into(),
            ship: dec!(5),
        }];

        assert_eq!(encode_batch_comment(&portions), "B1");
    }

    #[test]
    fn shipment_wire_lines_sign_normalize() {
        let lines = vec![
            dispatch_line_for("POT", "B1", dec!(5)),
            dispatch_line_for("POT", "B2", dec!(3)),
        ];

        let wire = shipment_wire_lines(&aggregate_dispatch(&lines));

        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].new_quantity, "-8");
        assert_eq!(wire[0].new_actual_value, Decimal::ZERO);
        assert_eq!(wire[0].comments, "B1&B2&3$");
    }
}
