//! Columnar recording of simulation events via `tracing`.
//!
//! The simulation emits events against a fixed set of targets (`order`,
//! `fill`, `production`, `turn`); a custom subscriber captures their
//! fields into typed row tables that convert to polars DataFrames for
//! analysis.
//!
//! # Usage
//!
//! ```ignore
//! // In simulation code:
//! tracing::info!(target: "fill", turn, commodity_id, quantity, price, ..);
//!
//! // In a test or analysis harness:
//! instrument::install_subscriber();
//! // ... run simulation ...
//! let recorder = instrument::drain();
//! assert!(!recorder.fills.is_empty());
//! let df = recorder.fills_df().unwrap();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

// === ROW TYPES ===

#[derive(Debug, Clone, Default)]
pub struct OrderRow {
    pub turn: u64,
    pub planet_id: u64,
    pub order_id: u64,
    pub trader: u64,
    pub trader_kind: String,
    pub commodity_id: u64,
    pub side: String,
    pub quantity: u64,
    pub price: i64,
}

#[derive(Debug, Clone, Default)]
pub struct FillRow {
    pub turn: u64,
    pub planet_id: u64,
    pub commodity_id: u64,
    pub quantity: u64,
    pub price: i64,
    pub buyer: u64,
    pub seller: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductionRow {
    pub turn: u64,
    pub actor_id: u64,
    pub process_id: u64,
    pub outcome: String,
    pub multiplier: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TurnRow {
    pub turn: u64,
    pub trades: u64,
    pub trade_volume: u64,
    pub productions: u64,
    pub government_work: u64,
    pub failed_productions: u64,
    pub blocked_actions: u64,
    pub action_errors: u64,
}

/// All rows recorded since the last drain.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub orders: Vec<OrderRow>,
    pub fills: Vec<FillRow>,
    pub productions: Vec<ProductionRow>,
    pub turns: Vec<TurnRow>,
}

thread_local! {
    static RECORDER: RefCell<Recorder> = RefCell::default();
}

// === FIELD EXTRACTION ===

/// Scratch pad for one event's fields before they are shaped into a row.
#[derive(Default)]
struct EventFields {
    uints: HashMap<&'static str, u64>,
    ints: HashMap<&'static str, i64>,
    bools: HashMap<&'static str, bool>,
    strs: HashMap<&'static str, String>,
}

impl EventFields {
    fn u(&self, name: &str) -> u64 {
        self.uints.get(name).copied().unwrap_or_default()
    }

    fn i(&self, name: &str) -> i64 {
        // Small positive values may arrive through the unsigned path.
        self.ints
            .get(name)
            .copied()
            .or_else(|| self.uints.get(name).map(|&v| v as i64))
            .unwrap_or_default()
    }

    fn b(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or_default()
    }

    fn s(&self, name: &str) -> String {
        self.strs.get(name).cloned().unwrap_or_default()
    }
}

impl Visit for EventFields {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.uints.insert(field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.ints.insert(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.bools.insert(field.name(), value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.strs.insert(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.strs.insert(field.name(), format!("{value:?}"));
    }
}

// === SUBSCRIBER ===

/// Subscriber routing known targets into the thread-local recorder.
/// Unknown targets are ignored.
pub struct RecordingSubscriber;

impl Subscriber for RecordingSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event()
            && matches!(metadata.target(), "order" | "fill" | "production" | "turn")
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        // Spans are not tracked.
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        RECORDER.with(|r| {
            let mut recorder = r.borrow_mut();
            match event.metadata().target() {
                "order" => recorder.orders.push(OrderRow {
                    turn: fields.u("turn"),
                    planet_id: fields.u("planet_id"),
                    order_id: fields.u("order_id"),
                    trader: fields.u("trader"),
                    trader_kind: fields.s("trader_kind"),
                    commodity_id: fields.u("commodity_id"),
                    side: fields.s("side"),
                    quantity: fields.u("quantity"),
                    price: fields.i("price"),
                }),
                "fill" => recorder.fills.push(FillRow {
                    turn: fields.u("turn"),
                    planet_id: fields.u("planet_id"),
                    commodity_id: fields.u("commodity_id"),
                    quantity: fields.u("quantity"),
                    price: fields.i("price"),
                    buyer: fields.u("buyer"),
                    seller: fields.u("seller"),
                }),
                "production" => recorder.productions.push(ProductionRow {
                    turn: fields.u("turn"),
                    actor_id: fields.u("actor_id"),
                    process_id: fields.u("process_id"),
                    outcome: fields.s("outcome"),
                    multiplier: fields.b("multiplier"),
                }),
                "turn" => recorder.turns.push(TurnRow {
                    turn: fields.u("turn"),
                    trades: fields.u("trades"),
                    trade_volume: fields.u("trade_volume"),
                    productions: fields.u("productions"),
                    government_work: fields.u("government_work"),
                    failed_productions: fields.u("failed_productions"),
                    blocked_actions: fields.u("blocked_actions"),
                    action_errors: fields.u("action_errors"),
                }),
                _ => {}
            }
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install the recording subscriber as the global default. Call once at
/// the start of a run or test.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(RecordingSubscriber);
}

/// Drain all recorded rows from the thread-local recorder.
pub fn drain() -> Recorder {
    RECORDER.with(|r| std::mem::take(&mut *r.borrow_mut()))
}

/// Clear recorded rows without returning them.
pub fn clear() {
    RECORDER.with(|r| *r.borrow_mut() = Recorder::default());
}

// === POLARS INTEGRATION ===

use polars::prelude::*;

impl Recorder {
    pub fn orders_df(&self) -> PolarsResult<DataFrame> {
        let rows = &self.orders;
        DataFrame::new(vec![
            Column::new("turn".into(), rows.iter().map(|r| r.turn).collect::<Vec<_>>()),
            Column::new(
                "planet_id".into(),
                rows.iter().map(|r| r.planet_id).collect::<Vec<_>>(),
            ),
            Column::new(
                "order_id".into(),
                rows.iter().map(|r| r.order_id).collect::<Vec<_>>(),
            ),
            Column::new(
                "trader".into(),
                rows.iter().map(|r| r.trader).collect::<Vec<_>>(),
            ),
            Column::new(
                "trader_kind".into(),
                rows.iter().map(|r| r.trader_kind.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "commodity_id".into(),
                rows.iter().map(|r| r.commodity_id).collect::<Vec<_>>(),
            ),
            Column::new(
                "side".into(),
                rows.iter().map(|r| r.side.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "quantity".into(),
                rows.iter().map(|r| r.quantity).collect::<Vec<_>>(),
            ),
            Column::new(
                "price".into(),
                rows.iter().map(|r| r.price).collect::<Vec<_>>(),
            ),
        ])
    }

    pub fn fills_df(&self) -> PolarsResult<DataFrame> {
        let rows = &self.fills;
        DataFrame::new(vec![
            Column::new("turn".into(), rows.iter().map(|r| r.turn).collect::<Vec<_>>()),
            Column::new(
                "planet_id".into(),
                rows.iter().map(|r| r.planet_id).collect::<Vec<_>>(),
            ),
            Column::new(
                "commodity_id".into(),
                rows.iter().map(|r| r.commodity_id).collect::<Vec<_>>(),
            ),
            Column::new(
                "quantity".into(),
                rows.iter().map(|r| r.quantity).collect::<Vec<_>>(),
            ),
            Column::new(
                "price".into(),
                rows.iter().map(|r| r.price).collect::<Vec<_>>(),
            ),
            Column::new(
                "buyer".into(),
                rows.iter().map(|r| r.buyer).collect::<Vec<_>>(),
            ),
            Column::new(
                "seller".into(),
                rows.iter().map(|r| r.seller).collect::<Vec<_>>(),
            ),
        ])
    }

    pub fn productions_df(&self) -> PolarsResult<DataFrame> {
        let rows = &self.productions;
        DataFrame::new(vec![
            Column::new("turn".into(), rows.iter().map(|r| r.turn).collect::<Vec<_>>()),
            Column::new(
                "actor_id".into(),
                rows.iter().map(|r| r.actor_id).collect::<Vec<_>>(),
            ),
            Column::new(
                "process_id".into(),
                rows.iter().map(|r| r.process_id).collect::<Vec<_>>(),
            ),
            Column::new(
                "outcome".into(),
                rows.iter().map(|r| r.outcome.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "multiplier".into(),
                rows.iter().map(|r| r.multiplier).collect::<Vec<_>>(),
            ),
        ])
    }

    pub fn turns_df(&self) -> PolarsResult<DataFrame> {
        let rows = &self.turns;
        DataFrame::new(vec![
            Column::new("turn".into(), rows.iter().map(|r| r.turn).collect::<Vec<_>>()),
            Column::new(
                "trades".into(),
                rows.iter().map(|r| r.trades).collect::<Vec<_>>(),
            ),
            Column::new(
                "trade_volume".into(),
                rows.iter().map(|r| r.trade_volume).collect::<Vec<_>>(),
            ),
            Column::new(
                "productions".into(),
                rows.iter().map(|r| r.productions).collect::<Vec<_>>(),
            ),
            Column::new(
                "government_work".into(),
                rows.iter().map(|r| r.government_work).collect::<Vec<_>>(),
            ),
            Column::new(
                "failed_productions".into(),
                rows.iter().map(|r| r.failed_productions).collect::<Vec<_>>(),
            ),
            Column::new(
                "blocked_actions".into(),
                rows.iter().map(|r| r.blocked_actions).collect::<Vec<_>>(),
            ),
            Column::new(
                "action_errors".into(),
                rows.iter().map(|r| r.action_errors).collect::<Vec<_>>(),
            ),
        ])
    }

    /// All tables keyed by name, skipping empty ones.
    pub fn to_dataframes(&self) -> HashMap<String, DataFrame> {
        let mut dfs = HashMap::new();
        for (name, df) in [
            ("orders", self.orders_df()),
            ("fills", self.fills_df()),
            ("productions", self.productions_df()),
            ("turns", self.turns_df()),
        ] {
            if let Ok(df) = df {
                if df.height() > 0 {
                    dfs.insert(name.to_string(), df);
                }
            }
        }
        dfs
    }
}

/// Save all non-empty tables as parquet files under `dir`.
pub fn save_parquet(dfs: &mut HashMap<String, DataFrame>, dir: &std::path::Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| PolarsError::IO {
        error: e.into(),
        msg: None,
    })?;
    for (name, df) in dfs.iter_mut() {
        let path = dir.join(format!("{name}.parquet"));
        let file = std::fs::File::create(&path).map_err(|e| PolarsError::IO {
            error: e.into(),
            msg: None,
        })?;
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_events_into_typed_rows() {
        use tracing::subscriber::with_default;

        clear();
        with_default(RecordingSubscriber, || {
            tracing::info!(
                target: "fill",
                turn = 3u64,
                planet_id = 1u64,
                commodity_id = 2u64,
                quantity = 5u64,
                price = 8i64,
                buyer = 10u64,
                seller = 11u64,
            );
            tracing::info!(
                target: "production",
                turn = 3u64,
                actor_id = 10u64,
                process_id = 0u64,
                outcome = "completed",
                multiplier = true,
            );
            // Unknown targets are dropped.
            tracing::info!(target: "unrelated", turn = 3u64);
        });

        let recorder = drain();
        assert_eq!(recorder.fills.len(), 1);
        assert_eq!(recorder.fills[0].price, 8);
        assert_eq!(recorder.fills[0].quantity, 5);
        assert_eq!(recorder.productions.len(), 1);
        assert_eq!(recorder.productions[0].outcome, "completed");
        assert!(recorder.productions[0].multiplier);
        assert!(recorder.orders.is_empty());
    }

    #[test]
    fn test_dataframe_conversion() {
        let mut recorder = Recorder::default();
        recorder.fills.push(FillRow {
            turn: 1,
            planet_id: 1,
            commodity_id: 0,
            quantity: 4,
            price: 7,
            buyer: 2,
            seller: 3,
        });
        recorder.fills.push(FillRow {
            turn: 2,
            planet_id: 1,
            commodity_id: 0,
            quantity: 6,
            price: 9,
            buyer: 3,
            seller: 2,
        });

        let df = recorder.fills_df().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 7);

        let dfs = recorder.to_dataframes();
        assert!(dfs.contains_key("fills"));
        assert!(!dfs.contains_key("orders"), "empty tables are skipped");
    }
}
