use tracing::{debug, error, warn};

use crate::packing::{BeamStacking, StackModel};
use crate::presort::presort_grouped;
use crate::remnant::RemnantInventory;
use crate::types::{
    AllocationBatch, BatchSource, CutterSettings, OrderLine, Plan, Strategy, Warning, minutes,
};

/// Plans a cutting job with simulated beam stacking.
pub fn plan_cutting(lines: &[OrderLine], settings: &CutterSettings, strategy: Strategy) -> Plan {
    Solver::new(*settings, strategy).solve(lines)
}

/// Greedy cutting-stock allocator.
///
/// Lines are processed one after another against a single remnant inventory:
/// each line first draws on remnants left by earlier lines of the same product
/// and spec, then cuts fresh raw bars for whatever is still missing.
pub struct Solver<M = BeamStacking> {
    settings: CutterSettings,
    strategy: Strategy,
    model: M,
}

impl Solver<BeamStacking> {
    pub fn new(settings: CutterSettings, strategy: Strategy) -> Self {
        Self::with_model(settings, strategy, BeamStacking)
    }
}

/// Bars of one length cut for one line, before cycle accounting.
struct Cut {
    source: BatchSource,
    bar_len: f64,
    per_bar: u32,
    per_bar_loss: f64,
    bars: u32,
    pieces: u32,
    last_bar_pieces: u32,
}

impl<M: StackModel> Solver<M> {
    pub fn with_model(settings: CutterSettings, strategy: Strategy, model: M) -> Self {
        Self {
            settings,
            strategy,
            model,
        }
    }

    pub fn solve(&self, lines: &[OrderLine]) -> Plan {
        if let Some(fatal) = self.settings.validate() {
            warn!(warning = %fatal, "planning aborted");
            return Plan::aborted(fatal);
        }

        let work: Vec<&OrderLine> = match self.strategy {
            Strategy::Sequence => lines.iter().collect(),
            Strategy::Grouped => presort_grouped(lines, self.settings.kerf),
        };

        let mut inventory = RemnantInventory::new();
        let mut plan = Plan::default();
        for line in work {
            self.allocate(line, &mut inventory, &mut plan);
        }

        debug!(
            batches = plan.results.len(),
            warnings = plan.warnings.len(),
            remnants_left = inventory.total_bars(),
            "plan complete"
        );
        plan
    }

    fn allocate(&self, line: &OrderLine, inventory: &mut RemnantInventory, plan: &mut Plan) {
        if !(line.raw_len > 0.0) || !(line.order_len > 0.0) || line.qty == 0 {
            debug!(line = line.index, "skipping line with non-positive input");
            return;
        }

        let stackable = self
            .model
            .stackable(&line.product, &line.spec, &self.settings);
        if stackable < 1 {
            push_warning(
                plan,
                Warning::Unstackable {
                    product: line.product.clone(),
                    spec: line.spec.clone(),
                },
            );
            return;
        }

        if line.is_no_cut() {
            plan.results.push(self.no_cut_batch(line, stackable));
            return;
        }

        let need = line.need_len(self.settings.kerf);
        let remaining = self.draw_remnants(line, need, stackable, inventory, plan);
        if remaining > 0 {
            self.cut_raw(line, need, stackable, remaining, inventory, plan);
        }
    }

    fn no_cut_batch(&self, line: &OrderLine, stackable: u32) -> AllocationBatch {
        let loaded = stackable.min(line.qty);
        let height = self
            .model
            .height(&line.product, &line.spec, &self.settings, Some(loaded));
        debug!(line = line.index, bars = line.qty, "no-cut batch");
        AllocationBatch {
            source_index: line.index,
            product: line.product.clone(),
            spec: line.spec.clone(),
            source_len: line.raw_len,
            order_len: line.order_len,
            per_bar_pieces: 1,
            last_bar_pieces: 1,
            per_bar_loss: 0.0,
            total_bars: line.qty,
            total_pieces: line.qty,
            total_loss: 0.0,
            height,
            speed: 0.0,
            time_per_bar: 0.0,
            cuts: 0,
            total_time: 0.0,
            sawn_height: 0.0,
            stackable,
            source: BatchSource::NoCut,
        }
    }

    /// Serves the line from existing remnants and returns the quantity still missing.
    fn draw_remnants(
        &self,
        line: &OrderLine,
        need: f64,
        stackable: u32,
        inventory: &mut RemnantInventory,
        plan: &mut Plan,
    ) -> u32 {
        let mut remaining = line.qty;

        for (length, available) in inventory.snapshot(&line.product, &line.spec) {
            if remaining == 0 {
                break;
            }
            let full_yield = bar_yield(length, need);
            let per_bar = clamp_count(full_yield);
            if per_bar == 0 {
                continue;
            }

            let wanted = remaining.min(available.saturating_mul(per_bar));
            let bars_needed = wanted.div_ceil(per_bar);
            let taken = inventory.take(&line.product, &line.spec, length, bars_needed);
            debug_assert_eq!(
                taken, bars_needed,
                "remnant withdrawal fell short for {} {} at length {}",
                line.product, line.spec, length
            );
            if taken < bars_needed {
                error!(
                    line = line.index,
                    length, taken, bars_needed, "remnant withdrawal fell short"
                );
            }

            let pieces = wanted.min(taken.saturating_mul(per_bar));
            if pieces == 0 {
                continue;
            }
            let last_bar_pieces = pieces - (taken - 1) * per_bar;

            if (last_bar_pieces as f64) < full_yield {
                let trim = length - last_bar_pieces as f64 * need;
                if trim > 0.0 {
                    inventory.put(&line.product, &line.spec, trim, 1);
                }
            }

            let cut = Cut {
                source: BatchSource::Leftover,
                bar_len: length,
                per_bar,
                per_bar_loss: length - full_yield * need,
                bars: taken,
                pieces,
                last_bar_pieces,
            };
            plan.results.push(self.cut_batch(line, need, stackable, cut));
            remaining -= pieces;
        }

        remaining
    }

    fn cut_raw(
        &self,
        line: &OrderLine,
        need: f64,
        stackable: u32,
        remaining: u32,
        inventory: &mut RemnantInventory,
        plan: &mut Plan,
    ) {
        let full_yield = bar_yield(line.raw_len, need);
        let per_bar = clamp_count(full_yield);
        if per_bar == 0 {
            push_warning(
                plan,
                Warning::RawTooShort {
                    product: line.product.clone(),
                    spec: line.spec.clone(),
                    raw_len: line.raw_len,
                    order_len: line.order_len,
                },
            );
            return;
        }

        let bars = remaining.div_ceil(per_bar);
        let last_bar_pieces = remaining - (bars - 1) * per_bar;

        let per_bar_loss = line.raw_len - full_yield * need;
        if (last_bar_pieces as f64) < full_yield {
            let trim = line.raw_len - last_bar_pieces as f64 * need;
            if trim > 0.0 {
                inventory.put(&line.product, &line.spec, trim, 1);
            }
        } else {
            // Every bar was cut full and leaves the same trim end.
            let trim = per_bar_loss;
            if trim > 0.0 {
                inventory.put(&line.product, &line.spec, trim, bars);
            }
        }

        let cut = Cut {
            source: BatchSource::Raw,
            bar_len: line.raw_len,
            per_bar,
            per_bar_loss,
            bars,
            pieces: remaining,
            last_bar_pieces,
        };
        plan.results.push(self.cut_batch(line, need, stackable, cut));
    }

    /// Loss and saw-cycle accounting for bars of one length.
    ///
    /// Bars are loaded `stackable` at a time. Each load is sawn once per piece,
    /// plus one pass to square off the trim end on raw bars.
    fn cut_batch(&self, line: &OrderLine, need: f64, stackable: u32, cut: Cut) -> AllocationBatch {
        let per_bar_loss = cut.per_bar_loss;
        let total_loss = (cut.bars - 1) as f64 * per_bar_loss
            + (cut.bar_len - cut.last_bar_pieces as f64 * need);

        let full_cycles = cut.bars / stackable;
        let rem_bars = cut.bars % stackable;

        let height_full = if full_cycles > 0 {
            self.model
                .height(&line.product, &line.spec, &self.settings, Some(stackable))
        } else {
            0.0
        };
        let height_rem = if rem_bars > 0 {
            self.model
                .height(&line.product, &line.spec, &self.settings, Some(rem_bars))
        } else {
            0.0
        };

        let cuts_full = cuts_per_cycle(cut.per_bar, cut.source, cut.bar_len, line.order_len);
        let cuts_rem = if rem_bars > 0 {
            cuts_per_cycle(cut.last_bar_pieces, cut.source, cut.bar_len, line.order_len)
        } else {
            0
        };

        let cuts = full_cycles.saturating_mul(cuts_full).saturating_add(cuts_rem);
        let sawn_height = full_cycles as f64 * cuts_full as f64 * height_full
            + cuts_rem as f64 * height_rem;
        let height = if full_cycles > 0 { height_full } else { height_rem };
        let speed = self.settings.speed;

        debug!(
            line = line.index,
            source = %cut.source,
            bar_len = cut.bar_len,
            bars = cut.bars,
            pieces = cut.pieces,
            cuts,
            "batch"
        );

        AllocationBatch {
            source_index: line.index,
            product: line.product.clone(),
            spec: line.spec.clone(),
            source_len: cut.bar_len,
            order_len: line.order_len,
            per_bar_pieces: cut.per_bar,
            last_bar_pieces: cut.last_bar_pieces,
            per_bar_loss,
            total_bars: cut.bars,
            total_pieces: cut.pieces,
            total_loss,
            height,
            speed,
            time_per_bar: minutes(height, speed),
            cuts,
            total_time: minutes(sawn_height, speed),
            sawn_height,
            stackable,
            source: cut.source,
        }
    }
}

/// Whole pieces of `need` that fit in a bar of `len`.
fn bar_yield(len: f64, need: f64) -> f64 {
    (len / need).floor()
}

/// Piece counts beyond `u32::MAX` saturate; a line never asks for that many.
fn clamp_count(pieces: f64) -> u32 {
    if pieces >= u32::MAX as f64 {
        u32::MAX
    } else {
        pieces as u32
    }
}

/// Saw passes for one stacked load whose bars each yield `pieces`.
fn cuts_per_cycle(pieces: u32, source: BatchSource, bar_len: f64, order_len: f64) -> u32 {
    if pieces == 0 || bar_len == order_len {
        return 0;
    }
    match source {
        BatchSource::Raw => pieces.saturating_add(1),
        _ => pieces,
    }
}

fn push_warning(plan: &mut Plan, warning: Warning) {
    warn!(warning = %warning, "line skipped");
    plan.warnings.push(warning);
}
