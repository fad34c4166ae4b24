use crate::types::{AllocationBatch, Plan, Summary};

const MAX_WIDTH: f64 = 80.0;
const BAR_HEIGHT: usize = 2;

/// Draws one bar with its pieces laid out from the left and the trim end shaded.
pub fn render_bar(bar_len: f64, piece_len: f64, kerf: f64, pieces: u32) -> String {
    if !(bar_len > 0.0) || !(piece_len > 0.0) {
        return String::new();
    }
    let scale = MAX_WIDTH / bar_len;
    let grid_w = (bar_len * scale).round() as usize;

    let mut grid = vec![vec![' '; grid_w + 1]; BAR_HEIGHT + 1];
    draw_rect(&mut grid, 0, 0, grid_w, BAR_HEIGHT);

    let label: Vec<char> = format!("{}", piece_len).chars().collect();
    let mut x = 0.0;
    for _ in 0..pieces {
        let sx = (x * scale).round() as usize;
        let sw = (piece_len * scale).round() as usize;
        x += piece_len + kerf;
        if sw == 0 {
            continue;
        }

        draw_rect(&mut grid, sx, 0, sw, BAR_HEIGHT);

        if sw > label.len() {
            let start_x = sx + (sw - label.len()) / 2 + 1;
            for (i, &ch) in label.iter().enumerate() {
                let cx = start_x + i;
                if cx < sx + sw && cx < grid_w {
                    grid[1][cx] = ch;
                }
            }
        }
    }

    let trim_start = (x * scale).round() as usize;
    for cell in grid[1].iter_mut().take(grid_w).skip(trim_start + 1) {
        if *cell == ' ' {
            *cell = '~';
        }
    }

    let mut result = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

/// First bar of a batch, drawn as it is cut.
pub fn render_batch(batch: &AllocationBatch, kerf: f64) -> String {
    render_bar(batch.source_len, batch.order_len, kerf, batch.per_bar_pieces)
}

#[allow(clippy::needless_range_loop)]
fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    let rows = grid.len();
    let cols = if rows > 0 { grid[0].len() } else { return };

    for i in x..=x + w {
        if i < cols {
            for j in [y, y + h] {
                if j < rows {
                    grid[j][i] = if grid[j][i] == '|' || grid[j][i] == '+' {
                        '+'
                    } else {
                        '-'
                    };
                }
            }
        }
    }

    for j in y..=y + h {
        if j < rows {
            for i in [x, x + w] {
                if i < cols {
                    grid[j][i] = if grid[j][i] == '-' || grid[j][i] == '+' {
                        '+'
                    } else {
                        '|'
                    };
                }
            }
        }
    }

    for &cx in &[x, x + w] {
        for &cy in &[y, y + h] {
            if cy < rows && cx < cols {
                grid[cy][cx] = '+';
            }
        }
    }
}

pub fn render_table(plan: &Plan) -> String {
    let mut out = format!(
        "{:>4}  {:<10} {:<14} {:>8} {:>8} {:<8} {:>6} {:>8} {:>5} {:>6} {:>10} {:>8} {:>6} {:>7} {:>5} {:>9}\n",
        "No", "Product", "Spec", "Bar", "Order", "Source", "Pcs/b", "Loss/b", "Bars", "Pieces",
        "Loss", "Height", "Speed", "Min/cut", "Cuts", "Time"
    );
    for b in &plan.results {
        out.push_str(&format!(
            "{:>4}  {:<10} {:<14} {:>8} {:>8} {:<8} {:>6} {:>8.1} {:>5} {:>6} {:>10.1} {:>8.1} {:>6} {:>7.2} {:>5} {:>9.2}\n",
            b.source_index,
            b.product,
            b.spec,
            b.source_len,
            b.order_len,
            b.source.to_string(),
            b.per_bar_pieces,
            b.loss_per_bar(),
            b.total_bars,
            b.total_pieces,
            b.total_loss,
            b.height,
            b.speed,
            b.time_per_bar,
            b.cuts,
            b.total_time,
        ));
    }
    out
}

pub fn render_summary(summary: &Summary) -> String {
    format!(
        "Summary: {} bar{} loaded, {} piece{}, {:.1} total loss, {:.2} min",
        summary.input_bars,
        if summary.input_bars == 1 { "" } else { "s" },
        summary.pieces,
        if summary.pieces == 1 { "" } else { "s" },
        summary.loss,
        summary.time,
    )
}
