use std::path::PathBuf;

use clap::Parser;
use steelcut::config::{SettingsFile, number_lines, read_orders};
use steelcut::export::export_csv;
use steelcut::render;
use steelcut::solver::plan_cutting;
use steelcut::types::{BatchSource, OrderLine, Strategy};
use tracing::Level;

#[derive(Parser)]
#[command(name = "steelcut", about = "Steel bar cutting planner")]
struct Cli {
    /// Order line as product,spec,raw_len,order_len,qty (e.g. H형강A,100*100*6*8,6000,1000,50)
    #[arg(long = "line", num_args = 1..)]
    lines: Vec<String>,

    /// JSON file with an array of order lines
    #[arg(long)]
    orders: Option<PathBuf>,

    /// JSON cutter settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective cutter settings back to --settings
    #[arg(long, requires = "settings")]
    save_settings: bool,

    /// Saw kerf
    #[arg(long)]
    kerf: Option<f64>,

    /// Cutter opening height
    #[arg(long)]
    max_height: Option<f64>,

    /// Cutter opening width
    #[arg(long)]
    max_width: Option<f64>,

    /// Saw feed in length units per minute
    #[arg(long)]
    speed: Option<f64>,

    /// Saw speed for one order line as INDEX=SPEED, replacing --speed for that line
    #[arg(long = "line-speed", value_parser = parse_line_speed)]
    line_speeds: Vec<(usize, f64)>,

    /// Line order: sequence, or grouped (alias optical)
    #[arg(long, value_parser = parse_strategy)]
    strategy: Option<Strategy>,

    /// Write results to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Show the cutting layout of one bar per batch
    #[arg(long)]
    layout: bool,

    /// Log planning decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    match s {
        "sequence" => Ok(Strategy::Sequence),
        "grouped" | "optical" => Ok(Strategy::Grouped),
        _ => Err(format!(
            "invalid strategy '{}', expected: sequence or grouped",
            s
        )),
    }
}

fn parse_line_speed(s: &str) -> Result<(usize, f64), String> {
    let (index, speed) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid line speed '{}', expected INDEX=SPEED", s))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid line index in '{}'", s))?;
    let speed = parse_number(speed, "speed", s)?;
    Ok((index, speed))
}

fn parse_number(s: &str, what: &str, line: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid {} in '{}'", what, line))
}

fn parse_line(s: &str) -> Result<OrderLine, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 5 {
        return Err(format!(
            "invalid line '{}', expected product,spec,raw_len,order_len,qty",
            s
        ));
    }
    let raw_len = parse_number(parts[2], "raw length", s)?;
    let order_len = parse_number(parts[3], "order length", s)?;
    let qty = parts[4]
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok(OrderLine::new(
        0,
        parts[0].trim(),
        parts[1].trim(),
        raw_len,
        order_len,
        qty,
    ))
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::ERROR })
        .init();

    let mut settings = match &cli.settings {
        Some(path) if path.exists() || !cli.save_settings => {
            SettingsFile::load(path).unwrap_or_else(|e| fail(e))
        }
        _ => SettingsFile::default(),
    };
    if let Some(kerf) = cli.kerf {
        settings.cutter.kerf = kerf;
    }
    if let Some(h) = cli.max_height {
        settings.cutter.max_height = h;
    }
    if let Some(w) = cli.max_width {
        settings.cutter.max_width = w;
    }
    if let Some(speed) = cli.speed {
        settings.cutter.speed = speed;
    }
    if let Some(strategy) = cli.strategy {
        settings.strategy = strategy;
    }

    if cli.save_settings
        && let Some(path) = &cli.settings
    {
        settings.save(path).unwrap_or_else(|e| fail(e));
    }

    let mut lines: Vec<OrderLine> = match &cli.orders {
        Some(path) => read_orders(path).unwrap_or_else(|e| fail(e)),
        None => vec![],
    };
    for s in &cli.lines {
        lines.push(parse_line(s).unwrap_or_else(|e| fail(e)));
    }
    if lines.is_empty() {
        fail("no order lines given, use --line or --orders");
    }
    number_lines(&mut lines);

    let mut plan = plan_cutting(&lines, &settings.cutter, settings.strategy);
    for &(index, speed) in &cli.line_speeds {
        plan.override_speed(index, speed);
    }

    for w in &plan.warnings {
        eprintln!("Warning: {} ({})", w.message(), w);
    }
    if plan.is_aborted() {
        std::process::exit(1);
    }

    print!("{}", render::render_table(&plan));
    if cli.layout {
        for b in &plan.results {
            if b.source == BatchSource::NoCut {
                continue;
            }
            println!();
            println!(
                "Line {} {} bar {}:",
                b.source_index, b.source, b.source_len
            );
            print!("{}", render::render_batch(b, settings.cutter.kerf));
        }
    }
    println!();
    println!("{}", render::render_summary(&plan.summary()));

    if let Some(path) = &cli.csv {
        export_csv(&plan, path).unwrap_or_else(|e| fail(e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let line = parse_line("H형강A, 100*100*6*8, 6000, 1000, 50").unwrap();
        assert_eq!(line.product, "H형강A");
        assert_eq!(line.spec, "100*100*6*8");
        assert_eq!(line.raw_len, 6000.0);
        assert_eq!(line.order_len, 1000.0);
        assert_eq!(line.qty, 50);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(parse_line("H형강A,100*100*6*8,6000,1000").is_err());
        assert!(parse_line("H형강A,100*100*6*8,abc,1000,5").is_err());
        assert!(parse_line("H형강A,100*100*6*8,6000,1000,-5").is_err());
    }

    #[test]
    fn test_parse_line_speed() {
        assert_eq!(parse_line_speed("2=30"), Ok((2, 30.0)));
        assert_eq!(parse_line_speed(" 3 = 12.5"), Ok((3, 12.5)));
        assert!(parse_line_speed("2").is_err());
        assert!(parse_line_speed("x=30").is_err());
        assert!(parse_line_speed("2=fast").is_err());
    }

    #[test]
    fn test_line_speed_flag_repeats() {
        let cli = Cli::try_parse_from([
            "steelcut",
            "--line-speed",
            "1=20",
            "--line-speed",
            "2=30",
        ])
        .unwrap();
        assert_eq!(cli.line_speeds, vec![(1, 20.0), (2, 30.0)]);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!(parse_strategy("optical"), Ok(Strategy::Grouped));
        assert_eq!(parse_strategy("sequence"), Ok(Strategy::Sequence));
        assert!(parse_strategy("fastest").is_err());
    }
}
