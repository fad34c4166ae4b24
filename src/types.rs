use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Product name prefix that marks an H-beam section.
pub const BEAM_MARKER: &str = "H형강";

/// Saw feed rate in length units per minute when none is configured.
pub const DEFAULT_SPEED: f64 = 15.0;

/// Accepts integer fields sent as JSON floats (`3.0`), rejecting fractions and negatives.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {}",
            value
        )));
    }
    Ok(value as u32)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default)]
    pub index: usize,
    pub product: String,
    pub spec: String,
    pub raw_len: f64,
    pub order_len: f64,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub qty: u32,
}

impl OrderLine {
    pub fn new(
        index: usize,
        product: impl Into<String>,
        spec: impl Into<String>,
        raw_len: f64,
        order_len: f64,
        qty: u32,
    ) -> Self {
        Self {
            index,
            product: product.into(),
            spec: spec.into(),
            raw_len,
            order_len,
            qty,
        }
    }

    /// Raw stock already has the ordered length; bars are stacked but never sawn.
    pub fn is_no_cut(&self) -> bool {
        self.raw_len == self.order_len
    }

    /// Material consumed by one piece, including one saw kerf.
    pub fn need_len(&self, kerf: f64) -> f64 {
        self.order_len + kerf
    }
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

/// Physical envelope of the cutting machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutterSettings {
    #[serde(default)]
    pub kerf: f64,
    #[serde(default)]
    pub max_height: f64,
    #[serde(default)]
    pub max_width: f64,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl CutterSettings {
    pub fn new(kerf: f64, max_height: f64, max_width: f64) -> Self {
        Self {
            kerf,
            max_height,
            max_width,
            speed: DEFAULT_SPEED,
        }
    }

    /// Returns the warning that aborts a planning run, if any.
    pub fn validate(&self) -> Option<Warning> {
        if !(self.max_height > 0.0) || !(self.max_width > 0.0) {
            return Some(Warning::MissingCutterSize);
        }
        if self.kerf < 0.0 {
            return Some(Warning::NegativeKerf);
        }
        None
    }
}

impl Default for CutterSettings {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Beam cross-section dimensions parsed from a `H*B*t1*t2` spec string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CrossSection {
    /// Section depth; the footprint each bar takes across the opening width.
    pub h: f64,
    /// Flange width; the height of one stacked row.
    pub b: f64,
    /// Web thickness.
    pub t1: f64,
    /// Flange thickness.
    pub t2: f64,
}

impl CrossSection {
    pub fn new(h: f64, b: f64, t1: f64, t2: f64) -> Self {
        Self { h, b, t1, t2 }
    }

    /// Missing or non-numeric components become 0.
    pub fn parse(spec: &str) -> Self {
        let mut dims = spec.split('*').map(|part| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        });
        let mut next = || dims.next().unwrap_or(0.0);
        let (h, b, t1, t2) = (next(), next(), next(), next());
        Self { h, b, t1, t2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// H-beams interlock when stacked; capacity comes from the packing simulation.
    Beam,
    /// Loaded one bar at a time at full cutter height.
    Other,
}

impl ProductKind {
    pub fn of(product: &str) -> Self {
        if product.starts_with(BEAM_MARKER) {
            ProductKind::Beam
        } else {
            ProductKind::Other
        }
    }
}

/// Order in which lines are fed to the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Input order.
    #[default]
    Sequence,
    /// Same product and spec grouped together, see [`crate::presort`].
    #[serde(alias = "optical")]
    Grouped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchSource {
    #[serde(rename = "no-cut")]
    NoCut,
    #[serde(rename = "leftover")]
    Leftover,
    #[serde(rename = "raw")]
    Raw,
}

impl std::fmt::Display for BatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BatchSource::NoCut => "no-cut",
            BatchSource::Leftover => "leftover",
            BatchSource::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Bars of one source length cut for one order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBatch {
    /// Index of the order line these pieces belong to.
    pub source_index: usize,
    pub product: String,
    pub spec: String,
    /// Length of the bars actually loaded: the raw length, or the remnant length.
    pub source_len: f64,
    pub order_len: f64,
    pub per_bar_pieces: u32,
    pub last_bar_pieces: u32,
    pub per_bar_loss: f64,
    pub total_bars: u32,
    pub total_pieces: u32,
    pub total_loss: f64,
    /// Stack height of the dominant cycle.
    pub height: f64,
    pub speed: f64,
    /// Minutes per saw pass through the dominant cycle.
    pub time_per_bar: f64,
    pub cuts: u32,
    pub total_time: f64,
    /// Sum of stack heights over every saw pass; `total_time` is this over `speed`.
    pub sawn_height: f64,
    pub stackable: u32,
    pub source: BatchSource,
}

impl AllocationBatch {
    /// Recomputes timings for another saw speed. Cut counts do not depend on speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        if self.source == BatchSource::NoCut {
            return self;
        }
        self.speed = speed;
        self.time_per_bar = minutes(self.height, speed);
        self.total_time = minutes(self.sawn_height, speed);
        self
    }

    /// Average material lost per loaded bar.
    pub fn loss_per_bar(&self) -> f64 {
        if self.total_bars == 0 {
            0.0
        } else {
            self.total_loss / self.total_bars as f64
        }
    }
}

/// Saw travel over `speed`; zero when either side is not positive.
pub fn minutes(height: f64, speed: f64) -> f64 {
    if height > 0.0 && speed > 0.0 {
        height / speed
    } else {
        0.0
    }
}

/// Non-fatal planning diagnostics. `MissingCutterSize` and `NegativeKerf` abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    MissingCutterSize,
    NegativeKerf,
    Unstackable {
        product: String,
        spec: String,
    },
    RawTooShort {
        product: String,
        spec: String,
        raw_len: f64,
        order_len: f64,
    },
}

impl Warning {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Warning::MissingCutterSize | Warning::NegativeKerf)
    }

    /// Operator-facing explanation.
    pub fn message(&self) -> String {
        match self {
            Warning::MissingCutterSize => {
                "cutter max height and max width must be set before planning".to_string()
            }
            Warning::NegativeKerf => "saw kerf must be 0 or greater".to_string(),
            Warning::Unstackable { product, spec } => {
                format!("{} {} cannot be loaded into the cutter opening", product, spec)
            }
            Warning::RawTooShort {
                product,
                spec,
                raw_len,
                order_len,
            } => format!(
                "{} {}: raw length {} is shorter than order length {} plus kerf",
                product, spec, raw_len, order_len
            ),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingCutterSize => write!(f, "MISSING_CUTTER_SIZE"),
            Warning::NegativeKerf => write!(f, "NEGATIVE_KERF"),
            Warning::Unstackable { product, spec } => {
                write!(f, "UNSTACKABLE:{} {}", product, spec)
            }
            Warning::RawTooShort {
                product,
                spec,
                raw_len,
                order_len,
            } => write!(
                f,
                "RAW_TOO_SHORT:{} {} {} < {}+kerf",
                product, spec, raw_len, order_len
            ),
        }
    }
}

impl Serialize for Warning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    pub results: Vec<AllocationBatch>,
    pub warnings: Vec<Warning>,
}

impl Plan {
    pub fn aborted(warning: Warning) -> Self {
        Self {
            results: vec![],
            warnings: vec![warning],
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.warnings.iter().any(Warning::is_fatal)
    }

    /// Batches attributed to one order line.
    pub fn batches_for(&self, index: usize) -> impl Iterator<Item = &AllocationBatch> {
        self.results.iter().filter(move |b| b.source_index == index)
    }

    /// Re-times every batch of one order line at another saw speed.
    pub fn override_speed(&mut self, index: usize, speed: f64) {
        for b in self.results.iter_mut().filter(|b| b.source_index == index) {
            *b = b.clone().with_speed(speed);
        }
    }

    pub fn summary(&self) -> Summary {
        self.results.iter().fold(Summary::default(), |mut acc, b| {
            acc.input_bars += b.total_bars as u64;
            acc.pieces += b.total_pieces as u64;
            acc.loss += b.total_loss;
            acc.time += b.total_time;
            acc
        })
    }
}

/// Job totals over every batch of a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub input_bars: u64,
    pub pieces: u64,
    pub loss: f64,
    pub time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cross_section() {
        let s = CrossSection::parse("100*100*6*8");
        assert_eq!(s, CrossSection::new(100.0, 100.0, 6.0, 8.0));
    }

    #[test]
    fn test_parse_cross_section_malformed() {
        assert_eq!(
            CrossSection::parse("200*x"),
            CrossSection::new(200.0, 0.0, 0.0, 0.0)
        );
        assert_eq!(CrossSection::parse(""), CrossSection::default());
        assert_eq!(
            CrossSection::parse("inf*100*6*8"),
            CrossSection::new(0.0, 100.0, 6.0, 8.0)
        );
    }

    #[test]
    fn test_product_kind() {
        assert_eq!(ProductKind::of("H형강A"), ProductKind::Beam);
        assert_eq!(ProductKind::of("I형강"), ProductKind::Other);
        assert_eq!(ProductKind::of("각관 H형강"), ProductKind::Other);
    }

    #[test]
    fn test_settings_validation() {
        assert_eq!(
            CutterSettings::new(0.0, 0.0, 1200.0).validate(),
            Some(Warning::MissingCutterSize)
        );
        assert_eq!(
            CutterSettings::new(0.0, f64::NAN, 1200.0).validate(),
            Some(Warning::MissingCutterSize)
        );
        assert_eq!(
            CutterSettings::new(-1.0, 2000.0, 1200.0).validate(),
            Some(Warning::NegativeKerf)
        );
        // Missing envelope wins over a bad kerf
        assert_eq!(
            CutterSettings::new(-1.0, 0.0, 0.0).validate(),
            Some(Warning::MissingCutterSize)
        );
        assert_eq!(CutterSettings::new(5.0, 2000.0, 1200.0).validate(), None);
    }

    #[test]
    fn test_warning_codes() {
        let w = Warning::RawTooShort {
            product: "H형강A".into(),
            spec: "100*100*6*8".into(),
            raw_len: 500.0,
            order_len: 600.0,
        };
        assert_eq!(w.to_string(), "RAW_TOO_SHORT:H형강A 100*100*6*8 500 < 600+kerf");
        assert_eq!(
            serde_json::to_string(&Warning::NegativeKerf).unwrap(),
            "\"NEGATIVE_KERF\""
        );
        assert!(Warning::MissingCutterSize.is_fatal());
        assert!(!w.is_fatal());
    }

    #[test]
    fn test_order_line_from_json() {
        let line: OrderLine = serde_json::from_str(
            r#"{"product":"H형강A","spec":"100*100*6*8","rawLen":6000,"orderLen":1000,"qty":50.0}"#,
        )
        .unwrap();
        assert_eq!(line.qty, 50);
        assert_eq!(line.index, 0);

        let bad = serde_json::from_str::<OrderLine>(
            r#"{"product":"P","spec":"S","rawLen":6000,"orderLen":1000,"qty":2.5}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_strategy_accepts_optical_alias() {
        let s: Strategy = serde_json::from_str("\"optical\"").unwrap();
        assert_eq!(s, Strategy::Grouped);
        let s: Strategy = serde_json::from_str("\"sequence\"").unwrap();
        assert_eq!(s, Strategy::Sequence);
    }

    #[test]
    fn test_settings_default_speed() {
        let s: CutterSettings =
            serde_json::from_str(r#"{"kerf":5,"maxHeight":2000,"maxWidth":1200}"#).unwrap();
        assert_eq!(s.speed, DEFAULT_SPEED);
    }
}
