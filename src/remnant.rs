use serde::Serialize;

/// Remnant bars of one exact length.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemnantEntry {
    pub product: String,
    pub spec: String,
    pub length: f64,
    pub count: u32,
}

impl RemnantEntry {
    fn matches(&self, product: &str, spec: &str) -> bool {
        self.product == product && self.spec == spec
    }
}

/// Remnants left over during one planning run.
///
/// Entries keep the order of their first deposit. That order decides which
/// remnant length a later line draws from first, so it must not depend on
/// hashing.
#[derive(Debug, Clone, Default)]
pub struct RemnantInventory {
    entries: Vec<RemnantEntry>,
}

impl RemnantInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, product: &str, spec: &str, length: f64) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.matches(product, spec) && e.length == length)
    }

    pub fn put(&mut self, product: &str, spec: &str, length: f64, count: u32) {
        if count == 0 {
            return;
        }
        match self.position(product, spec, length) {
            Some(i) => self.entries[i].count += count,
            None => self.entries.push(RemnantEntry {
                product: product.to_string(),
                spec: spec.to_string(),
                length,
                count,
            }),
        }
    }

    /// Withdraws up to `wanted` bars and returns how many were actually taken.
    pub fn take(&mut self, product: &str, spec: &str, length: f64, wanted: u32) -> u32 {
        let Some(i) = self.position(product, spec, length) else {
            return 0;
        };
        let taken = self.entries[i].count.min(wanted);
        self.entries[i].count -= taken;
        taken
    }

    pub fn available(&self, product: &str, spec: &str, length: f64) -> u32 {
        self.position(product, spec, length)
            .map_or(0, |i| self.entries[i].count)
    }

    /// `(length, count)` of every non-empty entry for a product and spec, in deposit order.
    pub fn snapshot(&self, product: &str, spec: &str) -> Vec<(f64, u32)> {
        self.entries
            .iter()
            .filter(|e| e.matches(product, spec) && e.count > 0)
            .map(|e| (e.length, e.count))
            .collect()
    }

    pub fn entries(&self) -> &[RemnantEntry] {
        &self.entries
    }

    pub fn total_bars(&self) -> u64 {
        self.entries.iter().map(|e| e.count as u64).sum()
    }
}
