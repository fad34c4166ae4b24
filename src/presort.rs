use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::OrderLine;

struct Ranked<'a> {
    line: &'a OrderLine,
    position: usize,
    need_len: f64,
    no_cut: bool,
    exact: bool,
}

impl<'a> Ranked<'a> {
    fn new(line: &'a OrderLine, position: usize, kerf: f64) -> Self {
        let need_len = line.need_len(kerf);
        Self {
            line,
            position,
            need_len,
            no_cut: line.raw_len > 0.0 && line.order_len > 0.0 && line.is_no_cut(),
            exact: line.raw_len > 0.0 && need_len > 0.0 && line.raw_len % need_len == 0.0,
        }
    }

    fn rank(&self, other: &Self) -> Ordering {
        other
            .no_cut
            .cmp(&self.no_cut)
            .then(other.exact.cmp(&self.exact))
            .then(other.need_len.total_cmp(&self.need_len))
            .then(other.line.qty.cmp(&self.line.qty))
            .then(self.position.cmp(&other.position))
    }
}

/// Groups lines by product and spec so the cutter is reconfigured as little as
/// possible. Groups keep the order in which they first appear. Inside a group:
/// no-cut lines, then lines that divide the raw bar exactly, then longer pieces,
/// then larger quantities, then input order.
pub fn presort_grouped(lines: &[OrderLine], kerf: f64) -> Vec<&OrderLine> {
    let mut group_of: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<Vec<Ranked>> = Vec::new();

    for (position, line) in lines.iter().enumerate() {
        let key = (line.product.as_str(), line.spec.as_str());
        let gi = *group_of.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[gi].push(Ranked::new(line, position, kerf));
    }

    groups
        .into_iter()
        .flat_map(|mut group| {
            group.sort_by(|a, b| a.rank(b));
            group.into_iter().map(|r| r.line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(index: usize, product: &str, spec: &str, raw: f64, order: f64, qty: u32) -> OrderLine {
        OrderLine::new(index, product, spec, raw, order, qty)
    }

    fn indices(sorted: &[&OrderLine]) -> Vec<usize> {
        sorted.iter().map(|l| l.index).collect()
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let lines = vec![
            line(1, "B", "s", 6000.0, 1000.0, 1),
            line(2, "A", "s", 6000.0, 1000.0, 1),
            line(3, "B", "s", 6000.0, 1000.0, 1),
            line(4, "A", "t", 6000.0, 1000.0, 1),
        ];
        assert_eq!(indices(&presort_grouped(&lines, 0.0)), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_rank_within_group() {
        let lines = vec![
            line(1, "A", "s", 6000.0, 700.0, 5),   // plain
            line(2, "A", "s", 6000.0, 1200.0, 1),  // exact 6000 / 1200
            line(3, "A", "s", 6000.0, 6000.0, 1),  // no-cut
            line(4, "A", "s", 6000.0, 900.0, 2),   // longer than 1
            line(5, "A", "s", 6000.0, 700.0, 9),   // same length as 1, more qty
            line(6, "A", "s", 6000.0, 700.0, 5),   // ties with 1
        ];
        assert_eq!(indices(&presort_grouped(&lines, 0.0)), vec![3, 2, 4, 5, 1, 6]);
    }

    #[test]
    fn test_exact_division_includes_kerf() {
        let lines = vec![
            line(1, "A", "s", 6000.0, 1200.0, 1),
            line(2, "A", "s", 6000.0, 995.0, 1),
        ];
        // With kerf 5 only 995 + 5 divides 6000
        assert_eq!(indices(&presort_grouped(&lines, 5.0)), vec![2, 1]);
        assert_eq!(indices(&presort_grouped(&lines, 0.0)), vec![1, 2]);
    }

    #[test]
    fn test_empty() {
        assert!(presort_grouped(&[], 0.0).is_empty());
    }
}
