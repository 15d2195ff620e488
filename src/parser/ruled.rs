//! Table detection from drawn rules (lattice mode).
//!
//! Horizontal and vertical rules are snapped into a grid; each text span is
//! placed in the cell containing its origin.

use crate::model::PageTable;

use super::layout::{PageLayout, Rule, RuleKind, TextSpan};

/// Ruled detector configuration.
#[derive(Debug, Clone)]
pub struct RuledConfig {
    /// Rule positions closer than this are one grid line
    pub snap_tolerance: f32,
    /// Rules shorter than this are ignored (underlines, tick marks)
    pub min_rule_length: f32,
}

impl Default for RuledConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 3.0,
            min_rule_length: 10.0,
        }
    }
}

/// Builds tables from ruled grids.
#[derive(Debug, Clone, Default)]
pub struct RuledDetector {
    config: RuledConfig,
}

impl RuledDetector {
    /// Create a detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration.
    pub fn with_config(config: RuledConfig) -> Self {
        Self { config }
    }

    /// Extract the ruled table of a page, if it has one.
    pub fn extract(&self, page: u32, layout: &PageLayout) -> Vec<PageTable> {
        let mut rows_y = self.grid_lines(layout.rules(RuleKind::Horizontal));
        let cols_x = self.grid_lines(layout.rules(RuleKind::Vertical));

        if rows_y.len() < 2 || cols_x.len() < 2 {
            log::debug!(
                "RuledDetector: page {} has no grid ({} horizontal, {} vertical)",
                page,
                rows_y.len(),
                cols_x.len()
            );
            return vec![];
        }

        // Top to bottom
        rows_y.reverse();

        let row_count = rows_y.len() - 1;
        let col_count = cols_x.len() - 1;
        let mut cells: Vec<Vec<Vec<&TextSpan>>> = vec![vec![Vec::new(); col_count]; row_count];

        for span in &layout.spans {
            let row = rows_y
                .windows(2)
                .position(|w| span.y <= w[0] && span.y > w[1]);
            let col = cols_x
                .windows(2)
                .position(|w| span.x >= w[0] - self.config.snap_tolerance && span.x < w[1]);
            if let (Some(row), Some(col)) = (row, col) {
                cells[row][col].push(span);
            }
        }

        let rows: Vec<Vec<String>> = cells
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row: &Vec<String>| row.iter().any(|c| !c.is_empty()))
            .collect();

        log::debug!(
            "RuledDetector: page {} grid {}x{}, {} non-empty rows",
            page,
            row_count,
            col_count,
            rows.len()
        );

        if rows.is_empty() {
            return vec![];
        }
        vec![PageTable::new(page, rows)]
    }

    /// Distinct rule positions, ascending.
    fn grid_lines<'a>(&self, rules: impl Iterator<Item = &'a Rule>) -> Vec<f32> {
        let mut positions: Vec<f32> = rules
            .filter(|r| r.to - r.from >= self.config.min_rule_length)
            .map(|r| r.position)
            .collect();
        positions.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut snapped: Vec<f32> = Vec::new();
        for position in positions {
            match snapped.last() {
                Some(last) if position - last <= self.config.snap_tolerance => {}
                _ => snapped.push(position),
            }
        }
        snapped
    }
}

/// Text of one cell: spans on a line joined by spaces, lines by newlines.
fn cell_text(mut spans: Vec<&TextSpan>) -> String {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<&str>> = Vec::new();
    let mut line_y: Option<f32> = None;
    for span in spans {
        let same_line = line_y.is_some_and(|y| (span.y - y).abs() <= span.font_size * 0.4);
        if !same_line {
            lines.push(Vec::new());
            line_y = Some(span.y);
        }
        if let Some(line) = lines.last_mut() {
            line.push(span.text.trim());
        }
    }

    lines
        .into_iter()
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hline(y: f32, from: f32, to: f32) -> Rule {
        Rule {
            kind: RuleKind::Horizontal,
            position: y,
            from,
            to,
        }
    }

    fn vline(x: f32, from: f32, to: f32) -> Rule {
        Rule {
            kind: RuleKind::Vertical,
            position: x,
            from,
            to,
        }
    }

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, 10.0)
    }

    /// Three columns, header plus two rows.
    fn grid_layout() -> PageLayout {
        let mut rules = vec![
            hline(700.0, 0.0, 300.0),
            hline(680.0, 0.0, 300.0),
            hline(650.0, 0.0, 300.0),
            hline(620.0, 0.0, 300.0),
            // Double-drawn border
            hline(620.5, 0.0, 300.0),
        ];
        for x in [0.0, 50.0, 200.0, 300.0] {
            rules.push(vline(x, 620.0, 700.0));
        }
        // Underline too short to be a grid line
        rules.push(hline(600.0, 10.0, 15.0));

        let spans = vec![
            span("Sl No", 5.0, 688.0),
            span("Remarks", 55.0, 688.0),
            span("Balance", 205.0, 688.0),
            span("1", 5.0, 665.0),
            span("NEFT FROM", 55.0, 668.0),
            span("EMPLOYER", 55.0, 656.0),
            span("1,000.00", 205.0, 665.0),
            span("2", 5.0, 635.0),
            span("ATM", 55.0, 635.0),
            span("CASH", 80.0, 635.0),
            span("900.00", 205.0, 635.0),
            // Outside the grid
            span("Page 1 of 3", 5.0, 20.0),
        ];

        PageLayout { spans, rules }
    }

    #[test]
    fn test_grid_extraction() {
        let tables = RuledDetector::new().extract(2, &grid_layout());
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.page, 2);
        assert_eq!(
            table.rows,
            vec![
                vec!["Sl No", "Remarks", "Balance"],
                vec!["1", "NEFT FROM\nEMPLOYER", "1,000.00"],
                vec!["2", "ATM CASH", "900.00"],
            ]
        );
    }

    #[test]
    fn test_grid_lines_snap_and_filter() {
        let detector = RuledDetector::new();
        let layout = grid_layout();
        let ys = detector.grid_lines(layout.rules(RuleKind::Horizontal));
        assert_eq!(ys, vec![620.0, 650.0, 680.0, 700.0]);
    }

    #[test]
    fn test_no_rules_no_table() {
        let layout = PageLayout {
            spans: vec![span("1", 5.0, 5.0)],
            rules: vec![hline(10.0, 0.0, 100.0)],
        };
        assert!(RuledDetector::new().extract(1, &layout).is_empty());
    }

    #[test]
    fn test_empty_grid_no_table() {
        let mut layout = grid_layout();
        layout.spans.clear();
        assert!(RuledDetector::new().extract(1, &layout).is_empty());
    }
}
