//! Table detection using text position analysis (stream mode).
//!
//! Detects whitespace-delimited tables by analyzing text alignment without
//! relying on graphical lines. Statement amounts are right-aligned, so both
//! left and right text edges count as column evidence.

use std::collections::{HashMap, HashSet};

use crate::model::PageTable;

use super::layout::TextSpan;

/// X positions within this many points share an edge bucket.
const BUCKET_SIZE: f32 = 5.0;

/// Tolerance for a span edge to count as aligned with an anchor.
const ALIGN_TOLERANCE: f32 = 5.0;

/// Spans may start this far left of their column start.
const COLUMN_SLACK: f32 = 10.0;

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Starting Y coordinate (top of table, in PDF coords)
    pub top_y: f32,
    /// Ending Y coordinate (bottom of table)
    pub bottom_y: f32,
    /// Right X boundary
    pub right_x: f32,
    /// Column start positions (X coordinates)
    pub columns: Vec<f32>,
    /// Rows of text spans grouped by Y position
    pub rows: Vec<TableRowData>,
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Y position of this row
    pub y: f32,
    /// Spans in this row, sorted by X
    pub spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            // Ten canonical columns plus room for split headers
            max_columns: 12,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Edge positions shared by enough rows to be column evidence.
#[derive(Debug, Clone, Default)]
struct ColumnAnchors {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl ColumnAnchors {
    fn aligns(&self, span: &TextSpan) -> bool {
        self.left.iter().any(|x| (span.x - x).abs() <= ALIGN_TOLERANCE)
            || self
                .right
                .iter()
                .any(|x| (span.right() - x).abs() <= ALIGN_TOLERANCE)
    }
}

/// Detects whitespace-delimited tables in a list of text spans.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables on a page and convert them to cell rows.
    pub fn extract(&self, page: u32, spans: Vec<TextSpan>) -> Vec<PageTable> {
        self.detect(spans)
            .iter()
            .map(|detected| PageTable::new(page, self.to_rows(detected)))
            .filter(|table| !table.is_empty())
            .collect()
    }

    /// Detect tables in the given spans.
    pub fn detect(&self, spans: Vec<TextSpan>) -> Vec<DetectedTable> {
        log::debug!("TableDetector: starting with {} spans", spans.len());

        if spans.len() < self.config.min_rows * self.config.min_columns {
            log::debug!("TableDetector: not enough spans ({})", spans.len());
            return vec![];
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            log::debug!("TableDetector: not enough rows ({})", rows.len());
            return vec![];
        }

        let anchors = self.find_anchors(&rows);
        let columns = self.column_starts(&rows, &anchors);
        log::debug!(
            "TableDetector: {} rows, columns at {:?}",
            rows.len(),
            columns
        );

        if columns.len() < self.config.min_columns {
            return vec![];
        }

        let mut detected_tables = Vec::new();
        for (start_row, end_row) in self.find_table_regions(&rows, &anchors) {
            let table_rows: Vec<TableRowData> = rows[start_row..=end_row].to_vec();

            // Re-detect columns for this specific table region
            let region_anchors = self.find_anchors(&table_rows);
            let table_columns = self.column_starts(&table_rows, &region_anchors);

            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }

            let top_y = table_rows.first().map(|r| r.y).unwrap_or(0.0);
            let bottom_y = table_rows.last().map(|r| r.y).unwrap_or(0.0);
            let right_x = table_rows
                .iter()
                .flat_map(|r| r.spans.iter())
                .map(TextSpan::right)
                .fold(0.0, f32::max);

            detected_tables.push(DetectedTable {
                top_y,
                bottom_y,
                right_x,
                columns: table_columns,
                rows: table_rows,
            });
        }

        log::debug!("TableDetector: found {} tables", detected_tables.len());
        detected_tables
    }

    /// Group spans into rows by Y position, top to bottom.
    fn group_into_rows(&self, mut spans: Vec<TextSpan>) -> Vec<TableRowData> {
        // Sort by Y (descending for PDF coords) then X
        spans.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current_row_spans: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in spans {
            let y_tolerance = span.font_size * self.config.y_tolerance_factor;

            match current_y {
                Some(y) if (span.y - y).abs() <= y_tolerance => {
                    current_row_spans.push(span);
                }
                _ => {
                    if !current_row_spans.is_empty() {
                        rows.push(finish_row(std::mem::take(&mut current_row_spans)));
                    }
                    current_y = Some(span.y);
                    current_row_spans.push(span);
                }
            }
        }

        if !current_row_spans.is_empty() {
            rows.push(finish_row(current_row_spans));
        }

        rows
    }

    /// Find left and right edges that align across rows.
    ///
    /// Only rows with two or more spans vote, unless too few such rows
    /// exist, in which case every row does.
    fn find_anchors(&self, rows: &[TableRowData]) -> ColumnAnchors {
        let multi_span_rows: Vec<&TableRowData> =
            rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let voters: Vec<&TableRowData> = if multi_span_rows.len() < self.config.min_rows {
            rows.iter().collect()
        } else {
            multi_span_rows
        };

        ColumnAnchors {
            left: self.aligned_edges(&voters, |s| s.x),
            right: self.aligned_edges(&voters, TextSpan::right),
        }
    }

    fn aligned_edges(&self, rows: &[&TableRowData], edge: impl Fn(&TextSpan) -> f32) -> Vec<f32> {
        let mut edge_counts: HashMap<i32, usize> = HashMap::new();

        for row in rows {
            // Count each bucket only once per row
            let row_buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|span| (edge(span) / BUCKET_SIZE).round() as i32)
                .collect();
            for bucket in row_buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((rows.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * BUCKET_SIZE)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        edges
    }

    /// Column start positions.
    ///
    /// A right-aligned column starts at the leftmost span that ends on its
    /// anchor. Starts closer than the minimum gap are merged.
    fn column_starts(&self, rows: &[TableRowData], anchors: &ColumnAnchors) -> Vec<f32> {
        let mut starts = anchors.left.clone();

        for anchor in &anchors.right {
            let start = rows
                .iter()
                .flat_map(|r| r.spans.iter())
                .filter(|s| (s.right() - anchor).abs() <= ALIGN_TOLERANCE)
                .map(|s| s.x)
                .fold(f32::INFINITY, f32::min);
            if start.is_finite() {
                starts.push(start);
            }
        }

        starts.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for start in starts {
            match merged.last() {
                Some(last) if start - last < self.config.min_column_gap => {}
                _ => merged.push(start),
            }
        }
        merged
    }

    /// Find contiguous row regions that form tables.
    fn find_table_regions(
        &self,
        rows: &[TableRowData],
        anchors: &ColumnAnchors,
    ) -> Vec<(usize, usize)> {
        let mut regions: Vec<(usize, usize)> = Vec::new();
        let mut current_start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if self.alignment_score(row, anchors) >= self.config.min_alignment_ratio {
                if current_start.is_none() {
                    current_start = Some(i);
                }
            } else if let Some(start) = current_start.take() {
                if i - start >= self.config.min_rows {
                    regions.push((start, i - 1));
                }
            }
        }

        if let Some(start) = current_start {
            if rows.len() - start >= self.config.min_rows {
                regions.push((start, rows.len() - 1));
            }
        }

        regions
    }

    /// Fraction of a row's spans that align with an anchor.
    fn alignment_score(&self, row: &TableRowData, anchors: &ColumnAnchors) -> f32 {
        if row.spans.is_empty() {
            return 0.0;
        }
        let aligned = row.spans.iter().filter(|s| anchors.aligns(s)).count();
        aligned as f32 / row.spans.len() as f32
    }

    /// Convert a detected table to cell rows.
    ///
    /// A row with an empty leading cell continues the row above it: its
    /// cells are appended to the previous row's cells on a new line.
    pub fn to_rows(&self, detected: &DetectedTable) -> Vec<Vec<String>> {
        let columns = &detected.columns;
        let mut rows: Vec<Vec<String>> = Vec::with_capacity(detected.rows.len());

        for row_data in &detected.rows {
            let mut cell_contents: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for span in &row_data.spans {
                let col_idx = find_column_for_span(span.x, columns, detected.right_x);
                if let Some(cell) = cell_contents.get_mut(col_idx) {
                    cell.push(span.text.trim());
                }
            }
            let cells: Vec<String> = cell_contents.into_iter().map(|c| c.join(" ")).collect();

            let is_continuation = cells.first().is_some_and(|c| c.is_empty());
            match rows.last_mut() {
                Some(previous) if is_continuation => fold_continuation(previous, cells),
                _ => rows.push(cells),
            }
        }

        rows
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn finish_row(spans: Vec<TextSpan>) -> TableRowData {
    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    TableRowData { y, spans }
}

/// Append a continuation row's cells to the row above.
fn fold_continuation(previous: &mut [String], cells: Vec<String>) {
    for (target, text) in previous.iter_mut().zip(cells) {
        if text.is_empty() {
            continue;
        }
        if !target.is_empty() {
            target.push('\n');
        }
        target.push_str(&text);
    }
}

/// Find which column a span belongs to based on its X position.
fn find_column_for_span(span_x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &col_start) in columns.iter().enumerate() {
        let col_end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if span_x >= col_start - COLUMN_SLACK && span_x < col_end - COLUMN_SLACK {
            return i;
        }
    }

    // No range matched: closest column start
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (span_x - **a)
                .abs()
                .partial_cmp(&(span_x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_span(text: &str, x: f32, y: f32) -> TextSpan {
        // 10pt text: 5pt per character
        TextSpan::new(text, x, y, 10.0)
    }

    /// Right-aligned span ending at `right`.
    fn right_span(text: &str, right: f32, y: f32) -> TextSpan {
        make_span(text, right - text.chars().count() as f32 * 5.0, y)
    }

    fn statement_spans() -> Vec<TextSpan> {
        let mut spans = Vec::new();
        let rows: [(f32, &str, &str, &str, &str, &str); 4] = [
            (700.0, "Sl", "Date", "Remarks", "Withdrawal", "Balance"),
            (685.0, "1", "01/04/2024", "ATM CASH", "500.00", "1,500.00"),
            (670.0, "2", "02/04/2024", "UPI PAYMENT", "1,250.00", "250.00"),
            (640.0, "3", "03/04/2024", "NEFT", "20.00", "230.00"),
        ];
        for (y, sl, date, remarks, amount, balance) in rows {
            spans.push(make_span(sl, 20.0, y));
            spans.push(make_span(date, 60.0, y));
            spans.push(make_span(remarks, 140.0, y));
            spans.push(right_span(amount, 400.0, y));
            spans.push(right_span(balance, 480.0, y));
        }
        // Second line of the UPI remarks
        spans.push(make_span("TO GROCER", 140.0, 655.0));
        spans
    }

    #[test]
    fn test_group_into_rows() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("B1", 60.0, 100.0),
            make_span("A1", 10.0, 100.0),
            make_span("A2", 10.0, 85.0),
            make_span("B2", 60.0, 85.0),
        ];

        let rows = detector.group_into_rows(spans);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].spans[0].text, "A1");
        assert_eq!(rows[1].spans.len(), 2);
    }

    #[test]
    fn test_right_aligned_columns() {
        let detector = TableDetector::new();
        let rows = detector.group_into_rows(statement_spans());
        let anchors = detector.find_anchors(&rows);
        assert!(anchors.right.contains(&400.0));
        assert!(anchors.right.contains(&480.0));

        let columns = detector.column_starts(&rows, &anchors);
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[0], 20.0);
        assert_eq!(columns[3], 350.0);
    }

    #[test]
    fn test_extract_statement_table() {
        let detector = TableDetector::new();
        let tables = detector.extract(3, statement_spans());
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.page, 3);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(
            table.rows[0],
            vec!["Sl", "Date", "Remarks", "Withdrawal", "Balance"]
        );
        assert_eq!(
            table.rows[1],
            vec!["1", "01/04/2024", "ATM CASH", "500.00", "1,500.00"]
        );
        assert_eq!(table.rows[2][2], "UPI PAYMENT\nTO GROCER");
        assert_eq!(table.rows[3][4], "230.00");
    }

    #[test]
    fn test_no_table_single_column() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("Line 1", 10.0, 100.0),
            make_span("Line 2", 10.0, 85.0),
            make_span("Line 3", 10.0, 70.0),
            make_span("Line 4", 10.0, 55.0),
        ];
        assert!(detector.detect(spans).is_empty());
    }

    #[test]
    fn test_too_few_spans() {
        let detector = TableDetector::new();
        assert!(detector.detect(vec![make_span("1", 10.0, 10.0)]).is_empty());
        assert!(detector.detect(Vec::new()).is_empty());
    }

    #[test]
    fn test_fold_continuation() {
        let mut previous = vec!["4".to_string(), "NEFT".to_string(), "".to_string()];
        fold_continuation(
            &mut previous,
            vec!["".to_string(), "SALARY".to_string(), "X".to_string()],
        );
        assert_eq!(previous, vec!["4", "NEFT\nSALARY", "X"]);
    }

    #[test]
    fn test_find_column_for_span() {
        let columns = [20.0, 60.0, 140.0];
        assert_eq!(find_column_for_span(20.0, &columns, 300.0), 0);
        assert_eq!(find_column_for_span(55.0, &columns, 300.0), 1);
        assert_eq!(find_column_for_span(250.0, &columns, 300.0), 2);
        assert_eq!(find_column_for_span(0.0, &columns, 300.0), 0);
    }
}
