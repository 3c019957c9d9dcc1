use crate::fit::error::{FitError, Result};

// ---------------------------------------------------------------------------
// Table – rows of [x, intensity_1, .., intensity_N]
// ---------------------------------------------------------------------------

/// An ordered sequence of fixed-width numeric rows.
///
/// Column 0 is the x-axis (energy / wavelength), columns `1..` are
/// intensities. Rows are usually sorted by x but nothing here enforces it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    rows: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table, checking it has at least one row, at least one
    /// intensity column, a uniform row width and only finite values.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(FitError::Shape("table has no rows".into()));
        };
        let width = first.len();
        if width < 2 {
            return Err(FitError::Shape(format!(
                "need an x column and at least one intensity column, got {width} column(s)"
            )));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(FitError::Shape(format!(
                "row {i} has {} values, expected {width}",
                row.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if let Some(col) = row.iter().position(|v| !v.is_finite()) {
                return Err(FitError::Shape(format!(
                    "row {i}, column {col} is {}, expected a finite number",
                    row[col]
                )));
            }
        }
        Ok(Table { rows })
    }

    /// Build a two-column table from separate x and intensity vectors.
    pub fn from_xy(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(FitError::Shape(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        Table::new(x.iter().zip(y).map(|(&xi, &yi)| vec![xi, yi]).collect())
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows[0].len()
    }

    /// The x-axis (column 0).
    pub fn x(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r[0])
    }

    /// Values of a single column.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[col])
    }

    /// Copy of the rows `first..=last`.
    pub(crate) fn slice(&self, first: usize, last: usize) -> Table {
        Table {
            rows: self.rows[first..=last].to_vec(),
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.rows
    }
}

// ---------------------------------------------------------------------------
// Spectrum – baseline table plus a working copy that gets shifted / scaled
// ---------------------------------------------------------------------------

/// A spectrum that remembers its original data so the applied shift and
/// scale can be recovered after fitting.
///
/// `baseline` is never modified; `working` always has the same shape as
/// `baseline` because every mutation rewrites values in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    baseline: Table,
    working: Table,
    titles: Option<Vec<String>>,
}

impl Spectrum {
    pub fn new(table: Table) -> Self {
        Spectrum {
            working: table.clone(),
            baseline: table,
            titles: None,
        }
    }

    /// Attach column titles (e.g. a CSV header row).
    pub fn with_titles(mut self, titles: Vec<String>) -> Self {
        self.titles = Some(titles);
        self
    }

    pub fn titles(&self) -> Option<&[String]> {
        self.titles.as_deref()
    }

    /// The table with every applied shift and scale.
    pub fn current_table(&self) -> &Table {
        &self.working
    }

    /// The unmodified table the spectrum was built from.
    pub fn baseline_table(&self) -> &Table {
        &self.baseline
    }

    /// Shift the x-axis of the working table by `delta`.
    pub fn shift_x(&mut self, delta: f64) -> &Table {
        for row in self.working.rows_mut() {
            row[0] += delta;
        }
        &self.working
    }

    /// Place the working x-axis at `baseline + offset`.
    ///
    /// Unlike [`Spectrum::shift_x`] this never accumulates rounding error
    /// over repeated try/undo steps.
    pub fn shift_to(&mut self, offset: f64) -> &Table {
        for (row, base) in self.working.rows_mut().iter_mut().zip(self.baseline.rows()) {
            row[0] = base[0] + offset;
        }
        &self.working
    }

    /// Set every intensity to `baseline * factor`.
    ///
    /// Scaling is absolute: calling this twice with the same factor gives
    /// the same table.
    pub fn scale_intensity(&mut self, factor: f64) -> &Table {
        for (row, base) in self.working.rows_mut().iter_mut().zip(self.baseline.rows()) {
            for (v, b) in row[1..].iter_mut().zip(&base[1..]) {
                *v = b * factor;
            }
        }
        &self.working
    }

    /// Discard every shift and scale.
    pub fn reset(&mut self) {
        self.working = self.baseline.clone();
    }

    /// Mean ratio of working to baseline intensity (first intensity column).
    /// NaN when any baseline intensity is zero.
    pub fn induced_scale(&self) -> f64 {
        let ratios = self
            .working
            .column(1)
            .zip(self.baseline.column(1))
            .map(|(w, b)| w / b);
        mean(ratios, self.baseline.row_count())
    }

    /// Mean difference between working and baseline x.
    pub fn induced_shift(&self) -> f64 {
        let deltas = self.working.x().zip(self.baseline.x()).map(|(w, b)| w - b);
        mean(deltas, self.baseline.row_count())
    }
}

fn mean(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    values.sum::<f64>() / n as f64
}
