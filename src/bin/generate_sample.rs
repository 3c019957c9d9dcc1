use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use spectral_fit::data::export::write_csv;
use spectral_fit::{Spectrum, Table};

/// Shift and scale baked into the observed spectrum.
const TRUE_SHIFT: f64 = 2.6;
const TRUE_SCALE: f64 = 310.0;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn peaks_at(x: f64, peaks: &[(f64, f64, f64)]) -> f64 {
    peaks
        .iter()
        .map(|&(mu, sigma, amp)| gaussian(x, mu, sigma, amp))
        .sum()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn write_parquet(path: &Path, table: &Table) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("energy", DataType::Float64, false),
        Field::new("intensity", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(table.column(0).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(table.column(1).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    // Theoretical peaks: (centre, width, height)
    let peaks = [(4.0, 0.6, 1.0), (7.5, 0.9, 0.45), (11.0, 0.4, 0.7)];

    // Expected: fine grid 0.00 → 20.00, step 0.05
    let expected_rows: Vec<Vec<f64>> = (0..=400)
        .map(|i| {
            let x = i as f64 * 0.05;
            vec![x, peaks_at(x, &peaks)]
        })
        .collect();

    // Observed: coarser grid 3.0 → 19.0, step 0.1, shifted, scaled and noisy
    let observed_rows: Vec<Vec<f64>> = (30..=190)
        .map(|j| {
            let x = j as f64 * 0.1;
            let signal = TRUE_SCALE * peaks_at(x - TRUE_SHIFT, &peaks);
            vec![x, signal + rng.gauss(0.0, 2.0)]
        })
        .collect();

    let titles = vec!["energy".to_string(), "intensity".to_string()];
    let expected = Spectrum::new(Table::new(expected_rows)?).with_titles(titles.clone());
    let observed = Spectrum::new(Table::new(observed_rows)?).with_titles(titles);

    write_csv(Path::new("expected.csv"), &expected)?;
    write_csv(Path::new("observed.csv"), &observed)?;
    write_parquet(Path::new("observed.parquet"), observed.baseline_table())?;

    println!(
        "Wrote expected.csv ({} rows), observed.csv and observed.parquet ({} rows); \
         true shift {TRUE_SHIFT}, scale {TRUE_SCALE}",
        expected.baseline_table().row_count(),
        observed.baseline_table().row_count()
    );
    Ok(())
}
