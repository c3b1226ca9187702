//! Writes a synthetic TIMSS-like dataset as `sample_data.feather` and
//! `sample_data.parquet` in the working directory.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

const SCHOOLS: i64 = 12;
const STUDENTS_PER_SCHOOL: i64 = 25;

/// Sub-domain prefixes, five plausible values each.
const SCORE_PREFIXES: [&str; 7] = ["BSMMAT", "BSMNUM", "BSMALG", "BSMGEO", "BSMKNO", "BSMAPP", "BSMREA"];

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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// Column builder keyed by name, in schema order.
#[derive(Default)]
struct Columns {
    ints: Vec<(String, Vec<i64>)>,
    floats: Vec<(String, Vec<f64>)>,
}

impl Columns {
    fn float(&mut self, name: &str) -> &mut Vec<f64> {
        let pos = match self.floats.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                self.floats.push((name.to_string(), Vec::new()));
                self.floats.len() - 1
            }
        };
        &mut self.floats[pos].1
    }

    fn int(&mut self, name: &str) -> &mut Vec<i64> {
        let pos = match self.ints.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                self.ints.push((name.to_string(), Vec::new()));
                self.ints.len() - 1
            }
        };
        &mut self.ints[pos].1
    }

    fn into_batch(self) -> Result<RecordBatch> {
        let mut fields = Vec::new();
        let mut arrays: Vec<ArrayRef> = Vec::new();
        for (name, values) in self.ints {
            fields.push(Field::new(name, DataType::Int64, false));
            arrays.push(Arc::new(Int64Array::from(values)));
        }
        for (name, values) in self.floats {
            fields.push(Field::new(name, DataType::Float64, true));
            arrays.push(Arc::new(Float64Array::from(values)));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("assembling record batch")
    }
}

fn generate(rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns::default();

    for school in 0..SCHOOLS {
        let school_id = 5001 + school;
        let school_effect = rng.gauss(0.0, 35.0);

        for student in 0..STUDENTS_PER_SCHOOL {
            cols.int("IDSCHOOL").push(school_id);
            cols.int("IDSTUD").push(school_id * 100 + student + 1);

            // Sex stored as a float code, as pandas writes it.
            let sex = if rng.below(2) == 0 { 1.0 } else { 2.0 };
            cols.float("ITSEX").push(sex);
            cols.float("BSDAGE").push((rng.gauss(14.0, 0.5) * 100.0).round() / 100.0);

            let resources: Vec<f64> = (0..10).map(|_| (rng.below(10) < 6) as u8 as f64).collect();
            let ability = 480.0 + school_effect + resources.iter().sum::<f64>() * 6.0
                + rng.gauss(0.0, 60.0);

            for prefix in SCORE_PREFIXES {
                let domain_shift = rng.gauss(0.0, 15.0);
                for pv in 1..=5 {
                    let score = ability + domain_shift + rng.gauss(0.0, 20.0);
                    cols.float(&format!("{prefix}{pv:02}")).push((score * 100.0).round() / 100.0);
                }
            }

            for (flag, has) in ('A'..='J').zip(&resources) {
                cols.float(&format!("BSBG05{flag}")).push(*has);
            }

            cols.float("ITLANG").push(1.0 + rng.below(2) as f64);
            cols.float("BSDGEDUP").push(1.0 + rng.below(5) as f64);
            cols.float("BSBGSLM").push(1.0 + rng.below(3) as f64);
        }
    }
    cols
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = SimpleRng::new(42);
    let batch = generate(&mut rng).into_batch()?;
    let schema = batch.schema();

    let feather_path = "sample_data.feather";
    let file = std::fs::File::create(feather_path).context("creating feather file")?;
    let mut writer = FileWriter::try_new(file, &schema).context("creating feather writer")?;
    writer.write(&batch).context("writing feather batch")?;
    writer.finish().context("finishing feather file")?;

    let parquet_path = "sample_data.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    let preview = batch.project(&[0, 1, 2, 3, 4])?.slice(0, 5);
    log::info!("preview:\n{}", pretty_format_batches(&[preview])?);
    log::info!(
        "Wrote {} students from {SCHOOLS} schools to {feather_path} and {parquet_path}",
        batch.num_rows()
    );
    Ok(())
}
