use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const YEARS: std::ops::RangeInclusive<u32> = 2015..=2020;

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

struct Country {
    name: String,
    region: &'static str,
    gdp_by_year: Vec<f64>,
    score: f64,
}

fn generate(rng: &mut SimpleRng) -> Vec<Country> {
    // (region, countries, log-GDP centre, score centre)
    let regions = [
        ("Africa", 14, 7.8, 80.0),
        ("Americas", 10, 9.2, 88.0),
        ("Asia", 14, 8.9, 93.0),
        ("Europe", 14, 10.3, 98.0),
        ("Oceania", 4, 10.0, 95.0),
    ];

    let mut countries = Vec::new();
    for (region, n, log_gdp, score) in regions {
        for i in 0..n {
            let base = rng.gauss(log_gdp, 0.6).exp();
            let growth = rng.gauss(0.02, 0.015);
            let gdp_by_year = YEARS
                .enumerate()
                .map(|(k, _)| (base * (1.0 + growth).powi(k as i32) * rng.gauss(1.0, 0.02)).round())
                .collect();
            countries.push(Country {
                name: format!("{region}_{:02}", i + 1),
                region,
                gdp_by_year,
                score: (rng.gauss(score, 4.0) * 10.0).round() / 10.0,
            });
        }
    }
    countries
}

/// GDP by year per country.
fn write_gdp_csv(path: &str, countries: &[Country]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    let mut header = vec!["Country".to_string(), "Region".to_string()];
    header.extend(YEARS.map(|y| y.to_string()));
    writer.write_record(&header)?;
    for c in countries {
        let mut record = vec![c.name.clone(), c.region.to_string()];
        record.extend(c.gdp_by_year.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Average IQ per country; every seventh country is left out so the join
/// has something to drop.
fn write_iq_csv(path: &str, countries: &[Country]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(["Country", "Average_IQ"])?;
    for c in countries.iter().enumerate().filter(|(i, _)| i % 7 != 6).map(|(_, c)| c) {
        writer.write_record([c.name.clone(), c.score.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Everything in one table.
fn write_combined_parquet(path: &str, countries: &[Country]) -> Result<()> {
    let mut fields = vec![
        Field::new("Country", DataType::Utf8, false),
        Field::new("Region", DataType::Utf8, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            countries.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            countries.iter().map(|c| c.region).collect::<Vec<_>>(),
        )),
    ];
    for (k, year) in YEARS.enumerate() {
        fields.push(Field::new(year.to_string(), DataType::Float64, true));
        arrays.push(Arc::new(Float64Array::from(
            countries.iter().map(|c| c.gdp_by_year[k]).collect::<Vec<_>>(),
        )));
    }
    fields.push(Field::new("Average_IQ", DataType::Float64, false));
    arrays.push(Arc::new(Float64Array::from(
        countries.iter().map(|c| c.score).collect::<Vec<_>>(),
    )));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let countries = generate(&mut rng);

    write_gdp_csv("sample_gdp.csv", &countries)?;
    write_iq_csv("sample_iq.csv", &countries)?;
    write_combined_parquet("sample_combined.parquet", &countries)?;

    println!(
        "Wrote {} countries ({} years each) to sample_gdp.csv, sample_iq.csv and \
         sample_combined.parquet",
        countries.len(),
        YEARS.count()
    );
    Ok(())
}
