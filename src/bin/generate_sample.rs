//! Write deterministic sample datasets for the viewer:
//! `asimetrias.parquet` (test results) and `ejercicios.parquet` (exercises).
//!
//! Usage: `generate_sample [OUTPUT_DIR]` (default `data`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SCENARIOS: [&str; 8] = [
    "Lectura", "Memoria", "Calculo", "Dibujo", "Atencion", "Musica", "Deporte", "Idiomas",
];
const EYES: [&str; 3] = ["Derecho", "Izquierdo", "Ambos"];
const HANDS: [&str; 2] = ["Diestro", "Zurdo"];
const LEVELS: [&str; 3] = ["Inicial", "Intermedio", "Avanzado"];
const DIFFICULTIES: [&str; 3] = ["Baja", "Media", "Alta"];

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

/// A "lo-hi" percentage range, or a single value one time in five.
fn percentage_range(rng: &mut SimpleRng) -> String {
    let lo = rng.below(9) * 10;
    if rng.below(5) == 0 {
        return format!("{lo}");
    }
    let hi = (lo + 10 + rng.below(4) * 10).min(100);
    format!("{lo}-{hi}%")
}

fn strings(values: Vec<Option<String>>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

fn asymmetries(rng: &mut SimpleRng, n: usize) -> Result<RecordBatch> {
    let mut eye = Vec::with_capacity(n);
    let mut hand = Vec::with_capacity(n);
    let mut natural = Vec::with_capacity(n);
    let mut recessive = Vec::with_capacity(n);
    let mut scenario = Vec::with_capacity(n);
    let mut description = Vec::with_capacity(n);

    for i in 0..n {
        eye.push(Some(rng.pick(&EYES).to_string()));
        hand.push(Some(rng.pick(&HANDS).to_string()));
        natural.push(Some(percentage_range(rng)));
        // Leave some gaps, like a hand-maintained sheet.
        recessive.push((rng.below(6) != 0).then(|| percentage_range(rng)));
        scenario.push((rng.below(10) != 0).then(|| rng.pick(&SCENARIOS).to_string()));
        description.push(Some(format!("Perfil de prueba {}", i + 1)));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Ojo Dominante", DataType::Utf8, true),
        Field::new("Mano Dominante", DataType::Utf8, true),
        Field::new("% Hemisferio Correspondiente al ojo (Natural)", DataType::Utf8, true),
        Field::new("% de Hemisferio Recesivo (Anitnatural)", DataType::Utf8, true),
        Field::new("Escenarios", DataType::Utf8, true),
        Field::new("Descripcion", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            strings(eye),
            strings(hand),
            strings(natural),
            strings(recessive),
            strings(scenario),
            strings(description),
        ],
    )
    .context("building asymmetries batch")
}

fn exercises(rng: &mut SimpleRng, n: usize) -> Result<RecordBatch> {
    let mut name = Vec::with_capacity(n);
    let mut slide = Vec::with_capacity(n);
    let mut level = Vec::with_capacity(n);
    let mut difficulty = Vec::with_capacity(n);
    let mut level_difficulty = Vec::with_capacity(n);
    let mut main_scenario = Vec::with_capacity(n);
    let mut extra_scenario = Vec::with_capacity(n);

    for i in 0..n {
        name.push(Some(format!("Ejercicio {}", i + 1)));
        slide.push(Some(rng.below(12) as i64 + 1));
        level.push(Some(rng.pick(&LEVELS).to_string()));
        difficulty.push(Some(rng.pick(&DIFFICULTIES).to_string()));
        level_difficulty.push(Some(format!(
            "{} {}",
            rng.pick(&LEVELS),
            rng.pick(&DIFFICULTIES)
        )));
        main_scenario.push(Some(format!(
            "{}, {}",
            rng.pick(&SCENARIOS),
            rng.pick(&SCENARIOS)
        )));
        extra_scenario.push((rng.below(3) == 0).then(|| rng.pick(&SCENARIOS).to_string()));
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("Ejercicio", DataType::Utf8, true),
        Field::new("Filmina", DataType::Int64, true),
        Field::new("Nivel de Ejercicio", DataType::Utf8, true),
        Field::new("Dificultad", DataType::Utf8, true),
        Field::new("Dificultad de Nivel Ejercicio", DataType::Utf8, true),
        Field::new("Escenario: Principal", DataType::Utf8, true),
        Field::new("Escenario: Secundario", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            strings(name),
            Arc::new(Int64Array::from(slide)),
            strings(level),
            strings(difficulty),
            strings(level_difficulty),
            strings(main_scenario),
            strings(extra_scenario),
        ],
    )
    .context("building exercises batch")
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    println!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    write_parquet(&out_dir.join("asimetrias.parquet"), &asymmetries(&mut rng, 60)?)?;
    write_parquet(&out_dir.join("ejercicios.parquet"), &exercises(&mut rng, 120)?)?;

    println!(
        "Run the viewer with SPHINX_ASYMMETRIES_PATH={} SPHINX_EXERCISES_PATH={}",
        out_dir.join("asimetrias.parquet").display(),
        out_dir.join("ejercicios.parquet").display()
    );
    Ok(())
}
