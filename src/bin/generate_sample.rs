use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Nationalities with relative weights; a long tail of rare values so the
/// combined view's threshold has something to hide.
const NATIONALITIES: &[(&str, u32)] = &[
    ("Argentina", 60),
    ("Uruguay", 8),
    ("Chile", 6),
    ("Paraguay", 5),
    ("Peru", 4),
    ("Colombia", 4),
    ("Bolivia", 3),
    ("Brazil", 3),
    ("Venezuela", 2),
    ("Ecuador", 2),
    ("Mexico", 1),
    ("Spain", 1),
    ("Italy", 1),
];

const COHORTS: &[(&str, usize)] = &[
    ("AMBA 2019", 38),
    ("AMBA 2022", 41),
    ("EMBA 2018 FDS", 27),
    ("EMBA JULIO 2018", 33),
    ("EMBA FDS 2020", 29),
    ("EMBA 3X3 2020", 24),
    ("EMBA 3X3 2021", 26),
    ("EMBA FDS 2021", 31),
    ("EMBA FDS 2022", 35),
    ("EMBA 3X3 2022", 22),
];

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

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Pick an entry with probability proportional to its weight.
    fn weighted<'a>(&mut self, choices: &[(&'a str, u32)]) -> &'a str {
        let total: u32 = choices.iter().map(|(_, w)| w).sum();
        let mut pick = self.below(total as u64) as u32;
        for &(name, weight) in choices {
            if pick < weight {
                return name;
            }
            pick -= weight;
        }
        choices[choices.len() - 1].0
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let output_dir = std::path::Path::new("sample_cohorts");
    std::fs::create_dir_all(output_dir).expect("Failed to create output directory");

    let schema = Arc::new(Schema::new(vec![
        Field::new("Name", DataType::Utf8, false),
        Field::new("Nationality", DataType::Utf8, true),
        Field::new("Age", DataType::Int64, true),
    ]));

    let mut total_rows = 0;
    for &(cohort, size) in COHORTS {
        let names: Vec<String> = (1..=size).map(|i| format!("Participant {i:03}")).collect();
        let nationalities: Vec<&str> = (0..size).map(|_| rng.weighted(NATIONALITIES)).collect();
        let ages: Vec<i64> = (0..size).map(|_| 28 + rng.below(25) as i64).collect();

        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(
                    names.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(nationalities)),
                Arc::new(Int64Array::from(ages)),
            ],
        )
        .expect("Failed to create RecordBatch");

        let path = output_dir.join(format!("{cohort}.parquet"));
        let file = std::fs::File::create(&path).expect("Failed to create output file");
        let mut writer =
            ArrowWriter::try_new(file, schema.clone(), None).expect("Failed to create writer");
        writer.write(&batch).expect("Failed to write batch");
        writer.close().expect("Failed to close writer");
        total_rows += size;
    }

    println!(
        "Wrote {} cohorts ({total_rows} participants) to {}/ ; view them with `cohort-lens --input {}`",
        COHORTS.len(),
        output_dir.display(),
        output_dir.display()
    );
}
