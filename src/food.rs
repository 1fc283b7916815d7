use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NUTRITION_FILE: &str = "nutrition.csv";
pub const DIABETES_FOOD_FILE: &str = "diabet_food_recomendation_clean.csv";

pub const DEFAULT_COMBINATIONS: usize = 2;
pub const DEFAULT_ITEMS_PER_COMBINATION: usize = 5;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{0} contains no rows")]
    Empty(String),
}

/// One row of the nutrition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub name: String,
    pub calories: f64,
    pub carbohydrate: f64,
    pub fat: f64,
    pub proteins: f64,
    pub image: String,
}

#[derive(Debug, Deserialize)]
struct DiabetesFoodRow {
    #[serde(rename = "Calories")]
    calories: f64,
    #[serde(rename = "Carbohydrates")]
    carbohydrates: f64,
    #[serde(rename = "Fat")]
    fat: f64,
    #[serde(rename = "Protein")]
    protein: f64,
}

/// Upper bounds used to pick foods for a diabetic diet. `None` leaves the
/// nutrient unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NutrientCeilings {
    pub calories: Option<f64>,
    pub carbohydrate: Option<f64>,
    pub fat: Option<f64>,
    pub protein: Option<f64>,
}

impl NutrientCeilings {
    pub fn admits(&self, record: &NutritionRecord) -> bool {
        fn within(value: f64, ceiling: Option<f64>) -> bool {
            ceiling.map_or(true, |max| value <= max)
        }

        within(record.calories, self.calories)
            && within(record.carbohydrate, self.carbohydrate)
            && within(record.fat, self.fat)
            && within(record.proteins, self.protein)
    }
}

/// Maximum nutrient values found in the diabetes food table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiabetesThresholds {
    pub calories: f64,
    pub carbohydrate: f64,
    pub fat: f64,
    pub protein: f64,
}

impl DiabetesThresholds {
    pub fn ceilings(&self) -> NutrientCeilings {
        NutrientCeilings {
            calories: Some(self.calories),
            carbohydrate: Some(self.carbohydrate),
            fat: Some(self.fat),
            protein: Some(self.protein),
        }
    }
}

/// Static datasets, loaded once at startup.
#[derive(Debug, Clone)]
pub struct FoodData {
    pub foods: Vec<NutritionRecord>,
    pub thresholds: DiabetesThresholds,
}

impl FoodData {
    pub fn load(data_dir: &Path) -> Result<Self, DataError> {
        let foods = read_nutrition_table(&data_dir.join(NUTRITION_FILE))?;
        let thresholds = read_diabetes_thresholds(&data_dir.join(DIABETES_FOOD_FILE))?;
        Ok(FoodData { foods, thresholds })
    }

    /// Case-insensitive lookup by food name.
    pub fn find(&self, name: &str) -> Option<&NutritionRecord> {
        let name = name.trim();
        self.foods
            .iter()
            .find(|record| record.name.trim().eq_ignore_ascii_case(name))
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, DataError> {
    let csv_error = |source| DataError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    reader
        .deserialize::<T>()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_error)
}

pub fn read_nutrition_table(path: &Path) -> Result<Vec<NutritionRecord>, DataError> {
    read_rows(path)
}

pub fn read_diabetes_thresholds(path: &Path) -> Result<DiabetesThresholds, DataError> {
    let rows: Vec<DiabetesFoodRow> = read_rows(path)?;
    if rows.is_empty() {
        return Err(DataError::Empty(path.display().to_string()));
    }

    let max = |f: fn(&DiabetesFoodRow) -> f64| rows.iter().map(f).fold(f64::MIN, f64::max);
    Ok(DiabetesThresholds {
        calories: max(|r| r.calories),
        carbohydrate: max(|r| r.carbohydrates),
        fat: max(|r| r.fat),
        protein: max(|r| r.protein),
    })
}

/// Returns the rows that satisfy every supplied ceiling.
pub fn filter_food(foods: &[NutritionRecord], ceilings: &NutrientCeilings) -> Vec<NutritionRecord> {
    foods
        .iter()
        .filter(|record| ceilings.admits(record))
        .cloned()
        .collect()
}

/// Draws `count` independent random samples of `min(foods.len(), items)`
/// rows each. Rows do not repeat within a sample but samples may overlap.
pub fn generate_combinations<R: Rng + ?Sized>(
    foods: &[NutritionRecord],
    count: usize,
    items: usize,
    rng: &mut R,
) -> Vec<Vec<NutritionRecord>> {
    let size = foods.len().min(items);
    (0..count)
        .map(|_| foods.choose_multiple(&mut *rng, size).cloned().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn record(name: &str, calories: f64, carbohydrate: f64, fat: f64, proteins: f64) -> NutritionRecord {
        NutritionRecord {
            name: name.to_string(),
            calories,
            carbohydrate,
            fat,
            proteins,
            image: format!("https://img.example/{}.jpg", name),
        }
    }

    fn table() -> Vec<NutritionRecord> {
        vec![
            record("tempe", 201.0, 13.5, 7.7, 20.8),
            record("nasi goreng", 276.0, 38.0, 9.9, 6.1),
            record("sayur asem", 29.0, 5.0, 0.6, 0.7),
            record("rendang", 468.0, 7.8, 37.0, 22.6),
            record("tahu", 80.0, 1.6, 4.6, 10.9),
            record("soto ayam", 101.0, 3.6, 4.9, 10.2),
            record("pisang", 99.0, 25.8, 0.2, 1.2),
        ]
    }

    #[test]
    fn filter_respects_every_supplied_ceiling() {
        let ceilings = NutrientCeilings {
            calories: Some(250.0),
            carbohydrate: Some(20.0),
            fat: None,
            protein: Some(15.0),
        };
        let filtered = filter_food(&table(), &ceilings);

        let names: Vec<_> = filtered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["sayur asem", "tahu", "soto ayam"]);
        assert!(filtered.iter().all(|r| ceilings.admits(r)));
    }

    #[test]
    fn filter_without_ceilings_keeps_everything() {
        let foods = table();
        assert_eq!(filter_food(&foods, &NutrientCeilings::default()), foods);
    }

    #[test]
    fn filter_is_idempotent_and_leaves_input_alone() {
        let foods = table();
        let ceilings = NutrientCeilings {
            fat: Some(5.0),
            ..Default::default()
        };
        let once = filter_food(&foods, &ceilings);
        let twice = filter_food(&once, &ceilings);
        assert_eq!(once, twice);
        assert_eq!(foods, table());
    }

    #[test]
    fn ceilings_are_inclusive() {
        let ceilings = NutrientCeilings {
            calories: Some(201.0),
            ..Default::default()
        };
        assert!(ceilings.admits(&record("tempe", 201.0, 13.5, 7.7, 20.8)));
    }

    #[test]
    fn combinations_have_requested_shape() {
        let foods = table();
        let mut rng = StdRng::seed_from_u64(7);
        let combos = generate_combinations(&foods, 3, 5, &mut rng);

        assert_eq!(combos.len(), 3);
        for combo in &combos {
            assert_eq!(combo.len(), 5);
            assert!(combo.iter().all(|item| foods.contains(item)));

            let mut names: Vec<_> = combo.iter().map(|r| r.name.clone()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), 5, "items repeat within a combination");
        }
    }

    #[test]
    fn combinations_shrink_to_table_size() {
        let foods = table()[..2].to_vec();
        let mut rng = StdRng::seed_from_u64(1);
        let combos = generate_combinations(&foods, 2, 5, &mut rng);
        assert!(combos.iter().all(|c| c.len() == 2));

        let empty = generate_combinations(&[], 2, 5, &mut rng);
        assert_eq!(empty, vec![Vec::new(), Vec::new()]);
    }

    #[test]
    fn same_seed_gives_same_combinations() {
        let foods = table();
        let a = generate_combinations(&foods, 2, 3, &mut StdRng::seed_from_u64(42));
        let b = generate_combinations(&foods, 2, 3, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn loads_tables_and_thresholds_from_disk() {
        let dir = tempfile::tempdir().unwrap();

        let mut nutrition = std::fs::File::create(dir.path().join(NUTRITION_FILE)).unwrap();
        writeln!(nutrition, "id,calories,proteins,fat,carbohydrate,name,image").unwrap();
        writeln!(nutrition, "1,201,20.8,7.7,13.5,Tempe,https://img.example/tempe.jpg").unwrap();
        writeln!(nutrition, "2,80,10.9,4.6,1.6,Tahu,https://img.example/tahu.jpg").unwrap();

        let mut diabetes = std::fs::File::create(dir.path().join(DIABETES_FOOD_FILE)).unwrap();
        writeln!(diabetes, "Food,Calories,Protein,Fat,Carbohydrates").unwrap();
        writeln!(diabetes, "a,150,12,6,30").unwrap();
        writeln!(diabetes, "b,320,8,11,22").unwrap();

        let data = FoodData::load(dir.path()).unwrap();
        assert_eq!(data.foods.len(), 2);
        assert_eq!(
            data.thresholds,
            DiabetesThresholds {
                calories: 320.0,
                carbohydrate: 30.0,
                fat: 11.0,
                protein: 12.0,
            }
        );
        assert_eq!(data.find("  tahu ").map(|r| r.calories), Some(80.0));
        assert!(data.find("burger").is_none());
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(FoodData::load(dir.path()), Err(DataError::Csv { .. })));
    }
}
