use ndarray::Array2;
use serde::Serialize;

use crate::models::{Category, PredictionRequest};

/// Numeric columns ahead of the one-hot category block.
pub const NUMERIC_WIDTH: usize = 5;
/// Width of the row the model graph expects.
pub const FEATURE_WIDTH: usize = NUMERIC_WIDTH + Category::ALL.len();

/// A request laid out with the column names the forest was trained on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedFeatures {
    pub calories: f64,
    pub carbohydrate: f64,
    pub sugar: f64,
    pub protein: f64,
    pub category: Category,
    pub servings: i64,
}

impl From<&PredictionRequest> for FormattedFeatures {
    fn from(req: &PredictionRequest) -> Self {
        FormattedFeatures {
            calories: req.calories,
            carbohydrate: req.carbohydrates,
            sugar: req.sugar,
            protein: req.protein,
            category: req.category,
            servings: req.servings,
        }
    }
}

impl FormattedFeatures {
    /// `[calories, carbohydrate, sugar, protein, servings, one-hot(category)]`
    pub fn encode(&self) -> Array2<f32> {
        let mut row = Array2::<f32>::zeros((1, FEATURE_WIDTH));
        row[[0, 0]] = self.calories as f32;
        row[[0, 1]] = self.carbohydrate as f32;
        row[[0, 2]] = self.sugar as f32;
        row[[0, 3]] = self.protein as f32;
        row[[0, 4]] = self.servings as f32;
        row[[0, NUMERIC_WIDTH + self.category.one_hot_index()]] = 1.0;
        row
    }
}
