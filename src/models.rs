use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recipe category the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "One Dish Meal")]
    OneDishMeal,
    #[serde(rename = "Lunch/Snacks")]
    LunchSnacks,
    Breakfast,
    Dessert,
    Meat,
    Chicken,
    Pork,
    Beverages,
    Vegetable,
    Potato,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::OneDishMeal,
        Category::LunchSnacks,
        Category::Breakfast,
        Category::Dessert,
        Category::Meat,
        Category::Chicken,
        Category::Pork,
        Category::Beverages,
        Category::Vegetable,
        Category::Potato,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::OneDishMeal => "One Dish Meal",
            Category::LunchSnacks => "Lunch/Snacks",
            Category::Breakfast => "Breakfast",
            Category::Dessert => "Dessert",
            Category::Meat => "Meat",
            Category::Chicken => "Chicken",
            Category::Pork => "Pork",
            Category::Beverages => "Beverages",
            Category::Vegetable => "Vegetable",
            Category::Potato => "Potato",
        }
    }

    /// Exact, case-sensitive lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Column of this category inside the one-hot block of the encoded row.
    /// The fitted encoder sorts its categories lexicographically.
    pub fn one_hot_index(self) -> usize {
        match self {
            Category::Beverages => 0,
            Category::Breakfast => 1,
            Category::Chicken => 2,
            Category::Dessert => 3,
            Category::LunchSnacks => 4,
            Category::Meat => 5,
            Category::OneDishMeal => 6,
            Category::Pork => 7,
            Category::Potato => 8,
            Category::Vegetable => 9,
        }
    }
}

/// A validated `/predict` body.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub calories: f64,
    pub carbohydrates: f64,
    pub sugar: f64,
    pub protein: f64,
    pub category: Category,
    pub servings: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: Vec<Value>,
}

/// One failed field of a request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<String>,
    pub msg: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorBody<'a> {
    pub detail: &'a [FieldError],
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}
