//! Field-level validation of the `/predict` body. Every failing field is
//! reported with its own location.

use serde_json::{json, Map, Value};

use crate::models::{Category, FieldError, PredictionRequest};

pub fn validate_request(body: &Value) -> Result<PredictionRequest, Vec<FieldError>> {
    let Some(fields) = body.as_object() else {
        return Err(vec![FieldError {
            kind: "model_attributes_type",
            loc: vec!["body".to_string()],
            msg: "Input should be a valid dictionary or object to extract fields from".to_string(),
            input: body.clone(),
            ctx: None,
        }]);
    };

    let mut errors = Vec::new();
    let calories = float_field(fields, "calories", &mut errors);
    let carbohydrates = float_field(fields, "carbohydrates", &mut errors);
    let sugar = float_field(fields, "sugar", &mut errors);
    let protein = float_field(fields, "protein", &mut errors);
    let category = category_field(fields, &mut errors);
    let servings = int_field(fields, "servings", &mut errors);

    match (calories, carbohydrates, sugar, protein, category, servings) {
        (
            Some(calories),
            Some(carbohydrates),
            Some(sugar),
            Some(protein),
            Some(category),
            Some(servings),
        ) if errors.is_empty() => Ok(PredictionRequest {
            calories,
            carbohydrates,
            sugar,
            protein,
            category,
            servings,
        }),
        _ => Err(errors),
    }
}

fn field_error(kind: &'static str, name: &str, msg: impl Into<String>, input: Value) -> FieldError {
    FieldError {
        kind,
        loc: vec!["body".to_string(), name.to_string()],
        msg: msg.into(),
        input,
        ctx: None,
    }
}

/// Looks up a required field, recording a `missing` error when absent.
fn required<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a Value> {
    let value = fields.get(name);
    if value.is_none() {
        errors.push(field_error(
            "missing",
            name,
            "Field required",
            Value::Object(fields.clone()),
        ));
    }
    value
}

fn float_field(fields: &Map<String, Value>, name: &str, errors: &mut Vec<FieldError>) -> Option<f64> {
    let value = required(fields, name, errors)?;
    match value.as_f64() {
        Some(v) => Some(v),
        None => {
            errors.push(field_error(
                "float_type",
                name,
                "Input should be a valid number",
                value.clone(),
            ));
            None
        }
    }
}

fn int_field(fields: &Map<String, Value>, name: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    let value = required(fields, name, errors)?;
    let Value::Number(number) = value else {
        errors.push(field_error(
            "int_type",
            name,
            "Input should be a valid integer",
            value.clone(),
        ));
        return None;
    };

    if let Some(v) = number.as_i64() {
        return Some(v);
    }

    // u64 beyond i64::MAX, or a float
    let v = number.as_f64().unwrap_or(f64::NAN);
    if v.fract() != 0.0 {
        errors.push(field_error(
            "int_from_float",
            name,
            "Input should be a valid integer, got a number with a fractional part",
            value.clone(),
        ));
        None
    } else if v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        errors.push(field_error(
            "int_parsing_size",
            name,
            "Input should be a valid integer, unable to parse value as an integer",
            value.clone(),
        ));
        None
    }
}

fn category_field(fields: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<Category> {
    let value = required(fields, "category", errors)?;
    if let Some(category) = value.as_str().and_then(Category::from_label) {
        return Some(category);
    }

    let expected = expected_categories();
    errors.push(FieldError {
        ctx: Some(json!({ "expected": expected })),
        ..field_error(
            "enum",
            "category",
            format!("Input should be {expected}"),
            value.clone(),
        )
    });
    None
}

/// `'One Dish Meal', 'Lunch/Snacks', ... or 'Potato'`
fn expected_categories() -> String {
    let quoted: Vec<String> = Category::ALL
        .iter()
        .map(|c| format!("'{}'", c.label()))
        .collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        _ => quoted.concat(),
    }
}
