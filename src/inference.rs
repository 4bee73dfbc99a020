use std::path::Path;

use serde_json::Value;
use tract_onnx::prelude::*;

use crate::error::ModelError;
use crate::features::{FormattedFeatures, FEATURE_WIDTH};

/// A trained traffic classifier. Implementations are shared read-only
/// across every worker, so `predict` takes `&self`.
pub trait TrafficModel: Send + Sync {
    /// Runs the classifier on one row and returns its raw labels.
    fn predict(&self, row: &FormattedFeatures) -> Result<Vec<Value>, ModelError>;
}

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Random forest exported to ONNX and executed with tract.
pub struct OnnxForest {
    plan: Plan,
}

impl OnnxForest {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self, ModelError> {
        let path = model_path.as_ref();
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, FEATURE_WIDTH)),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| ModelError::Load {
                path: path.to_path_buf(),
                message: format!("{e:#}"),
            })?;

        Ok(Self { plan })
    }
}

impl TrafficModel for OnnxForest {
    fn predict(&self, row: &FormattedFeatures) -> Result<Vec<Value>, ModelError> {
        let input: Tensor = row.encode().into();
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ModelError::Inference(format!("{e:#}")))?;

        // Output 0 holds the labels; the probabilities that follow are unused.
        let labels = outputs
            .first()
            .ok_or_else(|| ModelError::Inference("model produced no outputs".to_string()))?;
        labels_to_json(labels)
    }
}

fn labels_to_json(labels: &Tensor) -> Result<Vec<Value>, ModelError> {
    fn collect<T: Datum>(t: &Tensor, f: impl Fn(&T) -> Value) -> Result<Vec<Value>, ModelError> {
        t.as_slice::<T>()
            .map(|values| values.iter().map(f).collect())
            .map_err(|e| ModelError::Inference(format!("{e:#}")))
    }

    match labels.datum_type() {
        DatumType::I64 => collect::<i64>(labels, |v| Value::from(*v)),
        DatumType::I32 => collect::<i32>(labels, |v| Value::from(*v)),
        DatumType::F32 => collect::<f32>(labels, |v| Value::from(f64::from(*v))),
        DatumType::F64 => collect::<f64>(labels, |v| Value::from(*v)),
        DatumType::Bool => collect::<bool>(labels, |v| Value::from(*v)),
        DatumType::String => collect::<String>(labels, |v| Value::from(v.as_str())),
        other => Err(ModelError::Inference(format!(
            "unsupported label type {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use prost::Message;
    use serde_json::json;
    use tract_onnx::pb;
    use tract_onnx::pb::attribute_proto::AttributeType;

    use super::*;
    use crate::features::NUMERIC_WIDTH;
    use crate::models::Category;

    fn ints(name: &str, values: &[i64]) -> pb::AttributeProto {
        pb::AttributeProto {
            name: name.to_string(),
            r#type: AttributeType::Ints as i32,
            ints: values.to_vec(),
            ..Default::default()
        }
    }

    fn floats(name: &str, values: &[f32]) -> pb::AttributeProto {
        pb::AttributeProto {
            name: name.to_string(),
            r#type: AttributeType::Floats as i32,
            floats: values.to_vec(),
            ..Default::default()
        }
    }

    fn strings(name: &str, values: &[&str]) -> pb::AttributeProto {
        pb::AttributeProto {
            name: name.to_string(),
            r#type: AttributeType::Strings as i32,
            strings: values.iter().map(|v| v.as_bytes().to_vec()).collect(),
            ..Default::default()
        }
    }

    fn string(name: &str, value: &str) -> pb::AttributeProto {
        pb::AttributeProto {
            name: name.to_string(),
            r#type: AttributeType::String as i32,
            s: value.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    fn value_info(name: &str) -> pb::ValueInfoProto {
        pb::ValueInfoProto {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// One-split forest: label 1 when the given encoded column is above 0.5,
    /// label 0 otherwise.
    fn stump_on(column: usize) -> Vec<u8> {
        let node = pb::NodeProto {
            input: vec!["input".to_string()],
            output: vec!["label".to_string(), "probabilities".to_string()],
            name: "forest".to_string(),
            op_type: "TreeEnsembleClassifier".to_string(),
            domain: "ai.onnx.ml".to_string(),
            attribute: vec![
                ints("nodes_treeids", &[0, 0, 0]),
                ints("nodes_nodeids", &[0, 1, 2]),
                ints("nodes_featureids", &[column as i64, 0, 0]),
                floats("nodes_values", &[0.5, 0.0, 0.0]),
                strings("nodes_modes", &["BRANCH_LEQ", "LEAF", "LEAF"]),
                ints("nodes_truenodeids", &[1, 0, 0]),
                ints("nodes_falsenodeids", &[2, 0, 0]),
                ints("class_treeids", &[0, 0, 0, 0]),
                ints("class_nodeids", &[1, 1, 2, 2]),
                ints("class_ids", &[0, 1, 0, 1]),
                floats("class_weights", &[1.0, 0.0, 0.0, 1.0]),
                ints("classlabels_int64s", &[0, 1]),
                string("post_transform", "NONE"),
            ],
            ..Default::default()
        };
        let model = pb::ModelProto {
            ir_version: 8,
            opset_import: vec![
                pb::OperatorSetIdProto {
                    domain: String::new(),
                    version: 13,
                    ..Default::default()
                },
                pb::OperatorSetIdProto {
                    domain: "ai.onnx.ml".to_string(),
                    version: 1,
                    ..Default::default()
                },
            ],
            graph: Some(pb::GraphProto {
                name: "traffic".to_string(),
                node: vec![node],
                input: vec![value_info("input")],
                output: vec![value_info("label"), value_info("probabilities")],
                ..Default::default()
            }),
            ..Default::default()
        };
        model.encode_to_vec()
    }

    fn row(category: Category) -> FormattedFeatures {
        FormattedFeatures {
            calories: 35.48,
            carbohydrate: 38.56,
            sugar: 0.66,
            protein: 0.92,
            category,
            servings: 4,
        }
    }

    #[test]
    fn forest_predicts_from_the_encoded_row() {
        let beverages = NUMERIC_WIDTH + Category::Beverages.one_hot_index();
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(&stump_on(beverages)).unwrap();

        let forest = OnnxForest::load(file.path()).unwrap();
        for category in Category::ALL {
            let expected = if category == Category::Beverages { 1 } else { 0 };
            assert_eq!(
                forest.predict(&row(category)).unwrap(),
                vec![json!(expected)],
                "{}",
                category.label()
            );
        }
    }

    #[test]
    fn forest_reads_numeric_columns() {
        // servings sits at column 4
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(&stump_on(4)).unwrap();
        let forest = OnnxForest::load(file.path()).unwrap();

        let mut single = row(Category::Meat);
        single.servings = 0;
        assert_eq!(forest.predict(&single).unwrap(), vec![json!(0)]);
        assert_eq!(forest.predict(&row(Category::Meat)).unwrap(), vec![json!(1)]);
    }

    #[test]
    fn missing_artifact_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("randomforest.onnx");
        match OnnxForest::load(&path) {
            Err(ModelError::Load { path: reported, .. }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("loaded a model from a missing file"),
        }
    }

    #[test]
    fn corrupt_artifact_fails_to_load() {
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"this is not a protobuf model").unwrap();
        assert!(matches!(
            OnnxForest::load(file.path()),
            Err(ModelError::Load { .. })
        ));
    }

    #[test]
    fn integer_labels_become_numbers() {
        let labels = tensor1(&[1i64]);
        assert_eq!(labels_to_json(&labels).unwrap(), vec![json!(1)]);
    }

    #[test]
    fn string_labels_become_strings() {
        let labels = tensor1(&["High".to_string()]);
        assert_eq!(labels_to_json(&labels).unwrap(), vec![json!("High")]);
    }

    #[test]
    fn float_labels_become_numbers() {
        let labels = tensor1(&[0.0f32, 1.0]);
        assert_eq!(labels_to_json(&labels).unwrap(), vec![json!(0.0), json!(1.0)]);
    }

    #[test]
    fn unsupported_label_types_are_inference_errors() {
        let labels = tensor1(&[3u8]);
        assert!(matches!(
            labels_to_json(&labels),
            Err(ModelError::Inference(msg)) if msg.contains("unsupported label type")
        ));
    }
}
