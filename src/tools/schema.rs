//! Action Schema 注册表：封闭的 Action 种类集合、参数 Schema 与校验
//!
//! Schema 由 schemars 从参数结构体自动生成（内联子 Schema，供 LLM 函数调用使用），
//! 再按 `ActionLimits` 补上行数默认值与上限。`validate` 为纯函数：不访问数据集也不访问网络，
//! 相同输入总是得到相同结果。

use std::str::FromStr;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::core::ActionError;
use crate::dataset::{CategoryClass, Condition, IntentClass, StructuredField, TextField};

/// 模型可请求的 Action 种类（封闭集合，顺序即对外公布顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    GetDatasetOverview,
    SelectSemanticIntent,
    SelectSemanticCategory,
    CountIntent,
    CountCategory,
    SumValues,
    MultiplicationFloat,
    DivisionFloat,
    ShowExamples,
    SummarizeText,
    Finish,
}

impl ActionKind {
    pub const ALL: [ActionKind; 11] = [
        ActionKind::GetDatasetOverview,
        ActionKind::SelectSemanticIntent,
        ActionKind::SelectSemanticCategory,
        ActionKind::CountIntent,
        ActionKind::CountCategory,
        ActionKind::SumValues,
        ActionKind::MultiplicationFloat,
        ActionKind::DivisionFloat,
        ActionKind::ShowExamples,
        ActionKind::SummarizeText,
        ActionKind::Finish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::GetDatasetOverview => "get_dataset_overview",
            ActionKind::SelectSemanticIntent => "select_semantic_intent",
            ActionKind::SelectSemanticCategory => "select_semantic_category",
            ActionKind::CountIntent => "count_intent",
            ActionKind::CountCategory => "count_category",
            ActionKind::SumValues => "sum_values",
            ActionKind::MultiplicationFloat => "multiplication_float",
            ActionKind::DivisionFloat => "division_float",
            ActionKind::ShowExamples => "show_examples",
            ActionKind::SummarizeText => "summarize_text",
            ActionKind::Finish => "finish",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// 工具描述（供 LLM 理解功能）
    pub fn description(&self) -> &'static str {
        match self {
            ActionKind::GetDatasetOverview => {
                "Get name of dataset, total number of rows, field descriptions and unique value counts"
            }
            ActionKind::SelectSemanticIntent => {
                "Uses LLM to select the most appropriate intent based on a text description"
            }
            ActionKind::SelectSemanticCategory => {
                "Uses LLM to select the most appropriate category based on a text description"
            }
            ActionKind::CountIntent => "Count how many records match the selected Intent class",
            ActionKind::CountCategory => "Count how many records match the selected Category class",
            ActionKind::SumValues => "Calculate the sum of a list of numeric values",
            ActionKind::MultiplicationFloat => "Calculate the multiplication of two floats",
            ActionKind::DivisionFloat => "Calculate the division of two floats",
            ActionKind::ShowExamples => {
                "Display N random examples from the dataset with optionally filtered field"
            }
            ActionKind::SummarizeText => {
                "Generate a concise summary based on N randomly selected messages from a specified field"
            }
            ActionKind::Finish => "Indicate that the task is complete and no further steps are needed",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---- 参数结构体：仅用于 Schema 生成 ----

#[allow(dead_code)]
#[derive(JsonSchema)]
struct NoArgs {}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct SemanticQueryArgs {
    /// Free-text description of what the user is looking for
    query: String,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct CountIntentArgs {
    intent_class: IntentClass,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct CountCategoryArgs {
    category_class: CategoryClass,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct SumValuesArgs {
    values: Vec<f64>,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct MultiplicationArgs {
    a: f64,
    b: f64,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct DivisionArgs {
    numerator: f64,
    /// Must not be zero
    denominator: f64,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct SampleArgs {
    /// Text field to return; omit for whole records
    target_field: Option<TextField>,
    /// Structured field to filter on
    condition_field: Option<StructuredField>,
    /// Value of condition_field that rows must have
    condition_field_value: Option<String>,
    /// Number of rows to sample
    #[serde(default)]
    number_rows: u32,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct SummarizeArgs {
    /// Text field whose messages are summarized (default: instruction)
    text_field: Option<TextField>,
    /// Structured field to filter on
    condition_field: Option<StructuredField>,
    /// Value of condition_field that rows must have
    condition_field_value: Option<String>,
    /// Number of messages to sample
    #[serde(default)]
    number_rows: u32,
}

/// 行数类参数的默认值与上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionLimits {
    pub show_examples_default_rows: usize,
    /// 超出即 InvalidArgument
    pub show_examples_max_rows: usize,
    pub summarize_default_rows: usize,
    /// 超出时截断到该值
    pub summarize_max_rows: usize,
}

impl Default for ActionLimits {
    fn default() -> Self {
        Self {
            show_examples_default_rows: 3,
            show_examples_max_rows: 7,
            summarize_default_rows: 10,
            summarize_max_rows: 100,
        }
    }
}

/// 一个 Action 种类的对外描述
#[derive(Debug, Clone, Serialize)]
pub struct ActionSchema {
    pub kind: ActionKind,
    pub description: &'static str,
    /// JSON Schema（object）
    pub parameters: Value,
}

impl ActionSchema {
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// 抽样类 Action 的参数（show_examples / summarize_text）
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSpec {
    pub target_field: Option<TextField>,
    pub condition: Option<Condition>,
    pub number_rows: usize,
}

impl SampleSpec {
    pub fn describe_condition(&self) -> String {
        self.condition
            .as_ref()
            .map(|c| c.describe())
            .unwrap_or_else(|| "all rows".to_string())
    }
}

/// 校验后的 Action 请求：每个变体只携带该种类合法的字段
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    GetDatasetOverview,
    SelectSemanticIntent { query: String },
    SelectSemanticCategory { query: String },
    CountIntent { intent_class: IntentClass },
    CountCategory { category_class: CategoryClass },
    SumValues { values: Vec<f64> },
    MultiplicationFloat { a: f64, b: f64 },
    DivisionFloat { numerator: f64, denominator: f64 },
    ShowExamples(SampleSpec),
    SummarizeText(SampleSpec),
    Finish,
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::GetDatasetOverview => ActionKind::GetDatasetOverview,
            ActionRequest::SelectSemanticIntent { .. } => ActionKind::SelectSemanticIntent,
            ActionRequest::SelectSemanticCategory { .. } => ActionKind::SelectSemanticCategory,
            ActionRequest::CountIntent { .. } => ActionKind::CountIntent,
            ActionRequest::CountCategory { .. } => ActionKind::CountCategory,
            ActionRequest::SumValues { .. } => ActionKind::SumValues,
            ActionRequest::MultiplicationFloat { .. } => ActionKind::MultiplicationFloat,
            ActionRequest::DivisionFloat { .. } => ActionKind::DivisionFloat,
            ActionRequest::ShowExamples(_) => ActionKind::ShowExamples,
            ActionRequest::SummarizeText(_) => ActionKind::SummarizeText,
            ActionRequest::Finish => ActionKind::Finish,
        }
    }
}

/// 注册表：启动时构建一次，之后只读
#[derive(Debug, Clone)]
pub struct ActionSchemaRegistry {
    limits: ActionLimits,
    schemas: Vec<ActionSchema>,
}

impl Default for ActionSchemaRegistry {
    fn default() -> Self {
        Self::new(ActionLimits::default())
    }
}

impl ActionSchemaRegistry {
    pub fn new(limits: ActionLimits) -> Self {
        let schemas = ActionKind::ALL
            .iter()
            .map(|kind| ActionSchema {
                kind: *kind,
                description: kind.description(),
                parameters: parameters_for(*kind, &limits),
            })
            .collect();
        Self { limits, schemas }
    }

    pub fn limits(&self) -> &ActionLimits {
        &self.limits
    }

    /// 按公布顺序返回 (kind, 参数 Schema)
    pub fn list_action_kinds(&self) -> &[ActionSchema] {
        &self.schemas
    }

    /// 校验模型给出的原始参数文本（JSON）；空文本视为无参数
    pub fn validate_raw(&self, kind: &str, arguments: &str) -> Result<ActionRequest, ActionError> {
        let kind_enum = ActionKind::from_name(kind)
            .ok_or_else(|| ActionError::UnknownAction(kind.to_string()))?;
        let value = if arguments.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(arguments).map_err(|e| {
                ActionError::invalid(kind_enum.as_str(), "arguments", format!("not valid JSON: {e}"))
            })?
        };
        self.validate(kind, &value)
    }

    /// 将 (kind, 原始参数) 校验为类型化请求
    pub fn validate(&self, kind: &str, raw: &Value) -> Result<ActionRequest, ActionError> {
        let kind = ActionKind::from_name(kind)
            .ok_or_else(|| ActionError::UnknownAction(kind.to_string()))?;
        let empty = Map::new();
        let map = match raw {
            Value::Object(m) => m,
            Value::Null => &empty,
            other => {
                return Err(ActionError::invalid(
                    kind.as_str(),
                    "arguments",
                    format!("expected a JSON object, got {}", json_type(other)),
                ))
            }
        };
        let args = Args {
            kind: kind.as_str(),
            map,
        };

        let request = match kind {
            ActionKind::GetDatasetOverview => ActionRequest::GetDatasetOverview,
            ActionKind::SelectSemanticIntent => ActionRequest::SelectSemanticIntent {
                query: args.text("query")?,
            },
            ActionKind::SelectSemanticCategory => ActionRequest::SelectSemanticCategory {
                query: args.text("query")?,
            },
            ActionKind::CountIntent => ActionRequest::CountIntent {
                intent_class: args.closed("intent_class")?,
            },
            ActionKind::CountCategory => ActionRequest::CountCategory {
                category_class: args.closed("category_class")?,
            },
            ActionKind::SumValues => ActionRequest::SumValues {
                values: args.numbers("values")?,
            },
            ActionKind::MultiplicationFloat => ActionRequest::MultiplicationFloat {
                a: args.number("a")?,
                b: args.number("b")?,
            },
            ActionKind::DivisionFloat => {
                let numerator = args.number("numerator")?;
                let denominator = args.number("denominator")?;
                if denominator == 0.0 {
                    return Err(ActionError::constraint(
                        kind.as_str(),
                        "denominator must not be zero",
                    ));
                }
                ActionRequest::DivisionFloat {
                    numerator,
                    denominator,
                }
            }
            ActionKind::ShowExamples => {
                let number_rows = args.row_count(
                    self.limits.show_examples_default_rows,
                    self.limits.show_examples_max_rows,
                    RowOverflow::Reject,
                )?;
                ActionRequest::ShowExamples(args.sample_spec("target_field", number_rows)?)
            }
            ActionKind::SummarizeText => {
                let number_rows = args.row_count(
                    self.limits.summarize_default_rows,
                    self.limits.summarize_max_rows,
                    RowOverflow::Cap,
                )?;
                ActionRequest::SummarizeText(args.sample_spec("text_field", number_rows)?)
            }
            ActionKind::Finish => ActionRequest::Finish,
        };
        Ok(request)
    }
}

/// 行数超上限时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOverflow {
    Reject,
    Cap,
}

/// 单次校验的参数视图
struct Args<'a> {
    kind: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &str) -> Result<&'a Value, ActionError> {
        self.get(field)
            .ok_or_else(|| ActionError::missing(self.kind, field))
    }

    fn text(&self, field: &str) -> Result<String, ActionError> {
        self.required(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ActionError::invalid(self.kind, field, "expected a string"))
    }

    fn number(&self, field: &str) -> Result<f64, ActionError> {
        self.required(field)?
            .as_f64()
            .ok_or_else(|| ActionError::invalid(self.kind, field, "expected a number"))
    }

    fn numbers(&self, field: &str) -> Result<Vec<f64>, ActionError> {
        let items = self
            .required(field)?
            .as_array()
            .ok_or_else(|| ActionError::invalid(self.kind, field, "expected an array of numbers"))?;
        items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_f64().ok_or_else(|| {
                    ActionError::invalid(self.kind, field, format!("element {i} is not a number"))
                })
            })
            .collect()
    }

    fn closed<T: FromStr<Err = String>>(&self, field: &str) -> Result<T, ActionError> {
        let raw = self.required(field)?;
        parse_closed(self.kind, field, raw)
    }

    fn optional_closed<T: FromStr<Err = String>>(&self, field: &str) -> Result<Option<T>, ActionError> {
        self.get(field)
            .map(|raw| parse_closed(self.kind, field, raw))
            .transpose()
    }

    fn row_count(
        &self,
        default: usize,
        max: usize,
        overflow: RowOverflow,
    ) -> Result<usize, ActionError> {
        const FIELD: &str = "number_rows";
        let Some(raw) = self.get(FIELD) else {
            return Ok(default);
        };
        let n = raw
            .as_i64()
            .or_else(|| raw.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| ActionError::invalid(self.kind, FIELD, "expected an integer"))?;
        if n < 1 {
            return Err(ActionError::invalid(self.kind, FIELD, "must be at least 1"));
        }
        let n = n as usize;
        if n > max {
            return match overflow {
                RowOverflow::Reject => Err(ActionError::invalid(
                    self.kind,
                    FIELD,
                    format!("must be at most {max}, got {n}"),
                )),
                RowOverflow::Cap => {
                    tracing::debug!(kind = self.kind, requested = n, cap = max, "number_rows capped");
                    Ok(max)
                }
            };
        }
        Ok(n)
    }

    /// 先做各字段的类型 / 取值域检查，再检查字段间约束
    fn sample_spec(&self, text_key: &str, number_rows: usize) -> Result<SampleSpec, ActionError> {
        let target_field = self.optional_closed::<TextField>(text_key)?;
        let condition_field = self.optional_closed::<StructuredField>("condition_field")?;
        let condition_value = match self.get("condition_field_value") {
            Some(v) => {
                let s = v.as_str().ok_or_else(|| {
                    ActionError::invalid(self.kind, "condition_field_value", "expected a string")
                })?;
                if !is_condition_value(s) {
                    return Err(ActionError::invalid(
                        self.kind,
                        "condition_field_value",
                        format!("'{s}' is not a known category or intent"),
                    ));
                }
                Some(s)
            }
            None => None,
        };

        let condition = match (condition_field, condition_value) {
            (None, None) => None,
            (Some(field), Some(value)) => Some(
                Condition::parse(field, value)
                    .map_err(|e| ActionError::constraint(self.kind, e))?,
            ),
            (Some(field), None) => {
                return Err(ActionError::constraint(
                    self.kind,
                    format!("condition_field '{field}' requires condition_field_value"),
                ))
            }
            (None, Some(_)) => {
                return Err(ActionError::constraint(
                    self.kind,
                    "condition_field_value requires condition_field",
                ))
            }
        };

        Ok(SampleSpec {
            target_field,
            condition,
            number_rows,
        })
    }
}

fn parse_closed<T: FromStr<Err = String>>(
    kind: &str,
    field: &str,
    raw: &Value,
) -> Result<T, ActionError> {
    let s = raw
        .as_str()
        .ok_or_else(|| ActionError::invalid(kind, field, "expected a string"))?;
    s.parse::<T>()
        .map_err(|e| ActionError::invalid(kind, field, e))
}

fn is_condition_value(s: &str) -> bool {
    s.parse::<CategoryClass>().is_ok() || s.parse::<IntentClass>().is_ok()
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 生成内联的参数 Schema，去掉 `$schema` / `title`
fn schema_of<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.option_add_null_type = false;
        s.meta_schema = None;
    });
    let root = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(root).unwrap_or_else(|_| json!({ "type": "object" }));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("title");
        obj.remove("definitions");
        obj.entry("properties").or_insert_with(|| json!({}));
    }
    value
}

fn parameters_for(kind: ActionKind, limits: &ActionLimits) -> Value {
    match kind {
        ActionKind::GetDatasetOverview | ActionKind::Finish => schema_of::<NoArgs>(),
        ActionKind::SelectSemanticIntent | ActionKind::SelectSemanticCategory => {
            schema_of::<SemanticQueryArgs>()
        }
        ActionKind::CountIntent => schema_of::<CountIntentArgs>(),
        ActionKind::CountCategory => schema_of::<CountCategoryArgs>(),
        ActionKind::SumValues => schema_of::<SumValuesArgs>(),
        ActionKind::MultiplicationFloat => schema_of::<MultiplicationArgs>(),
        ActionKind::DivisionFloat => schema_of::<DivisionArgs>(),
        ActionKind::ShowExamples => sample_schema(
            schema_of::<SampleArgs>(),
            limits.show_examples_default_rows,
            limits.show_examples_max_rows,
        ),
        ActionKind::SummarizeText => sample_schema(
            schema_of::<SummarizeArgs>(),
            limits.summarize_default_rows,
            limits.summarize_max_rows,
        ),
    }
}

fn sample_schema(mut schema: Value, default_rows: usize, max_rows: usize) -> Value {
    if let Some(props) = schema.get_mut("properties").and_then(Value::as_object_mut) {
        if let Some(rows) = props.get_mut("number_rows").and_then(Value::as_object_mut) {
            rows.insert("default".into(), json!(default_rows));
            rows.insert("minimum".into(), json!(1));
            rows.insert("maximum".into(), json!(max_rows));
        }
        let values: Vec<&str> = CategoryClass::values()
            .into_iter()
            .chain(IntentClass::values())
            .collect();
        if let Some(value) = props
            .get_mut("condition_field_value")
            .and_then(Value::as_object_mut)
        {
            value.insert("enum".into(), json!(values));
        }
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ActionSchemaRegistry {
        ActionSchemaRegistry::default()
    }

    #[test]
    fn test_list_action_kinds_order() {
        let reg = registry();
        let names: Vec<&str> = reg.list_action_kinds().iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "get_dataset_overview");
        assert_eq!(names[10], "finish");
    }

    #[test]
    fn test_schema_shapes() {
        let reg = registry();
        let schemas = reg.list_action_kinds();
        let count_intent = &schemas[3].parameters;
        assert_eq!(count_intent["type"], "object");
        assert_eq!(count_intent["required"][0], "intent_class");
        assert_eq!(
            count_intent["properties"]["intent_class"]["enum"]
                .as_array()
                .map(Vec::len),
            Some(27)
        );
        assert!(count_intent.get("$schema").is_none());

        let overview = &schemas[0].parameters;
        assert!(overview["properties"].is_object());
    }

    #[test]
    fn test_sample_schema_limits() {
        let reg = registry();
        let show = &reg.list_action_kinds()[8].parameters;
        assert_eq!(show["properties"]["number_rows"]["maximum"], 7);
        assert_eq!(show["properties"]["number_rows"]["default"], 3);
        let required = show["required"].as_array().cloned().unwrap_or_default();
        assert!(!required.contains(&json!("number_rows")));
        assert_eq!(
            show["properties"]["condition_field_value"]["enum"]
                .as_array()
                .map(Vec::len),
            Some(38)
        );

        let summarize = &reg.list_action_kinds()[9].parameters;
        assert_eq!(summarize["properties"]["number_rows"]["maximum"], 100);
        assert!(summarize["properties"]["text_field"].is_object());
    }

    #[test]
    fn test_unknown_action() {
        let err = registry().validate("drop_table", &json!({})).unwrap_err();
        assert_eq!(err, ActionError::UnknownAction("drop_table".into()));
    }

    #[test]
    fn test_missing_field() {
        let err = registry().validate("count_intent", &json!({})).unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::MissingField);
        let err = registry()
            .validate("count_intent", &json!({ "intent_class": null }))
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::MissingField);
    }

    #[test]
    fn test_enum_out_of_domain() {
        let err = registry()
            .validate("count_category", &json!({ "category_class": "WEATHER" }))
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_wrong_type() {
        let err = registry()
            .validate("multiplication_float", &json!({ "a": "two", "b": 3 }))
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::InvalidArgument);
        let err = registry()
            .validate("sum_values", &json!({ "values": [1, "x"] }))
            .unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn test_division_by_zero_is_constraint_violation() {
        let err = registry()
            .validate("division_float", &json!({ "numerator": 10, "denominator": 0 }))
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::ConstraintViolation);
    }

    #[test]
    fn test_valid_requests() {
        let reg = registry();
        assert_eq!(
            reg.validate("count_category", &json!({ "category_class": "CANCEL" })),
            Ok(ActionRequest::CountCategory {
                category_class: CategoryClass::Cancel
            })
        );
        assert_eq!(
            reg.validate("division_float", &json!({ "numerator": 1, "denominator": 4 })),
            Ok(ActionRequest::DivisionFloat {
                numerator: 1.0,
                denominator: 4.0
            })
        );
        assert_eq!(
            reg.validate("get_dataset_overview", &Value::Null),
            Ok(ActionRequest::GetDatasetOverview)
        );
    }

    #[test]
    fn test_show_examples_rows() {
        let reg = registry();
        let err = reg
            .validate("show_examples", &json!({ "number_rows": 9 }))
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::InvalidArgument);

        match reg.validate("show_examples", &json!({})).unwrap() {
            ActionRequest::ShowExamples(spec) => {
                assert_eq!(spec.number_rows, 3);
                assert!(spec.condition.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = reg
            .validate("show_examples", &json!({ "number_rows": 0 }))
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_summarize_rows_capped() {
        match registry()
            .validate("summarize_text", &json!({ "number_rows": 500, "text_field": "response" }))
            .unwrap()
        {
            ActionRequest::SummarizeText(spec) => {
                assert_eq!(spec.number_rows, 100);
                assert_eq!(spec.target_field, Some(TextField::Response));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_condition_rules() {
        let reg = registry();
        let ok = reg
            .validate(
                "show_examples",
                &json!({
                    "target_field": "response",
                    "condition_field": "intent",
                    "condition_field_value": "get_refund",
                    "number_rows": 2
                }),
            )
            .unwrap();
        assert_eq!(
            ok,
            ActionRequest::ShowExamples(SampleSpec {
                target_field: Some(TextField::Response),
                condition: Some(Condition::Intent(IntentClass::GetRefund)),
                number_rows: 2,
            })
        );

        // 取值属于另一个字段的取值域
        let err = reg
            .validate(
                "show_examples",
                &json!({ "condition_field": "category", "condition_field_value": "get_refund" }),
            )
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::ConstraintViolation);

        let err = reg
            .validate("show_examples", &json!({ "condition_field_value": "CANCEL" }))
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::ConstraintViolation);

        let err = reg
            .validate(
                "show_examples",
                &json!({ "condition_field": "category", "condition_field_value": "NOPE" }),
            )
            .unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_validate_raw() {
        let reg = registry();
        assert_eq!(reg.validate_raw("finish", ""), Ok(ActionRequest::Finish));
        let err = reg.validate_raw("sum_values", "{not json").unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::InvalidArgument);
        let err = reg.validate_raw("sum_values", "[1,2]").unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
        let err = reg.validate_raw("nope", "{").unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::UnknownAction);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let reg = registry();
        let args = json!({ "numerator": 10, "denominator": 0 });
        let first = reg.validate("division_float", &args).unwrap_err();
        for _ in 0..5 {
            assert_eq!(reg.validate("division_float", &args).unwrap_err(), first);
        }
    }
}
