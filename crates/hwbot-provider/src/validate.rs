use hwbot_schema::{HomeworkError, HomeworkRecord};
use serde_json::Value;

pub const HOMEWORKS_KEY: &str = "homeworks";
pub const CURRENT_DATE_KEY: &str = "current_date";

/// Check the shape of an API answer and return its homework list, newest first.
pub fn check_response(body: &Value) -> Result<Vec<HomeworkRecord>, HomeworkError> {
    let Some(map) = body.as_object() else {
        tracing::error!("response is not a mapping: {}", type_name(body));
        return Err(HomeworkError::NotAMapping);
    };

    let Some(homeworks) = map.get(HOMEWORKS_KEY) else {
        tracing::error!("response has no `{HOMEWORKS_KEY}` key");
        return Err(HomeworkError::MissingHomeworks);
    };

    let Some(items) = homeworks.as_array() else {
        tracing::error!("`{HOMEWORKS_KEY}` is {}, expected a list", type_name(homeworks));
        return Err(HomeworkError::HomeworksNotAList);
    };

    Ok(items.iter().map(HomeworkRecord::from_value).collect())
}

/// Server-side timestamp of the answer, if present and integral.
pub fn current_date(body: &Value) -> Option<i64> {
    match body.get(CURRENT_DATE_KEY)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_mapping_with_list() {
        let body = json!({
            "homeworks": [
                {"homework_name": "hw2", "status": "reviewing"},
                {"homework_name": "hw1", "status": "approved"}
            ],
            "current_date": 1000
        });
        let records = check_response(&body).unwrap();
        assert_eq!(
            records,
            vec![
                HomeworkRecord::new("hw2", "reviewing"),
                HomeworkRecord::new("hw1", "approved"),
            ]
        );
    }

    #[test]
    fn accepts_empty_list() {
        assert!(check_response(&json!({"homeworks": []})).unwrap().is_empty());
    }

    #[test]
    fn rejects_non_mapping() {
        for body in [json!([]), json!("homeworks"), json!(null), json!(42)] {
            assert_eq!(check_response(&body), Err(HomeworkError::NotAMapping));
        }
    }

    #[test]
    fn rejects_missing_key() {
        assert_eq!(
            check_response(&json!({"current_date": 1})),
            Err(HomeworkError::MissingHomeworks)
        );
    }

    #[test]
    fn rejects_non_list_homeworks() {
        for value in [json!({}), json!("hw1"), json!(null), json!(3)] {
            assert_eq!(
                check_response(&json!({"homeworks": value})),
                Err(HomeworkError::HomeworksNotAList)
            );
        }
    }

    #[test]
    fn current_date_coercion() {
        assert_eq!(current_date(&json!({"current_date": 1000})), Some(1000));
        assert_eq!(current_date(&json!({"current_date": 1000.0})), Some(1000));
        assert_eq!(current_date(&json!({"current_date": " 1000 "})), Some(1000));
        assert_eq!(current_date(&json!({"current_date": 1000.5})), None);
        assert_eq!(current_date(&json!({"current_date": "soon"})), None);
        assert_eq!(current_date(&json!({"current_date": null})), None);
        assert_eq!(current_date(&json!({"homeworks": []})), None);
        assert_eq!(current_date(&json!([1000])), None);
    }
}
