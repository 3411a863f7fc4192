//! Firestore 类型化值与普通 JSON 之间的转换
//!
//! REST 接口中每个字段都包装成 `{"stringValue": "..."}` 这样的形式，
//! `integerValue` 以字符串传输。

use serde_json::{json, Map, Number, Value};

/// 普通 JSON 值 → Firestore 类型化值（用于查询过滤条件）
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => {
            let fields: Map<String, Value> =
                map.iter().map(|(k, v)| (k.clone(), encode(v))).collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

/// Firestore 类型化值 → 普通 JSON 值
///
/// 无法识别的类型返回 `None`
pub fn decode(value: &Value) -> Option<Value> {
    let object = value.as_object()?;
    let (kind, inner) = object.iter().next()?;

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool()?),
        "integerValue" => {
            // 字符串形式的 int64
            let i = match inner {
                Value::String(s) => s.parse::<i64>().ok()?,
                other => other.as_i64()?,
            };
            Value::Number(i.into())
        }
        "doubleValue" => match inner {
            Value::Number(n) => Value::Number(n.clone()),
            // NaN / Infinity 以字符串传输，JSON 无法表示
            Value::String(s) => s
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            _ => return None,
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            Value::String(inner.as_str()?.to_string())
        }
        "geoPointValue" => json!({
            "latitude": inner.get("latitude").and_then(Value::as_f64).unwrap_or_default(),
            "longitude": inner.get("longitude").and_then(Value::as_f64).unwrap_or_default(),
        }),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(decode).collect())
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))),
        _ => return None,
    };

    Some(decoded)
}

/// 解码文档的 `fields` 对象
pub fn decode_fields(fields: Option<&Value>) -> Map<String, Value> {
    fields
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(k, v)| decode(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}
