use bson::Bson;
use chrono::SecondsFormat;

/// Transform a BSON document into self-describing JSON for export.
///
/// Identifier and date values become explicit tagged objects so the dump
/// is losslessly re-importable: ObjectIds as `{"$oid": <hex>}`, datetimes
/// as `{"$date": <ISO-8601 with milliseconds>}`. Arrays and documents are
/// transformed recursively; plain scalars pass through unchanged.
pub fn transform_document(doc: &bson::Document) -> serde_json::Value {
    let entries = doc
        .iter()
        .map(|(key, value)| (key.clone(), transform_bson(value)))
        .collect();
    serde_json::Value::Object(entries)
}

fn transform_bson(value: &Bson) -> serde_json::Value {
    match value {
        Bson::ObjectId(oid) => serde_json::json!({ "$oid": oid.to_hex() }),
        Bson::DateTime(dt) => serde_json::json!({
            "$date": dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true)
        }),
        Bson::Array(items) => {
            serde_json::Value::Array(items.iter().map(transform_bson).collect())
        }
        Bson::Document(doc) => transform_document(doc),
        Bson::String(s) => serde_json::Value::String(s.clone()),
        Bson::Boolean(b) => serde_json::Value::Bool(*b),
        Bson::Int32(n) => serde_json::Value::Number((*n).into()),
        Bson::Int64(n) => serde_json::Value::Number((*n).into()),
        Bson::Double(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Bson::Null => serde_json::Value::Null,
        // Exotic variants (Decimal128, Binary, Regex, ...) keep the
        // driver's relaxed extended-JSON form.
        other => other.clone().into_relaxed_extjson(),
    }
}
