//! Native collection to Postman v2.1 document.
//!
//! Requests Postman cannot express (`websocket`, `sse`, `grpc`) are written as
//! plain requests carrying an `x-courier` extension, which the importer reads
//! back. Preserved extras are merged in last and never override a field the
//! exporter wrote itself.

use courier_domain::collection::{Collection, CollectionItem, Folder};
use courier_domain::environment::VariableMap;
use courier_domain::request::{
    ApiKeyLocation, AuthConfig, BodyKind, HttpRequest, KeyValueList, Protocol, Request,
    RequestBody, RequestKind,
};
use serde_json::{Map, Value, json};

use super::types::{
    CourierExtension, EXTENSION_KEY, SCHEMA_V21, URL_PARTS, base_from_parts,
};

/// Builds the Postman document for a collection.
pub(super) fn encode_collection(collection: &Collection) -> Result<Value, serde_json::Error> {
    let mut extras = collection.extras.clone();

    let mut info = Map::new();
    info.insert("_postman_id".into(), json!(collection.id));
    info.insert("name".into(), json!(collection.name));
    if let Some(description) = &collection.description {
        info.insert("description".into(), json!(description));
    }
    info.insert("schema".into(), json!(SCHEMA_V21));
    if let Some(Value::Object(info_extras)) = extras.remove("info") {
        merge(&mut info, info_extras);
    }

    let mut root = Map::new();
    root.insert("info".into(), Value::Object(info));
    root.insert("item".into(), encode_items(&collection.items)?);
    if !collection.variables.is_empty() {
        root.insert("variable".into(), encode_variables(&collection.variables));
    }
    merge(&mut root, extras);
    Ok(Value::Object(root))
}

fn merge(target: &mut Map<String, Value>, extras: Map<String, Value>) {
    for (key, value) in extras {
        target.entry(key).or_insert(value);
    }
}

fn encode_items(items: &[CollectionItem]) -> Result<Value, serde_json::Error> {
    items
        .iter()
        .map(|item| match item {
            CollectionItem::Folder(folder) => encode_folder(folder),
            CollectionItem::Request(request) => encode_request(request),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn encode_folder(folder: &Folder) -> Result<Value, serde_json::Error> {
    let mut item = Map::new();
    item.insert("name".into(), json!(folder.name));
    item.insert("id".into(), json!(folder.id));
    if let Some(description) = &folder.description {
        item.insert("description".into(), json!(description));
    }
    item.insert("item".into(), encode_items(&folder.items)?);
    merge(&mut item, folder.extras.clone());
    Ok(Value::Object(item))
}

fn encode_request(request: &Request) -> Result<Value, serde_json::Error> {
    let mut extras = request.extras.clone();
    let request_extras = match extras.remove("request") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let mut item = Map::new();
    item.insert("name".into(), json!(request.name));
    item.insert("id".into(), json!(request.id));

    if request.protocol() != Protocol::Http {
        let extension = CourierExtension {
            protocol: request.protocol(),
            grpc: request.as_grpc().cloned(),
        };
        item.insert(EXTENSION_KEY.into(), serde_json::to_value(extension)?);
    }

    let mut events = Vec::new();
    if let Some(source) = &request.pre_request_script {
        events.push(script_event("prerequest", source));
    }
    if let Some(source) = &request.test_script {
        events.push(script_event("test", source));
    }
    if let Some(Value::Array(others)) = extras.remove("event") {
        events.extend(others);
    }
    if !events.is_empty() {
        item.insert("event".into(), Value::Array(events));
    }

    let mut object = match &request.kind {
        RequestKind::Http(http) => http_object(&request.url, http),
        RequestKind::Grpc(_) => stand_in("POST", &request.url),
        RequestKind::WebSocket | RequestKind::Sse => stand_in("GET", &request.url),
    };
    restore_leftovers(&mut object, request_extras, &request.url);
    item.insert("request".into(), Value::Object(object));

    merge(&mut item, extras);
    Ok(Value::Object(item))
}

/// Puts back the request object fields the importer kept.
///
/// Partial header, query and form entries are laid over the written entry at
/// the same position when their keys still match. The structured URL parts
/// are dropped once they no longer describe the URL.
fn restore_leftovers(
    object: &mut Map<String, Value>,
    mut leftovers: Map<String, Value>,
    url: &str,
) {
    if let Some(partials) = leftovers.remove("header")
        && let Some(written) = object.get_mut("header")
    {
        overlay_entries(written, partials);
    }

    if let Some(Value::Object(mut url_extras)) = leftovers.remove("url")
        && let Some(Value::Object(written)) = object.get_mut("url")
    {
        if let Some(partials) = url_extras.remove("query")
            && let Some(entries) = written.get_mut("query")
        {
            overlay_entries(entries, partials);
        }
        let base = url.split_once('?').map_or(url, |(base, _)| base);
        if base_from_parts(&url_extras).as_deref() != Some(base) {
            for part in URL_PARTS {
                url_extras.remove(part);
            }
        }
        merge(written, url_extras);
    }

    if let Some(Value::Object(mut body_extras)) = leftovers.remove("body")
        && let Some(Value::Object(written)) = object.get_mut("body")
    {
        if let Some(partials) = body_extras.remove("urlencoded")
            && let Some(fields) = written.get_mut("urlencoded")
        {
            overlay_entries(fields, partials);
        }
        merge(written, body_extras);
    }

    merge(object, leftovers);
}

fn overlay_entries(written: &mut Value, partials: Value) {
    let (Value::Array(written), Value::Array(partials)) = (written, partials) else {
        return;
    };
    for (entry, partial) in written.iter_mut().zip(partials) {
        if let (Value::Object(entry), Value::Object(partial)) = (entry, partial)
            && entry.get("key") == partial.get("key")
        {
            merge(entry, partial);
        }
    }
}

fn script_event(listen: &str, source: &str) -> Value {
    json!({
        "listen": listen,
        "script": {
            "type": "text/javascript",
            "exec": source.split('\n').collect::<Vec<_>>()
        }
    })
}

/// A request object Postman can show for protocols it does not support.
fn stand_in(method: &str, url: &str) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert("method".into(), json!(method));
    object.insert("url".into(), json!({ "raw": url }));
    object
}

fn http_object(url: &str, http: &HttpRequest) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert("method".into(), json!(http.method.as_str()));
    object.insert("header".into(), pairs(&http.headers));
    object.insert("url".into(), url_object(url, &http.query_params));
    if http.body.kind != BodyKind::None {
        object.insert("body".into(), body_object(&http.body));
    }
    if let Some(auth) = auth_object(&http.auth) {
        object.insert("auth".into(), auth);
    }
    object
}

fn pairs(list: &KeyValueList) -> Value {
    list.all()
        .iter()
        .map(|pair| {
            let mut entry = json!({ "key": pair.key, "value": pair.value });
            if !pair.enabled {
                entry["disabled"] = json!(true);
            }
            entry
        })
        .collect()
}

fn url_object(url: &str, query: &KeyValueList) -> Value {
    let enabled: Vec<String> = query
        .enabled()
        .map(|pair| format!("{}={}", pair.key, pair.value))
        .collect();
    let raw = if enabled.is_empty() {
        url.to_string()
    } else {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}{}", enabled.join("&"))
    };

    json!({ "raw": raw, "query": pairs(query) })
}

fn body_object(body: &RequestBody) -> Value {
    let language = match body.kind {
        BodyKind::FormUrlEncoded => {
            let fields: Vec<Value> = if body.content.is_empty() {
                Vec::new()
            } else {
                body.content
                    .split('&')
                    .map(|part| match part.split_once('=') {
                        Some((key, value)) => json!({ "key": key, "value": value }),
                        None => json!({ "key": part }),
                    })
                    .collect()
            };
            return json!({ "mode": "urlencoded", "urlencoded": fields });
        }
        BodyKind::Json => "json",
        BodyKind::Xml => "xml",
        BodyKind::Html => "html",
        BodyKind::Javascript => "javascript",
        BodyKind::Text | BodyKind::None => "text",
    };
    json!({
        "mode": "raw",
        "raw": body.content,
        "options": { "raw": { "language": language } }
    })
}

fn auth_object(auth: &AuthConfig) -> Option<Value> {
    let param = |key: &str, value: &str| json!({ "key": key, "value": value, "type": "string" });
    match auth {
        AuthConfig::None => None,
        AuthConfig::Bearer { token } => Some(json!({
            "type": "bearer",
            "bearer": [param("token", token)]
        })),
        AuthConfig::Basic { username, password } => Some(json!({
            "type": "basic",
            "basic": [param("username", username), param("password", password)]
        })),
        AuthConfig::ApiKey {
            key,
            value,
            location,
        } => {
            let placement = match location {
                ApiKeyLocation::Header => "header",
                ApiKeyLocation::Query => "query",
            };
            Some(json!({
                "type": "apikey",
                "apikey": [param("key", key), param("value", value), param("in", placement)]
            }))
        }
    }
}

fn encode_variables(variables: &VariableMap) -> Value {
    variables
        .iter()
        .map(|(key, variable)| {
            let mut entry = json!({ "key": key, "value": variable.value });
            if !variable.enabled {
                entry["disabled"] = json!(true);
            }
            entry
        })
        .collect()
}
