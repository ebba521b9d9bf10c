//! Postman v2.1 document to native collection.
//!
//! The document shape is validated up front and any problem there aborts the
//! import. After that each item is converted on its own: a malformed item is
//! skipped with an error-level warning and its siblings still import.

use courier_application::{CodecError, ImportReport, ImportWarning};
use courier_domain::collection::{Collection, CollectionItem, Folder};
use courier_domain::environment::{Variable, VariableMap};
use courier_domain::request::{
    ApiKeyLocation, AuthConfig, BodyKind, HttpMethod, HttpRequest, KeyValue, KeyValueList,
    Protocol, Request, RequestBody,
};
use courier_domain::settings::ImportLimits;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::codec::check_size;

use super::types::{
    CourierExtension, PostmanAuth, PostmanAuthParam, PostmanBody, PostmanEvent, PostmanInfo,
    PostmanItem, PostmanQueryParam, PostmanRequest, PostmanUrl, PostmanUrlStructured,
    PostmanVariable, base_from_parts, is_v21_schema, value_text,
};

/// Decodes a Postman v2.1 collection.
pub(super) fn decode_collection(
    bytes: &[u8],
    limits: &ImportLimits,
) -> Result<ImportReport, CodecError> {
    check_size(bytes, limits)?;
    let document: Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let Value::Object(mut root) = document else {
        return Err(CodecError::invalid("collection", "must be a JSON object"));
    };

    let info = take_info(&mut root)?;
    let Some(Value::Array(items)) = root.remove("item") else {
        return Err(CodecError::invalid("item", "must be an array"));
    };
    let variables = match root.remove("variable") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(variables)) => variables,
        Some(_) => return Err(CodecError::invalid("variable", "must be an array")),
    };

    let mut collection = Collection::new(info.name);
    if let Some(id) = info.postman_id {
        collection.id = id;
    }

    let mut info_extras = info.extras;
    match info.description {
        None | Some(Value::Null) => {}
        Some(Value::String(text)) => collection.description = Some(text),
        Some(other) => {
            info_extras.insert("description".to_string(), other);
        }
    }

    let mut importer = Importer::new(limits);
    collection.variables = importer.variables(variables, &collection.name);
    collection.items = importer.items(items, &collection.name, 0);
    importer.finish(&collection.name);

    if !info_extras.is_empty() {
        collection
            .extras
            .insert("info".to_string(), Value::Object(info_extras));
    }
    collection.extras.extend(root);

    Ok(ImportReport {
        collection,
        warnings: importer.warnings,
    })
}

fn take_info(root: &mut Map<String, Value>) -> Result<PostmanInfo, CodecError> {
    let info = root
        .remove("info")
        .ok_or_else(|| CodecError::invalid("info", "is missing"))?;
    let schema = match info.get("schema") {
        Some(Value::String(schema)) => schema.clone(),
        Some(_) => return Err(CodecError::invalid("info.schema", "must be a string")),
        None if info.is_object() => return Err(CodecError::invalid("info.schema", "is missing")),
        None => return Err(CodecError::invalid("info", "must be an object")),
    };
    if !is_v21_schema(&schema) {
        return Err(CodecError::UnsupportedSchema(schema));
    }
    serde_json::from_value(info).map_err(|e| CodecError::invalid("info", e.to_string()))
}

/// Per-import state: item limit and collected warnings.
struct Importer<'a> {
    limits: &'a ImportLimits,
    seen: usize,
    over_limit: usize,
    warnings: Vec<ImportWarning>,
}

impl<'a> Importer<'a> {
    const fn new(limits: &'a ImportLimits) -> Self {
        Self {
            limits,
            seen: 0,
            over_limit: 0,
            warnings: Vec::new(),
        }
    }

    fn skip(&mut self, path: &str, message: impl Into<String>) {
        let warning = ImportWarning::error(path, message);
        debug!(%warning, "skipping item");
        self.warnings.push(warning);
    }

    fn finish(&mut self, root: &str) {
        if self.over_limit > 0 {
            self.skip(
                root,
                format!(
                    "collection has more than {} items; {} skipped",
                    self.limits.max_items, self.over_limit
                ),
            );
        }
    }

    fn variables(&mut self, values: Vec<Value>, root: &str) -> VariableMap {
        let mut variables = VariableMap::new();
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<PostmanVariable>(value) {
                Ok(var) => {
                    let text = value_text(var.value.as_ref());
                    let variable = if var.disabled {
                        Variable::disabled(text)
                    } else {
                        Variable::new(text)
                    };
                    variables.insert(var.key, variable);
                }
                Err(e) => self.skip(
                    &format!("{root}/variable[{index}]"),
                    format!("malformed variable: {e}"),
                ),
            }
        }
        variables
    }

    fn items(&mut self, values: Vec<Value>, parent: &str, depth: usize) -> Vec<CollectionItem> {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| self.item(value, parent, index, depth))
            .collect()
    }

    fn item(
        &mut self,
        value: Value,
        parent: &str,
        index: usize,
        depth: usize,
    ) -> Option<CollectionItem> {
        if self.seen >= self.limits.max_items {
            self.over_limit += 1;
            return None;
        }
        self.seen += 1;

        let label = value
            .get("name")
            .and_then(Value::as_str)
            .map_or_else(|| format!("item[{index}]"), str::to_string);
        let path = format!("{parent}/{label}");

        let item: PostmanItem = match serde_json::from_value(value) {
            Ok(item) => item,
            Err(e) => {
                self.skip(&path, format!("malformed item: {e}"));
                return None;
            }
        };

        if item.item.is_some() {
            if depth + 1 > self.limits.max_depth {
                self.skip(
                    &path,
                    format!("folder nested deeper than {} levels", self.limits.max_depth),
                );
                return None;
            }
            return Some(CollectionItem::Folder(self.folder(item, &path, depth)));
        }

        if item.request.is_none() && item.extension.is_none() {
            self.skip(&path, "item has neither 'request' nor 'item'");
            return None;
        }

        match self.request(item, &path) {
            Ok(request) => Some(CollectionItem::Request(request)),
            Err(message) => {
                self.skip(&path, message);
                None
            }
        }
    }

    fn folder(&mut self, item: PostmanItem, path: &str, depth: usize) -> Folder {
        let PostmanItem {
            name,
            id,
            description,
            item: children,
            event,
            mut extras,
            ..
        } = item;

        let mut folder = Folder::new(name.unwrap_or_else(|| "Untitled Folder".to_string()));
        if let Some(id) = id {
            folder.id = id;
        }
        match description {
            None | Some(Value::Null) => {}
            Some(Value::String(text)) => folder.description = Some(text),
            Some(other) => {
                extras.insert("description".to_string(), other);
            }
        }
        if !event.is_empty() {
            extras.insert("event".to_string(), Value::Array(event));
        }
        folder.extras = extras;
        folder.items = self.items(children.unwrap_or_default(), path, depth + 1);
        folder
    }

    fn request(&mut self, item: PostmanItem, path: &str) -> Result<Request, String> {
        let PostmanItem {
            name,
            id,
            description,
            request,
            event,
            extension,
            mut extras,
            ..
        } = item;
        let name = name.unwrap_or_else(|| "Untitled Request".to_string());

        let postman = match request {
            None | Some(Value::Null) => PostmanRequest::default(),
            Some(Value::String(url)) => PostmanRequest {
                url: Some(PostmanUrl::Simple(url)),
                ..PostmanRequest::default()
            },
            Some(value) => serde_json::from_value::<PostmanRequest>(value)
                .map_err(|e| format!("malformed request: {e}"))?,
        };

        let mut request = match extension.filter(|ext| ext.protocol != Protocol::Http) {
            Some(ext) => {
                let url = self.raw_url(postman.url.as_ref(), path);
                extension_request(ext, name, url)?
            }
            None => {
                let (url, query) = self.split_url(postman.url.as_ref(), path);
                let http = self.http_part(&postman, query, path)?;
                Request::http_with(name, url, http)
            }
        };
        if let Some(id) = id {
            request.id = id;
        }

        let mut unrecognized = Vec::new();
        for raw in event {
            match serde_json::from_value::<PostmanEvent>(raw.clone()) {
                Ok(PostmanEvent {
                    listen,
                    script: Some(script),
                }) if listen == "prerequest" || listen == "test" => {
                    let source = script.source();
                    if listen == "prerequest" {
                        request.pre_request_script = source;
                    } else {
                        request.test_script = source;
                    }
                }
                _ => unrecognized.push(raw),
            }
        }

        if let Some(description) = description.filter(|d| !d.is_null()) {
            extras.insert("description".to_string(), description);
        }
        if !unrecognized.is_empty() {
            extras.insert("event".to_string(), Value::Array(unrecognized));
        }
        let leftovers = leftover_fields(postman);
        if !leftovers.is_empty() {
            extras.insert("request".to_string(), Value::Object(leftovers));
        }
        request.extras = extras;
        Ok(request)
    }

    fn http_part(
        &mut self,
        postman: &PostmanRequest,
        query_params: KeyValueList,
        path: &str,
    ) -> Result<HttpRequest, String> {
        let method = match postman.method.as_deref() {
            None => HttpMethod::Get,
            Some(method) => method
                .parse::<HttpMethod>()
                .map_err(|_| format!("unsupported method '{method}'"))?,
        };

        let mut headers = KeyValueList::new();
        for header in &postman.header {
            headers.add(pair(&header.key, &header.value, header.disabled));
        }

        Ok(HttpRequest {
            method,
            headers,
            query_params,
            body: postman
                .body
                .as_ref()
                .map(|body| self.body(body, path))
                .unwrap_or_default(),
            auth: postman
                .auth
                .as_ref()
                .map(|auth| self.auth(auth, path))
                .unwrap_or_default(),
        })
    }

    fn body(&mut self, body: &PostmanBody, path: &str) -> RequestBody {
        if body.disabled {
            self.warnings
                .push(ImportWarning::info(path, "disabled body was not imported"));
            return RequestBody::none();
        }
        match body.mode.as_deref() {
            None => RequestBody::none(),
            Some("raw") => {
                let content = body.raw.clone().unwrap_or_default();
                let language = body
                    .options
                    .as_ref()
                    .and_then(|o| o.raw.as_ref())
                    .and_then(|r| r.language.as_deref());
                RequestBody::new(raw_kind(language, &content), content)
            }
            Some("urlencoded") => {
                let mut fields = Vec::new();
                for param in &body.urlencoded {
                    if param.disabled {
                        self.warnings.push(ImportWarning::info(
                            path,
                            format!("disabled form field '{}' was dropped", param.key),
                        ));
                    } else {
                        fields.push(match &param.value {
                            Some(value) => format!("{}={value}", param.key),
                            None => param.key.clone(),
                        });
                    }
                }
                RequestBody::new(BodyKind::FormUrlEncoded, fields.join("&"))
            }
            Some("graphql") => {
                let graphql = body.graphql.as_ref();
                let query = graphql.map(|g| g.query.clone()).unwrap_or_default();
                let variables = match graphql.and_then(|g| g.variables.clone()) {
                    Some(Value::String(text)) => {
                        serde_json::from_str(&text).unwrap_or(Value::String(text))
                    }
                    Some(value) => value,
                    None => Value::Object(Map::new()),
                };
                self.warnings.push(ImportWarning::info(
                    path,
                    "GraphQL body converted to a JSON body",
                ));
                let content = json!({ "query": query, "variables": variables });
                RequestBody::json(
                    serde_json::to_string_pretty(&content).unwrap_or_else(|_| content.to_string()),
                )
            }
            Some(mode) => {
                self.warnings.push(ImportWarning::warning(
                    path,
                    format!("body mode '{mode}' is not supported; body dropped"),
                ));
                RequestBody::none()
            }
        }
    }

    /// The URL text of a request. A structured URL without `raw` is rebuilt
    /// from its parts, with its query list appended.
    fn raw_url(&mut self, url: Option<&PostmanUrl>, path: &str) -> String {
        match url {
            None => String::new(),
            Some(PostmanUrl::Simple(raw)) => raw.clone(),
            Some(PostmanUrl::Structured(url)) => match &url.raw {
                Some(raw) => raw.clone(),
                None => {
                    let base = self.base_url(url, path);
                    let query = query_string(url);
                    if query.is_empty() {
                        base
                    } else {
                        format!("{base}?{query}")
                    }
                }
            },
        }
    }

    fn base_url(&mut self, url: &PostmanUrlStructured, path: &str) -> String {
        base_from_parts(&url.extras).unwrap_or_else(|| {
            self.warnings.push(ImportWarning::warning(
                path,
                "url has neither 'raw' nor 'host'; imported as an empty URL",
            ));
            String::new()
        })
    }

    /// Splits a URL into its base and query parameters.
    ///
    /// A structured `query` list is authoritative when present, since only it
    /// carries disabled entries. Only the suffix that list produces is cut
    /// from `raw`; any other inline query stays in the URL.
    fn split_url(&mut self, url: Option<&PostmanUrl>, path: &str) -> (String, KeyValueList) {
        let structured = match url {
            Some(PostmanUrl::Structured(url)) => url,
            other => return split_query_string(&self.raw_url(other, path)),
        };
        let Some(list) = &structured.query else {
            return split_query_string(&self.raw_url(url, path));
        };

        let mut params = KeyValueList::new();
        for param in list {
            params.add(pair(
                param.key.as_deref().unwrap_or_default(),
                param.value.as_deref().unwrap_or_default(),
                param.disabled,
            ));
        }
        let base = match &structured.raw {
            Some(raw) => strip_query_suffix(raw, &query_string(structured)),
            None => self.base_url(structured, path),
        };
        (base, params)
    }

    fn auth(&mut self, auth: &PostmanAuth, path: &str) -> AuthConfig {
        let param = |params: &[PostmanAuthParam], key: &str| {
            PostmanAuth::get_param(params, key).unwrap_or_default()
        };
        match auth.auth_type.as_str() {
            "noauth" | "inherit" => AuthConfig::None,
            "bearer" => AuthConfig::bearer(param(&auth.bearer, "token")),
            "basic" => AuthConfig::basic(
                param(&auth.basic, "username"),
                param(&auth.basic, "password"),
            ),
            "apikey" => {
                let location = if param(&auth.apikey, "in") == "query" {
                    ApiKeyLocation::Query
                } else {
                    ApiKeyLocation::Header
                };
                AuthConfig::api_key(
                    param(&auth.apikey, "key"),
                    param(&auth.apikey, "value"),
                    location,
                )
            }
            other => {
                self.warnings.push(ImportWarning::warning(
                    path,
                    format!("auth type '{other}' is not supported; auth dropped"),
                ));
                AuthConfig::None
            }
        }
    }
}

fn extension_request(
    extension: CourierExtension,
    name: String,
    url: String,
) -> Result<Request, String> {
    match extension.protocol {
        Protocol::WebSocket => Ok(Request::websocket(name, url)),
        Protocol::Sse => Ok(Request::sse(name, url)),
        Protocol::Grpc => extension
            .grpc
            .map(|call| Request::grpc(name, url, call))
            .ok_or_else(|| "x-courier grpc item has no 'grpc' call".to_string()),
        Protocol::Http => Err("x-courier http item is not expected".to_string()),
    }
}

fn pair(key: &str, value: &str, disabled: bool) -> KeyValue {
    if disabled {
        KeyValue::disabled(key, value)
    } else {
        KeyValue::new(key, value)
    }
}

/// The query string of the enabled entries of a structured `query` list.
fn query_string(url: &PostmanUrlStructured) -> String {
    url.query
        .iter()
        .flatten()
        .filter(|param| !param.disabled)
        .map(PostmanQueryParam::query_text)
        .collect::<Vec<_>>()
        .join("&")
}

/// Removes `suffix` from the end of `raw` when it follows a `?` or `&`.
/// Falls back to dropping the whole query string when `raw` does not end
/// with it.
fn strip_query_suffix(raw: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return raw.to_string();
    }
    raw.strip_suffix(suffix)
        .and_then(|rest| rest.strip_suffix('?').or_else(|| rest.strip_suffix('&')))
        .or_else(|| raw.split_once('?').map(|(base, _)| base))
        .unwrap_or(raw)
        .to_string()
}

fn split_query_string(raw: &str) -> (String, KeyValueList) {
    let Some((base, query)) = raw.split_once('?') else {
        return (raw.to_string(), KeyValueList::new());
    };
    let mut params = KeyValueList::new();
    for part in query.split('&').filter(|part| !part.is_empty()) {
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        params.add(KeyValue::new(key, value));
    }
    (base.to_string(), params)
}

/// Request object fields the native model has no place for, in Postman's own
/// shape. Per-entry fields of headers, query parameters and form fields are
/// kept as partial entries carrying their `key`, in list order.
fn leftover_fields(postman: PostmanRequest) -> Map<String, Value> {
    let mut leftovers = postman.extras;

    let headers = partials(
        postman
            .header
            .into_iter()
            .map(|header| (header.key, header.extras)),
    );
    if let Some(headers) = headers {
        leftovers.insert("header".to_string(), headers);
    }

    if let Some(PostmanUrl::Structured(url)) = postman.url {
        let mut url_extras = url.extras;
        let query = partials(
            url.query
                .into_iter()
                .flatten()
                .map(|param| (param.key.unwrap_or_default(), param.extras)),
        );
        if let Some(query) = query {
            url_extras.insert("query".to_string(), query);
        }
        if !url_extras.is_empty() {
            leftovers.insert("url".to_string(), Value::Object(url_extras));
        }
    }

    if let Some(body) = postman.body.filter(|body| !body.disabled) {
        let mut body_extras = body.extras;
        let fields = partials(
            body.urlencoded
                .into_iter()
                .filter(|field| !field.disabled)
                .map(|field| (field.key, field.extras)),
        );
        if let Some(fields) = fields {
            body_extras.insert("urlencoded".to_string(), fields);
        }
        if !body_extras.is_empty() {
            leftovers.insert("body".to_string(), Value::Object(body_extras));
        }
    }
    leftovers
}

/// One `{"key": .., ..extras}` entry per list entry, or `None` when no entry
/// has extras.
fn partials(entries: impl Iterator<Item = (String, Map<String, Value>)>) -> Option<Value> {
    let entries: Vec<(String, Map<String, Value>)> = entries.collect();
    if entries.iter().all(|(_, extras)| extras.is_empty()) {
        return None;
    }
    let partials = entries
        .into_iter()
        .map(|(key, extras)| {
            let mut entry = Map::new();
            entry.insert("key".to_string(), Value::String(key));
            entry.extend(extras);
            Value::Object(entry)
        })
        .collect();
    Some(Value::Array(partials))
}

fn raw_kind(language: Option<&str>, content: &str) -> BodyKind {
    match language {
        Some("json") => BodyKind::Json,
        Some("xml") => BodyKind::Xml,
        Some("html") => BodyKind::Html,
        Some("javascript") => BodyKind::Javascript,
        Some(_) => BodyKind::Text,
        None => {
            let trimmed = content.trim_start();
            let looks_like_json = (trimmed.starts_with('{') || trimmed.starts_with('['))
                && serde_json::from_str::<Value>(content).is_ok();
            if looks_like_json {
                BodyKind::Json
            } else {
                BodyKind::Text
            }
        }
    }
}
