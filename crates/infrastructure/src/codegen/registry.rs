//! Language registry for code generation.

use std::collections::BTreeMap;

use courier_domain::request::{Protocol, Request};
use thiserror::Error;

use super::generator::{self, HttpSnippet};

/// A generator function: snippet and comment flag in, source code out.
pub type GenerateFn = fn(&HttpSnippet<'_>, bool) -> String;

/// Code generation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No generator is registered under this id.
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// Only `http` requests can be turned into code.
    #[error("Code generation is not available for {0} requests")]
    NotHttp(Protocol),
}

/// A registered language.
#[derive(Debug, Clone, Copy)]
pub struct LanguageEntry {
    /// Display name
    pub label: &'static str,
    /// Prefix of comment lines in the output
    pub comment_prefix: &'static str,
    /// The generator
    pub generate: GenerateFn,
}

/// Maps language ids to generators.
///
/// Callers only ever go through [`CodeGeneratorRegistry::generate`], so a new
/// language is a new [`register`](Self::register) call.
#[derive(Debug, Clone)]
pub struct CodeGeneratorRegistry {
    languages: BTreeMap<&'static str, LanguageEntry>,
}

impl CodeGeneratorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            languages: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in language.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("curl", "cURL", "#", generator::curl);
        registry.register("go", "Go (net/http)", "//", generator::go);
        registry.register("java", "Java (HttpClient)", "//", generator::java);
        registry.register("javascript", "JavaScript (fetch)", "//", generator::javascript);
        registry.register("php", "PHP (cURL)", "//", generator::php);
        registry.register("python", "Python (requests)", "#", generator::python);
        registry.register("ruby", "Ruby (Net::HTTP)", "#", generator::ruby);
        registry.register("rust", "Rust (reqwest)", "//", generator::rust);
        registry
    }

    /// Registers or replaces a language.
    pub fn register(
        &mut self,
        id: &'static str,
        label: &'static str,
        comment_prefix: &'static str,
        generate: GenerateFn,
    ) {
        self.languages.insert(
            id,
            LanguageEntry {
                label,
                comment_prefix,
                generate,
            },
        );
    }

    /// `(id, label)` pairs in id order.
    #[must_use]
    pub fn languages(&self) -> Vec<(&'static str, &'static str)> {
        self.languages
            .iter()
            .map(|(id, entry)| (*id, entry.label))
            .collect()
    }

    /// Looks up a language.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LanguageEntry> {
        self.languages.get(id)
    }

    /// Generates code for a request template.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown language or a non-`http` request.
    pub fn generate(
        &self,
        request: &Request,
        language: &str,
        include_comments: bool,
    ) -> Result<String, GenerationError> {
        let entry = self
            .get(language)
            .ok_or_else(|| GenerationError::UnknownLanguage(language.to_string()))?;
        let http = request
            .as_http()
            .ok_or_else(|| GenerationError::NotHttp(request.protocol()))?;
        Ok((entry.generate)(&HttpSnippet::new(request, http), include_comments))
    }
}

impl Default for CodeGeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use courier_domain::request::{
        AuthConfig, GrpcRequest, HttpMethod, HttpRequest, KeyValue, RequestBody,
    };
    use pretty_assertions::assert_eq;

    fn sample() -> Request {
        let mut http = HttpRequest::new(HttpMethod::Post)
            .with_header("Accept", "application/json")
            .with_query("verbose", "true")
            .with_body(RequestBody::json("{\"msg\": \"it's a \\\"test\\\"\"}"))
            .with_auth(AuthConfig::bearer("{{token}}"));
        http.headers.add(KeyValue::disabled("X-Debug", "1"));
        Request::http_with("Create", "https://api.test/items", http)
    }

    fn strip_comments(code: &str, prefix: &str) -> String {
        code.lines()
            .filter(|line| !line.trim_start().starts_with(prefix))
            .map(|line| format!("{line}\n"))
            .collect()
    }

    #[test]
    fn test_languages_are_listed_in_id_order() {
        let ids: Vec<&str> = CodeGeneratorRegistry::with_builtins()
            .languages()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(
            ids,
            vec!["curl", "go", "java", "javascript", "php", "python", "ruby", "rust"]
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let registry = CodeGeneratorRegistry::default();
        let request = sample();
        for (id, _) in registry.languages() {
            let first = registry.generate(&request, id, true).unwrap();
            let second = registry.generate(&request, id, true).unwrap();
            assert_eq!(first, second, "{id}");
        }
    }

    #[test]
    fn test_comments_only_add_comment_lines() {
        let registry = CodeGeneratorRegistry::default();
        let request = sample();
        for (id, _) in registry.languages() {
            let prefix = registry.get(id).unwrap().comment_prefix;
            let plain = registry.generate(&request, id, false).unwrap();
            let commented = registry.generate(&request, id, true).unwrap();
            assert_ne!(plain, commented, "{id} should have comments");
            assert_eq!(strip_comments(&commented, prefix), plain, "{id}");
        }
    }

    #[test]
    fn test_only_enabled_headers_are_emitted() {
        let registry = CodeGeneratorRegistry::default();
        let request = sample();
        for (id, _) in registry.languages() {
            let code = registry.generate(&request, id, false).unwrap();
            assert!(code.contains("Accept"), "{id}");
            assert!(code.contains("Bearer {{token}}"), "{id}");
            assert!(code.contains("verbose=true"), "{id}");
            assert!(!code.contains("X-Debug"), "{id}");
        }
    }

    #[test]
    fn test_default_get_without_headers_or_body() {
        let registry = CodeGeneratorRegistry::default();
        let request = Request::http("Empty", HttpMethod::Get, "https://api.test");
        let code = registry.generate(&request, "python", false).unwrap();
        assert_eq!(
            code,
            "import requests\n\nurl = \"https://api.test\"\n\nresponse = requests.request(\"GET\", url)\n\nprint(response.status_code)\nprint(response.text)\n"
        );
    }

    #[test]
    fn test_body_is_escaped_per_language() {
        let registry = CodeGeneratorRegistry::default();
        let request = sample();
        let js = registry.generate(&request, "javascript", false).unwrap();
        assert!(js.contains(r#"body: "{\"msg\": \"it's a \\\"test\\\"\"}","#));
        let php = registry.generate(&request, "php", false).unwrap();
        assert!(php.contains(r#"CURLOPT_POSTFIELDS => '{"msg": "it\'s a \\"test\\""}',"#));
        let curl = registry.generate(&request, "curl", false).unwrap();
        assert!(curl.contains(r#"--data-raw '{"msg": "it'\''s a \"test\""}'"#));
    }

    #[test]
    fn test_unknown_language() {
        let err = CodeGeneratorRegistry::default()
            .generate(&sample(), "cobol", false)
            .unwrap_err();
        assert_eq!(err, GenerationError::UnknownLanguage("cobol".to_string()));
    }

    #[test]
    fn test_grpc_request_is_rejected() {
        let request = Request::grpc("Hello", "localhost:50051", GrpcRequest::new("greet.Greeter", "SayHello"));
        let err = CodeGeneratorRegistry::default()
            .generate(&request, "curl", false)
            .unwrap_err();
        assert_eq!(err, GenerationError::NotHttp(Protocol::Grpc));
    }

    #[test]
    fn test_custom_language_needs_no_caller_change() {
        fn httpie(snippet: &HttpSnippet<'_>, _comments: bool) -> String {
            format!("http {} {}\n", snippet.method, snippet.url)
        }
        let mut registry = CodeGeneratorRegistry::empty();
        registry.register("httpie", "HTTPie", "#", httpie);
        let request = Request::http("Ping", HttpMethod::Get, "https://api.test/ping");
        assert_eq!(
            registry.generate(&request, "httpie", false).unwrap(),
            "http GET https://api.test/ping\n"
        );
    }
}
