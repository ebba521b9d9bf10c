//! Code generators for the built-in languages.
//!
//! Every generator is a pure function of an [`HttpSnippet`] and the comment
//! flag. Comments are always whole lines, so turning them off only removes
//! lines. User text is only ever written inside string literals, escaped for
//! the target language.

use std::fmt::Write as _;

use courier_domain::request::{HttpRequest, QueryEncoding, Request};

/// The parts of an `http` request that end up in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSnippet<'a> {
    /// Upper-case method
    pub method: &'static str,
    /// URL with enabled query parameters appended as authored
    pub url: String,
    /// Enabled headers, then auth and content type
    pub headers: Vec<(String, String)>,
    /// Body text, when present
    pub body: Option<&'a str>,
}

impl<'a> HttpSnippet<'a> {
    /// Builds the snippet from a request template.
    #[must_use]
    pub fn new(request: &Request, http: &'a HttpRequest) -> Self {
        Self {
            method: http.method.as_str(),
            url: http.url_with_query(&request.url, QueryEncoding::Verbatim),
            headers: http.effective_headers(),
            body: (!http.body.is_empty()).then_some(http.body.content.as_str()),
        }
    }
}

/// Line-oriented output with optional comment lines.
struct CodeWriter {
    out: String,
    comments: bool,
    comment_prefix: &'static str,
}

impl CodeWriter {
    const fn new(comments: bool, comment_prefix: &'static str) -> Self {
        Self {
            out: String::new(),
            comments,
            comment_prefix,
        }
    }

    fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        let _ = writeln!(self.out, "{:indent$}{}", "", text.as_ref());
    }

    fn comment(&mut self, indent: usize, text: &str) {
        if self.comments {
            let _ = writeln!(self.out, "{:indent$}{} {text}", "", self.comment_prefix);
        }
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn finish(self) -> String {
        self.out
    }
}

/// How a language writes control characters that have no short escape.
#[derive(Clone, Copy)]
enum ControlEscape {
    /// `\u001b`
    Unicode4,
    /// `\u{1b}`
    UnicodeBraced,
    /// `\033`
    Octal,
}

/// A double-quoted literal with C-style escapes.
fn double_quoted(text: &str, control: ControlEscape) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let code = u32::from(c);
                let _ = match control {
                    ControlEscape::Unicode4 => write!(out, "\\u{code:04x}"),
                    ControlEscape::UnicodeBraced => write!(out, "\\u{{{code:x}}}"),
                    ControlEscape::Octal => write!(out, "\\{code:03o}"),
                };
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A POSIX shell single-quoted word.
fn shell_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// A single-quoted literal where only `\` and `'` are special (Ruby, PHP).
fn single_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn js(text: &str) -> String {
    double_quoted(text, ControlEscape::Unicode4)
}

/// `curl` command line.
pub fn curl(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let mut w = CodeWriter::new(comments, "#");
    w.comment(0, "Send the request with curl");

    let mut args = Vec::new();
    if snippet.method != "GET" || snippet.body.is_some() {
        args.push(format!("-X {}", snippet.method));
    }
    args.push(shell_quoted(&snippet.url));
    for (name, value) in &snippet.headers {
        args.push(format!("-H {}", shell_quoted(&format!("{name}: {value}"))));
    }
    if let Some(body) = snippet.body {
        args.push(format!("--data-raw {}", shell_quoted(body)));
    }

    let last = args.len() - 1;
    for (i, arg) in args.iter().enumerate() {
        let continuation = if i == last { "" } else { " \\" };
        if i == 0 {
            w.line(0, format!("curl {arg}{continuation}"));
        } else {
            w.line(2, format!("{arg}{continuation}"));
        }
    }
    w.finish()
}

/// Python using `requests`.
pub fn python(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let q = |s: &str| double_quoted(s, ControlEscape::Unicode4);
    let mut w = CodeWriter::new(comments, "#");
    w.line(0, "import requests");
    w.blank();
    w.line(0, format!("url = {}", q(&snippet.url)));

    let mut call_args = vec![q(snippet.method), "url".to_string()];
    if !snippet.headers.is_empty() {
        w.comment(0, "Request headers");
        w.line(0, "headers = {");
        for (name, value) in &snippet.headers {
            w.line(4, format!("{}: {},", q(name), q(value)));
        }
        w.line(0, "}");
        call_args.push("headers=headers".to_string());
    }
    if let Some(body) = snippet.body {
        w.comment(0, "Request body");
        w.line(0, format!("payload = {}", q(body)));
        call_args.push("data=payload.encode(\"utf-8\")".to_string());
    }
    w.blank();

    w.comment(0, "Send the request");
    w.line(
        0,
        format!("response = requests.request({})", call_args.join(", ")),
    );
    w.blank();
    w.line(0, "print(response.status_code)");
    w.line(0, "print(response.text)");
    w.finish()
}

/// JavaScript using `fetch`.
pub fn javascript(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let mut w = CodeWriter::new(comments, "//");
    w.line(0, format!("const url = {};", js(&snippet.url)));
    w.line(0, "const options = {");
    w.line(2, format!("method: {},", js(snippet.method)));
    if !snippet.headers.is_empty() {
        w.comment(2, "Request headers");
        w.line(2, "headers: {");
        for (name, value) in &snippet.headers {
            w.line(4, format!("{}: {},", js(name), js(value)));
        }
        w.line(2, "},");
    }
    if let Some(body) = snippet.body {
        w.comment(2, "Request body");
        w.line(2, format!("body: {},", js(body)));
    }
    w.line(0, "};");
    w.blank();
    w.comment(0, "Send the request and print the response body");
    w.line(0, "fetch(url, options)");
    w.line(2, ".then((response) => response.text())");
    w.line(2, ".then((text) => console.log(text))");
    w.line(2, ".catch((error) => console.error(error));");
    w.finish()
}

/// Go using `net/http`.
pub fn go(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let q = |s: &str| double_quoted(s, ControlEscape::Unicode4);
    let mut w = CodeWriter::new(comments, "//");
    w.line(0, "package main");
    w.blank();
    w.line(0, "import (");
    w.line(1, "\"fmt\"");
    w.line(1, "\"io\"");
    w.line(1, "\"net/http\"");
    if snippet.body.is_some() {
        w.line(1, "\"strings\"");
    }
    w.line(0, ")");
    w.blank();
    w.line(0, "func main() {");
    w.line(1, format!("url := {}", q(&snippet.url)));
    let payload = if let Some(body) = snippet.body {
        w.comment(1, "Request body");
        w.line(1, format!("payload := strings.NewReader({})", q(body)));
        "payload"
    } else {
        "nil"
    };
    w.blank();
    w.line(
        1,
        format!("req, err := http.NewRequest({}, url, {payload})", q(snippet.method)),
    );
    w.line(1, "if err != nil {");
    w.line(2, "panic(err)");
    w.line(1, "}");
    if !snippet.headers.is_empty() {
        w.comment(1, "Request headers");
        for (name, value) in &snippet.headers {
            w.line(1, format!("req.Header.Add({}, {})", q(name), q(value)));
        }
    }
    w.blank();
    w.comment(1, "Send the request");
    w.line(1, "res, err := http.DefaultClient.Do(req)");
    w.line(1, "if err != nil {");
    w.line(2, "panic(err)");
    w.line(1, "}");
    w.line(1, "defer res.Body.Close()");
    w.blank();
    w.line(1, "body, err := io.ReadAll(res.Body)");
    w.line(1, "if err != nil {");
    w.line(2, "panic(err)");
    w.line(1, "}");
    w.line(1, "fmt.Println(res.StatusCode)");
    w.line(1, "fmt.Println(string(body))");
    w.line(0, "}");
    // gofmt indents with tabs.
    w.finish()
        .lines()
        .map(|line| {
            let depth = line.len() - line.trim_start_matches(' ').len();
            format!("{}{}\n", "\t".repeat(depth), &line[depth..])
        })
        .collect()
}

/// Rust using blocking `reqwest`.
pub fn rust(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let q = |s: &str| double_quoted(s, ControlEscape::UnicodeBraced);
    let mut w = CodeWriter::new(comments, "//");
    w.line(0, "fn main() -> Result<(), Box<dyn std::error::Error>> {");
    w.line(4, "let client = reqwest::blocking::Client::new();");
    w.comment(4, "Build and send the request");
    w.line(4, "let response = client");
    w.line(
        8,
        format!(".request(reqwest::Method::{}, {})", snippet.method, q(&snippet.url)),
    );
    for (name, value) in &snippet.headers {
        w.line(8, format!(".header({}, {})", q(name), q(value)));
    }
    if let Some(body) = snippet.body {
        w.line(8, format!(".body({})", q(body)));
    }
    w.line(8, ".send()?;");
    w.blank();
    w.line(4, "println!(\"{}\", response.status());");
    w.line(4, "println!(\"{}\", response.text()?);");
    w.line(4, "Ok(())");
    w.line(0, "}");
    w.finish()
}

/// Java using `java.net.http`.
pub fn java(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let q = |s: &str| double_quoted(s, ControlEscape::Octal);
    let mut w = CodeWriter::new(comments, "//");
    w.line(0, "import java.net.URI;");
    w.line(0, "import java.net.http.HttpClient;");
    w.line(0, "import java.net.http.HttpRequest;");
    w.line(0, "import java.net.http.HttpResponse;");
    w.blank();
    w.line(0, "public class Main {");
    w.line(4, "public static void main(String[] args) throws Exception {");
    w.line(8, "HttpClient client = HttpClient.newHttpClient();");
    w.comment(8, "Build the request");
    w.line(8, "HttpRequest request = HttpRequest.newBuilder()");
    w.line(12, format!(".uri(URI.create({}))", q(&snippet.url)));
    for (name, value) in &snippet.headers {
        w.line(12, format!(".header({}, {})", q(name), q(value)));
    }
    let publisher = snippet.body.map_or_else(
        || "HttpRequest.BodyPublishers.noBody()".to_string(),
        |body| format!("HttpRequest.BodyPublishers.ofString({})", q(body)),
    );
    w.line(12, format!(".method({}, {publisher})", q(snippet.method)));
    w.line(12, ".build();");
    w.blank();
    w.comment(8, "Send the request");
    w.line(
        8,
        "HttpResponse<String> response = client.send(request, HttpResponse.BodyHandlers.ofString());",
    );
    w.line(8, "System.out.println(response.statusCode());");
    w.line(8, "System.out.println(response.body());");
    w.line(4, "}");
    w.line(0, "}");
    w.finish()
}

/// Ruby using `net/http`.
pub fn ruby(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let q = single_quoted;
    let mut w = CodeWriter::new(comments, "#");
    w.line(0, "require 'net/http'");
    w.line(0, "require 'uri'");
    w.blank();
    w.line(0, format!("uri = URI({})", q(&snippet.url)));
    w.line(0, "http = Net::HTTP.new(uri.host, uri.port)");
    w.line(0, "http.use_ssl = uri.scheme == 'https'");
    w.blank();
    w.comment(0, "Build the request");
    w.line(
        0,
        format!(
            "request = Net::HTTPGenericRequest.new({}, {}, {}, uri.request_uri)",
            q(snippet.method),
            snippet.body.is_some(),
            snippet.method != "HEAD"
        ),
    );
    for (name, value) in &snippet.headers {
        w.line(0, format!("request[{}] = {}", q(name), q(value)));
    }
    if let Some(body) = snippet.body {
        w.line(0, format!("request.body = {}", q(body)));
    }
    w.blank();
    w.comment(0, "Send the request");
    w.line(0, "response = http.request(request)");
    w.line(0, "puts response.code");
    w.line(0, "puts response.body");
    w.finish()
}

/// PHP using the curl extension.
pub fn php(snippet: &HttpSnippet<'_>, comments: bool) -> String {
    let q = single_quoted;
    let mut w = CodeWriter::new(comments, "//");
    w.line(0, "<?php");
    w.blank();
    w.line(0, "$curl = curl_init();");
    w.blank();
    w.comment(0, "Configure the request");
    w.line(0, "curl_setopt_array($curl, [");
    w.line(4, format!("CURLOPT_URL => {},", q(&snippet.url)));
    w.line(4, "CURLOPT_RETURNTRANSFER => true,");
    w.line(4, format!("CURLOPT_CUSTOMREQUEST => {},", q(snippet.method)));
    if !snippet.headers.is_empty() {
        w.line(4, "CURLOPT_HTTPHEADER => [");
        for (name, value) in &snippet.headers {
            w.line(8, format!("{},", q(&format!("{name}: {value}"))));
        }
        w.line(4, "],");
    }
    if let Some(body) = snippet.body {
        w.line(4, format!("CURLOPT_POSTFIELDS => {},", q(body)));
    }
    w.line(0, "]);");
    w.blank();
    w.comment(0, "Send the request");
    w.line(0, "$response = curl_exec($curl);");
    w.line(0, "$error = curl_error($curl);");
    w.line(0, "curl_close($curl);");
    w.blank();
    w.line(0, "if ($error !== '') {");
    w.line(4, "echo 'Error: ' . $error;");
    w.line(0, "} else {");
    w.line(4, "echo $response;");
    w.line(0, "}");
    w.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snippet(body: Option<&'static str>) -> HttpSnippet<'static> {
        HttpSnippet {
            method: "POST",
            url: "https://api.test/users?page=1".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    #[test]
    fn test_double_quoted_escapes() {
        assert_eq!(
            double_quoted("a\"b\\c\nd\u{1b}", ControlEscape::Unicode4),
            r#""a\"b\\c\nd\u001b""#
        );
        assert_eq!(
            double_quoted("\u{1b}", ControlEscape::UnicodeBraced),
            r#""\u{1b}""#
        );
        assert_eq!(double_quoted("\u{1b}", ControlEscape::Octal), r#""\033""#);
    }

    #[test]
    fn test_shell_and_single_quotes() {
        assert_eq!(shell_quoted("it's"), r#"'it'\''s'"#);
        assert_eq!(single_quoted(r"it's \o/"), r"'it\'s \\o/'");
    }

    #[test]
    fn test_curl_output() {
        let code = curl(&snippet(Some(r#"{"name":"Ada"}"#)), false);
        assert_eq!(
            code,
            "curl -X POST \\\n  'https://api.test/users?page=1' \\\n  -H 'Content-Type: application/json' \\\n  --data-raw '{\"name\":\"Ada\"}'\n"
        );
    }

    #[test]
    fn test_curl_plain_get() {
        let get = HttpSnippet {
            method: "GET",
            url: String::new(),
            headers: Vec::new(),
            body: None,
        };
        assert_eq!(curl(&get, false), "curl ''\n");
    }

    #[test]
    fn test_go_uses_tabs_and_imports_strings_only_with_body() {
        let with_body = go(&snippet(Some("x")), false);
        assert!(with_body.contains("\n\t\"strings\"\n"));
        assert!(with_body.contains("\n\tpayload := strings.NewReader(\"x\")\n"));
        assert!(with_body.contains("\n\t\tpanic(err)\n"));

        let without = go(&snippet(None), false);
        assert!(!without.contains("strings"));
        assert!(without.contains("http.NewRequest(\"POST\", url, nil)"));
    }

    #[test]
    fn test_rust_method_constant() {
        let code = rust(&snippet(None), true);
        assert!(code.contains(".request(reqwest::Method::POST, \"https://api.test/users?page=1\")"));
        assert!(code.contains("    // Build and send the request\n"));
    }

    #[test]
    fn test_ruby_request_flags() {
        let code = ruby(&snippet(Some("x")), false);
        assert!(code.contains("Net::HTTPGenericRequest.new('POST', true, true, uri.request_uri)"));
    }
}
